//! Exports collected at link time from `#[export]` functions.

use crate::{builder::ExportRegistrationBlock, scope::Container, types::error::LocateResult};

/// Registration submitted by the [`export`](crate::export) attribute
pub struct Registration {
    configure: fn(&mut ExportRegistrationBlock),
}

impl Registration {
    pub const fn new(configure: fn(&mut ExportRegistrationBlock)) -> Self {
        Self { configure }
    }
}

::inventory::collect!(Registration);

impl Container {
    /// Configure every export declared with the [`export`](crate::export) attribute
    pub fn inject_registrations(&self) -> LocateResult<()> {
        let mut count = 0;

        self.configure(|block| {
            for registration in ::inventory::iter::<Registration> {
                (registration.configure)(block);
                count += 1;
            }
        })?;

        tracing::debug!(target: "xioc", count, "registrations injected");

        Ok(())
    }
}
