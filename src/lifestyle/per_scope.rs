use std::sync::Arc;

use crate::{
    activation::{Activator, activator},
    strategy::Strategy,
    types::error::LocateError,
};

/// Instance lives in the requesting scope
pub(super) fn wrap(strategy: Arc<Strategy>, create: Activator) -> Activator {
    activator(move |scope, _disposal, ctx| {
        scope.ensure_alive()?;

        scope
            .per_scope()
            .produce(&strategy, || create(scope, scope.disposal(), ctx))
    })
}

/// Instance lives in the nearest scope carrying `name`, the requesting one included
pub(super) fn wrap_named(strategy: Arc<Strategy>, name: Arc<str>, create: Activator) -> Activator {
    activator(move |scope, _disposal, ctx| {
        let owner = scope
            .ancestors()
            .find(|x| x.name() == Some(name.as_ref()))
            .ok_or_else(|| LocateError::LocateFailure {
                ty: strategy.activation_type(),
                key: None,
                trace: format!("  no scope named '{name}' above scope {}\n", scope.id()),
            })?;

        owner.ensure_alive()?;

        owner
            .per_scope()
            .produce(&strategy, || create(&owner, owner.disposal(), ctx))
    })
}
