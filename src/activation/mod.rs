pub mod builder;
pub(crate) mod cache;
pub(crate) mod compiler;
pub mod context;
pub(crate) mod guard;
pub mod plan;
pub mod request;
pub mod runtime;

use std::sync::Arc;

use crate::{
    scope::{ScopeHandle, disposal::DisposalScope},
    types::{error::LocateResult, instance::Instance},
};

use runtime::RuntimeContext;

/// Compiled construction plan.
///
/// Called with the requesting scope, the disposal scope new instances go to and the
/// state of the current top level call.
pub type Activator = Arc<
    dyn Fn(&ScopeHandle, &Arc<DisposalScope>, &mut RuntimeContext) -> LocateResult<Instance>
        + Send
        + Sync,
>;

pub fn activator(
    f: impl Fn(&ScopeHandle, &Arc<DisposalScope>, &mut RuntimeContext) -> LocateResult<Instance>
    + Send
    + Sync
    + 'static,
) -> Activator {
    Arc::new(f)
}
