use std::sync::Arc;

use crate::{
    activation::{Activator, activator},
    strategy::Strategy,
};

/// Instance lives in the root slots, its dependencies resolve against the root scope
pub(super) fn wrap(strategy: Arc<Strategy>, create: Activator) -> Activator {
    activator(move |scope, _disposal, ctx| {
        let root = scope.root();

        root.root_state().singletons.produce(&strategy, || {
            tracing::debug!(target: "xioc", ty = strategy.activation_type().name, "creating singleton");

            create(&root, root.disposal(), ctx)
        })
    })
}
