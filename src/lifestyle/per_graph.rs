use std::sync::Arc;

use crate::{
    activation::{Activator, activator},
    strategy::Strategy,
};

/// Instance shared inside one top level locate call
pub(super) fn wrap(strategy: Arc<Strategy>, create: Activator) -> Activator {
    activator(move |scope, disposal, ctx| {
        if let Some(instance) = ctx.per_graph.get(&strategy.id()) {
            return Ok(instance.clone());
        }

        let instance = create(scope, disposal, ctx)?;

        ctx.per_graph.insert(strategy.id(), instance.clone());

        Ok(instance)
    })
}
