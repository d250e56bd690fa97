use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::{
    activation::{Activator, activator, guard::ActivationGuard},
    strategy::{Strategy, StrategyId},
    types::error::LocateError,
};

use super::InstanceProducer;

tokio::task_local! {
    static TASK_LOCAL_CTX: TaskLocalCtx;
}

#[derive(Debug, Default)]
pub(crate) struct TaskLocalCtx {
    instances: DashMap<StrategyId, Arc<Mutex<InstanceProducer>>, ahash::RandomState>,
}

impl TaskLocalCtx {
    pub(crate) async fn span<F: Future>(f: F) -> F::Output {
        TASK_LOCAL_CTX.scope(TaskLocalCtx::default(), f).await
    }

    fn slot(strategy: &Strategy) -> Option<Arc<Mutex<InstanceProducer>>> {
        TASK_LOCAL_CTX
            .try_with(|ctx| ctx.instances.entry(strategy.id()).or_default().clone())
            .ok()
    }
}

/// Instance shared inside one task span, dependencies resolve against the requesting scope
pub(super) fn wrap(strategy: Arc<Strategy>, create: Activator) -> Activator {
    activator(move |scope, disposal, ctx| {
        ActivationGuard::ensure_not_activating(&strategy)?;

        let slot = TaskLocalCtx::slot(&strategy).ok_or(
            LocateError::TaskLocalContextNotInitialized {
                ty: strategy.activation_type(),
            },
        )?;

        let mut slot = slot.lock();

        slot.produce(|| create(scope, disposal, ctx))
    })
}
