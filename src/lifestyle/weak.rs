use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::{
    activation::{Activator, activator, guard::ActivationGuard},
    strategy::{Strategy, StrategyId, WeakInstance},
};

type WeakSlot = Arc<Mutex<Option<WeakInstance>>>;

/// Weak handles of the weak singletons of one container
#[derive(Default)]
pub(crate) struct WeakSlots {
    slots: DashMap<StrategyId, WeakSlot, ahash::RandomState>,
}

impl WeakSlots {
    pub(crate) fn clear(&self) {
        self.slots.clear();
    }

    fn slot(&self, strategy: &Strategy) -> WeakSlot {
        self.slots.entry(strategy.id()).or_default().clone()
    }
}

impl std::fmt::Debug for WeakSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakSlots")
            .field("len", &self.slots.len())
            .finish()
    }
}

/// Hand out the live instance while any strong handle exists, otherwise create a new one
pub(super) fn wrap(strategy: Arc<Strategy>, create: Activator) -> Activator {
    activator(move |scope, disposal, ctx| {
        ActivationGuard::ensure_not_activating(&strategy)?;

        let root = scope.root();
        let slot = root.root_state().weak.slot(&strategy);
        let mut slot = slot.lock();

        if let Some(instance) = slot.as_ref().and_then(|upgrade| upgrade()) {
            return Ok(instance);
        }

        let instance = create(scope, disposal, ctx)?;

        *slot = strategy.activation().downgrade(&instance);

        Ok(instance)
    })
}
