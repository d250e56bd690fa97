use std::{
    sync::Arc,
    thread::{self, ThreadId},
};

use dashmap::DashMap;

use crate::{
    activation::{Activator, activator, guard::ActivationGuard},
    strategy::{Strategy, StrategyId},
    types::instance::Instance,
};

/// Per thread instances of one container.
///
/// Kept in the root instead of a `thread_local!` so disposing the container reaches
/// the instances of every thread.
#[derive(Debug, Default)]
pub(crate) struct ThreadStaticSlots {
    instances: DashMap<(ThreadId, StrategyId), Instance, ahash::RandomState>,
}

impl ThreadStaticSlots {
    fn get(&self, strategy: &Strategy) -> Option<Instance> {
        self.instances
            .get(&(thread::current().id(), strategy.id()))
            .map(|x| x.value().clone())
    }

    fn insert(&self, strategy: &Strategy, instance: Instance) {
        self.instances
            .insert((thread::current().id(), strategy.id()), instance);
    }

    pub(crate) fn clear(&self) {
        self.instances.clear();
    }
}

/// Only the calling thread touches its slot, creation happens without holding a map guard
pub(super) fn wrap(strategy: Arc<Strategy>, create: Activator) -> Activator {
    activator(move |scope, _disposal, ctx| {
        let root = scope.root();
        let slots = &root.root_state().thread_statics;

        if let Some(instance) = slots.get(&strategy) {
            return Ok(instance);
        }

        ActivationGuard::ensure_not_activating(&strategy)?;

        let instance = create(&root, root.disposal(), ctx)?;

        slots.insert(&strategy, instance.clone());

        Ok(instance)
    })
}
