mod per_graph;
mod per_scope;
mod singleton;
#[cfg(feature = "task-local")]
pub(crate) mod task_local;
mod thread_static;
mod weak;

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::{
    activation::{Activator, guard::ActivationGuard},
    strategy::{Strategy, StrategyId},
    types::{error::LocateResult, instance::Instance},
};

pub(crate) use thread_static::ThreadStaticSlots;
pub(crate) use weak::WeakSlots;

/// When a strategy produces a new instance and when it hands out a cached one
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Lifestyle {
    /// New instance on every request
    #[default]
    Transient,
    /// One instance per container, owned by the root scope
    Singleton,
    /// One instance per lifetime scope
    SingletonPerScope,
    /// One instance per nearest enclosing scope with the given name
    SingletonPerNamedScope(Arc<str>),
    /// One instance per top level locate call
    SingletonPerObjectGraph,
    /// Shared while someone holds it, recreated afterwards. Never disposed by the container.
    WeakSingleton,
    /// One instance per thread, dropped when the container is disposed
    ThreadStatic,
    /// One instance per tokio task span, see [`crate::IAsyncTaskScope`]
    #[cfg(feature = "task-local")]
    TaskLocal,
}

impl Lifestyle {
    pub fn per_named_scope(name: impl AsRef<str>) -> Self {
        Self::SingletonPerNamedScope(Arc::from(name.as_ref()))
    }

    /// Produced instances go into a disposal scope
    pub fn tracks_disposal(&self) -> bool {
        !matches!(self, Self::WeakSingleton)
    }

    /// Instances are not cached beyond one locate call
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient | Self::SingletonPerObjectGraph)
    }
}

/// Wrap the activator creating instances of `strategy` into its lifestyle
pub(crate) fn apply(strategy: Arc<Strategy>, create: Activator) -> Activator {
    match strategy.lifestyle().clone() {
        Lifestyle::Transient => create,
        Lifestyle::Singleton => singleton::wrap(strategy, create),
        Lifestyle::SingletonPerScope => per_scope::wrap(strategy, create),
        Lifestyle::SingletonPerNamedScope(name) => per_scope::wrap_named(strategy, name, create),
        Lifestyle::SingletonPerObjectGraph => per_graph::wrap(strategy, create),
        Lifestyle::WeakSingleton => weak::wrap(strategy, create),
        Lifestyle::ThreadStatic => thread_static::wrap(strategy, create),
        #[cfg(feature = "task-local")]
        Lifestyle::TaskLocal => task_local::wrap(strategy, create),
    }
}

/// Cached instance state
#[derive(Default)]
pub(crate) enum InstanceProducer {
    #[default]
    Pending,
    Created {
        instance: Instance,
    },
}

impl InstanceProducer {
    pub(crate) fn produce(
        &mut self,
        create: impl FnOnce() -> LocateResult<Instance>,
    ) -> LocateResult<Instance> {
        match self {
            Self::Created { instance } => Ok(instance.clone()),
            Self::Pending => {
                let instance = create()?;

                *self = Self::Created {
                    instance: instance.clone(),
                };

                Ok(instance)
            }
        }
    }
}

impl std::fmt::Debug for InstanceProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.debug_struct("Pending").finish(),
            Self::Created { .. } => f.debug_struct("Created").finish(),
        }
    }
}

/// Cached instances of one owner (root or lifetime scope), one slot per strategy
#[derive(Debug, Default)]
pub(crate) struct InstanceSlots {
    slots: DashMap<StrategyId, Arc<Mutex<InstanceProducer>>, ahash::RandomState>,
}

impl InstanceSlots {
    /// Return the cached instance or create it, creation runs once per slot.
    ///
    /// The map guard is released before the slot is locked, so creation may touch
    /// other slots.
    pub(crate) fn produce(
        &self,
        strategy: &Strategy,
        create: impl FnOnce() -> LocateResult<Instance>,
    ) -> LocateResult<Instance> {
        ActivationGuard::ensure_not_activating(strategy)?;

        let slot = self.slots.entry(strategy.id()).or_default().clone();

        let mut slot = slot.lock();

        slot.produce(create)
    }

    pub(crate) fn clear(&self) {
        self.slots.clear();
    }
}
