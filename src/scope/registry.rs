use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    activation::{
        Activator, builder::ActivationBuilder, cache::ActivatorCache, compiler,
        context::StaticInjectionContext, request::Request,
    },
    options::ContainerOptions,
    strategy::{
        Strategy,
        collection::{Decorator, StrategyCollection},
    },
    types::{error::LocateResult, key::Key, type_info::TypeInfo},
};

/// Strategies and compiled activators shared by a scope tree slice.
///
/// Child containers chain a registry of their own to the parent's: single lookups
/// prefer local strategies, collections list local strategies first.
#[derive(Debug)]
pub(crate) struct Registry {
    strategies: StrategyCollection,
    cache: ActivatorCache,
    generation: AtomicU64,
    parent: Option<Arc<Registry>>,
    options: ContainerOptions,
}

impl Registry {
    pub(crate) fn new(options: ContainerOptions) -> Self {
        Self {
            strategies: StrategyCollection::new(),
            cache: ActivatorCache::default(),
            generation: AtomicU64::new(0),
            parent: None,
            options,
        }
    }

    pub(crate) fn child(parent: &Arc<Registry>) -> Self {
        Self {
            parent: Some(parent.clone()),
            ..Self::new(parent.options.clone())
        }
    }

    pub(crate) fn options(&self) -> &ContainerOptions {
        &self.options
    }

    /// Registration count of the whole chain, cached activators older than this are stale
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
            + self.parent.as_ref().map(|x| x.generation()).unwrap_or_default()
    }

    pub(crate) fn register(&self, strategy: Strategy) -> LocateResult<Arc<Strategy>> {
        let strategy = self.strategies.add(strategy)?;

        self.generation.fetch_add(1, Ordering::AcqRel);

        tracing::debug!(
            target: "xioc",
            ty = strategy.activation_type().name,
            exports = strategy.exports().len(),
            keyed = strategy.keyed_exports().len(),
            lifestyle = ?strategy.lifestyle(),
            "strategy registered"
        );

        Ok(strategy)
    }

    pub(crate) fn add_decorator(&self, decorator: Decorator) {
        tracing::debug!(target: "xioc", ty = decorator.ty().name, "decorator registered");

        self.strategies.add_decorator(decorator);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn select(&self, ty: TypeInfo, ctx: &StaticInjectionContext) -> Option<Arc<Strategy>> {
        self.strategies
            .snapshot()
            .select(ty, ctx)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|x| x.select(ty, ctx)))
    }

    pub(crate) fn by_key(&self, ty: TypeInfo, key: &Key) -> Option<Arc<Strategy>> {
        self.strategies
            .snapshot()
            .by_key(ty, key)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|x| x.by_key(ty, key)))
    }

    pub(crate) fn eligible(&self, ty: TypeInfo, ctx: &StaticInjectionContext) -> Vec<Arc<Strategy>> {
        let mut strategies = self
            .strategies
            .snapshot()
            .eligible(ty, ctx)
            .cloned()
            .collect::<Vec<_>>();

        if let Some(parent) = &self.parent {
            strategies.extend(parent.eligible(ty, ctx));
        }

        strategies
    }

    /// Parent decorators first, they wrap closest to the instance
    pub(crate) fn decorators(&self, ty: TypeInfo) -> Vec<Arc<Decorator>> {
        let mut decorators = self
            .parent
            .as_ref()
            .map(|x| x.decorators(ty))
            .unwrap_or_default();

        decorators.extend(self.strategies.snapshot().decorators(ty).iter().cloned());

        decorators
    }

    /// Cached activator for the request, compiled on first use or after new registrations.
    ///
    /// `Ok(None)` when nothing can satisfy the request. Misses are not cached.
    pub(crate) fn activator(
        &self,
        request: &Request,
        key: Option<&Key>,
    ) -> LocateResult<Option<Activator>> {
        let generation = self.generation();

        if let Some(activator) = self.cache.get(request.ty(), key, generation) {
            return Ok(Some(activator));
        }

        let builder = ActivationBuilder::new(self);

        let Some(plan) = builder.build_request(request, key, &StaticInjectionContext::new())? else {
            return Ok(None);
        };

        tracing::debug!(target: "xioc", ty = request.ty().name, generation, "activator compiled");

        let activator = compiler::compile(plan);

        Ok(Some(self.cache.insert(
            request.ty(),
            key.cloned(),
            generation,
            activator,
        )))
    }
}
