use std::{borrow::Cow, sync::Arc};

use ahash::AHashMap;

use crate::{
    activation::request::{Locatable, RequestKind},
    condition::Condition,
    lifestyle::Lifestyle,
    scope::{disposal::Dispose, registry::Registry},
    strategy::{
        Caster, Strategy, StrategyParts, TypedActivation, caster,
        collection::Decorator,
        constructor::Constructor,
        dependency::Dependency,
        identity_caster,
    },
    types::{
        error::{LocateError, LocateResult},
        instance::Instance,
        key::Key,
        type_info::{TypeInfo, TypeInfoSource},
    },
};

/// Collects exports and decorators, applied to a registry all at once.
///
/// ```ignore
/// container.configure(|block| {
///     block.export(|| BasicService).as_trait::<dyn IBasicService>(|x| x);
///     block.singleton(Settings::load).as_self();
/// })?;
/// ```
#[derive(Debug, Default)]
pub struct ExportRegistrationBlock {
    strategies: Vec<Strategy>,
    decorators: Vec<Decorator>,
    errors: Vec<LocateError>,
}

impl ExportRegistrationBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export the value built by a constructor, transient unless configured otherwise
    pub fn export<TArgs, C: Constructor<TArgs>>(&mut self, constructor: C) -> ExportConfig<'_, C::Output> {
        ExportConfig::new(self, TypedActivation::from_constructor(constructor))
    }

    /// Export an existing instance. The container never disposes it.
    pub fn export_instance<TService: Send + Sync + 'static>(
        &mut self,
        instance: Arc<TService>,
    ) -> ExportConfig<'_, TService> {
        ExportConfig::new(self, TypedActivation::instance(instance))
            .externally_owned()
            .singleton()
    }

    pub fn transient<TArgs, C: Constructor<TArgs>>(&mut self, constructor: C) -> ExportConfig<'_, C::Output> {
        self.export(constructor).transient()
    }

    pub fn singleton<TArgs, C: Constructor<TArgs>>(&mut self, constructor: C) -> ExportConfig<'_, C::Output> {
        self.export(constructor).singleton()
    }

    /// Post process every single located `TService`. Collections are not decorated.
    pub fn decorate<TService: ?Sized + Send + Sync + 'static>(
        &mut self,
        decorate: impl Fn(Arc<TService>) -> Arc<TService> + Send + Sync + 'static,
    ) {
        self.decorators.push(Decorator::new(
            TService::type_info(),
            move |instance: Instance| -> LocateResult<Instance> {
                let service = instance.to_arc::<TService>()?;
                Ok(Instance::from_arc(decorate(service)))
            },
        ));
    }

    /// Add a strategy built by hand
    pub fn register(&mut self, strategy: Strategy) {
        self.strategies.push(strategy);
    }

    fn commit(&mut self, result: LocateResult<Strategy>) {
        match result {
            Ok(strategy) => self.strategies.push(strategy),
            Err(err) => self.errors.push(err),
        }
    }

    /// Register everything. Nothing is registered when any export was misconfigured.
    pub(crate) fn apply(self, registry: &Registry) -> LocateResult<()> {
        let Self {
            strategies,
            decorators,
            errors,
        } = self;

        if let Some(err) = errors.into_iter().next() {
            return Err(err);
        }

        for strategy in strategies {
            registry.register(strategy)?;
        }

        for decorator in decorators {
            registry.add_decorator(decorator);
        }

        Ok(())
    }
}

struct Draft<TService> {
    activation: TypedActivation<TService>,
    exports: Vec<TypeInfo>,
    keyed_exports: Vec<(TypeInfo, Key)>,
    casts: AHashMap<TypeInfo, Caster>,
    lifestyle: Lifestyle,
    conditions: Vec<Condition>,
    priority: i32,
    externally_owned: bool,
    markers: Vec<TypeInfo>,
    errors: Vec<LocateError>,
}

impl<TService: Send + Sync + 'static> Draft<TService> {
    fn invalid(&mut self, reason: impl Into<String>) {
        self.errors.push(LocateError::InvalidConfiguration {
            ty: TService::type_info(),
            reason: reason.into(),
        });
    }

    fn build(mut self) -> LocateResult<Strategy> {
        if self.exports.is_empty() && self.keyed_exports.is_empty() {
            self.exports.push(TService::type_info());
            self.casts.insert(TService::type_info(), identity_caster());
        }

        if self.activation.is_instance() && self.lifestyle != Lifestyle::Singleton {
            self.invalid("an exported instance is always a singleton");
        }

        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        Strategy::from_parts(StrategyParts {
            activation_type: TService::type_info(),
            exports: self.exports,
            keyed_exports: self.keyed_exports,
            casts: self.casts,
            lifestyle: self.lifestyle,
            conditions: self.conditions,
            priority: self.priority,
            externally_owned: self.externally_owned,
            markers: self.markers,
            activation: Box::new(self.activation),
        })
    }
}

/// Configuration of one export, added to the block when dropped
pub struct ExportConfig<'a, TService: Send + Sync + 'static> {
    block: &'a mut ExportRegistrationBlock,
    draft: Option<Draft<TService>>,
}

impl<'a, TService: Send + Sync + 'static> ExportConfig<'a, TService> {
    fn new(block: &'a mut ExportRegistrationBlock, activation: TypedActivation<TService>) -> Self {
        Self {
            block,
            draft: Some(Draft {
                activation,
                exports: Vec::new(),
                keyed_exports: Vec::new(),
                casts: AHashMap::new(),
                lifestyle: Lifestyle::Transient,
                conditions: Vec::new(),
                priority: 0,
                externally_owned: false,
                markers: Vec::new(),
                errors: Vec::new(),
            }),
        }
    }

    fn update(mut self, update: impl FnOnce(&mut Draft<TService>)) -> Self {
        if let Some(draft) = self.draft.as_mut() {
            update(draft);
        }

        self
    }

    /// Export as the activation type itself
    pub fn as_self(self) -> Self {
        self.as_trait::<TService>(|x| x)
    }

    /// Export as `TExport`, usually a trait object: `.as_trait::<dyn Api>(|x| x)`
    pub fn as_trait<TExport: ?Sized + Send + Sync + 'static>(
        self,
        cast: impl Fn(Arc<TService>) -> Arc<TExport> + Send + Sync + 'static,
    ) -> Self {
        self.update(|draft| {
            let ty = TExport::type_info();

            if !draft.exports.contains(&ty) {
                draft.exports.push(ty);
            }

            draft.casts.insert(ty, caster::<TService, TExport>(cast));
        })
    }

    /// Export as `TExport`, located only by `key`
    pub fn as_keyed<TExport: ?Sized + Send + Sync + 'static>(
        self,
        key: impl Into<Key>,
        cast: impl Fn(Arc<TService>) -> Arc<TExport> + Send + Sync + 'static,
    ) -> Self {
        let key = key.into();

        self.update(|draft| {
            let ty = TExport::type_info();

            draft.keyed_exports.push((ty, key));
            draft.casts.insert(ty, caster::<TService, TExport>(cast));
        })
    }

    pub fn as_self_keyed(self, key: impl Into<Key>) -> Self {
        self.as_keyed::<TService>(key, |x| x)
    }

    pub fn lifestyle(self, lifestyle: Lifestyle) -> Self {
        self.update(|draft| draft.lifestyle = lifestyle)
    }

    pub fn transient(self) -> Self {
        self.lifestyle(Lifestyle::Transient)
    }

    pub fn singleton(self) -> Self {
        self.lifestyle(Lifestyle::Singleton)
    }

    pub fn per_scope(self) -> Self {
        self.lifestyle(Lifestyle::SingletonPerScope)
    }

    pub fn per_named_scope(self, name: impl AsRef<str>) -> Self {
        self.lifestyle(Lifestyle::per_named_scope(name))
    }

    pub fn per_object_graph(self) -> Self {
        self.lifestyle(Lifestyle::SingletonPerObjectGraph)
    }

    pub fn weak_singleton(self) -> Self {
        self.lifestyle(Lifestyle::WeakSingleton)
    }

    pub fn thread_static(self) -> Self {
        self.lifestyle(Lifestyle::ThreadStatic)
    }

    #[cfg(feature = "task-local")]
    pub fn task_local(self) -> Self {
        self.lifestyle(Lifestyle::TaskLocal)
    }

    pub fn when(self, condition: Condition) -> Self {
        self.update(|draft| draft.conditions.push(condition))
    }

    pub fn when_injected_into<TTarget: ?Sized + 'static>(self) -> Self {
        self.when(Condition::injected_into::<TTarget>())
    }

    pub fn with_priority(self, priority: i32) -> Self {
        self.update(|draft| draft.priority = priority)
    }

    /// The container never disposes instances of this export
    pub fn externally_owned(self) -> Self {
        self.update(|draft| draft.externally_owned = true)
    }

    /// Dispose instances through their [`Dispose`] impl when the owning scope ends
    pub fn disposable(self) -> Self
    where
        TService: Dispose,
    {
        self.update(|draft| draft.activation.dispose = Some(<TService as Dispose>::dispose))
    }

    /// Run `cleanup` on every instance when the owning scope ends
    pub fn on_dispose(self, cleanup: impl Fn(&TService) + Send + Sync + 'static) -> Self {
        self.update(|draft| draft.activation.cleanup = Some(Arc::new(cleanup)))
    }

    /// Marker attached to the export, read by [`Condition::WhenClassHas`]
    pub fn with_marker<TMarker: ?Sized + 'static>(self) -> Self {
        self.update(|draft| draft.markers.push(TMarker::type_info()))
    }

    /// Configure the constructor parameter at `position`
    pub fn with_param(self, position: usize, configure: impl FnOnce(&mut ParamConfig)) -> Self {
        self.update(|draft| {
            let Some(dependency) = draft.activation.dependencies.get_mut(position) else {
                draft.invalid(format!("constructor has no parameter #{position}"));
                return;
            };

            let mut param = ParamConfig {
                dependency,
                errors: Vec::new(),
            };

            configure(&mut param);

            let errors = param.errors;
            draft.errors.extend(errors);
        })
    }

    /// Inject `TDependency` into the built value through `inject`
    pub fn import_member<TDependency: Locatable>(
        self,
        name: impl Into<Cow<'static, str>>,
        inject: impl Fn(&mut TService, TDependency) + Send + Sync + 'static,
    ) -> Self {
        self.import_member_with(name, inject, |_| {})
    }

    pub fn import_member_with<TDependency: Locatable>(
        self,
        name: impl Into<Cow<'static, str>>,
        inject: impl Fn(&mut TService, TDependency) + Send + Sync + 'static,
        configure: impl FnOnce(&mut ParamConfig),
    ) -> Self {
        let name = name.into();

        self.update(|draft| {
            if draft.activation.is_instance() {
                draft.invalid(format!("member '{name}' can not be injected into an exported instance"));
                return;
            }

            let mut dependency =
                Dependency::member(draft.activation.members.len(), TDependency::request());
            dependency.name = Some(name);

            let mut param = ParamConfig {
                dependency: &mut dependency,
                errors: Vec::new(),
            };

            configure(&mut param);

            let errors = param.errors;
            draft.errors.extend(errors);

            draft.activation.members.push(dependency);
            draft
                .activation
                .member_injectors
                .push(Box::new(move |service: &mut TService, instance: Instance| -> LocateResult<()> {
                    inject(service, TDependency::from_instance(instance)?);
                    Ok(())
                }));
        })
    }
}

impl<TService: Send + Sync + 'static> Drop for ExportConfig<'_, TService> {
    fn drop(&mut self) {
        if let Some(draft) = self.draft.take() {
            self.block.commit(draft.build());
        }
    }
}

/// Overrides for one constructor parameter or injected member
pub struct ParamConfig<'a> {
    dependency: &'a mut Dependency,
    errors: Vec<LocateError>,
}

impl ParamConfig<'_> {
    /// Name used by member conditions and by extra data lookups
    pub fn named(&mut self, name: impl Into<Cow<'static, str>>) -> &mut Self {
        self.dependency.name = Some(name.into());
        self
    }

    /// Locate the dependency by key
    pub fn key(&mut self, key: impl Into<Key>) -> &mut Self {
        self.dependency.key = Some(key.into());
        self
    }

    /// Marker read by [`Condition::WhenMemberHas`]
    pub fn marker<TMarker: ?Sized + 'static>(&mut self) -> &mut Self {
        self.dependency.markers.push(TMarker::type_info());
        self
    }

    /// Value used when nothing else satisfies the dependency
    pub fn default_value<TValue: ?Sized + Send + Sync + 'static>(
        &mut self,
        value: Arc<TValue>,
    ) -> &mut Self {
        if let Some(instance) = self.checked(value) {
            self.dependency.default = Some(instance);
        }

        self
    }

    /// Value always used instead of locating the dependency
    pub fn value<TValue: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<TValue>) -> &mut Self {
        if let Some(instance) = self.checked(value) {
            self.dependency.value = Some(instance);
        }

        self
    }

    fn checked<TValue: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<TValue>) -> Option<Instance> {
        let instance = Instance::from_arc(value);

        match self.dependency.request.kind() {
            RequestKind::Service(_) if instance.ty() == self.dependency.request.ty() => Some(instance),
            _ => {
                self.errors.push(LocateError::TypeMismatch {
                    expected: self.dependency.request.ty(),
                    found: instance.ty(),
                });

                None
            }
        }
    }
}
