pub mod collection;
pub mod constructor;
pub mod dependency;

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use ahash::AHashMap;

use crate::{
    activation::context::StaticInjectionContext,
    condition::Condition,
    lifestyle::Lifestyle,
    scope::disposal::Disposable,
    types::{
        error::{LocateError, LocateResult},
        instance::Instance,
        key::Key,
        type_info::{TypeInfo, TypeInfoSource},
    },
};

use constructor::Constructor;
use dependency::Dependency;

/// Registration order, also used as the strategy identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrategyId(u64);

impl StrategyId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Converts the activation result (`Arc<TImpl>`) into an export (`Arc<TExport>`)
pub(crate) type Caster = Arc<dyn Fn(Instance) -> LocateResult<Instance> + Send + Sync>;

/// Weak handle of an activation result, upgraded by the weak singleton lifestyle
pub(crate) type WeakInstance = Box<dyn Fn() -> Option<Instance> + Send + Sync>;

/// Construction metadata of a strategy: what it needs and how to build it
pub trait Activation: Send + Sync {
    /// Constructor dependencies, in parameter order
    fn dependencies(&self) -> &[Dependency];

    /// Dependencies injected after construction
    fn members(&self) -> &[Dependency];

    fn activate(&self, args: Vec<Instance>, members: Vec<Instance>) -> LocateResult<Instance>;

    /// Disposal entry for a produced instance, `None` when nothing needs releasing
    fn disposer(&self, instance: &Instance) -> Option<Disposable>;

    fn downgrade(&self, instance: &Instance) -> Option<WeakInstance>;
}

/// How to produce one kind of instance and what it is exported as
pub struct Strategy {
    id: StrategyId,
    activation_type: TypeInfo,
    exports: Vec<TypeInfo>,
    keyed_exports: Vec<(TypeInfo, Key)>,
    casts: AHashMap<TypeInfo, Caster>,
    lifestyle: Lifestyle,
    conditions: Vec<Condition>,
    priority: i32,
    externally_owned: bool,
    markers: Arc<[TypeInfo]>,
    activation: Box<dyn Activation>,
}

impl Strategy {
    /// Transient strategy built by a constructor, exported as its own type
    pub fn from_constructor<TArgs, C: Constructor<TArgs>>(constructor: C) -> Self {
        Self::from_activation::<C::Output>(TypedActivation::from_constructor(constructor))
    }

    /// Singleton strategy handing out an existing instance, never disposed by the container
    pub fn from_instance<TImpl: Send + Sync + 'static>(instance: Arc<TImpl>) -> Self {
        let mut strategy = Self::from_activation::<TImpl>(TypedActivation::instance(instance));
        strategy.externally_owned = true;
        strategy.lifestyle = Lifestyle::Singleton;
        strategy
    }

    /// Strategy exporting only its own activation type.
    ///
    /// Prefer the registration block, this is the raw surface used by discovery collaborators.
    pub fn from_activation<TImpl: Send + Sync + 'static>(
        activation: impl Activation + 'static,
    ) -> Self {
        let mut casts = AHashMap::new();
        casts.insert(TImpl::type_info(), identity_caster());

        Self {
            id: StrategyId::next(),
            activation_type: TImpl::type_info(),
            exports: vec![TImpl::type_info()],
            keyed_exports: Vec::new(),
            casts,
            lifestyle: Lifestyle::Transient,
            conditions: Vec::new(),
            priority: 0,
            externally_owned: false,
            markers: Arc::from([]),
            activation: Box::new(activation),
        }
    }

    pub(crate) fn from_parts(parts: StrategyParts) -> LocateResult<Self> {
        let StrategyParts {
            activation_type,
            exports,
            keyed_exports,
            casts,
            lifestyle,
            conditions,
            priority,
            externally_owned,
            markers,
            activation,
        } = parts;

        if exports.is_empty() && keyed_exports.is_empty() {
            return Err(LocateError::InvalidConfiguration {
                ty: activation_type,
                reason: "strategy exports nothing".to_string(),
            });
        }

        if let Some(missing) = exports
            .iter()
            .chain(keyed_exports.iter().map(|(ty, _)| ty))
            .find(|ty| !casts.contains_key(*ty))
        {
            return Err(LocateError::InvalidConfiguration {
                ty: activation_type,
                reason: format!("no conversion to exported type {missing}"),
            });
        }

        Ok(Self {
            id: StrategyId::next(),
            activation_type,
            exports,
            keyed_exports,
            casts,
            lifestyle,
            conditions,
            priority,
            externally_owned,
            markers: markers.into(),
            activation,
        })
    }

    pub fn id(&self) -> StrategyId {
        self.id
    }

    pub fn activation_type(&self) -> TypeInfo {
        self.activation_type
    }

    pub fn exports(&self) -> &[TypeInfo] {
        &self.exports
    }

    pub fn keyed_exports(&self) -> &[(TypeInfo, Key)] {
        &self.keyed_exports
    }

    pub fn lifestyle(&self) -> &Lifestyle {
        &self.lifestyle
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn externally_owned(&self) -> bool {
        self.externally_owned
    }

    pub fn markers(&self) -> &[TypeInfo] {
        &self.markers
    }

    pub(crate) fn shared_markers(&self) -> Arc<[TypeInfo]> {
        self.markers.clone()
    }

    pub fn activation(&self) -> &dyn Activation {
        self.activation.as_ref()
    }

    pub(crate) fn caster(&self, export: TypeInfo) -> Option<&Caster> {
        self.casts.get(&export)
    }

    /// True when every condition holds for the given injection context
    pub fn meets_conditions(&self, ctx: &StaticInjectionContext) -> bool {
        self.conditions.iter().all(|x| x.meets(self, ctx))
    }

    /// Instances produced by this strategy go to a disposal scope
    pub(crate) fn tracks_disposal(&self) -> bool {
        !self.externally_owned && self.lifestyle.tracks_disposal()
    }

    pub fn with_lifestyle(mut self, lifestyle: Lifestyle) -> Self {
        self.lifestyle = lifestyle;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_externally_owned(mut self) -> Self {
        self.externally_owned = true;
        self
    }
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strategy")
            .field("id", &self.id)
            .field("activation_type", &self.activation_type.name)
            .field("exports", &self.exports)
            .field("keyed_exports", &self.keyed_exports)
            .field("lifestyle", &self.lifestyle)
            .field("priority", &self.priority)
            .field("externally_owned", &self.externally_owned)
            .finish()
    }
}

/// Everything the registration block collected for one strategy
pub(crate) struct StrategyParts {
    pub(crate) activation_type: TypeInfo,
    pub(crate) exports: Vec<TypeInfo>,
    pub(crate) keyed_exports: Vec<(TypeInfo, Key)>,
    pub(crate) casts: AHashMap<TypeInfo, Caster>,
    pub(crate) lifestyle: Lifestyle,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) priority: i32,
    pub(crate) externally_owned: bool,
    pub(crate) markers: Vec<TypeInfo>,
    pub(crate) activation: Box<dyn Activation>,
}

pub(crate) fn identity_caster() -> Caster {
    Arc::new(Ok::<Instance, LocateError>)
}

/// Caster unsizing `Arc<TImpl>` into `Arc<TExport>`
pub(crate) fn caster<TImpl, TExport>(
    cast: impl Fn(Arc<TImpl>) -> Arc<TExport> + Send + Sync + 'static,
) -> Caster
where
    TImpl: Send + Sync + 'static,
    TExport: ?Sized + Send + Sync + 'static,
{
    Arc::new(move |instance: Instance| -> LocateResult<Instance> {
        let service = instance.to_arc::<TImpl>()?;
        Ok(Instance::from_arc(cast(service)))
    })
}

type Construct<T> = Box<dyn Fn(Vec<Instance>) -> LocateResult<T> + Send + Sync>;
pub(crate) type MemberInjector<T> = Box<dyn Fn(&mut T, Instance) -> LocateResult<()> + Send + Sync>;
pub(crate) type Cleanup<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub(crate) enum Source<T> {
    Construct(Construct<T>),
    Instance(Arc<T>),
}

/// Activation of a concrete type `T`, held as `Arc<T>` once built
pub(crate) struct TypedActivation<T> {
    pub(crate) source: Source<T>,
    pub(crate) dependencies: Vec<Dependency>,
    pub(crate) members: Vec<Dependency>,
    pub(crate) member_injectors: Vec<MemberInjector<T>>,
    pub(crate) dispose: Option<fn(&T) -> anyhow::Result<()>>,
    pub(crate) cleanup: Option<Cleanup<T>>,
}

impl<T: Send + Sync + 'static> TypedActivation<T> {
    pub(crate) fn construct(
        construct: impl Fn(Vec<Instance>) -> LocateResult<T> + Send + Sync + 'static,
        dependencies: Vec<Dependency>,
    ) -> Self {
        Self {
            source: Source::Construct(Box::new(construct)),
            dependencies,
            members: Vec::new(),
            member_injectors: Vec::new(),
            dispose: None,
            cleanup: None,
        }
    }

    pub(crate) fn from_constructor<TArgs, C>(constructor: C) -> Self
    where
        C: Constructor<TArgs, Output = T>,
    {
        let dependencies = C::dependencies()
            .into_iter()
            .enumerate()
            .map(|(position, request)| Dependency::parameter(position, request))
            .collect();

        Self::construct(move |args| constructor.construct(args), dependencies)
    }

    pub(crate) fn is_instance(&self) -> bool {
        matches!(self.source, Source::Instance(_))
    }

    pub(crate) fn instance(instance: Arc<T>) -> Self {
        Self {
            source: Source::Instance(instance),
            dependencies: Vec::new(),
            members: Vec::new(),
            member_injectors: Vec::new(),
            dispose: None,
            cleanup: None,
        }
    }
}

impl<T: Send + Sync + 'static> Activation for TypedActivation<T> {
    fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    fn members(&self) -> &[Dependency] {
        &self.members
    }

    fn activate(&self, args: Vec<Instance>, members: Vec<Instance>) -> LocateResult<Instance> {
        let service = match &self.source {
            Source::Construct(construct) => {
                let mut service = construct(args)?;

                for (inject, member) in self.member_injectors.iter().zip(members) {
                    inject(&mut service, member)?;
                }

                Arc::new(service)
            }
            Source::Instance(instance) => instance.clone(),
        };

        Ok(Instance::from_arc(service))
    }

    fn disposer(&self, instance: &Instance) -> Option<Disposable> {
        if self.dispose.is_none() && self.cleanup.is_none() {
            return None;
        }

        let service = instance.to_arc::<T>().ok()?;
        let dispose = self.dispose;
        let cleanup = self.cleanup.clone();

        Some(Disposable::new::<T>(
            Arc::as_ptr(&service) as *const () as usize,
            move || {
                if let Some(cleanup) = cleanup {
                    cleanup(&service);
                }

                match dispose {
                    Some(dispose) => dispose(&service),
                    None => Ok(()),
                }
            },
        ))
    }

    fn downgrade(&self, instance: &Instance) -> Option<WeakInstance> {
        let service = instance.to_arc::<T>().ok()?;
        let weak = Arc::downgrade(&service);

        Some(Box::new(move || weak.upgrade().map(Instance::from_arc)))
    }
}
