pub mod disposal;
pub(crate) mod registry;
pub(crate) mod root;

use std::{
    ops::Deref,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    activation::{
        request::{Locatable, Request, RequestKind},
        runtime::RuntimeContext,
    },
    builder::ExportRegistrationBlock,
    lifestyle::InstanceSlots,
    options::ContainerOptions,
    strategy::Strategy,
    types::{
        error::{LocateError, LocateResult},
        extra_data::ExtraData,
        instance::Instance,
        key::Key,
    },
};

use disposal::{DisposalScope, Dispose};
use registry::Registry;
use root::RootState;

fn next_scope_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct ScopeInner {
    id: u64,
    name: Option<Arc<str>>,
    parent: Option<ScopeHandle>,
    root: Arc<RootState>,
    registry: Arc<Registry>,
    disposal: Arc<DisposalScope>,
    per_scope: InstanceSlots,
}

impl std::fmt::Debug for ScopeInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeInner")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|x| x.id()))
            .field("disposed", &self.disposal.is_disposed())
            .finish()
    }
}

/// Shared handle to a node of the scope tree.
///
/// Handles never dispose anything on drop, ownership lives in [`Container`] and
/// [`LifetimeScope`].
#[derive(Debug, Clone)]
pub struct ScopeHandle {
    inner: Arc<ScopeInner>,
}

impl ScopeHandle {
    fn new_root(options: ContainerOptions) -> Self {
        let root = Arc::new(RootState::new(options.clone()));

        Self {
            inner: Arc::new(ScopeInner {
                id: next_scope_id(),
                name: None,
                parent: None,
                disposal: root.disposal.clone(),
                root,
                registry: Arc::new(Registry::new(options)),
                per_scope: InstanceSlots::default(),
            }),
        }
    }

    fn new_child(&self, name: Option<&str>, registry: Arc<Registry>) -> Self {
        let scope = Self {
            inner: Arc::new(ScopeInner {
                id: next_scope_id(),
                name: name.map(Arc::from),
                parent: Some(self.clone()),
                root: self.inner.root.clone(),
                registry,
                disposal: Arc::new(DisposalScope::new()),
                per_scope: InstanceSlots::default(),
            }),
        };

        tracing::debug!(
            target: "xioc",
            id = scope.id(),
            parent = self.id(),
            name = ?name,
            "scope started"
        );

        scope
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn parent(&self) -> Option<&ScopeHandle> {
        self.inner.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposal.is_disposed()
    }

    /// This scope followed by its ancestors up to the root
    pub fn ancestors(&self) -> impl Iterator<Item = ScopeHandle> {
        let mut current = Some(self.clone());

        std::iter::from_fn(move || {
            let scope = current.take()?;
            current = scope.parent().cloned();
            Some(scope)
        })
    }

    pub(crate) fn root(&self) -> ScopeHandle {
        let mut scope = self;

        while let Some(parent) = scope.parent() {
            scope = parent;
        }

        scope.clone()
    }

    pub(crate) fn root_state(&self) -> &RootState {
        &self.inner.root
    }

    pub(crate) fn options(&self) -> &ContainerOptions {
        &self.inner.root.options
    }

    pub(crate) fn disposal(&self) -> &Arc<DisposalScope> {
        &self.inner.disposal
    }

    pub(crate) fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    pub(crate) fn per_scope(&self) -> &InstanceSlots {
        &self.inner.per_scope
    }

    pub(crate) fn ensure_alive(&self) -> LocateResult<()> {
        if self.is_disposed() || self.inner.root.disposal.is_disposed() {
            return Err(LocateError::ScopeDisposed {
                scope: self.to_string(),
            });
        }

        Ok(())
    }

    pub fn locate<R: Locatable>(&self) -> LocateResult<R> {
        R::from_instance(self.locate_request(&R::request(), None, None)?)
    }

    pub fn locate_by_key<R: Locatable>(&self, key: impl Into<Key>) -> LocateResult<R> {
        R::from_instance(self.locate_request(&R::request(), Some(&key.into()), None)?)
    }

    /// Locate with ambient values available to dependencies no strategy satisfies
    pub fn locate_with<R: Locatable>(&self, extra: ExtraData) -> LocateResult<R> {
        R::from_instance(self.locate_request(&R::request(), None, Some(extra))?)
    }

    /// `Ok(None)` when nothing is registered for `R`, other failures are still errors
    pub fn try_locate<R: Locatable>(&self) -> LocateResult<Option<R>> {
        let mut ctx = RuntimeContext::new(None);

        self.resolve(&R::request(), None, self.disposal(), &mut ctx)?
            .map(R::from_instance)
            .transpose()
    }

    /// Every eligible export of `T`, local registrations first
    pub fn locate_all<T: ?Sized + Send + Sync + 'static>(&self) -> LocateResult<Vec<Arc<T>>> {
        self.locate::<Vec<Arc<T>>>()
    }

    pub fn can_locate<R: Locatable>(&self) -> bool {
        self.can_locate_request(&R::request(), None)
    }

    pub fn can_locate_by_key<R: Locatable>(&self, key: impl Into<Key>) -> bool {
        self.can_locate_request(&R::request(), Some(&key.into()))
    }

    fn can_locate_request(&self, request: &Request, key: Option<&Key>) -> bool {
        !self.is_disposed()
            && self
                .inner
                .registry
                .activator(request, key)
                .is_ok_and(|x| x.is_some())
    }

    /// Type erased locate
    pub fn locate_request(
        &self,
        request: &Request,
        key: Option<&Key>,
        extra: Option<ExtraData>,
    ) -> LocateResult<Instance> {
        let mut ctx = RuntimeContext::new(extra.map(Arc::new));

        self.resolve(request, key, self.disposal(), &mut ctx)?
            .ok_or_else(|| LocateError::LocateFailure {
                ty: request.ty(),
                key: key.cloned(),
                trace: String::new(),
            })
    }

    /// Run the cached activator for the request, new instances are tracked by `disposal`.
    ///
    /// `Ok(None)` when nothing can satisfy the request.
    pub(crate) fn resolve(
        &self,
        request: &Request,
        key: Option<&Key>,
        disposal: &Arc<DisposalScope>,
        ctx: &mut RuntimeContext,
    ) -> LocateResult<Option<Instance>> {
        self.ensure_alive()?;

        let Some(activator) = self.inner.registry.activator(request, key)? else {
            let ambient = match request.kind() {
                RequestKind::Service(_) => ctx
                    .extra()
                    .and_then(|extra| extra.find(None, request.ty()))
                    .cloned(),
                RequestKind::Wrapper(_) => None,
            };

            return Ok(ambient);
        };

        activator(self, disposal, ctx).map(Some)
    }

    /// Nested scope sharing this scope's registrations
    pub fn begin_lifetime_scope(&self, name: Option<&str>) -> LocateResult<LifetimeScope> {
        self.ensure_alive()?;

        Ok(LifetimeScope {
            handle: self.new_child(name, self.inner.registry.clone()),
        })
    }

    /// Nested scope with registrations of its own on top of this scope's
    pub fn create_child_scope(
        &self,
        configure: impl FnOnce(&mut ExportRegistrationBlock),
    ) -> LocateResult<LifetimeScope> {
        self.ensure_alive()?;

        let registry = Arc::new(Registry::child(&self.inner.registry));

        let mut block = ExportRegistrationBlock::new();
        configure(&mut block);
        block.apply(&registry)?;

        Ok(LifetimeScope {
            handle: self.new_child(None, registry),
        })
    }

    /// Release everything tracked by this scope. Children are left alone.
    pub fn dispose(&self) -> LocateResult<()> {
        let result = self.inner.disposal.dispose();

        self.inner.per_scope.clear();

        if self.is_root() {
            self.inner.root.clear();
        }

        tracing::debug!(target: "xioc", id = self.id(), ok = result.is_ok(), "scope disposed");

        result
    }

    /// Dispose `service` together with this scope
    pub fn track<TService: Dispose + 'static>(&self, service: Arc<TService>) -> LocateResult<()> {
        self.inner.disposal.track_instance(service)
    }

    /// Run `callback` when this scope is disposed
    pub fn on_dispose(
        &self,
        callback: impl FnOnce() -> anyhow::Result<()> + Send + 'static,
    ) -> LocateResult<()> {
        self.inner.disposal.on_dispose(callback)
    }
}

impl std::fmt::Display for ScopeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}#{}", self.id()),
            None => write!(f, "#{}", self.id()),
        }
    }
}

/// Root scope owning strategies, singletons and the root disposal scope.
///
/// Dropping the container disposes it.
#[derive(Debug)]
pub struct Container {
    handle: ScopeHandle,
}

impl Container {
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        let handle = ScopeHandle::new_root(options);

        tracing::debug!(target: "xioc", id = handle.id(), "container created");

        Self { handle }
    }

    /// Add the exports configured on a registration block
    pub fn configure(&self, configure: impl FnOnce(&mut ExportRegistrationBlock)) -> LocateResult<()> {
        let mut block = ExportRegistrationBlock::new();
        configure(&mut block);
        block.apply(&self.handle.inner.registry)
    }

    pub fn register(&self, strategy: Strategy) -> LocateResult<Arc<Strategy>> {
        self.handle.inner.registry.register(strategy)
    }

    pub fn handle(&self) -> &ScopeHandle {
        &self.handle
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Container {
    type Target = ScopeHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if let Err(err) = self.handle.dispose() {
            tracing::warn!(target: "xioc", id = self.handle.id(), %err, "container disposal failed");
        }
    }
}

/// Owned nested scope, disposed on drop
#[derive(Debug)]
pub struct LifetimeScope {
    handle: ScopeHandle,
}

impl LifetimeScope {
    pub fn handle(&self) -> &ScopeHandle {
        &self.handle
    }
}

impl Deref for LifetimeScope {
    type Target = ScopeHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for LifetimeScope {
    fn drop(&mut self) {
        if let Err(err) = self.handle.dispose() {
            tracing::warn!(target: "xioc", id = self.handle.id(), %err, "scope disposal failed");
        }
    }
}
