use std::sync::Arc;

use crate::{
    types::{
        error::LocateResult,
        instance::Instance,
        type_info::{TypeInfo, TypeInfoSource},
    },
    wrappers::WrapperStrategy,
};

/// Anything a scope can hand out: a shared service `Arc<T>` or a wrapper shape around one.
pub trait Locatable: Sized + Send + Sync + 'static {
    /// Describe how to satisfy a request for `Self`
    fn request() -> Request;

    /// Convert the activation result back to `Self`
    fn from_instance(instance: Instance) -> LocateResult<Self>;
}

/// Requested shape.
///
/// `ty` is the type handed out to the caller and is the activator cache key.
#[derive(Clone)]
pub struct Request {
    ty: TypeInfo,
    kind: RequestKind,
}

#[derive(Clone)]
pub enum RequestKind {
    /// Single service export, value held as `Arc<T>`
    Service(TypeInfo),
    /// Composite or deferred shape resolved by a wrapper strategy
    Wrapper(Arc<dyn WrapperStrategy>),
}

impl Request {
    pub fn service<TService: ?Sized + Send + Sync + 'static>() -> Self {
        Self {
            ty: Arc::<TService>::type_info(),
            kind: RequestKind::Service(TService::type_info()),
        }
    }

    pub fn wrapper<TWrapper: 'static>(wrapper: impl WrapperStrategy) -> Self {
        Self {
            ty: TWrapper::type_info(),
            kind: RequestKind::Wrapper(Arc::new(wrapper)),
        }
    }

    pub fn ty(&self) -> TypeInfo {
        self.ty
    }

    pub fn kind(&self) -> &RequestKind {
        &self.kind
    }

    /// Exported type for service requests, wrapped type for wrappers
    pub fn service_type(&self) -> TypeInfo {
        match &self.kind {
            RequestKind::Service(ty) => *ty,
            RequestKind::Wrapper(wrapper) => wrapper.wrapped_type(),
        }
    }

    pub fn is_wrapper(&self) -> bool {
        matches!(self.kind, RequestKind::Wrapper(_))
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("ty", &self.ty.name)
            .field("service", &self.service_type().name)
            .finish()
    }
}

impl<TService: ?Sized + Send + Sync + 'static> Locatable for Arc<TService> {
    fn request() -> Request {
        Request::service::<TService>()
    }

    fn from_instance(instance: Instance) -> LocateResult<Self> {
        instance.to_arc::<TService>()
    }
}
