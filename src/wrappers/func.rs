use std::{marker::PhantomData, sync::Arc};

use parking_lot::Mutex;

use crate::{
    activation::{
        Activator, activator,
        builder::ActivationBuilder,
        compiler,
        context::StaticInjectionContext,
        plan::PlanNode,
        request::{Locatable, Request},
        runtime::RuntimeContext,
    },
    scope::{ScopeHandle, disposal::DisposalScope},
    types::{
        error::{LocateError, LocateResult},
        extra_data::ExtraData,
        instance::Instance,
        key::Key,
        type_info::{TypeInfo, TypeInfoSource},
    },
};

use super::WrapperStrategy;

/// Plan of a deferred wrapper, built on first call instead of with the enclosing plan.
///
/// Recompiled when the registry gained strategies since the last build.
pub(crate) struct DeferredPlan {
    request: Request,
    key: Option<Key>,
    ctx: StaticInjectionContext,
    compiled: Mutex<Option<(u64, Activator)>>,
}

impl DeferredPlan {
    /// `None` when nothing could satisfy a single `TService` at this point of the plan
    pub(crate) fn for_service<TService: ?Sized + Send + Sync + 'static>(
        builder: &ActivationBuilder<'_>,
        key: Option<&Key>,
        ctx: &StaticInjectionContext,
    ) -> Option<Arc<Self>> {
        if !builder.can_locate_service(TService::type_info(), key, ctx) {
            return None;
        }

        Some(Arc::new(Self {
            request: Request::service::<TService>(),
            key: key.cloned(),
            ctx: ctx.deferred(),
            compiled: Mutex::new(None),
        }))
    }

    fn activator(&self, scope: &ScopeHandle) -> LocateResult<Activator> {
        let registry = scope.registry();
        let generation = registry.generation();

        if let Some((compiled, activator)) = &*self.compiled.lock()
            && *compiled == generation
        {
            return Ok(activator.clone());
        }

        let plan = ActivationBuilder::new(registry)
            .build_request(&self.request, self.key.as_ref(), &self.ctx)?
            .ok_or_else(|| LocateError::LocateFailure {
                ty: self.request.ty(),
                key: self.key.clone(),
                trace: self.ctx.trace(),
            })?;

        let activator = compiler::compile(plan);

        *self.compiled.lock() = Some((generation, activator.clone()));

        Ok(activator)
    }

    pub(crate) fn activate(
        &self,
        scope: &ScopeHandle,
        disposal: &Arc<DisposalScope>,
        extra: Option<Arc<ExtraData>>,
    ) -> LocateResult<Instance> {
        scope.ensure_alive()?;

        let activator = self.activator(scope)?;

        activator(scope, disposal, &mut RuntimeContext::new(extra))
    }
}

/// Deferred factory of `TService`, every call runs a new activation in the captured scope
pub struct Func<TService: ?Sized> {
    plan: Arc<DeferredPlan>,
    scope: ScopeHandle,
    disposal: Arc<DisposalScope>,
    extra: Option<Arc<ExtraData>>,
    _service: PhantomData<fn() -> Arc<TService>>,
}

impl<TService: ?Sized + Send + Sync + 'static> Func<TService> {
    pub fn call(&self) -> LocateResult<Arc<TService>> {
        self.plan
            .activate(&self.scope, &self.disposal, self.extra.clone())?
            .to_arc()
    }

    /// Call with ambient values replacing the ones captured with the factory
    pub fn call_with(&self, extra: ExtraData) -> LocateResult<Arc<TService>> {
        self.plan
            .activate(&self.scope, &self.disposal, Some(Arc::new(extra)))?
            .to_arc()
    }
}

impl<TService: ?Sized> Clone for Func<TService> {
    fn clone(&self) -> Self {
        Self {
            plan: self.plan.clone(),
            scope: self.scope.clone(),
            disposal: self.disposal.clone(),
            extra: self.extra.clone(),
            _service: PhantomData,
        }
    }
}

impl<TService: ?Sized + 'static> std::fmt::Debug for Func<TService> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Func")
            .field("service", &TService::type_info().name)
            .field("scope", &self.scope.id())
            .finish()
    }
}

struct FuncWrapper<TService: ?Sized>(PhantomData<fn() -> Arc<TService>>);

impl<TService: ?Sized + Send + Sync + 'static> WrapperStrategy for FuncWrapper<TService> {
    fn wrapped_type(&self) -> TypeInfo {
        TService::type_info()
    }

    fn build_plan(
        &self,
        builder: &ActivationBuilder<'_>,
        key: Option<&Key>,
        ctx: &StaticInjectionContext,
    ) -> LocateResult<Option<PlanNode>> {
        let Some(plan) = DeferredPlan::for_service::<TService>(builder, key, ctx) else {
            return Ok(None);
        };

        Ok(Some(PlanNode::runtime(activator(move |scope, disposal, ctx| {
            Ok(Instance::new(Func::<TService> {
                plan: plan.clone(),
                scope: scope.clone(),
                disposal: disposal.clone(),
                extra: ctx.extra.clone(),
                _service: PhantomData,
            }))
        }))))
    }
}

impl<TService: ?Sized + Send + Sync + 'static> Locatable for Func<TService> {
    fn request() -> Request {
        Request::wrapper::<Self>(FuncWrapper::<TService>(PhantomData))
    }

    fn from_instance(instance: Instance) -> LocateResult<Self> {
        instance.take()
    }
}
