use std::{marker::PhantomData, ops::Deref, sync::Arc};

use crate::{
    activation::{
        activator,
        builder::ActivationBuilder,
        context::StaticInjectionContext,
        plan::PlanNode,
        request::{Locatable, Request},
    },
    scope::{LifetimeScope, ScopeHandle},
    types::{
        error::LocateResult,
        instance::Instance,
        key::Key,
        type_info::{TypeInfo, TypeInfoSource},
    },
};

use super::WrapperStrategy;

/// `TService` activated in a new nested scope that lives as long as the wrapper.
///
/// The nested scope is named after the injected member, when there is one.
pub struct Scoped<TService: ?Sized> {
    value: Arc<TService>,
    scope: LifetimeScope,
}

impl<TService: ?Sized> Scoped<TService> {
    pub fn value(&self) -> &Arc<TService> {
        &self.value
    }

    pub fn scope(&self) -> &ScopeHandle {
        self.scope.handle()
    }

    pub fn dispose(&self) -> LocateResult<()> {
        self.scope.dispose()
    }
}

impl<TService: ?Sized> Deref for Scoped<TService> {
    type Target = TService;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<TService: ?Sized + 'static> std::fmt::Debug for Scoped<TService> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scoped")
            .field("service", &TService::type_info().name)
            .field("scope", &self.scope.to_string())
            .finish()
    }
}

struct ScopedWrapper<TService: ?Sized>(PhantomData<fn() -> Arc<TService>>);

impl<TService: ?Sized + Send + Sync + 'static> WrapperStrategy for ScopedWrapper<TService> {
    fn wrapped_type(&self) -> TypeInfo {
        TService::type_info()
    }

    fn build_plan(
        &self,
        builder: &ActivationBuilder<'_>,
        key: Option<&Key>,
        ctx: &StaticInjectionContext,
    ) -> LocateResult<Option<PlanNode>> {
        let Some(inner) = builder.build_service(TService::type_info(), key, ctx)? else {
            return Ok(None);
        };

        let name = ctx.target().and_then(|x| x.member.clone());

        Ok(Some(inner.map(move |inner| {
            activator(move |scope, _, ctx| {
                let child = scope.begin_lifetime_scope(name.as_deref())?;
                let value = inner(child.handle(), child.disposal(), ctx)?.to_arc::<TService>()?;

                Ok(Instance::new(Scoped {
                    value,
                    scope: child,
                }))
            })
        })))
    }
}

impl<TService: ?Sized + Send + Sync + 'static> Locatable for Scoped<TService> {
    fn request() -> Request {
        Request::wrapper::<Self>(ScopedWrapper::<TService>(PhantomData))
    }

    fn from_instance(instance: Instance) -> LocateResult<Self> {
        instance.take()
    }
}
