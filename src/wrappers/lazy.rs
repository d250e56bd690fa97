use std::{marker::PhantomData, sync::Arc};

use once_cell::sync::OnceCell;

use crate::{
    activation::{
        activator,
        builder::ActivationBuilder,
        context::StaticInjectionContext,
        plan::PlanNode,
        request::{Locatable, Request},
    },
    types::{
        error::LocateResult,
        instance::Instance,
        key::Key,
        type_info::{TypeInfo, TypeInfoSource},
    },
};

use super::{WrapperStrategy, func::Func};

/// `TService` located on first access and kept afterwards
pub struct Lazy<TService: ?Sized> {
    func: Func<TService>,
    value: OnceCell<Arc<TService>>,
}

impl<TService: ?Sized + Send + Sync + 'static> Lazy<TService> {
    pub fn get(&self) -> LocateResult<&Arc<TService>> {
        self.value.get_or_try_init(|| self.func.call())
    }

    pub fn is_created(&self) -> bool {
        self.value.get().is_some()
    }
}

impl<TService: ?Sized + 'static> std::fmt::Debug for Lazy<TService> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lazy")
            .field("service", &TService::type_info().name)
            .field("created", &self.value.get().is_some())
            .finish()
    }
}

struct LazyWrapper<TService: ?Sized>(PhantomData<fn() -> Arc<TService>>);

impl<TService: ?Sized + Send + Sync + 'static> WrapperStrategy for LazyWrapper<TService> {
    fn wrapped_type(&self) -> TypeInfo {
        TService::type_info()
    }

    fn build_plan(
        &self,
        builder: &ActivationBuilder<'_>,
        key: Option<&Key>,
        ctx: &StaticInjectionContext,
    ) -> LocateResult<Option<PlanNode>> {
        let Some(func) = builder.build_request(&Func::<TService>::request(), key, ctx)? else {
            return Ok(None);
        };

        Ok(Some(func.map(|func| {
            activator(move |scope, disposal, ctx| {
                Ok(Instance::new(Lazy {
                    func: func(scope, disposal, ctx)?.take::<Func<TService>>()?,
                    value: OnceCell::new(),
                }))
            })
        })))
    }
}

impl<TService: ?Sized + Send + Sync + 'static> Locatable for Lazy<TService> {
    fn request() -> Request {
        Request::wrapper::<Self>(LazyWrapper::<TService>(PhantomData))
    }

    fn from_instance(instance: Instance) -> LocateResult<Self> {
        instance.take()
    }
}
