use std::{marker::PhantomData, ops::Deref, sync::Arc};

use crate::{
    activation::{
        activator,
        builder::ActivationBuilder,
        context::StaticInjectionContext,
        plan::PlanNode,
        request::{Locatable, Request},
    },
    scope::disposal::DisposalScope,
    types::{
        error::LocateResult,
        instance::Instance,
        key::Key,
        type_info::{TypeInfo, TypeInfoSource},
    },
};

use super::WrapperStrategy;

/// `TService` with a disposal scope of its own.
///
/// Disposables created for this activation are released with the wrapper instead of the
/// requesting scope. Dropping disposes.
pub struct Owned<TService: ?Sized> {
    value: Arc<TService>,
    disposal: Arc<DisposalScope>,
}

impl<TService: ?Sized> Owned<TService> {
    pub fn value(&self) -> &Arc<TService> {
        &self.value
    }

    pub fn dispose(&self) -> LocateResult<()> {
        self.disposal.dispose()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposal.is_disposed()
    }
}

impl<TService: ?Sized> Deref for Owned<TService> {
    type Target = TService;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<TService: ?Sized> Drop for Owned<TService> {
    fn drop(&mut self) {
        if let Err(err) = self.disposal.dispose() {
            tracing::warn!(target: "xioc", %err, "owned disposal failed");
        }
    }
}

impl<TService: ?Sized + 'static> std::fmt::Debug for Owned<TService> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Owned")
            .field("service", &TService::type_info().name)
            .field("tracked", &self.disposal.len())
            .finish()
    }
}

struct OwnedWrapper<TService: ?Sized>(PhantomData<fn() -> Arc<TService>>);

impl<TService: ?Sized + Send + Sync + 'static> WrapperStrategy for OwnedWrapper<TService> {
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

        Ok(Some(inner.map(|inner| {
            activator(move |scope, _, ctx| {
                let disposal = Arc::new(DisposalScope::new());

                let value = match inner(scope, &disposal, ctx).and_then(|x| x.to_arc::<TService>()) {
                    Ok(value) => value,
                    Err(err) => {
                        if let Err(cleanup) = disposal.dispose() {
                            tracing::warn!(target: "xioc", %cleanup, "owned cleanup after failed activation failed");
                        }

                        return Err(err);
                    }
                };

                Ok(Instance::new(Owned { value, disposal }))
            })
        })))
    }
}

impl<TService: ?Sized + Send + Sync + 'static> Locatable for Owned<TService> {
    fn request() -> Request {
        Request::wrapper::<Self>(OwnedWrapper::<TService>(PhantomData))
    }

    fn from_instance(instance: Instance) -> LocateResult<Self> {
        instance.take()
    }
}
