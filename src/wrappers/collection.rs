use std::{marker::PhantomData, sync::Arc};

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

use super::WrapperStrategy;

/// Every eligible export of `TService` gathered into `TCollection`
struct CollectionWrapper<TCollection, TService: ?Sized>(
    PhantomData<fn() -> (TCollection, Arc<TService>)>,
);

impl<TCollection, TService> WrapperStrategy for CollectionWrapper<TCollection, TService>
where
    TCollection: FromIterator<Arc<TService>> + Send + Sync + 'static,
    TService: ?Sized + Send + Sync + 'static,
{
    fn wrapped_type(&self) -> TypeInfo {
        TService::type_info()
    }

    fn build_plan(
        &self,
        builder: &ActivationBuilder<'_>,
        key: Option<&Key>,
        ctx: &StaticInjectionContext,
    ) -> LocateResult<Option<PlanNode>> {
        let items = builder.build_all(TService::type_info(), key, ctx)?;

        Ok(Some(PlanNode::composite(items, |items| {
            activator(move |scope, disposal, ctx| {
                let collection = items
                    .iter()
                    .map(|item| item(scope, disposal, ctx)?.to_arc::<TService>())
                    .collect::<LocateResult<TCollection>>()?;

                Ok(Instance::new(collection))
            })
        })))
    }
}

impl<TService: ?Sized + Send + Sync + 'static> Locatable for Vec<Arc<TService>> {
    fn request() -> Request {
        Request::wrapper::<Self>(CollectionWrapper::<Self, TService>(PhantomData))
    }

    fn from_instance(instance: Instance) -> LocateResult<Self> {
        instance.take()
    }
}

impl<TService: ?Sized + Send + Sync + 'static> Locatable for Box<[Arc<TService>]> {
    fn request() -> Request {
        Request::wrapper::<Self>(CollectionWrapper::<Self, TService>(PhantomData))
    }

    fn from_instance(instance: Instance) -> LocateResult<Self> {
        instance.take()
    }
}
