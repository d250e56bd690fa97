use std::marker::PhantomData;

use crate::{
    activation::{
        activator,
        builder::ActivationBuilder,
        context::StaticInjectionContext,
        plan::PlanNode,
        request::{Locatable, Request},
    },
    types::{
        error::{LocateError, LocateResult},
        instance::Instance,
        key::Key,
        type_info::TypeInfo,
    },
};

use super::WrapperStrategy;

/// Stand in for a dependency nothing could satisfy
struct Absent;

struct OptionalWrapper<TInner>(PhantomData<fn() -> TInner>);

impl<TInner: Locatable> WrapperStrategy for OptionalWrapper<TInner> {
    fn wrapped_type(&self) -> TypeInfo {
        TInner::request().service_type()
    }

    fn build_plan(
        &self,
        builder: &ActivationBuilder<'_>,
        key: Option<&Key>,
        ctx: &StaticInjectionContext,
    ) -> LocateResult<Option<PlanNode>> {
        let absent = Instance::new(Absent);

        let Some(inner) = builder.build_request(&TInner::request(), key, ctx)? else {
            return Ok(Some(PlanNode::constant(absent)));
        };

        Ok(Some(inner.map(move |inner| {
            activator(move |scope, disposal, ctx| match inner(scope, disposal, ctx) {
                Err(LocateError::NullActivationResult { .. }) => Ok(absent.clone()),
                result => result,
            })
        })))
    }
}

impl<TInner: Locatable> Locatable for Option<TInner> {
    fn request() -> Request {
        Request::wrapper::<Self>(OptionalWrapper::<TInner>(PhantomData))
    }

    fn from_instance(instance: Instance) -> LocateResult<Self> {
        if instance.unbox_ref::<Absent>().is_some() {
            return Ok(None);
        }

        TInner::from_instance(instance).map(Some)
    }
}
