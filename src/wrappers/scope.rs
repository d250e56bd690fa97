use crate::{
    activation::{
        activator,
        builder::ActivationBuilder,
        context::StaticInjectionContext,
        plan::PlanNode,
        request::{Locatable, Request},
    },
    scope::ScopeHandle,
    types::{
        error::LocateResult,
        instance::Instance,
        key::Key,
        type_info::{TypeInfo, TypeInfoSource},
    },
};

use super::WrapperStrategy;

/// The scope the activation runs in
struct ScopeWrapper;

impl WrapperStrategy for ScopeWrapper {
    fn wrapped_type(&self) -> TypeInfo {
        ScopeHandle::type_info()
    }

    fn build_plan(
        &self,
        _builder: &ActivationBuilder<'_>,
        _key: Option<&Key>,
        _ctx: &StaticInjectionContext,
    ) -> LocateResult<Option<PlanNode>> {
        Ok(Some(PlanNode::runtime(activator(|scope, _, _| {
            Ok(Instance::new(scope.clone()))
        }))))
    }
}

impl Locatable for ScopeHandle {
    fn request() -> Request {
        Request::wrapper::<Self>(ScopeWrapper)
    }

    fn from_instance(instance: Instance) -> LocateResult<Self> {
        instance.take()
    }
}
