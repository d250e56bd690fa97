use std::{marker::PhantomData, sync::Arc};

use crate::{
    activation::{
        activator,
        builder::ActivationBuilder,
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

/// Locates `TService` by a key chosen at call time.
///
/// Each call is a top level locate in the captured scope, target conditions do not apply.
pub struct KeyedFactory<TService: ?Sized> {
    scope: ScopeHandle,
    disposal: Arc<DisposalScope>,
    extra: Option<Arc<ExtraData>>,
    _service: PhantomData<fn() -> Arc<TService>>,
}

impl<TService: ?Sized + Send + Sync + 'static> KeyedFactory<TService> {
    pub fn get(&self, key: impl Into<Key>) -> LocateResult<Arc<TService>> {
        let key = key.into();
        let mut ctx = RuntimeContext::new(self.extra.clone());

        self.scope
            .resolve(&Request::service::<TService>(), Some(&key), &self.disposal, &mut ctx)?
            .ok_or_else(|| LocateError::LocateFailure {
                ty: TService::type_info(),
                key: Some(key),
                trace: String::new(),
            })?
            .to_arc()
    }

    pub fn contains(&self, key: impl Into<Key>) -> bool {
        self.scope.can_locate_by_key::<Arc<TService>>(key)
    }
}

impl<TService: ?Sized> Clone for KeyedFactory<TService> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            disposal: self.disposal.clone(),
            extra: self.extra.clone(),
            _service: PhantomData,
        }
    }
}

impl<TService: ?Sized + 'static> std::fmt::Debug for KeyedFactory<TService> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedFactory")
            .field("service", &TService::type_info().name)
            .field("scope", &self.scope.id())
            .finish()
    }
}

struct KeyedFactoryWrapper<TService: ?Sized>(PhantomData<fn() -> Arc<TService>>);

impl<TService: ?Sized + Send + Sync + 'static> WrapperStrategy for KeyedFactoryWrapper<TService> {
    fn wrapped_type(&self) -> TypeInfo {
        TService::type_info()
    }

    fn build_plan(
        &self,
        _builder: &ActivationBuilder<'_>,
        _key: Option<&Key>,
        _ctx: &StaticInjectionContext,
    ) -> LocateResult<Option<PlanNode>> {
        Ok(Some(PlanNode::runtime(activator(|scope, disposal, ctx| {
            Ok(Instance::new(KeyedFactory::<TService> {
                scope: scope.clone(),
                disposal: disposal.clone(),
                extra: ctx.extra.clone(),
                _service: PhantomData,
            }))
        }))))
    }
}

impl<TService: ?Sized + Send + Sync + 'static> Locatable for KeyedFactory<TService> {
    fn request() -> Request {
        Request::wrapper::<Self>(KeyedFactoryWrapper::<TService>(PhantomData))
    }

    fn from_instance(instance: Instance) -> LocateResult<Self> {
        instance.take()
    }
}
