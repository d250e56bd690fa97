use std::sync::Arc;

use crate::{
    options::ContainerOptions,
    scope::registry::Registry,
    strategy::{Strategy, dependency::Dependency},
    types::{
        error::{LocateError, LocateResult},
        key::Key,
        type_info::TypeInfo,
    },
};

use super::{
    context::{InjectionTargetInfo, StaticInjectionContext},
    plan::{PlanKind, PlanNode, StrategyPlan},
    request::{Request, RequestKind},
};

/// Builds construction plans against the strategies visible from one registry.
///
/// `Ok(None)` means nothing can satisfy the request, errors abort the whole plan.
pub struct ActivationBuilder<'a> {
    registry: &'a Registry,
}

impl<'a> ActivationBuilder<'a> {
    pub(crate) fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    pub fn options(&self) -> &ContainerOptions {
        self.registry.options()
    }

    pub fn build_request(
        &self,
        request: &Request,
        key: Option<&Key>,
        ctx: &StaticInjectionContext,
    ) -> LocateResult<Option<PlanNode>> {
        match request.kind() {
            RequestKind::Service(ty) => self.build_service(*ty, key, ctx),
            RequestKind::Wrapper(wrapper) => wrapper.build_plan(self, key, ctx),
        }
    }

    /// Plan for a single export of `ty`, decorators included
    pub fn build_service(
        &self,
        ty: TypeInfo,
        key: Option<&Key>,
        ctx: &StaticInjectionContext,
    ) -> LocateResult<Option<PlanNode>> {
        let Some(strategy) = self.select(ty, key, ctx) else {
            tracing::trace!(target: "xioc", ty = ty.name, depth = ctx.depth(), "no strategy");

            return Ok(None);
        };

        let plan = self.build_strategy(&strategy, ty, ctx)?;

        let decorators = self.registry.decorators(ty);

        if decorators.is_empty() {
            return Ok(Some(plan));
        }

        Ok(Some(PlanNode(PlanKind::Decorated {
            inner: Box::new(plan),
            decorators,
        })))
    }

    /// Plans for every eligible export of `ty`, undecorated, in collection order
    pub fn build_all(
        &self,
        ty: TypeInfo,
        key: Option<&Key>,
        ctx: &StaticInjectionContext,
    ) -> LocateResult<Vec<PlanNode>> {
        let strategies = match key {
            Some(key) => self.keyed(ty, key, ctx).into_iter().collect(),
            None => self.registry.eligible(ty, ctx),
        };

        strategies
            .iter()
            .map(|strategy| self.build_strategy(strategy, ty, ctx))
            .collect()
    }

    /// Some strategy could satisfy a single export of `ty`
    pub fn can_locate_service(
        &self,
        ty: TypeInfo,
        key: Option<&Key>,
        ctx: &StaticInjectionContext,
    ) -> bool {
        self.select(ty, key, ctx).is_some()
    }

    fn select(
        &self,
        ty: TypeInfo,
        key: Option<&Key>,
        ctx: &StaticInjectionContext,
    ) -> Option<Arc<Strategy>> {
        match key {
            Some(key) => self.keyed(ty, key, ctx),
            None => self.registry.select(ty, ctx),
        }
    }

    fn keyed(&self, ty: TypeInfo, key: &Key, ctx: &StaticInjectionContext) -> Option<Arc<Strategy>> {
        self.registry
            .by_key(ty, key)
            .filter(|x| x.meets_conditions(ctx))
    }

    pub(crate) fn build_strategy(
        &self,
        strategy: &Arc<Strategy>,
        export: TypeInfo,
        ctx: &StaticInjectionContext,
    ) -> LocateResult<PlanNode> {
        if ctx.is_activating(strategy.activation_type())
            || ctx.depth() >= self.options().max_object_graph_depth
        {
            return Err(LocateError::RecursiveLocate {
                ty: strategy.activation_type(),
                trace: ctx.trace(),
            });
        }

        let caster = strategy
            .caster(export)
            .cloned()
            .ok_or(LocateError::InvalidConfiguration {
                ty: strategy.activation_type(),
                reason: format!("not exported as {export}"),
            })?;

        let exports: Arc<[TypeInfo]> = Arc::from(strategy.exports());
        let activation = strategy.activation();

        let build = |dependency: &Dependency| {
            let child = ctx.push(InjectionTargetInfo {
                activation_type: strategy.activation_type(),
                exports: exports.clone(),
                target_markers: strategy.shared_markers(),
                member: dependency.name.clone(),
                position: dependency.position,
                is_member: dependency.is_member,
                member_markers: Arc::from(dependency.markers.as_slice()),
                requested: dependency.request.ty(),
                key: dependency.key.clone(),
            });

            self.build_dependency(dependency, &child)
        };

        let args = activation
            .dependencies()
            .iter()
            .map(&build)
            .collect::<LocateResult<Vec<_>>>()?;

        let members = activation
            .members()
            .iter()
            .map(&build)
            .collect::<LocateResult<Vec<_>>>()?;

        tracing::trace!(
            target: "xioc",
            ty = strategy.activation_type().name,
            export = export.name,
            depth = ctx.depth(),
            "strategy plan built"
        );

        Ok(PlanNode(PlanKind::Strategy(StrategyPlan {
            strategy: strategy.clone(),
            caster,
            args,
            members,
        })))
    }

    /// Resolution order: fixed value, registered strategies, default value, ambient extra data
    fn build_dependency(
        &self,
        dependency: &Dependency,
        ctx: &StaticInjectionContext,
    ) -> LocateResult<PlanNode> {
        if let Some(value) = &dependency.value {
            return Ok(PlanNode::constant(value.clone()));
        }

        if let Some(plan) = self.build_request(&dependency.request, dependency.key.as_ref(), ctx)? {
            return Ok(plan);
        }

        if let Some(default) = &dependency.default {
            return Ok(PlanNode::constant(default.clone()));
        }

        match dependency.request.kind() {
            RequestKind::Service(_) => Ok(PlanNode(PlanKind::ExtraData {
                name: dependency.name.clone(),
                ty: dependency.request.ty(),
                key: dependency.key.clone(),
                trace: ctx.trace(),
            })),
            RequestKind::Wrapper(_) => Err(LocateError::LocateFailure {
                ty: dependency.request.ty(),
                key: dependency.key.clone(),
                trace: ctx.trace(),
            }),
        }
    }
}
