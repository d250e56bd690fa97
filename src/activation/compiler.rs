use crate::{
    lifestyle,
    types::error::{LocateError, LocateResult},
};

use super::{
    Activator, activator,
    guard::ActivationGuard,
    plan::{PlanKind, PlanNode, StrategyPlan},
};

/// Turn a plan tree into one reusable activator
pub(crate) fn compile(plan: PlanNode) -> Activator {
    match plan.0 {
        PlanKind::Constant(instance) => activator(move |_, _, _| Ok(instance.clone())),
        PlanKind::ExtraData {
            name,
            ty,
            key,
            trace,
        } => activator(move |_, _, ctx| {
            ctx.extra()
                .and_then(|extra| extra.find(name.as_deref(), ty))
                .cloned()
                .ok_or_else(|| LocateError::LocateFailure {
                    ty,
                    key: key.clone(),
                    trace: trace.clone(),
                })
        }),
        PlanKind::Strategy(plan) => compile_strategy(plan),
        PlanKind::Decorated { inner, decorators } => {
            let inner = compile(*inner);

            activator(move |scope, disposal, ctx| {
                decorators
                    .iter()
                    .try_fold(inner(scope, disposal, ctx)?, |instance, decorator| {
                        decorator.apply(instance)
                    })
            })
        }
        PlanKind::Composite { inner, assemble } => {
            assemble(inner.into_iter().map(compile).collect())
        }
        PlanKind::Wrapped { inner, wrap } => wrap(compile(*inner)),
    }
}

/// Construct, inject members, track for disposal, apply the lifestyle, then cast to the export
fn compile_strategy(plan: StrategyPlan) -> Activator {
    let StrategyPlan {
        strategy,
        caster,
        args,
        members,
    } = plan;

    let args = args.into_iter().map(compile).collect::<Vec<_>>();
    let members = members.into_iter().map(compile).collect::<Vec<_>>();

    let create = {
        let strategy = strategy.clone();

        activator(move |scope, disposal, ctx| {
            let options = scope.options();
            let _guard = ActivationGuard::enter(&strategy, options.max_object_graph_depth)?;

            let args = args
                .iter()
                .map(|arg| arg(scope, disposal, ctx))
                .collect::<LocateResult<Vec<_>>>()?;

            let members = members
                .iter()
                .map(|member| member(scope, disposal, ctx))
                .collect::<LocateResult<Vec<_>>>()?;

            let instance = strategy.activation().activate(args, members)?;

            let track = strategy.tracks_disposal()
                && (!strategy.lifestyle().is_transient() || options.track_transient_disposables);

            if track && let Some(disposable) = strategy.activation().disposer(&instance) {
                tracing::trace!(
                    target: "xioc",
                    ty = strategy.activation_type().name,
                    scope = scope.id(),
                    "tracking disposable"
                );

                disposal.track(disposable)?;
            }

            Ok(instance)
        })
    };

    let create = lifestyle::apply(strategy, create);

    activator(move |scope, disposal, ctx| caster(create(scope, disposal, ctx)?))
}
