use std::{borrow::Cow, sync::Arc};

use crate::{
    strategy::{Caster, Strategy, collection::Decorator},
    types::{instance::Instance, key::Key, type_info::TypeInfo},
};

use super::Activator;

type Assemble = Box<dyn FnOnce(Vec<Activator>) -> Activator + Send + Sync>;
type Wrap = Box<dyn FnOnce(Activator) -> Activator + Send + Sync>;

/// Construction plan tree produced by the activation builder
pub struct PlanNode(pub(crate) PlanKind);

pub(crate) enum PlanKind {
    /// Fixed value handed out as is
    Constant(Instance),
    /// Ambient value looked up in the extra data of the call
    ExtraData {
        name: Option<Cow<'static, str>>,
        ty: TypeInfo,
        key: Option<Key>,
        trace: String,
    },
    Strategy(StrategyPlan),
    Decorated {
        inner: Box<PlanNode>,
        decorators: Vec<Arc<Decorator>>,
    },
    /// Wrapper shape assembled from inner plans
    Composite {
        inner: Vec<PlanNode>,
        assemble: Assemble,
    },
    /// Single inner plan with extra run time behavior
    Wrapped {
        inner: Box<PlanNode>,
        wrap: Wrap,
    },
}

pub(crate) struct StrategyPlan {
    pub(crate) strategy: Arc<Strategy>,
    pub(crate) caster: Caster,
    pub(crate) args: Vec<PlanNode>,
    pub(crate) members: Vec<PlanNode>,
}

impl PlanNode {
    pub fn constant(instance: Instance) -> Self {
        Self(PlanKind::Constant(instance))
    }

    /// Node built by compiling `inner` and combining their activators
    pub fn composite(
        inner: Vec<PlanNode>,
        assemble: impl FnOnce(Vec<Activator>) -> Activator + Send + Sync + 'static,
    ) -> Self {
        Self(PlanKind::Composite {
            inner,
            assemble: Box::new(assemble),
        })
    }

    /// Node running the activator as is
    pub fn runtime(activator: Activator) -> Self {
        Self::composite(Vec::new(), move |_| activator)
    }

    /// Node wrapping this one
    pub fn map(self, wrap: impl FnOnce(Activator) -> Activator + Send + Sync + 'static) -> Self {
        Self(PlanKind::Wrapped {
            inner: Box::new(self),
            wrap: Box::new(wrap),
        })
    }
}

impl std::fmt::Debug for PlanNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            PlanKind::Constant(instance) => f.debug_tuple("Constant").field(instance).finish(),
            PlanKind::ExtraData { name, ty, .. } => f
                .debug_struct("ExtraData")
                .field("name", name)
                .field("ty", &ty.name)
                .finish(),
            PlanKind::Strategy(plan) => f
                .debug_struct("Strategy")
                .field("strategy", &plan.strategy.activation_type().name)
                .field("args", &plan.args)
                .field("members", &plan.members)
                .finish(),
            PlanKind::Decorated { inner, decorators } => f
                .debug_struct("Decorated")
                .field("inner", inner)
                .field("decorators", &decorators.len())
                .finish(),
            PlanKind::Composite { inner, .. } => {
                f.debug_struct("Composite").field("inner", inner).finish()
            }
            PlanKind::Wrapped { inner, .. } => f.debug_tuple("Wrapped").field(inner).finish(),
        }
    }
}
