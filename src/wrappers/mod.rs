//! Request shapes other than a single service export.
//!
//! Every wrapper type implements [`Locatable`](crate::Locatable) with a request naming its
//! [`WrapperStrategy`]. The strategy turns the request into plan nodes over the wrapped type.

pub mod collection;
pub mod func;
pub mod keyed;
pub mod lazy;
pub mod optional;
pub mod owned;
pub mod scope;
pub mod scoped;

use crate::{
    activation::{builder::ActivationBuilder, context::StaticInjectionContext, plan::PlanNode},
    types::{error::LocateResult, key::Key, type_info::TypeInfo},
};

pub trait WrapperStrategy: Send + Sync + 'static {
    /// Type the wrapper resolves inside, reported in traces
    fn wrapped_type(&self) -> TypeInfo;

    /// Plan producing the wrapper value, `Ok(None)` when the wrapped type can not be satisfied
    fn build_plan(
        &self,
        builder: &ActivationBuilder<'_>,
        key: Option<&Key>,
        ctx: &StaticInjectionContext,
    ) -> LocateResult<Option<PlanNode>>;
}
