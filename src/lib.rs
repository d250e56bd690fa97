pub mod activation;
pub mod builder;
pub mod condition;
pub mod inventory;
pub mod lifestyle;
pub mod options;
pub mod scope;
pub mod strategy;
pub mod types;
pub mod wrappers;

#[cfg(test)]
pub mod tests;

pub use activation::request::{Locatable, Request, RequestKind};
pub use builder::{ExportConfig, ExportRegistrationBlock, ParamConfig};
pub use condition::Condition;
pub use self::inventory::Registration;
pub use lifestyle::Lifestyle;
pub use options::ContainerOptions;
pub use scope::{
    Container, LifetimeScope, ScopeHandle,
    disposal::{Dispose, DisposalScope},
};
pub use strategy::{
    Strategy,
    constructor::{Constructor, Fallible, Nullable},
};
pub use types::{
    error::{DisposalFailure, LocateError, LocateResult},
    extra_data::ExtraData,
    instance::Instance,
    key::Key,
    type_info::{TypeInfo, TypeInfoSource},
};
pub use wrappers::{
    func::Func, keyed::KeyedFactory, lazy::Lazy, owned::Owned, scoped::Scoped,
};

pub use xioc_macro::export;

#[doc(hidden)]
pub use ::inventory as __inventory;

#[cfg(feature = "task-local")]
use lifestyle::task_local::TaskLocalCtx;

#[cfg(feature = "task-local")]
pub trait IAsyncTaskScope {
    type TFutRes;

    /// Run the future inside a task local lifestyle span
    fn task_local_span(self) -> impl Future<Output = Self::TFutRes>;
}

#[cfg(feature = "task-local")]
impl<TFut: Future> IAsyncTaskScope for TFut {
    type TFutRes = TFut::Output;

    fn task_local_span(self) -> impl Future<Output = Self::TFutRes> {
        TaskLocalCtx::span(self)
    }
}
