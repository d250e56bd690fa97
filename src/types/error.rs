use thiserror::Error;

use super::{key::Key, type_info::TypeInfo};

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("Could not locate {ty}{}\n{trace}", display_key(.key))]
    LocateFailure {
        ty: TypeInfo,
        key: Option<Key>,
        trace: String,
    },
    #[error("Recursive locate detected while activating {ty}\n{trace}")]
    RecursiveLocate { ty: TypeInfo, trace: String },
    #[error("Scope {scope} is disposed")]
    ScopeDisposed { scope: String },
    #[error("Activation of {ty} produced no instance")]
    NullActivationResult { ty: TypeInfo },
    #[error("{} disposable(s) failed during teardown", .0.len())]
    AggregateDisposalFailure(Vec<DisposalFailure>),

    #[error("Duplicate export of {ty} with key {key}")]
    DuplicateKey { ty: TypeInfo, key: Key },
    #[error("Invalid configuration of {ty}: {reason}")]
    InvalidConfiguration { ty: TypeInfo, reason: String },

    #[error("Invalid instance type. Expected {expected} found {found}")]
    TypeMismatch { expected: TypeInfo, found: TypeInfo },
    #[error("Instance of {ty} is shared and can not be moved out")]
    SharedInstance { ty: TypeInfo },

    #[cfg(feature = "task-local")]
    #[error("Task local context not initialized while activating {ty}")]
    TaskLocalContextNotInitialized { ty: TypeInfo },

    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

impl LocateError {
    pub fn is_locate_failure(&self) -> bool {
        matches!(self, Self::LocateFailure { .. })
    }

    pub fn is_recursive_locate(&self) -> bool {
        matches!(self, Self::RecursiveLocate { .. })
    }

    pub fn is_scope_disposed(&self) -> bool {
        matches!(self, Self::ScopeDisposed { .. })
    }
}

/// One failed disposal collected during teardown
#[derive(Debug, Error)]
#[error("Failed to dispose {ty}: {error}")]
pub struct DisposalFailure {
    pub ty: TypeInfo,
    pub error: anyhow::Error,
}

fn display_key(key: &Option<Key>) -> String {
    key.as_ref()
        .map(|key| format!(" with key {key}"))
        .unwrap_or_default()
}

pub type LocateResult<TRes> = Result<TRes, LocateError>;
