mod conditions;
mod scopes;
mod singleton;
#[cfg(feature = "task-local")]
mod task_local;
mod transient;
