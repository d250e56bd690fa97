use std::cell::RefCell;

use crate::{
    strategy::{Strategy, StrategyId},
    types::{
        error::{LocateError, LocateResult},
        type_info::TypeInfo,
    },
};

thread_local! {
    static ACTIVATING: RefCell<Vec<(StrategyId, TypeInfo)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a strategy as being activated on the current thread.
///
/// Deferred wrappers start fresh plans, so run time recursion is only visible here.
pub(crate) struct ActivationGuard {
    _private: (),
}

impl ActivationGuard {
    pub(crate) fn enter(strategy: &Strategy, max_depth: usize) -> LocateResult<Self> {
        ACTIVATING.with_borrow_mut(|stack| {
            if stack.len() >= max_depth {
                return Err(LocateError::RecursiveLocate {
                    ty: strategy.activation_type(),
                    trace: render(stack),
                });
            }

            stack.push((strategy.id(), strategy.activation_type()));

            Ok(Self { _private: () })
        })
    }

    /// Fails when the strategy is already being activated further up the current thread
    pub(crate) fn ensure_not_activating(strategy: &Strategy) -> LocateResult<()> {
        ACTIVATING.with_borrow(|stack| {
            if stack.iter().any(|(id, _)| *id == strategy.id()) {
                return Err(LocateError::RecursiveLocate {
                    ty: strategy.activation_type(),
                    trace: render(stack),
                });
            }

            Ok(())
        })
    }
}

impl Drop for ActivationGuard {
    fn drop(&mut self) {
        ACTIVATING.with_borrow_mut(|stack| {
            stack.pop();
        });
    }
}

fn render(stack: &[(StrategyId, TypeInfo)]) -> String {
    stack
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, (_, ty))| format!("  {idx}: {ty}\n"))
        .collect()
}
