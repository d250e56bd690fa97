use std::sync::Arc;

use crate::{
    lifestyle::{InstanceSlots, ThreadStaticSlots, WeakSlots},
    options::ContainerOptions,
};

use super::disposal::DisposalScope;

/// State owned by the root scope and shared by every scope below it
#[derive(Debug)]
pub(crate) struct RootState {
    pub(crate) singletons: InstanceSlots,
    pub(crate) weak: WeakSlots,
    pub(crate) thread_statics: ThreadStaticSlots,
    pub(crate) disposal: Arc<DisposalScope>,
    pub(crate) options: ContainerOptions,
}

impl RootState {
    pub(crate) fn new(options: ContainerOptions) -> Self {
        Self {
            singletons: InstanceSlots::default(),
            weak: WeakSlots::default(),
            thread_statics: ThreadStaticSlots::default(),
            disposal: Arc::new(DisposalScope::new()),
            options,
        }
    }

    /// Drop every cached instance, called once the root disposal scope is released
    pub(crate) fn clear(&self) {
        self.singletons.clear();
        self.weak.clear();
        self.thread_statics.clear();
    }
}
