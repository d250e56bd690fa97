use std::sync::Arc;

use ahash::AHashMap;

use crate::{
    strategy::StrategyId,
    types::{extra_data::ExtraData, instance::Instance},
};

/// Per top level locate call state handed through every activator
#[derive(Debug, Default)]
pub struct RuntimeContext {
    pub(crate) extra: Option<Arc<ExtraData>>,
    pub(crate) per_graph: AHashMap<StrategyId, Instance>,
}

impl RuntimeContext {
    pub fn new(extra: Option<Arc<ExtraData>>) -> Self {
        Self {
            extra,
            per_graph: AHashMap::new(),
        }
    }

    pub fn extra(&self) -> Option<&ExtraData> {
        self.extra.as_deref()
    }
}
