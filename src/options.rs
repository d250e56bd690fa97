/// Container wide activation settings, fixed when the container is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerOptions {
    /// Track disposable transients (and per object graph instances) in the requesting scope
    pub track_transient_disposables: bool,
    /// Maximum nesting of activations on one thread before failing with a recursive locate
    pub max_object_graph_depth: usize,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            track_transient_disposables: true,
            max_object_graph_depth: 100,
        }
    }
}

impl ContainerOptions {
    pub fn track_transient_disposables(mut self, track: bool) -> Self {
        self.track_transient_disposables = track;
        self
    }

    pub fn max_object_graph_depth(mut self, depth: usize) -> Self {
        self.max_object_graph_depth = depth;
        self
    }
}
