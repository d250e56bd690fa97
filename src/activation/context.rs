use std::{borrow::Cow, fmt::Write, sync::Arc};

use crate::types::{key::Key, type_info::TypeInfo};

/// Who is asking for a dependency: the type being activated and the member it is injected into
#[derive(Debug, Clone)]
pub struct InjectionTargetInfo {
    /// Activation type of the strategy that owns the dependency
    pub activation_type: TypeInfo,
    /// Types the requesting strategy is exported as
    pub exports: Arc<[TypeInfo]>,
    /// Markers declared on the requesting strategy
    pub target_markers: Arc<[TypeInfo]>,
    /// Parameter or member name, when declared
    pub member: Option<Cow<'static, str>>,
    pub position: usize,
    pub is_member: bool,
    /// Markers declared on the parameter or member
    pub member_markers: Arc<[TypeInfo]>,
    pub requested: TypeInfo,
    pub key: Option<Key>,
}

impl InjectionTargetInfo {
    fn describe(&self) -> String {
        let member = match (&self.member, self.is_member) {
            (Some(name), true) => format!("member '{name}'"),
            (Some(name), false) => format!("parameter '{name}'"),
            (None, true) => format!("member #{}", self.position),
            (None, false) => format!("parameter #{}", self.position),
        };

        match &self.key {
            Some(key) => format!(
                "{} <- {} of {} (key {key})",
                self.requested, member, self.activation_type
            ),
            None => format!("{} <- {} of {}", self.requested, member, self.activation_type),
        }
    }
}

#[derive(Debug)]
struct Frame {
    info: InjectionTargetInfo,
    parent: Option<Arc<Frame>>,
}

/// Immutable stack of injection targets for the plan currently being built.
///
/// One frame per nested dependency. Cloning is cheap, pushing never affects other clones.
#[derive(Debug, Clone, Default)]
pub struct StaticInjectionContext {
    top: Option<Arc<Frame>>,
    depth: usize,
    /// Outermost frames left behind a deferred wrapper, ignored by cycle detection
    boundary: usize,
}

impl StaticInjectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, info: InjectionTargetInfo) -> Self {
        Self {
            top: Some(Arc::new(Frame {
                info,
                parent: self.top.clone(),
            })),
            depth: self.depth + 1,
            boundary: self.boundary,
        }
    }

    /// Context for a plan built later by a deferred wrapper.
    ///
    /// Keeps the current target for conditions, drops everything else.
    pub fn deferred(&self) -> Self {
        match self.target() {
            Some(target) => Self {
                top: Some(Arc::new(Frame {
                    info: target.clone(),
                    parent: None,
                })),
                depth: 1,
                boundary: 1,
            },
            None => Self::new(),
        }
    }

    /// Innermost target, `None` for a top level request
    pub fn target(&self) -> Option<&InjectionTargetInfo> {
        self.top.as_ref().map(|x| &x.info)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Frames from innermost to outermost
    pub fn frames(&self) -> impl Iterator<Item = &InjectionTargetInfo> {
        let mut current = self.top.as_deref();

        std::iter::from_fn(move || {
            let frame = current?;
            current = frame.parent.as_deref();
            Some(&frame.info)
        })
    }

    pub fn is_activating(&self, activation_type: TypeInfo) -> bool {
        self.frames()
            .take(self.depth - self.boundary)
            .any(|x| x.activation_type == activation_type)
    }

    /// Human readable chain of injection targets
    pub fn trace(&self) -> String {
        let mut trace = String::new();

        for (idx, frame) in self.frames().enumerate() {
            let _ = writeln!(trace, "  {idx}: {}", frame.describe());
        }

        trace
    }
}
