use std::{borrow::Cow, sync::Arc};

use crate::{
    activation::context::StaticInjectionContext,
    strategy::Strategy,
    types::type_info::{TypeInfo, TypeInfoSource},
};

type Predicate = Arc<dyn Fn(&Strategy, &StaticInjectionContext) -> bool + Send + Sync>;

/// Plan time filter deciding whether a strategy may satisfy a request.
///
/// Conditions look at the innermost injection target. A top level request has no
/// target, so every target based condition is false there.
#[derive(Clone)]
pub enum Condition {
    /// Requesting strategy has one of the types as activation type or export
    WhenInjectedInto(Vec<TypeInfo>),
    /// Requesting strategy carries the marker
    WhenClassHas(TypeInfo),
    /// Requesting parameter or member carries the marker
    WhenMemberHas(TypeInfo),
    WhenMemberNamed(Cow<'static, str>),
    Predicate(Predicate),
}

impl Condition {
    pub fn injected_into<TTarget: ?Sized + 'static>() -> Self {
        Self::WhenInjectedInto(vec![TTarget::type_info()])
    }

    pub fn class_has<TMarker: ?Sized + 'static>() -> Self {
        Self::WhenClassHas(TMarker::type_info())
    }

    pub fn member_has<TMarker: ?Sized + 'static>() -> Self {
        Self::WhenMemberHas(TMarker::type_info())
    }

    pub fn member_named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::WhenMemberNamed(name.into())
    }

    pub fn predicate(
        predicate: impl Fn(&Strategy, &StaticInjectionContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::Predicate(Arc::new(predicate))
    }

    pub fn meets(&self, strategy: &Strategy, ctx: &StaticInjectionContext) -> bool {
        let target = ctx.target();

        match self {
            Condition::WhenInjectedInto(types) => target.is_some_and(|target| {
                types.iter().any(|ty| {
                    target.activation_type == *ty || target.exports.contains(ty)
                })
            }),
            Condition::WhenClassHas(marker) => {
                target.is_some_and(|target| target.target_markers.contains(marker))
            }
            Condition::WhenMemberHas(marker) => {
                target.is_some_and(|target| target.member_markers.contains(marker))
            }
            Condition::WhenMemberNamed(name) => {
                target.is_some_and(|target| target.member.as_deref() == Some(name.as_ref()))
            }
            Condition::Predicate(predicate) => predicate(strategy, ctx),
        }
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WhenInjectedInto(types) => f.debug_tuple("WhenInjectedInto").field(types).finish(),
            Self::WhenClassHas(marker) => f.debug_tuple("WhenClassHas").field(marker).finish(),
            Self::WhenMemberHas(marker) => f.debug_tuple("WhenMemberHas").field(marker).finish(),
            Self::WhenMemberNamed(name) => f.debug_tuple("WhenMemberNamed").field(name).finish(),
            Self::Predicate(_) => f.debug_tuple("Predicate").field(&"fn").finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Condition;
    use crate::{
        activation::context::{InjectionTargetInfo, StaticInjectionContext},
        strategy::Strategy,
        types::type_info::TypeInfoSource,
    };

    struct Target;
    trait TargetApi {}
    struct Marker;
    struct Dependency;

    fn ctx() -> StaticInjectionContext {
        StaticInjectionContext::new().push(InjectionTargetInfo {
            activation_type: Target::type_info(),
            exports: Arc::from([<dyn TargetApi>::type_info()]),
            target_markers: Arc::from([Marker::type_info()]),
            member: Some("dependency".into()),
            position: 0,
            is_member: false,
            member_markers: Arc::from([]),
            requested: Arc::<Dependency>::type_info(),
            key: None,
        })
    }

    #[test]
    fn target_conditions() {
        let strategy = Strategy::from_constructor(|| Dependency);
        let ctx = ctx();

        assert!(Condition::injected_into::<Target>().meets(&strategy, &ctx));
        assert!(Condition::injected_into::<dyn TargetApi>().meets(&strategy, &ctx));
        assert!(!Condition::injected_into::<Dependency>().meets(&strategy, &ctx));
        assert!(Condition::class_has::<Marker>().meets(&strategy, &ctx));
        assert!(!Condition::member_has::<Marker>().meets(&strategy, &ctx));
        assert!(Condition::member_named("dependency").meets(&strategy, &ctx));
        assert!(!Condition::member_named("other").meets(&strategy, &ctx));
    }

    #[test]
    fn top_level_request_has_no_target() {
        let strategy = Strategy::from_constructor(|| Dependency);
        let ctx = StaticInjectionContext::new();

        assert!(!Condition::injected_into::<Target>().meets(&strategy, &ctx));
        assert!(Condition::predicate(|_, ctx| ctx.depth() == 0).meets(&strategy, &ctx));
    }
}
