use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::{
    activation::context::StaticInjectionContext,
    types::{
        error::{LocateError, LocateResult},
        instance::Instance,
        key::Key,
        type_info::TypeInfo,
    },
};

use super::Strategy;

/// Post processing of a located service export
pub struct Decorator {
    ty: TypeInfo,
    apply: Box<dyn Fn(Instance) -> LocateResult<Instance> + Send + Sync>,
}

impl Decorator {
    pub(crate) fn new(
        ty: TypeInfo,
        apply: impl Fn(Instance) -> LocateResult<Instance> + Send + Sync + 'static,
    ) -> Self {
        Self {
            ty,
            apply: Box::new(apply),
        }
    }

    pub fn ty(&self) -> TypeInfo {
        self.ty
    }

    pub(crate) fn apply(&self, instance: Instance) -> LocateResult<Instance> {
        (self.apply)(instance)
    }
}

impl std::fmt::Debug for Decorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decorator").field("ty", &self.ty.name).finish()
    }
}

/// Immutable view of the registered strategies
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    by_type: AHashMap<TypeInfo, Arc<[Arc<Strategy>]>>,
    by_key: AHashMap<(TypeInfo, Key), Arc<Strategy>>,
    decorators: AHashMap<TypeInfo, Arc<[Arc<Decorator>]>>,
}

impl Snapshot {
    /// Strategies exporting `ty`, by descending priority then registration order
    pub fn candidates(&self, ty: TypeInfo) -> &[Arc<Strategy>] {
        self.by_type.get(&ty).map(|x| x.as_ref()).unwrap_or_default()
    }

    pub fn by_key(&self, ty: TypeInfo, key: &Key) -> Option<&Arc<Strategy>> {
        self.by_key.get(&(ty, key.clone()))
    }

    /// Decorators of `ty` in registration order
    pub fn decorators(&self, ty: TypeInfo) -> &[Arc<Decorator>] {
        self.decorators
            .get(&ty)
            .map(|x| x.as_ref())
            .unwrap_or_default()
    }

    /// Single result pick: the highest priority group wins, inside it the last registered
    pub fn select(&self, ty: TypeInfo, ctx: &StaticInjectionContext) -> Option<&Arc<Strategy>> {
        let mut selected: Option<&Arc<Strategy>> = None;

        for strategy in self
            .candidates(ty)
            .iter()
            .filter(|x| x.meets_conditions(ctx))
        {
            match selected {
                Some(current) if current.priority() != strategy.priority() => break,
                _ => selected = Some(strategy),
            }
        }

        selected
    }

    /// Every strategy whose conditions hold, in collection order
    pub fn eligible<'a>(
        &'a self,
        ty: TypeInfo,
        ctx: &'a StaticInjectionContext,
    ) -> impl Iterator<Item = &'a Arc<Strategy>> + 'a {
        self.candidates(ty)
            .iter()
            .filter(move |x| x.meets_conditions(ctx))
    }

    pub fn len(&self) -> usize {
        self.by_type.values().map(|x| x.len()).sum::<usize>() + self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty() && self.by_key.is_empty()
    }
}

/// Add only strategy index.
///
/// Writers publish a new snapshot, readers keep whatever snapshot they already hold.
#[derive(Debug, Default)]
pub struct StrategyCollection {
    snapshot: RwLock<Arc<Snapshot>>,
}

impl StrategyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }

    pub fn add(&self, strategy: Strategy) -> LocateResult<Arc<Strategy>> {
        let strategy = Arc::new(strategy);

        let mut current = self.snapshot.write();
        let mut next = Snapshot::clone(&current);

        for (ty, key) in strategy.keyed_exports() {
            let slot = (*ty, key.clone());

            if next.by_key.contains_key(&slot) {
                return Err(LocateError::DuplicateKey {
                    ty: *ty,
                    key: key.clone(),
                });
            }

            next.by_key.insert(slot, strategy.clone());
        }

        for ty in strategy.exports() {
            let mut strategies = next
                .by_type
                .get(ty)
                .map(|x| x.to_vec())
                .unwrap_or_default();

            strategies.push(strategy.clone());
            strategies.sort_by(|a, b| {
                b.priority()
                    .cmp(&a.priority())
                    .then_with(|| a.id().cmp(&b.id()))
            });

            next.by_type.insert(*ty, Arc::from(strategies));
        }

        *current = Arc::new(next);

        Ok(strategy)
    }

    pub fn add_decorator(&self, decorator: Decorator) {
        let decorator = Arc::new(decorator);

        let mut current = self.snapshot.write();
        let mut next = Snapshot::clone(&current);

        let mut decorators = next
            .decorators
            .get(&decorator.ty())
            .map(|x| x.to_vec())
            .unwrap_or_default();

        decorators.push(decorator.clone());
        next.decorators.insert(decorator.ty(), Arc::from(decorators));

        *current = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::StrategyCollection;
    use crate::{
        activation::context::StaticInjectionContext,
        condition::Condition,
        strategy::Strategy,
        types::{error::LocateError, key::Key, type_info::TypeInfoSource},
    };

    struct Service(u32);

    fn strategy(value: u32) -> Strategy {
        Strategy::from_constructor(move || Service(value))
    }

    #[test]
    fn select_prefers_priority_then_latest() {
        let collection = StrategyCollection::new();
        let high = collection.add(strategy(1).with_priority(10)).unwrap();
        let _low = collection.add(strategy(2)).unwrap();
        let high_latest = collection.add(strategy(3).with_priority(10)).unwrap();

        let snapshot = collection.snapshot();
        let ctx = StaticInjectionContext::new();
        let selected = snapshot.select(Service::type_info(), &ctx).unwrap();

        assert_eq!(selected.id(), high_latest.id());

        let order = snapshot
            .candidates(Service::type_info())
            .iter()
            .map(|x| x.id())
            .collect::<Vec<_>>();

        assert_eq!(order[0], high.id());
        assert_eq!(order[1], high_latest.id());
    }

    #[test]
    fn select_skips_ineligible() {
        let collection = StrategyCollection::new();
        let fallback = collection.add(strategy(1)).unwrap();
        collection
            .add(strategy(2).with_priority(5).with_condition(Condition::predicate(|_, _| false)))
            .unwrap();

        let snapshot = collection.snapshot();
        let selected = snapshot
            .select(Service::type_info(), &StaticInjectionContext::new())
            .unwrap();

        assert_eq!(selected.id(), fallback.id());
    }

    #[test]
    fn old_snapshot_is_not_affected_by_add() {
        let collection = StrategyCollection::new();
        collection.add(strategy(1)).unwrap();

        let before = collection.snapshot();
        collection.add(strategy(2)).unwrap();

        assert_eq!(before.candidates(Service::type_info()).len(), 1);
        assert_eq!(collection.snapshot().candidates(Service::type_info()).len(), 2);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let collection = StrategyCollection::new();

        let keyed = |value| {
            let mut strategy = strategy(value);
            strategy
                .keyed_exports
                .push((Service::type_info(), Key::from(5)));
            strategy
        };

        collection.add(keyed(1)).unwrap();
        let err = collection.add(keyed(2)).unwrap_err();

        assert!(matches!(err, LocateError::DuplicateKey { .. }));
        assert!(
            collection
                .snapshot()
                .by_key(Service::type_info(), &Key::from(5))
                .is_some()
        );
    }

    #[test]
    fn decorators_keep_registration_order() {
        let collection = StrategyCollection::new();

        for _ in 0..2 {
            collection.add_decorator(super::Decorator::new(Service::type_info(), Ok));
        }

        assert_eq!(
            collection
                .snapshot()
                .decorators(Service::type_info())
                .len(),
            2
        );
    }
}
