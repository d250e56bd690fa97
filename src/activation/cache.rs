use dashmap::{DashMap, mapref::entry::Entry};

use crate::types::{key::Key, type_info::TypeInfo};

use super::Activator;

struct CachedActivator {
    generation: u64,
    activator: Activator,
}

/// Compiled activators of one registry, per requested type and key
#[derive(Default)]
pub(crate) struct ActivatorCache {
    entries: DashMap<(TypeInfo, Option<Key>), CachedActivator, ahash::RandomState>,
}

impl ActivatorCache {
    /// Cached activator compiled against the given registration generation
    pub(crate) fn get(&self, ty: TypeInfo, key: Option<&Key>, generation: u64) -> Option<Activator> {
        self.entries
            .get(&(ty, key.cloned()))
            .filter(|x| x.generation == generation)
            .map(|x| x.activator.clone())
    }

    /// Publish a compiled activator. When another thread already published one for the same
    /// generation that one wins and is returned.
    pub(crate) fn insert(
        &self,
        ty: TypeInfo,
        key: Option<Key>,
        generation: u64,
        activator: Activator,
    ) -> Activator {
        match self.entries.entry((ty, key)) {
            Entry::Occupied(mut entry) => {
                if entry.get().generation >= generation {
                    return entry.get().activator.clone();
                }

                entry.insert(CachedActivator {
                    generation,
                    activator: activator.clone(),
                });

                activator
            }
            Entry::Vacant(entry) => {
                entry.insert(CachedActivator {
                    generation,
                    activator: activator.clone(),
                });

                activator
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for ActivatorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivatorCache")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::ActivatorCache;
    use crate::{
        activation::activator,
        types::{instance::Instance, type_info::TypeInfoSource},
    };

    #[test]
    fn first_published_activator_wins() {
        let cache = ActivatorCache::default();
        let first = activator(|_, _, _| Ok(Instance::from_arc(Arc::new(1u8))));
        let second = activator(|_, _, _| Ok(Instance::from_arc(Arc::new(2u8))));

        let published = cache.insert(u8::type_info(), None, 1, first.clone());
        let raced = cache.insert(u8::type_info(), None, 1, second);

        assert!(Arc::ptr_eq(&published, &first));
        assert!(Arc::ptr_eq(&raced, &first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn stale_generation_is_replaced() {
        let cache = ActivatorCache::default();
        let old = activator(|_, _, _| Ok(Instance::from_arc(Arc::new(1u8))));
        let new = activator(|_, _, _| Ok(Instance::from_arc(Arc::new(2u8))));

        cache.insert(u8::type_info(), None, 1, old);

        assert!(cache.get(u8::type_info(), None, 2).is_none());

        let published = cache.insert(u8::type_info(), None, 2, new.clone());

        assert!(Arc::ptr_eq(&published, &new));
        assert!(cache.get(u8::type_info(), None, 2).is_some());
    }
}
