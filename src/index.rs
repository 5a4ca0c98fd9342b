// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Matched-set cache
//!
//! Each registered system owns a set of the entities its compiled query
//! currently matches. The sets are built once by scanning the store when the
//! system registers, then kept current one entity at a time as flushed
//! commands touch entities. After a flush, `e` is in the set for `s` iff
//! `query(s)` matches `bag(e)`.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::component::ComponentBag;
use crate::entity::Entity;
use crate::query::CompiledQuery;
use crate::storage::ComponentStore;
use crate::system::SystemId;

/// Entities currently matching one query
#[derive(Debug, Clone)]
pub struct MatchedSet {
    query: CompiledQuery,
    entities: BTreeSet<Entity>,
}

impl MatchedSet {
    fn build(query: CompiledQuery, store: &ComponentStore) -> Self {
        let entities = store.query(&query).into_iter().collect();
        Self { query, entities }
    }

    pub fn query(&self) -> &CompiledQuery {
        &self.query
    }

    pub fn entities(&self) -> &BTreeSet<Entity> {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Re-test one entity and fix its membership
    fn reinsert(&mut self, entity: Entity, bag: &ComponentBag) {
        if self.query.matches(bag) {
            self.entities.insert(entity);
        } else {
            self.entities.remove(&entity);
        }
    }
}

/// Per-system matched sets
#[derive(Debug, Default)]
pub struct QueryIndex {
    sets: FxHashMap<SystemId, MatchedSet>,
}

impl QueryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a query, seeded from the current store
    pub fn track(&mut self, id: SystemId, query: CompiledQuery, store: &ComponentStore) {
        self.sets.insert(id, MatchedSet::build(query, store));
    }

    /// Stop tracking a query
    pub fn untrack(&mut self, id: SystemId) -> Option<MatchedSet> {
        self.sets.remove(&id)
    }

    pub fn get(&self, id: SystemId) -> Option<&MatchedSet> {
        self.sets.get(&id)
    }

    /// Copy of a matched set, safe to iterate while commands are queued
    pub fn snapshot(&self, id: SystemId) -> Vec<Entity> {
        self.sets
            .get(&id)
            .map(|set| set.entities.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Entity was created: test it against every query
    pub fn on_spawn(&mut self, entity: Entity, bag: &ComponentBag) {
        for set in self.sets.values_mut() {
            set.reinsert(entity, bag);
        }
    }

    /// Entity changed shape through `touched` keys.
    ///
    /// Queries that never mention a touched key cannot change their verdict.
    pub fn on_reshape<'k, I>(&mut self, entity: Entity, bag: &ComponentBag, touched: I)
    where
        I: IntoIterator<Item = &'k str> + Clone,
    {
        for set in self.sets.values_mut() {
            if touched.clone().into_iter().any(|key| set.query.references(key)) {
                set.reinsert(entity, bag);
            }
        }
    }

    /// Entity was removed: drop it everywhere
    pub fn on_despawn(&mut self, entity: Entity) {
        for set in self.sets.values_mut() {
            set.entities.remove(&entity);
        }
    }

    /// Check every set against a full scan of `store`
    pub fn is_consistent_with(&self, store: &ComponentStore) -> bool {
        self.sets.values().all(|set| {
            set.entities.iter().copied().eq(store.query(&set.query))
        })
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Tag;
    use crate::query::parse_query;

    #[test]
    fn test_track_seeds_from_store() {
        let mut store = ComponentStore::new();
        let a = store.spawn(ComponentBag::new().with_tag("sprite"));
        store.spawn(ComponentBag::new().with_tag("text"));

        let mut index = QueryIndex::new();
        index.track(SystemId(0), parse_query("sprite").unwrap(), &store);

        assert_eq!(index.snapshot(SystemId(0)), vec![a]);
    }

    #[test]
    fn test_reshape_only_touches_referencing_queries() {
        let mut store = ComponentStore::new();
        let e = store.spawn(ComponentBag::new().with_tag("sprite"));

        let mut index = QueryIndex::new();
        index.track(SystemId(0), parse_query("sprite & !hidden").unwrap(), &store);
        index.track(SystemId(1), parse_query("text").unwrap(), &store);
        assert!(index.get(SystemId(0)).unwrap().contains(e));

        store.insert_components(e, ComponentBag::new().with("hidden", Tag));
        let bag = store.bag(e).unwrap();
        index.on_reshape(e, bag, ["hidden"]);

        assert!(index.get(SystemId(0)).unwrap().is_empty());
        assert!(index.get(SystemId(1)).unwrap().is_empty());
        assert!(index.is_consistent_with(&store));
    }

    #[test]
    fn test_despawn_and_untrack() {
        let mut store = ComponentStore::new();
        let e = store.spawn(ComponentBag::new().with_tag("sprite"));

        let mut index = QueryIndex::new();
        index.track(SystemId(3), parse_query("").unwrap(), &store);
        assert_eq!(index.get(SystemId(3)).unwrap().len(), 1);

        store.despawn(e);
        index.on_despawn(e);
        assert!(index.get(SystemId(3)).unwrap().is_empty());

        assert!(index.untrack(SystemId(3)).is_some());
        assert!(index.snapshot(SystemId(3)).is_empty());
        assert!(index.is_empty());
    }
}
