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

//! Component store: one bag per live entity.

use std::collections::BTreeMap;

use crate::component::{Component, ComponentBag};
use crate::entity::{Entity, EntityAllocator};
use crate::error::{Result, ZooError};
use crate::query::CompiledQuery;

/// Entity to bag mapping
///
/// Ordered by handle so scans and matched sets iterate deterministically.
#[derive(Debug, Default)]
pub struct ComponentStore {
    bags: BTreeMap<Entity, ComponentBag>,
    allocator: EntityAllocator,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle and store its bag
    pub(crate) fn spawn(&mut self, bag: ComponentBag) -> Entity {
        let entity = self.allocator.allocate();
        self.bags.insert(entity, bag);
        entity
    }

    /// Remove an entity and everything it carries
    pub(crate) fn despawn(&mut self, entity: Entity) -> Option<ComponentBag> {
        self.bags.remove(&entity)
    }

    /// Merge components into an existing entity. `false` if the entity is gone.
    pub(crate) fn insert_components(&mut self, entity: Entity, components: ComponentBag) -> bool {
        match self.bags.get_mut(&entity) {
            Some(bag) => {
                bag.merge(components);
                true
            }
            None => false,
        }
    }

    /// Drop components by key. `false` if the entity is gone.
    pub(crate) fn remove_components<'k>(
        &mut self,
        entity: Entity,
        keys: impl IntoIterator<Item = &'k str>,
    ) -> bool {
        match self.bags.get_mut(&entity) {
            Some(bag) => {
                for key in keys {
                    bag.remove(key);
                }
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.bags.contains_key(&entity)
    }

    /// Bag of a live entity
    pub fn bag(&self, entity: Entity) -> Result<&ComponentBag> {
        self.bags
            .get(&entity)
            .ok_or(ZooError::UnknownEntity(entity))
    }

    /// Bag of a live entity, for in-place value edits
    pub(crate) fn bag_mut(&mut self, entity: Entity) -> Result<&mut ComponentBag> {
        self.bags
            .get_mut(&entity)
            .ok_or(ZooError::UnknownEntity(entity))
    }

    /// Whether a live entity carries `key`. Unknown entities carry nothing.
    pub fn has(&self, entity: Entity, key: &str) -> bool {
        self.bags.get(&entity).is_some_and(|bag| bag.contains(key))
    }

    /// Typed component read
    pub fn get<T: Component>(&self, entity: Entity, key: &str) -> Result<&T> {
        let bag = self.bag(entity)?;
        check_slot::<T>(bag, entity, key)?;
        bag.get::<T>(key).ok_or_else(|| missing(entity, key))
    }

    /// Typed in-place component write
    pub fn get_mut<T: Component>(&mut self, entity: Entity, key: &str) -> Result<&mut T> {
        let bag = self.bag_mut(entity)?;
        check_slot::<T>(bag, entity, key)?;
        bag.get_mut::<T>(key).ok_or_else(|| missing(entity, key))
    }

    /// Entities carrying every key in `keys`.
    ///
    /// Linear scan over all bags; meant for ad hoc lookups, not per-frame dispatch.
    pub fn query_keys(&self, keys: &[&str]) -> Vec<Entity> {
        self.bags
            .iter()
            .filter(|(_, bag)| keys.iter().all(|key| bag.contains(key)))
            .map(|(&entity, _)| entity)
            .collect()
    }

    /// Entities matching a compiled query, by linear scan
    pub fn query(&self, query: &CompiledQuery) -> Vec<Entity> {
        self.bags
            .iter()
            .filter(|(_, bag)| query.matches(bag))
            .map(|(&entity, _)| entity)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &ComponentBag)> {
        self.bags.iter().map(|(&entity, bag)| (entity, bag))
    }

    pub fn len(&self) -> usize {
        self.bags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bags.is_empty()
    }

    /// Handles allocated over the store's lifetime
    pub fn allocated(&self) -> u64 {
        self.allocator.allocated()
    }
}

fn missing(entity: Entity, key: &str) -> ZooError {
    ZooError::MissingComponent {
        entity,
        key: key.to_string(),
    }
}

fn check_slot<T: Component>(bag: &ComponentBag, entity: Entity, key: &str) -> Result<()> {
    match bag.type_name_of(key) {
        None => Err(missing(entity, key)),
        Some(found) if !bag.is::<T>(key) => Err(ZooError::ComponentTypeMismatch {
            entity,
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
            found,
        }),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Tag;

    #[derive(Debug, PartialEq)]
    struct Rect {
        w: f32,
        h: f32,
    }

    #[test]
    fn test_spawn_get() -> Result<()> {
        let mut store = ComponentStore::new();
        let e = store.spawn(ComponentBag::new().with("rect", Rect { w: 1.0, h: 2.0 }));

        assert_eq!(store.get::<Rect>(e, "rect")?, &Rect { w: 1.0, h: 2.0 });
        store.get_mut::<Rect>(e, "rect")?.w = 5.0;
        assert_eq!(store.get::<Rect>(e, "rect")?.w, 5.0);
        Ok(())
    }

    #[test]
    fn test_get_errors() {
        let mut store = ComponentStore::new();
        let e = store.spawn(ComponentBag::new().with("rect", Rect { w: 1.0, h: 2.0 }));

        assert!(matches!(
            store.get::<Rect>(e, "sprite"),
            Err(ZooError::MissingComponent { .. })
        ));
        assert!(matches!(
            store.get::<u32>(e, "rect"),
            Err(ZooError::ComponentTypeMismatch { .. })
        ));

        store.despawn(e);
        assert_eq!(
            store.get::<Rect>(e, "rect").unwrap_err(),
            ZooError::UnknownEntity(e)
        );
    }

    #[test]
    fn test_handles_not_reused() {
        let mut store = ComponentStore::new();
        let a = store.spawn(ComponentBag::new());
        store.despawn(a);
        let b = store.spawn(ComponentBag::new());
        assert_ne!(a, b);
        assert_eq!(store.allocated(), 2);
    }

    #[test]
    fn test_query_keys() {
        let mut store = ComponentStore::new();
        let a = store.spawn(ComponentBag::new().with_tag("text"));
        let b = store.spawn(ComponentBag::new().with_tag("text").with_tag("sprite"));
        store.spawn(ComponentBag::new().with_tag("sprite"));

        assert_eq!(store.query_keys(&["text"]), vec![a, b]);
        assert_eq!(store.query_keys(&["text", "sprite"]), vec![b]);
        assert_eq!(store.query_keys(&[]).len(), 3);
    }

    #[test]
    fn test_mutations_on_missing_entity() {
        let mut store = ComponentStore::new();
        let ghost = Entity::from_raw(42);
        assert!(!store.insert_components(ghost, ComponentBag::new().with("t", Tag)));
        assert!(!store.remove_components(ghost, ["t"]));
        assert!(!store.has(ghost, "t"));
    }
}
