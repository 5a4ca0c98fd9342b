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

//! World: entity store, pending commands and matched-set cache

use std::cell::RefCell;
use std::num::NonZeroUsize;

#[cfg(feature = "profiling")]
use tracing::info_span;
use tracing::debug;

use crate::command::{CommandQueue, FlushReport};
use crate::component::{Component, ComponentBag};
use crate::config::ZooConfig;
use crate::entity::Entity;
use crate::error::{Result, ZooError};
use crate::index::{MatchedSet, QueryIndex};
use crate::query::{CompiledQuery, QueryCache, QueryCacheStats};
use crate::storage::ComponentStore;
use crate::system::{SystemContext, SystemId};

/// Central entity world
///
/// Reads go straight to the store as of the last flush. Shape changes are
/// queued and applied together by [`flush`](World::flush).
pub struct World {
    store: ComponentStore,
    commands: CommandQueue,
    index: QueryIndex,

    /// Parsed queries keyed by text, shared by registration and ad hoc lookups
    query_cache: RefCell<QueryCache>,
}

impl World {
    /// Create a new, empty world.
    pub fn new() -> Self {
        Self::with_config(&ZooConfig::default())
    }

    /// Create a world sized by `config`.
    ///
    /// A zero cache capacity (rejected by [`ZooConfig::validate`]) falls back to one slot.
    pub fn with_config(config: &ZooConfig) -> Self {
        let capacity = NonZeroUsize::new(config.query_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            store: ComponentStore::new(),
            commands: CommandQueue::with_capacity(config.command_capacity),
            index: QueryIndex::new(),
            query_cache: RefCell::new(QueryCache::new(capacity)),
        }
    }

    /// Queue entity creation. The handle is allocated at the next flush.
    pub fn add_entity(&mut self, bag: ComponentBag) {
        self.commands.add_entity(bag);
    }

    /// Queue component insertion/overwrite for an existing entity
    pub fn add_components(&mut self, entity: Entity, components: ComponentBag) {
        self.commands.add_components(entity, components);
    }

    /// Queue component removal
    pub fn remove_components<I, K>(&mut self, entity: Entity, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.commands.remove_components(entity, keys);
    }

    /// Queue entity removal
    pub fn remove_entity(&mut self, entity: Entity) {
        self.commands.remove_entity(entity);
    }

    /// Get immutable reference to a component on an entity
    pub fn get<T: Component>(&self, entity: Entity, key: &str) -> Result<&T> {
        self.store.get(entity, key)
    }

    /// Get mutable reference to a component on an entity
    ///
    /// Editing a value never changes the entity's shape, so no index work is needed.
    pub fn get_mut<T: Component>(&mut self, entity: Entity, key: &str) -> Result<&mut T> {
        self.store.get_mut(entity, key)
    }

    /// Check if entity has a specific component
    pub fn has(&self, entity: Entity, key: &str) -> bool {
        self.store.has(entity, key)
    }

    /// Full bag of an entity
    pub fn bag(&self, entity: Entity) -> Result<&ComponentBag> {
        self.store.bag(entity)
    }

    /// Check if an entity is alive
    pub fn contains(&self, entity: Entity) -> bool {
        self.store.contains(entity)
    }

    /// Entities carrying every key, by linear scan
    pub fn query_keys(&self, keys: &[&str]) -> Vec<Entity> {
        self.store.query_keys(keys)
    }

    /// Entities matching query text, by linear scan
    pub fn query(&self, text: &str) -> Result<Vec<Entity>> {
        let query = self.compile_query(text)?;
        Ok(self.store.query(&query))
    }

    /// Parse query text through the cache
    pub fn compile_query(&self, text: &str) -> Result<CompiledQuery> {
        self.query_cache.borrow_mut().compile(text)
    }

    /// Apply every pending command in FIFO order.
    ///
    /// Calling it again with nothing queued does nothing.
    pub fn flush(&mut self) -> FlushReport {
        #[cfg(feature = "profiling")]
        let _span = info_span!("world.flush", pending = self.commands.len()).entered();

        if self.commands.is_empty() {
            return FlushReport::default();
        }

        let report = self.commands.apply(&mut self.store, &mut self.index);
        debug!(
            applied = report.applied,
            skipped = report.skipped,
            spawned = report.spawned.len(),
            despawned = report.despawned.len(),
            entities = self.store.len(),
            "flushed commands"
        );
        report
    }

    /// Drop pending commands without applying them
    pub fn discard_commands(&mut self) -> usize {
        let dropped = self.commands.len();
        self.commands.clear();
        dropped
    }

    pub(crate) fn track(&mut self, id: SystemId, query: CompiledQuery) {
        self.index.track(id, query, &self.store);
    }

    pub(crate) fn untrack(&mut self, id: SystemId) -> Option<MatchedSet> {
        self.index.untrack(id)
    }

    pub(crate) fn snapshot(&self, id: SystemId) -> Vec<Entity> {
        self.index.snapshot(id)
    }

    pub(crate) fn context(&mut self) -> SystemContext<'_> {
        SystemContext::new(&mut self.store, &mut self.commands)
    }

    /// Matched set of a registered system
    pub fn matched(&self, id: SystemId) -> Result<&MatchedSet> {
        self.index.get(id).ok_or(ZooError::SystemNotFound(id))
    }

    /// Verify every matched set against a full scan. Meant for tests and debug checks.
    pub fn index_is_consistent(&self) -> bool {
        self.index.is_consistent_with(&self.store)
    }

    pub fn entity_count(&self) -> usize {
        self.store.len()
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = (Entity, &ComponentBag)> {
        self.store.iter()
    }

    /// Get query cache statistics for diagnostics
    pub fn query_cache_stats(&self) -> QueryCacheStats {
        self.query_cache.borrow().stats()
    }

    /// Clear all cached query parses
    pub fn clear_query_cache(&self) {
        self.query_cache.borrow_mut().clear();
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
