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

//! Deferred command queue
//!
//! Shape changes requested during a pass are buffered here and applied in
//! FIFO order at the next flush, so nothing iterating the store ever sees a
//! half-applied mutation. Commands name entities by handle only; a command
//! whose entity is already gone is skipped.

use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::component::ComponentBag;
use crate::entity::Entity;
use crate::index::QueryIndex;
use crate::storage::ComponentStore;

/// Keys named by a `RemoveComponents` command
pub type KeyList = SmallVec<[String; 4]>;

/// Deferred world mutation
pub enum Command {
    /// Create an entity; its handle is allocated at flush time
    AddEntity(ComponentBag),

    /// Merge components into an existing entity
    AddComponents {
        entity: Entity,
        components: ComponentBag,
    },

    /// Drop components from an existing entity
    RemoveComponents { entity: Entity, keys: KeyList },

    /// Remove an entity and all its components
    RemoveEntity(Entity),
}

impl Command {
    /// Target entity, if the command has one yet
    pub fn entity(&self) -> Option<Entity> {
        match self {
            Command::AddEntity(_) => None,
            Command::AddComponents { entity, .. }
            | Command::RemoveComponents { entity, .. }
            | Command::RemoveEntity(entity) => Some(*entity),
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::AddEntity(bag) => f.debug_tuple("AddEntity").field(&bag.keys()).finish(),
            Command::AddComponents { entity, components } => f
                .debug_struct("AddComponents")
                .field("entity", entity)
                .field("keys", &components.keys())
                .finish(),
            Command::RemoveComponents { entity, keys } => f
                .debug_struct("RemoveComponents")
                .field("entity", entity)
                .field("keys", keys)
                .finish(),
            Command::RemoveEntity(e) => f.debug_tuple("RemoveEntity").field(e).finish(),
        }
    }
}

/// Outcome of one flush
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    /// Commands that changed the store
    pub applied: usize,
    /// Commands whose target entity no longer existed
    pub skipped: usize,
    /// Entities created, in command order
    pub spawned: Vec<Entity>,
    /// Entities removed, in command order
    pub despawned: Vec<Entity>,
}

impl FlushReport {
    /// No commands were pending
    pub fn is_empty(&self) -> bool {
        self.applied == 0 && self.skipped == 0
    }
}

/// Command queue for deferred operations
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<Command>,
}

impl CommandQueue {
    /// Create new command queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    /// Queue entity creation
    pub fn add_entity(&mut self, bag: ComponentBag) {
        self.commands.push(Command::AddEntity(bag));
    }

    /// Queue component insertion/overwrite
    pub fn add_components(&mut self, entity: Entity, components: ComponentBag) {
        self.commands.push(Command::AddComponents { entity, components });
    }

    /// Queue component removal
    pub fn remove_components<I, K>(&mut self, entity: Entity, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys = keys.into_iter().map(Into::into).collect();
        self.commands.push(Command::RemoveComponents { entity, keys });
    }

    /// Queue entity removal
    pub fn remove_entity(&mut self, entity: Entity) {
        self.commands.push(Command::RemoveEntity(entity));
    }

    /// Queue a prebuilt command
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Pending commands, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Apply all commands in FIFO order and clear the queue.
    ///
    /// Every entity a command touches is re-tested against the tracked
    /// queries right after that command lands.
    pub fn apply(&mut self, store: &mut ComponentStore, index: &mut QueryIndex) -> FlushReport {
        let mut report = FlushReport::default();

        for command in self.commands.drain(..) {
            trace!(?command, "applying command");
            match command {
                Command::AddEntity(bag) => {
                    let entity = store.spawn(bag);
                    if let Ok(bag) = store.bag(entity) {
                        index.on_spawn(entity, bag);
                    }
                    report.spawned.push(entity);
                    report.applied += 1;
                }
                Command::AddComponents { entity, components } => {
                    let touched: KeyList = components.iter_keys().map(str::to_string).collect();
                    if store.insert_components(entity, components) {
                        if let Ok(bag) = store.bag(entity) {
                            index.on_reshape(entity, bag, touched.iter().map(String::as_str));
                        }
                        report.applied += 1;
                    } else {
                        debug!(%entity, "add_components on missing entity, skipped");
                        report.skipped += 1;
                    }
                }
                Command::RemoveComponents { entity, keys } => {
                    if store.remove_components(entity, keys.iter().map(String::as_str)) {
                        if let Ok(bag) = store.bag(entity) {
                            index.on_reshape(entity, bag, keys.iter().map(String::as_str));
                        }
                        report.applied += 1;
                    } else {
                        debug!(%entity, "remove_components on missing entity, skipped");
                        report.skipped += 1;
                    }
                }
                Command::RemoveEntity(entity) => {
                    if store.despawn(entity).is_some() {
                        index.on_despawn(entity);
                        report.despawned.push(entity);
                        report.applied += 1;
                    } else {
                        debug!(%entity, "remove_entity on missing entity, skipped");
                        report.skipped += 1;
                    }
                }
            }
        }

        report
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Get length
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Drop every pending command without applying it
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Tag;
    use crate::query::parse_query;
    use crate::system::SystemId;

    #[test]
    fn test_command_queue() {
        let mut queue = CommandQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);

        queue.remove_entity(Entity::from_raw(1));
        assert!(!queue.is_empty());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.iter().next().unwrap().entity(), Some(Entity::from_raw(1)));
    }

    #[test]
    fn test_command_queue_clear() {
        let mut queue = CommandQueue::new();
        queue.add_entity(ComponentBag::new());
        queue.clear();
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_apply_fifo_and_skip() {
        let mut store = ComponentStore::new();
        let mut index = QueryIndex::new();
        index.track(SystemId(0), parse_query("sprite").unwrap(), &store);

        let mut queue = CommandQueue::new();
        queue.add_entity(ComponentBag::new().with("sprite", Tag));
        let report = queue.apply(&mut store, &mut index);
        let e = report.spawned[0];
        assert!(index.get(SystemId(0)).unwrap().contains(e));

        // remove, then a component edit that races behind it
        queue.remove_entity(e);
        queue.add_components(e, ComponentBag::new().with("text", Tag));
        queue.remove_components(e, ["sprite"]);
        let report = queue.apply(&mut store, &mut index);

        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.despawned, vec![e]);
        assert!(queue.is_empty());
        assert!(index.get(SystemId(0)).unwrap().is_empty());
    }

    #[test]
    fn test_apply_empty_is_noop() {
        let mut store = ComponentStore::new();
        let mut index = QueryIndex::new();
        let report = CommandQueue::new().apply(&mut store, &mut index);
        assert!(report.is_empty());
        assert_eq!(report, FlushReport::default());
    }

    #[test]
    fn test_command_debug_lists_keys() {
        let command = Command::AddEntity(ComponentBag::new().with_tag("b").with_tag("a"));
        assert_eq!(format!("{command:?}"), r#"AddEntity(["a", "b"])"#);
    }
}
