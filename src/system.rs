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

//! System trait and the context systems run against

use serde::Serialize;

use crate::command::CommandQueue;
use crate::component::{Component, ComponentBag};
use crate::entity::Entity;
use crate::error::Result;
use crate::storage::ComponentStore;

/// System ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SystemId(pub u32);

/// What a system sees while it runs.
///
/// Component values can be read and edited in place. Shape changes (new
/// entities, added or removed components, removed entities) are queued and
/// land at the end of the pass.
pub struct SystemContext<'a> {
    store: &'a mut ComponentStore,
    commands: &'a mut CommandQueue,
}

impl<'a> SystemContext<'a> {
    pub(crate) fn new(store: &'a mut ComponentStore, commands: &'a mut CommandQueue) -> Self {
        Self { store, commands }
    }

    pub fn get<T: Component>(&self, entity: Entity, key: &str) -> Result<&T> {
        self.store.get(entity, key)
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity, key: &str) -> Result<&mut T> {
        self.store.get_mut(entity, key)
    }

    pub fn has(&self, entity: Entity, key: &str) -> bool {
        self.store.has(entity, key)
    }

    pub fn bag(&self, entity: Entity) -> Result<&ComponentBag> {
        self.store.bag(entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.store.contains(entity)
    }

    /// Ad hoc has-every-key lookup
    pub fn query_keys(&self, keys: &[&str]) -> Vec<Entity> {
        self.store.query_keys(keys)
    }

    /// Queue entity creation (visible next pass)
    pub fn add_entity(&mut self, bag: ComponentBag) {
        self.commands.add_entity(bag);
    }

    /// Queue component insertion/overwrite
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

    /// Commands queued so far this pass
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }
}

/// System trait
///
/// `F` is the frame state the surrounding engine hands to every pass. The
/// scheduler never looks inside it.
pub trait System<F = ()> {
    /// Get system name
    fn name(&self) -> &str;

    /// Query text selecting the entities this system runs on
    fn query(&self) -> &str;

    /// Skip this frame entirely. The matched set is still maintained.
    fn skip(&self, _frame: &F) -> bool {
        false
    }

    /// Run once with the whole matched set.
    ///
    /// The default calls [`run_entity`](System::run_entity) for each entity;
    /// overriding this replaces the per-entity path.
    fn run(&mut self, cx: &mut SystemContext<'_>, entities: &[Entity], frame: &mut F) -> Result<()> {
        for &entity in entities {
            self.run_entity(cx, entity, frame)?;
        }
        Ok(())
    }

    /// Run once per matched entity
    fn run_entity(&mut self, _cx: &mut SystemContext<'_>, _entity: Entity, _frame: &mut F) -> Result<()> {
        Ok(())
    }
}

/// Boxed system
pub type BoxedSystem<F> = Box<dyn System<F>>;

type RunFn<F> = Box<dyn FnMut(&mut SystemContext<'_>, &[Entity], &mut F) -> Result<()>>;
type RunEntityFn<F> = Box<dyn FnMut(&mut SystemContext<'_>, Entity, &mut F) -> Result<()>>;
type SkipFn<F> = Box<dyn Fn(&F) -> bool>;

/// System assembled from closures
///
/// ```
/// use zoo_ecs::{ComponentBag, FnSystem};
///
/// let _system = FnSystem::<()>::new("blink", "sprite & !hidden")
///     .with_run_entity(|cx, entity, _frame| {
///         cx.add_components(entity, ComponentBag::new().with_tag("hidden"));
///         Ok(())
///     });
/// ```
pub struct FnSystem<F> {
    name: String,
    query: String,
    run: Option<RunFn<F>>,
    run_entity: Option<RunEntityFn<F>>,
    skip: Option<SkipFn<F>>,
}

impl<F> FnSystem<F> {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            run: None,
            run_entity: None,
            skip: None,
        }
    }

    /// Whole-set callback; takes priority over `with_run_entity`
    pub fn with_run<R>(mut self, run: R) -> Self
    where
        R: FnMut(&mut SystemContext<'_>, &[Entity], &mut F) -> Result<()> + 'static,
    {
        self.run = Some(Box::new(run));
        self
    }

    /// Per-entity callback
    pub fn with_run_entity<R>(mut self, run_entity: R) -> Self
    where
        R: FnMut(&mut SystemContext<'_>, Entity, &mut F) -> Result<()> + 'static,
    {
        self.run_entity = Some(Box::new(run_entity));
        self
    }

    /// Frame predicate; `true` skips the frame
    pub fn with_skip<S>(mut self, skip: S) -> Self
    where
        S: Fn(&F) -> bool + 'static,
    {
        self.skip = Some(Box::new(skip));
        self
    }

    /// Box for registration
    pub fn boxed(self) -> BoxedSystem<F>
    where
        F: 'static,
    {
        Box::new(self)
    }
}

impl<F> System<F> for FnSystem<F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self) -> &str {
        &self.query
    }

    fn skip(&self, frame: &F) -> bool {
        self.skip.as_ref().is_some_and(|skip| skip(frame))
    }

    fn run(&mut self, cx: &mut SystemContext<'_>, entities: &[Entity], frame: &mut F) -> Result<()> {
        if let Some(run) = self.run.as_mut() {
            return run(cx, entities, frame);
        }
        if let Some(run_entity) = self.run_entity.as_mut() {
            for &entity in entities {
                run_entity(cx, entity, frame)?;
            }
        }
        Ok(())
    }
}

impl<F> std::fmt::Debug for FnSystem<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSystem")
            .field("name", &self.name)
            .field("query", &self.query)
            .field("run", &self.run.is_some())
            .field("run_entity", &self.run_entity.is_some())
            .field("skip", &self.skip.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn context_parts() -> (ComponentStore, CommandQueue) {
        (ComponentStore::new(), CommandQueue::new())
    }

    #[test]
    fn test_run_takes_priority_over_run_entity() -> Result<()> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (run_log, entity_log) = (log.clone(), log.clone());

        let mut system = FnSystem::<()>::new("both", "")
            .with_run(move |_, entities, _| {
                run_log.borrow_mut().push(format!("run:{}", entities.len()));
                Ok(())
            })
            .with_run_entity(move |_, entity, _| {
                entity_log.borrow_mut().push(format!("ent:{}", entity.to_raw()));
                Ok(())
            });

        let (mut store, mut commands) = context_parts();
        let mut cx = SystemContext::new(&mut store, &mut commands);
        let entities = [Entity::from_raw(1), Entity::from_raw(2)];
        system.run(&mut cx, &entities, &mut ())?;

        assert_eq!(*log.borrow(), vec!["run:2".to_string()]);
        Ok(())
    }

    #[test]
    fn test_run_entity_per_entity() -> Result<()> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut system = FnSystem::<u32>::new("each", "").with_run_entity(move |_, entity, frame| {
            *frame += 1;
            sink.borrow_mut().push(entity);
            Ok(())
        });

        let (mut store, mut commands) = context_parts();
        let mut cx = SystemContext::new(&mut store, &mut commands);
        let mut frame = 0;
        let entities = [Entity::from_raw(4), Entity::from_raw(9)];
        system.run(&mut cx, &entities, &mut frame)?;

        assert_eq!(frame, 2);
        assert_eq!(*seen.borrow(), entities.to_vec());
        Ok(())
    }

    #[test]
    fn test_skip_predicate() {
        let system = FnSystem::<bool>::new("paused", "").with_skip(|paused| *paused);
        assert!(system.skip(&true));
        assert!(!system.skip(&false));
        assert!(!FnSystem::<bool>::new("plain", "").skip(&true));
    }

    #[test]
    fn test_context_defers_shape_changes() {
        let (mut store, mut commands) = context_parts();
        let mut cx = SystemContext::new(&mut store, &mut commands);
        cx.add_entity(ComponentBag::new().with_tag("text"));
        cx.remove_entity(Entity::from_raw(1));

        assert_eq!(cx.pending_commands(), 2);
        assert!(cx.query_keys(&["text"]).is_empty());
    }
}
