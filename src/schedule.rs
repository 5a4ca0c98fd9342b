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

//! Ordered system registry
//!
//! Systems run in list order. `push` appends (first registered runs first);
//! `insert` places a system at a position, so repeated inserts at 0 make
//! the last registered run first.

use crate::error::{Result, ZooError};
use crate::query::CompiledQuery;
use crate::system::{BoxedSystem, System, SystemId};

/// Registration record
pub struct SystemSlot<F> {
    pub(crate) id: SystemId,
    pub(crate) query: CompiledQuery,
    pub(crate) system: BoxedSystem<F>,
}

impl<F> SystemSlot<F> {
    pub fn id(&self) -> SystemId {
        self.id
    }

    pub fn query(&self) -> &CompiledQuery {
        &self.query
    }

    pub fn name(&self) -> &str {
        self.system.name()
    }
}

/// Ordered list of systems
pub struct Schedule<F> {
    slots: Vec<SystemSlot<F>>,
    next_id: u32,
}

impl<F> Default for Schedule<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Schedule<F> {
    /// Create an empty schedule
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> SystemId {
        let id = SystemId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a system with its compiled query
    pub fn push(&mut self, system: BoxedSystem<F>, query: CompiledQuery) -> SystemId {
        let id = self.next_id();
        self.slots.push(SystemSlot { id, query, system });
        id
    }

    /// Insert a system at `index`, shifting later systems down
    pub fn insert(
        &mut self,
        index: usize,
        system: BoxedSystem<F>,
        query: CompiledQuery,
    ) -> Result<SystemId> {
        if index > self.slots.len() {
            return Err(ZooError::SystemIndexOutOfBounds {
                index,
                len: self.slots.len(),
            });
        }
        let id = self.next_id();
        self.slots.insert(index, SystemSlot { id, query, system });
        Ok(id)
    }

    /// Remove a system, returning it
    pub fn remove(&mut self, id: SystemId) -> Result<BoxedSystem<F>> {
        let position = self.position(id).ok_or(ZooError::SystemNotFound(id))?;
        Ok(self.slots.remove(position).system)
    }

    /// Current run position of a system
    pub fn position(&self, id: SystemId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id == id)
    }

    /// Get mutable reference to a system by name
    pub fn get_system_mut(&mut self, name: &str) -> Option<&mut (dyn System<F> + 'static)> {
        self.slots
            .iter_mut()
            .find(|slot| slot.system.name() == name)
            .map(|slot| slot.system.as_mut())
    }

    /// Slots in run order
    pub fn slots(&self) -> &[SystemSlot<F>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [SystemSlot<F>] {
        &mut self.slots
    }

    /// System names in run order
    pub fn system_names(&self) -> Vec<&str> {
        self.slots.iter().map(SystemSlot::name).collect()
    }

    /// Total number of registered systems
    pub fn system_count(&self) -> usize {
        self.slots.len()
    }
}
