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

//! Entity handles and their allocator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque entity handle.
///
/// Handles are allocated from a counter and never reused while the owning
/// store is alive, so a stale handle can only ever miss, never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(u64);

impl Entity {
    /// Build a handle from its raw value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Monotonic entity handle allocator
#[derive(Debug, Clone)]
pub struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    pub fn new() -> Self {
        // Handle 0 is never handed out
        Self { next: 1 }
    }

    /// Allocate the next handle.
    ///
    /// # Panics
    /// Panics if the counter overflows, which would break the no-reuse guarantee.
    pub fn allocate(&mut self) -> Entity {
        let entity = Entity(self.next);
        self.next = self
            .next
            .checked_add(1)
            .unwrap_or_else(|| panic!("entity handle counter overflow at {}", self.next));
        entity
    }

    /// Number of handles handed out so far
    pub fn allocated(&self) -> u64 {
        self.next - 1
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_is_monotonic() {
        let mut alloc = EntityAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let c = alloc.allocate();

        assert!(a < b && b < c);
        assert_eq!(alloc.allocated(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(Entity::from_raw(7).to_string(), "Entity(7)");
    }
}
