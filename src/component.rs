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

//! Components and component bags
//!
//! Components are named payloads attached to entities. A bag is the full set
//! of components one entity carries; which keys are present is the entity's
//! shape, and shape alone decides query matching.

use std::any::{type_name, Any};
use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZooError};

/// Marker trait for components
///
/// Components must be 'static (no borrowed data)
pub trait Component: Any + Send + Sync {}

/// Automatically implement Component for all valid types
impl<T: Any + Send + Sync> Component for T {}

/// Presence-only component (`hidden`, `sprite`, ...)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag;

struct Slot {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Heterogeneous record of components keyed by name
#[derive(Default)]
pub struct ComponentBag {
    slots: AHashMap<String, Slot>,
}

impl ComponentBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with<T: Component>(mut self, key: impl Into<String>, value: T) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder form for a presence-only component
    pub fn with_tag(self, key: impl Into<String>) -> Self {
        self.with(key, Tag)
    }

    /// Insert or overwrite a component
    pub fn insert<T: Component>(&mut self, key: impl Into<String>, value: T) {
        self.slots.insert(
            key.into(),
            Slot {
                value: Box::new(value),
                type_name: type_name::<T>(),
            },
        );
    }

    /// Remove a component, returning whether it was present
    pub fn remove(&mut self, key: &str) -> bool {
        self.slots.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Typed read; `None` when absent or of another type
    pub fn get<T: Component>(&self, key: &str) -> Option<&T> {
        self.slots.get(key)?.value.downcast_ref::<T>()
    }

    /// Typed in-place write; `None` when absent or of another type
    pub fn get_mut<T: Component>(&mut self, key: &str) -> Option<&mut T> {
        self.slots.get_mut(key)?.value.downcast_mut::<T>()
    }

    /// Type name of the payload stored under `key`
    pub fn type_name_of(&self, key: &str) -> Option<&'static str> {
        self.slots.get(key).map(|slot| slot.type_name)
    }

    /// Check that `key` holds a `T`
    pub fn is<T: Component>(&self, key: &str) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| slot.value.is::<T>())
    }

    /// Keys in lexicographic order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Keys in storage order
    pub fn iter_keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Move every component of `other` into this bag. Last writer wins.
    pub fn merge(&mut self, other: ComponentBag) {
        self.slots.extend(other.slots);
    }

    /// Build a bag from a JSON object, one `serde_json::Value` payload per key.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(map) => {
                let mut bag = Self::new();
                for (key, value) in map {
                    bag.insert(key, value);
                }
                Ok(bag)
            }
            other => Err(ZooError::InvalidBag(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl TryFrom<serde_json::Value> for ComponentBag {
    type Error = ZooError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Self::from_json(value)
    }
}

impl fmt::Debug for ComponentBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in self.keys() {
            if let Some(type_name) = self.type_name_of(key) {
                map.entry(&key, &type_name);
            }
        }
        map.finish()
    }
}
