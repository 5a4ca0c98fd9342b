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

//! Error types

use std::fmt;

use crate::entity::Entity;
use crate::system::SystemId;

/// Zoo error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZooError {
    /// Query text does not follow the `a & !b | c` grammar
    MalformedQuery {
        /// Name of the system that declared the query, if any
        system: Option<String>,
        query: String,
        reason: String,
    },

    /// Direct read of a component the entity does not carry
    MissingComponent { entity: Entity, key: String },

    /// Direct read against an entity that does not exist (or was removed)
    UnknownEntity(Entity),

    /// Component exists but holds a different payload type
    ComponentTypeMismatch {
        entity: Entity,
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Value could not be turned into a component bag
    InvalidBag(String),

    /// System not found
    SystemNotFound(SystemId),

    /// Insert position past the end of the system list
    SystemIndexOutOfBounds { index: usize, len: usize },

    /// Configuration error
    ConfigError(String),

    /// Serialization error
    SerializationError(String),
}

impl ZooError {
    /// Attach the offending system's name to a `MalformedQuery`.
    pub fn for_system(self, name: &str) -> Self {
        match self {
            ZooError::MalformedQuery { query, reason, .. } => ZooError::MalformedQuery {
                system: Some(name.to_string()),
                query,
                reason,
            },
            other => other,
        }
    }
}

impl fmt::Display for ZooError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZooError::MalformedQuery {
                system: Some(system),
                query,
                reason,
            } => write!(f, "Malformed query {query:?} in system '{system}': {reason}"),
            ZooError::MalformedQuery {
                system: None,
                query,
                reason,
            } => write!(f, "Malformed query {query:?}: {reason}"),
            ZooError::MissingComponent { entity, key } => {
                write!(f, "Component '{key}' missing on {entity}")
            }
            ZooError::UnknownEntity(entity) => write!(f, "Unknown entity: {entity}"),
            ZooError::ComponentTypeMismatch {
                entity,
                key,
                expected,
                found,
            } => write!(
                f,
                "Component '{key}' on {entity} is {found}, not {expected}"
            ),
            ZooError::InvalidBag(msg) => write!(f, "Invalid component bag: {msg}"),
            ZooError::SystemNotFound(id) => write!(f, "System not found: {id:?}"),
            ZooError::SystemIndexOutOfBounds { index, len } => {
                write!(f, "System index {index} out of bounds (len {len})")
            }
            ZooError::ConfigError(msg) => write!(f, "Config error: {msg}"),
            ZooError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for ZooError {}

impl From<serde_json::Error> for ZooError {
    fn from(err: serde_json::Error) -> Self {
        ZooError::SerializationError(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ZooError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_query_names_system() {
        let err = ZooError::MalformedQuery {
            system: None,
            query: "a & ".into(),
            reason: "expected term".into(),
        }
        .for_system("render");

        let msg = err.to_string();
        assert!(msg.contains("render"), "{msg}");
        assert!(msg.contains("a & "), "{msg}");
    }

    #[test]
    fn test_for_system_leaves_other_errors() {
        let err = ZooError::UnknownEntity(Entity::from_raw(3)).for_system("x");
        assert_eq!(err, ZooError::UnknownEntity(Entity::from_raw(3)));
    }
}
