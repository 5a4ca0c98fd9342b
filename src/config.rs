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

//! Runtime configuration
//!
//! ```
//! use zoo_ecs::ZooConfig;
//!
//! let config = ZooConfig::from_json_str(r#"{ "profile_systems": true }"#).unwrap();
//! assert!(config.profile_systems);
//! assert_eq!(config.query_cache_capacity, 64);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZooError};

/// Zoo settings. Every field has a default, so partial JSON is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZooConfig {
    /// Distinct query strings kept parsed
    pub query_cache_capacity: usize,

    /// Initial command queue capacity
    pub command_capacity: usize,

    /// Record per-system timings on every update
    pub profile_systems: bool,
}

impl Default for ZooConfig {
    fn default() -> Self {
        Self {
            query_cache_capacity: 64,
            command_capacity: 256,
            profile_systems: false,
        }
    }
}

impl ZooConfig {
    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ZooConfig =
            serde_json::from_str(json).map_err(|e| ZooError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.query_cache_capacity == 0 {
            return Err(ZooError::ConfigError(
                "query_cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
