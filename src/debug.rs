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

//! Inspection helpers for debugging

use serde::Serialize;
use tracing::info;

use crate::app::Zoo;
use crate::entity::Entity;
use crate::error::Result;
use crate::query::QueryCacheStats;
use crate::system::SystemId;
use crate::world::World;

/// Zoo inspector for debugging
pub struct ZooInspector;

impl ZooInspector {
    /// Snapshot of the world and its systems
    pub fn summary<F>(zoo: &Zoo<F>) -> ZooSummary {
        let systems = zoo
            .schedule()
            .slots()
            .iter()
            .map(|slot| SystemInfo {
                id: slot.id(),
                name: slot.name().to_string(),
                query: slot.query().to_string(),
                matched: zoo.matched(slot.id()).map_or(0, |set| set.len()),
            })
            .collect();

        ZooSummary {
            frame: zoo.frame_count(),
            entities: zoo.world.entity_count(),
            pending_commands: zoo.world.pending_commands(),
            query_cache: zoo.world.query_cache_stats(),
            systems,
        }
    }

    /// Components of one entity, sorted by key
    pub fn entity(world: &World, entity: Entity) -> Result<EntityInfo> {
        let bag = world.bag(entity)?;
        let components = bag
            .keys()
            .into_iter()
            .map(|key| ComponentInfo {
                key: key.to_string(),
                type_name: bag.type_name_of(key).unwrap_or("?").to_string(),
            })
            .collect();
        Ok(EntityInfo { entity, components })
    }

    /// Log a summary at `info`
    pub fn log_summary<F>(zoo: &Zoo<F>) {
        let summary = Self::summary(zoo);
        info!(
            frame = summary.frame,
            entities = summary.entities,
            pending = summary.pending_commands,
            "zoo summary"
        );
        for system in &summary.systems {
            info!(
                system = %system.name,
                query = %system.query,
                matched = system.matched,
                "system"
            );
        }
    }
}

/// World and schedule summary
#[derive(Debug, Clone, Serialize)]
pub struct ZooSummary {
    pub frame: u64,
    pub entities: usize,
    pub pending_commands: usize,
    pub query_cache: QueryCacheStats,
    /// In run order
    pub systems: Vec<SystemInfo>,
}

impl ZooSummary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One registered system
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub id: SystemId,
    pub name: String,
    /// Canonical query text
    pub query: String,
    pub matched: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityInfo {
    pub entity: Entity,
    pub components: Vec<ComponentInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentInfo {
    pub key: String,
    pub type_name: String,
}
