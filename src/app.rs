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

//! Main entry point: a world plus its ordered systems

use tracing::info;

use crate::command::FlushReport;
use crate::config::ZooConfig;
use crate::error::Result;
use crate::executor::{ExecutionProfile, Executor, SystemStats};
use crate::index::MatchedSet;
use crate::schedule::Schedule;
use crate::system::{BoxedSystem, SystemId};
use crate::world::World;

/// Entity world driven by an ordered list of systems.
///
/// `F` is the per-frame state handed through to every system.
pub struct Zoo<F = ()> {
    pub world: World,
    schedule: Schedule<F>,
    executor: Executor,
    frame_count: u64,
}

impl<F> Zoo<F> {
    /// Create new zoo
    pub fn new() -> Self {
        Self::with_config(ZooConfig::default())
    }

    pub fn with_config(config: ZooConfig) -> Self {
        Self {
            world: World::with_config(&config),
            schedule: Schedule::new(),
            executor: Executor::new(config.profile_systems),
            frame_count: 0,
        }
    }

    /// Append a system; registered-first runs first.
    ///
    /// Fails with `MalformedQuery` naming the system if its query does not parse.
    pub fn add_system(&mut self, system: BoxedSystem<F>) -> Result<SystemId> {
        let query = self
            .world
            .compile_query(system.query())
            .map_err(|e| e.for_system(system.name()))?;
        let name = system.name().to_string();
        let id = self.schedule.push(system, query.clone());
        info!(system = %name, query = %query, ?id, "system registered");
        self.world.track(id, query);
        Ok(id)
    }

    /// Append several systems in order.
    ///
    /// Stops at the first malformed query; systems before it stay registered.
    pub fn add_systems<I>(&mut self, systems: I) -> Result<Vec<SystemId>>
    where
        I: IntoIterator<Item = BoxedSystem<F>>,
    {
        systems
            .into_iter()
            .map(|system| self.add_system(system))
            .collect()
    }

    /// Insert a system at `index`, shifting later systems down
    pub fn insert_system(&mut self, index: usize, system: BoxedSystem<F>) -> Result<SystemId> {
        let query = self
            .world
            .compile_query(system.query())
            .map_err(|e| e.for_system(system.name()))?;
        let name = system.name().to_string();
        let id = self.schedule.insert(index, system, query.clone())?;
        info!(system = %name, query = %query, ?id, index, "system inserted");
        self.world.track(id, query);
        Ok(id)
    }

    /// Unregister a system and drop its matched set
    pub fn remove_system(&mut self, id: SystemId) -> Result<BoxedSystem<F>> {
        let system = self.schedule.remove(id)?;
        self.world.untrack(id);
        self.executor.profiler.forget(id);
        info!(system = system.name(), ?id, "system removed");
        Ok(system)
    }

    /// Run one frame: every system in order, then a single flush
    pub fn update(&mut self, frame: &mut F) -> Result<FlushReport> {
        let report = self
            .executor
            .execute_frame(&mut self.world, &mut self.schedule, frame)?;
        self.frame_count += 1;
        Ok(report)
    }

    /// Apply pending commands outside a frame (level loading, setup)
    pub fn flush(&mut self) -> FlushReport {
        self.world.flush()
    }

    /// Current matched set of a system
    pub fn matched(&self, id: SystemId) -> Result<&MatchedSet> {
        self.world.matched(id)
    }

    pub fn schedule(&self) -> &Schedule<F> {
        &self.schedule
    }

    /// System names in run order
    pub fn system_names(&self) -> Vec<&str> {
        self.schedule.system_names()
    }

    /// Completed update passes
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Timing of the last pass, when profiling is on
    pub fn last_profile(&self) -> Option<&ExecutionProfile> {
        self.executor.last_profile()
    }

    pub fn system_stats(&self, id: SystemId) -> Option<SystemStats> {
        self.executor.profiler.get_stats(id)
    }

    pub fn set_profiling(&mut self, enabled: bool) {
        self.executor.set_profiling(enabled);
    }
}

impl<F> Default for Zoo<F> {
    fn default() -> Self {
        Self::new()
    }
}
