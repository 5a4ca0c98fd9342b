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

//! Frame executor and system profiler
//!
//! One pass runs every system in schedule order against a copy of its
//! matched set, then flushes once. Commands queued by any system in the pass
//! are invisible to the rest of that pass and all land before the next one.

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use serde::Serialize;
#[cfg(feature = "profiling")]
use tracing::info_span;
use tracing::{error, trace};

use crate::command::FlushReport;
use crate::error::Result;
use crate::schedule::Schedule;
use crate::system::SystemId;
use crate::world::World;

/// System execution profiler
#[derive(Debug, Clone, Serialize)]
pub struct SystemStats {
    pub min: Duration,
    pub max: Duration,
    pub avg: Duration,
    pub call_count: u64,
}

/// System profiler for collecting timing data
#[derive(Debug, Default)]
pub struct SystemProfiler {
    timings: FxHashMap<SystemId, Vec<Duration>>,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_execution(&mut self, id: SystemId, duration: Duration) {
        self.timings.entry(id).or_default().push(duration);
    }

    pub fn get_stats(&self, id: SystemId) -> Option<SystemStats> {
        let timings = self.timings.get(&id)?;
        let min = *timings.iter().min()?;
        let max = *timings.iter().max()?;
        let avg = timings.iter().sum::<Duration>() / timings.len() as u32;

        Some(SystemStats {
            min,
            max,
            avg,
            call_count: timings.len() as u64,
        })
    }

    /// Forget a removed system
    pub fn forget(&mut self, id: SystemId) {
        self.timings.remove(&id);
    }

    pub fn clear(&mut self) {
        self.timings.clear();
    }
}

/// Per-system timing data for a single frame
#[derive(Debug, Clone, Serialize)]
pub struct SystemTiming {
    pub name: String,
    pub duration: Duration,
    pub entities: usize,
}

/// Execution profile for a frame
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionProfile {
    pub total_frame_time: Duration,
    pub system_timings: Vec<SystemTiming>,
    pub skipped: Vec<String>,
}

/// Frame executor
#[derive(Debug, Default)]
pub struct Executor {
    pub profiler: SystemProfiler,
    profiling: bool,
    last_profile: Option<ExecutionProfile>,
}

impl Executor {
    /// Create new executor
    pub fn new(profiling: bool) -> Self {
        Self {
            profiler: SystemProfiler::new(),
            profiling,
            last_profile: None,
        }
    }

    /// Execute one frame
    pub fn execute_frame<F>(
        &mut self,
        world: &mut World,
        schedule: &mut Schedule<F>,
        frame: &mut F,
    ) -> Result<FlushReport> {
        #[cfg(feature = "profiling")]
        let _span = info_span!("execute_frame", systems = schedule.system_count()).entered();

        let frame_start = Instant::now();
        let mut system_timings = Vec::new();
        let mut skipped = Vec::new();

        for slot in schedule.slots_mut() {
            if slot.system.skip(frame) {
                trace!(system = slot.system.name(), "skipped");
                if self.profiling {
                    skipped.push(slot.system.name().to_string());
                }
                continue;
            }

            // Copy, so commands queued below cannot disturb the iteration
            let entities = world.snapshot(slot.id);
            let mut cx = world.context();

            let start = Instant::now();
            if let Err(err) = slot.system.run(&mut cx, &entities, frame) {
                error!(system = slot.system.name(), %err, "system failed");
                return Err(err);
            }

            if self.profiling {
                let duration = start.elapsed();
                self.profiler.record_execution(slot.id, duration);
                system_timings.push(SystemTiming {
                    name: slot.system.name().to_string(),
                    duration,
                    entities: entities.len(),
                });
            }
        }

        let report = world.flush();

        if self.profiling {
            self.last_profile = Some(ExecutionProfile {
                total_frame_time: frame_start.elapsed(),
                system_timings,
                skipped,
            });
        }

        Ok(report)
    }

    /// Get last frame profile
    pub fn last_profile(&self) -> Option<&ExecutionProfile> {
        self.last_profile.as_ref()
    }

    pub fn is_profiling(&self) -> bool {
        self.profiling
    }

    pub fn set_profiling(&mut self, enabled: bool) {
        self.profiling = enabled;
        if !enabled {
            self.last_profile = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiler_stats() {
        let mut profiler = SystemProfiler::new();
        let id = SystemId(0);
        assert!(profiler.get_stats(id).is_none());

        profiler.record_execution(id, Duration::from_millis(2));
        profiler.record_execution(id, Duration::from_millis(4));

        let stats = profiler.get_stats(id).unwrap();
        assert_eq!(stats.call_count, 2);
        assert_eq!(stats.min, Duration::from_millis(2));
        assert_eq!(stats.max, Duration::from_millis(4));
        assert_eq!(stats.avg, Duration::from_millis(3));

        profiler.forget(id);
        assert!(profiler.get_stats(id).is_none());
    }

    #[test]
    fn test_empty_frame_flushes() -> Result<()> {
        let mut world = World::new();
        let mut schedule = Schedule::<()>::new();
        let mut executor = Executor::new(true);

        world.add_entity(crate::ComponentBag::new());
        let report = executor.execute_frame(&mut world, &mut schedule, &mut ())?;

        assert_eq!(report.spawned.len(), 1);
        assert!(executor.last_profile().unwrap().system_timings.is_empty());
        Ok(())
    }
}
