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

//! # Profiling
//!
//! With the `profiling` feature the executor and world open `info_span!`s
//! around each update pass (`execute_frame`) and each flush (`world.flush`).
//! [`init_tracing`] installs a subscriber to collect them:
//!
//! ```ignore
//! let _guard = zoo_ecs::profiling::init_tracing(&TraceOutput::Stdout { json: false })?;
//! ```
//!
//! Filter with `RUST_LOG`, e.g. `RUST_LOG=zoo_ecs=debug` to see flush reports.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::error::{Result, ZooError};

/// Where trace output goes
#[derive(Debug, Clone)]
pub enum TraceOutput {
    Stdout { json: bool },
    /// Daily-rolling file in `directory`
    File { directory: PathBuf, prefix: String },
}

/// Install a global subscriber.
///
/// Keep the returned guard alive; dropping it stops the background writer.
pub fn init_tracing(output: &TraceOutput) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard) = match output {
        TraceOutput::Stdout { .. } => tracing_appender::non_blocking(std::io::stdout()),
        TraceOutput::File { directory, prefix } => {
            tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, prefix))
        }
    };

    let result = match output {
        TraceOutput::Stdout { json: true } => Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        _ => Registry::default()
            .with(filter)
            .with(fmt::layer().with_writer(writer))
            .try_init(),
    };

    result.map_err(|e| ZooError::ConfigError(format!("tracing already initialised: {e}")))?;
    Ok(guard)
}
