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

//! Zoo ECS - entity component store for a small 2D engine
//!
//! Entities carry bags of named components. Systems select entities with a
//! textual presence query (`sprite & !hidden | text`), run in registration
//! order once per frame, and queue shape changes that all land in a single
//! flush at the end of the pass.
//!
//! ```
//! use zoo_ecs::prelude::*;
//!
//! let mut zoo = Zoo::<()>::new();
//! zoo.world.add_entity(ComponentBag::new().with("text", "abc").with_tag("sprite"));
//! zoo.flush();
//!
//! let id = zoo
//!     .add_system(FnSystem::new("labels", "text & sprite & !hidden").boxed())
//!     .unwrap();
//! assert_eq!(zoo.matched(id).unwrap().len(), 1);
//! ```

pub mod app;
pub mod command;
pub mod component;
pub mod config;
pub mod debug;
pub mod entity;
pub mod error;
pub mod executor;
pub mod index;
pub mod prelude;
#[cfg(feature = "profiling")]
pub mod profiling;
pub mod query;
pub mod schedule;
pub mod storage;
pub mod system;
pub mod world;


pub use app::*;
pub use command::*;
pub use component::*;
pub use config::*;
pub use debug::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use index::*;
pub use query::*;
pub use schedule::*;
pub use storage::*;
pub use system::*;
pub use world::*;
