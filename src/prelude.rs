//! Convenient re-exports of commonly used types.
//!
//! The prelude can be imported with:
//! ```
//! use zoo_ecs::prelude::*;
//! ```

pub use crate::app::Zoo;
pub use crate::command::FlushReport;
pub use crate::component::{Component, ComponentBag, Tag};
pub use crate::config::ZooConfig;
pub use crate::entity::Entity;
pub use crate::error::{Result, ZooError};
pub use crate::query::{parse_query, CompiledQuery};
pub use crate::system::{BoxedSystem, FnSystem, System, SystemContext, SystemId};
pub use crate::world::World;
