#![doc = r"Component-tree lifecycle and routing engine for Arbor."]

pub mod builder;
pub mod collections;
mod controller;
pub mod error;
mod mailbox;
mod node;
pub mod platform;
mod router;
pub mod runtime;
pub mod saved_state;
pub mod scope;
pub mod surface;
mod tree;

pub use builder::Builder;
pub use controller::{Controller, NodeContext};
pub use error::{BuildError, RouteError, TreeError};
pub use mailbox::EventSender;
pub use node::{Lifecycle, Node};
pub use platform::RuntimeScheduler;
pub use router::{Presentation, Router, Slot, SlotState};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle, TaskId, TaskScope};
pub use saved_state::{Bundle, SavedState};
pub use scope::{Capability, Scope, ScopeBuilder};
pub use surface::{
    require_surface, surface_for, MemorySurface, MemorySurfaceFactory, Surface, SurfaceFactory,
    SurfaceId, SURFACE_FACTORY,
};
pub use tree::{PumpStats, Tree, ROOT};

pub type NodeId = usize;

#[cfg(test)]
#[path = "tests/fixtures.rs"]
mod fixtures;

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod router_tests;

#[cfg(test)]
#[path = "tests/tree_tests.rs"]
mod tree_tests;
