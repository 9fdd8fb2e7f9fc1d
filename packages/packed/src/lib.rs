//! An entity component system.
//!
//! Each component type is kept in its own dense array, so adding, removing
//! and looking up a component are all O(1) and iterating a component type
//! touches contiguous memory. A `Registry` owns those stores along with the
//! systems which operate on them.

pub use component::{
    Component,
    ComponentList,
    ComponentTypeID,
};
pub use components::Components;
pub use entity::{EntityAllocator, EntityID};
pub use error::{Error, Result};
pub use registry::Registry;
pub use store::{AnyComponentStore, ComponentStore};
pub use system::{
    EntitySet,
    System,
    SystemBase,
    SystemState,
    Systems,
};

pub mod component;
pub mod components;
mod entity;
mod error;

pub mod store;
pub mod registry;
pub mod system;
