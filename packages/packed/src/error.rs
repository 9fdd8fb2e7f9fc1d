//! Errors describing misuse of the registry and its stores.
//!
//! Most accessors treat these as contract violations and panic with the
//! error's message. The `try_*` variants hand them back instead.

use thiserror::Error;

use crate::EntityID;

/// A violated precondition of a store, the registry or a system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `EntityID::INVALID` was passed where a live entity is required.
    #[error("the invalid entity cannot hold a {component}")]
    InvalidEntity {
        /// The component type that was being created.
        component: &'static str,
    },

    /// The component type has no store in this registry.
    #[error("component type {0} is not registered")]
    UnregisteredComponent(&'static str),

    /// The component type was registered a second time.
    #[error("component type {0} is already registered")]
    DuplicateComponentType(&'static str),

    /// The entity already holds an instance of the component.
    #[error("{entity:?} already has a {component}")]
    DuplicateComponent {
        /// The entity which was being assigned a component.
        entity: EntityID,
        /// The component type.
        component: &'static str,
    },

    /// The entity holds no instance of the component.
    #[error("{entity:?} has no {component}")]
    MissingComponent {
        /// The entity which was looked up.
        entity: EntityID,
        /// The component type.
        component: &'static str,
    },

    /// The system type has not been registered.
    #[error("system {0} is not registered")]
    UnregisteredSystem(&'static str),

    /// The system type was registered a second time.
    #[error("system {0} is already registered")]
    DuplicateSystem(&'static str),

    /// The system was updated before it was initialized.
    #[error("system {0} has not been initialized")]
    SystemNotRunning(&'static str),

    /// The system was initialized twice.
    #[error("system {0} is already running")]
    SystemAlreadyRunning(&'static str),
}

/// Shorthand for results carrying an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
