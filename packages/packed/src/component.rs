//! Base definitions for components.
//!
//! All entities in this library are built out of components. There is no
//! intrinsic value to an entity. This module provides means of defining and
//! naming component types.
//!
//! Each component type is allocated a unique ID the first time it is used.
//! There is a macro (`component`) to help you assign this unique ID.

use std::any::type_name;
use std::fmt::{self, Debug, Formatter};
use std::sync::RwLock;

use once_cell::sync::{Lazy, OnceCell};

/// A component type ID which is unique for a specific component type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentTypeID(usize);

/// Names of every component type which has been assigned an ID, indexed by ID.
static COMPONENT_NAMES: Lazy<RwLock<Vec<&'static str>>> = Lazy::new(|| RwLock::new(Vec::new()));

impl ComponentTypeID {
    /// Create a new globally unique `ComponentTypeID`.
    pub fn register<T: Component>() -> ComponentTypeID {
        let mut names = COMPONENT_NAMES.write().unwrap_or_else(|e| e.into_inner());
        let id = ComponentTypeID(names.len());
        names.push(type_name::<T>());
        id
    }

    /// Return the inner unique ID.
    pub fn id(&self) -> usize {
        self.0
    }

    /// Return the name of the component type, if it is known.
    pub fn name(&self) -> Option<&'static str> {
        let names = COMPONENT_NAMES.read().unwrap_or_else(|e| e.into_inner());
        names.get(self.0).copied()
    }
}

impl Debug for ComponentTypeID {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "ComponentTypeID(#{} missing)", self.0),
        }
    }
}

/// A struct for lazily assigning unique `ComponentTypeID`s.
pub struct AutoComponentTypeID(OnceCell<ComponentTypeID>);

impl AutoComponentTypeID {
    /// Create a new `AutoComponentTypeID`.
    pub const fn new() -> AutoComponentTypeID {
        AutoComponentTypeID(OnceCell::new())
    }

    /// Get the `ComponentTypeID` this struct wraps.
    pub fn get<T: Component>(&self) -> ComponentTypeID {
        *self.0.get_or_init(ComponentTypeID::register::<T>)
    }
}

/// The component trait is implemented on all component types.
///
/// Components are plain data. A store creates new instances with
/// `Default::default`.
pub trait Component: Default + Send + 'static {
    /// Get the unique type ID of this component.
    fn component_type_id() -> ComponentTypeID;

    /// Get the name of this component type, used in diagnostics.
    fn component_name() -> &'static str {
        type_name::<Self>()
    }
}

/// An ordered list of component types.
///
/// Implemented for every component type, for `()` and for tuples of up to
/// eight component types, so that `add_components::<Position>` and
/// `add_components::<(Position, Velocity)>` both work.
pub trait ComponentList {
    /// Return the IDs of the component types in declaration order.
    fn type_ids() -> Vec<ComponentTypeID>;
}

impl<T: Component> ComponentList for T {
    fn type_ids() -> Vec<ComponentTypeID> {
        vec![T::component_type_id()]
    }
}

impl ComponentList for () {
    fn type_ids() -> Vec<ComponentTypeID> {
        Vec::new()
    }
}

macro_rules! impl_component_list {
    ($($t:ident),+) => {
        impl<$($t: Component),+> ComponentList for ($($t,)+) {
            fn type_ids() -> Vec<ComponentTypeID> {
                vec![$($t::component_type_id()),+]
            }
        }
    };
}

impl_component_list!(A);
impl_component_list!(A, B);
impl_component_list!(A, B, C);
impl_component_list!(A, B, C, D);
impl_component_list!(A, B, C, D, E);
impl_component_list!(A, B, C, D, E, F);
impl_component_list!(A, B, C, D, E, F, G);
impl_component_list!(A, B, C, D, E, F, G, H);

/// Implement the `Component` trait on a type.
///
/// Component types must implement `Default` and `Send`.
#[macro_export]
macro_rules! component {
    ($i:ident) => {
        const _: () = {
            static INIT_TYPE: $crate::component::AutoComponentTypeID = $crate::component::AutoComponentTypeID::new();

            impl $crate::component::Component for $i {
                fn component_type_id() -> $crate::component::ComponentTypeID {
                    INIT_TYPE.get::<$i>()
                }
            }

            ()
        };
    };
}
