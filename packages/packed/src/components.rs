//! The set of component stores owned by a registry.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};

use log::debug;

use crate::{Component, ComponentList, ComponentTypeID, EntityID};
use crate::error::{Error, Result};
use crate::store::{AnyComponentStore, ComponentStore};

/// Every registered component store, keyed by component type.
///
/// This is the part of the `Registry` that systems receive during `init`
/// and `update`.
pub struct Components {
    stores: BTreeMap<ComponentTypeID, Box<dyn AnyComponentStore>>,
    default_capacity: usize,
}

impl Components {
    /// Create an empty set of stores.
    pub fn new() -> Components {
        Components::with_default_capacity(0)
    }

    /// Create an empty set of stores where each newly registered store
    /// reserves room for `capacity` components.
    pub fn with_default_capacity(capacity: usize) -> Components {
        Components {
            stores: BTreeMap::new(),
            default_capacity: capacity,
        }
    }

    /// Register a store for the component type `T`.
    ///
    /// # Panics
    /// Panics if `T` is already registered.
    pub fn register_component<T: Component>(&mut self) {
        self.register_component_with_capacity::<T>(self.default_capacity)
    }

    /// Register a store for the component type `T` with room for `capacity`
    /// components.
    ///
    /// # Panics
    /// Panics if `T` is already registered.
    pub fn register_component_with_capacity<T: Component>(&mut self, capacity: usize) {
        let type_id = T::component_type_id();
        if self.stores.contains_key(&type_id) {
            panic!("{}", Error::DuplicateComponentType(T::component_name()));
        }

        debug!("registering component {} (capacity {})", T::component_name(), capacity);
        self.stores.insert(type_id, Box::new(ComponentStore::<T>::with_capacity(capacity)));
    }

    /// Returns true if a store is registered for `T`.
    pub fn is_registered<T: Component>(&self) -> bool {
        self.stores.contains_key(&T::component_type_id())
    }

    /// Attach a default-constructed component of each type in `L` to
    /// `entity`.
    ///
    /// Types without a registered store are skipped without error.
    ///
    /// # Panics
    /// Panics if `entity` already has one of the registered components.
    pub fn add_components<L: ComponentList>(&mut self, entity: EntityID) {
        for type_id in L::type_ids() {
            match self.stores.get_mut(&type_id) {
                Some(store) => store.create_default(entity),
                None => debug!("skipping unregistered component {:?} for {:?}", type_id, entity),
            }
        }
    }

    /// Attach `value` to `entity`.
    ///
    /// # Panics
    /// Panics if `T` is unregistered or `entity` already has a `T`.
    pub fn insert_component<T: Component>(&mut self, entity: EntityID, value: T) -> &mut T {
        self.store_mut::<T>().insert(entity, value)
    }

    /// Detach the `T` belonging to `entity`, if there is one.
    ///
    /// # Panics
    /// Panics if `T` is unregistered.
    pub fn remove_component<T: Component>(&mut self, entity: EntityID) {
        self.store_mut::<T>().on_entity_destroyed(entity)
    }

    /// Returns true if `entity` has a `T`.
    ///
    /// # Panics
    /// Panics if `T` is unregistered.
    pub fn has_component<T: Component>(&self, entity: EntityID) -> bool {
        self.store::<T>().contains(entity)
    }

    /// Get the `T` belonging to `entity`.
    ///
    /// # Panics
    /// Panics if `T` is unregistered or `entity` has no `T`.
    pub fn get_component<T: Component>(&self, entity: EntityID) -> &T {
        self.store::<T>().get(entity)
    }

    /// Get the `T` belonging to `entity` mutably.
    ///
    /// # Panics
    /// Panics if `T` is unregistered or `entity` has no `T`.
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityID) -> &mut T {
        self.store_mut::<T>().get_mut(entity)
    }

    /// Get the `T` belonging to `entity`, or the reason there is none.
    pub fn try_get_component<T: Component>(&self, entity: EntityID) -> Result<&T> {
        self.try_store::<T>()?.try_get(entity)
    }

    /// Get the `T` belonging to `entity` mutably, or the reason there is
    /// none.
    pub fn try_get_component_mut<T: Component>(&mut self, entity: EntityID) -> Result<&mut T> {
        self.try_store_mut::<T>()?.try_get_mut(entity)
    }

    /// Get the store for `T`.
    ///
    /// # Panics
    /// Panics if `T` is unregistered.
    pub fn store<T: Component>(&self) -> &ComponentStore<T> {
        match self.try_store::<T>() {
            Ok(store) => store,
            Err(err) => panic!("{}", err),
        }
    }

    /// Get the store for `T` mutably.
    ///
    /// # Panics
    /// Panics if `T` is unregistered.
    pub fn store_mut<T: Component>(&mut self) -> &mut ComponentStore<T> {
        match self.try_store_mut::<T>() {
            Ok(store) => store,
            Err(err) => panic!("{}", err),
        }
    }

    /// Get the store for `T`, or an error if it is unregistered.
    pub fn try_store<T: Component>(&self) -> Result<&ComponentStore<T>> {
        self.stores.get(&T::component_type_id())
            .and_then(|store| store.as_any().downcast_ref::<ComponentStore<T>>())
            .ok_or_else(|| Error::UnregisteredComponent(T::component_name()))
    }

    /// Get the store for `T` mutably, or an error if it is unregistered.
    pub fn try_store_mut<T: Component>(&mut self) -> Result<&mut ComponentStore<T>> {
        self.stores.get_mut(&T::component_type_id())
            .and_then(|store| store.as_any_mut().downcast_mut::<ComponentStore<T>>())
            .ok_or_else(|| Error::UnregisteredComponent(T::component_name()))
    }

    /// Get the type-erased store for a component type ID.
    pub fn erased_store(&self, type_id: ComponentTypeID) -> Option<&dyn AnyComponentStore> {
        self.stores.get(&type_id).map(|store| &**store)
    }

    /// Iterate over every registered component type.
    pub fn component_types(&self) -> impl Iterator<Item=ComponentTypeID> + '_ {
        self.stores.keys().copied()
    }

    /// Remove every component belonging to `entity`.
    pub(crate) fn destroy_entity(&mut self, entity: EntityID) {
        for store in self.stores.values_mut() {
            store.on_entity_destroyed(entity);
        }
    }
}

impl Default for Components {
    fn default() -> Self {
        Components::new()
    }
}

impl Debug for Components {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.stores.iter().map(|(type_id, store)| (type_id, store.len())))
            .finish()
    }
}
