//! Dense storage for a single component type.
//!
//! Values live in one contiguous `Vec`, with a parallel `Vec` naming the
//! owning entity of each slot and a map from entity to slot. Removal moves
//! the last slot into the hole, so the arrays never contain gaps. Slot
//! indices are therefore only stable until the next removal; the index map is
//! the authority between calls.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};

use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::{Component, EntityID};
use crate::error::{Error, Result};

/// Dense storage for every instance of the component type `T`.
pub struct ComponentStore<T: Component> {
    values: Vec<T>,
    entities: Vec<EntityID>,
    index: HashMap<EntityID, usize>,
}

impl<T: Component> ComponentStore<T> {
    /// Create a new empty store.
    pub fn new() -> ComponentStore<T> {
        ComponentStore::with_capacity(0)
    }

    /// Create a new empty store with room for `capacity` components before
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> ComponentStore<T> {
        ComponentStore {
            values: Vec::with_capacity(capacity),
            entities: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Get the number of components in this store.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the store holds no components.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the number of components the store can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    /// Returns true if `entity` has a component in this store.
    pub fn contains(&self, entity: EntityID) -> bool {
        self.index.contains_key(&entity)
    }

    /// Attach a default-constructed component to `entity`.
    ///
    /// # Panics
    /// Panics if `entity` is invalid or already has a component here.
    pub fn create(&mut self, entity: EntityID) -> &mut T {
        self.insert(entity, T::default())
    }

    /// Attach `value` to `entity`.
    ///
    /// # Panics
    /// Panics if `entity` is invalid or already has a component here.
    pub fn insert(&mut self, entity: EntityID, value: T) -> &mut T {
        match self.try_insert(entity, value) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }

    /// Attach `value` to `entity`, returning an error if the slot is taken
    /// or the entity is invalid.
    pub fn try_insert(&mut self, entity: EntityID, value: T) -> Result<&mut T> {
        if !entity.is_valid() {
            return Err(Error::InvalidEntity { component: T::component_name() });
        }
        if self.contains(entity) {
            return Err(Error::DuplicateComponent { entity, component: T::component_name() });
        }
        debug_assert_eq!(self.entities.len(), self.values.len());
        debug_assert_eq!(self.index.len(), self.values.len());

        let slot = self.values.len();
        self.index.insert(entity, slot);
        self.entities.push(entity);
        self.values.push(value);
        Ok(&mut self.values[slot])
    }

    /// Detach and return the component belonging to `entity`.
    ///
    /// The last component in the store is moved into the vacated slot.
    ///
    /// # Panics
    /// Panics if `entity` has no component here.
    pub fn remove(&mut self, entity: EntityID) -> T {
        let slot = match self.index.remove(&entity) {
            Some(slot) => slot,
            None => panic!("{}", self.missing(entity)),
        };

        let last = self.values.len() - 1;
        if slot != last {
            let moved = self.entities[last];
            self.index.insert(moved, slot);
        }

        self.entities.swap_remove(slot);
        let value = self.values.swap_remove(slot);
        debug_assert_eq!(self.entities.len(), self.values.len());
        debug_assert_eq!(self.index.len(), self.values.len());
        value
    }

    /// Remove the component belonging to `entity`, if there is one.
    ///
    /// This is safe to call for every store when an entity is torn down.
    pub fn on_entity_destroyed(&mut self, entity: EntityID) {
        if self.contains(entity) {
            self.remove(entity);
        }
    }

    /// Get the component belonging to `entity`.
    ///
    /// # Panics
    /// Panics if `entity` has no component here.
    pub fn get(&self, entity: EntityID) -> &T {
        match self.try_get(entity) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }

    /// Get the component belonging to `entity` mutably.
    ///
    /// # Panics
    /// Panics if `entity` has no component here.
    pub fn get_mut(&mut self, entity: EntityID) -> &mut T {
        match self.try_get_mut(entity) {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }

    /// Get the component belonging to `entity`, or an error if it has none.
    pub fn try_get(&self, entity: EntityID) -> Result<&T> {
        match self.index.get(&entity) {
            Some(&slot) => Ok(&self.values[slot]),
            None => Err(self.missing(entity)),
        }
    }

    /// Get the component belonging to `entity` mutably, or an error if it
    /// has none.
    pub fn try_get_mut(&mut self, entity: EntityID) -> Result<&mut T> {
        match self.index.get(&entity) {
            Some(&slot) => Ok(&mut self.values[slot]),
            None => Err(self.missing(entity)),
        }
    }

    /// Get the owning entities, in slot order.
    pub fn entities(&self) -> &[EntityID] {
        &self.entities
    }

    /// Get the components, in slot order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Get the components mutably, in slot order.
    ///
    /// Owners are fixed, so the slices can be updated in place but not
    /// resized.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Iterate over every entity and its component.
    pub fn iter(&self) -> impl Iterator<Item=(EntityID, &T)> {
        self.entities.iter().copied().zip(self.values.iter())
    }

    /// Iterate over every entity and its component mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item=(EntityID, &mut T)> {
        self.entities.iter().copied().zip(self.values.iter_mut())
    }

    /// Create a parallel iterator over every entity and its component.
    pub fn par_iter(&self) -> impl ParallelIterator<Item=(EntityID, &T)>
        where T: Sync
    {
        self.entities.par_iter().copied().zip(self.values.par_iter())
    }

    fn missing(&self, entity: EntityID) -> Error {
        Error::MissingComponent { entity, component: T::component_name() }
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        ComponentStore::new()
    }
}

impl<T: Component + Debug> Debug for ComponentStore<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// The type-erased view of a `ComponentStore`.
///
/// The registry keeps stores of different component types side by side
/// behind this trait and downcasts back to `ComponentStore<T>` for typed
/// access.
pub trait AnyComponentStore: Send {
    /// Returns true if `entity` has a component in this store.
    fn contains(&self, entity: EntityID) -> bool;

    /// Remove the component belonging to `entity`, if there is one.
    fn on_entity_destroyed(&mut self, entity: EntityID);

    /// Get the owning entities, in slot order.
    fn entities(&self) -> &[EntityID];

    /// Attach a default-constructed component to `entity`.
    ///
    /// # Panics
    /// Panics if `entity` is invalid or already has a component here.
    fn create_default(&mut self, entity: EntityID);

    /// Get the number of components in the store.
    fn len(&self) -> usize;

    /// Get the name of the stored component type.
    fn component_name(&self) -> &'static str;

    /// Cast to `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Cast to `Any` for downcasting mutably.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyComponentStore for ComponentStore<T> {
    fn contains(&self, entity: EntityID) -> bool {
        ComponentStore::contains(self, entity)
    }

    fn on_entity_destroyed(&mut self, entity: EntityID) {
        ComponentStore::on_entity_destroyed(self, entity)
    }

    fn entities(&self) -> &[EntityID] {
        ComponentStore::entities(self)
    }

    fn create_default(&mut self, entity: EntityID) {
        self.create(entity);
    }

    fn len(&self) -> usize {
        ComponentStore::len(self)
    }

    fn component_name(&self) -> &'static str {
        T::component_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
