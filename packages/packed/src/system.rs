//! ECS systems.
//!
//! A system declares the component types it depends on and tracks the set
//! of entities it works on. The registry seeds that set once, when the
//! system is registered, and afterwards only shrinks it when an entity is
//! cleared.

use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::ops::Deref;

use crate::{ComponentList, ComponentTypeID, Components, EntityID};
use crate::error::{Error, Result};

/// The set of entities a system tracks.
pub type EntitySet = BTreeSet<EntityID>;

/// The state every system carries: the tracked entity set, tagged with the
/// system's dependency list `L`.
pub struct SystemBase<L: ComponentList> {
    entities: EntitySet,
    _dependencies: PhantomData<fn() -> L>,
}

impl<L: ComponentList> SystemBase<L> {
    /// Create a base tracking no entities.
    pub fn new() -> SystemBase<L> {
        SystemBase {
            entities: EntitySet::new(),
            _dependencies: PhantomData,
        }
    }

    /// Get the tracked entity set.
    pub fn entities(&self) -> &EntitySet {
        &self.entities
    }

    /// Get the tracked entity set mutably.
    pub fn entities_mut(&mut self) -> &mut EntitySet {
        &mut self.entities
    }
}

impl<L: ComponentList> Default for SystemBase<L> {
    fn default() -> Self {
        SystemBase::new()
    }
}

impl<L: ComponentList> Deref for SystemBase<L> {
    type Target = EntitySet;

    fn deref(&self) -> &Self::Target {
        &self.entities
    }
}

impl<L: ComponentList> Debug for SystemBase<L> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entities.iter()).finish()
    }
}

/// An ECS system.
///
/// The dependency list is part of the system's type. Implementors embed a
/// `SystemBase<Self::Dependencies>` and expose it through `base` and
/// `base_mut`; the set operations and the `init`/`update` hooks have default
/// implementations.
pub trait System: Send + 'static {
    /// The component types this system depends on, usually a tuple.
    type Dependencies: ComponentList;

    /// Get the shared system state.
    fn base(&self) -> &SystemBase<Self::Dependencies>;

    /// Get the shared system state mutably.
    fn base_mut(&mut self) -> &mut SystemBase<Self::Dependencies>;

    /// Return the component types this system depends on, in order.
    fn dependencies() -> Vec<ComponentTypeID> {
        <Self::Dependencies as ComponentList>::type_ids()
    }

    /// Get the tracked entity set.
    fn entities(&self) -> &EntitySet {
        self.base().entities()
    }

    /// Get the tracked entity set mutably.
    fn entities_mut(&mut self) -> &mut EntitySet {
        self.base_mut().entities_mut()
    }

    /// Prepare the system before its first update.
    fn init(&mut self, _components: &mut Components) {}

    /// Run one frame of the system, `dt` seconds after the previous one.
    fn update(&mut self, _components: &mut Components, _dt: f64) {}

    /// Start tracking `entity`.
    fn add_entity(&mut self, entity: EntityID) {
        self.entities_mut().insert(entity);
    }

    /// Stop tracking `entity`.
    fn remove_entity(&mut self, entity: EntityID) {
        self.entities_mut().remove(&entity);
    }

    /// Start tracking every entity in `entities`.
    fn add_entities(&mut self, entities: &[EntityID]) {
        self.entities_mut().extend(entities.iter().copied());
    }
}

/// Where a system is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    /// Registered, but `init` has not run yet.
    Constructed,
    /// Initialized and receiving updates.
    Running,
}

/// The object-safe face of a `System`, used to store systems of different
/// types side by side.
pub(crate) trait DynSystem: Send {
    fn run_init(&mut self, components: &mut Components);
    fn run_update(&mut self, components: &mut Components, dt: f64);
    fn forget_entity(&mut self, entity: EntityID);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn name(&self) -> &'static str;
}

impl<S: System> DynSystem for S {
    fn run_init(&mut self, components: &mut Components) {
        System::init(self, components)
    }

    fn run_update(&mut self, components: &mut Components, dt: f64) {
        System::update(self, components, dt)
    }

    fn forget_entity(&mut self, entity: EntityID) {
        System::remove_entity(self, entity)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn name(&self) -> &'static str {
        type_name::<S>()
    }
}

struct SystemEntry {
    state: SystemState,
    system: Box<dyn DynSystem>,
}

/// Every registered system, keyed by system type, in registration order.
#[derive(Default)]
pub struct Systems {
    entries: Vec<SystemEntry>,
    index: HashMap<TypeId, usize>,
}

impl Systems {
    /// Create an empty collection of systems.
    pub fn new() -> Systems {
        Systems::default()
    }

    /// Get the number of registered systems.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no systems are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if a system of type `S` is registered.
    pub fn contains<S: System>(&self) -> bool {
        self.index.contains_key(&TypeId::of::<S>())
    }

    /// Get the system of type `S`.
    pub fn get<S: System>(&self) -> Result<&S> {
        let entry = self.entry::<S>()?;
        entry.system.as_any().downcast_ref::<S>()
            .ok_or_else(|| Error::UnregisteredSystem(type_name::<S>()))
    }

    /// Get the system of type `S` mutably.
    pub fn get_mut<S: System>(&mut self) -> Result<&mut S> {
        let entry = self.entry_mut::<S>()?;
        entry.system.as_any_mut().downcast_mut::<S>()
            .ok_or_else(|| Error::UnregisteredSystem(type_name::<S>()))
    }

    /// Get the lifecycle state of the system of type `S`.
    pub fn state<S: System>(&self) -> Result<SystemState> {
        self.entry::<S>().map(|entry| entry.state)
    }

    /// Iterate over the names of the registered systems in registration order.
    pub fn names(&self) -> impl Iterator<Item=&'static str> + '_ {
        self.entries.iter().map(|entry| entry.system.name())
    }

    /// Add a constructed system.
    pub(crate) fn insert<S: System>(&mut self, system: S) -> Result<&mut S> {
        let type_id = TypeId::of::<S>();
        if self.index.contains_key(&type_id) {
            return Err(Error::DuplicateSystem(type_name::<S>()));
        }

        self.index.insert(type_id, self.entries.len());
        self.entries.push(SystemEntry {
            state: SystemState::Constructed,
            system: Box::new(system),
        });
        self.get_mut::<S>()
    }

    /// Run `init` on the system of type `S`.
    pub(crate) fn init<S: System>(&mut self, components: &mut Components) -> Result<()> {
        let entry = self.entry_mut::<S>()?;
        if entry.state == SystemState::Running {
            return Err(Error::SystemAlreadyRunning(entry.system.name()));
        }

        entry.system.run_init(components);
        entry.state = SystemState::Running;
        Ok(())
    }

    /// Run `update` on the system of type `S`.
    pub(crate) fn update<S: System>(&mut self, components: &mut Components, dt: f64) -> Result<()> {
        let entry = self.entry_mut::<S>()?;
        if entry.state != SystemState::Running {
            return Err(Error::SystemNotRunning(entry.system.name()));
        }

        entry.system.run_update(components, dt);
        Ok(())
    }

    /// Stop tracking `entity` in every system.
    pub(crate) fn remove_entity(&mut self, entity: EntityID) {
        for entry in self.entries.iter_mut() {
            entry.system.forget_entity(entity);
        }
    }

    fn entry<S: System>(&self) -> Result<&SystemEntry> {
        self.index.get(&TypeId::of::<S>())
            .map(|&idx| &self.entries[idx])
            .ok_or_else(|| Error::UnregisteredSystem(type_name::<S>()))
    }

    fn entry_mut<S: System>(&mut self) -> Result<&mut SystemEntry> {
        match self.index.get(&TypeId::of::<S>()) {
            Some(&idx) => Ok(&mut self.entries[idx]),
            None => Err(Error::UnregisteredSystem(type_name::<S>())),
        }
    }
}

impl Debug for Systems {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|entry| (entry.system.name(), entry.state)))
            .finish()
    }
}
