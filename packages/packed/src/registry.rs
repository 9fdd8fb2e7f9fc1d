//! The registry which owns every component store and system.

use std::any::type_name;
use std::ops::{Deref, DerefMut};

use log::{debug, trace};

use crate::{Components, EntityID, System, SystemState, Systems};

/// The registry routes component changes to the right store and binds
/// systems to the entities they work on.
///
/// Component access is available directly on the registry through `Deref`
/// to `Components`.
///
/// Subscriptions are a snapshot: when a system is registered, every entity
/// present in *any* of its dependencies' stores joins its tracked set.
/// Entities gaining components later are not added, and entities losing a
/// component are not removed. Only `clear_entity` removes an entity from
/// systems. Because the snapshot is a union over dependencies, a system may
/// track entities which lack some of its dependencies; look those up with
/// `try_get_component` or `has_component` if that matters.
#[derive(Debug, Default)]
pub struct Registry {
    components: Components,
    systems: Systems,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Create an empty registry where every store registered through
    /// `register_component` reserves room for `capacity` components.
    pub fn with_component_capacity(capacity: usize) -> Registry {
        Registry {
            components: Components::with_default_capacity(capacity),
            systems: Systems::new(),
        }
    }

    /// Get the component stores.
    pub fn components(&self) -> &Components {
        &self.components
    }

    /// Get the component stores mutably.
    pub fn components_mut(&mut self) -> &mut Components {
        &mut self.components
    }

    /// Get the registered systems.
    pub fn systems(&self) -> &Systems {
        &self.systems
    }

    /// Construct and register the system `S`.
    ///
    /// See `insert_system`.
    pub fn register_system<S: System + Default>(&mut self) -> &mut S {
        self.insert_system(S::default())
    }

    /// Register `system` and subscribe it to every entity currently holding
    /// any of its dependencies.
    ///
    /// # Panics
    /// Panics if a system of the same type is already registered, or if one
    /// of its dependencies has no registered store.
    pub fn insert_system<S: System>(&mut self, mut system: S) -> &mut S {
        if self.systems.contains::<S>() {
            panic!("{}", crate::Error::DuplicateSystem(type_name::<S>()));
        }

        for type_id in S::dependencies() {
            match self.components.erased_store(type_id) {
                Some(store) => system.add_entities(store.entities()),
                None => panic!("{}", crate::Error::UnregisteredComponent(
                    type_id.name().unwrap_or("<unknown>"))),
            }
        }

        debug!("registering system {} tracking {} entities",
               type_name::<S>(), system.entities().len());
        match self.systems.insert(system) {
            Ok(system) => system,
            Err(err) => panic!("{}", err),
        }
    }

    /// Get the system of type `S`.
    ///
    /// # Panics
    /// Panics if `S` is not registered.
    pub fn system<S: System>(&self) -> &S {
        match self.systems.get::<S>() {
            Ok(system) => system,
            Err(err) => panic!("{}", err),
        }
    }

    /// Get the system of type `S` mutably.
    ///
    /// # Panics
    /// Panics if `S` is not registered.
    pub fn system_mut<S: System>(&mut self) -> &mut S {
        match self.systems.get_mut::<S>() {
            Ok(system) => system,
            Err(err) => panic!("{}", err),
        }
    }

    /// Get the lifecycle state of the system of type `S`.
    ///
    /// # Panics
    /// Panics if `S` is not registered.
    pub fn system_state<S: System>(&self) -> SystemState {
        match self.systems.state::<S>() {
            Ok(state) => state,
            Err(err) => panic!("{}", err),
        }
    }

    /// Initialize the system of type `S`, moving it to `SystemState::Running`.
    ///
    /// # Panics
    /// Panics if `S` is not registered or is already running.
    pub fn init_system<S: System>(&mut self) {
        let Registry { components, systems } = self;
        if let Err(err) = systems.init::<S>(components) {
            panic!("{}", err);
        }
    }

    /// Update the system of type `S` by `dt` seconds.
    ///
    /// # Panics
    /// Panics if `S` is not registered or has not been initialized.
    pub fn update_system<S: System>(&mut self, dt: f64) {
        let Registry { components, systems } = self;
        if let Err(err) = systems.update::<S>(components, dt) {
            panic!("{}", err);
        }
    }

    /// Destroy `entity`: remove all of its components and drop it from every
    /// system.
    ///
    /// The ID itself is never reissued.
    pub fn clear_entity(&mut self, entity: EntityID) {
        trace!("clearing {:?}", entity);
        self.components.destroy_entity(entity);
        self.systems.remove_entity(entity);
    }
}

impl Deref for Registry {
    type Target = Components;

    fn deref(&self) -> &Self::Target {
        &self.components
    }
}

impl DerefMut for Registry {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.components
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{component, EntityAllocator, SystemBase};

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Position(f32, f32);
    component!(Position);

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Velocity(f32, f32);
    component!(Velocity);

    #[derive(Debug, Default)]
    struct Tag;
    component!(Tag);

    #[derive(Default)]
    struct Movement {
        base: SystemBase<(Position, Velocity)>,
    }

    impl System for Movement {
        type Dependencies = (Position, Velocity);

        fn base(&self) -> &SystemBase<(Position, Velocity)> { &self.base }

        fn base_mut(&mut self) -> &mut SystemBase<(Position, Velocity)> { &mut self.base }

        fn update(&mut self, components: &mut Components, dt: f64) {
            for &entity in self.base.iter() {
                let Velocity(vx, vy) = *components.get_component::<Velocity>(entity);
                let position = components.get_component_mut::<Position>(entity);
                position.0 += vx * dt as f32;
                position.1 += vy * dt as f32;
            }
        }
    }

    #[derive(Default)]
    struct Tagged {
        base: SystemBase<Tag>,
        seen: usize,
    }

    impl System for Tagged {
        type Dependencies = Tag;

        fn base(&self) -> &SystemBase<Tag> { &self.base }

        fn base_mut(&mut self) -> &mut SystemBase<Tag> { &mut self.base }

        fn init(&mut self, components: &mut Components) {
            self.seen = components.store::<Tag>().len();
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register_component::<Position>();
        registry.register_component::<Velocity>();
        registry.register_component::<Tag>();
        registry
    }

    fn tracked<S: System>(registry: &Registry) -> Vec<EntityID> {
        registry.system::<S>().entities().iter().copied().collect()
    }

    #[test]
    fn test_initial_subscription_snapshot() {
        let allocator = EntityAllocator::new();
        let mut registry = registry();
        let x = allocator.create();
        let y = allocator.create();
        registry.add_components::<Position>(x);
        registry.add_components::<Position>(y);

        registry.register_system::<Movement>();
        assert_eq!(tracked::<Movement>(&registry), vec![x, y]);

        // Components attached after registration do not subscribe.
        let z = allocator.create();
        registry.add_components::<(Position, Velocity)>(z);
        assert_eq!(tracked::<Movement>(&registry), vec![x, y]);
        assert!(!registry.system::<Movement>().entities().contains(&z));
    }

    #[test]
    fn test_subscription_is_union() {
        let allocator = EntityAllocator::new();
        let mut registry = registry();
        let a = allocator.create();
        let b = allocator.create();
        let c = allocator.create();
        registry.add_components::<Position>(a);
        registry.add_components::<(Position, Velocity)>(b);
        registry.add_components::<Velocity>(c);

        registry.register_system::<Movement>();
        assert_eq!(tracked::<Movement>(&registry), vec![a, b, c]);
    }

    #[test]
    fn test_losing_component_keeps_subscription() {
        let allocator = EntityAllocator::new();
        let mut registry = registry();
        let a = allocator.create();
        registry.add_components::<(Position, Velocity)>(a);
        registry.register_system::<Movement>();

        registry.remove_component::<Velocity>(a);
        assert!(!registry.has_component::<Velocity>(a));
        assert_eq!(tracked::<Movement>(&registry), vec![a]);
    }

    #[test]
    fn test_clear_entity_cascades() {
        let allocator = EntityAllocator::new();
        let mut registry = registry();
        let a = allocator.create();
        let b = allocator.create();
        registry.add_components::<(Position, Velocity, Tag)>(a);
        registry.add_components::<(Position, Tag)>(b);
        registry.register_system::<Movement>();
        registry.register_system::<Tagged>();

        registry.clear_entity(a);

        assert!(!registry.has_component::<Position>(a));
        assert!(!registry.has_component::<Velocity>(a));
        assert!(!registry.has_component::<Tag>(a));
        assert_eq!(tracked::<Movement>(&registry), vec![b]);
        assert_eq!(tracked::<Tagged>(&registry), vec![b]);

        // Clearing twice, or clearing an unknown entity, is harmless.
        registry.clear_entity(a);
        registry.clear_entity(EntityID::from_raw(999));
        assert_eq!(registry.store::<Position>().entities(), &[b]);
    }

    #[test]
    fn test_update_moves_entities() {
        let allocator = EntityAllocator::new();
        let mut registry = registry();
        let a = allocator.create();
        registry.add_components::<(Position, Velocity)>(a);
        *registry.get_component_mut::<Velocity>(a) = Velocity(2.0, -1.0);

        registry.register_system::<Movement>();
        assert_eq!(registry.system_state::<Movement>(), SystemState::Constructed);
        registry.init_system::<Movement>();
        assert_eq!(registry.system_state::<Movement>(), SystemState::Running);

        registry.update_system::<Movement>(0.5);
        registry.update_system::<Movement>(0.5);
        assert_eq!(*registry.get_component::<Position>(a), Position(2.0, -1.0));
    }

    #[test]
    fn test_init_sees_components() {
        let allocator = EntityAllocator::new();
        let mut registry = registry();
        for _ in 0..3 {
            registry.add_components::<Tag>(allocator.create());
        }

        registry.register_system::<Tagged>();
        registry.init_system::<Tagged>();
        assert_eq!(registry.system::<Tagged>().seen, 3);
        assert_eq!(registry.system_mut::<Tagged>().entities().len(), 3);
    }

    #[test]
    #[should_panic(expected = "has no")]
    fn test_union_subscription_gap_is_fatal() {
        let allocator = EntityAllocator::new();
        let mut registry = Registry::new();
        registry.register_component::<Position>();
        registry.register_component::<Velocity>();

        let a = allocator.create();
        let b = allocator.create();
        registry.add_components::<Position>(a);
        registry.add_components::<Position>(b);
        registry.add_components::<Velocity>(b);

        registry.register_system::<Movement>();
        assert_eq!(tracked::<Movement>(&registry), vec![a, b]);
        assert!(!registry.has_component::<Velocity>(a));

        registry.init_system::<Movement>();
        registry.update_system::<Movement>(1.0);
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn test_unregistered_dependency() {
        let mut registry = Registry::new();
        registry.register_component::<Position>();
        registry.register_system::<Movement>();
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_system() {
        let mut registry = registry();
        registry.register_system::<Movement>();
        registry.register_system::<Movement>();
    }

    #[test]
    #[should_panic(expected = "has not been initialized")]
    fn test_update_before_init() {
        let mut registry = registry();
        registry.register_system::<Movement>();
        registry.update_system::<Movement>(1.0);
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn test_unknown_system() {
        let registry = registry();
        registry.system::<Tagged>();
    }

    #[test]
    fn test_insert_system_with_state() {
        let allocator = EntityAllocator::new();
        let mut registry = registry();
        let a = allocator.create();
        registry.add_components::<Tag>(a);

        let mut initial = Tagged::default();
        initial.add_entity(EntityID::from_raw(500));
        let system = registry.insert_system(initial);
        assert_eq!(system.entities().len(), 2);
        assert_eq!(registry.systems().len(), 1);
    }

    #[test]
    fn test_registry_moves_across_threads() {
        let allocator = EntityAllocator::new();
        let mut registry = registry();
        let a = allocator.create();
        registry.add_components::<Tag>(a);
        registry.register_system::<Tagged>();

        let registry = std::thread::spawn(move || {
            registry.init_system::<Tagged>();
            registry
        }).join().unwrap();
        assert_eq!(registry.system::<Tagged>().seen, 1);
    }

    #[test]
    fn test_component_capacity() {
        let mut registry = Registry::with_component_capacity(128);
        registry.register_component::<Position>();
        assert!(registry.store::<Position>().capacity() >= 128);
        assert!(registry.components().is_registered::<Position>());
        assert!(!registry.components_mut().is_registered::<Velocity>());
    }
}
