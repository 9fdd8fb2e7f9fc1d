use log::info;

use packed::{
    component,
    Components,
    EntityAllocator,
    EntityID,
    Registry,
    System,
    SystemBase,
};

const TIME_STEP: f64 = 1.0 / 60.0;
const NUM_FRAMES: usize = 120;
const GRAVITY: f32 = -9.8;

#[derive(Debug, Clone, Copy, Default)]
pub struct Position(f32, f32);
component!(Position);

#[derive(Debug, Clone, Copy, Default)]
pub struct Velocity(f32, f32);
component!(Velocity);

#[derive(Debug, Clone, Copy, Default)]
pub struct Lifetime(f32);
component!(Lifetime);

/// Integrates velocity into position.
#[derive(Default)]
struct ApplyVelocity {
    base: SystemBase<(Position, Velocity)>,
}

impl System for ApplyVelocity {
    type Dependencies = (Position, Velocity);

    fn base(&self) -> &SystemBase<(Position, Velocity)> { &self.base }

    fn base_mut(&mut self) -> &mut SystemBase<(Position, Velocity)> { &mut self.base }

    fn update(&mut self, components: &mut Components, dt: f64) {
        let dt = dt as f32;

        for &entity in self.base.iter() {
            // Subscription is a union, so skip anything missing a velocity.
            let Velocity(vx, vy) = match components.try_get_component::<Velocity>(entity) {
                Ok(velocity) => *velocity,
                Err(_) => continue,
            };

            let Position(x, y) = components.get_component_mut::<Position>(entity);
            *x += vx * dt;
            *y += vy * dt;
        }
    }
}

/// Pulls everything with a velocity downwards.
#[derive(Default)]
struct ApplyGravity {
    base: SystemBase<Velocity>,
}

impl System for ApplyGravity {
    type Dependencies = Velocity;

    fn base(&self) -> &SystemBase<Velocity> { &self.base }

    fn base_mut(&mut self) -> &mut SystemBase<Velocity> { &mut self.base }

    fn update(&mut self, components: &mut Components, dt: f64) {
        for &entity in self.base.iter() {
            components.get_component_mut::<Velocity>(entity).1 += GRAVITY * dt as f32;
        }
    }
}

/// Counts down lifetimes and reports which entities have expired.
#[derive(Default)]
struct Expire {
    base: SystemBase<Lifetime>,
    expired: Vec<EntityID>,
}

impl System for Expire {
    type Dependencies = Lifetime;

    fn base(&self) -> &SystemBase<Lifetime> { &self.base }

    fn base_mut(&mut self) -> &mut SystemBase<Lifetime> { &mut self.base }

    fn update(&mut self, components: &mut Components, dt: f64) {
        for &entity in self.base.iter() {
            let Lifetime(remaining) = components.get_component_mut::<Lifetime>(entity);
            *remaining -= dt as f32;

            if *remaining <= 0.0 {
                self.expired.push(entity);
            }
        }
    }
}

fn main() {
    env_logger::init();

    let allocator = EntityAllocator::new();
    let mut registry = Registry::with_component_capacity(64);
    registry.register_component::<Position>();
    registry.register_component::<Velocity>();
    registry.register_component::<Lifetime>();

    // Populate the registry before registering systems: subscriptions are
    // taken once, at registration.
    for idx in 0..8 {
        let entity = allocator.create();
        registry.add_components::<(Position, Velocity, Lifetime)>(entity);

        let angle = (idx as f32) * std::f32::consts::PI / 8.0;
        *registry.get_component_mut::<Velocity>(entity) = Velocity(angle.cos() * 5.0, angle.sin() * 5.0);
        *registry.get_component_mut::<Lifetime>(entity) = Lifetime(0.25 * (idx + 1) as f32);
    }

    // A static marker, tracked by `ApplyVelocity` through its position only.
    let marker = allocator.create();
    registry.insert_component(marker, Position(0.0, 10.0));

    registry.register_system::<ApplyGravity>();
    registry.register_system::<ApplyVelocity>();
    registry.register_system::<Expire>();

    registry.init_system::<ApplyGravity>();
    registry.init_system::<ApplyVelocity>();
    registry.init_system::<Expire>();

    for frame in 0..NUM_FRAMES {
        registry.update_system::<ApplyGravity>(TIME_STEP);
        registry.update_system::<ApplyVelocity>(TIME_STEP);
        registry.update_system::<Expire>(TIME_STEP);

        let expired = std::mem::take(&mut registry.system_mut::<Expire>().expired);
        for entity in expired {
            let Position(x, y) = *registry.get_component::<Position>(entity);
            info!("frame {}: {:?} expired at ({:.2}, {:.2})", frame, entity, x, y);
            registry.clear_entity(entity);
        }
    }

    let positions = registry.store::<Position>();
    println!("{} entities remain after {} frames", positions.len(), NUM_FRAMES);
    for (entity, Position(x, y)) in positions.iter() {
        println!("{:?}: ({:.2}, {:.2})", entity, x, y);
    }
}
