use crate::attraction::Attractor;
use crate::body::BodyDefaults;
use crate::registry::BodyRegistry;
use crate::world::PhysicsWorld;
use glam::Vec3;
use liquidmetal_common::EntityId;
use liquidmetal_kernel::Scene;

/// The physics side of a frame: world, registry and attraction policy.
///
/// The frame driver is the only owner; nothing else holds a mutable
/// reference to the world.
pub struct Simulation {
    world: PhysicsWorld,
    registry: BodyRegistry,
    attractor: Attractor,
    max_step: Option<f32>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(Attractor::default(), BodyDefaults::default())
    }
}

impl Simulation {
    /// Zero-gravity world with the given attraction and body defaults.
    pub fn new(attractor: Attractor, defaults: BodyDefaults) -> Self {
        Self {
            world: PhysicsWorld::new(Vec3::ZERO),
            registry: BodyRegistry::with_defaults(defaults),
            attractor,
            max_step: None,
        }
    }

    /// Clamp every step to at most `max_step` seconds.
    pub fn with_max_step(mut self, max_step: Option<f32>) -> Self {
        self.max_step = max_step;
        self
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn registry(&self) -> &BodyRegistry {
        &self.registry
    }

    pub fn attractor(&self) -> &Attractor {
        &self.attractor
    }

    /// Split borrow used during scene construction.
    pub fn parts_mut(&mut self) -> (&mut PhysicsWorld, &mut BodyRegistry) {
        (&mut self.world, &mut self.registry)
    }

    /// Step size actually handed to the solver for a frame delta.
    pub fn effective_step(&self, dt: f32) -> f32 {
        match self.max_step {
            Some(max) => dt.min(max),
            None => dt,
        }
    }

    /// Write the entity's transform into its body (kinematic input).
    pub fn push_pose(&mut self, scene: &Scene, id: EntityId) -> bool {
        self.registry.push_pose(&mut self.world, scene, id)
    }

    /// Apply the attraction impulses, then integrate one variable step.
    pub fn simulate(&mut self, dt: f32) {
        let step = self.effective_step(dt);
        self.world.set_timestep(step);
        self.attractor.apply(&mut self.world, &self.registry);
        self.world.step();
    }

    /// Copy every dynamic body's pose into its entity. Returns the count synced.
    pub fn sync(&self, scene: &mut Scene) -> usize {
        let mut synced = 0;
        for id in self.registry.dynamic().iter() {
            let Some(pose) = self.registry.pose_of(&self.world, id) else {
                continue;
            };
            if let Some(entity) = scene.get_mut(id) {
                pose.apply_to(&mut entity.transform);
                synced += 1;
            }
        }
        synced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyKind;
    use liquidmetal_common::Transform;
    use liquidmetal_kernel::Entity;

    fn one_sphere(position: Vec3) -> (Simulation, Scene, EntityId) {
        let mut scene = Scene::new();
        let id = scene.spawn(Entity::sphere("s", 0.1, Transform::from_position(position)));
        let mut sim = Simulation::default();
        let (world, registry) = sim.parts_mut();
        registry
            .register_sphere(world, &scene, id, BodyKind::Dynamic)
            .unwrap();
        registry.seal();
        (sim, scene, id)
    }

    #[test]
    fn simulate_pulls_body_inward_and_sync_copies_pose() {
        let (mut sim, mut scene, id) = one_sphere(Vec3::new(2.0, 0.0, 0.0));
        for _ in 0..3 {
            sim.simulate(1.0 / 60.0);
        }
        assert_eq!(sim.sync(&mut scene), 1);
        let x = scene.transform(id).unwrap().position.x;
        assert!(x < 2.0);
        assert_eq!(sim.world().steps(), 3);
    }

    #[test]
    fn entity_lags_until_sync() {
        let (mut sim, scene, id) = one_sphere(Vec3::new(2.0, 0.0, 0.0));
        for _ in 0..3 {
            sim.simulate(1.0 / 60.0);
        }
        assert_eq!(scene.transform(id).unwrap().position.x, 2.0);
    }

    #[test]
    fn max_step_clamps_large_deltas() {
        let sim = Simulation::default().with_max_step(Some(1.0 / 30.0));
        assert_eq!(sim.effective_step(0.5), 1.0 / 30.0);
        assert_eq!(sim.effective_step(0.01), 0.01);
        assert_eq!(Simulation::default().effective_step(0.5), 0.5);
    }

    #[test]
    fn default_world_has_no_gravity() {
        let (mut sim, mut scene, id) = one_sphere(Vec3::ZERO);
        for _ in 0..10 {
            sim.simulate(1.0 / 60.0);
        }
        sim.sync(&mut scene);
        assert!(scene.transform(id).unwrap().position.length() < 1e-5);
    }
}
