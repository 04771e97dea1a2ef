use glam::{EulerRot, Quat, Vec3};
use liquidmetal_common::{Camera, EntityId, Transform};
use liquidmetal_kernel::{Entity, Scene};
use liquidmetal_physics::{BodyKind, Simulation};

use crate::{DriverError, SceneConfig};

const MAX_SPAWN_ATTEMPTS: usize = 1024;

/// Entities the frame driver needs to address directly.
#[derive(Debug, Clone)]
pub struct SceneHandles {
    /// Dynamic spheres in registration order (shader slot order).
    pub dynamic: Vec<EntityId>,
    pub center: EntityId,
    pub cursor: EntityId,
}

/// Splitmix64 stream for the deterministic scatter.
struct Scatter {
    state: u64,
}

impl Scatter {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform in `[-extent, extent)`.
    fn symmetric(&mut self, extent: f32) -> f32 {
        let unit = (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32;
        (unit * 2.0 - 1.0) * extent
    }

    fn position(&mut self, half_extents: [f32; 3]) -> Vec3 {
        Vec3::new(
            self.symmetric(half_extents[0]),
            self.symmetric(half_extents[1]),
            self.symmetric(half_extents[2]),
        )
    }

    fn orientation(&mut self) -> Quat {
        let pi = std::f32::consts::PI;
        Quat::from_euler(
            EulerRot::XYZ,
            self.symmetric(pi),
            self.symmetric(pi),
            self.symmetric(pi),
        )
    }
}

fn spawn_position(scatter: &mut Scatter, config: &SceneConfig) -> Vec3 {
    let center = config.attractor.center;
    let min = config.min_spawn_distance;
    let mut p = scatter.position(config.scatter);
    for _ in 0..MAX_SPAWN_ATTEMPTS {
        if p.distance(center) >= min {
            return p;
        }
        p = scatter.position(config.scatter);
    }
    center + (p - center).try_normalize().unwrap_or(Vec3::X) * min
}

/// Camera placed on +Z at `camera_distance`, looking at the origin.
pub(crate) fn camera_for(config: &SceneConfig) -> Camera {
    Camera {
        position: Vec3::new(0.0, 0.0, config.camera_distance),
        fov: config.camera_fov_degrees.to_radians(),
        ..Camera::default()
    }
}

/// Spawn and register every entity, then seal the dynamic list.
///
/// Order is fixed: the dynamic spheres first (their order is the shader slot
/// order), then the fixed center sphere, then the kinematic cursor.
pub fn build_scene(config: &SceneConfig) -> Result<(Scene, Simulation, SceneHandles), DriverError> {
    config.validate()?;

    let mut scene = Scene::new();
    let mut simulation =
        Simulation::new(config.attractor, config.bodies).with_max_step(config.max_step);
    let (world, registry) = simulation.parts_mut();
    let mut scatter = Scatter::new(config.seed);

    let mut dynamic = Vec::with_capacity(config.sphere_count);
    for i in 0..config.sphere_count {
        let transform = Transform {
            position: spawn_position(&mut scatter, config),
            rotation: scatter.orientation(),
            scale: Vec3::ONE,
        };
        let id = scene.spawn(
            Entity::sphere(format!("sphere_{i}"), config.sphere_radius, transform).with_debug(true),
        );
        registry.register_sphere(world, &scene, id, BodyKind::Dynamic)?;
        dynamic.push(id);
    }

    let center = scene.spawn(
        Entity::sphere("center", config.center_radius, Transform::from_position(config.attractor.center))
            .with_debug(true),
    );
    registry.register_sphere(world, &scene, center, BodyKind::Fixed)?;

    let cursor = scene.spawn(
        Entity::sphere("cursor", config.cursor_radius, Transform::default()).with_debug(true),
    );
    registry.register_sphere(world, &scene, cursor, BodyKind::Kinematic)?;

    registry.seal();

    tracing::info!(
        dynamic = registry.count_of(BodyKind::Dynamic),
        fixed = registry.count_of(BodyKind::Fixed),
        kinematic = registry.count_of(BodyKind::Kinematic),
        "scene built"
    );

    Ok((
        scene,
        simulation,
        SceneHandles {
            dynamic,
            center,
            cursor,
        },
    ))
}
