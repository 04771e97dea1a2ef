use crate::body::{BodyDefaults, BodyKind, Pose};
use crate::world::PhysicsWorld;
use glam::Vec3;
use liquidmetal_common::EntityId;
use liquidmetal_kernel::{Scene, Shape};
use rapier3d::prelude::{ColliderBuilder, Point, Real, RigidBodyHandle};

/// Errors from body registration.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("entity {0} is not in the scene")]
    UnknownEntity(EntityId),
    #[error("entity {entity} is a {found}, expected a {expected}")]
    ShapeMismatch {
        entity: EntityId,
        expected: &'static str,
        found: &'static str,
    },
    #[error("entity {0} already has a rigid body")]
    AlreadyRegistered(EntityId),
    #[error("dynamic list is sealed; cannot register dynamic entity {0}")]
    Sealed(EntityId),
}

/// Ordered dynamic entities. Index `i` is shader slot `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicList(Vec<EntityId>);

impl DynamicList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<EntityId> {
        self.0.get(slot).copied()
    }

    /// Shader slot of an entity, if it is dynamic.
    pub fn slot_of(&self, id: EntityId) -> Option<usize> {
        self.0.iter().position(|e| *e == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[EntityId] {
        &self.0
    }
}

/// Entity-to-body association.
///
/// A dense table of optional handles indexed by [`EntityId`]. The table
/// confers no ownership: the scene entity and the rapier body are freed
/// independently.
#[derive(Debug, Default)]
pub struct BodyRegistry {
    handles: Vec<Option<RigidBodyHandle>>,
    kinds: Vec<Option<BodyKind>>,
    dynamic: DynamicList,
    sealed: bool,
    defaults: BodyDefaults,
}

impl BodyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: BodyDefaults) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    pub fn defaults(&self) -> &BodyDefaults {
        &self.defaults
    }

    /// Register a sphere entity, using its radius for the collider.
    pub fn register_sphere(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &Scene,
        id: EntityId,
        kind: BodyKind,
    ) -> Result<Option<RigidBodyHandle>, RegistryError> {
        let entity = scene.get(id).ok_or(RegistryError::UnknownEntity(id))?;
        let Shape::Sphere { radius } = entity.shape else {
            return Err(mismatch(id, "sphere", &entity.shape));
        };
        let collider = ColliderBuilder::ball(radius).mass(self.defaults.sphere_mass);
        self.insert(world, id, kind, entity.transform.into(), collider)
            .map(Some)
    }

    /// Register a box entity, using its full extents for the collider.
    pub fn register_box(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &Scene,
        id: EntityId,
        kind: BodyKind,
    ) -> Result<Option<RigidBodyHandle>, RegistryError> {
        let entity = scene.get(id).ok_or(RegistryError::UnknownEntity(id))?;
        let Shape::Box {
            width,
            height,
            depth,
        } = entity.shape
        else {
            return Err(mismatch(id, "box", &entity.shape));
        };
        let collider = ColliderBuilder::cuboid(width / 2.0, height / 2.0, depth / 2.0)
            .mass(self.defaults.box_mass);
        self.insert(world, id, kind, entity.transform.into(), collider)
            .map(Some)
    }

    /// Register a convex-hull entity.
    ///
    /// A degenerate point set (fewer than four affinely independent points)
    /// yields `Ok(None)`: the entity stays in the scene without a body.
    pub fn register_convex_hull(
        &mut self,
        world: &mut PhysicsWorld,
        scene: &Scene,
        id: EntityId,
        kind: BodyKind,
    ) -> Result<Option<RigidBodyHandle>, RegistryError> {
        let entity = scene.get(id).ok_or(RegistryError::UnknownEntity(id))?;
        let Shape::ConvexHull { positions } = &entity.shape else {
            return Err(mismatch(id, "convex_hull", &entity.shape));
        };
        let points: Vec<Point<Real>> = positions
            .chunks_exact(3)
            .map(|c| Point::new(c[0], c[1], c[2]))
            .collect();
        if !spans_volume(&points) {
            tracing::warn!(%id, points = points.len(), "degenerate convex hull, skipping physics body");
            return Ok(None);
        }
        let Some(collider) = ColliderBuilder::convex_hull(&points) else {
            tracing::warn!(%id, "convex hull construction failed, skipping physics body");
            return Ok(None);
        };
        let collider = collider.mass(self.defaults.convex_hull_mass);
        self.insert(world, id, kind, entity.transform.into(), collider)
            .map(Some)
    }

    fn insert(
        &mut self,
        world: &mut PhysicsWorld,
        id: EntityId,
        kind: BodyKind,
        pose: Pose,
        collider: ColliderBuilder,
    ) -> Result<RigidBodyHandle, RegistryError> {
        if self.handle(id).is_some() {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        if kind.is_dynamic() && self.sealed {
            return Err(RegistryError::Sealed(id));
        }

        let handle = world.create_body(kind, pose, self.defaults.linear_damping);
        world.create_collider(collider, handle);

        let slot = id.index();
        if self.handles.len() <= slot {
            self.handles.resize(slot + 1, None);
            self.kinds.resize(slot + 1, None);
        }
        self.handles[slot] = Some(handle);
        self.kinds[slot] = Some(kind);
        if kind.is_dynamic() {
            self.dynamic.0.push(id);
        }
        tracing::debug!(%id, %kind, "registered rigid body");
        Ok(handle)
    }

    /// Freeze the dynamic list. Further dynamic registrations fail.
    pub fn seal(&mut self) -> &DynamicList {
        if !self.sealed {
            self.sealed = true;
            tracing::info!(count = self.dynamic.len(), "dynamic list sealed");
        }
        &self.dynamic
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn dynamic(&self) -> &DynamicList {
        &self.dynamic
    }

    pub fn handle(&self, id: EntityId) -> Option<RigidBodyHandle> {
        self.handles.get(id.index()).copied().flatten()
    }

    pub fn kind(&self, id: EntityId) -> Option<BodyKind> {
        self.kinds.get(id.index()).copied().flatten()
    }

    pub fn registered_count(&self) -> usize {
        self.handles.iter().filter(|h| h.is_some()).count()
    }

    pub fn count_of(&self, kind: BodyKind) -> usize {
        self.kinds.iter().filter(|k| **k == Some(kind)).count()
    }

    /// Current pose of the entity's body, or `None` when it has none.
    pub fn pose_of(&self, world: &PhysicsWorld, id: EntityId) -> Option<Pose> {
        world.pose(self.handle(id)?)
    }

    /// Write the entity's current transform into its body.
    ///
    /// Returns `false` (and does nothing) for entities without a body.
    pub fn push_pose(&self, world: &mut PhysicsWorld, scene: &Scene, id: EntityId) -> bool {
        let (Some(handle), Some(transform)) = (self.handle(id), scene.transform(id)) else {
            return false;
        };
        world.set_pose(handle, transform.into())
    }
}

fn mismatch(entity: EntityId, expected: &'static str, found: &Shape) -> RegistryError {
    RegistryError::ShapeMismatch {
        entity,
        expected,
        found: found.kind_name(),
    }
}

/// True when the points contain four affinely independent members.
fn spans_volume(points: &[Point<Real>]) -> bool {
    const EPS: f32 = 1e-6;
    let v: Vec<Vec3> = points.iter().map(|p| Vec3::new(p.x, p.y, p.z)).collect();
    let Some(&a) = v.first() else {
        return false;
    };
    let Some(&b) = v.iter().find(|p| (**p - a).length_squared() > EPS) else {
        return false;
    };
    let Some(normal) = v
        .iter()
        .map(|p| (b - a).cross(*p - a))
        .find(|n| n.length_squared() > EPS)
    else {
        return false;
    };
    v.iter().any(|p| normal.dot(*p - a).abs() > EPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use liquidmetal_common::Transform;
    use liquidmetal_kernel::Entity;

    fn scene_with(shapes: Vec<Shape>) -> (Scene, Vec<EntityId>) {
        let mut scene = Scene::new();
        let ids = shapes
            .into_iter()
            .enumerate()
            .map(|(i, shape)| {
                let t = Transform::from_position(Vec3::new(i as f32, 0.0, 0.0));
                scene.spawn(Entity::new(format!("e{i}"), shape, t))
            })
            .collect();
        (scene, ids)
    }

    fn cube_positions() -> Vec<f32> {
        let mut out = Vec::new();
        for x in [-0.5, 0.5] {
            for y in [-0.5, 0.5] {
                for z in [-0.5, 0.5] {
                    out.extend([x, y, z]);
                }
            }
        }
        out
    }

    #[test]
    fn dynamic_list_follows_registration_order() {
        let (scene, ids) = scene_with(vec![
            Shape::Sphere { radius: 0.1 },
            Shape::Sphere { radius: 0.7 },
            Shape::Sphere { radius: 0.1 },
        ]);
        let mut world = PhysicsWorld::default();
        let mut reg = BodyRegistry::new();
        reg.register_sphere(&mut world, &scene, ids[2], BodyKind::Dynamic).unwrap();
        reg.register_sphere(&mut world, &scene, ids[1], BodyKind::Fixed).unwrap();
        reg.register_sphere(&mut world, &scene, ids[0], BodyKind::Dynamic).unwrap();

        assert_eq!(reg.dynamic().as_slice(), &[ids[2], ids[0]]);
        assert_eq!(reg.dynamic().slot_of(ids[0]), Some(1));
        assert_eq!(reg.dynamic().slot_of(ids[1]), None);
        assert_eq!(reg.count_of(BodyKind::Fixed), 1);
        assert_eq!(world.body_count(), 3);
    }

    #[test]
    fn body_starts_at_entity_pose() {
        let (scene, ids) = scene_with(vec![Shape::Sphere { radius: 0.1 }, Shape::Sphere { radius: 0.1 }]);
        let mut world = PhysicsWorld::default();
        let mut reg = BodyRegistry::new();
        reg.register_sphere(&mut world, &scene, ids[1], BodyKind::Dynamic).unwrap();
        let pose = reg.pose_of(&world, ids[1]).unwrap();
        assert_eq!(pose.position, Vec3::X);
    }

    #[test]
    fn box_registration_uses_box_shape() {
        let (scene, ids) = scene_with(vec![Shape::Box {
            width: 1.0,
            height: 2.0,
            depth: 3.0,
        }]);
        let mut world = PhysicsWorld::default();
        let mut reg = BodyRegistry::new();
        assert!(reg.register_box(&mut world, &scene, ids[0], BodyKind::Dynamic).unwrap().is_some());
        assert_eq!(world.collider_count(), 1);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let (scene, ids) = scene_with(vec![Shape::Sphere { radius: 0.1 }]);
        let mut world = PhysicsWorld::default();
        let mut reg = BodyRegistry::new();
        let err = reg.register_box(&mut world, &scene, ids[0], BodyKind::Dynamic).unwrap_err();
        assert!(matches!(err, RegistryError::ShapeMismatch { expected: "box", .. }));
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn unknown_entity_is_rejected() {
        let scene = Scene::new();
        let mut world = PhysicsWorld::default();
        let mut reg = BodyRegistry::new();
        let err = reg
            .register_sphere(&mut world, &scene, EntityId(9), BodyKind::Dynamic)
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownEntity(EntityId(9))));
    }

    #[test]
    fn double_registration_is_rejected() {
        let (scene, ids) = scene_with(vec![Shape::Sphere { radius: 0.1 }]);
        let mut world = PhysicsWorld::default();
        let mut reg = BodyRegistry::new();
        reg.register_sphere(&mut world, &scene, ids[0], BodyKind::Dynamic).unwrap();
        let err = reg
            .register_sphere(&mut world, &scene, ids[0], BodyKind::Dynamic)
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(_)));
        assert_eq!(reg.dynamic().len(), 1);
    }

    #[test]
    fn degenerate_convex_hull_is_skipped() {
        let flat = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        let (scene, ids) = scene_with(vec![
            Shape::ConvexHull { positions: flat },
            Shape::ConvexHull {
                positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            },
        ]);
        let mut world = PhysicsWorld::default();
        let mut reg = BodyRegistry::new();
        for id in &ids {
            let handle = reg
                .register_convex_hull(&mut world, &scene, *id, BodyKind::Dynamic)
                .unwrap();
            assert!(handle.is_none());
        }
        assert_eq!(world.body_count(), 0);
        assert!(reg.dynamic().is_empty());
        assert!(reg.pose_of(&world, ids[0]).is_none());
        assert_eq!(scene.entity_count(), 2);
    }

    #[test]
    fn convex_hull_of_cube_registers() {
        let (scene, ids) = scene_with(vec![Shape::ConvexHull {
            positions: cube_positions(),
        }]);
        let mut world = PhysicsWorld::default();
        let mut reg = BodyRegistry::new();
        let handle = reg
            .register_convex_hull(&mut world, &scene, ids[0], BodyKind::Dynamic)
            .unwrap();
        assert!(handle.is_some());
        assert_eq!(reg.dynamic().len(), 1);
    }

    #[test]
    fn unregistered_pose_access_is_empty() {
        let (mut scene, ids) = scene_with(vec![Shape::Sphere { radius: 0.1 }]);
        let mut world = PhysicsWorld::default();
        let reg = BodyRegistry::new();
        assert!(reg.pose_of(&world, ids[0]).is_none());
        scene.set_transform(ids[0], Transform::from_position(Vec3::Y));
        assert!(!reg.push_pose(&mut world, &scene, ids[0]));
    }

    #[test]
    fn push_pose_moves_body() {
        let (mut scene, ids) = scene_with(vec![Shape::Sphere { radius: 0.1 }]);
        let mut world = PhysicsWorld::default();
        let mut reg = BodyRegistry::new();
        reg.register_sphere(&mut world, &scene, ids[0], BodyKind::Fixed).unwrap();
        scene.set_transform(ids[0], Transform::from_position(Vec3::new(0.0, 4.0, 0.0)));
        assert!(reg.push_pose(&mut world, &scene, ids[0]));
        assert_eq!(reg.pose_of(&world, ids[0]).unwrap().position, Vec3::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn sealed_list_rejects_dynamic_but_not_fixed() {
        let (scene, ids) = scene_with(vec![
            Shape::Sphere { radius: 0.1 },
            Shape::Sphere { radius: 0.1 },
            Shape::Sphere { radius: 0.1 },
        ]);
        let mut world = PhysicsWorld::default();
        let mut reg = BodyRegistry::new();
        reg.register_sphere(&mut world, &scene, ids[0], BodyKind::Dynamic).unwrap();
        assert_eq!(reg.seal().len(), 1);
        let err = reg
            .register_sphere(&mut world, &scene, ids[1], BodyKind::Dynamic)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Sealed(_)));
        assert!(reg
            .register_sphere(&mut world, &scene, ids[2], BodyKind::Fixed)
            .unwrap()
            .is_some());
        assert_eq!(reg.dynamic().len(), 1);
    }

    #[test]
    fn spans_volume_detects_coplanar_sets() {
        let pts = |v: &[[f32; 3]]| v.iter().map(|p| Point::new(p[0], p[1], p[2])).collect::<Vec<_>>();
        assert!(!spans_volume(&pts(&[])));
        assert!(!spans_volume(&pts(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]])));
        assert!(!spans_volume(&pts(&[[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]])));
        assert!(spans_volume(&pts(&[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])));
    }
}
