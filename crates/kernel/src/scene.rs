use liquidmetal_common::{EntityId, Transform};
use serde::{Deserialize, Serialize};

/// Geometry parameters carried by an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f32 },
    Box { width: f32, height: f32, depth: f32 },
    /// Flat `[x, y, z, x, y, z, ...]` vertex positions in object space.
    ConvexHull { positions: Vec<f32> },
}

impl Shape {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Sphere { .. } => "sphere",
            Shape::Box { .. } => "box",
            Shape::ConvexHull { .. } => "convex_hull",
        }
    }
}

/// A renderable object owned by the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub shape: Shape,
    pub transform: Transform,
    pub visible: bool,
    /// Debug entities are only drawn while the debug view is on.
    pub debug: bool,
}

impl Entity {
    pub fn new(name: impl Into<String>, shape: Shape, transform: Transform) -> Self {
        Self {
            name: name.into(),
            shape,
            transform,
            visible: true,
            debug: false,
        }
    }

    pub fn sphere(name: impl Into<String>, radius: f32, transform: Transform) -> Self {
        Self::new(name, Shape::Sphere { radius }, transform)
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// The scene: every entity plus the ray-marched screen surface state.
///
/// Entities live in a dense `Vec` indexed by [`EntityId`]; there is no
/// despawn, so ids stay valid for the lifetime of the scene.
#[derive(Debug, Clone)]
pub struct Scene {
    entities: Vec<Entity>,
    tick: u64,
    screen_visible: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            tick: 0,
            screen_visible: true,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames presented so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Add an entity and return its slot.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len() as u32);
        tracing::debug!(%id, name = %entity.name, shape = entity.shape.kind_name(), "spawned entity");
        self.entities.push(entity);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.index())
    }

    /// Iterate entities in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(i as u32), e))
    }

    pub fn transform(&self, id: EntityId) -> Option<Transform> {
        self.get(id).map(|e| e.transform)
    }

    /// Overwrite an entity's transform. Returns `false` for unknown ids.
    pub fn set_transform(&mut self, id: EntityId, transform: Transform) -> bool {
        match self.entities.get_mut(id.index()) {
            Some(entity) => {
                entity.transform = transform;
                true
            }
            None => false,
        }
    }

    /// Whether the full-screen ray-marched surface is drawn.
    pub fn screen_visible(&self) -> bool {
        self.screen_visible
    }

    pub fn set_screen_visible(&mut self, visible: bool) {
        self.screen_visible = visible;
    }

    pub fn debug_entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.iter().filter(|(_, e)| e.debug)
    }

    pub fn debug_entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut().filter(|e| e.debug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn scene_starts_empty() {
        let s = Scene::new();
        assert_eq!(s.tick(), 0);
        assert_eq!(s.entity_count(), 0);
        assert!(s.screen_visible());
    }

    #[test]
    fn spawn_assigns_dense_ids() {
        let mut s = Scene::new();
        let a = s.spawn(Entity::sphere("a", 0.1, Transform::default()));
        let b = s.spawn(Entity::sphere("b", 0.1, Transform::default()));
        assert_eq!(a, EntityId(0));
        assert_eq!(b, EntityId(1));
        assert_eq!(s.get(b).unwrap().name, "b");
    }

    #[test]
    fn set_transform_updates_entity() {
        let mut s = Scene::new();
        let id = s.spawn(Entity::sphere("a", 0.1, Transform::default()));
        let moved = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        assert!(s.set_transform(id, moved));
        assert_eq!(s.transform(id), Some(moved));
    }

    #[test]
    fn set_transform_unknown_id_is_rejected() {
        let mut s = Scene::new();
        assert!(!s.set_transform(EntityId(4), Transform::default()));
    }

    #[test]
    fn debug_filter_only_yields_flagged_entities() {
        let mut s = Scene::new();
        s.spawn(Entity::sphere("a", 0.1, Transform::default()).with_debug(true));
        s.spawn(Entity::sphere("b", 0.1, Transform::default()));
        assert_eq!(s.debug_entities().count(), 1);
    }

    #[test]
    fn tick_advances() {
        let mut s = Scene::new();
        s.advance_tick();
        s.advance_tick();
        assert_eq!(s.tick(), 2);
    }
}
