use liquidmetal_common::EntityId;
use liquidmetal_kernel::Scene;
use serde::Serialize;

/// Read-only queries against the scene for the CLI and the debug panel.
pub struct SceneInspector;

impl SceneInspector {
    pub fn summary(scene: &Scene) -> SceneSummary {
        SceneSummary {
            tick: scene.tick(),
            entity_count: scene.entity_count(),
            debug_count: scene.debug_entities().count(),
            screen_visible: scene.screen_visible(),
        }
    }

    pub fn inspect_entity(scene: &Scene, id: EntityId) -> Option<EntityInfo> {
        scene.get(id).map(|entity| {
            let t = &entity.transform;
            EntityInfo {
                id: id.0,
                name: entity.name.clone(),
                shape: entity.shape.kind_name(),
                position: t.position.to_array(),
                rotation: t.rotation.to_array(),
                scale: t.scale.to_array(),
                visible: entity.visible,
            }
        })
    }

    pub fn list_entities(scene: &Scene) -> Vec<EntityInfo> {
        scene
            .iter()
            .filter_map(|(id, _)| Self::inspect_entity(scene, id))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneSummary {
    pub tick: u64,
    pub entity_count: usize,
    pub debug_count: usize,
    pub screen_visible: bool,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: tick={} entities={} debug={} screen={}",
            self.tick,
            self.entity_count,
            self.debug_count,
            if self.screen_visible { "on" } else { "off" }
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityInfo {
    pub id: u32,
    pub name: String,
    pub shape: &'static str,
    pub position: [f32; 3],
    /// Quaternion as `[x, y, z, w]`.
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    pub visible: bool,
}

impl std::fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} ({}) pos=({:.2}, {:.2}, {:.2})",
            self.id, self.name, self.shape, self.position[0], self.position[1], self.position[2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use liquidmetal_common::Transform;
    use liquidmetal_kernel::Entity;

    #[test]
    fn summary_empty_scene() {
        let summary = SceneInspector::summary(&Scene::new());
        assert_eq!(summary.tick, 0);
        assert_eq!(summary.entity_count, 0);
        assert!(summary.screen_visible);
    }

    #[test]
    fn summary_counts_debug_entities() {
        let mut scene = Scene::new();
        scene.spawn(Entity::sphere("a", 0.1, Transform::default()).with_debug(true));
        scene.spawn(Entity::sphere("b", 0.1, Transform::default()));
        scene.advance_tick();

        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.entity_count, 2);
        assert_eq!(summary.debug_count, 1);
        assert!(format!("{summary}").contains("tick=1"));
    }

    #[test]
    fn inspect_entity_found() {
        let mut scene = Scene::new();
        let id = scene.spawn(Entity::sphere(
            "probe",
            0.1,
            Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),
        ));
        let info = SceneInspector::inspect_entity(&scene, id).unwrap();
        assert_eq!(info.position, [1.0, 2.0, 3.0]);
        assert_eq!(info.shape, "sphere");
        assert!(format!("{info}").contains("probe (sphere)"));
    }

    #[test]
    fn inspect_entity_not_found() {
        assert!(SceneInspector::inspect_entity(&Scene::new(), EntityId(3)).is_none());
    }

    #[test]
    fn list_entities_in_spawn_order() {
        let mut scene = Scene::new();
        scene.spawn(Entity::sphere("first", 0.1, Transform::default()));
        scene.spawn(Entity::sphere("second", 0.1, Transform::default()));
        let names: Vec<_> = SceneInspector::list_entities(&scene)
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, ["first", "second"]);
    }
}
