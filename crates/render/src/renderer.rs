use std::fmt::Write;

use liquidmetal_kernel::Scene;

use crate::UniformModel;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene and the frame's uniform model and produces
/// output. It never mutates the scene; poses are owned by the physics step.
pub trait Renderer {
    type Output;

    fn render(&self, scene: &Scene, model: &UniformModel) -> Self::Output;
}

/// Text renderer for the CLI, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, model: &UniformModel) -> String {
        let mut out = String::new();
        let eye = model.camera.position;
        let _ = writeln!(out, "=== Scene (tick={}) ===", scene.tick());
        let _ = writeln!(
            out,
            "Entities: {}  Models: {}  Screen: {}",
            scene.entity_count(),
            model.len(),
            if scene.screen_visible() { "on" } else { "off" }
        );
        let _ = writeln!(out, "Camera: eye=({:.2}, {:.2}, {:.2})", eye.x, eye.y, eye.z);

        for (slot, entry) in model.models.iter().enumerate() {
            // Position as the shader sees it.
            let p = entry.inverse_world.inverse().w_axis;
            let name = scene.get(entry.entity).map_or("?", |e| e.name.as_str());
            let _ = writeln!(
                out,
                "  [{slot:>3}] {} {name} pos=({:.2}, {:.2}, {:.2})",
                entry.entity, p.x, p.y, p.z
            );
        }
        out
    }
}
