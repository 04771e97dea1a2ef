use liquidmetal_kernel::Scene;

/// Toggles between the ray-marched surface and the debug geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugView {
    enabled: bool,
}

impl DebugView {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Apply `enabled` to the scene: every debug entity's visibility becomes
    /// `enabled` and the screen surface's becomes `!enabled`.
    pub fn set(&mut self, scene: &mut Scene, enabled: bool) {
        self.enabled = enabled;
        let mut toggled = 0usize;
        for entity in scene.debug_entities_mut() {
            entity.visible = enabled;
            toggled += 1;
        }
        scene.set_screen_visible(!enabled);
        tracing::info!(enabled, debug_entities = toggled, "debug view toggled");
    }

    pub fn toggle(&mut self, scene: &mut Scene) {
        self.set(scene, !self.enabled);
    }
}
