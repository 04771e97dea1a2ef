use crate::registry::BodyRegistry;
use crate::world::PhysicsWorld;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Pulls every dynamic body toward a fixed point.
///
/// Each step a body at `p` receives the impulse `(center - p) * gain`. The
/// impulse is not scaled by the timestep, so the pull per second grows with
/// the frame rate. Linear damping on every body keeps the orbit bounded for
/// the default gain; large gains with little damping can still diverge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attractor {
    pub center: Vec3,
    pub gain: f32,
}

impl Default for Attractor {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            gain: 5.0,
        }
    }
}

impl Attractor {
    pub fn new(center: Vec3, gain: f32) -> Self {
        Self { center, gain }
    }

    /// Impulse for a body currently at `position`.
    pub fn impulse_at(&self, position: Vec3) -> Vec3 {
        (self.center - position) * self.gain
    }

    /// Apply one impulse to every dynamic body. Returns how many were pushed.
    pub fn apply(&self, world: &mut PhysicsWorld, registry: &BodyRegistry) -> usize {
        let mut applied = 0;
        for id in registry.dynamic().iter() {
            let Some(handle) = registry.handle(id) else {
                continue;
            };
            let Some(position) = world.translation(handle) else {
                continue;
            };
            if world.apply_impulse(handle, self.impulse_at(position)) {
                applied += 1;
            }
        }
        applied
    }
}
