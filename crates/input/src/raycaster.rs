use crate::event::PointerEvent;
use crate::pointer::{PointerState, Viewport};
use glam::Vec3;
use liquidmetal_common::Camera;
use std::f32::consts::PI;

/// Turns the buffered pointer position into a world-space cursor point.
///
/// The ray leaves the camera through the pointer and is advanced by
/// `|camera| / cos(PI - angle(direction, camera))`. That lands on the plane
/// through the origin facing the camera, which keeps the cursor at roughly
/// the camera's distance instead of a fixed depth. It is a visual heuristic,
/// not an exact surface intersection.
#[derive(Debug, Clone, Default)]
pub struct PointerRaycaster {
    camera: Option<Camera>,
    viewport: Viewport,
    pointer: PointerState,
    attached: bool,
}

impl PointerRaycaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the camera and start accepting pointer events.
    pub fn setup(&mut self, camera: &Camera, viewport: Viewport) {
        self.camera = Some(*camera);
        self.viewport = viewport;
        self.attached = true;
        tracing::debug!("pointer raycaster attached");
    }

    /// Refresh the camera snapshot. Ignored before setup.
    pub fn update_camera(&mut self, camera: &Camera) {
        if let Some(current) = self.camera.as_mut() {
            *current = *camera;
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// Record a pointer event. Events arriving while detached are dropped.
    pub fn handle_event(&mut self, event: PointerEvent) -> bool {
        if !self.attached {
            return false;
        }
        self.pointer.handle(event, &self.viewport)
    }

    /// World-space cursor point, computed from the last pointer position.
    pub fn position(&self) -> Vec3 {
        let Some(camera) = &self.camera else {
            return Vec3::ZERO;
        };

        let origin = camera.world_matrix().w_axis.truncate();
        if origin.length_squared() <= f32::EPSILON {
            return origin;
        }

        let ndc = self.pointer.ndc();
        let direction = (camera.unproject(ndc.extend(0.5)) - origin).normalize_or_zero();
        let distance = origin.length() / (PI - direction.angle_between(origin)).cos();
        if !distance.is_finite() {
            return origin;
        }
        origin + direction * distance
    }

    /// Stop accepting pointer events. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.attached {
            self.attached = false;
            tracing::debug!("pointer raycaster detached");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn attached() -> (PointerRaycaster, Camera) {
        let camera = Camera::default();
        let mut r = PointerRaycaster::new();
        r.setup(&camera, Viewport::new(800, 600));
        (r, camera)
    }

    #[test]
    fn position_before_setup_is_zero() {
        let r = PointerRaycaster::new();
        assert_eq!(r.position(), Vec3::ZERO);
    }

    #[test]
    fn centered_pointer_hits_origin() {
        let (r, _) = attached();
        assert!(r.position().length() < 1e-4);
    }

    #[test]
    fn off_center_pointer_lands_on_camera_facing_plane() {
        let (mut r, camera) = attached();
        r.handle_event(PointerEvent::Moved(Vec2::new(600.0, 150.0)));
        let p = r.position();
        assert!(p.x > 0.0 && p.y > 0.0);
        assert!(p.dot(camera.position).abs() < 1e-3);
    }

    #[test]
    fn point_lies_on_the_pointer_ray() {
        let (mut r, camera) = attached();
        r.handle_event(PointerEvent::Moved(Vec2::new(100.0, 500.0)));
        let p = r.position();
        let ndc = r.pointer().ndc();
        let through = camera.unproject(ndc.extend(0.5));
        let ray = (through - camera.position).normalize();
        let to_point = (p - camera.position).normalize();
        assert!(ray.dot(to_point) > 0.9999);
    }

    #[test]
    fn dispose_stops_event_intake_and_is_idempotent() {
        let (mut r, _) = attached();
        r.dispose();
        r.dispose();
        assert!(!r.is_attached());
        assert!(!r.handle_event(PointerEvent::Moved(Vec2::ZERO)));
        assert_eq!(r.pointer().ndc(), Vec2::ZERO);
    }

    #[test]
    fn position_holds_last_pointer_after_dispose() {
        let (mut r, _) = attached();
        r.handle_event(PointerEvent::Moved(Vec2::new(600.0, 150.0)));
        let before = r.position();
        r.dispose();
        r.handle_event(PointerEvent::Moved(Vec2::new(10.0, 10.0)));
        assert_eq!(r.position(), before);
        assert!(before.x > 0.0);
    }

    #[test]
    fn events_before_setup_are_dropped() {
        let mut r = PointerRaycaster::new();
        assert!(!r.handle_event(PointerEvent::Moved(Vec2::new(10.0, 10.0))));
    }

    #[test]
    fn camera_update_moves_ray_origin() {
        let (mut r, mut camera) = attached();
        camera.position = Vec3::new(0.0, 0.0, 6.0);
        r.update_camera(&camera);
        r.handle_event(PointerEvent::Moved(Vec2::new(700.0, 300.0)));
        assert!(r.position().z.abs() < 1e-3);
    }
}
