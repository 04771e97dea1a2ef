use crate::event::PointerEvent;
use glam::Vec2;

/// Size of the drawable area in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        }
    }

    /// Map a pixel position to device coordinates in [-1, 1], y up.
    pub fn normalize(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            position.x / self.width * 2.0 - 1.0,
            -(position.y / self.height) * 2.0 + 1.0,
        )
    }
}

/// Last known pointer position in normalized device coordinates.
///
/// With several fingers down only the first one to touch is followed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    ndc: Vec2,
    primary_touch: Option<u64>,
}

impl PointerState {
    pub fn ndc(&self) -> Vec2 {
        self.ndc
    }

    pub fn primary_touch(&self) -> Option<u64> {
        self.primary_touch
    }

    /// Fold one event into the state. Returns `true` if the position changed.
    pub fn handle(&mut self, event: PointerEvent, viewport: &Viewport) -> bool {
        match event {
            PointerEvent::Moved(position) => {
                self.ndc = viewport.normalize(position);
                true
            }
            PointerEvent::TouchStarted { id, position } => {
                if self.primary_touch.is_none() {
                    self.primary_touch = Some(id);
                    self.ndc = viewport.normalize(position);
                    return true;
                }
                false
            }
            PointerEvent::TouchMoved { id, position } => {
                let primary = *self.primary_touch.get_or_insert(id);
                if primary != id {
                    return false;
                }
                self.ndc = viewport.normalize(position);
                true
            }
            PointerEvent::TouchEnded { id } => {
                if self.primary_touch == Some(id) {
                    self.primary_touch = None;
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_center_is_origin() {
        let vp = Viewport::new(800, 600);
        assert_eq!(vp.normalize(Vec2::new(400.0, 300.0)), Vec2::ZERO);
    }

    #[test]
    fn corners_map_to_unit_square() {
        let vp = Viewport::new(800, 600);
        assert_eq!(vp.normalize(Vec2::ZERO), Vec2::new(-1.0, 1.0));
        assert_eq!(vp.normalize(Vec2::new(800.0, 600.0)), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn mouse_move_updates_ndc() {
        let vp = Viewport::new(100, 100);
        let mut p = PointerState::default();
        assert!(p.handle(PointerEvent::Moved(Vec2::new(75.0, 25.0)), &vp));
        assert_eq!(p.ndc(), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn only_first_touch_is_followed() {
        let vp = Viewport::new(100, 100);
        let mut p = PointerState::default();
        p.handle(
            PointerEvent::TouchStarted {
                id: 1,
                position: Vec2::new(50.0, 50.0),
            },
            &vp,
        );
        p.handle(
            PointerEvent::TouchStarted {
                id: 2,
                position: Vec2::new(0.0, 0.0),
            },
            &vp,
        );
        assert!(!p.handle(
            PointerEvent::TouchMoved {
                id: 2,
                position: Vec2::new(100.0, 100.0),
            },
            &vp,
        ));
        assert_eq!(p.ndc(), Vec2::ZERO);

        assert!(p.handle(
            PointerEvent::TouchMoved {
                id: 1,
                position: Vec2::new(100.0, 0.0),
            },
            &vp,
        ));
        assert_eq!(p.ndc(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn lifting_primary_frees_the_slot() {
        let vp = Viewport::new(100, 100);
        let mut p = PointerState::default();
        p.handle(
            PointerEvent::TouchStarted {
                id: 1,
                position: Vec2::ZERO,
            },
            &vp,
        );
        p.handle(PointerEvent::TouchEnded { id: 1 }, &vp);
        assert_eq!(p.primary_touch(), None);
        p.handle(
            PointerEvent::TouchMoved {
                id: 7,
                position: Vec2::new(50.0, 50.0),
            },
            &vp,
        );
        assert_eq!(p.primary_touch(), Some(7));
    }

    #[test]
    fn zero_sized_viewport_does_not_divide_by_zero() {
        let vp = Viewport::new(0, 0);
        assert!(vp.normalize(Vec2::new(0.5, 0.5)).is_finite());
    }
}
