use glam::Vec2;

/// A pointer event in window pixel coordinates.
///
/// The windowing layer translates its native events into these; nothing in
/// this crate depends on a particular windowing library.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Mouse cursor moved.
    Moved(Vec2),
    /// A finger touched down.
    TouchStarted { id: u64, position: Vec2 },
    /// A finger moved.
    TouchMoved { id: u64, position: Vec2 },
    /// A finger lifted or the touch was cancelled.
    TouchEnded { id: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_copyable_values() {
        let e = PointerEvent::TouchMoved {
            id: 3,
            position: Vec2::new(1.0, 2.0),
        };
        let copy = e;
        assert_eq!(e, copy);
        assert!(matches!(PointerEvent::TouchEnded { id: 3 }, PointerEvent::TouchEnded { .. }));
    }
}
