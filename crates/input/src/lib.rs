//! Pointer input: device-independent pointer events, normalized device
//! coordinates, and the raycaster that turns them into a world-space point.
//!
//! # Invariants
//! - Event handlers only overwrite the buffered pointer state; the frame
//!   reads it once at the top of the next tick.
//! - The raycaster never fails: before setup it reports the zero point.

pub mod event;
pub mod pointer;
pub mod raycaster;

pub use event::PointerEvent;
pub use pointer::{PointerState, Viewport};
pub use raycaster::PointerRaycaster;
