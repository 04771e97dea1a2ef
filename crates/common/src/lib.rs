//! Shared types used by every liquidmetal crate.

mod camera;
mod types;

pub use camera::Camera;
pub use types::{EntityId, Transform};
