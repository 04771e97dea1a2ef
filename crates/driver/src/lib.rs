//! Frame driver: builds the scene from configuration and runs the per-frame
//! pipeline `Input → Simulate → Sync → BuildUniforms → Present`.
//!
//! # Invariants
//! - All bodies are registered before the first tick; the dynamic list is
//!   sealed and the uniform array sized from it.
//! - Before the first tick the uniform capacity, the dynamic list length and
//!   the presenter's shader model count must all agree.
//! - Stages run strictly in order; inverses are never rebuilt before pose sync.

mod config;
mod error;
mod pipeline;
mod scene;

pub use config::SceneConfig;
pub use error::{ConfigError, DriverError};
pub use pipeline::{FrameDriver, Presenter, Stage};
pub use scene::{SceneHandles, build_scene};
