//! Rendering Adapter: renderer-agnostic interface and the uniform model.
//!
//! # Invariants
//! - Renderer cannot mutate scene state.
//! - The uniform array length is fixed when the builder is created and must
//!   equal the shader's compiled model count.
//! - Every inverse matrix is recomputed on every rebuild; nothing is cached.

mod renderer;
mod uniforms;

pub use renderer::{DebugTextRenderer, Renderer};
pub use uniforms::{
    CameraFrame, MAX_MODELS, ModelUniform, RenderError, ShapeTag, UniformModel,
    UniformModelBuilder,
};
