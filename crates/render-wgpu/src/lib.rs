//! wgpu render backend for the liquid-metal scene.
//!
//! Draws a full-screen ray-marched smooth union of the dynamic spheres,
//! reflecting an environment cubemap, and an optional pass of instanced
//! wire spheres for debug entities.
//!
//! # Invariants
//! - Renderer never mutates scene state.
//! - The model count is baked into the shader when the pipeline is built;
//!   frames with a different count are rejected.

mod environment;
mod gpu;
mod shaders;

pub use gpu::{RendererSettings, WgpuRenderer};
pub use shaders::{RAYMARCH_TEMPLATE, raymarch_source};
