//! Asset loading for the liquid-metal scene.
//!
//! Assets are loaded once at startup, before any entity or physics body
//! exists. Any failure here aborts startup.

mod cubemap;
mod shader;

use std::path::PathBuf;

pub use cubemap::{Cubemap, FACE_NAMES};
pub use shader::load_shader_source;

/// Errors from asset loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cubemap face {path} is {width}x{height}, faces must be square")]
    NonSquareFace {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    #[error("cubemap face {path} is {found}px, expected {expected}px like the first face")]
    FaceSizeMismatch {
        path: PathBuf,
        expected: u32,
        found: u32,
    },
    #[error("shader source {0} is empty")]
    EmptyShader(PathBuf),
}
