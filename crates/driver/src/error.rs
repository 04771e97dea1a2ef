use std::path::PathBuf;

use liquidmetal_physics::RegistryError;
use liquidmetal_render::RenderError;

/// Errors from loading or validating a [`SceneConfig`](crate::SceneConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised while building the scene or running a frame.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("dynamic list holds {dynamic} bodies but the uniform array holds {uniforms}")]
    DynamicCountMismatch { dynamic: usize, uniforms: usize },
}
