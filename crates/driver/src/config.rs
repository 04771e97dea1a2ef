use std::path::Path;

use liquidmetal_physics::{Attractor, BodyDefaults};
use liquidmetal_render::MAX_MODELS;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Scene parameters. Every field has a default, so an empty YAML document
/// yields the stock scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneConfig {
    /// Seed for the dynamic sphere scatter.
    pub seed: u64,
    pub sphere_count: usize,
    pub sphere_radius: f32,
    /// Half extents of the box the dynamic spheres are scattered in.
    pub scatter: [f32; 3],
    /// Spawn positions closer than this to the attractor center are redrawn.
    pub min_spawn_distance: f32,
    pub center_radius: f32,
    pub cursor_radius: f32,
    pub attractor: Attractor,
    pub bodies: BodyDefaults,
    pub camera_distance: f32,
    pub camera_fov_degrees: f32,
    /// Upper bound on a single physics step in seconds. `None` hands the raw
    /// frame delta to the solver.
    pub max_step: Option<f32>,
    /// Start with the debug view on.
    pub debug: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            sphere_count: 20,
            sphere_radius: 0.1,
            scatter: [3.0, 3.0, 2.0],
            min_spawn_distance: 0.0,
            center_radius: 0.7,
            cursor_radius: 0.6,
            attractor: Attractor::default(),
            bodies: BodyDefaults::default(),
            camera_distance: 3.0,
            camera_fov_degrees: 50.0,
            max_step: None,
            debug: false,
        }
    }
}

impl SceneConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = if source.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(source)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&source)?;
        tracing::info!(path = %path.display(), "scene config loaded");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if self.sphere_count > MAX_MODELS {
            return invalid(format!(
                "sphere_count {} exceeds the shader limit of {MAX_MODELS}",
                self.sphere_count
            ));
        }
        for (name, value) in [
            ("sphere_radius", self.sphere_radius),
            ("center_radius", self.center_radius),
            ("cursor_radius", self.cursor_radius),
            ("camera_distance", self.camera_distance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return invalid(format!("{name} must be positive, got {value}"));
            }
        }
        if !(self.camera_fov_degrees > 0.0 && self.camera_fov_degrees < 180.0) {
            return invalid(format!(
                "camera_fov_degrees must be in (0, 180), got {}",
                self.camera_fov_degrees
            ));
        }
        if self.scatter.iter().any(|e| !(e.is_finite() && *e >= 0.0)) {
            return invalid(format!("scatter extents must be non-negative, got {:?}", self.scatter));
        }
        let reach = glam::Vec3::from_array(self.scatter).length();
        if self.min_spawn_distance < 0.0 || (self.sphere_count > 0 && self.min_spawn_distance >= reach) {
            return invalid(format!(
                "min_spawn_distance {} must be in [0, {reach:.2})",
                self.min_spawn_distance
            ));
        }
        if !self.attractor.gain.is_finite() || !self.attractor.center.is_finite() {
            return invalid("attractor must be finite".into());
        }
        if self.bodies.linear_damping < 0.0 {
            return invalid(format!(
                "linear_damping must be non-negative, got {}",
                self.bodies.linear_damping
            ));
        }
        if self.max_step.is_some_and(|max| max.is_nan() || max <= 0.0) {
            return invalid(format!("max_step must be positive, got {:?}", self.max_step));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(SceneConfig::from_yaml_str("").unwrap(), SceneConfig::default());
    }

    #[test]
    fn defaults() {
        let c = SceneConfig::default();
        assert_eq!(c.sphere_count, 20);
        assert_eq!(c.sphere_radius, 0.1);
        assert_eq!(c.center_radius, 0.7);
        assert_eq!(c.cursor_radius, 0.6);
        assert_eq!(c.attractor.gain, 5.0);
        assert_eq!(c.bodies.linear_damping, 0.3);
        assert_eq!(c.camera_distance, 3.0);
        assert!(c.max_step.is_none());
        assert!(!c.debug);
    }

    #[test]
    fn partial_yaml_overrides_fields() {
        let c = SceneConfig::from_yaml_str(
            "sphere_count: 8\nattractor:\n  center: [1.0, 0.0, 0.0]\nmax_step: 0.05\ndebug: true\n",
        )
        .unwrap();
        assert_eq!(c.sphere_count, 8);
        assert_eq!(c.attractor.center, Vec3::X);
        assert_eq!(c.attractor.gain, 5.0);
        assert_eq!(c.max_step, Some(0.05));
        assert!(c.debug);
        assert_eq!(c.seed, 42);
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(matches!(
            SceneConfig::from_yaml_str("spheres: 3\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn too_many_spheres_is_invalid() {
        let yaml = format!("sphere_count: {}\n", MAX_MODELS + 1);
        assert!(matches!(
            SceneConfig::from_yaml_str(&yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn non_positive_radius_is_invalid() {
        assert!(matches!(
            SceneConfig::from_yaml_str("sphere_radius: 0.0\n"),
            Err(ConfigError::Invalid(msg)) if msg.contains("sphere_radius")
        ));
    }

    #[test]
    fn unreachable_spawn_distance_is_invalid() {
        assert!(SceneConfig::from_yaml_str("min_spawn_distance: 10.0\n").is_err());
        assert!(SceneConfig::from_yaml_str("min_spawn_distance: 1.5\n").is_ok());
    }

    #[test]
    fn yaml_round_trip() {
        let c = SceneConfig {
            seed: 7,
            debug: true,
            ..SceneConfig::default()
        };
        let back = SceneConfig::from_yaml_str(&c.to_yaml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "seed: 9").unwrap();
        assert_eq!(SceneConfig::load(tmp.path()).unwrap().seed, 9);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SceneConfig::load(dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
