use glam::{Quat, Vec3};
use liquidmetal_common::Transform;
use serde::{Deserialize, Serialize};

/// How a rigid body is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    /// Integrated by the solver and fed to the shader array.
    Dynamic,
    /// Pose written from input every frame.
    Kinematic,
    /// Immovable collider.
    Fixed,
}

impl BodyKind {
    pub fn is_dynamic(self) -> bool {
        matches!(self, BodyKind::Dynamic)
    }
}

impl std::fmt::Display for BodyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BodyKind::Dynamic => "dynamic",
            BodyKind::Kinematic => "kinematic",
            BodyKind::Fixed => "fixed",
        })
    }
}

/// Per-shape body parameters applied at registration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDefaults {
    pub sphere_mass: f32,
    pub box_mass: f32,
    pub convex_hull_mass: f32,
    pub linear_damping: f32,
}

impl Default for BodyDefaults {
    fn default() -> Self {
        Self {
            sphere_mass: 1.0,
            box_mass: 10.0,
            convex_hull_mass: 1.0,
            linear_damping: 0.3,
        }
    }
}

/// Position and orientation of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    /// Apply this pose to a transform, keeping its scale.
    pub fn apply_to(self, transform: &mut Transform) {
        transform.position = self.position;
        transform.rotation = self.rotation;
    }
}

impl From<Transform> for Pose {
    fn from(t: Transform) -> Self {
        Self {
            position: t.position,
            rotation: t.rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_authoring_constants() {
        let d = BodyDefaults::default();
        assert_eq!(d.sphere_mass, 1.0);
        assert_eq!(d.box_mass, 10.0);
        assert_eq!(d.convex_hull_mass, 1.0);
        assert_eq!(d.linear_damping, 0.3);
    }

    #[test]
    fn pose_apply_keeps_scale() {
        let mut t = Transform {
            scale: Vec3::splat(2.0),
            ..Transform::default()
        };
        Pose {
            position: Vec3::X,
            rotation: Quat::from_rotation_z(1.0),
        }
        .apply_to(&mut t);
        assert_eq!(t.position, Vec3::X);
        assert_eq!(t.scale, Vec3::splat(2.0));
    }

    #[test]
    fn only_dynamic_is_dynamic() {
        assert!(BodyKind::Dynamic.is_dynamic());
        assert!(!BodyKind::Kinematic.is_dynamic());
        assert!(!BodyKind::Fixed.is_dynamic());
    }
}
