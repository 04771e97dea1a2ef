use crate::body::{BodyKind, Pose};
use glam::{Quat, Vec3};
use rapier3d::na;
use rapier3d::prelude::*;

/// The rigid-body stepping service.
///
/// Owns every rapier set and pipeline object. Callers only see
/// [`RigidBodyHandle`]s and glam types.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    steps: u64,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl PhysicsWorld {
    /// Create an empty world with the given gravity.
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            steps: 0,
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Number of completed `step` calls.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Create a rigid body at `pose`. Angular damping is left at zero.
    pub fn create_body(&mut self, kind: BodyKind, pose: Pose, linear_damping: f32) -> RigidBodyHandle {
        let builder = match kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_position_based(),
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
        };
        let body = builder
            .position(to_isometry(pose))
            .linear_damping(linear_damping)
            .build();
        self.bodies.insert(body)
    }

    /// Attach a collider to an existing body.
    pub fn create_collider(&mut self, collider: impl Into<Collider>, parent: RigidBodyHandle) -> ColliderHandle {
        self.colliders
            .insert_with_parent(collider, parent, &mut self.bodies)
    }

    pub fn timestep(&self) -> f32 {
        self.integration_parameters.dt
    }

    pub fn set_timestep(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
    }

    /// Advance the world by the current timestep.
    ///
    /// A non-positive or non-finite timestep leaves the world untouched.
    pub fn step(&mut self) {
        let dt = self.integration_parameters.dt;
        if !(dt > 0.0 && dt.is_finite()) {
            return;
        }
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
        self.steps += 1;
    }

    pub fn translation(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| from_vector(b.translation()))
    }

    pub fn rotation(&self, handle: RigidBodyHandle) -> Option<Quat> {
        self.bodies.get(handle).map(|b| from_rotation(b.rotation()))
    }

    pub fn pose(&self, handle: RigidBodyHandle) -> Option<Pose> {
        self.bodies.get(handle).map(|b| Pose {
            position: from_vector(b.translation()),
            rotation: from_rotation(b.rotation()),
        })
    }

    pub fn linear_velocity(&self, handle: RigidBodyHandle) -> Option<Vec3> {
        self.bodies.get(handle).map(|b| from_vector(b.linvel()))
    }

    /// Write a pose into a body. Kinematic bodies receive it as their next
    /// target so the solver derives a velocity for contacts.
    pub fn set_pose(&mut self, handle: RigidBodyHandle, pose: Pose) -> bool {
        let Some(body) = self.bodies.get_mut(handle) else {
            return false;
        };
        let iso = to_isometry(pose);
        if body.is_kinematic() {
            body.set_next_kinematic_position(iso);
        } else {
            body.set_position(iso, true);
        }
        true
    }

    /// Apply an instantaneous linear impulse and wake the body.
    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec3) -> bool {
        match self.bodies.get_mut(handle) {
            Some(body) => {
                body.apply_impulse(to_vector(impulse), true);
                true
            }
            None => false,
        }
    }
}

pub(crate) fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

pub(crate) fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_rotation(q: Quat) -> Rotation<Real> {
    na::UnitQuaternion::new_normalize(na::Quaternion::new(q.w, q.x, q.y, q.z))
}

fn from_rotation(r: &Rotation<Real>) -> Quat {
    let q = r.into_inner();
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

fn to_isometry(pose: Pose) -> Isometry<Real> {
    let p = pose.position;
    Isometry::from_parts(na::Translation3::new(p.x, p.y, p.z), to_rotation(pose.rotation))
}
