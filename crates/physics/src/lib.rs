//! Physics: rigid bodies behind the scene entities.
//!
//! Wraps a rapier3d world as an opaque stepping service, maps scene entities
//! to rigid-body handles, and pulls every dynamic body toward an attractor.
//!
//! # Invariants
//! - Only `Dynamic` bodies enter the [`DynamicList`], in registration order.
//! - Once sealed, the dynamic list never grows, shrinks or reorders.
//! - The physics world is mutated only through [`Simulation`] and the registry.

pub mod attraction;
pub mod body;
pub mod registry;
pub mod simulation;
pub mod world;

pub use attraction::Attractor;
pub use body::{BodyDefaults, BodyKind, Pose};
pub use rapier3d::prelude::RigidBodyHandle;
pub use registry::{BodyRegistry, DynamicList, RegistryError};
pub use simulation::Simulation;
pub use world::PhysicsWorld;
