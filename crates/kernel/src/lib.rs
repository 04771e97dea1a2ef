//! Scene Kernel: the renderable entities and their per-frame transforms.
//!
//! # Invariants
//! - Entities are spawned during scene construction and never destroyed.
//! - `EntityId`s are dense and assigned in spawn order.
//! - The tick counter advances once per presented frame.

pub mod scene;

pub use scene::{Entity, Scene, Shape};
