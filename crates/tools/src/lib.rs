//! Developer tooling: scene inspector and debug view.
//!
//! # Invariants
//! - Inspector queries are read-only.
//! - While the debug view is on the metal surface is hidden, and vice versa.

mod debug_view;
mod inspector;

pub use debug_view::DebugView;
pub use inspector::{EntityInfo, SceneInspector, SceneSummary};
