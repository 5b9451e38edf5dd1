//! Trellis scene-graph engine
//!
//! A node tree of 3D objects and pixel-exact GUI frames, persisted in a compact
//! text format and rendered through wgpu and winit.

pub mod app;
pub mod error;
pub mod format;
pub mod gfx;
pub mod input;
pub mod prelude;
pub mod ui;

// Re-export main types for convenience
pub use app::{AppConfig, TrellisApp};
pub use error::{ResourceError, SceneError, TreeError};
