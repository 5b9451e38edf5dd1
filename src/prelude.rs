//! # Trellis Prelude
//!
//! Commonly used types in one import.
//!
//! ```no_run
//! use trellis::prelude::*;
//!
//! fn spin(tree: &mut SceneTree, id: NodeId, ctx: &mut UpdateContext) {
//!     if let Some(node) = tree.get_mut(id) {
//!         node.local.rotation.y += ctx.delta;
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut app = TrellisApp::new(AppConfig::default().with_scene("menu.scene"))?;
//!     app.register_script("spin", spin);
//!     app.run()
//! }
//! ```

// Application
pub use crate::app::{AppConfig, TrellisApp};

// Scene graph
pub use crate::gfx::scene::{
    Node, NodeId, NodeKind, Payload, Scene, SceneTree, ScriptFn, ScriptParam, ScriptRegistry,
    Transform, UpdateContext, WindowState,
};
pub use crate::gfx::rendering::{RecordingBackend, RenderBackend, WgpuBackend};
pub use crate::gfx::resources::{DiskLoader, ResourceCache};

// GUI
pub use crate::input::{Input, Keys, MouseButtons};
pub use crate::ui::{Alignment, Frame, Overflow, Theme, Unit};

pub use crate::error::SceneError;
