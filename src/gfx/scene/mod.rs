//! # Scene Graph
//!
//! Typed nodes in an arena-backed tree, and the frame loop that drives them.
//!
//! ## Key Components
//!
//! - [`Node`] - transform, flags, script binding and a kind-specific [`Payload`]
//! - [`NodeClass`] - the operation set every node kind implements
//! - [`SceneTree`] - ownership, reparenting and cascading frees
//! - [`Scene`] - the tree plus its resource cache, scripts and active camera
//!
//! ## Usage
//!
//! ```no_run
//! use trellis::gfx::rendering::RecordingBackend;
//! use trellis::gfx::resources::{DiskLoader, ResourceCache};
//! use trellis::gfx::scene::{Scene, ScriptRegistry, WindowState};
//! use trellis::input::Input;
//!
//! let mut backend = RecordingBackend::new();
//! let mut scene = Scene::new(
//!     ResourceCache::new(DiskLoader::new("assets")),
//!     ScriptRegistry::new(),
//!     RecordingBackend::shader_set(),
//! );
//! scene.load_file("assets/menu.scene", &mut backend).unwrap();
//!
//! let mut input = Input::default();
//! scene.tick(&mut input, &WindowState::default(), 1.0 / 60.0, &mut backend);
//! ```

pub mod class;
pub mod context;
pub mod node;
pub mod objects;
pub mod payload;
pub mod scene;
pub mod script;
pub mod tree;

// Re-export main types
pub use class::NodeClass;
pub use context::{RefreshContext, RenderContext, UpdateContext, WindowState};
pub use node::{Node, NodeFlags, NodeId, NodeKind, Transform};
pub use payload::Payload;
pub use scene::Scene;
pub use script::{ScriptBinding, ScriptFn, ScriptParam, ScriptRegistry};
pub use tree::SceneTree;
