//! # Graphics Module
//!
//! Everything between the node tree and the GPU: the scene graph itself, the
//! camera it renders through, the shared resource cache and the rendering
//! boundary.
//!
//! ## Architecture Overview
//!
//! - **Scene Graph** ([`scene`]) - Node arena, per-kind payloads and the frame loop
//! - **Camera** ([`camera`]) - Perspective camera node uploaded to the shaders
//! - **Rendering** ([`rendering`]) - The [`RenderBackend`] boundary and its wgpu implementation
//! - **Resources** ([`resources`]) - Name-keyed texture, model, cubemap and font cache
//!
//! ## Usage
//!
//! ```no_run
//! use trellis::gfx::{rendering::RecordingBackend, resources::{DiskLoader, ResourceCache}};
//! use trellis::gfx::scene::{Scene, ScriptRegistry};
//!
//! let mut backend = RecordingBackend::new();
//! let cache = ResourceCache::new(DiskLoader::new("assets"));
//! let mut scene = Scene::new(cache, ScriptRegistry::new(), RecordingBackend::shader_set());
//! scene.load_file("assets/menu.scene", &mut backend).unwrap();
//! ```
//!
//! [`RenderBackend`]: rendering::RenderBackend

pub mod camera;
pub mod rendering;
pub mod resources;
pub mod scene;

pub use camera::Camera;
pub use rendering::{RenderBackend, WgpuBackend};
pub use scene::Scene;
