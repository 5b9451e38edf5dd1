// src/gfx/resources/mod.rs
//! Resource management
//!
//! Handles the name-keyed resource cache and the GPU textures behind backend handles.

pub mod cache;
pub mod texture_resource;

// Re-export main types
pub use cache::{DiskLoader, ResourceCache, ResourceLoader};
pub use texture_resource::TextureResource;
