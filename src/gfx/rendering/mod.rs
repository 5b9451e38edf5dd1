//! Rendering boundary and its implementations
//!
//! Scene nodes only talk to [`RenderBackend`]. [`WgpuBackend`] renders into a
//! window surface; [`RecordingBackend`] records every call for headless use.

pub mod backend;
pub mod pipeline_manager;
pub mod render_engine;

pub use backend::{
    CubemapHandle, DrawState, ImageData, MeshData, ModelHandle, RecordedCall, RecordingBackend,
    RenderBackend, RenderPass, ShaderHandle, ShaderSet, TextureHandle, Uniform,
};
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::{FrameStats, WgpuBackend};
