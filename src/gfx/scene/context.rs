//! State threaded through the per-frame passes

use cgmath::{Matrix4, SquareMatrix};

use crate::gfx::rendering::backend::{RenderBackend, RenderPass, ShaderSet};
use crate::input::Input;
use crate::ui::frame::ParentFrame;

/// Window resolution and timing as seen by the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowState {
    pub width: u32,
    pub height: u32,
    /// Set for exactly the frame after a resize
    pub resized: bool,
    /// Seconds since the application started
    pub time: f32,
}

impl WindowState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            resized: false,
            time: 0.0,
        }
    }

    pub fn size(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

impl Default for WindowState {
    fn default() -> Self {
        Self::new(1200, 800)
    }
}

/// Passed to scripts and to every node's `update`
pub struct UpdateContext<'a> {
    pub input: &'a mut Input,
    pub window: &'a WindowState,
    /// Seconds since the previous frame
    pub delta: f32,
}

/// Passed to a node's `refresh`
pub struct RefreshContext<'a> {
    pub window: &'a WindowState,
    /// Geometry of the parent, when the parent is a GUI element
    pub parent: Option<&'a ParentFrame>,
    pub backend: &'a mut dyn RenderBackend,
    /// Set by GUI elements to the extent they add to the parent's content size
    pub extent: Option<[f32; 2]>,
}

/// Passed to a node's `render`
pub struct RenderContext<'a> {
    pub backend: &'a mut dyn RenderBackend,
    pub shaders: &'a ShaderSet,
    pub pass: RenderPass,
    pub window: &'a WindowState,
    /// World matrix of the node being rendered
    pub model: Matrix4<f32>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        backend: &'a mut dyn RenderBackend,
        shaders: &'a ShaderSet,
        pass: RenderPass,
        window: &'a WindowState,
    ) -> Self {
        Self {
            backend,
            shaders,
            pass,
            window,
            model: Matrix4::identity(),
        }
    }
}
