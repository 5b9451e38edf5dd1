//! The rendering boundary consumed by the scene graph
//!
//! Scene nodes never talk to wgpu directly. They bind shaders, set named uniforms,
//! manage textures by handle and submit draws through [`RenderBackend`]. The
//! windowed implementation lives in [`super::render_engine::WgpuBackend`];
//! [`RecordingBackend`] implements the same contract headlessly and records every
//! call, which is what the tests inspect.

use cgmath::Matrix4;

macro_rules! resource_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// Handle of a resource that failed to load, or was never loaded
            pub const NULL: Self = Self(0);

            pub fn is_null(self) -> bool {
                self.0 == 0
            }
        }
    };
}

resource_handle!(
    /// GPU texture owned by the backend
    TextureHandle
);
resource_handle!(
    /// Uploaded model geometry
    ModelHandle
);
resource_handle!(
    /// Six-face cube texture
    CubemapHandle
);
resource_handle!(
    /// Compiled shader program
    ShaderHandle
);

/// Typed uniform value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Uniform {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4(Matrix4<f32>),
}

/// Which traversal of the tree is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    /// Shadow depth pass; GUI elements are skipped
    Depth,
    Main,
}

/// Shader programs the render pass threads through the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSet {
    pub gui: ShaderHandle,
    pub lighting: ShaderHandle,
    pub depth: ShaderHandle,
    pub skybox: ShaderHandle,
}

impl ShaderSet {
    /// Shader used for 3D geometry in `pass`
    pub fn geometry(&self, pass: RenderPass) -> ShaderHandle {
        match pass {
            RenderPass::Depth => self.depth,
            RenderPass::Main => self.lighting,
        }
    }
}

/// Fixed-function state for a quad draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawState {
    pub alpha_blend: bool,
    pub depth_write: bool,
}

impl DrawState {
    /// Alpha blended with depth writes off, as every GUI element draws
    pub const GUI: Self = Self {
        alpha_blend: true,
        depth_write: false,
    };
}

/// CPU-side triangle mesh handed to [`RenderBackend::create_model`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub tex_coords: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Decoded RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Everything the scene graph needs from a renderer
pub trait RenderBackend {
    fn bind_shader(&mut self, shader: ShaderHandle);
    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: Uniform);

    fn create_texture(&mut self, width: u32, height: u32, pixels: &[u8]) -> TextureHandle;
    /// Replaces the contents of `texture`, resizing it when the size changed
    fn upload_texture(&mut self, texture: TextureHandle, width: u32, height: u32, pixels: &[u8]);
    fn delete_texture(&mut self, texture: TextureHandle);
    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    fn create_model(&mut self, mesh: &MeshData) -> ModelHandle;
    fn create_cubemap(&mut self, faces: &[ImageData; 6]) -> CubemapHandle;

    /// Draws the unit GUI quad (two triangles) with the bound shader
    fn draw_quad(&mut self, state: DrawState);
    fn draw_model(&mut self, model: ModelHandle, transform: Matrix4<f32>);
    fn draw_textured_plane(&mut self, texture: TextureHandle, transform: Matrix4<f32>);
    fn draw_skybox(&mut self, cubemap: CubemapHandle, transform: Matrix4<f32>);
    fn draw_mesh(&mut self, transform: Matrix4<f32>);

    fn begin_pass(&mut self, pass: RenderPass);
    /// Submits the frame for presentation
    fn finish_frame(&mut self);
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    BindShader(ShaderHandle),
    SetUniform {
        shader: ShaderHandle,
        name: String,
        value: Uniform,
    },
    CreateTexture {
        texture: TextureHandle,
        width: u32,
        height: u32,
    },
    UploadTexture {
        texture: TextureHandle,
        width: u32,
        height: u32,
    },
    DeleteTexture(TextureHandle),
    BindTexture {
        unit: u32,
        texture: TextureHandle,
    },
    CreateModel {
        model: ModelHandle,
        vertices: usize,
    },
    CreateCubemap(CubemapHandle),
    DrawQuad(DrawState),
    DrawModel(ModelHandle),
    DrawTexturedPlane(TextureHandle),
    DrawSkybox(CubemapHandle),
    DrawMesh,
    BeginPass(RenderPass),
    FinishFrame,
}

/// Headless backend that records every call
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<RecordedCall>,
    next_id: u32,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shader handles with distinct ids for each program
    pub fn shader_set() -> ShaderSet {
        ShaderSet {
            gui: ShaderHandle(1),
            lighting: ShaderHandle(2),
            depth: ShaderHandle(3),
            skybox: ShaderHandle(4),
        }
    }

    fn next_handle(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded quad draws
    pub fn quad_draws(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, RecordedCall::DrawQuad(_)))
            .count()
    }

    /// Last value set for uniform `name` on `shader`
    pub fn last_uniform(&self, shader: ShaderHandle, name: &str) -> Option<Uniform> {
        self.calls.iter().rev().find_map(|call| match call {
            RecordedCall::SetUniform {
                shader: s,
                name: n,
                value,
            } if *s == shader && n == name => Some(*value),
            _ => None,
        })
    }
}

impl RenderBackend for RecordingBackend {
    fn bind_shader(&mut self, shader: ShaderHandle) {
        self.calls.push(RecordedCall::BindShader(shader));
    }

    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: Uniform) {
        self.calls.push(RecordedCall::SetUniform {
            shader,
            name: name.to_owned(),
            value,
        });
    }

    fn create_texture(&mut self, width: u32, height: u32, _pixels: &[u8]) -> TextureHandle {
        let texture = TextureHandle(self.next_handle());
        self.calls.push(RecordedCall::CreateTexture {
            texture,
            width,
            height,
        });
        texture
    }

    fn upload_texture(&mut self, texture: TextureHandle, width: u32, height: u32, _pixels: &[u8]) {
        self.calls.push(RecordedCall::UploadTexture {
            texture,
            width,
            height,
        });
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.calls.push(RecordedCall::DeleteTexture(texture));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        self.calls.push(RecordedCall::BindTexture { unit, texture });
    }

    fn create_model(&mut self, mesh: &MeshData) -> ModelHandle {
        let model = ModelHandle(self.next_handle());
        self.calls.push(RecordedCall::CreateModel {
            model,
            vertices: mesh.vertex_count(),
        });
        model
    }

    fn create_cubemap(&mut self, _faces: &[ImageData; 6]) -> CubemapHandle {
        let cubemap = CubemapHandle(self.next_handle());
        self.calls.push(RecordedCall::CreateCubemap(cubemap));
        cubemap
    }

    fn draw_quad(&mut self, state: DrawState) {
        self.calls.push(RecordedCall::DrawQuad(state));
    }

    fn draw_model(&mut self, model: ModelHandle, _transform: Matrix4<f32>) {
        self.calls.push(RecordedCall::DrawModel(model));
    }

    fn draw_textured_plane(&mut self, texture: TextureHandle, _transform: Matrix4<f32>) {
        self.calls.push(RecordedCall::DrawTexturedPlane(texture));
    }

    fn draw_skybox(&mut self, cubemap: CubemapHandle, _transform: Matrix4<f32>) {
        self.calls.push(RecordedCall::DrawSkybox(cubemap));
    }

    fn draw_mesh(&mut self, _transform: Matrix4<f32>) {
        self.calls.push(RecordedCall::DrawMesh);
    }

    fn begin_pass(&mut self, pass: RenderPass) {
        self.calls.push(RecordedCall::BeginPass(pass));
    }

    fn finish_frame(&mut self) {
        self.calls.push(RecordedCall::FinishFrame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handles() {
        assert!(TextureHandle::NULL.is_null());
        assert!(TextureHandle::default().is_null());
        assert!(!ModelHandle(3).is_null());
    }

    #[test]
    fn test_recording_backend_hands_out_distinct_handles() {
        let mut backend = RecordingBackend::new();
        let a = backend.create_texture(1, 1, &[0; 4]);
        let b = backend.create_texture(2, 2, &[0; 16]);
        assert_ne!(a, b);
        assert!(!a.is_null() && !b.is_null());
    }

    #[test]
    fn test_last_uniform_lookup() {
        let mut backend = RecordingBackend::new();
        let shader = ShaderHandle(1);
        backend.set_uniform(shader, "hovered", Uniform::Int(0));
        backend.set_uniform(shader, "hovered", Uniform::Int(1));
        assert_eq!(backend.last_uniform(shader, "hovered"), Some(Uniform::Int(1)));
        assert_eq!(backend.last_uniform(ShaderHandle(2), "hovered"), None);
    }
}
