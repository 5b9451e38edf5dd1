//! wgpu implementation of the rendering boundary
//!
//! GUI quads are queued during the main pass, each with its own uniform buffer
//! and bind group, and drawn in submission order when the frame is finished. 3D
//! submissions are accepted and counted; rasterising scene geometry is left to
//! the host renderer.

use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use cgmath::Matrix4;
use log::{debug, info, trace, warn};
use wgpu::util::DeviceExt;
use wgpu::TextureFormat;

use super::backend::{
    CubemapHandle, DrawState, ImageData, MeshData, ModelHandle, RenderBackend, RenderPass,
    ShaderHandle, ShaderSet, TextureHandle, Uniform,
};
use super::pipeline_manager::{PipelineConfig, PipelineManager};
use crate::gfx::camera::convert_matrix4_to_array;
use crate::gfx::resources::texture_resource::TextureResource;

const GUI_PIPELINE: &str = "GUI";
const GUI_PIPELINE_NO_BLEND: &str = "GUI Opaque";

/// Uniform block of `gui.wgsl`
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GuiUniform {
    model: [[f32; 4]; 4],
    overflow: [f32; 4],
    pixel_position: [f32; 2],
    pixel_size: [f32; 2],
    resolution: [f32; 2],
    time: f32,
    background_enabled: u32,
    content_enabled: u32,
    checked: u32,
    is_check_box: u32,
    is_radio_button: u32,
    pressed: u32,
    hovered: u32,
    _padding: [u32; 2],
}

impl GuiUniform {
    fn set(&mut self, name: &str, value: Uniform) -> bool {
        let flag = |value: Uniform| match value {
            Uniform::Int(v) => Some((v != 0) as u32),
            _ => None,
        };
        match (name, value) {
            ("model", Uniform::Mat4(m)) => self.model = convert_matrix4_to_array(m),
            ("overflow", Uniform::Vec4(v)) => self.overflow = v,
            ("pixelPosition", Uniform::Vec2(v)) => self.pixel_position = v,
            ("pixelSize", Uniform::Vec2(v)) => self.pixel_size = v,
            ("time", Uniform::Float(v)) => self.time = v,
            // texture unit assignments are fixed by the bind group layout
            ("background" | "content", _) => {}
            (name, value) => {
                let Some(bit) = flag(value) else {
                    return false;
                };
                match name {
                    "backgroundEnabled" => self.background_enabled = bit,
                    "contentEnabled" => self.content_enabled = bit,
                    "checked" => self.checked = bit,
                    "isCheckBox" => self.is_check_box = bit,
                    "isRadioButton" => self.is_radio_button = bit,
                    "pressed" => self.pressed = bit,
                    "hovered" => self.hovered = bit,
                    _ => return false,
                }
            }
        }
        true
    }
}

struct QueuedQuad {
    bind_group: wgpu::BindGroup,
    blend: bool,
}

/// Submissions of the last finished frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub quads: usize,
    pub models: usize,
    pub planes: usize,
    pub skyboxes: usize,
    pub meshes: usize,
}

/// Renders the scene graph's GUI layer into a window surface
pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    pipeline_manager: PipelineManager,
    gui_layout: wgpu::BindGroupLayout,
    clear_color: wgpu::Color,

    shaders: ShaderSet,
    bound_shader: ShaderHandle,
    gui_uniform: GuiUniform,
    bound_textures: [TextureHandle; 2],

    textures: HashMap<TextureHandle, TextureResource>,
    placeholder: TextureResource,
    models: HashMap<ModelHandle, usize>,
    cubemaps: Vec<CubemapHandle>,
    next_handle: u32,

    pass: RenderPass,
    quads: Vec<QueuedQuad>,
    stats: FrameStats,
    last_stats: FrameStats,
}

impl WgpuBackend {
    /// Program handles this backend hands out
    pub const DEFAULT_SHADERS: ShaderSet = ShaderSet {
        gui: ShaderHandle(1),
        lighting: ShaderHandle(2),
        depth: ShaderHandle(3),
        skybox: ShaderHandle(4),
    };

    /// Creates the device, configures the surface and builds the GUI pipeline
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `vsync` - Prefer a present mode that waits for vertical blank
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("Failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("Failed to request adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request a device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .context("Surface reports no texture formats")?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        info!("Surface configured {}x{} as {:?}", config.width, config.height, format);

        let depth_texture = TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let placeholder = TextureResource::create_from_rgba_data(
            &device,
            &queue,
            &[0, 0, 0, 0],
            1,
            1,
            "Placeholder Texture",
        );
        let gui_layout = Self::create_gui_layout(&device);

        let device: Arc<wgpu::Device> = device.into();
        let queue: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader("gui", include_str!("gui.wgsl"));
        for (name, blend) in [
            (GUI_PIPELINE, Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING)),
            (GUI_PIPELINE_NO_BLEND, Some(wgpu::BlendState::REPLACE)),
        ] {
            pipeline_manager.register_pipeline(
                name,
                Self::gui_pipeline_config(name, format, blend, gui_layout.clone()),
            );
        }
        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for e in errors {
                warn!("{}", e);
            }
        }
        debug!("{:?}", pipeline_manager.get_stats());

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            pipeline_manager,
            gui_layout,
            clear_color: wgpu::Color {
                r: 0.1,
                g: 0.2,
                b: 0.3,
                a: 1.0,
            },
            shaders: Self::DEFAULT_SHADERS,
            bound_shader: ShaderHandle::NULL,
            gui_uniform: GuiUniform::zeroed(),
            bound_textures: [TextureHandle::NULL; 2],
            textures: HashMap::new(),
            placeholder,
            models: HashMap::new(),
            cubemaps: Vec::new(),
            next_handle: 0,
            pass: RenderPass::Main,
            quads: Vec::new(),
            stats: FrameStats::default(),
            last_stats: FrameStats::default(),
        })
    }

    fn create_gui_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        };

        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("GUI Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    fn gui_pipeline_config(
        label: &str,
        format: TextureFormat,
        blend: Option<wgpu::BlendState>,
        layout: wgpu::BindGroupLayout,
    ) -> PipelineConfig {
        PipelineConfig::default()
            .with_label(label)
            .with_shader("gui")
            .with_cull_mode(None)
            .with_bind_group_layouts(vec![layout])
            .with_depth_stencil(TextureResource::DEPTH_FORMAT, false)
            .with_color_targets(vec![Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })])
    }

    /// Shader handles scene nodes render with
    pub fn shader_set(&self) -> ShaderSet {
        self.shaders
    }

    /// Reconfigures the surface and depth buffer; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn set_clear_color(&mut self, rgba: [f64; 4]) {
        self.clear_color = wgpu::Color {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        };
    }

    /// What the last finished frame submitted
    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn next_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn texture_view(&self, handle: TextureHandle) -> &wgpu::TextureView {
        self.textures
            .get(&handle)
            .map(|texture| &texture.view)
            .unwrap_or(&self.placeholder.view)
    }

    fn queue_gui_quad(&mut self, state: DrawState) {
        self.gui_uniform.resolution = [self.config.width as f32, self.config.height as f32];
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("GUI Uniform Buffer"),
                contents: bytemuck::bytes_of(&self.gui_uniform),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let [skin, content] = self.bound_textures;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("GUI Bind Group"),
            layout: &self.gui_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(self.texture_view(skin)),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(self.texture_view(content)),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.placeholder.sampler),
                },
            ],
        });

        self.quads.push(QueuedQuad {
            bind_group,
            blend: state.alpha_blend,
        });
        self.bound_textures = [TextureHandle::NULL; 2];
    }

    fn present(&mut self) {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                warn!("Surface lost, reconfigured; frame dropped");
                return;
            }
            Err(e) => {
                warn!("Failed to acquire surface texture: {}", e);
                return;
            }
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for quad in &self.quads {
                let name = if quad.blend {
                    GUI_PIPELINE
                } else {
                    GUI_PIPELINE_NO_BLEND
                };
                let Some(pipeline) = self.pipeline_manager.get_pipeline(name) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &quad.bind_group, &[]);
                render_pass.draw(0..6, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }
}

impl RenderBackend for WgpuBackend {
    fn bind_shader(&mut self, shader: ShaderHandle) {
        if shader == self.shaders.gui && self.bound_shader != shader {
            self.gui_uniform = GuiUniform::zeroed();
        }
        self.bound_shader = shader;
    }

    fn set_uniform(&mut self, shader: ShaderHandle, name: &str, value: Uniform) {
        if shader != self.shaders.gui {
            trace!("Uniform '{}' on {:?} has no pipeline", name, shader);
            return;
        }
        if !self.gui_uniform.set(name, value) {
            warn!("Unknown GUI uniform '{}' = {:?}", name, value);
        }
    }

    fn create_texture(&mut self, width: u32, height: u32, pixels: &[u8]) -> TextureHandle {
        let handle = TextureHandle(self.next_handle());
        let texture = TextureResource::create_from_rgba_data(
            &self.device,
            &self.queue,
            pixels,
            width,
            height,
            &format!("Texture {}", handle.0),
        );
        self.textures.insert(handle, texture);
        handle
    }

    fn upload_texture(&mut self, texture: TextureHandle, width: u32, height: u32, pixels: &[u8]) {
        let same_size = self
            .textures
            .get(&texture)
            .is_some_and(|existing| existing.size() == (width.max(1), height.max(1)));
        if same_size {
            if let Some(existing) = self.textures.get(&texture) {
                existing.write(&self.queue, pixels);
            }
            return;
        }
        let resource = TextureResource::create_from_rgba_data(
            &self.device,
            &self.queue,
            pixels,
            width,
            height,
            &format!("Texture {}", texture.0),
        );
        self.textures.insert(texture, resource);
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        if let Some(slot) = self.bound_textures.get_mut(unit as usize) {
            *slot = texture;
        }
    }

    fn create_model(&mut self, mesh: &MeshData) -> ModelHandle {
        let handle = ModelHandle(self.next_handle());
        self.models.insert(handle, mesh.triangle_count());
        debug!("Model {:?} registered with {} triangles", handle, mesh.triangle_count());
        handle
    }

    fn create_cubemap(&mut self, faces: &[ImageData; 6]) -> CubemapHandle {
        let handle = CubemapHandle(self.next_handle());
        debug!("Cube map {:?} registered, face size {}x{}", handle, faces[0].width, faces[0].height);
        self.cubemaps.push(handle);
        handle
    }

    fn draw_quad(&mut self, state: DrawState) {
        if self.pass != RenderPass::Main || self.bound_shader != self.shaders.gui {
            return;
        }
        self.stats.quads += 1;
        self.queue_gui_quad(state);
    }

    fn draw_model(&mut self, model: ModelHandle, _transform: Matrix4<f32>) {
        if self.models.contains_key(&model) {
            self.stats.models += 1;
        }
    }

    fn draw_textured_plane(&mut self, _texture: TextureHandle, _transform: Matrix4<f32>) {
        self.stats.planes += 1;
    }

    fn draw_skybox(&mut self, _cubemap: CubemapHandle, _transform: Matrix4<f32>) {
        self.stats.skyboxes += 1;
    }

    fn draw_mesh(&mut self, _transform: Matrix4<f32>) {
        self.stats.meshes += 1;
    }

    fn begin_pass(&mut self, pass: RenderPass) {
        self.pass = pass;
        if pass == RenderPass::Depth {
            self.quads.clear();
            self.stats = FrameStats::default();
        }
    }

    fn finish_frame(&mut self) {
        self.present();
        self.quads.clear();
        self.last_stats = std::mem::take(&mut self.stats);
        trace!("Frame finished: {:?}", self.last_stats);
    }
}
