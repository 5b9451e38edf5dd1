use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

use crate::gfx::{
    rendering::render_engine::WgpuBackend,
    resources::{DiskLoader, ResourceCache},
    scene::{Scene, ScriptFn, ScriptRegistry, WindowState},
};
use crate::input::Input;

/// Window and scene settings for a [`TrellisApp`]
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Scene file loaded once the window exists
    pub scene_path: Option<PathBuf>,
    /// Directory resource names are resolved against
    pub asset_root: PathBuf,
    pub clear_color: [f64; 4],
    pub vsync: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Trellis".to_string(),
            width: 1200,
            height: 800,
            scene_path: None,
            asset_root: PathBuf::from("."),
            clear_color: [0.1, 0.2, 0.3, 1.0],
            vsync: true,
        }
    }
}

impl AppConfig {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_scene(mut self, path: impl Into<PathBuf>) -> Self {
        self.scene_path = Some(path.into());
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn with_clear_color(mut self, rgba: [f64; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }
}

/// Installs the `env_logger` backend, filtered by `RUST_LOG` (default `info`)
///
/// Safe to call more than once; later calls leave the first logger in place.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Windowed host: one scene, one wgpu surface, one tick per redraw
pub struct TrellisApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: AppConfig,
    window: Option<Arc<Window>>,
    backend: Option<WgpuBackend>,
    scene: Scene,
    input: Input,
    window_state: WindowState,
    started: Instant,
    last_frame: Instant,
    failure: Option<anyhow::Error>,
}

impl TrellisApp {
    pub fn new(config: AppConfig) -> Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;
        let cache = ResourceCache::new(DiskLoader::new(config.asset_root.clone()));
        let scene = Scene::new(cache, ScriptRegistry::new(), WgpuBackend::DEFAULT_SHADERS);
        let now = Instant::now();

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window_state: WindowState::new(config.width, config.height),
                config,
                window: None,
                backend: None,
                scene,
                input: Input::default(),
                started: now,
                last_frame: now,
                failure: None,
            },
        })
    }

    /// Makes `func` available to `@name` bindings in the scene file
    pub fn register_script(&mut self, name: &str, func: ScriptFn) {
        self.app_state.scene.scripts.register(name, func);
    }

    pub fn scene(&self) -> &Scene {
        &self.app_state.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.app_state.scene
    }

    /// Runs the event loop until the window closes or a script requests quit
    pub fn run(mut self) -> Result<()> {
        init_logging();

        let event_loop = self
            .event_loop
            .take()
            .context("Event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self.app_state)
            .context("Event loop terminated abnormally")?;

        if let Some(backend) = self.app_state.backend.as_mut() {
            self.app_state.scene.clear(backend);
        }
        match self.app_state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(self.config.title.clone())
                    .with_inner_size(LogicalSize::new(self.config.width, self.config.height)),
            )
            .context("Failed to create window")?;
        let window = Arc::new(window);
        let (width, height) = window.inner_size().into();

        let mut backend = pollster::block_on(WgpuBackend::new(
            window.clone(),
            width,
            height,
            self.config.vsync,
        ))
        .context("Failed to initialise the renderer")?;
        backend.set_clear_color(self.config.clear_color);

        self.window_state = WindowState::new(width, height);
        self.scene.shaders = backend.shader_set();
        if let Some(path) = self.config.scene_path.clone() {
            self.scene
                .load_file(&path, &mut backend)
                .with_context(|| format!("Failed to load scene {}", path.display()))?;
        }

        info!("Window ready at {}x{}", width, height);
        self.window = Some(window);
        self.backend = Some(backend);
        Ok(())
    }

    fn redraw(&mut self) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };

        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.window_state.time = now.duration_since(self.started).as_secs_f32();

        self.scene
            .tick(&mut self.input, &self.window_state, delta, backend);

        self.input.begin_frame();
        self.window_state.resized = false;
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.start(event_loop) {
            error!("{:#}", err);
            self.failure = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        self.input.process_window_event(&event);

        match event {
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(backend) = self.backend.as_mut() {
                    backend.resize(width, height);
                }
                self.window_state.width = width;
                self.window_state.height = height;
                self.window_state.resized = true;
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => (),
        }

        if self.input.quit {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
