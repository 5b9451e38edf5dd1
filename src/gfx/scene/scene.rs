use std::path::Path;

use cgmath::Matrix4;
use log::{debug, info, trace};

use super::context::{RenderContext, UpdateContext, WindowState};
use super::node::{Node, NodeId};
use super::payload::Payload;
use super::script::ScriptRegistry;
use super::tree::SceneTree;
use crate::error::SceneError;
use crate::format::{read_scene, write_scene, LoadContext};
use crate::gfx::rendering::backend::{RenderBackend, RenderPass, ShaderSet};
use crate::gfx::resources::ResourceCache;
use crate::input::Input;

/// Node tree plus the services its nodes load and render through
///
/// One [`Scene::tick`] is a full frame: update every active node, refresh every
/// dirty GUI element, then render the depth and main passes.
pub struct Scene {
    pub tree: SceneTree,
    pub cache: ResourceCache,
    pub scripts: ScriptRegistry,
    pub active_camera: Option<NodeId>,
    pub shaders: ShaderSet,
}

impl Scene {
    pub fn new(cache: ResourceCache, scripts: ScriptRegistry, shaders: ShaderSet) -> Self {
        Self {
            tree: SceneTree::new(),
            cache,
            scripts,
            active_camera: None,
            shaders,
        }
    }

    /// Replaces the tree with the nodes described by `text`
    ///
    /// On error the current tree is left untouched and everything the partial
    /// load allocated is released.
    pub fn load_str(&mut self, text: &str, backend: &mut dyn RenderBackend) -> Result<(), SceneError> {
        let mut tree = SceneTree::new();
        let result = {
            let mut ctx = LoadContext::new(&mut self.cache, backend, &self.scripts);
            read_scene(text, &mut tree, &mut ctx)
        };

        match result {
            Ok(camera) => {
                self.tree.clear(backend);
                self.tree = tree;
                self.active_camera = camera;
                info!("Scene loaded with {} nodes", self.tree.len() - 1);
                self.tree.print_tree();
                Ok(())
            }
            Err(err) => {
                tree.clear(backend);
                Err(err)
            }
        }
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>, backend: &mut dyn RenderBackend) -> Result<(), SceneError> {
        let path = path.as_ref();
        debug!("Loading scene {}", path.display());
        let text = std::fs::read_to_string(path)?;
        self.load_str(&text, backend)
    }

    pub fn save_string(&self) -> String {
        write_scene(&self.tree, &self.cache, self.active_camera)
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        std::fs::write(path, self.save_string())?;
        Ok(())
    }

    /// Runs one frame
    pub fn tick(
        &mut self,
        input: &mut Input,
        window: &WindowState,
        delta: f32,
        backend: &mut dyn RenderBackend,
    ) {
        self.update(input, window, delta);
        self.refresh(window, backend);
        self.render(window, backend);
    }

    /// Runs scripts and `update` on every active node, parents first
    ///
    /// A node's script runs before its own `update`; its global transform is
    /// recomputed afterwards so script movement shows up in the same frame.
    pub fn update(&mut self, input: &mut Input, window: &WindowState, delta: f32) {
        let mut ctx = UpdateContext {
            input,
            window,
            delta,
        };

        let mut stack = vec![self.tree.root()];
        while let Some(id) = stack.pop() {
            let Some(node) = self.tree.get(id) else {
                continue;
            };
            if !node.flags.active {
                continue;
            }

            if let Some(script) = node.script.as_ref().map(|s| s.func) {
                script(&mut self.tree, id, &mut ctx);
            }

            let parent_global = self
                .tree
                .parent(id)
                .and_then(|parent| self.tree.get(parent))
                .map(|parent| parent.global);
            let Some(node) = self.tree.get_mut(id) else {
                continue;
            };
            node.class_mut().update(&mut ctx);
            node.global = match parent_global {
                Some(parent) => node.local.combine(&parent),
                None => node.local,
            };
            stack.extend(node.children().iter().rev().copied());
        }
    }

    /// Refreshes every dirty GUI element in visible subtrees, parents first
    pub fn refresh(&mut self, window: &WindowState, backend: &mut dyn RenderBackend) {
        let mut stack = vec![self.tree.root()];
        while let Some(id) = stack.pop() {
            let Some(node) = self.tree.get(id) else {
                continue;
            };
            if !node.flags.visible {
                continue;
            }
            if node.frame().is_some_and(|frame| frame.needs_refresh) {
                trace!("Refreshing {:?}", node.kind());
                self.tree.refresh_node(id, window, backend);
            }
            stack.extend(self.tree.children(id).iter().rev().copied());
        }
    }

    /// Draws the depth pass, then the main pass seen from the active camera
    pub fn render(&mut self, window: &WindowState, backend: &mut dyn RenderBackend) {
        backend.begin_pass(RenderPass::Depth);
        self.render_pass(RenderPass::Depth, window, backend);

        backend.begin_pass(RenderPass::Main);
        if let Some(camera_id) = self.active_camera {
            if let Some(node) = self.tree.get(camera_id) {
                if let Payload::Camera(camera) = node.payload() {
                    camera.apply(&node.global, backend, &self.shaders);
                }
            }
        }
        self.render_pass(RenderPass::Main, window, backend);

        backend.finish_frame();
    }

    fn render_pass(&mut self, pass: RenderPass, window: &WindowState, backend: &mut dyn RenderBackend) {
        let mut stack = vec![self.tree.root()];
        while let Some(id) = stack.pop() {
            let Some(node) = self.tree.get(id) else {
                continue;
            };
            if !node.flags.visible {
                continue;
            }
            if node.frame().is_some_and(|frame| frame.needs_refresh) {
                self.tree.refresh_node(id, window, backend);
            }

            let Some(node) = self.tree.get_mut(id) else {
                continue;
            };
            let model: Matrix4<f32> = node.global.matrix();
            let mut ctx = RenderContext::new(&mut *backend, &self.shaders, pass, window);
            ctx.model = model;
            node.class_mut().render(&mut ctx);
            stack.extend(node.children().iter().rev().copied());
        }
    }

    /// Frees every node and forgets the active camera
    pub fn clear(&mut self, backend: &mut dyn RenderBackend) {
        self.tree.clear(backend);
        self.active_camera = None;
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.tree.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::backend::{RecordedCall, RecordingBackend, Uniform};
    use crate::gfx::resources::cache::tests::CountingLoader;
    use crate::gfx::scene::{NodeKind, ScriptParam};
    use cgmath::Vector3;

    fn scene() -> Scene {
        Scene::new(
            ResourceCache::new(CountingLoader::default()),
            ScriptRegistry::new(),
            RecordingBackend::shader_set(),
        )
    }

    fn drift(tree: &mut SceneTree, id: NodeId, ctx: &mut UpdateContext<'_>) {
        if let Some(node) = tree.get_mut(id) {
            node.local.position.x += ctx.delta;
            if let Some(script) = node.script.as_mut() {
                if let ScriptParam::Int(n) = &mut script.ensure_params(1)[0] {
                    *n += 1;
                }
            }
        }
    }

    #[test]
    fn test_failed_load_keeps_current_tree() {
        let mut scene = scene();
        let mut backend = RecordingBackend::new();
        scene.load_str("empty:1\n  m\n", &mut backend).unwrap();
        assert_eq!(scene.tree.len(), 3);

        let err = scene.load_str("empty:1 frame(1p,", &mut backend).unwrap_err();
        assert!(err.offset().is_some());
        assert_eq!(scene.tree.len(), 3);
        assert_eq!(scene.save_string(), "empty:1\n  m\n");
    }

    #[test]
    fn test_scripts_move_nodes_before_globals_are_computed() {
        let mut scene = scene();
        scene.scripts.register("drift", drift);
        let mut backend = RecordingBackend::new();
        scene
            .load_str("empty{0,1,0;0,0,0;1,1,1}:1\n  m{0,0,0;0,0,0;1,1,1}@drift\n", &mut backend)
            .unwrap();

        let mut input = Input::default();
        let window = WindowState::default();
        scene.update(&mut input, &window, 0.5);
        scene.update(&mut input, &window, 0.5);

        let parent = scene.tree.children(scene.tree.root())[0];
        let mesh = scene.tree.children(parent)[0];
        let node = scene.node(mesh).unwrap();
        assert_eq!(node.global.position, Vector3::new(1.0, 1.0, 0.0));
        assert_eq!(node.script.as_ref().unwrap().params[0], ScriptParam::Int(2));
    }

    #[test]
    fn test_inactive_subtrees_are_not_updated() {
        let mut scene = scene();
        scene.scripts.register("drift", drift);
        let mut backend = RecordingBackend::new();
        scene.load_str("empty:1\n  m@drift\n", &mut backend).unwrap();
        let parent = scene.tree.children(scene.tree.root())[0];
        scene.tree.get_mut(parent).unwrap().flags.active = false;

        let mut input = Input::default();
        scene.update(&mut input, &WindowState::default(), 1.0);
        let mesh = scene.tree.children(parent)[0];
        assert_eq!(scene.node(mesh).unwrap().local.position.x, 0.0);
    }

    #[test]
    fn test_tick_runs_depth_then_main_pass() {
        let mut scene = scene();
        let mut backend = RecordingBackend::new();
        scene
            .load_str("camera(1){0,0,5;0,0,0;1,1,1}\nframe(0p,0p,50%,50%,ccn)\n", &mut backend)
            .unwrap();
        backend.clear();

        let mut input = Input::default();
        scene.tick(&mut input, &WindowState::default(), 0.016, &mut backend);

        let passes: Vec<_> = backend
            .calls
            .iter()
            .filter(|call| matches!(call, RecordedCall::BeginPass(_) | RecordedCall::FinishFrame))
            .cloned()
            .collect();
        assert_eq!(
            passes,
            vec![
                RecordedCall::BeginPass(RenderPass::Depth),
                RecordedCall::BeginPass(RenderPass::Main),
                RecordedCall::FinishFrame,
            ]
        );
        // the GUI quad is only drawn in the main pass
        assert_eq!(backend.quad_draws(), 1);
        let shaders = scene.shaders;
        assert!(matches!(
            backend.last_uniform(shaders.lighting, "viewPos"),
            Some(Uniform::Vec3([_, _, z])) if z == 5.0
        ));
    }

    #[test]
    fn test_refresh_clears_dirty_gui_nodes() {
        let mut scene = scene();
        let mut backend = RecordingBackend::new();
        scene
            .load_str("frame(0p,0p,100%,100%,lts):1\n  button(OK,cc)\n", &mut backend)
            .unwrap();
        scene.refresh(&WindowState::default(), &mut backend);

        for (_, node) in scene.tree.iter() {
            if let Some(frame) = node.frame() {
                assert!(!frame.needs_refresh, "{:?} still dirty", node.kind());
            }
        }
        let button = scene.tree.iter().find(|(_, n)| n.kind() == NodeKind::Button).unwrap().1;
        assert_eq!(button.frame().unwrap().size, [1200.0, 800.0]);
    }

    #[test]
    fn test_hidden_subtrees_skip_refresh_and_render() {
        let mut scene = scene();
        let mut backend = RecordingBackend::new();
        scene.load_str("frame(0p,0p,100%,100%,ltn)\n", &mut backend).unwrap();
        let frame = scene.tree.children(scene.tree.root())[0];
        scene.tree.get_mut(frame).unwrap().flags.visible = false;

        let mut input = Input::default();
        scene.tick(&mut input, &WindowState::default(), 0.016, &mut backend);
        assert_eq!(backend.quad_draws(), 0);
        assert!(scene.node(frame).unwrap().frame().unwrap().needs_refresh);
    }
}
