//! Non-GUI node kinds
//!
//! Physics bodies are data only: they persist their parameters and own the child
//! count of their subtree, nothing here simulates them. Resource nodes hold a
//! cache handle plus the name it was requested under, so a failed load still
//! saves back the name it came from.

use cgmath::{Vector3, Zero};

use crate::error::SceneError;
use crate::format::{LoadContext, SaveContext, SceneReader, SceneWriter};
use crate::gfx::rendering::backend::{
    CubemapHandle, ModelHandle, RenderPass, TextureHandle, Uniform,
};
use crate::gfx::scene::{NodeClass, NodeKind, RenderContext};

macro_rules! marker_node {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl NodeClass for $name {
            fn kind(&self) -> NodeKind {
                NodeKind::$kind
            }
        }
    };
}

marker_node!(
    /// Grouping node with no behaviour of its own
    Empty => Empty
);
marker_node!(
    /// Post-processing output target
    Viewport => Viewport
);
marker_node!(
    /// Multisample resolve filter of a viewport
    Msaa => Msaa
);

fn read_vector(source: &mut SceneReader<'_>) -> Result<Vector3<f32>, SceneError> {
    let x = source.number()?;
    source.expect(',')?;
    let y = source.number()?;
    source.expect(',')?;
    let z = source.number()?;
    Ok(Vector3::new(x, y, z))
}

fn write_vector(writer: &mut SceneWriter, v: Vector3<f32>) {
    writer.number(v.x);
    writer.separator();
    writer.number(v.y);
    writer.separator();
    writer.number(v.z);
}

fn read_child_count(source: &mut SceneReader<'_>) -> Result<usize, SceneError> {
    source.unsigned()
}

/// Immovable collider parent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticBody {
    pub child_count: usize,
}

impl NodeClass for StaticBody {
    fn kind(&self) -> NodeKind {
        NodeKind::StaticBody
    }

    fn load(
        &mut self,
        source: Option<&mut SceneReader<'_>>,
        _ctx: &mut LoadContext<'_>,
    ) -> Result<(), SceneError> {
        let Some(source) = source else {
            return Ok(());
        };
        source.expect('(')?;
        self.child_count = read_child_count(source)?;
        source.expect(')')
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        writer.keyword(self.kind().keyword());
        writer.open();
        writer.integer(ctx.child_count as i64);
        writer.close();
    }

    fn declared_children(&self) -> Option<usize> {
        Some(self.child_count)
    }
}

/// Dynamic body parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBody {
    pub velocity: Vector3<f32>,
    pub angular_velocity: Vector3<f32>,
    pub gravity: Vector3<f32>,
    pub mass: f32,
    pub friction: f32,
    pub center_of_mass: Vector3<f32>,
    pub child_count: usize,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            velocity: Vector3::zero(),
            angular_velocity: Vector3::zero(),
            gravity: Vector3::new(0.0, -1.0, 0.0),
            mass: 100.0,
            friction: 0.98,
            center_of_mass: Vector3::zero(),
            child_count: 0,
        }
    }
}

impl NodeClass for RigidBody {
    fn kind(&self) -> NodeKind {
        NodeKind::RigidBody
    }

    fn load(
        &mut self,
        source: Option<&mut SceneReader<'_>>,
        _ctx: &mut LoadContext<'_>,
    ) -> Result<(), SceneError> {
        let Some(source) = source else {
            return Ok(());
        };
        source.expect('(')?;
        self.velocity = read_vector(source)?;
        source.expect(',')?;
        self.angular_velocity = read_vector(source)?;
        source.expect(',')?;
        self.gravity = read_vector(source)?;
        source.expect(',')?;
        self.mass = source.number()?;
        source.expect(',')?;
        self.friction = source.number()?;
        source.expect(',')?;
        self.center_of_mass = read_vector(source)?;
        source.expect(',')?;
        self.child_count = read_child_count(source)?;
        source.expect(')')
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        writer.keyword(self.kind().keyword());
        writer.open();
        write_vector(writer, self.velocity);
        writer.separator();
        write_vector(writer, self.angular_velocity);
        writer.separator();
        write_vector(writer, self.gravity);
        writer.separator();
        writer.number(self.mass);
        writer.separator();
        writer.number(self.friction);
        writer.separator();
        write_vector(writer, self.center_of_mass);
        writer.separator();
        writer.integer(ctx.child_count as i64);
        writer.close();
    }

    fn declared_children(&self) -> Option<usize> {
        Some(self.child_count)
    }
}

/// Script-driven body that moves at a set velocity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicBody {
    pub velocity: Vector3<f32>,
    pub child_count: usize,
}

impl Default for KinematicBody {
    fn default() -> Self {
        Self {
            velocity: Vector3::zero(),
            child_count: 0,
        }
    }
}

impl NodeClass for KinematicBody {
    fn kind(&self) -> NodeKind {
        NodeKind::KinematicBody
    }

    fn load(
        &mut self,
        source: Option<&mut SceneReader<'_>>,
        _ctx: &mut LoadContext<'_>,
    ) -> Result<(), SceneError> {
        let Some(source) = source else {
            return Ok(());
        };
        source.expect('(')?;
        self.velocity = read_vector(source)?;
        source.expect(',')?;
        self.child_count = read_child_count(source)?;
        source.expect(')')
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        writer.keyword(self.kind().keyword());
        writer.open();
        write_vector(writer, self.velocity);
        writer.separator();
        writer.integer(ctx.child_count as i64);
        writer.close();
    }

    fn declared_children(&self) -> Option<usize> {
        Some(self.child_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Box,
    Plane,
    Sphere,
}

/// Collider of a body, sized by the node's transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionShape {
    pub shape: ShapeKind,
}

impl CollisionShape {
    pub fn new(shape: ShapeKind) -> Self {
        Self { shape }
    }
}

impl NodeClass for CollisionShape {
    fn kind(&self) -> NodeKind {
        match self.shape {
            ShapeKind::Box => NodeKind::BoxShape,
            ShapeKind::Plane => NodeKind::PlaneShape,
            ShapeKind::Sphere => NodeKind::SphereShape,
        }
    }
}

/// Full-screen plane used by viewports and filters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenMesh;

impl NodeClass for ScreenMesh {
    fn kind(&self) -> NodeKind {
        NodeKind::Mesh
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let shader = ctx.shaders.geometry(ctx.pass);
        ctx.backend.bind_shader(shader);
        ctx.backend.set_uniform(shader, "model", Uniform::Mat4(ctx.model));
        ctx.backend.draw_mesh(ctx.model);
    }
}

/// Reads `(name)` and returns the name
fn read_resource_name(source: &mut SceneReader<'_>) -> Result<String, SceneError> {
    source.expect('(')?;
    let name = source.field();
    source.expect(')')?;
    Ok(name)
}

fn write_resource_name(writer: &mut SceneWriter, keyword: &str, name: &str) {
    writer.keyword(keyword);
    writer.open();
    writer.text(name);
    writer.close();
}

/// Model geometry loaded from an OBJ file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelNode {
    pub model: ModelHandle,
    pub name: String,
}

impl NodeClass for ModelNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Model
    }

    fn load(
        &mut self,
        source: Option<&mut SceneReader<'_>>,
        ctx: &mut LoadContext<'_>,
    ) -> Result<(), SceneError> {
        let Some(source) = source else {
            return Ok(());
        };
        self.name = read_resource_name(source)?;
        self.model = ctx.cache.resolve_model(&self.name, ctx.backend);
        Ok(())
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        let name = ctx.cache.model_name(self.model).unwrap_or(&self.name);
        write_resource_name(writer, self.kind().keyword(), name);
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        if self.model.is_null() {
            return;
        }
        let shader = ctx.shaders.geometry(ctx.pass);
        ctx.backend.bind_shader(shader);
        ctx.backend.set_uniform(shader, "model", Uniform::Mat4(ctx.model));
        ctx.backend.draw_model(self.model, ctx.model);
    }
}

/// Unit plane carrying a texture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TexturedMesh {
    pub texture: TextureHandle,
    pub name: String,
}

impl NodeClass for TexturedMesh {
    fn kind(&self) -> NodeKind {
        NodeKind::TexturedMesh
    }

    fn load(
        &mut self,
        source: Option<&mut SceneReader<'_>>,
        ctx: &mut LoadContext<'_>,
    ) -> Result<(), SceneError> {
        let Some(source) = source else {
            return Ok(());
        };
        self.name = read_resource_name(source)?;
        self.texture = ctx.cache.resolve_texture(&self.name, ctx.backend);
        Ok(())
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        let name = ctx.cache.texture_name(self.texture).unwrap_or(&self.name);
        write_resource_name(writer, self.kind().keyword(), name);
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        if self.texture.is_null() {
            return;
        }
        let shader = ctx.shaders.geometry(ctx.pass);
        ctx.backend.bind_shader(shader);
        ctx.backend.set_uniform(shader, "model", Uniform::Mat4(ctx.model));
        ctx.backend.draw_textured_plane(self.texture, ctx.model);
    }
}

/// Texture bound as the diffuse map for the geometry drawn after it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureNode {
    pub texture: TextureHandle,
    pub name: String,
}

impl NodeClass for TextureNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Texture
    }

    fn load(
        &mut self,
        source: Option<&mut SceneReader<'_>>,
        ctx: &mut LoadContext<'_>,
    ) -> Result<(), SceneError> {
        let Some(source) = source else {
            return Ok(());
        };
        self.name = read_resource_name(source)?;
        self.texture = ctx.cache.resolve_texture(&self.name, ctx.backend);
        Ok(())
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        let name = ctx.cache.texture_name(self.texture).unwrap_or(&self.name);
        write_resource_name(writer, self.kind().keyword(), name);
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        if ctx.pass == RenderPass::Main && !self.texture.is_null() {
            ctx.backend.bind_texture(0, self.texture);
        }
    }
}

/// Six-face environment cube drawn behind the scene
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skybox {
    pub cubemap: CubemapHandle,
    pub faces: [String; 6],
}

impl NodeClass for Skybox {
    fn kind(&self) -> NodeKind {
        NodeKind::Skybox
    }

    fn load(
        &mut self,
        source: Option<&mut SceneReader<'_>>,
        ctx: &mut LoadContext<'_>,
    ) -> Result<(), SceneError> {
        let Some(source) = source else {
            return Ok(());
        };
        source.expect('(')?;
        for (i, face) in self.faces.iter_mut().enumerate() {
            if i > 0 {
                source.expect(',')?;
            }
            *face = source.field();
        }
        source.expect(')')?;
        self.cubemap = ctx.cache.resolve_cubemap(&self.faces, ctx.backend);
        Ok(())
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        let faces = ctx.cache.cubemap_faces(self.cubemap).unwrap_or(&self.faces);
        writer.keyword(self.kind().keyword());
        writer.open();
        for (i, face) in faces.iter().enumerate() {
            if i > 0 {
                writer.separator();
            }
            writer.text(face);
        }
        writer.close();
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        if ctx.pass != RenderPass::Main || self.cubemap.is_null() {
            return;
        }
        let shader = ctx.shaders.skybox;
        ctx.backend.bind_shader(shader);
        ctx.backend.set_uniform(shader, "model", Uniform::Mat4(ctx.model));
        ctx.backend.draw_skybox(self.cubemap, ctx.model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::backend::{RecordedCall, RecordingBackend};
    use crate::gfx::resources::cache::tests::CountingLoader;
    use crate::gfx::resources::ResourceCache;
    use crate::gfx::scene::{NodeId, ScriptRegistry, WindowState};

    fn load_into(class: &mut dyn NodeClass, text: &str, cache: &mut ResourceCache, backend: &mut RecordingBackend) {
        let scripts = ScriptRegistry::new();
        let mut ctx = LoadContext::new(cache, backend, &scripts);
        let mut reader = SceneReader::new(text);
        class.load(Some(&mut reader), &mut ctx).unwrap();
        assert!(reader.is_eof(), "unread input after {}", text);
    }

    fn save(class: &dyn NodeClass, cache: &ResourceCache, child_count: usize) -> String {
        let mut writer = SceneWriter::new();
        class.save(
            &mut writer,
            &SaveContext {
                cache,
                active_camera: None,
                node: NodeId::default(),
                child_count,
            },
        );
        writer.as_str().to_owned()
    }

    #[test]
    fn test_rigid_body_defaults_and_fields() {
        let body = RigidBody::default();
        assert_eq!(body.gravity, Vector3::new(0.0, -1.0, 0.0));
        assert_eq!(body.mass, 100.0);
        assert_eq!(body.friction, 0.98);

        let mut cache = ResourceCache::new(CountingLoader::default());
        let mut backend = RecordingBackend::new();
        let text = "(1,0,0,0,0.5,0,0,-9.8,0,2,0.5,0,0,0,3)";
        let mut body = RigidBody::default();
        load_into(&mut body, text, &mut cache, &mut backend);
        assert_eq!(body.angular_velocity.y, 0.5);
        assert_eq!(body.gravity.y, -9.8);
        assert_eq!(body.child_count, 3);
        assert_eq!(save(&body, &cache, 3), format!("rbody{}", text));
    }

    #[test]
    fn test_bodies_save_current_child_count() {
        let cache = ResourceCache::new(CountingLoader::default());
        let body = KinematicBody {
            velocity: Vector3::new(0.0, 0.0, -1.0),
            child_count: 0,
        };
        assert_eq!(save(&body, &cache, 2), "kbody(0,0,-1,2)");
        assert_eq!(save(&StaticBody::default(), &cache, 1), "sbody(1)");
        assert_eq!(body.declared_children(), Some(0));
        assert_eq!(Empty.declared_children(), None);
    }

    #[test]
    fn test_resource_nodes_share_cache_entries() {
        let loader = CountingLoader::default();
        let loads = loader.models.clone();
        let mut cache = ResourceCache::new(loader);
        let mut backend = RecordingBackend::new();

        let mut a = ModelNode::default();
        let mut b = ModelNode::default();
        load_into(&mut a, "(ship.obj)", &mut cache, &mut backend);
        load_into(&mut b, "(ship.obj)", &mut cache, &mut backend);
        assert_eq!(a.model, b.model);
        assert_eq!(loads.get(), 1);
        assert_eq!(save(&a, &cache, 0), "mdl(ship.obj)");
    }

    #[test]
    fn test_failed_resource_keeps_its_name() {
        let mut cache = ResourceCache::new(CountingLoader::default());
        let mut backend = RecordingBackend::new();
        let mut plane = TexturedMesh::default();
        load_into(&mut plane, "(missing.png)", &mut cache, &mut backend);
        assert!(plane.texture.is_null());
        assert_eq!(save(&plane, &cache, 0), "tp(missing.png)");
    }

    #[test]
    fn test_skybox_faces() {
        let mut cache = ResourceCache::new(CountingLoader::default());
        let mut backend = RecordingBackend::new();
        let mut sky = Skybox::default();
        let text = "(r.png,l.png,t.png,b.png,f.png,k.png)";
        load_into(&mut sky, text, &mut cache, &mut backend);
        assert!(!sky.cubemap.is_null());
        assert_eq!(save(&sky, &cache, 0), format!("sky{}", text));
    }

    #[test]
    fn test_model_draws_in_both_passes_skybox_only_in_main() {
        let mut backend = RecordingBackend::new();
        let shaders = RecordingBackend::shader_set();
        let window = WindowState::default();
        let mut model = ModelNode {
            model: ModelHandle(7),
            name: "ship.obj".to_owned(),
        };
        let mut sky = Skybox {
            cubemap: CubemapHandle(9),
            ..Default::default()
        };

        for pass in [RenderPass::Depth, RenderPass::Main] {
            let mut ctx = RenderContext::new(&mut backend, &shaders, pass, &window);
            model.render(&mut ctx);
            sky.render(&mut ctx);
        }

        let binds: Vec<_> = backend
            .calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::BindShader(shader) => Some(*shader),
                _ => None,
            })
            .collect();
        assert_eq!(binds, vec![shaders.depth, shaders.lighting, shaders.skybox]);
        let draws = backend
            .calls
            .iter()
            .filter(|call| matches!(call, RecordedCall::DrawModel(_) | RecordedCall::DrawSkybox(_)))
            .count();
        assert_eq!(draws, 3);
    }

    #[test]
    fn test_null_model_draws_nothing() {
        let mut backend = RecordingBackend::new();
        let shaders = RecordingBackend::shader_set();
        let window = WindowState::default();
        let mut ctx = RenderContext::new(&mut backend, &shaders, RenderPass::Main, &window);
        ModelNode::default().render(&mut ctx);
        assert!(backend.calls.is_empty());
    }
}
