//! Text persistence of node trees
//!
//! A scene file is a whitespace-separated sequence of nodes. Each node is
//!
//! ```text
//! keyword [ (fields) ] [ {px,py,pz;rx,ry,rz;sx,sy,sz} ] [ @script ] [ :N ]
//! ```
//!
//! followed by its children. The field grammar belongs to the node kind (see each
//! kind's `load`). The transform is only written for non-GUI nodes and only when
//! it differs from the identity. Physics bodies carry their child count inside
//! their fields; every other kind with children writes `:N`.
//!
//! ## Usage
//!
//! ```no_run
//! use trellis::format::{read_scene, write_scene, LoadContext};
//! use trellis::gfx::rendering::backend::RecordingBackend;
//! use trellis::gfx::resources::{DiskLoader, ResourceCache};
//! use trellis::gfx::scene::{ScriptRegistry, SceneTree};
//!
//! let mut cache = ResourceCache::new(DiskLoader::new("assets"));
//! let mut backend = RecordingBackend::new();
//! let scripts = ScriptRegistry::new();
//! let mut tree = SceneTree::new();
//!
//! let mut ctx = LoadContext::new(&mut cache, &mut backend, &scripts);
//! let camera = read_scene("camera(1){0,1,5;0,0,0;1,1,1}", &mut tree, &mut ctx).unwrap();
//! let text = write_scene(&tree, &cache, camera);
//! assert!(text.starts_with("camera(1)"));
//! ```

mod reader;
mod writer;

use std::{cell::Cell, collections::HashMap, rc::Rc};

use log::debug;

pub use reader::{SceneReader, FIELD_DELIMITERS, FIELD_ESCAPE};
pub use writer::SceneWriter;

use crate::error::SceneError;
use crate::gfx::rendering::backend::RenderBackend;
use crate::gfx::resources::ResourceCache;
use crate::gfx::scene::{Node, NodeId, NodeKind, Payload, SceneTree, ScriptRegistry, Transform};

/// Services and shared state available while nodes read their fields
pub struct LoadContext<'a> {
    pub cache: &'a mut ResourceCache,
    pub backend: &'a mut dyn RenderBackend,
    pub scripts: &'a ScriptRegistry,
    radio_groups: HashMap<String, Rc<Cell<u32>>>,
    camera_claim: bool,
    active_camera: Option<NodeId>,
}

impl<'a> LoadContext<'a> {
    pub fn new(
        cache: &'a mut ResourceCache,
        backend: &'a mut dyn RenderBackend,
        scripts: &'a ScriptRegistry,
    ) -> Self {
        Self {
            cache,
            backend,
            scripts,
            radio_groups: HashMap::new(),
            camera_claim: false,
            active_camera: None,
        }
    }

    /// Shared mask of the radio group `name`, created on first use
    pub fn radio_group(&mut self, name: &str) -> Rc<Cell<u32>> {
        self.radio_groups
            .entry(name.to_owned())
            .or_insert_with(|| Rc::new(Cell::new(0)))
            .clone()
    }

    /// Marks the node being loaded as the active camera
    pub fn claim_active_camera(&mut self) {
        self.camera_claim = true;
    }

    fn take_camera_claim(&mut self) -> bool {
        std::mem::take(&mut self.camera_claim)
    }

    /// Last camera that claimed to be active
    pub fn active_camera(&self) -> Option<NodeId> {
        self.active_camera
    }
}

/// What a node needs to know while writing its fields
pub struct SaveContext<'a> {
    pub cache: &'a ResourceCache,
    pub active_camera: Option<NodeId>,
    /// The node being written
    pub node: NodeId,
    /// Number of children the node currently has
    pub child_count: usize,
}

/// Reads every node in `text` as children of the tree root
///
/// Returns the active camera, if a camera claimed it.
pub fn read_scene(
    text: &str,
    tree: &mut SceneTree,
    ctx: &mut LoadContext<'_>,
) -> Result<Option<NodeId>, SceneError> {
    let mut reader = SceneReader::new(text);
    let root = tree.root();
    loop {
        reader.skip_whitespace();
        if reader.is_eof() {
            break;
        }
        read_node(&mut reader, tree, root, ctx)?;
    }
    debug!("Loaded {} nodes", tree.len() - 1);
    Ok(ctx.active_camera)
}

/// Reads one node and its children under `parent`
pub fn read_node(
    reader: &mut SceneReader<'_>,
    tree: &mut SceneTree,
    parent: NodeId,
    ctx: &mut LoadContext<'_>,
) -> Result<NodeId, SceneError> {
    reader.skip_whitespace();
    let offset = reader.offset();
    let keyword = reader.keyword()?;
    let kind = NodeKind::from_keyword(keyword).ok_or_else(|| SceneError::UnknownKeyword {
        keyword: keyword.to_owned(),
        offset,
    })?;

    let mut payload = Payload::construct(kind);
    payload.as_class_mut().load(Some(reader), ctx)?;
    let declared = payload.as_class().declared_children();
    let is_gui = payload.as_class().is_gui_element();
    let id = tree.spawn(parent, payload);
    if ctx.take_camera_claim() {
        ctx.active_camera = Some(id);
    }

    if !is_gui && reader.peek() == Some('{') {
        let local = reader.transform()?;
        if let Some(node) = tree.get_mut(id) {
            node.local = local;
        }
    }
    if reader.eat('@') {
        let name = reader.identifier();
        let binding = ctx.scripts.bind(name);
        if let Some(node) = tree.get_mut(id) {
            node.script = binding;
        }
    }

    let child_count = match declared {
        Some(count) => count,
        None if reader.eat(':') => reader.unsigned()?,
        None => 0,
    };
    for _ in 0..child_count {
        read_node(reader, tree, id, ctx)?;
    }
    Ok(id)
}

/// Writes every child of the tree root
pub fn write_scene(tree: &SceneTree, cache: &ResourceCache, active_camera: Option<NodeId>) -> String {
    let mut writer = SceneWriter::new();
    for child in tree.children(tree.root()) {
        write_node(&mut writer, tree, *child, cache, active_camera, 0);
    }
    writer.finish()
}

pub fn write_node(
    writer: &mut SceneWriter,
    tree: &SceneTree,
    id: NodeId,
    cache: &ResourceCache,
    active_camera: Option<NodeId>,
    depth: usize,
) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let children = node.children();
    let ctx = SaveContext {
        cache,
        active_camera,
        node: id,
        child_count: children.len(),
    };

    writer.begin_node(depth);
    let class = node.class();
    class.save(writer, &ctx);
    write_tail(writer, node, class.declared_children().is_some());

    for child in children {
        write_node(writer, tree, *child, cache, active_camera, depth + 1);
    }
}

fn write_tail(writer: &mut SceneWriter, node: &Node, counts_in_fields: bool) {
    if !node.is_gui_element() && node.local != Transform::default() {
        writer.transform(&node.local);
    }
    if let Some(script) = &node.script {
        writer.ch('@');
        writer.text(&script.name);
    }
    if !counts_in_fields && !node.children().is_empty() {
        writer.ch(':');
        writer.integer(node.children().len() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::backend::RecordingBackend;
    use crate::gfx::resources::cache::tests::CountingLoader;
    use crate::gfx::scene::{ScriptParam, UpdateContext};
    use crate::ui::frame::{Frame, Overflow, Unit};

    fn load(text: &str) -> Result<(SceneTree, ResourceCache, Option<NodeId>), SceneError> {
        let mut cache = ResourceCache::new(CountingLoader::default());
        let mut backend = RecordingBackend::new();
        let scripts = ScriptRegistry::new();
        let mut tree = SceneTree::new();
        let camera = {
            let mut ctx = LoadContext::new(&mut cache, &mut backend, &scripts);
            read_scene(text, &mut tree, &mut ctx)?
        };
        Ok((tree, cache, camera))
    }

    #[test]
    fn test_reads_nested_nodes_with_counts() {
        let text = "empty:2\n  camera(1){0,1,5;0,0,0;1,1,1}\n  sbody(1)\n    cbox\nm";
        let (tree, _, camera) = load(text).unwrap();
        let top = tree.children(tree.root());
        assert_eq!(top.len(), 2);

        let empty = top[0];
        let inner = tree.children(empty);
        assert_eq!(tree.get(inner[0]).unwrap().kind(), NodeKind::Camera);
        assert_eq!(camera, Some(inner[0]));
        assert_eq!(tree.get(inner[0]).unwrap().local.position.z, 5.0);

        let body = inner[1];
        assert_eq!(tree.get(body).unwrap().kind(), NodeKind::StaticBody);
        assert_eq!(tree.get(tree.children(body)[0]).unwrap().kind(), NodeKind::BoxShape);
        assert_eq!(tree.get(top[1]).unwrap().kind(), NodeKind::Mesh);
    }

    #[test]
    fn test_write_matches_read() {
        let text = "empty:2\n  camera(1){0,1,5;0,0,0;1,1,1}\n  sbody(1)\n    cbox\nm\n";
        let (tree, cache, camera) = load(text).unwrap();
        assert_eq!(write_scene(&tree, &cache, camera), text);
    }

    #[test]
    fn test_frame_fields() {
        let text = "frame(10p,5%,50w,20h,rbs,[skin.png,font.ttf,18,#ff0000ff]):1\n  inputarea(Your name,cc)\n";
        let (tree, cache, _) = load(text).unwrap();
        let frame_id = tree.children(tree.root())[0];
        let frame = tree.get(frame_id).and_then(Node::frame).unwrap();
        assert_eq!(frame.rel_pos[0].unit, Unit::Pixel);
        assert_eq!(frame.rel_scale[1].value, 20.0);
        assert_eq!(frame.alignment.chars(), ['r', 'b']);
        assert_eq!(frame.overflow, Overflow::Scroll);
        assert!(frame.background);
        let theme = frame.theme.owned().unwrap();
        assert_eq!(theme.font_size, 18);
        assert_eq!(theme.skin_name, "skin.png");
        assert!(!theme.skin.is_null());

        let input = tree.children(frame_id)[0];
        assert!(tree.get(input).unwrap().class().is_input_area());
        assert_eq!(write_scene(&tree, &cache, None), text);
    }

    #[test]
    fn test_gui_nodes_never_write_transforms() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let id = tree.spawn(root, Frame::default());
        tree.get_mut(id).unwrap().local.position.x = 0.5;
        let cache = ResourceCache::new(CountingLoader::default());
        assert_eq!(write_scene(&tree, &cache, None), "frame(0p,0p,100%,100%,ltn)\n");
    }

    #[test]
    fn test_unknown_keyword_is_an_error() {
        let err = load("empty\nwidget(1)").err().unwrap();
        assert!(matches!(err, SceneError::UnknownKeyword { ref keyword, offset: 6 } if keyword == "widget"));
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        assert!(matches!(load("frame(10p,5%"), Err(SceneError::UnexpectedEof { .. })));
        assert!(matches!(load("empty:3 m"), Err(SceneError::UnexpectedEof { .. })));
        assert!(matches!(load("frame(10p,5%,1%,1%,xxn)"), Err(SceneError::InvalidAlignment { found: 'x', .. })));
    }

    #[test]
    fn test_out_of_range_counts_are_errors() {
        let err = load("frame(0p,0p,1%,1%,ltn,[skin.png,ui.ttf,-1,#FFFFFFFF])").err().unwrap();
        assert!(matches!(err, SceneError::InvalidNumber { ref text, offset: 39 } if text == "-1"));
        assert!(matches!(
            load("frame(0p,0p,1%,1%,ltn,[skin.png,ui.ttf,99999999999,#FFFFFFFF])"),
            Err(SceneError::InvalidNumber { .. })
        ));
        assert!(matches!(load("empty:-2"), Err(SceneError::InvalidNumber { offset: 6, .. })));
    }

    fn spin(tree: &mut SceneTree, id: NodeId, _ctx: &mut UpdateContext<'_>) {
        if let Some(script) = tree.get_mut(id).and_then(|n| n.script.as_mut()) {
            script.ensure_params(1)[0] = ScriptParam::Int(1);
        }
    }

    #[test]
    fn test_script_binding_round_trip() {
        let mut cache = ResourceCache::new(CountingLoader::default());
        let mut backend = RecordingBackend::new();
        let mut scripts = ScriptRegistry::new();
        scripts.register("spin", spin);
        let mut tree = SceneTree::new();
        let text = "mdl(ship.obj){0,0,-3;0,0,0;1,1,1}@spin\n";
        let mut ctx = LoadContext::new(&mut cache, &mut backend, &scripts);
        read_scene(text, &mut tree, &mut ctx).unwrap();

        let id = tree.children(tree.root())[0];
        assert_eq!(tree.get(id).unwrap().script.as_ref().unwrap().name, "spin");
        assert_eq!(write_scene(&tree, &cache, None), text);
    }

    #[test]
    fn test_radio_groups_are_shared_by_name() {
        let text = "frame(0p,0p,100%,100%,ltn):2\n  radiobutton(Low,lc,quality,1,0)\n  radiobutton(High,lc,quality,2,1)\n";
        let (tree, cache, _) = load(text).unwrap();
        let frame = tree.children(tree.root())[0];
        let low = tree.children(frame)[0];
        let high = tree.children(frame)[1];
        assert!(!tree.get(low).unwrap().class().checked());
        assert!(tree.get(high).unwrap().class().checked());
        assert_eq!(write_scene(&tree, &cache, None), text);
    }
}
