//! Arena-backed node tree
//!
//! Nodes live in a [`SlotMap`] and refer to each other by [`NodeId`]. A parent
//! owns its children through its id list; the child's parent id is a lookup only.
//! Freeing a subtree removes every node under it from the arena, children first,
//! and releases the GPU resources each payload owns.
//!
//! ## Usage
//!
//! ```no_run
//! use trellis::gfx::scene::{NodeKind, Payload, SceneTree};
//!
//! let mut tree = SceneTree::new();
//! let root = tree.root();
//! let panel = tree.spawn(root, Payload::construct(NodeKind::Frame));
//! let field = tree.spawn(panel, Payload::construct(NodeKind::InputArea));
//! assert_eq!(tree.parent(field), Some(panel));
//! ```

use cgmath::Vector3;
use log::debug;
use slotmap::SlotMap;

use super::context::{RefreshContext, WindowState};
use super::node::{Node, NodeId};
use super::objects::Empty;
use super::payload::Payload;
use crate::error::TreeError;
use crate::gfx::rendering::backend::RenderBackend;
use crate::ui::frame::Frame;

pub struct SceneTree {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    /// Creates a tree holding a single empty root
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new(Empty));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Inserts a detached node
    pub fn insert(&mut self, node: Node) -> NodeId {
        self.nodes.insert(node)
    }

    /// Inserts `payload` as a new last child of `parent`
    pub fn spawn(&mut self, parent: NodeId, payload: impl Into<Payload>) -> NodeId {
        let id = self.nodes.insert(Node::new(payload));
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
            if let Some(node) = self.nodes.get_mut(id) {
                node.parent = Some(parent);
            }
        }
        id
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// True when `ancestor` is `id` or lies on its parent chain
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Appends `child` to `parent`, detaching it from any previous parent
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.contains(parent) || !self.contains(child) {
            return Err(TreeError::UnknownNode);
        }
        if self.is_ancestor(child, parent) {
            return Err(TreeError::WouldCycle);
        }

        if let Some(old_parent) = self.parent(child) {
            self.remove_child(old_parent, child);
        }
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(child);
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
        }
        Ok(())
    }

    /// Detaches `child` from `parent`; the subtree stays in the arena
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return false;
        };
        let before = parent_node.children.len();
        parent_node.children.retain(|id| *id != child);
        if parent_node.children.len() == before {
            return false;
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
        }
        true
    }

    /// Detaches `child` from `parent` and frees its whole subtree
    pub fn remove_child_and_free(
        &mut self,
        parent: NodeId,
        child: NodeId,
        backend: &mut dyn RenderBackend,
    ) -> bool {
        if !self.remove_child(parent, child) {
            return false;
        }
        self.free_subtree(child, backend);
        true
    }

    /// Frees `id` and everything below it, children before parents
    ///
    /// The root itself is never removed; freeing it empties the tree.
    pub fn free_subtree(&mut self, id: NodeId, backend: &mut dyn RenderBackend) {
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id);
        }

        let order = self.descendants(id);
        for node_id in order.into_iter().rev() {
            if node_id == self.root {
                if let Some(root) = self.nodes.get_mut(node_id) {
                    root.children.clear();
                }
                continue;
            }
            if let Some(mut node) = self.nodes.remove(node_id) {
                node.class_mut().free(backend);
            }
        }
    }

    /// Frees every node except the root
    pub fn clear(&mut self, backend: &mut dyn RenderBackend) {
        let root = self.root;
        self.free_subtree(root, backend);
    }

    /// Pre-order list of `id` and all its descendants
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            order.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Sets needs-refresh on every GUI element in the subtree
    pub fn mark_gui_subtree_dirty(&mut self, id: NodeId) {
        for node_id in self.descendants(id) {
            if let Some(frame) = self.nodes.get_mut(node_id).and_then(Node::frame_mut) {
                frame.needs_refresh = true;
            }
        }
    }

    /// Runs `refresh` on one node with its parent's GUI geometry
    ///
    /// Afterwards the node's extent is folded into the parent's content size and
    /// every GUI child is marked for refresh.
    pub fn refresh_node(
        &mut self,
        id: NodeId,
        window: &WindowState,
        backend: &mut dyn RenderBackend,
    ) {
        let parent_id = self.parent(id);
        let parent_frame = parent_id
            .and_then(|parent| self.nodes.get(parent))
            .and_then(Node::frame)
            .map(Frame::as_parent);

        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let mut ctx = RefreshContext {
            window,
            parent: parent_frame.as_ref(),
            backend,
            extent: None,
        };
        node.class_mut().refresh(&mut ctx);
        let extent = ctx.extent;

        if let Some((pos, scale)) = node.frame().map(|frame| (frame.ndc_pos, frame.ndc_scale)) {
            node.local.position = Vector3::new(pos[0], pos[1], 0.0);
            node.local.scale = Vector3::new(scale[0], scale[1], 1.0);
        }
        let children = node.children.clone();

        if let (Some(parent), Some(extent)) = (parent_id, extent) {
            if let Some(frame) = self.nodes.get_mut(parent).and_then(Node::frame_mut) {
                frame.fold_content_extent(extent);
            }
        }
        for child in children {
            if let Some(frame) = self.nodes.get_mut(child).and_then(Node::frame_mut) {
                frame.needs_refresh = true;
            }
        }
    }

    /// Logs the tree structure at debug level
    pub fn print_tree(&self) {
        self.print_node(self.root, 0);
    }

    fn print_node(&self, id: NodeId, level: usize) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let script = node
            .script
            .as_ref()
            .map(|s| format!(" @{}", s.name))
            .unwrap_or_default();
        debug!(
            "{}{}{} ({} children)",
            "  ".repeat(level),
            node.kind().keyword(),
            script,
            node.children.len()
        );
        for child in &node.children {
            self.print_node(*child, level + 1);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::backend::{RecordedCall, RecordingBackend};
    use crate::gfx::scene::node::NodeKind;
    use crate::ui::frame::{Length, Unit};

    #[test]
    fn test_add_and_remove_child() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Payload::construct(NodeKind::Empty));
        let b = tree.insert(Node::new(Empty));

        tree.add_child(a, b).unwrap();
        assert_eq!(tree.parent(b), Some(a));
        assert_eq!(tree.children(a), &[b]);

        assert!(tree.remove_child(a, b));
        assert_eq!(tree.parent(b), None);
        assert!(tree.contains(b));
        assert!(!tree.remove_child(a, b));
    }

    #[test]
    fn test_reparenting_detaches_from_old_parent() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Empty);
        let b = tree.spawn(root, Empty);
        let c = tree.spawn(a, Empty);

        tree.add_child(b, c).unwrap();
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[c]);
    }

    #[test]
    fn test_cycles_rejected() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Empty);
        let b = tree.spawn(a, Empty);
        assert_eq!(tree.add_child(b, a), Err(TreeError::WouldCycle));
        assert_eq!(tree.add_child(a, a), Err(TreeError::WouldCycle));
    }

    #[test]
    fn test_free_cascades_and_releases_content() {
        let mut tree = SceneTree::new();
        let mut backend = RecordingBackend::new();
        let window = WindowState::new(800, 600);
        let root = tree.root();
        let panel = tree.spawn(root, Payload::construct(NodeKind::Frame));
        let field = tree.spawn(panel, Payload::construct(NodeKind::InputArea));
        let leaf = tree.spawn(field, Empty);

        tree.refresh_node(panel, &window, &mut backend);
        tree.refresh_node(field, &window, &mut backend);
        let content = tree.get(field).and_then(Node::frame).map(|f| f.content_texture);
        let content = content.expect("input area has a frame");
        assert!(!content.is_null());

        assert!(tree.remove_child_and_free(root, panel, &mut backend));
        assert!(!tree.contains(panel) && !tree.contains(field) && !tree.contains(leaf));
        assert_eq!(tree.len(), 1);
        assert!(backend
            .calls
            .contains(&RecordedCall::DeleteTexture(content)));
    }

    #[test]
    fn test_descendants_pre_order() {
        let mut tree = SceneTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Empty);
        let a1 = tree.spawn(a, Empty);
        let b = tree.spawn(root, Empty);
        assert_eq!(tree.descendants(root), vec![root, a, a1, b]);
    }

    #[test]
    fn test_refresh_marks_gui_children_dirty() {
        let mut tree = SceneTree::new();
        let mut backend = RecordingBackend::new();
        let window = WindowState::new(800, 600);
        let root = tree.root();
        let outer = tree.spawn(root, Frame::default());
        let inner = tree.spawn(outer, Frame::default());

        if let Some(frame) = tree.get_mut(inner).and_then(Node::frame_mut) {
            frame.needs_refresh = false;
        }
        tree.refresh_node(outer, &window, &mut backend);

        assert!(!tree.get(outer).and_then(Node::frame).unwrap().needs_refresh);
        assert!(tree.get(inner).and_then(Node::frame).unwrap().needs_refresh);
    }

    #[test]
    fn test_refresh_folds_child_extent_into_parent() {
        let mut tree = SceneTree::new();
        let mut backend = RecordingBackend::new();
        let window = WindowState::new(800, 600);
        let root = tree.root();
        let list = tree.spawn(root, Frame::default());
        let mut tall = Frame::default();
        tall.rel_scale = [Length::new(100.0, Unit::Percent), Length::new(300.0, Unit::Percent)];
        let item = tree.spawn(list, tall);

        tree.refresh_node(list, &window, &mut backend);
        tree.refresh_node(item, &window, &mut backend);

        let content = tree.get(list).and_then(Node::frame).unwrap().content_size;
        // scale 3.0 at the top edge reaches 3.0 - (1.0 - 3.0) = 5.0
        assert!((content[1] - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_refresh_copies_ndc_box_into_local_transform() {
        let mut tree = SceneTree::new();
        let mut backend = RecordingBackend::new();
        let window = WindowState::new(800, 600);
        let root = tree.root();
        let mut half = Frame::default();
        half.rel_scale = [Length::new(50.0, Unit::Percent), Length::new(25.0, Unit::Percent)];
        let panel = tree.spawn(root, half);

        tree.refresh_node(panel, &window, &mut backend);

        let node = tree.get(panel).unwrap();
        let frame = node.frame().unwrap();
        assert_eq!(node.local.position.x, frame.ndc_pos[0]);
        assert_eq!(node.local.position.y, frame.ndc_pos[1]);
        assert_eq!(node.local.scale.x, 0.5);
        assert_eq!(node.local.scale.y, 0.25);
        assert_eq!(node.local.scale.z, 1.0);
    }
}
