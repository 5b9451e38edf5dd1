//! Scene node record
//!
//! A [`Node`] carries its transform, flags, optional script binding and a
//! [`Payload`] whose variant decides the node's behaviour. The kind tag is derived
//! from the payload, so the two can never disagree.

use cgmath::{ElementWise, Matrix4, Rad, Vector3, Zero};
use slotmap::new_key_type;

use super::{class::NodeClass, payload::Payload, script::ScriptBinding};
use crate::ui::frame::Frame;

new_key_type! {
    /// Stable identifier of a node inside a [`super::tree::SceneTree`]
    pub struct NodeId;
}

/// Type tag of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Empty,
    Camera,
    StaticBody,
    RigidBody,
    KinematicBody,
    BoxShape,
    PlaneShape,
    SphereShape,
    Mesh,
    Model,
    TexturedMesh,
    Skybox,
    Texture,
    Viewport,
    Msaa,
    Frame,
    InputArea,
    Button,
    CheckBox,
    RadioButton,
    SelectList,
}

impl NodeKind {
    pub const ALL: [NodeKind; 21] = [
        NodeKind::Empty,
        NodeKind::Camera,
        NodeKind::StaticBody,
        NodeKind::RigidBody,
        NodeKind::KinematicBody,
        NodeKind::BoxShape,
        NodeKind::PlaneShape,
        NodeKind::SphereShape,
        NodeKind::Mesh,
        NodeKind::Model,
        NodeKind::TexturedMesh,
        NodeKind::Skybox,
        NodeKind::Texture,
        NodeKind::Viewport,
        NodeKind::Msaa,
        NodeKind::Frame,
        NodeKind::InputArea,
        NodeKind::Button,
        NodeKind::CheckBox,
        NodeKind::RadioButton,
        NodeKind::SelectList,
    ];

    /// Keyword used in scene files
    pub fn keyword(self) -> &'static str {
        match self {
            NodeKind::Empty => "empty",
            NodeKind::Camera => "camera",
            NodeKind::StaticBody => "sbody",
            NodeKind::RigidBody => "rbody",
            NodeKind::KinematicBody => "kbody",
            NodeKind::BoxShape => "cbox",
            NodeKind::PlaneShape => "cplane",
            NodeKind::SphereShape => "csphere",
            NodeKind::Mesh => "m",
            NodeKind::Model => "mdl",
            NodeKind::TexturedMesh => "tp",
            NodeKind::Skybox => "sky",
            NodeKind::Texture => "tex",
            NodeKind::Viewport => "v",
            NodeKind::Msaa => "msaa",
            NodeKind::Frame => "frame",
            NodeKind::InputArea => "inputarea",
            NodeKind::Button => "button",
            NodeKind::CheckBox => "checkbox",
            NodeKind::RadioButton => "radiobutton",
            NodeKind::SelectList => "selectlist",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == keyword)
    }
}

/// Position, Euler rotation in radians, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Vector3::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_position(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Translation * rotation (Z, Y, X) * scale
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Accumulates this local transform onto a parent's global one
    pub fn combine(&self, parent: &Transform) -> Transform {
        Transform {
            position: parent.position + self.position,
            rotation: parent.rotation + self.rotation,
            scale: parent.scale.mul_element_wise(self.scale),
        }
    }
}

/// Per-node switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeFlags {
    /// Inactive nodes and their subtrees are skipped by the update pass
    pub active: bool,
    /// Invisible nodes and their subtrees are skipped by refresh and render
    pub visible: bool,
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self {
            active: true,
            visible: true,
        }
    }
}

/// Generic scene-graph element
pub struct Node {
    pub local: Transform,
    pub global: Transform,
    pub flags: NodeFlags,
    pub script: Option<ScriptBinding>,
    pub(crate) payload: Payload,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn new(payload: impl Into<Payload>) -> Self {
        Self {
            local: Transform::default(),
            global: Transform::default(),
            flags: NodeFlags::default(),
            script: None,
            payload: payload.into(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    pub fn class(&self) -> &dyn NodeClass {
        self.payload.as_class()
    }

    pub fn class_mut(&mut self) -> &mut dyn NodeClass {
        self.payload.as_class_mut()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_script(&self) -> bool {
        self.script.is_some()
    }

    pub fn is_gui_element(&self) -> bool {
        self.class().is_gui_element()
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.class().frame()
    }

    pub fn frame_mut(&mut self) -> Option<&mut Frame> {
        self.class_mut().frame_mut()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("local", &self.local)
            .field("flags", &self.flags)
            .field("script", &self.script.as_ref().map(|s| s.name.as_str()))
            .field("children", &self.children.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_unique_and_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(NodeKind::from_keyword("nope"), None);
    }

    #[test]
    fn test_kind_follows_payload() {
        let mut node = Node::new(Payload::construct(NodeKind::Camera));
        assert_eq!(node.kind(), NodeKind::Camera);
        *node.payload_mut() = Payload::construct(NodeKind::InputArea);
        assert_eq!(node.kind(), NodeKind::InputArea);
        assert!(node.is_gui_element());
    }

    #[test]
    fn test_transform_combine() {
        let parent = Transform {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: Vector3::zero(),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let child = Transform::from_position(Vector3::new(1.0, 0.0, 0.0));
        let global = child.combine(&parent);
        assert_eq!(global.position, Vector3::new(2.0, 2.0, 3.0));
        assert_eq!(global.scale, Vector3::new(2.0, 2.0, 2.0));
    }
}
