//! Closed set of node payloads

use super::class::NodeClass;
use super::node::NodeKind;
use super::objects::{
    CollisionShape, Empty, KinematicBody, ModelNode, Msaa, RigidBody, ScreenMesh, ShapeKind,
    Skybox, StaticBody, TextureNode, TexturedMesh, Viewport,
};
use crate::gfx::camera::Camera;
use crate::ui::{
    button::{Button, CheckBox, RadioButton},
    frame::Frame,
    input_area::InputArea,
    select_list::SelectList,
};

macro_rules! payloads {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// Kind-specific data owned by a node
        pub enum Payload {
            $($variant($ty),)*
        }

        impl Payload {
            pub fn as_class(&self) -> &dyn NodeClass {
                match self {
                    $(Payload::$variant(inner) => inner,)*
                }
            }

            pub fn as_class_mut(&mut self) -> &mut dyn NodeClass {
                match self {
                    $(Payload::$variant(inner) => inner,)*
                }
            }
        }

        $(
            impl From<$ty> for Payload {
                fn from(inner: $ty) -> Self {
                    Payload::$variant(inner)
                }
            }
        )*
    };
}

payloads! {
    Empty(Empty),
    Camera(Camera),
    StaticBody(StaticBody),
    RigidBody(RigidBody),
    KinematicBody(KinematicBody),
    CollisionShape(CollisionShape),
    Mesh(ScreenMesh),
    Model(ModelNode),
    TexturedMesh(TexturedMesh),
    Skybox(Skybox),
    Texture(TextureNode),
    Viewport(Viewport),
    Msaa(Msaa),
    Frame(Frame),
    InputArea(InputArea),
    Button(Button),
    CheckBox(CheckBox),
    RadioButton(RadioButton),
    SelectList(SelectList),
}

impl Payload {
    /// Allocates the payload for `kind` with the defaults a sourceless load applies
    pub fn construct(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Empty => Empty.into(),
            NodeKind::Camera => Camera::default().into(),
            NodeKind::StaticBody => StaticBody::default().into(),
            NodeKind::RigidBody => RigidBody::default().into(),
            NodeKind::KinematicBody => KinematicBody::default().into(),
            NodeKind::BoxShape => CollisionShape::new(ShapeKind::Box).into(),
            NodeKind::PlaneShape => CollisionShape::new(ShapeKind::Plane).into(),
            NodeKind::SphereShape => CollisionShape::new(ShapeKind::Sphere).into(),
            NodeKind::Mesh => ScreenMesh.into(),
            NodeKind::Model => ModelNode::default().into(),
            NodeKind::TexturedMesh => TexturedMesh::default().into(),
            NodeKind::Skybox => Skybox::default().into(),
            NodeKind::Texture => TextureNode::default().into(),
            NodeKind::Viewport => Viewport.into(),
            NodeKind::Msaa => Msaa.into(),
            NodeKind::Frame => Frame::default().into(),
            NodeKind::InputArea => InputArea::default().into(),
            NodeKind::Button => Button::default().into(),
            NodeKind::CheckBox => CheckBox::default().into(),
            NodeKind::RadioButton => RadioButton::default().into(),
            NodeKind::SelectList => SelectList::default().into(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.as_class().kind()
    }
}
