//! The operation set every node kind implements
//!
//! [`NodeClass`] is the behaviour table of a node. Default methods are what a kind
//! inherits when it does not override them. GUI kinds embed a
//! [`Frame`](crate::ui::frame::Frame) and reuse its functions explicitly where a
//! subclass would call its parent implementation, e.g. an input area's `refresh`
//! runs the frame geometry pass, draws its text, then uploads through the frame.
//!
//! ## Usage
//!
//! Tree, serialization and render code only ever see `&dyn NodeClass`:
//!
//! ```no_run
//! use trellis::gfx::scene::{NodeKind, Payload};
//!
//! let payload = Payload::construct(NodeKind::InputArea);
//! let class = payload.as_class();
//! assert!(class.is_gui_element() && class.is_input_area());
//! assert!(class.frame().is_some());
//! ```

use super::context::{RefreshContext, RenderContext, UpdateContext};
use super::node::NodeKind;
use crate::error::SceneError;
use crate::format::{LoadContext, SaveContext, SceneReader, SceneWriter};
use crate::gfx::rendering::backend::RenderBackend;
use crate::ui::frame::Frame;
use crate::ui::interaction::InteractionState;

pub trait NodeClass {
    fn kind(&self) -> NodeKind;

    /// Reads this kind's fields; `None` keeps the constructor defaults
    fn load(
        &mut self,
        source: Option<&mut SceneReader<'_>>,
        ctx: &mut LoadContext<'_>,
    ) -> Result<(), SceneError> {
        let _ = (source, ctx);
        Ok(())
    }

    /// Writes the keyword and this kind's fields
    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        let _ = ctx;
        writer.keyword(self.kind().keyword());
    }

    fn refresh(&mut self, ctx: &mut RefreshContext<'_>) {
        let _ = ctx;
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let _ = ctx;
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let _ = ctx;
    }

    /// Releases resources this node exclusively owns
    fn free(&mut self, backend: &mut dyn RenderBackend) {
        let _ = backend;
    }

    /// Kinds whose child count is part of their fields (physics bodies)
    fn declared_children(&self) -> Option<usize> {
        None
    }

    fn is_gui_element(&self) -> bool {
        self.frame().is_some()
    }

    fn is_button(&self) -> bool {
        false
    }

    fn is_input_area(&self) -> bool {
        false
    }

    fn is_selectlist(&self) -> bool {
        false
    }

    fn is_checkbox(&self) -> bool {
        false
    }

    fn is_radiobutton(&self) -> bool {
        false
    }

    /// The shared GUI base, for kinds in the GUI family
    fn frame(&self) -> Option<&Frame> {
        None
    }

    fn frame_mut(&mut self) -> Option<&mut Frame> {
        None
    }

    /// Pointer interaction state of interactive GUI elements
    fn interaction_state(&self) -> InteractionState {
        InteractionState::Normal
    }

    /// Checked state of check boxes and radio buttons
    fn checked(&self) -> bool {
        false
    }
}
