//! Push buttons, check boxes and radio buttons
//!
//! All three share [`Button`]: a frame filling its parent, a label drawn into the
//! content surface and the hover/press machine of [`step_button`]. Check boxes and
//! radio buttons keep their checked state in shared cells so several widgets, or
//! game code, can observe the same value.

use std::{cell::Cell, rc::Rc};

use super::frame::{read_alignment, read_theme_tail, render_gui_element, write_alignment, write_theme_tail, Frame};
use super::interaction::{step_button, InteractionState};
use crate::error::SceneError;
use crate::format::{LoadContext, SaveContext, SceneReader, SceneWriter};
use crate::gfx::rendering::backend::RenderBackend;
use crate::gfx::scene::{NodeClass, NodeKind, RefreshContext, RenderContext, UpdateContext};

#[derive(Debug, Clone)]
pub struct Button {
    pub frame: Frame,
    pub label: String,
    pub state: InteractionState,
    clicked: bool,
}

impl Default for Button {
    fn default() -> Self {
        Self {
            frame: Frame {
                background: true,
                ..Frame::filling()
            },
            label: String::new(),
            state: InteractionState::Normal,
            clicked: false,
        }
    }
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// True once after each click
    pub fn take_clicked(&mut self) -> bool {
        std::mem::take(&mut self.clicked)
    }

    /// Runs the interaction machine; returns whether this frame completed a click
    fn step(&mut self, ctx: &mut UpdateContext<'_>) -> bool {
        let inside = self.frame.contains_point(ctx.input.pointer);
        let step = step_button(self.state, inside, ctx.input);
        self.state = step.state;
        if step.clicked {
            self.clicked = true;
        }
        if ctx.window.resized {
            self.frame.needs_refresh = true;
        }
        step.clicked
    }

    /// Reads `label,hv`
    fn read_head(&mut self, source: &mut SceneReader<'_>) -> Result<(), SceneError> {
        self.label = source.field();
        source.expect(',')?;
        self.frame.alignment = read_alignment(source)?;
        Ok(())
    }

    fn write_head(&self, writer: &mut SceneWriter) {
        writer.text(&self.label);
        writer.separator();
        write_alignment(writer, self.frame.alignment);
    }

    fn refresh_label(&mut self, ctx: &mut RefreshContext<'_>) {
        self.frame.refresh_geometry(ctx);
        let label = self.label.clone();
        self.frame.draw_label(&label, 1.0);
        self.frame.upload_content(ctx.backend);
    }
}

impl NodeClass for Button {
    fn kind(&self) -> NodeKind {
        NodeKind::Button
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
        self.read_head(source)?;
        self.frame.theme = read_theme_tail(source, ctx)?;
        source.expect(')')
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        writer.keyword(self.kind().keyword());
        writer.open();
        self.write_head(writer);
        write_theme_tail(writer, &self.frame.theme, ctx.cache);
        writer.close();
    }

    fn refresh(&mut self, ctx: &mut RefreshContext<'_>) {
        self.refresh_label(ctx);
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.step(ctx);
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        render_gui_element(self, ctx);
    }

    fn free(&mut self, backend: &mut dyn RenderBackend) {
        self.frame.release(backend);
    }

    fn is_button(&self) -> bool {
        true
    }

    fn frame(&self) -> Option<&Frame> {
        Some(&self.frame)
    }

    fn frame_mut(&mut self) -> Option<&mut Frame> {
        Some(&mut self.frame)
    }

    fn interaction_state(&self) -> InteractionState {
        self.state
    }
}

/// Button whose click toggles a shared flag
#[derive(Debug, Clone, Default)]
pub struct CheckBox {
    pub button: Button,
    pub checked: Rc<Cell<bool>>,
}

impl CheckBox {
    pub fn new(label: impl Into<String>, checked: Rc<Cell<bool>>) -> Self {
        Self {
            button: Button::new(label),
            checked,
        }
    }
}

impl NodeClass for CheckBox {
    fn kind(&self) -> NodeKind {
        NodeKind::CheckBox
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
        self.button.read_head(source)?;
        source.expect(',')?;
        self.checked.set(source.integer()? != 0);
        self.button.frame.theme = read_theme_tail(source, ctx)?;
        source.expect(')')
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        writer.keyword(self.kind().keyword());
        writer.open();
        self.button.write_head(writer);
        writer.separator();
        writer.integer(i64::from(self.checked.get()));
        write_theme_tail(writer, &self.button.frame.theme, ctx.cache);
        writer.close();
    }

    fn refresh(&mut self, ctx: &mut RefreshContext<'_>) {
        self.button.refresh_label(ctx);
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        if self.button.step(ctx) {
            self.checked.set(!self.checked.get());
        }
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        render_gui_element(self, ctx);
    }

    fn free(&mut self, backend: &mut dyn RenderBackend) {
        self.button.frame.release(backend);
    }

    fn is_button(&self) -> bool {
        true
    }

    fn is_checkbox(&self) -> bool {
        true
    }

    fn frame(&self) -> Option<&Frame> {
        Some(&self.button.frame)
    }

    fn frame_mut(&mut self) -> Option<&mut Frame> {
        Some(&mut self.button.frame)
    }

    fn interaction_state(&self) -> InteractionState {
        self.button.state
    }

    fn checked(&self) -> bool {
        self.checked.get()
    }
}

/// Button that selects its `id` bit in a group mask shared with its siblings
#[derive(Debug, Clone)]
pub struct RadioButton {
    pub button: Button,
    pub group_name: String,
    pub group: Rc<Cell<u32>>,
    pub id: u32,
}

impl Default for RadioButton {
    fn default() -> Self {
        Self {
            button: Button::default(),
            group_name: String::new(),
            group: Rc::new(Cell::new(0)),
            id: 1,
        }
    }
}

impl RadioButton {
    pub fn new(label: impl Into<String>, group_name: impl Into<String>, group: Rc<Cell<u32>>, id: u32) -> Self {
        Self {
            button: Button::new(label),
            group_name: group_name.into(),
            group,
            id,
        }
    }

    pub fn is_selected(&self) -> bool {
        self.group.get() & self.id != 0
    }
}

impl NodeClass for RadioButton {
    fn kind(&self) -> NodeKind {
        NodeKind::RadioButton
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
        self.button.read_head(source)?;
        source.expect(',')?;
        self.group_name = source.field();
        self.group = ctx.radio_group(&self.group_name);
        source.expect(',')?;
        self.id = source.unsigned()?;
        source.expect(',')?;
        if source.integer()? != 0 {
            self.group.set(self.id);
        }
        self.button.frame.theme = read_theme_tail(source, ctx)?;
        source.expect(')')
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        writer.keyword(self.kind().keyword());
        writer.open();
        self.button.write_head(writer);
        writer.separator();
        writer.text(&self.group_name);
        writer.separator();
        writer.integer(self.id as i64);
        writer.separator();
        writer.integer(i64::from(self.is_selected()));
        write_theme_tail(writer, &self.button.frame.theme, ctx.cache);
        writer.close();
    }

    fn refresh(&mut self, ctx: &mut RefreshContext<'_>) {
        self.button.refresh_label(ctx);
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        if self.button.step(ctx) {
            self.group.set(self.id);
        }
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        render_gui_element(self, ctx);
    }

    fn free(&mut self, backend: &mut dyn RenderBackend) {
        self.button.frame.release(backend);
    }

    fn is_button(&self) -> bool {
        true
    }

    fn is_radiobutton(&self) -> bool {
        true
    }

    fn frame(&self) -> Option<&Frame> {
        Some(&self.button.frame)
    }

    fn frame_mut(&mut self) -> Option<&mut Frame> {
        Some(&mut self.button.frame)
    }

    fn interaction_state(&self) -> InteractionState {
        self.button.state
    }

    fn checked(&self) -> bool {
        self.is_selected()
    }
}
