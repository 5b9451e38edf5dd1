//! Single-line editable text field

use super::frame::{read_alignment, read_theme_tail, render_gui_element, write_alignment, write_theme_tail, Frame};
use super::interaction::InteractionState;
use crate::error::SceneError;
use crate::format::{LoadContext, SaveContext, SceneReader, SceneWriter};
use crate::gfx::rendering::backend::RenderBackend;
use crate::gfx::scene::{NodeClass, NodeKind, RefreshContext, RenderContext, UpdateContext};
use crate::input::{Keys, MouseButtons};

/// Alpha factor of the placeholder relative to live text
pub const PLACEHOLDER_ALPHA: f32 = 0.8;

/// Text field filling its parent
///
/// Clicking inside starts text capture seeded with the current text. While
/// pressed, typed text replaces the live text. Enter, or a left press or release
/// outside, ends the edit.
#[derive(Debug, Clone)]
pub struct InputArea {
    pub frame: Frame,
    /// Shown dimmed while the live text is empty
    pub placeholder: String,
    pub text: String,
    pub state: InteractionState,
}

impl Default for InputArea {
    fn default() -> Self {
        Self {
            frame: Frame::filling(),
            placeholder: String::new(),
            text: String::new(),
            state: InteractionState::Normal,
        }
    }
}

impl InputArea {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            ..Default::default()
        }
    }

    fn draw_text(&mut self) {
        if self.text.is_empty() {
            let placeholder = self.placeholder.clone();
            self.frame.draw_label(&placeholder, PLACEHOLDER_ALPHA);
        } else {
            let text = self.text.clone();
            self.frame.draw_label(&text, 1.0);
        }
    }
}

impl NodeClass for InputArea {
    fn kind(&self) -> NodeKind {
        NodeKind::InputArea
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
        self.placeholder = source.field();
        source.expect(',')?;
        self.frame.alignment = read_alignment(source)?;
        self.frame.theme = read_theme_tail(source, ctx)?;
        source.expect(')')?;
        self.text.clear();
        Ok(())
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        writer.keyword(self.kind().keyword());
        writer.open();
        writer.text(&self.placeholder);
        writer.separator();
        write_alignment(writer, self.frame.alignment);
        write_theme_tail(writer, &self.frame.theme, ctx.cache);
        writer.close();
    }

    fn refresh(&mut self, ctx: &mut RefreshContext<'_>) {
        self.frame.refresh_geometry(ctx);
        self.draw_text();
        self.frame.upload_content(ctx.backend);
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let input = &mut *ctx.input;
        let inside = self.frame.contains_point(input.pointer);

        if self.state == InteractionState::Pressed {
            if input.text_input {
                self.text = input.text_buffer.clone();
                self.frame.needs_refresh = true;
            }
            let left_edge = input.pressed_buttons.contains(MouseButtons::LEFT)
                || input.released_buttons.contains(MouseButtons::LEFT);
            if input.released_keys.contains(Keys::ENTER) || (left_edge && !inside) {
                self.state = InteractionState::Normal;
                input.stop_text_input();
            }
        } else if inside {
            self.state = InteractionState::Hovered;
            if input.pressed_buttons.contains(MouseButtons::LEFT) {
                self.state = InteractionState::Pressed;
                input.start_text_input(&self.text);
            }
        } else {
            self.state = InteractionState::Normal;
        }

        if ctx.window.resized {
            self.frame.needs_refresh = true;
        }
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        render_gui_element(self, ctx);
    }

    fn free(&mut self, backend: &mut dyn RenderBackend) {
        self.frame.release(backend);
    }

    fn is_input_area(&self) -> bool {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::WindowState;
    use crate::input::Input;

    fn field() -> InputArea {
        let mut area = InputArea::new("name");
        area.frame.abs_pos = [0.0, 0.0];
        area.frame.size = [100.0, 30.0];
        area
    }

    fn step(area: &mut InputArea, input: &mut Input) {
        let window = WindowState::new(800, 600);
        let mut ctx = UpdateContext {
            input,
            window: &window,
            delta: 1.0 / 60.0,
        };
        area.update(&mut ctx);
    }

    #[test]
    fn test_defaults_fill_parent_with_content() {
        let area = InputArea::default();
        assert!(area.frame.content);
        assert!(!area.frame.background);
        assert_eq!(area.frame.rel_scale[0].value, 100.0);
    }

    #[test]
    fn test_enter_commits_typed_text() {
        let mut area = field();
        let mut input = Input::default();

        input.pointer = [10.0, 10.0];
        step(&mut area, &mut input);
        assert_eq!(area.state, InteractionState::Hovered);

        input.begin_frame();
        input.press_button(MouseButtons::LEFT);
        step(&mut area, &mut input);
        assert_eq!(area.state, InteractionState::Pressed);
        assert!(input.is_capturing_text());

        input.begin_frame();
        input.release_button(MouseButtons::LEFT);
        input.inject_text("hello");
        area.frame.needs_refresh = false;
        step(&mut area, &mut input);
        assert_eq!(area.state, InteractionState::Pressed);
        assert_eq!(area.text, "hello");
        assert!(area.frame.needs_refresh);

        input.begin_frame();
        input.press_key(Keys::ENTER);
        input.release_key(Keys::ENTER);
        step(&mut area, &mut input);
        assert_eq!(area.state, InteractionState::Normal);
        assert_eq!(area.text, "hello");
        assert!(!input.is_capturing_text());
    }

    #[test]
    fn test_click_outside_ends_edit() {
        let mut area = field();
        area.state = InteractionState::Pressed;
        let mut input = Input::default();
        input.start_text_input("");
        input.pointer = [500.0, 500.0];
        input.press_button(MouseButtons::LEFT);
        step(&mut area, &mut input);
        assert_eq!(area.state, InteractionState::Normal);
        assert!(!input.is_capturing_text());
    }

    #[test]
    fn test_edge_of_box_is_outside() {
        let mut area = field();
        let mut input = Input::default();
        input.pointer = [0.0, 10.0];
        step(&mut area, &mut input);
        assert_eq!(area.state, InteractionState::Normal);
    }

    #[test]
    fn test_editing_seeds_buffer_with_current_text() {
        let mut area = field();
        area.text = "abc".into();
        let mut input = Input::default();
        input.pointer = [50.0, 15.0];
        input.press_button(MouseButtons::LEFT);
        step(&mut area, &mut input);
        assert_eq!(input.text_buffer, "abc");
    }
}
