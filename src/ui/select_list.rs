//! Drop-down choice among fixed options

use super::frame::{read_alignment, read_theme_tail, render_gui_element, write_alignment, write_theme_tail, Frame};
use super::interaction::{step_button, InteractionState};
use crate::error::SceneError;
use crate::format::{LoadContext, SaveContext, SceneReader, SceneWriter};
use crate::gfx::rendering::backend::RenderBackend;
use crate::gfx::scene::{NodeClass, NodeKind, RefreshContext, RenderContext, UpdateContext};
use crate::input::MouseButtons;

/// Alpha factor of the highlight behind the selected row
const SELECTED_ROW_ALPHA: f32 = 0.2;

/// Closed, the list shows the selected option. A click opens it and splits the
/// box into one row per option; the next left press picks the row under the
/// pointer, or closes the list when it lands outside.
#[derive(Debug, Clone)]
pub struct SelectList {
    pub frame: Frame,
    pub options: Vec<String>,
    pub selected: usize,
    pub open: bool,
    pub state: InteractionState,
}

impl Default for SelectList {
    fn default() -> Self {
        Self {
            frame: Frame {
                background: true,
                ..Frame::filling()
            },
            options: Vec::new(),
            selected: 0,
            open: false,
            state: InteractionState::Normal,
        }
    }
}

impl SelectList {
    pub fn new<S: Into<String>>(options: impl IntoIterator<Item = S>) -> Self {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn selected_option(&self) -> Option<&str> {
        self.options.get(self.selected).map(String::as_str)
    }

    /// Row of the open list under window y coordinate `y`
    pub fn row_at(&self, y: f32) -> Option<usize> {
        if self.options.is_empty() || self.frame.size[1] <= 0.0 {
            return None;
        }
        let row_height = self.frame.size[1] / self.options.len() as f32;
        let row = ((y - self.frame.abs_pos[1]) / row_height).floor();
        if row < 0.0 {
            return None;
        }
        Some((row as usize).min(self.options.len() - 1))
    }

    fn draw_rows(&mut self) {
        if !self.open {
            if let Some(label) = self.selected_option().map(str::to_owned) {
                self.frame.draw_label(&label, 1.0);
            }
            return;
        }
        let Some(surface) = self.frame.surface.as_ref() else {
            return;
        };
        let (width, height) = (surface.width as i32, surface.height as i32);
        let rows = self.options.len().max(1) as i32;
        let row_height = height / rows;
        let highlight = self
            .frame
            .theme
            .get()
            .map(|theme| theme.text_color.fade(SELECTED_ROW_ALPHA));

        for (i, option) in self.options.clone().iter().enumerate() {
            let rect = [0, i as i32 * row_height, width, row_height];
            if i == self.selected {
                if let (Some(color), Some(surface)) = (highlight, self.frame.surface.as_mut()) {
                    surface.fill_rect(rect, color);
                }
            }
            self.frame.draw_label_in(Some(rect), option, 1.0);
        }
    }
}

impl NodeClass for SelectList {
    fn kind(&self) -> NodeKind {
        NodeKind::SelectList
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
        self.options.clear();
        loop {
            self.options.push(source.field());
            if !source.eat('|') {
                break;
            }
        }
        source.expect(',')?;
        self.frame.alignment = read_alignment(source)?;
        source.expect(',')?;
        self.selected = source.unsigned()?;
        self.frame.theme = read_theme_tail(source, ctx)?;
        source.expect(')')
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        writer.keyword(self.kind().keyword());
        writer.open();
        for (i, option) in self.options.iter().enumerate() {
            if i > 0 {
                writer.ch('|');
            }
            writer.text(option);
        }
        writer.separator();
        write_alignment(writer, self.frame.alignment);
        writer.separator();
        writer.integer(self.selected as i64);
        write_theme_tail(writer, &self.frame.theme, ctx.cache);
        writer.close();
    }

    fn refresh(&mut self, ctx: &mut RefreshContext<'_>) {
        self.frame.refresh_geometry(ctx);
        self.draw_rows();
        self.frame.upload_content(ctx.backend);
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        let pointer = ctx.input.pointer;
        let inside = self.frame.contains_point(pointer);

        if self.open {
            if ctx.input.pressed_buttons.contains(MouseButtons::LEFT) {
                if inside {
                    if let Some(row) = self.row_at(pointer[1]) {
                        self.selected = row;
                    }
                }
                self.open = false;
                self.frame.needs_refresh = true;
            }
            self.state = if inside {
                InteractionState::Hovered
            } else {
                InteractionState::Normal
            };
        } else {
            let step = step_button(self.state, inside, ctx.input);
            self.state = step.state;
            if step.clicked {
                self.open = true;
                self.frame.needs_refresh = true;
            }
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

    fn is_selectlist(&self) -> bool {
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

    fn list() -> SelectList {
        let mut list = SelectList::new(["low", "medium", "high"]);
        list.frame.abs_pos = [0.0, 0.0];
        list.frame.size = [120.0, 90.0];
        list
    }

    fn step(list: &mut SelectList, input: &mut Input) {
        let window = WindowState::default();
        list.update(&mut UpdateContext {
            input,
            window: &window,
            delta: 0.0,
        });
    }

    #[test]
    fn test_click_opens_then_press_selects_row() {
        let mut list = list();
        let mut input = Input::default();
        input.pointer = [10.0, 10.0];
        input.press_button(MouseButtons::LEFT);
        step(&mut list, &mut input);
        input.begin_frame();
        input.release_button(MouseButtons::LEFT);
        step(&mut list, &mut input);
        assert!(list.open);

        input.begin_frame();
        input.pointer = [10.0, 75.0];
        input.press_button(MouseButtons::LEFT);
        step(&mut list, &mut input);
        assert!(!list.open);
        assert_eq!(list.selected_option(), Some("high"));
    }

    #[test]
    fn test_press_outside_closes_without_selecting() {
        let mut list = list();
        list.open = true;
        let mut input = Input::default();
        input.pointer = [500.0, 10.0];
        input.press_button(MouseButtons::LEFT);
        step(&mut list, &mut input);
        assert!(!list.open);
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn test_row_at() {
        let list = list();
        assert_eq!(list.row_at(-1.0), None);
        assert_eq!(list.row_at(29.0), Some(0));
        assert_eq!(list.row_at(30.0), Some(1));
        assert_eq!(list.row_at(200.0), Some(2));
    }
}
