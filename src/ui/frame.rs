//! Responsive GUI layout
//!
//! A [`Frame`] stores its position and scale relative to its container, each
//! component tagged with a [`Unit`]. [`Frame::refresh_geometry`] turns those into
//! normalised device coordinates (the ±1 space of the container) and into absolute
//! window pixels, which hit testing and clipping use.
//!
//! The container is the parent frame when the parent is a GUI element and the
//! window otherwise. Vertical positions are authored downward and flipped into the
//! upward NDC convention. Positions are doubled because NDC spans two units edge to
//! edge; scales are half-extents and are not.
//!
//! ## Usage
//!
//! ```no_run
//! use trellis::ui::frame::{resolve_length, Axis, Dimension, Length, Unit};
//!
//! let container = [800.0, 600.0];
//! let half_width = resolve_length(Length::new(50.0, Unit::Percent), Axis::Horizontal, Dimension::Scale, container);
//! assert_eq!(half_width, 0.5);
//! ```

use std::rc::Rc;

use cgmath::Matrix4;
use log::{error, warn};

use super::interaction::InteractionState;
use super::surface::Surface;
use super::theme::{Theme, ThemeSlot};
use crate::error::SceneError;
use crate::format::{LoadContext, SaveContext, SceneReader, SceneWriter};
use crate::gfx::rendering::backend::{DrawState, RenderBackend, RenderPass, TextureHandle, Uniform};
use crate::gfx::resources::ResourceCache;
use crate::gfx::scene::{
    NodeClass, NodeKind, RefreshContext, RenderContext, UpdateContext, WindowState,
};
use crate::input::Input;

/// Wheel notches are divided by this before moving the scroll target
pub const SCROLL_WHEEL_DIVISOR: f32 = 8.0;
/// Fraction of the remaining distance the scroll covers each frame
pub const SCROLL_BLEND: f32 = 0.5;
/// Scroll snaps to its target once this close
pub const SCROLL_SNAP_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    /// Window or container pixels
    Pixel,
    /// Percent of the container axis
    #[default]
    Percent,
    /// Percent of the container width, whatever the axis
    ViewportWidth,
    /// Percent of the container height, whatever the axis
    ViewportHeight,
}

impl Unit {
    pub fn as_char(self) -> char {
        match self {
            Unit::Pixel => 'p',
            Unit::Percent => '%',
            Unit::ViewportWidth => 'w',
            Unit::ViewportHeight => 'h',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'p' => Some(Unit::Pixel),
            '%' => Some(Unit::Percent),
            'w' => Some(Unit::ViewportWidth),
            'h' => Some(Unit::ViewportHeight),
            _ => None,
        }
    }
}

/// A value with its unit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Length {
    pub value: f32,
    pub unit: Unit,
}

impl Length {
    pub const fn new(value: f32, unit: Unit) -> Self {
        Self { value, unit }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    Bottom,
    Center,
    #[default]
    Top,
}

/// Two-character alignment code, horizontal then vertical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Alignment {
    pub horizontal: HAlign,
    pub vertical: VAlign,
}

impl Alignment {
    pub const fn new(horizontal: HAlign, vertical: VAlign) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    pub fn chars(self) -> [char; 2] {
        let h = match self.horizontal {
            HAlign::Left => 'l',
            HAlign::Center => 'c',
            HAlign::Right => 'r',
        };
        let v = match self.vertical {
            VAlign::Bottom => 'b',
            VAlign::Center => 'c',
            VAlign::Top => 't',
        };
        [h, v]
    }

    pub fn from_chars(h: char, v: char) -> Option<Self> {
        let horizontal = match h {
            'l' => HAlign::Left,
            'c' => HAlign::Center,
            'r' => HAlign::Right,
            _ => return None,
        };
        let vertical = match v {
            'b' => VAlign::Bottom,
            'c' => VAlign::Center,
            't' => VAlign::Top,
            _ => return None,
        };
        Some(Self::new(horizontal, vertical))
    }
}

/// What happens to children drawn outside the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    /// Clipped, no scrolling
    #[default]
    Hidden,
    /// Clipped, wheel scrolls the content
    Scroll,
    /// Not clipped
    Visible,
}

impl Overflow {
    pub fn as_char(self) -> char {
        match self {
            Overflow::Hidden => 'n',
            Overflow::Scroll => 's',
            Overflow::Visible => 'v',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'n' => Some(Overflow::Hidden),
            's' => Some(Overflow::Scroll),
            'v' => Some(Overflow::Visible),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Position,
    Scale,
}

/// Converts a relative length into container NDC units
///
/// Returns 0 for an empty container axis.
pub fn resolve_length(length: Length, axis: Axis, dimension: Dimension, container: [f32; 2]) -> f32 {
    let axis_size = match axis {
        Axis::Horizontal => container[0],
        Axis::Vertical => container[1],
    };
    if axis_size == 0.0 {
        return 0.0;
    }

    let mut value = length.value;
    if dimension == Dimension::Position {
        if axis == Axis::Vertical {
            value = -value;
        }
        value *= 2.0;
    }
    match length.unit {
        Unit::Pixel => value / axis_size,
        Unit::Percent => value / 100.0,
        Unit::ViewportWidth => value * (container[0] / axis_size) / 100.0,
        Unit::ViewportHeight => value * (container[1] / axis_size) / 100.0,
    }
}

/// Geometry of a GUI parent as its children see it during refresh
#[derive(Debug, Clone)]
pub struct ParentFrame {
    pub abs_pos: [f32; 2],
    pub size: [f32; 2],
    pub clip: [f32; 4],
    pub scroll: [f32; 2],
    pub overflow: Overflow,
    pub theme: Option<Rc<Theme>>,
}

impl ParentFrame {
    /// Absolute box as `x0, y0, x1, y1`
    pub fn bounds(&self) -> [f32; 4] {
        [
            self.abs_pos[0],
            self.abs_pos[1],
            self.abs_pos[0] + self.size[0],
            self.abs_pos[1] + self.size[1],
        ]
    }
}

/// Layout and theme state shared by every GUI element
#[derive(Debug, Clone)]
pub struct Frame {
    pub rel_pos: [Length; 2],
    pub rel_scale: [Length; 2],
    pub alignment: Alignment,
    pub overflow: Overflow,

    pub visible: bool,
    pub needs_refresh: bool,
    /// Draw the theme skin behind the content
    pub background: bool,
    /// Owns a content surface that a widget draws into
    pub content: bool,

    /// Position in container NDC after alignment
    pub ndc_pos: [f32; 2],
    /// Half-extent in container NDC
    pub ndc_scale: [f32; 2],
    /// Top-left corner in window pixels
    pub abs_pos: [f32; 2],
    /// Size in pixels
    pub size: [f32; 2],
    /// Visible area in window pixels, `x0, y0, x1, y1`
    pub clip: [f32; 4],
    pub scroll: [f32; 2],
    pub scroll_target: [f32; 2],
    /// Largest child extent seen since this frame's last refresh
    pub content_size: [f32; 2],

    pub theme: ThemeSlot,
    pub surface: Option<Surface>,
    pub content_texture: TextureHandle,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            rel_pos: [Length::new(0.0, Unit::Pixel); 2],
            rel_scale: [Length::new(100.0, Unit::Percent); 2],
            alignment: Alignment::default(),
            overflow: Overflow::Hidden,
            visible: true,
            needs_refresh: true,
            background: false,
            content: false,
            ndc_pos: [0.0; 2],
            ndc_scale: [0.0; 2],
            abs_pos: [0.0; 2],
            size: [0.0; 2],
            clip: [0.0; 4],
            scroll: [0.0; 2],
            scroll_target: [0.0; 2],
            content_size: [0.0; 2],
            theme: ThemeSlot::None,
            surface: None,
            content_texture: TextureHandle::NULL,
        }
    }
}

impl Frame {
    pub fn new(rel_pos: [Length; 2], rel_scale: [Length; 2], alignment: Alignment, overflow: Overflow) -> Self {
        Self {
            rel_pos,
            rel_scale,
            alignment,
            overflow,
            ..Default::default()
        }
    }

    /// Fills its container and owns a content surface, as widgets do
    pub fn filling() -> Self {
        Self {
            rel_pos: [Length::new(0.0, Unit::Percent); 2],
            rel_scale: [Length::new(100.0, Unit::Percent); 2],
            content: true,
            ..Default::default()
        }
    }

    pub fn as_parent(&self) -> ParentFrame {
        ParentFrame {
            abs_pos: self.abs_pos,
            size: self.size,
            clip: self.clip,
            scroll: self.scroll,
            overflow: self.overflow,
            theme: self.theme.get().cloned(),
        }
    }

    /// Recomputes NDC and pixel geometry, the clip box and the content surface
    ///
    /// Leaves this frame's extent in `ctx.extent` when the parent is a GUI
    /// element, and clears `needs_refresh`.
    pub fn refresh_geometry(&mut self, ctx: &mut RefreshContext<'_>) {
        let window = ctx.window.size();
        let mut container = window;
        let mut scroll = [0.0, 0.0];
        self.clip = [0.0, 0.0, window[0], window[1]];
        self.content_size = [0.0, 0.0];

        if let Some(parent) = ctx.parent {
            if self.theme.is_none() {
                if let Some(theme) = &parent.theme {
                    self.theme = ThemeSlot::Inherited(theme.clone());
                }
            }
            container = parent.size;
            if parent.overflow != Overflow::Visible {
                scroll = parent.scroll;
                let bounds = parent.bounds();
                self.clip = [
                    parent.clip[0].max(bounds[0]),
                    parent.clip[1].max(bounds[1]),
                    parent.clip[2].min(bounds[2]),
                    parent.clip[3].min(bounds[3]),
                ];
            }
        }

        let sx = resolve_length(self.rel_scale[0], Axis::Horizontal, Dimension::Scale, container);
        let sy = resolve_length(self.rel_scale[1], Axis::Vertical, Dimension::Scale, container);
        let mut px = resolve_length(self.rel_pos[0], Axis::Horizontal, Dimension::Position, container)
            + scroll[0];
        let mut py = resolve_length(self.rel_pos[1], Axis::Vertical, Dimension::Position, container)
            + scroll[1];

        let mut abs = [px, -py];
        match self.alignment.horizontal {
            HAlign::Left => px += -1.0 + sx,
            HAlign::Center => abs[0] += 1.0 - sx,
            HAlign::Right => {
                abs[0] += 2.0 - 2.0 * sx;
                px += 1.0 - sx;
            }
        }
        match self.alignment.vertical {
            VAlign::Bottom => {
                abs[1] += 2.0 - 2.0 * sy;
                py += -1.0 + sy;
            }
            VAlign::Center => abs[1] += 1.0 - sy,
            VAlign::Top => py += 1.0 - sy,
        }
        abs[0] *= container[0] / 2.0;
        abs[1] *= container[1] / 2.0;

        self.ndc_scale = [sx, sy];
        self.ndc_pos = [px, py];
        self.size = [sx * container[0], sy * container[1]];

        if let Some(parent) = ctx.parent {
            abs[0] += parent.abs_pos[0];
            abs[1] += parent.abs_pos[1];
            ctx.extent = Some([sx + px - scroll[0], sy - py + scroll[1]]);
        }
        self.abs_pos = abs;

        if self.content {
            self.allocate_surface(ctx.backend);
        }
        self.needs_refresh = false;
    }

    fn allocate_surface(&mut self, backend: &mut dyn RenderBackend) {
        let width = self.size[0].round() as u32;
        let height = self.size[1].round() as u32;
        self.surface = Surface::new(width, height);
        match &self.surface {
            Some(surface) => {
                if self.content_texture.is_null() {
                    self.content_texture = backend.create_texture(width, height, &surface.pixels);
                }
            }
            None => error!("Cannot allocate a {}x{} content surface", width, height),
        }
    }

    /// Widens the content size to cover a child's extent
    pub fn fold_content_extent(&mut self, extent: [f32; 2]) {
        self.content_size[0] = self.content_size[0].max(extent[0]);
        self.content_size[1] = self.content_size[1].max(extent[1]);
    }

    /// Advances wheel scrolling and reacts to window resizes
    pub fn update_scroll(&mut self, input: &Input, window: &WindowState) {
        if self.overflow == Overflow::Scroll {
            let target = &mut self.scroll_target[1];
            *target -= input.scroll[1] / SCROLL_WHEEL_DIVISOR;
            *target = target.min(self.content_size[1] - 1.0).max(0.0);

            let target = *target;
            self.scroll[1] += (target - self.scroll[1]) * SCROLL_BLEND;
            if (target - self.scroll[1]).abs() <= SCROLL_SNAP_EPSILON {
                self.scroll[1] = target;
            }
            if input.scroll[1] != 0.0 || target != self.scroll[1] {
                self.needs_refresh = true;
            }
        }
        if window.resized {
            self.needs_refresh = true;
        }
    }

    /// Sends the content surface to the content texture
    pub fn upload_content(&self, backend: &mut dyn RenderBackend) {
        if !self.content || self.content_texture.is_null() {
            return;
        }
        if let Some(surface) = &self.surface {
            backend.upload_texture(self.content_texture, surface.width, surface.height, &surface.pixels);
        }
    }

    /// Releases the content texture and surface; an owned theme goes with the frame
    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        if !self.content_texture.is_null() {
            backend.delete_texture(self.content_texture);
            self.content_texture = TextureHandle::NULL;
        }
        self.surface = None;
        if self.theme.is_owned() {
            self.theme = ThemeSlot::None;
        }
    }

    /// Strictly inside the absolute box
    pub fn contains_point(&self, point: [f32; 2]) -> bool {
        point[0] > self.abs_pos[0]
            && point[0] < self.abs_pos[0] + self.size[0]
            && point[1] > self.abs_pos[1]
            && point[1] < self.abs_pos[1] + self.size[1]
    }

    /// Maps the unit quad onto this frame's box in window NDC
    pub fn model_matrix(&self, window: [f32; 2]) -> Matrix4<f32> {
        if window[0] == 0.0 || window[1] == 0.0 {
            return Matrix4::from_scale(0.0);
        }
        let cx = (self.abs_pos[0] + self.size[0] / 2.0) / window[0] * 2.0 - 1.0;
        let cy = 1.0 - (self.abs_pos[1] + self.size[1] / 2.0) / window[1] * 2.0;
        Matrix4::from_translation(cgmath::Vector3::new(cx, cy, 0.0))
            * Matrix4::from_nonuniform_scale(self.size[0] / window[0], self.size[1] / window[1], 1.0)
    }

    /// Font size in pixels of the active theme
    pub fn font_px(&self) -> f32 {
        self.theme.get().map(|t| t.font_size as f32).unwrap_or(0.0)
    }

    /// Draws `text` into `rect` of the content surface with the theme font
    ///
    /// `fade` scales the theme's text alpha. Does nothing without a surface,
    /// theme or loaded font.
    pub fn draw_label_in(&mut self, rect: Option<[i32; 4]>, text: &str, fade: f32) {
        let Some(theme) = self.theme.get().cloned() else {
            return;
        };
        let (Some(font), Some(surface)) = (theme.font.as_deref(), self.surface.as_mut()) else {
            return;
        };
        let rect = rect.unwrap_or([0, 0, surface.width as i32, surface.height as i32]);
        let color = theme.text_color.fade(fade);
        surface.draw_text_in(rect, font, theme.font_size as f32, text, color, self.alignment);
    }

    pub fn draw_label(&mut self, text: &str, fade: f32) {
        self.draw_label_in(None, text, fade);
    }

    /// Reads `X,Y,W,H,hvo`
    pub fn read_layout(&mut self, source: &mut SceneReader<'_>) -> Result<(), SceneError> {
        self.rel_pos[0] = source.length()?;
        source.expect(',')?;
        self.rel_pos[1] = source.length()?;
        source.expect(',')?;
        self.rel_scale[0] = source.length()?;
        source.expect(',')?;
        self.rel_scale[1] = source.length()?;
        source.expect(',')?;
        self.alignment = read_alignment(source)?;
        let offset = source.offset();
        let found = source.next_char()?;
        self.overflow = Overflow::from_char(found).ok_or(SceneError::InvalidOverflow { found, offset })?;
        Ok(())
    }

    pub fn write_layout(&self, writer: &mut SceneWriter) {
        writer.length(self.rel_pos[0]);
        writer.separator();
        writer.length(self.rel_pos[1]);
        writer.separator();
        writer.length(self.rel_scale[0]);
        writer.separator();
        writer.length(self.rel_scale[1]);
        writer.separator();
        write_alignment(writer, self.alignment);
        writer.ch(self.overflow.as_char());
    }
}

pub fn read_alignment(source: &mut SceneReader<'_>) -> Result<Alignment, SceneError> {
    let offset = source.offset();
    let h = source.next_char()?;
    let v = source.next_char()?;
    Alignment::from_chars(h, v).ok_or_else(|| {
        let found = if matches!(h, 'l' | 'c' | 'r') { v } else { h };
        SceneError::InvalidAlignment { found, offset }
    })
}

pub fn write_alignment(writer: &mut SceneWriter, alignment: Alignment) {
    let [h, v] = alignment.chars();
    writer.ch(h);
    writer.ch(v);
}

/// Reads `[skin,font,size,#RRGGBBAA]`, resolving the skin and font through the cache
pub fn read_theme(source: &mut SceneReader<'_>, ctx: &mut LoadContext<'_>) -> Result<Theme, SceneError> {
    source.expect('[')?;
    let skin_name = source.field();
    source.expect(',')?;
    let font_path = source.field();
    source.expect(',')?;
    let font_size: u32 = source.unsigned()?;
    source.expect(',')?;
    let text_color = source.color()?;
    source.expect(']')?;

    let skin = ctx.cache.resolve_texture(&skin_name, ctx.backend);
    if skin.is_null() {
        warn!("Theme skin '{}' unavailable, background disabled", skin_name);
    }
    let font = ctx.cache.resolve_font(&font_path);
    Ok(Theme {
        skin,
        skin_name,
        font_path,
        font_size,
        font,
        text_color,
    })
}

pub fn write_theme(writer: &mut SceneWriter, theme: &Theme, cache: &ResourceCache) {
    let skin_name = cache.texture_name(theme.skin).unwrap_or(&theme.skin_name);
    writer.ch('[');
    writer.text(skin_name);
    writer.separator();
    writer.text(&theme.font_path);
    writer.separator();
    writer.integer(theme.font_size as i64);
    writer.separator();
    writer.color(theme.text_color);
    writer.ch(']');
}

/// Reads an optional `,[theme]` before the closing parenthesis
pub fn read_theme_tail(source: &mut SceneReader<'_>, ctx: &mut LoadContext<'_>) -> Result<ThemeSlot, SceneError> {
    if source.eat(',') {
        Ok(ThemeSlot::Owned(Rc::new(read_theme(source, ctx)?)))
    } else {
        Ok(ThemeSlot::None)
    }
}

/// Writes `,[theme]` when `slot` owns its theme
pub fn write_theme_tail(writer: &mut SceneWriter, slot: &ThemeSlot, cache: &ResourceCache) {
    if let Some(theme) = slot.owned() {
        writer.separator();
        write_theme(writer, theme, cache);
    }
}

/// Sets the GUI uniforms for `element` and draws its quad
///
/// Skipped for hidden elements and in the depth pass.
pub fn render_gui_element(element: &dyn NodeClass, ctx: &mut RenderContext<'_>) {
    let Some(frame) = element.frame() else {
        return;
    };
    if !frame.visible || ctx.pass == RenderPass::Depth {
        return;
    }

    let shader = ctx.shaders.gui;
    let skin = frame.theme.get().map(|t| t.skin).unwrap_or(TextureHandle::NULL);
    let background = frame.background && !skin.is_null();
    let content = frame.content && !frame.content_texture.is_null();
    let state = element.interaction_state();
    let flag = |b: bool| Uniform::Int(b as i32);

    let backend = &mut *ctx.backend;
    backend.bind_shader(shader);
    backend.set_uniform(shader, "pixelSize", Uniform::Vec2(frame.size));
    backend.set_uniform(shader, "pixelPosition", Uniform::Vec2(frame.abs_pos));
    backend.set_uniform(shader, "overflow", Uniform::Vec4(frame.clip));
    backend.set_uniform(shader, "time", Uniform::Float(ctx.window.time));
    backend.set_uniform(shader, "background", Uniform::Int(0));
    backend.set_uniform(shader, "content", Uniform::Int(1));
    backend.set_uniform(shader, "backgroundEnabled", flag(background));
    backend.set_uniform(shader, "contentEnabled", flag(content));
    backend.set_uniform(shader, "checked", flag(element.checked()));
    backend.set_uniform(shader, "isCheckBox", flag(element.is_checkbox()));
    backend.set_uniform(shader, "isRadioButton", flag(element.is_radiobutton()));
    backend.set_uniform(shader, "pressed", flag(state == InteractionState::Pressed));
    backend.set_uniform(shader, "hovered", flag(state == InteractionState::Hovered));
    if background {
        backend.bind_texture(0, skin);
    }
    if content {
        backend.bind_texture(1, frame.content_texture);
    }
    backend.set_uniform(shader, "model", Uniform::Mat4(frame.model_matrix(ctx.window.size())));
    backend.draw_quad(DrawState::GUI);
}

impl NodeClass for Frame {
    fn kind(&self) -> NodeKind {
        NodeKind::Frame
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
        self.read_layout(source)?;
        self.theme = read_theme_tail(source, ctx)?;
        source.expect(')')?;
        self.background = true;
        Ok(())
    }

    fn save(&self, writer: &mut SceneWriter, ctx: &SaveContext<'_>) {
        writer.keyword(self.kind().keyword());
        writer.open();
        self.write_layout(writer);
        write_theme_tail(writer, &self.theme, ctx.cache);
        writer.close();
    }

    fn refresh(&mut self, ctx: &mut RefreshContext<'_>) {
        self.refresh_geometry(ctx);
        self.upload_content(ctx.backend);
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.update_scroll(ctx.input, ctx.window);
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        render_gui_element(self, ctx);
    }

    fn free(&mut self, backend: &mut dyn RenderBackend) {
        self.release(backend);
    }

    fn frame(&self) -> Option<&Frame> {
        Some(self)
    }

    fn frame_mut(&mut self) -> Option<&mut Frame> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::backend::{RecordedCall, RecordingBackend};

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1e-4, "{} != {}", a, b);
    }

    fn refresh(frame: &mut Frame, parent: Option<&ParentFrame>, window: [u32; 2]) -> Option<[f32; 2]> {
        let mut backend = RecordingBackend::new();
        let window = WindowState::new(window[0], window[1]);
        let mut ctx = RefreshContext {
            window: &window,
            parent,
            backend: &mut backend,
            extent: None,
        };
        frame.refresh_geometry(&mut ctx);
        ctx.extent
    }

    #[test]
    fn test_resolve_units() {
        let c = [800.0, 600.0];
        let h = Axis::Horizontal;
        let v = Axis::Vertical;
        assert_close(resolve_length(Length::new(50.0, Unit::Percent), h, Dimension::Scale, c), 0.5);
        assert_close(resolve_length(Length::new(400.0, Unit::Pixel), h, Dimension::Scale, c), 0.5);
        assert_close(resolve_length(Length::new(300.0, Unit::Pixel), v, Dimension::Scale, c), 0.5);
        // 10% of the width expressed on the vertical axis
        assert_close(resolve_length(Length::new(10.0, Unit::ViewportWidth), v, Dimension::Scale, c), 80.0 / 600.0);
        assert_close(resolve_length(Length::new(10.0, Unit::ViewportHeight), h, Dimension::Scale, c), 60.0 / 800.0);
    }

    #[test]
    fn test_positions_are_doubled_and_flipped() {
        let c = [800.0, 600.0];
        assert_close(resolve_length(Length::new(200.0, Unit::Pixel), Axis::Horizontal, Dimension::Position, c), 0.5);
        assert_close(resolve_length(Length::new(150.0, Unit::Pixel), Axis::Vertical, Dimension::Position, c), -0.5);
    }

    #[test]
    fn test_empty_container_resolves_to_zero() {
        let length = Length::new(10.0, Unit::Pixel);
        assert_eq!(resolve_length(length, Axis::Vertical, Dimension::Scale, [800.0, 0.0]), 0.0);
    }

    #[test]
    fn test_alignment_pixels() {
        let scale = [Length::new(50.0, Unit::Percent), Length::new(50.0, Unit::Percent)];
        let origin = [Length::new(0.0, Unit::Pixel); 2];
        let cases = [
            (HAlign::Left, VAlign::Top, [0.0, 0.0]),
            (HAlign::Center, VAlign::Center, [200.0, 150.0]),
            (HAlign::Right, VAlign::Bottom, [400.0, 300.0]),
        ];
        for (h, v, expected) in cases {
            let mut frame = Frame::new(origin, scale, Alignment::new(h, v), Overflow::Hidden);
            refresh(&mut frame, None, [800, 600]);
            assert_close(frame.abs_pos[0], expected[0]);
            assert_close(frame.abs_pos[1], expected[1]);
            assert_close(frame.size[0], 400.0);
            assert_close(frame.size[1], 300.0);
        }
    }

    #[test]
    fn test_left_top_ndc_centre() {
        let scale = [Length::new(25.0, Unit::Percent); 2];
        let mut frame = Frame::new([Length::default(); 2], scale, Alignment::default(), Overflow::Hidden);
        refresh(&mut frame, None, [800, 600]);
        assert_close(frame.ndc_pos[0], -0.75);
        assert_close(frame.ndc_pos[1], 0.75);
    }

    #[test]
    fn test_child_is_offset_and_clipped_by_parent() {
        let parent = ParentFrame {
            abs_pos: [100.0, 50.0],
            size: [200.0, 100.0],
            clip: [0.0, 0.0, 800.0, 600.0],
            scroll: [0.0, 0.0],
            overflow: Overflow::Hidden,
            theme: None,
        };
        let scale = [Length::new(150.0, Unit::Percent); 2];
        let mut child = Frame::new([Length::default(); 2], scale, Alignment::default(), Overflow::Hidden);
        let extent = refresh(&mut child, Some(&parent), [800, 600]);

        assert_eq!(child.clip, [100.0, 50.0, 300.0, 150.0]);
        assert_close(child.abs_pos[0], 100.0);
        assert_close(child.abs_pos[1], 50.0);
        assert_close(child.size[0], 300.0);
        assert!(extent.is_some());
    }

    #[test]
    fn test_visible_overflow_parent_does_not_clip() {
        let parent = ParentFrame {
            abs_pos: [100.0, 50.0],
            size: [200.0, 100.0],
            clip: [100.0, 50.0, 300.0, 150.0],
            scroll: [0.0, 3.0],
            overflow: Overflow::Visible,
            theme: None,
        };
        let mut child = Frame::default();
        refresh(&mut child, Some(&parent), [800, 600]);
        assert_eq!(child.clip, [0.0, 0.0, 800.0, 600.0]);
        assert_close(child.abs_pos[1], 50.0);
    }

    #[test]
    fn test_parent_scroll_moves_child_up() {
        let parent = ParentFrame {
            abs_pos: [0.0, 0.0],
            size: [800.0, 600.0],
            clip: [0.0, 0.0, 800.0, 600.0],
            scroll: [0.0, 0.5],
            overflow: Overflow::Scroll,
            theme: None,
        };
        let mut child = Frame::default();
        let extent = refresh(&mut child, Some(&parent), [800, 600]).unwrap();
        assert_close(child.abs_pos[1], -150.0);
        // scroll is subtracted back out of the reported extent
        assert_close(extent[1], 1.0);
    }

    #[test]
    fn test_inherits_parent_theme_once() {
        let theme = Rc::new(Theme {
            skin: TextureHandle(7),
            skin_name: "skin.png".into(),
            font_path: String::new(),
            font_size: 14,
            font: None,
            text_color: Default::default(),
        });
        let parent = ParentFrame {
            abs_pos: [0.0; 2],
            size: [800.0, 600.0],
            clip: [0.0, 0.0, 800.0, 600.0],
            scroll: [0.0; 2],
            overflow: Overflow::Hidden,
            theme: Some(theme.clone()),
        };
        let mut child = Frame::default();
        refresh(&mut child, Some(&parent), [800, 600]);
        assert!(matches!(&child.theme, ThemeSlot::Inherited(t) if Rc::ptr_eq(t, &theme)));
        assert_eq!(child.font_px(), 14.0);
    }

    #[test]
    fn test_refresh_clears_dirty_flag() {
        let mut frame = Frame::default();
        assert!(frame.needs_refresh);
        refresh(&mut frame, None, [800, 600]);
        assert!(!frame.needs_refresh);
    }

    #[test]
    fn test_content_surface_follows_size() {
        let mut backend = RecordingBackend::new();
        let window = WindowState::new(640, 480);
        let mut frame = Frame::filling();
        let mut ctx = RefreshContext {
            window: &window,
            parent: None,
            backend: &mut backend,
            extent: None,
        };
        frame.refresh_geometry(&mut ctx);
        frame.upload_content(&mut backend);

        let surface = frame.surface.as_ref().unwrap();
        assert_eq!((surface.width, surface.height), (640, 480));
        assert!(!frame.content_texture.is_null());
        assert!(backend.calls.contains(&RecordedCall::UploadTexture {
            texture: frame.content_texture,
            width: 640,
            height: 480,
        }));
    }

    #[test]
    fn test_zero_size_content_keeps_null_surface() {
        let mut frame = Frame::filling();
        frame.rel_scale[0] = Length::new(0.0, Unit::Pixel);
        refresh(&mut frame, None, [640, 480]);
        assert!(frame.surface.is_none());
        assert!(!frame.needs_refresh);
    }

    #[test]
    fn test_scroll_clamps_and_converges() {
        let mut frame = Frame {
            overflow: Overflow::Scroll,
            content_size: [1.0, 3.0],
            ..Default::default()
        };
        let window = WindowState::new(800, 600);
        let mut input = Input::default();
        input.scroll = [0.0, -40.0];
        frame.update_scroll(&input, &window);
        assert_eq!(frame.scroll_target[1], 2.0);
        assert!(frame.needs_refresh);

        input.scroll = [0.0, 0.0];
        let mut last_gap = f32::MAX;
        for _ in 0..64 {
            frame.update_scroll(&input, &window);
            let gap = (frame.scroll_target[1] - frame.scroll[1]).abs();
            assert!(gap <= last_gap);
            last_gap = gap;
        }
        assert_eq!(frame.scroll[1], frame.scroll_target[1]);

        frame.needs_refresh = false;
        frame.update_scroll(&input, &window);
        assert!(!frame.needs_refresh);
    }

    #[test]
    fn test_scroll_target_never_negative() {
        let mut frame = Frame {
            overflow: Overflow::Scroll,
            content_size: [0.0, 0.5],
            ..Default::default()
        };
        let mut input = Input::default();
        input.scroll = [0.0, -80.0];
        frame.update_scroll(&input, &WindowState::default());
        assert_eq!(frame.scroll_target[1], 0.0);
    }

    #[test]
    fn test_resize_marks_dirty() {
        let mut frame = Frame::default();
        frame.needs_refresh = false;
        let mut window = WindowState::new(800, 600);
        window.resized = true;
        frame.update_scroll(&Input::default(), &window);
        assert!(frame.needs_refresh);
    }

    #[test]
    fn test_contains_point_is_strict() {
        let frame = Frame {
            abs_pos: [10.0, 10.0],
            size: [20.0, 20.0],
            ..Default::default()
        };
        assert!(frame.contains_point([15.0, 15.0]));
        assert!(!frame.contains_point([10.0, 15.0]));
        assert!(!frame.contains_point([30.0, 15.0]));
    }

    #[test]
    fn test_release_drops_owned_theme_only() {
        let theme = Rc::new(Theme {
            skin: TextureHandle::NULL,
            skin_name: String::new(),
            font_path: String::new(),
            font_size: 10,
            font: None,
            text_color: Default::default(),
        });
        let mut backend = RecordingBackend::new();
        let mut owner = Frame {
            theme: ThemeSlot::Owned(theme.clone()),
            content_texture: TextureHandle(3),
            ..Default::default()
        };
        owner.release(&mut backend);
        assert!(owner.theme.is_none());
        assert_eq!(backend.calls, vec![RecordedCall::DeleteTexture(TextureHandle(3))]);

        let mut borrower = Frame {
            theme: ThemeSlot::Inherited(theme),
            ..Default::default()
        };
        borrower.release(&mut backend);
        assert!(!borrower.theme.is_none());
    }
}
