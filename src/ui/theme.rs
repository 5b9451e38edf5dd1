//! Shared look of a GUI subtree
//!
//! A [`Theme`] bundles the window-skin texture, the font and the text colour. One
//! frame owns it ([`ThemeSlot::Owned`]) and every descendant without a theme of its
//! own borrows the same instance at refresh time ([`ThemeSlot::Inherited`]). Only
//! the owner writes the theme literal back when the scene is saved.

use std::rc::Rc;

use fontdue::Font;

use crate::gfx::rendering::backend::TextureHandle;

/// 8-bit RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses the eight hex digits of `RRGGBBAA`, without the leading `#`
    pub fn from_hex(digits: &str) -> Option<Self> {
        if digits.len() != 8 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?))
    }

    /// `#rrggbbaa`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    /// Same colour with alpha multiplied by `factor`
    pub fn fade(self, factor: f32) -> Self {
        Self {
            a: (self.a as f32 * factor).clamp(0.0, 255.0) as u8,
            ..self
        }
    }
}

pub struct Theme {
    /// Window-skin texture, null when the skin failed to load
    pub skin: TextureHandle,
    /// Name the skin was requested under
    pub skin_name: String,
    pub font_path: String,
    pub font_size: u32,
    /// `None` when the font failed to load; text drawing is skipped
    pub font: Option<Rc<Font>>,
    pub text_color: Color,
}

impl std::fmt::Debug for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Theme")
            .field("skin", &self.skin)
            .field("skin_name", &self.skin_name)
            .field("font_path", &self.font_path)
            .field("font_size", &self.font_size)
            .field("font_loaded", &self.font.is_some())
            .field("text_color", &self.text_color)
            .finish()
    }
}

/// How a frame holds its theme
#[derive(Debug, Clone, Default)]
pub enum ThemeSlot {
    #[default]
    None,
    /// This frame owns the theme and persists it
    Owned(Rc<Theme>),
    /// Borrowed from the nearest ancestor that has one
    Inherited(Rc<Theme>),
}

impl ThemeSlot {
    pub fn get(&self) -> Option<&Rc<Theme>> {
        match self {
            ThemeSlot::None => None,
            ThemeSlot::Owned(theme) | ThemeSlot::Inherited(theme) => Some(theme),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ThemeSlot::None)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, ThemeSlot::Owned(_))
    }

    /// The theme only when this slot owns it
    pub fn owned(&self) -> Option<&Rc<Theme>> {
        match self {
            ThemeSlot::Owned(theme) => Some(theme),
            _ => None,
        }
    }
}
