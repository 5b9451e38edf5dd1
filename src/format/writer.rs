//! Builds scene text

use cgmath::Vector3;

use super::reader::{FIELD_DELIMITERS, FIELD_ESCAPE};
use crate::gfx::scene::Transform;
use crate::ui::frame::Length;
use crate::ui::theme::Color;

#[derive(Debug, Default)]
pub struct SceneWriter {
    out: String,
}

impl SceneWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a node on a fresh line indented by `depth`
    pub fn begin_node(&mut self, depth: usize) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }

    pub fn keyword(&mut self, keyword: &str) {
        self.out.push_str(keyword);
    }

    pub fn open(&mut self) {
        self.out.push('(');
    }

    pub fn close(&mut self) {
        self.out.push(')');
    }

    pub fn separator(&mut self) {
        self.out.push(',');
    }

    pub fn ch(&mut self, c: char) {
        self.out.push(c);
    }

    /// Free text, with delimiters and the escape character prefixed by `\`
    pub fn text(&mut self, text: &str) {
        for c in text.chars() {
            if c == FIELD_ESCAPE || FIELD_DELIMITERS.contains(&c) {
                self.out.push(FIELD_ESCAPE);
            }
            self.out.push(c);
        }
    }

    pub fn number(&mut self, value: f32) {
        self.out.push_str(&value.to_string());
    }

    pub fn integer(&mut self, value: i64) {
        self.out.push_str(&value.to_string());
    }

    pub fn length(&mut self, length: Length) {
        self.number(length.value);
        self.out.push(length.unit.as_char());
    }

    pub fn color(&mut self, color: Color) {
        self.out.push_str(&color.to_hex());
    }

    fn vector(&mut self, v: Vector3<f32>) {
        self.number(v.x);
        self.separator();
        self.number(v.y);
        self.separator();
        self.number(v.z);
    }

    pub fn transform(&mut self, transform: &Transform) {
        self.out.push('{');
        self.vector(transform.position);
        self.out.push(';');
        self.vector(transform.rotation);
        self.out.push(';');
        self.vector(transform.scale);
        self.out.push('}');
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(mut self) -> String {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out
    }
}
