//! CPU-side RGBA pixel buffer for dynamic GUI content
//!
//! Widgets rasterise their text here during refresh; the frame then uploads the
//! whole buffer to its content texture.

use fontdue::Font;

use super::frame::{Alignment, HAlign, VAlign};
use super::theme::Color;

/// Largest edge a content surface may have
pub const MAX_SURFACE_EDGE: u32 = 16384;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8, straight alpha
    pub pixels: Vec<u8>,
}

impl Surface {
    /// Transparent surface, or `None` when either edge is zero or too large
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 || width > MAX_SURFACE_EDGE || height > MAX_SURFACE_EDGE {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        })
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Composites `color` over the pixel at (`x`, `y`) with `coverage` in 0..=255
    pub fn blend(&mut self, x: i32, y: i32, color: Color, coverage: u8) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let src_a = (color.a as f32 / 255.0) * (coverage as f32 / 255.0);
        if src_a <= 0.0 {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let dst_a = self.pixels[i + 3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        let src = [color.r, color.g, color.b];
        for c in 0..3 {
            let s = src[c] as f32;
            let d = self.pixels[i + c] as f32;
            let v = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
            self.pixels[i + c] = v.round().clamp(0.0, 255.0) as u8;
        }
        self.pixels[i + 3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    pub fn fill_rect(&mut self, rect: [i32; 4], color: Color) {
        let [x, y, w, h] = rect;
        for py in y.max(0)..(y + h).min(self.height as i32) {
            for px in x.max(0)..(x + w).min(self.width as i32) {
                self.blend(px, py, color, 255);
            }
        }
    }

    /// Width in pixels of `text` set at `px`
    pub fn measure(font: &Font, px: f32, text: &str) -> f32 {
        text.chars().map(|ch| font.metrics(ch, px).advance_width).sum()
    }

    /// Draws one line of `text` aligned inside the whole surface
    pub fn draw_text(&mut self, font: &Font, px: f32, text: &str, color: Color, alignment: Alignment) {
        let rect = [0, 0, self.width as i32, self.height as i32];
        self.draw_text_in(rect, font, px, text, color, alignment);
    }

    /// Draws one line of `text` aligned inside `rect` (`x, y, w, h`), clipped to the surface
    pub fn draw_text_in(
        &mut self,
        rect: [i32; 4],
        font: &Font,
        px: f32,
        text: &str,
        color: Color,
        alignment: Alignment,
    ) {
        if text.is_empty() {
            return;
        }
        let [rx, ry, rw, rh] = rect;
        let width = Self::measure(font, px, text);
        let (ascent, descent) = font
            .horizontal_line_metrics(px)
            .map(|m| (m.ascent, m.descent))
            .unwrap_or((px, 0.0));
        let line_height = ascent - descent;

        let mut pen_x = rx as f32
            + match alignment.horizontal {
                HAlign::Left => 0.0,
                HAlign::Center => (rw as f32 - width) / 2.0,
                HAlign::Right => rw as f32 - width,
            };
        let baseline = ry as f32
            + match alignment.vertical {
                VAlign::Top => ascent,
                VAlign::Center => (rh as f32 - line_height) / 2.0 + ascent,
                VAlign::Bottom => rh as f32 + descent,
            };

        for ch in text.chars() {
            let (metrics, coverage) = font.rasterize(ch, px);
            let gx = (pen_x + metrics.xmin as f32).round() as i32;
            let gy = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i32;
            for row in 0..metrics.height {
                let y = gy + row as i32;
                if y < ry || y >= ry + rh {
                    continue;
                }
                for col in 0..metrics.width {
                    let x = gx + col as i32;
                    if x < rx || x >= rx + rw {
                        continue;
                    }
                    self.blend(x, y, color, coverage[row * metrics.width + col]);
                }
            }
            pen_x += metrics.advance_width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sized_surface_rejected() {
        assert!(Surface::new(0, 10).is_none());
        assert!(Surface::new(10, 0).is_none());
        assert!(Surface::new(MAX_SURFACE_EDGE + 1, 1).is_none());
        assert_eq!(Surface::new(2, 3).unwrap().pixels.len(), 24);
    }

    #[test]
    fn test_blend_over_transparent_keeps_colour() {
        let mut surface = Surface::new(1, 1).unwrap();
        surface.blend(0, 0, Color::new(10, 20, 30, 255), 255);
        assert_eq!(surface.pixel(0, 0), Some([10, 20, 30, 255]));
    }

    #[test]
    fn test_partial_coverage_scales_alpha() {
        let mut surface = Surface::new(1, 1).unwrap();
        surface.blend(0, 0, Color::new(255, 255, 255, 255), 128);
        assert_eq!(surface.pixel(0, 0), Some([255, 255, 255, 128]));
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut surface = Surface::new(4, 4).unwrap();
        surface.fill_rect([-2, 2, 4, 10], Color::BLACK);
        assert_eq!(surface.pixel(1, 3), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(2, 3), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(0, 1), Some([0, 0, 0, 0]));
    }
}
