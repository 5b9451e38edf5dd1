//! Per-frame input snapshot
//!
//! [`Input`] is the only view of the windowing backend that scene nodes get. The
//! application feeds it winit [`WindowEvent`]s through
//! [`Input::process_window_event`] and calls [`Input::begin_frame`] after each
//! tick, which turns "pressed/released this frame" masks back into empty levels
//! before the next batch of events arrives.
//!
//! ## Usage
//!
//! ```no_run
//! use trellis::input::{Input, Keys, MouseButtons};
//!
//! let mut input = Input::default();
//! input.begin_frame();
//! if input.pressed_buttons.contains(MouseButtons::LEFT) && input.released_keys.contains(Keys::ENTER) {
//!     // ...
//! }
//! ```

use bitflags::bitflags;
use winit::{
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

/// Maximum number of bytes kept in the text staging buffer
pub const TEXT_BUFFER_CAPACITY: usize = 100;

/// Approximate pixel height of one wheel "line" for touchpads reporting pixels
const PIXELS_PER_LINE: f32 = 40.0;

bitflags! {
    /// Logical keys the engine tracks
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Keys: u32 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const JUMP = 1 << 4;
        const SHIFT = 1 << 5;
        const CROUCH = 1 << 6;
        const MENU = 1 << 7;
        const FULLSCREEN = 1 << 8;
        const GRAB = 1 << 9;
        const ENTER = 1 << 10;
    }
}

bitflags! {
    /// Pointer buttons
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct MouseButtons: u32 {
        const LEFT = 1 << 0;
        const MIDDLE = 1 << 1;
        const RIGHT = 1 << 2;
    }
}

/// Snapshot of pointer, keyboard and text state for the current frame
#[derive(Debug, Clone, Default)]
pub struct Input {
    /// Pointer position in window pixels, origin top-left
    pub pointer: [f32; 2],
    /// Pointer position at the start of the frame
    pub last_pointer: [f32; 2],
    pub pressed_buttons: MouseButtons,
    pub released_buttons: MouseButtons,
    pub active_buttons: MouseButtons,
    /// Wheel movement this frame, in lines, +y away from the user
    pub scroll: [f32; 2],
    pub pressed_keys: Keys,
    pub released_keys: Keys,
    pub active_keys: Keys,
    /// Text typed while capture is active
    pub text_buffer: String,
    /// Set when the text buffer changed this frame
    pub text_input: bool,
    text_capture: bool,
    /// Set once the user asked the application to close
    pub quit: bool,
}

impl Input {
    /// Clears the edge-triggered state left over from the previous frame
    pub fn begin_frame(&mut self) {
        self.last_pointer = self.pointer;
        self.pressed_buttons = MouseButtons::empty();
        self.released_buttons = MouseButtons::empty();
        self.pressed_keys = Keys::empty();
        self.released_keys = Keys::empty();
        self.scroll = [0.0, 0.0];
        self.text_input = false;
    }

    /// Starts routing typed characters into the text buffer, seeded with `seed`
    pub fn start_text_input(&mut self, seed: &str) {
        self.text_capture = true;
        self.text_buffer.clear();
        push_capped(&mut self.text_buffer, seed);
    }

    pub fn stop_text_input(&mut self) {
        self.text_capture = false;
    }

    pub fn is_capturing_text(&self) -> bool {
        self.text_capture
    }

    /// Appends typed text as if it came from the keyboard
    pub fn inject_text(&mut self, text: &str) {
        if !self.text_capture {
            return;
        }
        push_capped(&mut self.text_buffer, text);
        self.text_input = true;
    }

    pub fn press_button(&mut self, button: MouseButtons) {
        self.pressed_buttons.insert(button);
        self.active_buttons.insert(button);
    }

    pub fn release_button(&mut self, button: MouseButtons) {
        self.released_buttons.insert(button);
        self.active_buttons.remove(button);
    }

    pub fn press_key(&mut self, key: Keys) {
        self.pressed_keys.insert(key);
        self.active_keys.insert(key);
    }

    pub fn release_key(&mut self, key: Keys) {
        self.released_keys.insert(key);
        self.active_keys.remove(key);
    }

    /// Folds one window event into the snapshot
    pub fn process_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer = [position.x as f32, position.y as f32];
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let Some(mask) = map_button(*button) else {
                    return;
                };
                match state {
                    ElementState::Pressed => self.press_button(mask),
                    ElementState::Released => self.release_button(mask),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let (x, y) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => (
                        pos.x as f32 / PIXELS_PER_LINE,
                        pos.y as f32 / PIXELS_PER_LINE,
                    ),
                };
                self.scroll[0] += x;
                self.scroll[1] += y;
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let pressed = event.state == ElementState::Pressed;

                if pressed && self.text_capture {
                    if code == KeyCode::Backspace {
                        self.text_buffer.pop();
                        self.text_input = true;
                    } else if let Some(text) = event.text.as_ref() {
                        let printable: String = text.chars().filter(|c| !c.is_control()).collect();
                        if !printable.is_empty() {
                            self.inject_text(&printable);
                        }
                    }
                }

                if let Some(key) = map_key(code) {
                    if pressed {
                        if !event.repeat {
                            self.press_key(key);
                        }
                    } else {
                        self.release_key(key);
                    }
                }
            }
            WindowEvent::CloseRequested => self.quit = true,
            _ => {}
        }
    }
}

fn push_capped(buffer: &mut String, text: &str) {
    for ch in text.chars() {
        if buffer.len() + ch.len_utf8() > TEXT_BUFFER_CAPACITY {
            break;
        }
        buffer.push(ch);
    }
}

fn map_button(button: MouseButton) -> Option<MouseButtons> {
    match button {
        MouseButton::Left => Some(MouseButtons::LEFT),
        MouseButton::Middle => Some(MouseButtons::MIDDLE),
        MouseButton::Right => Some(MouseButtons::RIGHT),
        _ => None,
    }
}

fn map_key(code: KeyCode) -> Option<Keys> {
    let key = match code {
        KeyCode::ArrowUp | KeyCode::KeyW => Keys::UP,
        KeyCode::ArrowDown | KeyCode::KeyS => Keys::DOWN,
        KeyCode::ArrowLeft | KeyCode::KeyA => Keys::LEFT,
        KeyCode::ArrowRight | KeyCode::KeyD => Keys::RIGHT,
        KeyCode::Space => Keys::JUMP,
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Keys::SHIFT,
        KeyCode::ControlLeft | KeyCode::ControlRight => Keys::CROUCH,
        KeyCode::Escape => Keys::MENU,
        KeyCode::KeyF => Keys::FULLSCREEN,
        KeyCode::KeyG => Keys::GRAB,
        KeyCode::Enter | KeyCode::NumpadEnter => Keys::ENTER,
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_frame_clears_edges_but_keeps_levels() {
        let mut input = Input::default();
        input.press_button(MouseButtons::LEFT);
        input.press_key(Keys::JUMP);
        input.scroll = [0.0, 2.0];
        input.pointer = [10.0, 20.0];

        input.begin_frame();

        assert!(input.pressed_buttons.is_empty());
        assert!(input.pressed_keys.is_empty());
        assert!(input.active_buttons.contains(MouseButtons::LEFT));
        assert!(input.active_keys.contains(Keys::JUMP));
        assert_eq!(input.scroll, [0.0, 0.0]);
        assert_eq!(input.last_pointer, [10.0, 20.0]);
    }

    #[test]
    fn test_text_is_ignored_without_capture() {
        let mut input = Input::default();
        input.inject_text("abc");
        assert!(input.text_buffer.is_empty());
        assert!(!input.text_input);
    }

    #[test]
    fn test_text_buffer_is_capped() {
        let mut input = Input::default();
        input.start_text_input("seed");
        input.inject_text(&"x".repeat(200));
        assert_eq!(input.text_buffer.len(), TEXT_BUFFER_CAPACITY);
        assert!(input.text_buffer.starts_with("seed"));
        assert!(input.text_input);
    }

    #[test]
    fn test_mask_contains() {
        let mask = Keys::UP | Keys::ENTER;
        assert!(mask.contains(Keys::ENTER));
        assert!(!mask.contains(Keys::DOWN));
        assert!(mask.contains(Keys::empty()));
        assert!(mask.contains(Keys::UP | Keys::ENTER));
        assert!(!mask.contains(Keys::UP | Keys::DOWN));
    }
}
