//! Pointer interaction state shared by interactive widgets

use crate::input::{Input, MouseButtons};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Normal,
    Hovered,
    Pressed,
}

/// Outcome of one button step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonStep {
    pub state: InteractionState,
    /// A press that started inside was released inside this frame
    pub clicked: bool,
}

/// Advances the button machine by one frame
///
/// Hovering follows the pointer; a left press inside enters `Pressed`, and the
/// matching release counts as a click only when it happens inside.
pub fn step_button(state: InteractionState, inside: bool, input: &Input) -> ButtonStep {
    let pressed = input.pressed_buttons.contains(MouseButtons::LEFT);
    let released = input.released_buttons.contains(MouseButtons::LEFT);

    if state == InteractionState::Pressed {
        if released {
            let state = if inside {
                InteractionState::Hovered
            } else {
                InteractionState::Normal
            };
            return ButtonStep {
                state,
                clicked: inside,
            };
        }
        return ButtonStep {
            state,
            clicked: false,
        };
    }

    let state = match (inside, pressed) {
        (true, true) => InteractionState::Pressed,
        (true, false) => InteractionState::Hovered,
        (false, _) => InteractionState::Normal,
    };
    ButtonStep {
        state,
        clicked: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hover_press_release_clicks() {
        let mut input = Input::default();
        let step = step_button(InteractionState::Normal, true, &input);
        assert_eq!(step.state, InteractionState::Hovered);

        input.press_button(MouseButtons::LEFT);
        let step = step_button(step.state, true, &input);
        assert_eq!(step.state, InteractionState::Pressed);
        assert!(!step.clicked);

        input.begin_frame();
        input.release_button(MouseButtons::LEFT);
        let step = step_button(step.state, true, &input);
        assert_eq!(step.state, InteractionState::Hovered);
        assert!(step.clicked);
    }

    #[test]
    fn test_release_outside_cancels() {
        let mut input = Input::default();
        input.release_button(MouseButtons::LEFT);
        let step = step_button(InteractionState::Pressed, false, &input);
        assert_eq!(step.state, InteractionState::Normal);
        assert!(!step.clicked);
    }

    #[test]
    fn test_press_outside_stays_normal() {
        let mut input = Input::default();
        input.press_button(MouseButtons::LEFT);
        let step = step_button(InteractionState::Hovered, false, &input);
        assert_eq!(step.state, InteractionState::Normal);
    }
}
