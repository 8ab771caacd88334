//! Keyboard and mouse state collected from window events
//!
//! Holds "is down" state for keys plus the cursor and scroll deltas
//! accumulated since the last frame. [`InputState::take_frame`] hands the
//! deltas to the camera controller and starts a new frame.

use std::collections::HashSet;

use winit::{
    event::{ElementState, MouseButton, MouseScrollDelta},
    keyboard::KeyCode,
};

/// Pixels of trackpad scrolling treated as one wheel line
const PIXELS_PER_LINE: f32 = 40.0;

/// Per-frame deltas
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    /// Cursor movement in pixels, y grows downward
    pub cursor_delta: (f32, f32),
    /// Wheel lines, positive away from the user
    pub scroll: f32,
}

#[derive(Debug, Default)]
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    buttons_down: HashSet<MouseButton>,
    last_cursor: Option<(f32, f32)>,
    frame: InputFrame,
    focused: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            focused: true,
            ..Default::default()
        }
    }

    pub fn key(&mut self, code: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.keys_down.insert(code);
            }
            ElementState::Released => {
                self.keys_down.remove(&code);
            }
        }
    }

    pub fn button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.buttons_down.insert(button);
            }
            ElementState::Released => {
                self.buttons_down.remove(&button);
            }
        }
    }

    /// Records an absolute cursor position. The first position only sets the
    /// baseline so the camera does not jump when the cursor enters the window.
    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        if let Some((last_x, last_y)) = self.last_cursor {
            self.frame.cursor_delta.0 += x - last_x;
            self.frame.cursor_delta.1 += y - last_y;
        }
        self.last_cursor = Some((x, y));
    }

    pub fn cursor_left(&mut self) {
        self.last_cursor = None;
    }

    pub fn scrolled(&mut self, delta: MouseScrollDelta) {
        self.frame.scroll += match delta {
            MouseScrollDelta::LineDelta(_, lines) => lines,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
        };
    }

    /// Focus loss clears held keys so none stay stuck
    pub fn focus_changed(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            self.keys_down.clear();
            self.buttons_down.clear();
            self.last_cursor = None;
        }
    }

    pub fn key_down(&self, code: KeyCode) -> bool {
        self.keys_down.contains(&code)
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn focused(&self) -> bool {
        self.focused
    }

    /// Returns the deltas gathered since the previous call and resets them
    pub fn take_frame(&mut self) -> InputFrame {
        std::mem::take(&mut self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_cursor_event_produces_no_delta() {
        let mut input = InputState::new();
        input.cursor_moved(400.0, 300.0);
        assert_eq!(input.take_frame().cursor_delta, (0.0, 0.0));

        input.cursor_moved(410.0, 295.0);
        input.cursor_moved(415.0, 290.0);
        assert_eq!(input.take_frame().cursor_delta, (15.0, -10.0));
        assert_eq!(input.take_frame(), InputFrame::default());
    }

    #[test]
    fn test_keys_are_cleared_on_focus_loss() {
        let mut input = InputState::new();
        input.key(KeyCode::KeyW, ElementState::Pressed);
        assert!(input.key_down(KeyCode::KeyW));

        input.focus_changed(false);
        assert!(!input.key_down(KeyCode::KeyW));
    }

    #[test]
    fn test_scroll_accumulates_lines_and_pixels() {
        let mut input = InputState::new();
        input.scrolled(MouseScrollDelta::LineDelta(0.0, 1.0));
        input.scrolled(MouseScrollDelta::PixelDelta(
            winit::dpi::PhysicalPosition::new(0.0, 80.0),
        ));
        assert_eq!(input.take_frame().scroll, 3.0);
    }
}
