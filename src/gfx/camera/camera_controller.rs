use winit::{event::MouseButton, keyboard::KeyCode};

use super::fly_camera::{FlyCamera, Movement};
use crate::input::{InputFrame, InputState};

/// Drives a [`FlyCamera`] from the held keys and the frame's input deltas
///
/// WASD moves, dragging with the look button turns the camera, and the
/// wheel zooms.
pub struct CameraController {
    pub look_button: MouseButton,
    /// When false the camera ignores the mouse, e.g. while the GUI has focus
    pub mouse_enabled: bool,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(MouseButton::Right)
    }
}

impl CameraController {
    const BINDINGS: [(KeyCode, Movement); 4] = [
        (KeyCode::KeyW, Movement::Forward),
        (KeyCode::KeyS, Movement::Backward),
        (KeyCode::KeyA, Movement::Left),
        (KeyCode::KeyD, Movement::Right),
    ];

    pub fn new(look_button: MouseButton) -> Self {
        Self {
            look_button,
            mouse_enabled: true,
        }
    }

    pub fn update(
        &self,
        camera: &mut FlyCamera,
        input: &InputState,
        frame: &InputFrame,
        delta_time: f32,
    ) {
        for (key, movement) in Self::BINDINGS {
            if input.key_down(key) {
                camera.process_keyboard(movement, delta_time);
            }
        }

        if !self.mouse_enabled {
            return;
        }

        if input.button_down(self.look_button) {
            let (dx, dy) = frame.cursor_delta;
            // Window y grows downward; pitch grows upward
            if dx != 0.0 || dy != 0.0 {
                camera.process_mouse_movement(dx, -dy);
            }
        }

        if frame.scroll != 0.0 {
            camera.process_mouse_scroll(frame.scroll);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use winit::event::ElementState;

    #[test]
    fn test_held_key_moves_camera() {
        let mut camera = FlyCamera::default();
        let mut input = InputState::new();
        input.key(KeyCode::KeyS, ElementState::Pressed);

        CameraController::default().update(&mut camera, &input, &InputFrame::default(), 1.0);
        assert_relative_eq!(camera.position.z, 5.5, epsilon = 1e-5);
    }

    #[test]
    fn test_look_requires_button() {
        let mut camera = FlyCamera::default();
        let mut input = InputState::new();
        let frame = InputFrame {
            cursor_delta: (0.0, -50.0),
            scroll: 0.0,
        };
        let controller = CameraController::default();

        controller.update(&mut camera, &input, &frame, 0.016);
        assert_eq!(camera.pitch, 0.0);

        input.button(MouseButton::Right, ElementState::Pressed);
        controller.update(&mut camera, &input, &frame, 0.016);
        assert_relative_eq!(camera.pitch, 5.0, epsilon = 1e-5);
    }

    #[test]
    fn test_scroll_zooms_in() {
        let mut camera = FlyCamera::default();
        let frame = InputFrame {
            cursor_delta: (0.0, 0.0),
            scroll: 2.0,
        };
        CameraController::default().update(&mut camera, &InputState::new(), &frame, 0.016);
        assert_eq!(camera.zoom, 43.0);
    }
}
