use cgmath::*;

use crate::config::CameraSettings;

/// Remaps clip-space depth from OpenGL's -1..1 to wgpu's 0..1 (column-major)
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 45.0;
pub const PITCH_LIMIT: f32 = 89.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
}

/// First-person camera steered by yaw and pitch, both in degrees
///
/// Yaw -90 looks down -Z. Pitch stays inside ±89 so the view never flips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyCamera {
    pub position: Point3<f32>,
    pub yaw: f32,
    pub pitch: f32,
    pub speed: f32,
    pub sensitivity: f32,
    /// Vertical field of view in degrees, changed by scrolling
    pub zoom: f32,
    pub near: f32,
    pub far: f32,
    world_up: Vector3<f32>,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 3.0))
    }
}

impl FlyCamera {
    pub fn new(position: Point3<f32>) -> Self {
        let mut camera = Self {
            position,
            yaw: -90.0,
            pitch: 0.0,
            speed: 2.5,
            sensitivity: 0.1,
            zoom: MAX_ZOOM,
            near: 0.1,
            far: 100.0,
            world_up: Vector3::unit_y(),
            front: -Vector3::unit_z(),
            right: Vector3::unit_x(),
            up: Vector3::unit_y(),
        };
        camera.update_vectors();
        camera
    }

    pub fn from_settings(settings: &CameraSettings) -> Self {
        let mut camera = Self::new(Point3::from(settings.position));
        camera.speed = settings.speed;
        camera.sensitivity = settings.sensitivity;
        camera.zoom = settings.fov.clamp(MIN_ZOOM, MAX_ZOOM);
        camera.near = settings.near;
        camera.far = settings.far;
        camera
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.front, self.up)
    }

    /// Perspective projection mapped to wgpu's 0..1 depth range
    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        let aspect = aspect.max(f32::EPSILON);
        OPENGL_TO_WGPU_MATRIX * perspective(Deg(self.zoom), aspect, self.near, self.far)
    }

    pub fn process_keyboard(&mut self, direction: Movement, delta_time: f32) {
        let velocity = self.speed * delta_time;
        match direction {
            Movement::Forward => self.position += self.front * velocity,
            Movement::Backward => self.position -= self.front * velocity,
            Movement::Left => self.position -= self.right * velocity,
            Movement::Right => self.position += self.right * velocity,
        }
    }

    /// `y_offset` is positive when the cursor moves up
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32) {
        self.yaw += x_offset * self.sensitivity;
        self.pitch = (self.pitch + y_offset * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    pub fn process_mouse_scroll(&mut self, y_offset: f32) {
        self.zoom = (self.zoom - y_offset).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    fn update_vectors(&mut self) {
        let (yaw_sin, yaw_cos) = Deg(self.yaw).sin_cos();
        let (pitch_sin, pitch_cos) = Deg(self.pitch).sin_cos();
        self.front = Vector3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let camera = FlyCamera::default();
        assert_relative_eq!(camera.front().z, -1.0, epsilon = 1e-6);
        assert_relative_eq!(camera.front().x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(camera.right().x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_movement(0.0, 10_000.0);
        assert_eq!(camera.pitch, PITCH_LIMIT);
        camera.process_mouse_movement(0.0, -100_000.0);
        assert_eq!(camera.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_scroll(100.0);
        assert_eq!(camera.zoom, MIN_ZOOM);
        camera.process_mouse_scroll(-100.0);
        assert_eq!(camera.zoom, MAX_ZOOM);
    }

    #[test]
    fn test_movement_scales_with_delta_time() {
        let mut camera = FlyCamera::default();
        camera.process_keyboard(Movement::Forward, 0.5);
        assert_relative_eq!(camera.position.z, 1.75, epsilon = 1e-5);
        camera.process_keyboard(Movement::Right, 1.0);
        assert_relative_eq!(camera.position.x, 2.5, epsilon = 1e-5);
    }

    #[test]
    fn test_projection_maps_near_plane_to_zero_depth() {
        let camera = FlyCamera::default();
        let clip = camera.projection_matrix(1.0) * Vector4::new(0.0, 0.0, -camera.near, 1.0);
        assert_relative_eq!(clip.z / clip.w, 0.0, epsilon = 1e-5);

        let far = camera.projection_matrix(1.0) * Vector4::new(0.0, 0.0, -camera.far, 1.0);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-5);
    }
}
