pub mod camera_controller;
pub mod camera_utils;
pub mod fly_camera;

// Re-export main types
pub use camera_controller::CameraController;
pub use camera_utils::{light_space_matrix, skybox_view};
pub use fly_camera::{FlyCamera, Movement, OPENGL_TO_WGPU_MATRIX};
