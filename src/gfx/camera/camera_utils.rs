use cgmath::{Matrix4, Point3, SquareMatrix, Vector3, Vector4};

use super::fly_camera::OPENGL_TO_WGPU_MATRIX;
use crate::config::ShadowSettings;

/// The view matrix with its translation removed, so the skybox follows the camera
pub fn skybox_view(view: Matrix4<f32>) -> Matrix4<f32> {
    let mut rotation_only = view;
    rotation_only.w = Vector4::new(0.0, 0.0, 0.0, 1.0);
    rotation_only
}

/// Orthographic view-projection of a light looking at the shadow target
pub fn light_space_matrix(light_position: Point3<f32>, shadow: &ShadowSettings) -> Matrix4<f32> {
    let target = Point3::from(shadow.target);
    let direction = target - light_position;

    // look_at degenerates when the light sits straight above the target
    let up = if direction.x.abs() < 1e-4 && direction.z.abs() < 1e-4 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    if direction == Vector3::new(0.0, 0.0, 0.0) {
        return Matrix4::identity();
    }

    let view = Matrix4::look_at_rh(light_position, target, up);
    let h = shadow.half_extent;
    let projection = cgmath::ortho(-h, h, -h, h, shadow.near, shadow.far);
    OPENGL_TO_WGPU_MATRIX * projection * view
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{Deg, Matrix3};

    use crate::gfx::camera::FlyCamera;

    #[test]
    fn test_skybox_view_ignores_camera_position() {
        let mut near = FlyCamera::new(Point3::new(0.0, 0.0, 0.0));
        let mut far = FlyCamera::new(Point3::new(40.0, -3.0, 12.0));
        near.process_mouse_movement(120.0, 40.0);
        far.process_mouse_movement(120.0, 40.0);

        let a = skybox_view(near.view_matrix());
        let b = skybox_view(far.view_matrix());
        for (ca, cb) in [(a.x, b.x), (a.y, b.y), (a.z, b.z), (a.w, b.w)] {
            for i in 0..4 {
                assert_relative_eq!(ca[i], cb[i], epsilon = 1e-5);
            }
        }
        assert_eq!(a.w, Vector4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_skybox_view_keeps_rotation() {
        let view = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0))
            * Matrix4::from(Matrix3::from_angle_y(Deg(30.0)));
        let stripped = skybox_view(view);
        assert_eq!(stripped.x, view.x);
        assert_eq!(stripped.y, view.y);
        assert_eq!(stripped.z, view.z);
    }

    #[test]
    fn test_light_space_projects_target_into_depth_range() {
        let shadow = ShadowSettings::default();
        let light = Point3::new(-2.0, 4.0, -1.0);
        let clip = light_space_matrix(light, &shadow) * Vector4::new(0.0, 0.0, 0.0, 1.0);

        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1e-5);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn test_light_directly_above_target_is_not_degenerate() {
        let m = light_space_matrix(Point3::new(0.0, 10.0, 0.0), &ShadowSettings::default());
        assert!(m.x.x.is_finite() && m.z.z.is_finite());
        assert_ne!(m.determinant(), 0.0);
    }
}
