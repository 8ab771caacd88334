//! Scene entities
//!
//! An entity places a shared [`Drawable`] in the world and injects its own
//! parameters (model matrix, uv scale, textures) into whichever program is
//! drawing it.

use std::rc::Rc;

use cgmath::{Deg, Matrix, Matrix4, SquareMatrix, Vector3};

use super::drawable::Drawable;
use crate::gfx::{
    rendering::recorder::PassRecorder,
    resources::{
        texture_registry::{TextureId, TextureSource},
        texture_units::{DIFFUSE_UNIT, NORMAL_UNIT},
    },
    shader::program::ShaderProgram,
};

/// Position, Euler rotation in degrees (applied X, then Y, then Z), scale and
/// texture coordinate scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub uv_scale: [f32; 2],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            uv_scale: [1.0, 1.0],
        }
    }
}

impl Transform {
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Vector3<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_uniform_scale(self, scale: f32) -> Self {
        self.with_scale(Vector3::new(scale, scale, scale))
    }

    pub fn with_uv_scale(mut self, uv_scale: [f32; 2]) -> Self {
        self.uv_scale = uv_scale;
        self
    }

    /// `T · Rx · Ry · Rz · S`
    pub fn model_matrix(&self) -> Matrix4<f32> {
        let mut model = Matrix4::from_translation(self.position);
        // A zero angle skips its multiply
        if self.rotation.x != 0.0 {
            model = model * Matrix4::from_angle_x(Deg(self.rotation.x));
        }
        if self.rotation.y != 0.0 {
            model = model * Matrix4::from_angle_y(Deg(self.rotation.y));
        }
        if self.rotation.z != 0.0 {
            model = model * Matrix4::from_angle_z(Deg(self.rotation.z));
        }
        model * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Inverse transpose of the model matrix, which keeps normals
    /// perpendicular to their surface under non-uniform scale
    ///
    /// A degenerate (zero-scaled) transform falls back to the model matrix.
    pub fn normal_matrix(&self) -> Matrix4<f32> {
        let model = self.model_matrix();
        model.invert().map_or(model, |inverse| inverse.transpose())
    }
}

#[derive(Debug, Clone)]
pub struct SceneEntity {
    pub drawable: Rc<Drawable>,
    pub transform: Transform,
    pub diffuse: Option<TextureId>,
    pub normal_map: Option<TextureId>,
    pub casts_shadow: bool,
    pub outlined: bool,
}

impl SceneEntity {
    pub fn new(drawable: Rc<Drawable>, transform: Transform) -> Self {
        Self {
            drawable,
            transform,
            diffuse: None,
            normal_map: None,
            casts_shadow: true,
            outlined: false,
        }
    }

    pub fn with_diffuse(mut self, texture: Option<TextureId>) -> Self {
        self.diffuse = texture;
        self
    }

    pub fn with_normal_map(mut self, texture: Option<TextureId>) -> Self {
        self.normal_map = texture;
        self
    }

    pub fn with_shadow(mut self, casts_shadow: bool) -> Self {
        self.casts_shadow = casts_shadow;
        self
    }

    pub fn with_outline(mut self, outlined: bool) -> Self {
        self.outlined = outlined;
        self
    }

    /// Binds this entity's textures, uploads its parameters and records one
    /// draw of its drawable
    ///
    /// Parameters the program does not declare are left out, so the same
    /// entity can be drawn by the depth, outline and lit programs.
    pub fn draw(&self, program: &mut ShaderProgram, recorder: &mut PassRecorder) {
        let diffuse = self.diffuse.map_or(TextureSource::White, TextureSource::Texture);
        recorder.bind_texture(DIFFUSE_UNIT, diffuse);

        match self.normal_map {
            Some(id) => recorder.bind_texture(NORMAL_UNIT, TextureSource::Texture(id)),
            None => recorder.bind_texture(NORMAL_UNIT, TextureSource::FlatNormal),
        }
        if declares(program, "has_normal_map") {
            program.set_bool("has_normal_map", self.normal_map.is_some());
        }

        program.set_mat4("model", &self.transform.model_matrix());
        if declares(program, "normal_matrix") {
            program.set_mat4("normal_matrix", &self.transform.normal_matrix());
        }
        if declares(program, "uv_scale") {
            program.set_vec2("uv_scale", self.transform.uv_scale);
        }

        self.drawable.draw(program, recorder);
    }
}

fn declares(program: &ShaderProgram, name: &str) -> bool {
    program.uniform_layout().field(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        geometry::textured_cube,
        rendering::recorder::{ClearOps, PassKind, Viewport},
        shader::program::ProgramKind,
    };
    use approx::assert_relative_eq;
    use cgmath::InnerSpace;

    /// Model matrix without the zero-angle skip
    fn full_model_matrix(t: &Transform) -> Matrix4<f32> {
        Matrix4::from_translation(t.position)
            * Matrix4::from_angle_x(Deg(t.rotation.x))
            * Matrix4::from_angle_y(Deg(t.rotation.y))
            * Matrix4::from_angle_z(Deg(t.rotation.z))
            * Matrix4::from_nonuniform_scale(t.scale.x, t.scale.y, t.scale.z)
    }

    fn cube() -> Rc<Drawable> {
        Rc::new(Drawable::new("cube", &textured_cube()))
    }

    fn assert_matrices_close(a: Matrix4<f32>, b: Matrix4<f32>) {
        let a: [[f32; 4]; 4] = a.into();
        let b: [[f32; 4]; 4] = b.into();
        for (col_a, col_b) in a.iter().zip(b.iter()) {
            for (x, y) in col_a.iter().zip(col_b.iter()) {
                assert_relative_eq!(*x, *y, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_identity_transform_is_identity_matrix() {
        let entity = SceneEntity::new(cube(), Transform::default());
        assert_eq!(entity.transform.model_matrix(), Matrix4::identity());
    }

    #[test]
    fn test_composition_order() {
        let transform = Transform::at(Vector3::new(1.0, -2.0, 3.0))
            .with_rotation(Vector3::new(30.0, 45.0, 60.0))
            .with_scale(Vector3::new(2.0, 1.0, 0.5));
        assert_matrices_close(transform.model_matrix(), full_model_matrix(&transform));

        // Swapping the axis order gives a different matrix
        let swapped = Matrix4::from_translation(transform.position)
            * Matrix4::from_angle_z(Deg(60.0))
            * Matrix4::from_angle_y(Deg(45.0))
            * Matrix4::from_angle_x(Deg(30.0))
            * Matrix4::from_nonuniform_scale(2.0, 1.0, 0.5);
        assert_ne!(transform.model_matrix(), swapped);
    }

    #[test]
    fn test_zero_z_rotation_equals_omitting_it() {
        let transform = Transform::at(Vector3::new(0.5, 0.0, -1.0))
            .with_rotation(Vector3::new(20.0, -35.0, 0.0))
            .with_uniform_scale(1.5);
        let without_z = Matrix4::from_translation(transform.position)
            * Matrix4::from_angle_x(Deg(20.0))
            * Matrix4::from_angle_y(Deg(-35.0))
            * Matrix4::from_scale(1.5);

        assert_matrices_close(transform.model_matrix(), without_z);
        assert_matrices_close(transform.model_matrix(), full_model_matrix(&transform));
    }

    #[test]
    fn test_normals_stay_perpendicular_under_non_uniform_scale() {
        let transform = Transform::default()
            .with_rotation(Vector3::new(0.0, 0.0, 30.0))
            .with_scale(Vector3::new(4.0, 1.0, 1.0));
        let model = transform.model_matrix();
        let normal_matrix = transform.normal_matrix();

        // Surface along (1, -1, 0) with normal (1, 1, 0)
        let tangent = (model * Vector3::new(1.0, -1.0, 0.0).extend(0.0)).truncate();
        let normal = (normal_matrix * Vector3::new(1.0, 1.0, 0.0).extend(0.0)).truncate();
        assert_relative_eq!(tangent.dot(normal), 0.0, epsilon = 1e-5);

        // Transforming by the model matrix alone skews the normal
        let skewed = (model * Vector3::new(1.0, 1.0, 0.0).extend(0.0)).truncate();
        assert!(tangent.dot(skewed).abs() > 1.0);

        let rigid = Transform::default().with_rotation(Vector3::new(10.0, 20.0, 30.0));
        assert_matrices_close(rigid.normal_matrix(), rigid.model_matrix());
    }

    #[test]
    fn test_lit_program_receives_normal_matrix() {
        let mut program = ShaderProgram::new(ProgramKind::Lit).unwrap();
        let mut recorder = PassRecorder::new(PassKind::Lit, Viewport::full(4, 4), ClearOps::load());
        let transform = Transform::default().with_scale(Vector3::new(2.0, 1.0, 1.0));
        SceneEntity::new(cube(), transform).draw(&mut program, &mut recorder);

        let offset = program.uniform_layout().offset_of("normal_matrix").unwrap();
        let command = &recorder.finish().commands[0];
        assert_eq!(&command.uniforms[offset..offset + 4], &0.5f32.to_ne_bytes());
        assert_eq!(program.ignored_uniforms().count(), 0);
    }

    #[test]
    fn test_draw_without_normal_map_resets_unit() {
        let mut program = ShaderProgram::new(ProgramKind::Lit).unwrap();
        let mut recorder = PassRecorder::new(PassKind::Lit, Viewport::full(4, 4), ClearOps::load());

        // A stale binding from an earlier entity must not leak
        recorder.bind_texture(NORMAL_UNIT, TextureSource::White);
        let entity = SceneEntity::new(cube(), Transform::default().with_uv_scale([4.0, 2.0]));
        entity.draw(&mut program, &mut recorder);

        let pass = recorder.finish();
        let command = &pass.commands[0];
        assert_eq!(command.texture_at(NORMAL_UNIT), Some(TextureSource::FlatNormal));
        assert_eq!(command.texture_at(DIFFUSE_UNIT), Some(TextureSource::White));

        let layout = program.uniform_layout();
        let flag = layout.offset_of("has_normal_map").unwrap();
        assert_eq!(&command.uniforms[flag..flag + 4], &0u32.to_ne_bytes());
        let uv = layout.offset_of("uv_scale").unwrap();
        assert_eq!(&command.uniforms[uv..uv + 4], &4.0f32.to_ne_bytes());
        assert_eq!(program.ignored_uniforms().count(), 0);
    }

    #[test]
    fn test_depth_program_only_receives_model() {
        let mut program = ShaderProgram::new(ProgramKind::ShadowDepth).unwrap();
        let mut recorder = PassRecorder::new(
            PassKind::ShadowDepth,
            Viewport::full(4, 4),
            ClearOps::depth_only(),
        );
        let entity = SceneEntity::new(cube(), Transform::at(Vector3::new(3.0, 0.0, 0.0)));
        entity.draw(&mut program, &mut recorder);

        assert_eq!(program.ignored_uniforms().count(), 0);
        let model = program.uniform_layout().offset_of("model").unwrap();
        // Translation x sits in the fourth column
        let tx = model + 12 * 4;
        assert_eq!(&program.uniform_bytes()[tx..tx + 4], &3.0f32.to_ne_bytes());
        assert!(recorder.finish().commands[0].textures.is_empty());
    }
}
