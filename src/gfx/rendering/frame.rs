//! Frame orchestration
//!
//! [`record_frame`] derives the frame's matrices once and records the five
//! passes in their fixed order. The result is plain data the render engine
//! executes; recording it needs no GPU.

use std::rc::Rc;

use cgmath::{Matrix4, Point3, SquareMatrix};

use super::{
    passes,
    recorder::{RecordedPass, Viewport},
};
use crate::{
    gfx::{
        camera::light_space_matrix,
        resources::global_bindings::CameraBlock,
        scene::{drawable::Drawable, light::PointLight, scene::Scene},
        shader::program::{ProgramKind, ProgramSet},
    },
    state::SimulationState,
};

/// Values derived once per frame before the first pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    /// `light_projection · light_view`, shared by the shadow and lit passes
    pub light_space: Matrix4<f32>,
    pub camera_position: Point3<f32>,
    pub light: PointLight,
    pub elapsed: f32,
    pub delta: f32,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            light_space: Matrix4::identity(),
            camera_position: Point3::new(0.0, 0.0, 0.0),
            light: PointLight::default(),
            elapsed: 0.0,
            delta: 0.0,
        }
    }
}

impl FrameUniforms {
    pub fn derive(state: &SimulationState, aspect: f32) -> Self {
        Self {
            view: state.camera.view_matrix(),
            projection: state.camera.projection_matrix(aspect),
            light_space: light_space_matrix(Point3::from(state.light.position), &state.shadow),
            camera_position: state.camera.position,
            light: state.light,
            elapsed: state.time.elapsed,
            delta: state.time.delta,
        }
    }

    pub fn camera_block(&self) -> CameraBlock {
        CameraBlock::new(self.view, self.projection, self.camera_position)
    }
}

/// Target sizes for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameExtents {
    pub width: u32,
    pub height: u32,
    pub shadow_size: u32,
}

impl FrameExtents {
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::full(self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct FramePlan {
    pub uniforms: FrameUniforms,
    /// Shadow, outline, lit, skybox, composite
    pub passes: Vec<RecordedPass>,
}

pub fn record_frame(
    scene: &Scene,
    state: &SimulationState,
    programs: &mut ProgramSet,
    screen_quad: &Rc<Drawable>,
    extents: &FrameExtents,
) -> FramePlan {
    let uniforms = FrameUniforms::derive(state, extents.aspect());

    let passes = vec![
        passes::record_shadow_pass(
            scene,
            &uniforms,
            programs.get_mut(ProgramKind::ShadowDepth),
            extents,
        ),
        passes::record_outline_pass(
            scene,
            &state.shading,
            state.clear_color,
            programs.get_mut(ProgramKind::Outline),
            extents,
        ),
        passes::record_lit_pass(
            scene,
            &uniforms,
            &state.shading,
            programs.get_mut(ProgramKind::Lit),
            extents,
        ),
        passes::record_skybox_pass(scene, &uniforms, programs.get_mut(ProgramKind::Skybox), extents),
        passes::record_composite_pass(
            screen_quad,
            &state.post,
            programs.get_mut(ProgramKind::Composite),
            extents,
        ),
    ];

    FramePlan { uniforms, passes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        geometry::{screen_quad, textured_cube},
        rendering::{post_process::PostProcessSettings, recorder::PassKind},
        scene::{
            entity::{SceneEntity, Transform},
            vertex::VertexLayout,
        },
        shader::program::ShaderProgram,
    };
    use cgmath::Vector3;

    fn quad() -> Rc<Drawable> {
        Rc::new(Drawable::from_vertices(
            "quad",
            VertexLayout::Screen,
            &screen_quad(),
            &[],
        ))
    }

    fn extents(width: u32, height: u32) -> FrameExtents {
        FrameExtents {
            width,
            height,
            shadow_size: 512,
        }
    }

    fn field<'a>(program: &ShaderProgram, bytes: &'a [u8], name: &str, len: usize) -> &'a [u8] {
        let offset = program.uniform_layout().offset_of(name).unwrap();
        &bytes[offset..offset + len]
    }

    #[test]
    fn test_passes_run_in_fixed_order() {
        let mut programs = ProgramSet::new().unwrap();
        let plan = record_frame(
            &Scene::new(),
            &SimulationState::default(),
            &mut programs,
            &quad(),
            &extents(640, 480),
        );
        let kinds: Vec<PassKind> = plan.passes.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, PassKind::ALL.to_vec());
    }

    #[test]
    fn test_shadow_and_lit_passes_share_light_space() {
        let cube = Rc::new(Drawable::new("cube", &textured_cube()));
        let mut scene = Scene::new();
        for x in [-2.0, 0.0, 2.0] {
            scene.add_entity(SceneEntity::new(
                Rc::clone(&cube),
                Transform::at(Vector3::new(x, 0.5, 0.0)),
            ));
        }
        let mut state = SimulationState::default();
        state.light.position = [3.0, 6.0, 2.0];

        let mut programs = ProgramSet::new().unwrap();
        let plan = record_frame(&scene, &state, &mut programs, &quad(), &extents(800, 600));

        let expected: [[f32; 4]; 4] = plan.uniforms.light_space.into();
        let expected = bytemuck::bytes_of(&expected);
        assert_ne!(plan.uniforms.light_space, Matrix4::identity());

        let shadow = programs.get(ProgramKind::ShadowDepth);
        let lit = programs.get(ProgramKind::Lit);
        let shadow_pass = &plan.passes[0];
        let lit_pass = &plan.passes[2];
        assert_eq!(shadow_pass.commands.len(), 3);
        assert_eq!(lit_pass.commands.len(), 3);
        for command in &shadow_pass.commands {
            assert_eq!(field(shadow, &command.uniforms, "light_space", 64), expected);
        }
        for command in &lit_pass.commands {
            assert_eq!(field(lit, &command.uniforms, "light_space", 64), expected);
        }
    }

    #[test]
    fn test_uniforms_are_derived_from_state() {
        let mut state = SimulationState::default();
        state.time.elapsed = 2.5;
        state.time.delta = 0.016;
        let uniforms = FrameUniforms::derive(&state, 2.0);

        assert_eq!(uniforms.view, state.camera.view_matrix());
        assert_eq!(uniforms.projection, state.camera.projection_matrix(2.0));
        assert_eq!(uniforms.elapsed, 2.5);
        assert_eq!(uniforms.camera_block().view_position[3], 1.0);
    }

    /// CPU model of the composite pass; no GPU shader runs here
    ///
    /// Checks that the recorded pass carries passthrough uniforms, that the
    /// screen quad covers every pixel center of a small surface (edge-function
    /// test on the quad's triangles), and that [`PostProcessSettings::apply`],
    /// the CPU reference of `screen.wgsl`, returns a 1x1 texture's texel
    /// unchanged. Together these stand in for "every pixel shows the offscreen
    /// color"; the WGSL itself is only compiled when the engine starts.
    #[test]
    fn test_composite_presents_offscreen_color_everywhere() {
        let texel = [1.0, 0.0, 0.0, 1.0];
        let mut state = SimulationState::default();
        state.post = PostProcessSettings::passthrough();

        let mut programs = ProgramSet::new().unwrap();
        let (width, height) = (7u32, 5u32);
        let plan = record_frame(&Scene::new(), &state, &mut programs, &quad(), &extents(width, height));
        let composite = plan.passes.last().unwrap();
        assert_eq!(composite.commands.len(), 1);

        let program = programs.get(ProgramKind::Composite);
        let bytes = &composite.commands[0].uniforms;
        assert_eq!(field(program, bytes, "exposure", 4), &1.0f32.to_ne_bytes());
        assert_eq!(field(program, bytes, "gamma", 4), &1.0f32.to_ne_bytes());
        assert_eq!(field(program, bytes, "tone_map", 4), &0u32.to_ne_bytes());

        let triangles: Vec<[[f32; 2]; 3]> = screen_quad()
            .chunks_exact(3)
            .map(|t| [t[0].position, t[1].position, t[2].position])
            .collect();
        let covers = |tri: &[[f32; 2]; 3], p: [f32; 2]| {
            let edge = |a: [f32; 2], b: [f32; 2]| (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
            let d = [edge(tri[0], tri[1]), edge(tri[1], tri[2]), edge(tri[2], tri[0])];
            d.iter().all(|&x| x >= 0.0) || d.iter().all(|&x| x <= 0.0)
        };

        for y in 0..height {
            for x in 0..width {
                let ndc = [
                    (x as f32 + 0.5) / width as f32 * 2.0 - 1.0,
                    1.0 - (y as f32 + 0.5) / height as f32 * 2.0,
                ];
                assert!(triangles.iter().any(|t| covers(t, ndc)), "pixel {x},{y} not covered");
            }
        }
        // A 1x1 texture returns its only texel for any coordinate
        assert_eq!(state.post.apply(texel), texel);
    }
}
