//! The five passes of a frame
//!
//! Each function sets the program's pass-wide uniforms, records its draws and
//! returns the finished pass. None of them can fail: an entity whose GPU data
//! is missing is skipped when the pass is executed.

use std::rc::Rc;

use super::{
    frame::{FrameExtents, FrameUniforms},
    post_process::PostProcessSettings,
    recorder::{ClearOps, PassKind, PassRecorder, RecordedPass, Viewport},
};
use crate::{
    gfx::{
        camera::skybox_view,
        resources::{
            texture_registry::TextureSource,
            texture_units::{SCENE_COLOR_UNIT, SHADOW_UNIT},
        },
        scene::{drawable::Drawable, scene::Scene},
        shader::program::ShaderProgram,
    },
    state::ShadingSettings,
};

/// Depth of every shadow caster as seen from the light
pub fn record_shadow_pass(
    scene: &Scene,
    frame: &FrameUniforms,
    program: &mut ShaderProgram,
    extents: &FrameExtents,
) -> RecordedPass {
    program.set_mat4("light_space", &frame.light_space);

    let size = extents.shadow_size;
    let mut recorder = PassRecorder::new(
        PassKind::ShadowDepth,
        Viewport::full(size, size),
        ClearOps::depth_only(),
    );
    for entity in scene.shadow_casters() {
        entity.draw(program, &mut recorder);
    }
    recorder.finish()
}

/// Back faces of outlined entities pushed out along their normals
///
/// Clears the offscreen target, so it always runs first among the offscreen
/// passes.
pub fn record_outline_pass(
    scene: &Scene,
    shading: &ShadingSettings,
    clear_color: [f32; 4],
    program: &mut ShaderProgram,
    extents: &FrameExtents,
) -> RecordedPass {
    program.set_vec4("outline_color", shading.outline_color);
    program.set_float("outline_width", shading.outline_width);

    let mut recorder = PassRecorder::new(
        PassKind::Outline,
        extents.viewport(),
        ClearOps::all(clear_color),
    );
    for entity in scene.outlined() {
        entity.draw(program, &mut recorder);
    }
    recorder.finish()
}

/// Every entity, Phong or toon shaded, with shadows
pub fn record_lit_pass(
    scene: &Scene,
    frame: &FrameUniforms,
    shading: &ShadingSettings,
    program: &mut ShaderProgram,
    extents: &FrameExtents,
) -> RecordedPass {
    program.set_mat4("light_space", &frame.light_space);
    program.set_float("shininess", shading.shininess);
    program.set_int("toon_levels", shading.toon_levels as i32);

    let mut recorder = PassRecorder::new(PassKind::Lit, extents.viewport(), ClearOps::load());
    recorder.bind_texture(SHADOW_UNIT, TextureSource::ShadowMap);
    for entity in scene.entities.iter() {
        entity.draw(program, &mut recorder);
    }
    recorder.finish()
}

/// The skybox behind everything drawn so far; records nothing without one
pub fn record_skybox_pass(
    scene: &Scene,
    frame: &FrameUniforms,
    program: &mut ShaderProgram,
    extents: &FrameExtents,
) -> RecordedPass {
    program.set_mat4("view", &skybox_view(frame.view));

    let mut recorder = PassRecorder::new(PassKind::Skybox, extents.viewport(), ClearOps::load());
    if let Some(skybox) = &scene.skybox {
        skybox.draw(program, &mut recorder);
    }
    recorder.finish()
}

/// Full-screen quad sampling the offscreen color
pub fn record_composite_pass(
    screen_quad: &Rc<Drawable>,
    post: &PostProcessSettings,
    program: &mut ShaderProgram,
    extents: &FrameExtents,
) -> RecordedPass {
    post.write_uniforms(program);

    let mut recorder = PassRecorder::new(
        PassKind::Composite,
        extents.viewport(),
        ClearOps::color([0.0, 0.0, 0.0, 1.0]),
    );
    recorder.bind_texture(SCENE_COLOR_UNIT, TextureSource::SceneColor);
    screen_quad.draw(program, &mut recorder);
    recorder.finish()
}
