use std::rc::Rc;

use super::{drawable::Drawable, vertex::VertexLayout};
use crate::gfx::{
    geometry::skybox_cube,
    rendering::recorder::PassRecorder,
    resources::{
        texture_registry::{TextureId, TextureSource},
        texture_units::SKYBOX_UNIT,
    },
    shader::program::ShaderProgram,
};

/// A cubemap drawn around the camera at maximum depth
#[derive(Debug, Clone)]
pub struct Skybox {
    pub drawable: Rc<Drawable>,
    pub cubemap: TextureId,
}

impl Skybox {
    pub fn new(cubemap: TextureId) -> Self {
        let drawable = Drawable::from_vertices("Skybox", VertexLayout::Skybox, &skybox_cube(), &[]);
        Self {
            drawable: Rc::new(drawable),
            cubemap,
        }
    }

    pub fn draw(&self, program: &ShaderProgram, recorder: &mut PassRecorder) {
        recorder.bind_texture(SKYBOX_UNIT, TextureSource::Texture(self.cubemap));
        self.drawable.draw(program, recorder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        rendering::recorder::{ClearOps, PassKind, Viewport},
        scene::drawable::DrawCall,
        shader::program::ProgramKind,
    };

    #[test]
    fn test_skybox_draws_its_cubemap() {
        let mut ids = slotmap::SlotMap::<TextureId, ()>::with_key();
        let cubemap = ids.insert(());
        let skybox = Skybox::new(cubemap);
        let program = ShaderProgram::new(ProgramKind::Skybox).unwrap();
        let mut recorder = PassRecorder::new(PassKind::Skybox, Viewport::full(2, 2), ClearOps::load());

        skybox.draw(&program, &mut recorder);
        let pass = recorder.finish();
        assert_eq!(pass.commands[0].call, DrawCall::Arrays { vertex_count: 36 });
        assert_eq!(
            pass.commands[0].texture_at(SKYBOX_UNIT),
            Some(TextureSource::Texture(cubemap))
        );
    }
}
