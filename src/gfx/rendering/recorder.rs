//! Recorded render passes
//!
//! Passes are first recorded into plain data: target, viewport, clear
//! operations, raster state and a list of draw commands carrying a snapshot of
//! the program's uniforms and the texture bound at each of its units. The
//! render engine replays them onto wgpu. Nothing here touches the GPU.

use std::{collections::BTreeMap, rc::Rc};

use crate::gfx::{
    resources::texture_registry::TextureSource,
    scene::drawable::{DrawCall, Drawable},
    shader::program::{ProgramKind, ShaderProgram},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    ShadowDepth,
    Outline,
    Lit,
    Skybox,
    Composite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    ShadowMap,
    Offscreen,
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthState {
    /// `None` disables depth testing
    pub compare: Option<wgpu::CompareFunction>,
    pub write: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterState {
    pub cull: Option<wgpu::Face>,
    pub depth: DepthState,
}

impl PassKind {
    /// Frame order
    pub const ALL: [PassKind; 5] = [
        PassKind::ShadowDepth,
        PassKind::Outline,
        PassKind::Lit,
        PassKind::Skybox,
        PassKind::Composite,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PassKind::ShadowDepth => "Shadow Pass",
            PassKind::Outline => "Outline Pass",
            PassKind::Lit => "Lit Pass",
            PassKind::Skybox => "Skybox Pass",
            PassKind::Composite => "Composite Pass",
        }
    }

    pub fn program(self) -> ProgramKind {
        match self {
            PassKind::ShadowDepth => ProgramKind::ShadowDepth,
            PassKind::Outline => ProgramKind::Outline,
            PassKind::Lit => ProgramKind::Lit,
            PassKind::Skybox => ProgramKind::Skybox,
            PassKind::Composite => ProgramKind::Composite,
        }
    }

    pub fn target(self) -> PassTarget {
        match self {
            PassKind::ShadowDepth => PassTarget::ShadowMap,
            PassKind::Outline | PassKind::Lit | PassKind::Skybox => PassTarget::Offscreen,
            PassKind::Composite => PassTarget::Surface,
        }
    }

    /// Raster state of the pass; each pass pipeline is built from it, so no
    /// state leaks into the next pass
    pub fn raster_state(self) -> RasterState {
        let default_depth = DepthState {
            compare: Some(wgpu::CompareFunction::Less),
            write: true,
        };
        match self {
            PassKind::ShadowDepth | PassKind::Lit => RasterState {
                cull: None,
                depth: default_depth,
            },
            PassKind::Outline => RasterState {
                cull: Some(wgpu::Face::Front),
                depth: default_depth,
            },
            PassKind::Skybox => RasterState {
                cull: None,
                depth: DepthState {
                    compare: Some(wgpu::CompareFunction::LessEqual),
                    write: false,
                },
            },
            PassKind::Composite => RasterState {
                cull: None,
                depth: DepthState {
                    compare: None,
                    write: false,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
        }
    }
}

/// `None` keeps the attachment's previous contents
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearOps {
    pub color: Option<[f32; 4]>,
    pub depth: Option<f32>,
    pub stencil: Option<u32>,
}

impl ClearOps {
    pub fn load() -> Self {
        Self::default()
    }

    pub fn depth_only() -> Self {
        Self {
            depth: Some(1.0),
            ..Self::default()
        }
    }

    pub fn all(color: [f32; 4]) -> Self {
        Self {
            color: Some(color),
            depth: Some(1.0),
            stencil: Some(0),
        }
    }

    pub fn color(color: [f32; 4]) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub program: ProgramKind,
    pub drawable: Rc<Drawable>,
    pub call: DrawCall,
    /// Program uniforms at the time of the draw
    pub uniforms: Vec<u8>,
    /// Source sampled at each unit the program declares, ascending by unit
    pub textures: Vec<(u32, TextureSource)>,
}

impl DrawCommand {
    pub fn texture_at(&self, unit: u32) -> Option<TextureSource> {
        self.textures
            .iter()
            .find(|(u, _)| *u == unit)
            .map(|(_, source)| *source)
    }
}

#[derive(Debug, Clone)]
pub struct RecordedPass {
    pub kind: PassKind,
    pub target: PassTarget,
    pub viewport: Viewport,
    pub clear: ClearOps,
    pub state: RasterState,
    pub commands: Vec<DrawCommand>,
}

/// Collects the draws of one pass
///
/// Texture bindings start empty for every pass and persist from one draw to
/// the next until rebound, so entities reset the units they use optionally.
pub struct PassRecorder {
    pass: RecordedPass,
    bound: BTreeMap<u32, TextureSource>,
}

impl PassRecorder {
    pub fn new(kind: PassKind, viewport: Viewport, clear: ClearOps) -> Self {
        Self {
            pass: RecordedPass {
                kind,
                target: kind.target(),
                viewport,
                clear,
                state: kind.raster_state(),
                commands: Vec::new(),
            },
            bound: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> PassKind {
        self.pass.kind
    }

    pub fn bind_texture(&mut self, unit: u32, source: TextureSource) {
        self.bound.insert(unit, source);
    }

    pub fn bound_texture(&self, unit: u32) -> Option<TextureSource> {
        self.bound.get(&unit).copied()
    }

    pub fn record_draw(&mut self, program: &ShaderProgram, drawable: &Rc<Drawable>, call: DrawCall) {
        let textures = program
            .texture_units()
            .iter()
            .map(|u| (u.unit, self.bound.get(&u.unit).copied().unwrap_or(u.fallback)))
            .collect();

        self.pass.commands.push(DrawCommand {
            program: program.kind(),
            drawable: Rc::clone(drawable),
            call,
            uniforms: program.uniform_bytes().to_vec(),
            textures,
        });
    }

    pub fn finish(self) -> RecordedPass {
        self.pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        geometry::textured_cube,
        resources::texture_units::{NORMAL_UNIT, SHADOW_UNIT},
    };

    #[test]
    fn test_raster_states() {
        assert_eq!(PassKind::Outline.raster_state().cull, Some(wgpu::Face::Front));
        assert_eq!(PassKind::Lit.raster_state().cull, None);
        let skybox = PassKind::Skybox.raster_state().depth;
        assert_eq!(skybox.compare, Some(wgpu::CompareFunction::LessEqual));
        assert!(!skybox.write);
        assert_eq!(PassKind::Composite.raster_state().depth.compare, None);
        // Every pass after the skybox is back on the default comparison or none
        assert_eq!(
            PassKind::ShadowDepth.raster_state().depth.compare,
            Some(wgpu::CompareFunction::Less)
        );
    }

    #[test]
    fn test_unbound_units_use_program_fallbacks() {
        let program = ShaderProgram::new(ProgramKind::Lit).unwrap();
        let drawable = Rc::new(Drawable::new("cube", &textured_cube()));
        let mut recorder = PassRecorder::new(PassKind::Lit, Viewport::full(4, 4), ClearOps::load());

        recorder.record_draw(&program, &drawable, drawable.draw_call());
        let pass = recorder.finish();
        let command = &pass.commands[0];

        assert_eq!(command.texture_at(0), Some(TextureSource::White));
        assert_eq!(command.texture_at(NORMAL_UNIT), Some(TextureSource::FlatNormal));
        assert_eq!(command.texture_at(SHADOW_UNIT), Some(TextureSource::ShadowMap));
        assert_eq!(pass.target, PassTarget::Offscreen);
    }

    #[test]
    fn test_bindings_reset_between_passes() {
        let program = ShaderProgram::new(ProgramKind::Lit).unwrap();
        let drawable = Rc::new(Drawable::new("cube", &textured_cube()));

        let mut first = PassRecorder::new(PassKind::Lit, Viewport::full(4, 4), ClearOps::load());
        first.bind_texture(NORMAL_UNIT, TextureSource::White);
        first.record_draw(&program, &drawable, drawable.draw_call());

        let mut second = PassRecorder::new(PassKind::Lit, Viewport::full(4, 4), ClearOps::load());
        second.record_draw(&program, &drawable, drawable.draw_call());

        assert_eq!(
            first.finish().commands[0].texture_at(NORMAL_UNIT),
            Some(TextureSource::White)
        );
        assert_eq!(
            second.finish().commands[0].texture_at(NORMAL_UNIT),
            Some(TextureSource::FlatNormal)
        );
    }
}
