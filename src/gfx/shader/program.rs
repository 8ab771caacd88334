//! Shader programs
//!
//! A program pairs a WGSL module with the named uniforms it reads per draw
//! (bind group 1) and the texture units it samples (bind group 2). Uniform
//! values persist between draws until overwritten, so a pass sets its shared
//! values once and each entity only updates its own.

use std::collections::HashSet;

use cgmath::Matrix4;

use super::uniforms::{UniformLayout, UniformMismatch, UniformType, UniformValue, UniformValues};
use crate::{
    error::Result,
    gfx::{
        resources::{
            texture_registry::TextureSource,
            texture_units::{
                TextureKind, TextureUnitTable, DIFFUSE_UNIT, NORMAL_UNIT, SCENE_COLOR_UNIT,
                SHADOW_UNIT, SKYBOX_UNIT,
            },
        },
        scene::vertex::VertexLayout,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    ShadowDepth,
    Outline,
    Lit,
    Skybox,
    Composite,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 5] = [
        ProgramKind::ShadowDepth,
        ProgramKind::Outline,
        ProgramKind::Lit,
        ProgramKind::Skybox,
        ProgramKind::Composite,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProgramKind::ShadowDepth => "shadow_depth",
            ProgramKind::Outline => "outline",
            ProgramKind::Lit => "lit",
            ProgramKind::Skybox => "skybox",
            ProgramKind::Composite => "screen",
        }
    }

    pub fn source(self) -> &'static str {
        match self {
            ProgramKind::ShadowDepth => include_str!("../rendering/shadow_depth.wgsl"),
            ProgramKind::Outline => include_str!("../rendering/outline.wgsl"),
            ProgramKind::Lit => include_str!("../rendering/lit.wgsl"),
            ProgramKind::Skybox => include_str!("../rendering/skybox.wgsl"),
            ProgramKind::Composite => include_str!("../rendering/screen.wgsl"),
        }
    }

    pub fn vertex_layout(self) -> VertexLayout {
        match self {
            ProgramKind::Skybox => VertexLayout::Skybox,
            ProgramKind::Composite => VertexLayout::Screen,
            _ => VertexLayout::Mesh,
        }
    }

    /// Field order must match the `DrawUniforms` struct of the program's WGSL
    fn uniform_layout(self) -> UniformLayout {
        use UniformType::*;
        match self {
            ProgramKind::ShadowDepth => {
                UniformLayout::new(&[("light_space", Mat4), ("model", Mat4)])
            }
            ProgramKind::Outline => UniformLayout::new(&[
                ("model", Mat4),
                ("outline_color", Vec4),
                ("outline_width", Float),
            ]),
            ProgramKind::Lit => UniformLayout::new(&[
                ("model", Mat4),
                ("light_space", Mat4),
                ("uv_scale", Vec2),
                ("shininess", Float),
                ("toon_levels", Int),
                ("has_normal_map", Bool),
                ("normal_matrix", Mat4),
            ]),
            ProgramKind::Skybox => UniformLayout::new(&[("view", Mat4)]),
            ProgramKind::Composite => UniformLayout::new(&[
                ("exposure", Float),
                ("gamma", Float),
                ("tone_map", Bool),
            ]),
        }
    }

    fn texture_units(self) -> Result<TextureUnitTable> {
        let mut table = TextureUnitTable::new();
        match self {
            ProgramKind::ShadowDepth | ProgramKind::Outline => {}
            ProgramKind::Lit => {
                table.assign("diffuse", DIFFUSE_UNIT, TextureKind::Color2d, TextureSource::White)?;
                table.assign(
                    "normal_map",
                    NORMAL_UNIT,
                    TextureKind::Color2d,
                    TextureSource::FlatNormal,
                )?;
                table.assign(
                    "shadow_map",
                    SHADOW_UNIT,
                    TextureKind::Depth,
                    TextureSource::ShadowMap,
                )?;
            }
            ProgramKind::Skybox => {
                table.assign("skybox", SKYBOX_UNIT, TextureKind::Cube, TextureSource::BlackCube)?;
            }
            ProgramKind::Composite => {
                table.assign(
                    "scene_color",
                    SCENE_COLOR_UNIT,
                    TextureKind::Color2d,
                    TextureSource::SceneColor,
                )?;
            }
        }
        Ok(table)
    }
}

pub struct ShaderProgram {
    kind: ProgramKind,
    values: UniformValues,
    texture_units: TextureUnitTable,
    reported: HashSet<String>,
}

impl ShaderProgram {
    pub fn new(kind: ProgramKind) -> Result<Self> {
        Ok(Self {
            kind,
            values: UniformValues::new(kind.uniform_layout()),
            texture_units: kind.texture_units()?,
            reported: HashSet::new(),
        })
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn uniform_layout(&self) -> &UniformLayout {
        self.values.layout()
    }

    pub fn texture_units(&self) -> &TextureUnitTable {
        &self.texture_units
    }

    /// Snapshot of the current uniform values
    pub fn uniform_bytes(&self) -> &[u8] {
        self.values.bytes()
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.set(name, UniformValue::Bool(value));
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.set(name, UniformValue::Int(value));
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.set(name, UniformValue::Float(value));
    }

    pub fn set_vec2(&mut self, name: &str, value: impl Into<[f32; 2]>) {
        self.set(name, UniformValue::Vec2(value.into()));
    }

    pub fn set_vec3(&mut self, name: &str, value: impl Into<[f32; 3]>) {
        self.set(name, UniformValue::Vec3(value.into()));
    }

    pub fn set_vec4(&mut self, name: &str, value: impl Into<[f32; 4]>) {
        self.set(name, UniformValue::Vec4(value.into()));
    }

    pub fn set_mat4(&mut self, name: &str, value: &Matrix4<f32>) {
        self.set(name, UniformValue::from(*value));
    }

    /// Writes a named uniform. Unknown names and type mismatches are ignored
    /// and reported once per name.
    pub fn set(&mut self, name: &str, value: UniformValue) {
        let Err(mismatch) = self.values.set(name, value) else {
            return;
        };
        if !self.reported.insert(name.to_string()) {
            return;
        }

        let message = match mismatch {
            UniformMismatch::Unknown => {
                format!("program '{}' has no uniform '{name}'", self.name())
            }
            UniformMismatch::WrongType { expected, found } => format!(
                "program '{}' uniform '{name}' is {expected:?}, not {found:?}",
                self.name()
            ),
        };
        if cfg!(debug_assertions) {
            log::warn!("{message}; ignoring");
        } else {
            log::debug!("{message}; ignoring");
        }
    }

    /// Names whose writes were ignored so far
    pub fn ignored_uniforms(&self) -> impl Iterator<Item = &str> {
        self.reported.iter().map(String::as_str)
    }
}

/// One program per kind
pub struct ProgramSet {
    programs: Vec<ShaderProgram>,
}

impl ProgramSet {
    pub fn new() -> Result<Self> {
        let programs = ProgramKind::ALL
            .into_iter()
            .map(ShaderProgram::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { programs })
    }

    pub fn get(&self, kind: ProgramKind) -> &ShaderProgram {
        &self.programs[Self::index(kind)]
    }

    pub fn get_mut(&mut self, kind: ProgramKind) -> &mut ShaderProgram {
        &mut self.programs[Self::index(kind)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShaderProgram> {
        self.programs.iter()
    }

    fn index(kind: ProgramKind) -> usize {
        ProgramKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or_default()
    }
}
