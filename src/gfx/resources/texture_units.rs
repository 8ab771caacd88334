//! Texture unit tables
//!
//! Each shader program names the textures it samples and the unit each one
//! lives at. Unit `u` maps to bind group 2 with the texture at binding `2u`
//! and its sampler at `2u + 1`.

use crate::{
    error::{RenderError, Result},
    gfx::resources::texture_registry::TextureSource,
    wgpu_utils::binding_types,
};

pub const DIFFUSE_UNIT: u32 = 0;
pub const NORMAL_UNIT: u32 = 1;
pub const SKYBOX_UNIT: u32 = 0;
pub const SCENE_COLOR_UNIT: u32 = 0;
/// High unit so it never collides with material textures
pub const SHADOW_UNIT: u32 = 10;
pub const MAX_TEXTURE_UNITS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Color2d,
    /// Depth texture sampled with a comparison sampler
    Depth,
    Cube,
}

impl TextureKind {
    pub fn binding_type(self) -> wgpu::BindingType {
        match self {
            TextureKind::Color2d => binding_types::texture_2d(),
            TextureKind::Depth => binding_types::texture_depth_2d(),
            TextureKind::Cube => binding_types::texture_cube(),
        }
    }

    pub fn sampler_binding_type(self) -> wgpu::BindingType {
        match self {
            TextureKind::Depth => binding_types::sampler(wgpu::SamplerBindingType::Comparison),
            TextureKind::Color2d | TextureKind::Cube => {
                binding_types::sampler(wgpu::SamplerBindingType::Filtering)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureUnit {
    pub unit: u32,
    pub name: String,
    pub kind: TextureKind,
    /// Bound when a draw does not bind anything to this unit
    pub fallback: TextureSource,
}

impl TextureUnit {
    pub fn texture_binding(&self) -> u32 {
        self.unit * 2
    }

    pub fn sampler_binding(&self) -> u32 {
        self.unit * 2 + 1
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureUnitTable {
    units: Vec<TextureUnit>,
}

impl TextureUnitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `name` at a fixed unit
    pub fn assign(
        &mut self,
        name: &str,
        unit: u32,
        kind: TextureKind,
        fallback: TextureSource,
    ) -> Result<()> {
        if unit >= MAX_TEXTURE_UNITS {
            return Err(RenderError::TextureUnitOutOfRange {
                unit,
                max: MAX_TEXTURE_UNITS,
            });
        }
        if let Some(existing) = self.units.iter().find(|u| u.unit == unit) {
            return Err(RenderError::TextureUnitCollision {
                unit,
                existing: existing.name.clone(),
                requested: name.to_string(),
            });
        }

        let index = self.units.partition_point(|u| u.unit < unit);
        self.units.insert(
            index,
            TextureUnit {
                unit,
                name: name.to_string(),
                kind,
                fallback,
            },
        );
        Ok(())
    }

    /// Places `name` at the lowest free unit and returns it
    pub fn assign_next(
        &mut self,
        name: &str,
        kind: TextureKind,
        fallback: TextureSource,
    ) -> Result<u32> {
        let unit = (0..MAX_TEXTURE_UNITS)
            .find(|candidate| self.units.iter().all(|u| u.unit != *candidate))
            .ok_or_else(|| RenderError::TextureUnitsExhausted(name.to_string()))?;
        self.assign(name, unit, kind, fallback)?;
        Ok(unit)
    }

    pub fn unit_of(&self, name: &str) -> Option<u32> {
        self.units.iter().find(|u| u.name == name).map(|u| u.unit)
    }

    pub fn get(&self, unit: u32) -> Option<&TextureUnit> {
        self.units.iter().find(|u| u.unit == unit)
    }

    /// Units in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &TextureUnit> {
        self.units.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Bind group 2 layout entries, texture then sampler for every unit
    pub fn layout_entries(&self) -> Vec<wgpu::BindGroupLayoutEntry> {
        self.units
            .iter()
            .flat_map(|u| {
                [
                    wgpu::BindGroupLayoutEntry {
                        binding: u.texture_binding(),
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: u.kind.binding_type(),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: u.sampler_binding(),
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: u.kind.sampler_binding_type(),
                        count: None,
                    },
                ]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_is_rejected() {
        let mut table = TextureUnitTable::new();
        table
            .assign("diffuse", DIFFUSE_UNIT, TextureKind::Color2d, TextureSource::White)
            .unwrap();

        let err = table
            .assign("albedo", DIFFUSE_UNIT, TextureKind::Color2d, TextureSource::White)
            .unwrap_err();
        match err {
            RenderError::TextureUnitCollision {
                unit,
                existing,
                requested,
            } => {
                assert_eq!(unit, 0);
                assert_eq!(existing, "diffuse");
                assert_eq!(requested, "albedo");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_units_out_of_range_and_exhaustion() {
        let mut table = TextureUnitTable::new();
        assert!(matches!(
            table.assign("x", MAX_TEXTURE_UNITS, TextureKind::Color2d, TextureSource::White),
            Err(RenderError::TextureUnitOutOfRange { .. })
        ));

        table
            .assign("shadow", SHADOW_UNIT, TextureKind::Depth, TextureSource::ShadowMap)
            .unwrap();
        for i in 0..MAX_TEXTURE_UNITS - 1 {
            let unit = table
                .assign_next(&format!("t{i}"), TextureKind::Color2d, TextureSource::White)
                .unwrap();
            assert_ne!(unit, SHADOW_UNIT);
        }
        assert!(matches!(
            table.assign_next("one_more", TextureKind::Color2d, TextureSource::White),
            Err(RenderError::TextureUnitsExhausted(_))
        ));
    }

    #[test]
    fn test_layout_entries_follow_unit_numbers() {
        let mut table = TextureUnitTable::new();
        table
            .assign("shadow_map", SHADOW_UNIT, TextureKind::Depth, TextureSource::ShadowMap)
            .unwrap();
        table
            .assign("diffuse", DIFFUSE_UNIT, TextureKind::Color2d, TextureSource::White)
            .unwrap();

        let bindings: Vec<u32> = table.layout_entries().iter().map(|e| e.binding).collect();
        assert_eq!(bindings, vec![0, 1, 20, 21]);
        assert_eq!(table.unit_of("shadow_map"), Some(SHADOW_UNIT));
        assert!(matches!(
            table.layout_entries()[3].ty,
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison)
        ));
    }
}
