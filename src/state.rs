//! Per-frame mutable state
//!
//! Everything a frame reads that can change while the program runs. Each
//! field has a single writer: input drives `camera`, the control panel edits
//! `light`, `post` and `shading`, and the frame clock sets `time`.

use crate::{
    clock::FrameTime,
    config::{RenderSettings, ShadowSettings},
    gfx::{
        camera::FlyCamera,
        rendering::post_process::PostProcessSettings,
        scene::light::PointLight,
    },
};

/// Material and outline parameters shared by every entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingSettings {
    pub shininess: f32,
    /// Number of toon bands; 0 keeps smooth shading
    pub toon_levels: u32,
    pub outline_color: [f32; 4],
    pub outline_width: f32,
}

impl ShadingSettings {
    pub const MAX_TOON_LEVELS: u32 = 8;

    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self {
            shininess: settings.material.shininess,
            toon_levels: settings.material.toon_levels.min(Self::MAX_TOON_LEVELS),
            outline_color: settings.outline.color,
            outline_width: settings.outline.width,
        }
    }
}

impl Default for ShadingSettings {
    fn default() -> Self {
        Self::from_settings(&RenderSettings::default())
    }
}

#[derive(Debug, Clone)]
pub struct SimulationState {
    pub camera: FlyCamera,
    pub light: PointLight,
    pub post: PostProcessSettings,
    pub shading: ShadingSettings,
    pub shadow: ShadowSettings,
    pub clear_color: [f32; 4],
    pub time: FrameTime,
}

impl SimulationState {
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self {
            camera: FlyCamera::from_settings(&settings.camera),
            light: PointLight::default(),
            post: PostProcessSettings::from(&settings.post),
            shading: ShadingSettings::from_settings(settings),
            shadow: settings.shadow.clone(),
            clear_color: settings.clear_color,
            time: FrameTime::default(),
        }
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::from_settings(&RenderSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_follows_settings() {
        let mut settings = RenderSettings::default();
        settings.material.toon_levels = 100;
        settings.post.exposure = 2.0;
        settings.camera.position = [1.0, 2.0, 3.0];

        let state = SimulationState::from_settings(&settings);
        assert_eq!(state.shading.toon_levels, ShadingSettings::MAX_TOON_LEVELS);
        assert_eq!(state.post.exposure, 2.0);
        assert_eq!(state.camera.position.x, 1.0);
        assert_eq!(state.time.frame_index, 0);
    }
}
