//! Composite pass settings
//!
//! The composite shader maps the HDR offscreen color to the surface:
//! exposure scaling, optional exponential tone mapping, then gamma. The
//! surface is configured with a non-sRGB format, so gamma is applied here
//! exactly once.

use std::ops::RangeInclusive;

use crate::{config::PostSettings, gfx::shader::program::ShaderProgram};

pub const EXPOSURE_RANGE: RangeInclusive<f32> = 0.1..=5.0;
pub const GAMMA_RANGE: RangeInclusive<f32> = 1.0..=3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessSettings {
    pub exposure: f32,
    pub gamma: f32,
    pub tone_map: bool,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self::from(&PostSettings::default())
    }
}

impl From<&PostSettings> for PostProcessSettings {
    fn from(settings: &PostSettings) -> Self {
        Self {
            exposure: settings.exposure,
            gamma: settings.gamma,
            tone_map: settings.tone_map,
        }
        .clamped()
    }
}

impl PostProcessSettings {
    /// Leaves colors untouched
    pub fn passthrough() -> Self {
        Self {
            exposure: 1.0,
            gamma: 1.0,
            tone_map: false,
        }
    }

    /// Exposure and gamma limited to the ranges the control panel offers
    pub fn clamped(self) -> Self {
        Self {
            exposure: self.exposure.clamp(*EXPOSURE_RANGE.start(), *EXPOSURE_RANGE.end()),
            gamma: self.gamma.clamp(*GAMMA_RANGE.start(), *GAMMA_RANGE.end()),
            ..self
        }
    }

    pub fn write_uniforms(&self, program: &mut ShaderProgram) {
        program.set_float("exposure", self.exposure);
        program.set_float("gamma", self.gamma);
        program.set_bool("tone_map", self.tone_map);
    }

    /// CPU reference of the composite fragment shader; alpha is kept
    pub fn apply(&self, color: [f32; 4]) -> [f32; 4] {
        let map = |c: f32| {
            let exposed = c * self.exposure;
            let mapped = if self.tone_map {
                1.0 - (-exposed).exp()
            } else {
                exposed
            };
            if self.gamma == 1.0 {
                mapped
            } else {
                mapped.max(0.0).powf(1.0 / self.gamma)
            }
        };
        [map(color[0]), map(color[1]), map(color[2]), color[3]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_passthrough_keeps_exact_color() {
        let post = PostProcessSettings::passthrough();
        assert_eq!(post.apply([1.0, 0.0, 0.0, 1.0]), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(post.apply([0.25, 0.5, 0.75, 0.5]), [0.25, 0.5, 0.75, 0.5]);
    }

    #[test]
    fn test_tone_mapping_stays_below_one() {
        let post = PostProcessSettings {
            exposure: 5.0,
            gamma: 1.0,
            tone_map: true,
        };
        let mapped = post.apply([10.0, 1.0, 0.0, 1.0]);
        assert!(mapped[0] < 1.0);
        assert!(mapped[1] < mapped[0]);
        assert_relative_eq!(mapped[2], 0.0);
    }

    #[test]
    fn test_gamma_brightens_midtones() {
        let post = PostProcessSettings {
            exposure: 1.0,
            gamma: 2.2,
            tone_map: false,
        };
        assert_relative_eq!(post.apply([0.5, 0.0, 0.0, 1.0])[0], 0.5f32.powf(1.0 / 2.2));
    }

    #[test]
    fn test_exposure_is_clamped() {
        let post = PostProcessSettings {
            exposure: 50.0,
            gamma: 0.0,
            tone_map: true,
        }
        .clamped();
        assert_eq!(post.exposure, 5.0);
        assert_eq!(post.gamma, 1.0);
    }
}
