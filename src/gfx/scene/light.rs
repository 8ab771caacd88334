/// Point light with distance attenuation
///
/// Edited live by the control panel and uploaded to the light block once per
/// frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: [f32; 3],
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: [1.2, 1.0, 2.0],
            ambient: [0.1, 0.1, 0.1],
            diffuse: [1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0],
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

impl PointLight {
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Attenuation factor at `distance` from the light
    pub fn attenuation(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_attenuation_is_one_at_the_light() {
        let light = PointLight::default();
        assert_relative_eq!(light.attenuation(0.0), 1.0);
        assert!(light.attenuation(10.0) < light.attenuation(1.0));
    }
}
