//! Render targets written by one pass and sampled by a later one

use crate::gfx::resources::texture_resource::TextureResource;

/// Why a render target cannot be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incomplete {
    ZeroExtent,
    ExceedsLimit { extent: u32, max: u32 },
    NotRenderable(wgpu::TextureFormat),
}

impl std::fmt::Display for Incomplete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Incomplete::ZeroExtent => write!(f, "zero-sized attachment"),
            Incomplete::ExceedsLimit { extent, max } => {
                write!(f, "extent {extent} exceeds the device limit of {max}")
            }
            Incomplete::NotRenderable(format) => write!(f, "{format:?} is not renderable"),
        }
    }
}

/// Checks that an attachment of this size and format can be rendered to
pub fn check_completeness(
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    max_dimension: u32,
) -> Result<(), Incomplete> {
    if width == 0 || height == 0 {
        return Err(Incomplete::ZeroExtent);
    }
    let extent = width.max(height);
    if extent > max_dimension {
        return Err(Incomplete::ExceedsLimit {
            extent,
            max: max_dimension,
        });
    }
    let renderable = format
        .guaranteed_format_features(wgpu::Features::empty())
        .allowed_usages
        .contains(wgpu::TextureUsages::RENDER_ATTACHMENT);
    if !renderable {
        return Err(Incomplete::NotRenderable(format));
    }
    Ok(())
}

/// Extent a target is actually created at: each side within `1..=max_dimension`
pub fn clamp_extent(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max = max_dimension.max(1);
    (width.clamp(1, max), height.clamp(1, max))
}

fn log_if_incomplete(label: &str, width: u32, height: u32, format: wgpu::TextureFormat, max: u32) {
    if let Err(issue) = check_completeness(width, height, format, max) {
        log::error!("framebuffer '{label}' is incomplete: {issue}");
    }
}

/// HDR color plus depth-stencil, sized to the surface
pub struct OffscreenTarget {
    pub color: TextureResource,
    pub depth: TextureResource,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let max = device.limits().max_texture_dimension_2d;
        log_if_incomplete("offscreen color", width, height, TextureResource::HDR_FORMAT, max);
        log_if_incomplete(
            "offscreen depth",
            width,
            height,
            TextureResource::DEPTH_STENCIL_FORMAT,
            max,
        );

        let (width, height) = clamp_extent(width, height, max);
        log::debug!("offscreen target created at {width}x{height}");
        Self {
            color: TextureResource::create_color_target(device, width, height, "Offscreen Color"),
            depth: TextureResource::create_depth_stencil(device, width, height, "Offscreen Depth"),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.color.width(), self.color.height())
    }
}

/// Square depth-only target of the shadow pass
pub struct ShadowTarget {
    pub depth: TextureResource,
}

impl ShadowTarget {
    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        let max = device.limits().max_texture_dimension_2d;
        log_if_incomplete("shadow map", size, size, TextureResource::SHADOW_FORMAT, max);
        Self {
            depth: TextureResource::create_shadow_map(device, clamp_extent(size, size, max).0),
        }
    }

    pub fn size(&self) -> u32 {
        self.depth.width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_extent_is_incomplete() {
        assert_eq!(
            check_completeness(0, 600, TextureResource::HDR_FORMAT, 8192),
            Err(Incomplete::ZeroExtent)
        );
    }

    #[test]
    fn test_oversized_target_is_incomplete() {
        assert_eq!(
            check_completeness(16384, 16384, TextureResource::SHADOW_FORMAT, 8192),
            Err(Incomplete::ExceedsLimit {
                extent: 16384,
                max: 8192
            })
        );
    }

    #[test]
    fn test_oversized_extent_is_clamped_to_the_limit() {
        assert_eq!(clamp_extent(5120, 2880, 4096), (4096, 2880));
        assert_eq!(clamp_extent(0, 0, 4096), (1, 1));
        assert_eq!(clamp_extent(800, 600, 4096), (800, 600));
    }

    #[test]
    fn test_attachment_formats_are_renderable() {
        for format in [
            TextureResource::HDR_FORMAT,
            TextureResource::DEPTH_STENCIL_FORMAT,
            TextureResource::SHADOW_FORMAT,
        ] {
            assert_eq!(check_completeness(800, 600, format, 8192), Ok(()));
        }
        assert_eq!(
            check_completeness(4, 4, wgpu::TextureFormat::Bc1RgbaUnorm, 8192),
            Err(Incomplete::NotRenderable(wgpu::TextureFormat::Bc1RgbaUnorm))
        );
    }
}
