//! Texture resource management for wgpu
//!
//! Provides utilities for creating and managing GPU textures, views, and samplers
//! with specialized support for depth buffers, cubemaps and render targets.

use crate::{assets::ImageData, gfx::resources::texture_units::TextureKind};

/// How texture coordinates outside 0..1 are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    Repeat,
    ClampToEdge,
}

impl From<Wrap> for wgpu::AddressMode {
    fn from(wrap: Wrap) -> Self {
        match wrap {
            Wrap::Repeat => wgpu::AddressMode::Repeat,
            Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureOptions {
    pub wrap: Wrap,
    /// Color data is sRGB encoded; normal maps and data textures are not
    pub srgb: bool,
    pub mipmaps: bool,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            wrap: Wrap::Repeat,
            srgb: true,
            mipmaps: true,
        }
    }
}

impl TextureOptions {
    pub fn linear() -> Self {
        Self {
            srgb: false,
            ..Self::default()
        }
    }
}

/// GPU texture resource containing texture, view, and sampler
///
/// Exclusively owns its GPU allocation, which is destroyed when dropped.
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub kind: TextureKind,
}

impl TextureResource {
    pub const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
    pub const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;
    pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

    /// Creates a depth-only shadow map sampled with a comparison sampler
    pub fn create_shadow_map(device: &wgpu::Device, size: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Fragments outside the light frustum compare against depth 1.0
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            kind: TextureKind::Depth,
        }
    }

    /// Depth-stencil attachment of the offscreen target; never sampled
    pub fn create_depth_stencil(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_STENCIL_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor::default());

        Self {
            texture,
            view,
            sampler,
            kind: TextureKind::Depth,
        }
    }

    /// HDR color attachment that the composite pass samples
    pub fn create_color_target(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            kind: TextureKind::Color2d,
        }
    }

    /// Uploads an RGBA8 image, with a CPU-generated mip chain when requested
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &ImageData,
        label: &str,
        options: TextureOptions,
    ) -> Self {
        let levels = if options.mipmaps {
            image.mip_chain()
        } else {
            vec![image.clone()]
        };
        let format = if options.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in levels.iter().enumerate() {
            write_layer(queue, &texture, level, mip_level as u32, 0);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let address_mode = options.wrap.into();
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            kind: TextureKind::Color2d,
        }
    }

    /// A single-texel texture of `color`
    pub fn solid_color(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color: [u8; 4],
        label: &str,
        srgb: bool,
    ) -> Self {
        let options = TextureOptions {
            wrap: Wrap::Repeat,
            srgb,
            mipmaps: false,
        };
        Self::from_image(device, queue, &ImageData::solid(color, 1, 1), label, options)
    }

    /// Builds a cubemap from faces in +X, -X, +Y, -Y, +Z, -Z order
    ///
    /// Missing faces, or faces whose size differs from the first loaded one,
    /// stay black.
    pub fn cubemap(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[Option<ImageData>; 6],
        label: &str,
    ) -> Self {
        let (width, height) = faces
            .iter()
            .flatten()
            .map(|face| (face.width, face.height))
            .next()
            .unwrap_or((1, 1));
        let size = width.max(height);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let black = ImageData::solid([0, 0, 0, 255], size, size);
        for (layer, face) in faces.iter().enumerate() {
            let data = match face {
                Some(face) if face.width == size && face.height == size => face,
                Some(face) => {
                    log::error!(
                        "cubemap '{label}' face {layer} is {}x{}, expected {size}x{size}; leaving it black",
                        face.width,
                        face.height
                    );
                    &black
                }
                None => &black,
            };
            write_layer(queue, &texture, data, 0, layer as u32);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{label} View")),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            kind: TextureKind::Cube,
        }
    }

    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }
}

impl Drop for TextureResource {
    fn drop(&mut self) {
        self.texture.destroy();
    }
}

fn write_layer(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    image: &ImageData,
    mip_level: u32,
    layer: u32,
) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        &image.rgba8,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width),
            rows_per_image: Some(image.height),
        },
        wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        },
    );
}
