//! Render pipeline management
//!
//! One pipeline per pass. The pass decides the program, the raster state and
//! the attachment formats; the program decides the vertex layout and the
//! texture bind group layout. Every pipeline shares the global bind group
//! (group 0) and the draw uniform arena (group 1).

use std::collections::HashMap;

use wgpu::*;

use crate::{
    error::{RenderError, Result},
    gfx::{
        rendering::recorder::{PassKind, PassTarget, RasterState},
        resources::texture_resource::TextureResource,
        scene::vertex::VertexLayout,
        shader::program::{ProgramKind, ProgramSet},
    },
    wgpu_utils::BindGroupLayoutWithDesc,
};

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub program: ProgramKind,
    pub vertex_layout: VertexLayout,
    pub raster: RasterState,
    /// `None` for depth-only pipelines, which also skip the fragment stage
    pub color_format: Option<TextureFormat>,
    pub depth_format: Option<TextureFormat>,
}

impl PipelineConfig {
    pub fn for_pass(kind: PassKind, surface_format: TextureFormat) -> Self {
        let (color_format, depth_format) = match kind.target() {
            PassTarget::ShadowMap => (None, Some(TextureResource::SHADOW_FORMAT)),
            PassTarget::Offscreen => (
                Some(TextureResource::HDR_FORMAT),
                Some(TextureResource::DEPTH_STENCIL_FORMAT),
            ),
            PassTarget::Surface => (Some(surface_format), None),
        };

        Self {
            label: kind.label().to_string(),
            program: kind.program(),
            vertex_layout: kind.program().vertex_layout(),
            raster: kind.raster_state(),
            color_format,
            depth_format,
        }
    }

    fn depth_stencil(&self) -> Option<DepthStencilState> {
        let format = self.depth_format?;
        Some(DepthStencilState {
            format,
            depth_write_enabled: self.raster.depth.write,
            depth_compare: self.raster.depth.compare.unwrap_or(CompareFunction::Always),
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        })
    }
}

/// Compiles every program once and builds one pipeline per pass
pub struct PipelineManager {
    shader_modules: HashMap<ProgramKind, ShaderModule>,
    texture_layouts: HashMap<ProgramKind, BindGroupLayoutWithDesc>,
    pipelines: HashMap<PassKind, RenderPipeline>,
    configs: HashMap<PassKind, PipelineConfig>,
}

impl PipelineManager {
    pub fn new(
        device: &Device,
        programs: &ProgramSet,
        global_layout: &BindGroupLayout,
        draw_layout: &BindGroupLayout,
        surface_format: TextureFormat,
    ) -> Result<Self> {
        let mut manager = Self {
            shader_modules: HashMap::new(),
            texture_layouts: HashMap::new(),
            pipelines: HashMap::new(),
            configs: HashMap::new(),
        };

        for program in programs.iter() {
            let kind = program.kind();
            manager
                .shader_modules
                .insert(kind, Self::compile(device, kind.name(), kind.source())?);

            let entries = program.texture_units().layout_entries();
            let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                label: Some(&format!("{} Textures Layout", kind.name())),
                entries: &entries,
            });
            manager
                .texture_layouts
                .insert(kind, BindGroupLayoutWithDesc { layout, entries });
        }

        for pass in PassKind::ALL {
            let config = PipelineConfig::for_pass(pass, surface_format);
            let pipeline = manager.create_pipeline(device, &config, global_layout, draw_layout)?;
            manager.pipelines.insert(pass, pipeline);
            manager.configs.insert(pass, config);
        }
        log::info!(
            "created {} pipelines from {} shader modules",
            manager.pipelines.len(),
            manager.shader_modules.len()
        );

        Ok(manager)
    }

    /// Compiles WGSL, turning validation errors into [`RenderError::ShaderCompile`]
    pub fn compile(device: &Device, name: &str, source: &str) -> Result<ShaderModule> {
        device.push_error_scope(ErrorFilter::Validation);
        let module = device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        match pollster::block_on(device.pop_error_scope()) {
            Some(error) => Err(RenderError::ShaderCompile {
                name: name.to_string(),
                message: error.to_string(),
            }),
            None => {
                log::debug!("compiled shader '{name}'");
                Ok(module)
            }
        }
    }

    pub fn pipeline(&self, pass: PassKind) -> Option<&RenderPipeline> {
        self.pipelines.get(&pass)
    }

    pub fn config(&self, pass: PassKind) -> Option<&PipelineConfig> {
        self.configs.get(&pass)
    }

    /// Texture bind group layout of a program
    pub fn texture_layout(&self, program: ProgramKind) -> Option<&BindGroupLayoutWithDesc> {
        self.texture_layouts.get(&program)
    }

    fn create_pipeline(
        &self,
        device: &Device,
        config: &PipelineConfig,
        global_layout: &BindGroupLayout,
        draw_layout: &BindGroupLayout,
    ) -> Result<RenderPipeline> {
        let name = config.program.name();
        let shader = self
            .shader_modules
            .get(&config.program)
            .ok_or_else(|| RenderError::ShaderCompile {
                name: name.to_string(),
                message: "module was not compiled".to_string(),
            })?;

        let mut bind_group_layouts = vec![global_layout, draw_layout];
        if let Some(textures) = self
            .texture_layouts
            .get(&config.program)
            .filter(|t| !t.entries.is_empty())
        {
            bind_group_layouts.push(&textures.layout);
        }
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(&format!("{} Layout", config.label)),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let color_targets = [config.color_format.map(|format| ColorTargetState {
            format,
            blend: Some(BlendState::REPLACE),
            write_mask: ColorWrites::ALL,
        })];
        let fragment = config.color_format.map(|_| FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &color_targets,
            compilation_options: PipelineCompilationOptions::default(),
        });

        device.push_error_scope(ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&config.label),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[config.vertex_layout.desc()],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment,
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: config.raster.cull,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: config.depth_stencil(),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderCompile {
                name: name.to_string(),
                message: format!("pipeline '{}': {error}", config.label),
            });
        }
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_configs() {
        let surface = TextureFormat::Bgra8Unorm;

        let shadow = PipelineConfig::for_pass(PassKind::ShadowDepth, surface);
        assert_eq!(shadow.color_format, None);
        assert_eq!(shadow.depth_format, Some(TextureFormat::Depth32Float));
        assert!(shadow.depth_stencil().unwrap().depth_write_enabled);

        let skybox = PipelineConfig::for_pass(PassKind::Skybox, surface);
        let depth = skybox.depth_stencil().unwrap();
        assert_eq!(depth.depth_compare, CompareFunction::LessEqual);
        assert!(!depth.depth_write_enabled);
        assert_eq!(skybox.vertex_layout, VertexLayout::Skybox);

        let composite = PipelineConfig::for_pass(PassKind::Composite, surface);
        assert!(composite.depth_stencil().is_none());
        assert_eq!(composite.color_format, Some(surface));

        let lit = PipelineConfig::for_pass(PassKind::Lit, surface);
        assert_eq!(lit.color_format, Some(TextureFormat::Rgba16Float));
        assert_eq!(lit.raster.cull, None);
    }
}
