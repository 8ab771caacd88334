//! wgpu-based render engine
//!
//! Owns the surface, device and every GPU resource the passes touch. A frame
//! is recorded into plain data by [`record_frame`] and then replayed here:
//! global blocks are flushed, per-draw uniforms are packed into one buffer,
//! and each recorded pass becomes one wgpu render pass.

use std::{collections::HashMap, rc::Rc, sync::Arc};

use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};

use super::{
    draw_uniforms::{pack_draw_uniforms, DrawUniformArena},
    frame::{record_frame, FrameExtents},
    pipeline_manager::PipelineManager,
    recorder::{ClearOps, PassTarget, RecordedPass},
};
use crate::{
    config::RenderSettings,
    error::{RenderError, Result},
    gfx::{
        geometry::screen_quad,
        resources::{
            framebuffer::{clamp_extent, OffscreenTarget, ShadowTarget},
            global_bindings::{GlobalBindings, GlobalUniforms},
            texture_registry::{TextureRegistry, TextureSource},
            texture_resource::TextureResource,
            texture_units::TextureUnit,
        },
        scene::{
            drawable::{DrawCall, Drawable},
            scene::Scene,
            vertex::VertexLayout,
        },
        shader::program::{ProgramKind, ProgramSet},
    },
    state::SimulationState,
    wgpu_utils::BindGroupBuilder,
};

type TextureBindingKey = (ProgramKind, Vec<(u32, TextureSource)>);

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<Device>,
    queue: Arc<Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,

    programs: ProgramSet,
    pipelines: PipelineManager,
    globals: GlobalUniforms,
    global_bindings: GlobalBindings,
    draw_uniforms: DrawUniformArena,

    textures: TextureRegistry,
    texture_bind_groups: HashMap<TextureBindingKey, wgpu::BindGroup>,

    offscreen: OffscreenTarget,
    shadow: ShadowTarget,
    shadow_map_size: u32,
    screen_quad: Rc<Drawable>,
}

impl RenderEngine {
    /// Creates a render engine drawing into `window`
    ///
    /// Fails when no surface, adapter or device can be created, or when one
    /// of the built-in shaders does not compile.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        settings: &RenderSettings,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::Adapter(e.to_string()))?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: adapter.limits().max_texture_dimension_2d,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| RenderError::Device(e.to_string()))?;

        // Gamma is applied by the composite shader, so the surface must not
        // encode sRGB a second time
        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| RenderError::Surface("surface reports no formats".to_string()))?;

        let (width, height) =
            clamp_extent(width, height, device.limits().max_texture_dimension_2d);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: present_mode(settings.window.vsync),
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let programs = ProgramSet::new()?;
        let mut globals = GlobalUniforms::new()?;
        let global_bindings = GlobalBindings::new(&device, &mut globals);
        let draw_uniforms = DrawUniformArena::new(&device);
        let pipelines = PipelineManager::new(
            &device,
            &programs,
            global_bindings.bind_group_layout(),
            draw_uniforms.layout(),
            format,
        )?;

        let textures = TextureRegistry::new(&device, &queue);
        let offscreen = OffscreenTarget::new(&device, config.width, config.height);
        let shadow_map_size = settings.shadow.map_size;
        let shadow = ShadowTarget::new(&device, shadow_map_size);

        let quad = Drawable::from_vertices("Screen Quad", VertexLayout::Screen, &screen_quad(), &[]);
        quad.upload(&device);

        Ok(RenderEngine {
            surface,
            device: Arc::new(device),
            queue: Arc::new(queue),
            config,
            format,
            programs,
            pipelines,
            globals,
            global_bindings,
            draw_uniforms,
            textures,
            texture_bind_groups: HashMap::new(),
            offscreen,
            shadow,
            shadow_map_size,
            screen_quad: Rc::new(quad),
        })
    }

    /// Renders one frame: the five recorded passes, then the optional UI
    /// overlay on top of the presented image
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame<F>(
        &mut self,
        scene: &Scene,
        state: &SimulationState,
        ui_callback: Option<F>,
    ) -> Result<()>
    where
        F: FnOnce(&Device, &Queue, &mut CommandEncoder, &TextureView),
    {
        if state.shadow.map_size != self.shadow_map_size {
            self.shadow_map_size = state.shadow.map_size;
            self.shadow = ShadowTarget::new(&self.device, self.shadow_map_size);
            self.texture_bind_groups.clear();
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::SurfaceOutOfMemory),
            Err(e) => {
                log::warn!("skipping frame: {e}");
                return Ok(());
            }
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        scene.upload_pending(&self.device);

        let extents = FrameExtents {
            width: self.config.width,
            height: self.config.height,
            shadow_size: self.shadow.size(),
        };
        let plan = record_frame(scene, state, &mut self.programs, &self.screen_quad, &extents);

        self.globals.write_camera(&plan.uniforms.camera_block())?;
        self.globals.write_light(&plan.uniforms.light)?;
        self.globals.flush(&self.queue);

        let packed = pack_draw_uniforms(&plan.passes, self.draw_uniforms.alignment());
        self.draw_uniforms.upload(&self.device, &self.queue, &packed);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        for (pass, offsets) in plan.passes.iter().zip(&packed.offsets) {
            self.execute_pass(&mut encoder, pass, offsets, &surface_view);
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(&self.device, &self.queue, &mut encoder, &surface_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Renders a frame without a UI overlay
    pub fn render_frame_simple(&mut self, scene: &Scene, state: &SimulationState) -> Result<()> {
        self.render_frame(
            scene,
            state,
            None::<fn(&Device, &Queue, &mut CommandEncoder, &TextureView)>,
        )
    }

    fn execute_pass(
        &mut self,
        encoder: &mut CommandEncoder,
        pass: &RecordedPass,
        offsets: &[u32],
        surface_view: &TextureView,
    ) {
        let program = pass.kind.program();
        let uses_textures = self
            .pipelines
            .texture_layout(program)
            .is_some_and(|layout| !layout.entries.is_empty());

        let texture_groups: Vec<Option<wgpu::BindGroup>> = if uses_textures {
            pass.commands
                .iter()
                .map(|command| self.texture_bind_group(command.program, &command.textures))
                .collect()
        } else {
            vec![None; pass.commands.len()]
        };

        let (Some(pipeline), Some(config)) =
            (self.pipelines.pipeline(pass.kind), self.pipelines.config(pass.kind))
        else {
            log::error!("no pipeline for {}", pass.kind.label());
            return;
        };

        let color_view = match pass.target {
            PassTarget::ShadowMap => None,
            PassTarget::Offscreen => Some(&self.offscreen.color.view),
            PassTarget::Surface => Some(surface_view),
        };
        let color_targets = [color_view.map(|view| wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: color_load_op(pass.clear.color),
                store: wgpu::StoreOp::Store,
            },
        })];

        let depth_stencil_attachment = match pass.target {
            PassTarget::ShadowMap => Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.shadow.depth.view,
                depth_ops: Some(depth_ops(&pass.clear)),
                stencil_ops: None,
            }),
            PassTarget::Offscreen => Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.offscreen.depth.view,
                depth_ops: Some(depth_ops(&pass.clear)),
                stencil_ops: Some(stencil_ops(&pass.clear)),
            }),
            PassTarget::Surface => None,
        };

        // Depth-only passes have no color attachment at all
        let color_attachments: &[Option<wgpu::RenderPassColorAttachment>] =
            if color_view.is_some() { &color_targets } else { &[] };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass.kind.label()),
            color_attachments,
            depth_stencil_attachment,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let viewport = pass.viewport;
        render_pass.set_viewport(viewport.x, viewport.y, viewport.width, viewport.height, 0.0, 1.0);
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

        for ((command, offset), textures) in pass.commands.iter().zip(offsets).zip(&texture_groups) {
            let drawable = &command.drawable;
            if drawable.layout() != config.vertex_layout {
                log::warn!(
                    "skipping '{}' in {}: vertex layout {:?} does not match {:?}",
                    drawable.label(),
                    pass.kind.label(),
                    drawable.layout(),
                    config.vertex_layout
                );
                continue;
            }

            if uses_textures {
                let Some(textures) = textures else {
                    log::warn!("skipping '{}': textures could not be bound", drawable.label());
                    continue;
                };
                render_pass.set_bind_group(2, textures, &[]);
            }
            render_pass.set_bind_group(1, self.draw_uniforms.bind_group(), &[*offset]);

            let drawn = drawable.with_buffers(|buffers| {
                render_pass.set_vertex_buffer(0, buffers.vertex.slice(..));
                match (command.call, &buffers.index) {
                    (DrawCall::Arrays { vertex_count }, _) => {
                        render_pass.draw(0..vertex_count, 0..1);
                    }
                    (DrawCall::Indexed { index_count }, Some(index)) => {
                        render_pass.set_index_buffer(index.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..index_count, 0, 0..1);
                    }
                    (DrawCall::Indexed { .. }, None) => {
                        log::warn!("'{}' has indices but no index buffer", drawable.label());
                    }
                }
            });
            if drawn.is_none() {
                log::debug!("skipping '{}': no GPU buffers", drawable.label());
            }
        }
    }

    /// Group 2 for one draw, cached by program and bound sources
    fn texture_bind_group(
        &mut self,
        program: ProgramKind,
        textures: &[(u32, TextureSource)],
    ) -> Option<wgpu::BindGroup> {
        let key = (program, textures.to_vec());
        if let Some(bind_group) = self.texture_bind_groups.get(&key) {
            return Some(bind_group.clone());
        }

        let bind_group = self.create_texture_bind_group(program, textures)?;
        self.texture_bind_groups.insert(key, bind_group.clone());
        Some(bind_group)
    }

    fn create_texture_bind_group(
        &self,
        program: ProgramKind,
        textures: &[(u32, TextureSource)],
    ) -> Option<wgpu::BindGroup> {
        let layout = self.pipelines.texture_layout(program)?;
        let units = self.programs.get(program).texture_units();
        if textures.len() != units.len() {
            log::error!(
                "{} expects {} textures, draw bound {}",
                program.name(),
                units.len(),
                textures.len()
            );
            return None;
        }

        let mut builder = BindGroupBuilder::new(layout);
        for (unit, source) in textures {
            let unit = units.get(*unit)?;
            let texture = self.resolve_unit(unit, *source)?;
            builder = builder.texture(&texture.view).sampler(&texture.sampler);
        }
        log::trace!("creating texture bind group for {}", program.name());
        Some(builder.create(&self.device, &format!("{} Textures", program.name())))
    }

    fn resolve_source(&self, source: TextureSource) -> Option<&TextureResource> {
        match source {
            TextureSource::ShadowMap => Some(&self.shadow.depth),
            TextureSource::SceneColor => Some(&self.offscreen.color),
            other => self.textures.resolve(other),
        }
    }

    /// A source of the wrong kind for its unit samples the unit's fallback
    fn resolve_unit(&self, unit: &TextureUnit, source: TextureSource) -> Option<&TextureResource> {
        match self.resolve_source(source) {
            Some(texture) if texture.kind == unit.kind => Some(texture),
            _ => {
                log::debug!(
                    "unit {} '{}' cannot sample {:?}, using {:?}",
                    unit.unit,
                    unit.name,
                    source,
                    unit.fallback
                );
                self.resolve_source(unit.fallback)
            }
        }
    }

    /// Resizes the surface and the offscreen target
    ///
    /// The shadow map keeps its resolution. Zero sizes, as reported for
    /// minimized windows, are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        let max = self.device.limits().max_texture_dimension_2d;
        let requested = (width, height);
        let (width, height) = clamp_extent(width, height, max);
        if (width, height) != requested {
            log::warn!(
                "window size {}x{} exceeds the device limit, rendering at {width}x{height}",
                requested.0,
                requested.1
            );
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.offscreen = OffscreenTarget::new(&self.device, width, height);
        self.texture_bind_groups.clear();
        log::debug!("resized to {width}x{height}");
    }

    pub fn set_vsync(&mut self, enable: bool) {
        self.config.present_mode = present_mode(enable);
        self.surface.configure(&self.device, &self.config);
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.format
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    /// Mutable registry access; cached texture bind groups are dropped
    pub fn textures_mut(&mut self) -> &mut TextureRegistry {
        self.texture_bind_groups.clear();
        &mut self.textures
    }

    /// Device, queue and registry together, for loading textures
    pub fn texture_loader(&mut self) -> (&Device, &Queue, &mut TextureRegistry) {
        self.texture_bind_groups.clear();
        (&self.device, &self.queue, &mut self.textures)
    }

    pub fn programs(&self) -> &ProgramSet {
        &self.programs
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

fn color_load_op(clear: Option<[f32; 4]>) -> wgpu::LoadOp<wgpu::Color> {
    match clear {
        Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }),
        None => wgpu::LoadOp::Load,
    }
}

fn depth_ops(clear: &ClearOps) -> wgpu::Operations<f32> {
    wgpu::Operations {
        load: clear.depth.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
        store: wgpu::StoreOp::Store,
    }
}

fn stencil_ops(clear: &ClearOps) -> wgpu::Operations<u32> {
    wgpu::Operations {
        load: clear.stencil.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
        store: wgpu::StoreOp::Store,
    }
}
