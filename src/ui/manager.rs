//! ImGui overlay
//!
//! A UI frame is built before the scene is recorded, so panels can edit the
//! state that frame renders, and drawn after the composite pass onto the
//! surface image. Input goes to ImGui first; events it captures never reach
//! the camera.

use imgui::{Context, FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use std::time::Instant;
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};
use winit::{
    event::{Event, WindowEvent},
    window::{Window, WindowId},
};

const FONT_SIZE: f32 = 18.0;

/// ImGui overlay manager
///
/// Owns the ImGui context, its winit platform glue and its wgpu renderer.
/// It also remembers whether a built frame is still waiting to be drawn.
pub struct UiManager {
    context: Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    last_cursor: Option<MouseCursor>,
    /// A frame was built but never rendered, e.g. the surface was lost
    frame_open: bool,
}

impl UiManager {
    /// Creates the overlay for a surface of `surface_format`
    ///
    /// DPI scaling is locked to 1 so panel sizes match surface pixels. The
    /// default font is loaded at a fixed pixel size and no `.ini` file is
    /// written.
    ///
    /// # Arguments
    /// * `device` - Device the ImGui renderer allocates its buffers on
    /// * `queue` - Queue used to upload the font atlas
    /// * `surface_format` - Format of the surface the overlay is drawn onto
    /// * `window` - Window the platform layer attaches to
    pub fn new(
        device: &Device,
        queue: &Queue,
        surface_format: TextureFormat,
        window: &Window,
    ) -> Self {
        let mut context = Context::create();
        context.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(context.io_mut(), window, HiDpiMode::Locked(1.0));

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                size_pixels: FONT_SIZE,
                pixel_snap_h: true,
                ..Default::default()
            }),
        }]);

        let renderer = Renderer::new(
            &mut context,
            device,
            queue,
            RendererConfig {
                texture_format: surface_format,
                ..Default::default()
            },
        );
        log::debug!("UI overlay targets {surface_format:?}");

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            last_cursor: None,
            frame_open: false,
        }
    }

    /// Matches ImGui's display size to the surface
    ///
    /// Call whenever the surface is resized so panels are laid out against
    /// the new extent.
    ///
    /// # Arguments
    /// * `width` - Surface width in pixels
    /// * `height` - Surface height in pixels
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context.io_mut().display_size = [width as f32, height as f32];
    }

    /// Feeds an input event to ImGui
    ///
    /// Only mouse, keyboard, modifier and focus events are forwarded; others
    /// are ignored and never captured.
    ///
    /// # Arguments
    /// * `window` - Window the event belongs to
    /// * `window_id` - Id of that window
    /// * `event` - Event to forward
    ///
    /// # Returns
    /// True when a panel wants the input, so the camera should not see it
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        window_id: WindowId,
        event: &WindowEvent,
    ) -> bool {
        match event {
            WindowEvent::CursorMoved { .. }
            | WindowEvent::MouseInput { .. }
            | WindowEvent::MouseWheel { .. }
            | WindowEvent::KeyboardInput { .. }
            | WindowEvent::ModifiersChanged(_)
            | WindowEvent::Focused(_) => {
                let wrapped: Event<()> = Event::WindowEvent {
                    window_id,
                    event: event.clone(),
                };
                self.platform
                    .handle_event(self.context.io_mut(), window, &wrapped);
                self.wants_input()
            }
            _ => false,
        }
    }

    /// True while a panel has the mouse or keyboard
    pub fn wants_input(&self) -> bool {
        let io = self.context.io();
        io.want_capture_mouse || io.want_capture_keyboard
    }

    /// Starts an ImGui frame and runs `run_ui` to build it
    ///
    /// Called once per frame before the scene is recorded, so panels can edit
    /// the state that frame renders. A frame built earlier but never rendered
    /// (the surface was lost) is closed first.
    ///
    /// # Arguments
    /// * `window` - Window used for cursor and DPI updates
    /// * `run_ui` - Builds the panels
    ///
    /// # Returns
    /// True if the UI wants the input this frame
    pub fn build_frame<F>(&mut self, window: &Window, run_ui: F) -> bool
    where
        F: FnOnce(&imgui::Ui),
    {
        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(e) = self.platform.prepare_frame(self.context.io_mut(), window) {
            log::error!("failed to prepare UI frame: {e}");
        }

        if self.frame_open {
            self.context.render();
        }
        let ui = self.context.frame();
        run_ui(ui);

        if self.last_cursor != ui.mouse_cursor() {
            self.last_cursor = ui.mouse_cursor();
            self.platform.prepare_render(ui, window);
        }
        self.frame_open = true;

        self.wants_input()
    }

    /// Draws the frame from [`build_frame`](Self::build_frame) over `target`
    ///
    /// The target is loaded, not cleared, so the overlay sits on top of the
    /// composite output. Does nothing when no frame is open or the display
    /// has no area. Renderer errors are logged.
    ///
    /// # Arguments
    /// * `device` - Device for the ImGui renderer's buffers
    /// * `queue` - Queue for vertex and index uploads
    /// * `encoder` - Encoder the overlay pass is recorded into
    /// * `target` - Surface view the overlay is drawn onto
    pub fn render(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        target: &TextureView,
    ) {
        if !self.frame_open {
            return;
        }
        self.frame_open = false;

        let draw_data = self.context.render();
        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return;
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("UI Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Err(e) = self
            .renderer
            .render(draw_data, queue, device, &mut render_pass)
        {
            log::error!("failed to render UI: {e:?}");
        }
    }
}
