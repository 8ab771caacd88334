//! Window and event loop
//!
//! [`LumenApp`] owns the scene and the per-frame state, creates the window
//! and render engine when the platform resumes, and renders one frame per
//! redraw. Demos customize it through three callbacks: setup once the GPU
//! exists, update before every frame, and the UI.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    clock::FrameClock,
    config::RenderSettings,
    error::RenderError,
    gfx::{camera::CameraController, rendering::RenderEngine, scene::Scene},
    input::InputState,
    state::SimulationState,
    ui::{control_panel, UiManager},
};

/// Runs once after the render engine is created
pub type SetupCallback = Box<dyn FnOnce(&mut RenderEngine, &mut Scene) -> anyhow::Result<()>>;
/// Runs before every frame is recorded
pub type UpdateCallback = Box<dyn FnMut(&mut Scene, &mut SimulationState)>;
pub type UiCallback = Box<dyn FnMut(&imgui::Ui, &mut SimulationState)>;

pub struct LumenApp {
    app_state: AppState,
}

struct AppState {
    settings: RenderSettings,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    scene: Scene,
    state: SimulationState,
    input: InputState,
    controller: CameraController,
    clock: FrameClock,
    setup: Option<SetupCallback>,
    update: Option<UpdateCallback>,
    ui_callback: Option<UiCallback>,
    show_ui: bool,
    /// Fatal error that ended the event loop
    error: Option<anyhow::Error>,
}

impl LumenApp {
    pub fn new(settings: RenderSettings) -> Self {
        let state = SimulationState::from_settings(&settings);
        Self {
            app_state: AppState {
                settings,
                window: None,
                render_engine: None,
                ui_manager: None,
                scene: Scene::new(),
                state,
                input: InputState::new(),
                controller: CameraController::default(),
                clock: FrameClock::new(),
                setup: None,
                update: None,
                ui_callback: None,
                show_ui: true,
                error: None,
            },
        }
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.app_state.scene
    }

    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.app_state.state
    }

    pub fn set_setup<F>(&mut self, setup: F)
    where
        F: FnOnce(&mut RenderEngine, &mut Scene) -> anyhow::Result<()> + 'static,
    {
        self.app_state.setup = Some(Box::new(setup));
    }

    pub fn set_update<F>(&mut self, update: F)
    where
        F: FnMut(&mut Scene, &mut SimulationState) + 'static,
    {
        self.app_state.update = Some(Box::new(update));
    }

    /// Replaces the default control panel
    pub fn set_ui<F>(&mut self, ui: F)
    where
        F: FnMut(&imgui::Ui, &mut SimulationState) + 'static,
    {
        self.app_state.ui_callback = Some(Box::new(ui));
    }

    pub fn set_ui_visible(&mut self, visible: bool) {
        self.app_state.show_ui = visible;
    }

    /// Runs the event loop until the window closes or Escape is pressed
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = EventLoop::new().map_err(|e| RenderError::EventLoop(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .map_err(|e| RenderError::EventLoop(e.to_string()))?;

        match self.app_state.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_settings = &self.settings.window;
        let attributes = WindowAttributes::default()
            .with_title(window_settings.title.clone())
            .with_inner_size(LogicalSize::new(window_settings.width, window_settings.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|e| RenderError::Window(e.to_string()))?,
        );

        let (width, height) = window.inner_size().into();
        let mut renderer = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            &self.settings,
        ))?;

        if self.show_ui {
            let mut ui_manager = UiManager::new(
                renderer.device(),
                renderer.queue(),
                renderer.surface_format(),
                &window,
            );
            ui_manager.resize(width, height);
            self.ui_manager = Some(ui_manager);
        }

        if let Some(setup) = self.setup.take() {
            setup(&mut renderer, &mut self.scene)?;
        }
        log::info!(
            "scene ready: {} entities, skybox {}",
            self.scene.entities.len(),
            if self.scene.skybox.is_some() { "on" } else { "off" }
        );

        self.window = Some(window);
        self.render_engine = Some(renderer);
        self.clock.reset();
        Ok(())
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        let (Some(render_engine), Some(window)) = (self.render_engine.as_mut(), self.window.as_ref())
        else {
            return Ok(());
        };

        self.state.time = self.clock.tick();
        let frame_input = self.input.take_frame();
        self.controller.mouse_enabled = !self
            .ui_manager
            .as_ref()
            .is_some_and(|ui_manager| ui_manager.wants_input());
        self.controller.update(
            &mut self.state.camera,
            &self.input,
            &frame_input,
            self.state.time.delta,
        );

        if let Some(update) = self.update.as_mut() {
            update(&mut self.scene, &mut self.state);
        }

        match self.ui_manager.as_mut() {
            Some(ui_manager) => {
                let state = &mut self.state;
                let custom_ui = &mut self.ui_callback;
                ui_manager.build_frame(window, |ui| match custom_ui {
                    Some(custom_ui) => custom_ui(ui, state),
                    None => control_panel(ui, state),
                });

                render_engine.render_frame(
                    &self.scene,
                    &self.state,
                    Some(
                        |device: &wgpu::Device,
                         queue: &wgpu::Queue,
                         encoder: &mut wgpu::CommandEncoder,
                         view: &wgpu::TextureView| {
                            ui_manager.render(device, queue, encoder, view);
                        },
                    ),
                )?;
            }
            None => render_engine.render_frame_simple(&self.scene, &self.state)?,
        }
        Ok(())
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }

        if let Err(error) = self.init(event_loop) {
            self.fail(event_loop, error);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        if let Some(ui_manager) = self.ui_manager.as_mut() {
            if ui_manager.handle_window_event(&window, window_id, &event) {
                // Releases still reach the input state so no key stays held
                if let WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(code),
                            state: winit::event::ElementState::Released,
                            ..
                        },
                    ..
                } = event
                {
                    self.input.key(code, winit::event::ElementState::Released);
                }
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => {
                if code == KeyCode::Escape {
                    event_loop.exit();
                }
                self.input.key(code, state);
            }
            WindowEvent::MouseInput { state, button, .. } => self.input.button(button, state),
            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor_moved(position.x as f32, position.y as f32)
            }
            WindowEvent::CursorLeft { .. } => self.input.cursor_left(),
            WindowEvent::MouseWheel { delta, .. } => self.input.scrolled(delta),
            WindowEvent::Focused(focused) => self.input.focus_changed(focused),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.resize(width, height);
                }
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => {
                if let Err(error) = self.redraw() {
                    self.fail(event_loop, error);
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
