//! lumen
//!
//! A shadow-mapped multi-pass forward renderer built on wgpu and winit.
//! Every frame runs the same five passes: shadow depth from the light,
//! toon outlines, the lit scene, the skybox, and a composite onto the
//! window with exposure, tone mapping and gamma.
//!
//! ```no_run
//! use lumen::{config::RenderSettings, LumenApp};
//!
//! fn main() -> anyhow::Result<()> {
//!     lumen::logging::init_logging(Default::default());
//!     let app = LumenApp::new(RenderSettings::load_or_default("lumen.toml"));
//!     app.run()
//! }
//! ```

pub mod app;
pub mod assets;
pub mod clock;
pub mod config;
pub mod error;
pub mod gfx;
pub mod input;
pub mod logging;
pub mod state;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::LumenApp;
pub use config::RenderSettings;
pub use error::{AssetError, ConfigError, RenderError};
pub use state::SimulationState;
