//! # User Interface Module
//!
//! Dear ImGui overlay drawn after the composite pass.
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu, input capture
//! - [`control_panel`] - light, shading and post-process editor
//!
//! When a panel has focus the camera ignores the mouse, so dragging a slider
//! does not also turn the view.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::control_panel;
