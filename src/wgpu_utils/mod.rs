//! Small wgpu helpers
//!
//! Bind group layout and bind group builders, binding type shorthands and a
//! byte-level uniform buffer. Shared by the global blocks, the per-draw
//! uniform arena and the program texture groups.

pub mod binding_builder;
pub mod binding_types;
pub mod uniform_buffer;

// Re-export main types
pub use binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};
pub use uniform_buffer::UniformBuffer;
