// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles textures, render targets, uniform blocks and the texture-unit
//! tables that connect them to shader programs.

pub mod framebuffer;
pub mod global_bindings;
pub mod texture_registry;
pub mod texture_resource;
pub mod texture_units;
pub mod uniform_block;

// Re-export main types
pub use framebuffer::{OffscreenTarget, ShadowTarget};
pub use global_bindings::{CameraBlock, GlobalBindings, GlobalUniforms, LightBlock};
pub use texture_registry::{LoadedTextures, TextureId, TextureRegistry, TextureSource};
pub use texture_resource::{TextureOptions, TextureResource, Wrap};
pub use texture_units::{TextureKind, TextureUnitTable};
pub use uniform_block::{UniformBlock, UniformBlockManager};
