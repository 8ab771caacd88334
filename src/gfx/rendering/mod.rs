//! Frame rendering
//!
//! A frame is recorded as plain data first ([`recorder`], [`passes`],
//! [`frame`]) and then executed on the GPU by [`RenderEngine`]. Everything
//! except the engine itself runs without a device.

pub mod draw_uniforms;
pub mod frame;
pub mod passes;
pub mod pipeline_manager;
pub mod post_process;
pub mod recorder;
pub mod render_engine;

// Re-export main types
pub use draw_uniforms::{pack_draw_uniforms, DrawUniformArena, PackedUniforms};
pub use frame::{record_frame, FrameExtents, FramePlan, FrameUniforms};
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use post_process::PostProcessSettings;
pub use recorder::{ClearOps, DrawCommand, PassKind, PassRecorder, PassTarget, RecordedPass, Viewport};
pub use render_engine::RenderEngine;
