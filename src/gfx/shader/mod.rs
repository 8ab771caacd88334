//! Shader programs and their named uniforms

pub mod program;
pub mod uniforms;

pub use program::{ProgramKind, ProgramSet, ShaderProgram};
pub use uniforms::{UniformLayout, UniformType, UniformValue, UniformValues};
