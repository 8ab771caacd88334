//! # Graphics Module
//!
//! Everything between the scene description and the pixels on screen.
//!
//! - **Camera** ([`camera`]) - fly camera, its controller and the light and
//!   skybox view helpers
//! - **Geometry** ([`geometry`]) - mesh data and built-in primitives
//! - **Rendering** ([`rendering`]) - pass recording, frame orchestration and
//!   the wgpu render engine
//! - **Resources** ([`resources`]) - textures, render targets, uniform
//!   blocks and texture-unit tables
//! - **Scene** ([`scene`]) - drawables, entities, the light and the skybox
//! - **Shader** ([`shader`]) - programs with named uniforms
//!
//! ## Usage
//!
//! ```no_run
//! use lumen::gfx::{geometry::textured_cube, scene::{Drawable, Scene, SceneEntity, Transform}};
//! use std::rc::Rc;
//!
//! let cube = Rc::new(Drawable::new("cube", &textured_cube()));
//! let mut scene = Scene::new();
//! scene.add_entity(SceneEntity::new(cube, Transform::default()));
//! ```

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod shader;

// Re-export commonly used types
pub use camera::FlyCamera;
pub use rendering::render_engine::RenderEngine;
