//! # Scene Module
//!
//! Everything a frame draws: shared [`Drawable`] geometry, the
//! [`SceneEntity`] instances placing it in the world, the optional
//! [`Skybox`] and the [`PointLight`] lighting it.
//!
//! ## Sharing
//!
//! Drawables are reference counted. Many entities may point at one cube
//! drawable; its buffers live as long as the longest-surviving entity and are
//! released exactly once when the last reference drops.
//!
//! ```
//! use std::rc::Rc;
//! use cgmath::Vector3;
//! use lumen::gfx::geometry::textured_cube;
//! use lumen::gfx::scene::{Drawable, Scene, SceneEntity, Transform};
//!
//! let cube = Rc::new(Drawable::new("cube", &textured_cube()));
//! let mut scene = Scene::new();
//! for x in 0..4 {
//!     let at = Transform::at(Vector3::new(x as f32 * 2.0, 0.0, 0.0));
//!     scene.add_entity(SceneEntity::new(Rc::clone(&cube), at));
//! }
//! assert_eq!(Rc::strong_count(&cube), 5);
//! ```

pub mod drawable;
pub mod entity;
pub mod light;
pub mod scene;
pub mod skybox;
pub mod vertex;

// Re-export main types
pub use drawable::{DrawCall, Drawable};
pub use entity::{SceneEntity, Transform};
pub use light::PointLight;
pub use scene::Scene;
pub use skybox::Skybox;
pub use vertex::{ScreenVertex, SkyboxVertex, Vertex, VertexLayout};
