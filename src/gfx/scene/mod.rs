//! # Scene
//!
//! The scene is what gets rendered, both in the preview window and into
//! exported icons:
//!
//! - [`Scene`] - the subject model, its materials, the orbit camera and the light
//! - [`Object`] - GPU side model with one [`Mesh`] per OBJ shape
//! - [`Vertex3D`] - vertex format with position and normal
//!
//! Models arrive as [`ModelData`](crate::assets::ModelData) from the asset
//! loader and are turned into an [`Object`] by [`Scene::set_model`].

pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use object::{transform_bind_group_layout, DrawObject, Mesh, Object, TransformUniform};
pub use scene::{ModelSummary, Scene, SceneLayouts, SceneStatistics};
pub use vertex::Vertex3D;
