//! # Assets
//!
//! Loading of OBJ models and MTL materials from disk, and the background
//! loader that keeps the event loop responsive while a model is parsed.

pub mod loader;
pub mod material;
pub mod model;

pub use loader::{LoadEvent, ModelLoader};
pub use material::{list_materials, load_material, material_from_mtl};
pub use model::{load_model, Bounds, MeshData, ModelData};
