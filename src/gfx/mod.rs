//! # Graphics Module
//!
//! Everything that ends up on the GPU: the orbit camera, the scene with the
//! subject model, GPU resources and the renderers for the window preview
//! and for exported icons.
//!
//! - **Camera System** ([`camera`]) - orbit camera and mouse controller
//! - **Rendering** ([`rendering`]) - preview engine, pipeline cache, icon renderer
//! - **Scene** ([`scene`]) - subject model, materials and light
//! - **Resources** ([`resources`]) - materials, render targets, global uniforms
//!
//! ```no_run
//! use icon_studio::gfx::{rendering::IconRenderer, RenderEngine};
//!
//! # async fn headless() -> icon_studio::error::Result<()> {
//! let engine = RenderEngine::new_headless().await?;
//! let icons = IconRenderer::new(&engine);
//! # Ok(())
//! # }
//! ```

pub mod camera;
pub mod rendering;
pub mod resources;
pub mod scene;


// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
