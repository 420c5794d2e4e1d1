// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Handles render pipelines, the window preview and offscreen icon renders.

pub mod icon_renderer;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use icon_renderer::{downsample, IconRenderer, IconRequest};
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::{RenderEngine, SCENE_PIPELINE};
