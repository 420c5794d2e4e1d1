// src/lib.rs
//! Icon Studio
//!
//! Renders 3D models into PNG inventory icons. The artist picks an OBJ model
//! and an MTL material, frames it with an orbit camera and exports the view
//! to a file or to the clipboard as base64 text.

pub mod app;
pub mod assets;
pub mod config;
pub mod error;
pub mod export;
pub mod gfx;
pub mod prelude;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::IconStudioApp;
pub use config::StudioConfig;
pub use error::{Result, StudioError};

/// Creates an application with the settings from the environment
pub fn default() -> Result<IconStudioApp> {
    IconStudioApp::new(StudioConfig::load()?)
}
