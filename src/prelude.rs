//! # Icon Studio Prelude
//!
//! Commonly used types for driving the studio or rendering icons without
//! a window.
//!
//! ```no_run
//! use icon_studio::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut app = icon_studio::default()?;
//!     app.load_model("models/sword.obj");
//!     app.run()
//! }
//! ```

// Re-export core application types
pub use crate::app::IconStudioApp;
pub use crate::config::{OutputSettings, StudioConfig};
pub use crate::default;
pub use crate::error::{Result, StudioError};

// Assets
pub use crate::assets::{load_material, load_model, LoadEvent, ModelData, ModelLoader};

// Rendering and scene types
pub use crate::gfx::camera::{CameraManager, OrbitCamera};
pub use crate::gfx::rendering::{IconRenderer, IconRequest, RenderEngine};
pub use crate::gfx::scene::Scene;

// Export
pub use crate::export::{export_icon, ExportReport, ExportTarget, SystemClipboard};
