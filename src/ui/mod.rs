//! # User Interface Module
//!
//! Dear ImGui based controls for the studio.
//!
//! - [`UiManager`] - ImGui integration with winit and wgpu, input capture
//! - [`panel`] - the studio panel, which reports user requests as
//!   [`PanelAction`]s instead of performing them
//!
//! When the UI wants the mouse, camera movement is disabled.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::{EventRoute, UiManager};
pub use panel::{icon_panel, PanelAction, PanelState, Status, StatusLevel};
