//! Orbit camera and mouse controls
//!
//! The camera sits on a sphere around a target point (Z-up world) and is
//! driven by mouse drags and the wheel through [`CameraController`].

pub mod camera_controller;
pub mod camera_utils;
pub mod orbit_camera;

// Re-export main types
pub use camera_controller::{CameraController, DragMode, ModelRotation};
pub use camera_utils::{CameraManager, CameraUniform};
pub use orbit_camera::{OrbitCamera, OrbitCameraBounds};
