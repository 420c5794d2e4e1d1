use cgmath::{Matrix4, SquareMatrix};
use winit::event::{DeviceEvent, WindowEvent};

use super::{
    camera_controller::{CameraController, ModelRotation},
    orbit_camera::OrbitCamera,
};
use crate::config::StudioConfig;

pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    pub fn from_config(config: &StudioConfig) -> Self {
        let aspect = config.window_width as f32 / config.window_height.max(1) as f32;
        Self::new(
            OrbitCamera::from_settings(&config.camera, aspect),
            CameraController::from_settings(&config.controller),
        )
    }

    pub fn process_window_event(&mut self, event: &WindowEvent) -> bool {
        self.controller.process_window_event(event, &mut self.camera)
    }

    pub fn process_device_event(&mut self, event: &DeviceEvent, model: &mut ModelRotation) -> bool {
        self.controller
            .process_device_event(event, &mut self.camera, model)
    }
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    /// Creates a default [CameraUniform].
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}
