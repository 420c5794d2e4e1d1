use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use super::orbit_camera::{wrap_angle, OrbitCamera};
use crate::config::ControllerSettings;

/// What a mouse drag currently does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Orbit the camera around its target
    Orbit,
    /// Move the target in the view plane
    Pan,
    /// Turn the model in front of the camera
    RotateModel,
}

/// Yaw/pitch applied to the subject model, in radians
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModelRotation {
    pub yaw: f32,
    pub pitch: f32,
}

impl ModelRotation {
    pub const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

    pub fn new(yaw: f32, pitch: f32) -> Self {
        let mut rotation = Self::default();
        rotation.set(yaw, pitch);
        rotation
    }

    pub fn set(&mut self, yaw: f32, pitch: f32) {
        self.yaw = wrap_angle(yaw);
        self.pitch = pitch.clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    pub fn add(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.set(self.yaw + delta_yaw, self.pitch + delta_pitch);
    }
}

/// Turns mouse input into camera and model motion
///
/// - left drag orbits the camera
/// - middle drag, or shift + left drag, pans
/// - right drag rotates the model
/// - the wheel zooms
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub model_rotate_speed: f32,
    is_left_pressed: bool,
    is_middle_pressed: bool,
    is_right_pressed: bool,
    is_shift_held: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        let defaults = ControllerSettings::default();
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: defaults.pan_speed,
            model_rotate_speed: defaults.model_rotate_speed,
            is_left_pressed: false,
            is_middle_pressed: false,
            is_right_pressed: false,
            is_shift_held: false,
        }
    }

    pub fn from_settings(settings: &ControllerSettings) -> Self {
        let mut controller = Self::new(settings.rotate_speed, settings.zoom_speed);
        controller.pan_speed = settings.pan_speed;
        controller.model_rotate_speed = settings.model_rotate_speed;
        controller
    }

    /// Handles button, wheel and modifier events from the window. Returns
    /// true when the view changed.
    pub fn process_window_event(&mut self, event: &WindowEvent, camera: &mut OrbitCamera) -> bool {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                self.process_mouse_button(*button, *state);
                false
            }
            WindowEvent::MouseWheel { delta, .. } => self.process_scroll(delta, camera),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.set_shift_held(modifiers.state().shift_key());
                false
            }
            WindowEvent::Focused(false) => {
                self.release_all();
                false
            }
            _ => false,
        }
    }

    /// Handles raw mouse motion. Returns true when the view changed.
    pub fn process_device_event(
        &mut self,
        event: &DeviceEvent,
        camera: &mut OrbitCamera,
        model: &mut ModelRotation,
    ) -> bool {
        match event {
            DeviceEvent::MouseMotion { delta } => self.process_mouse_motion(*delta, camera, model),
            _ => false,
        }
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.is_left_pressed = pressed,
            MouseButton::Middle => self.is_middle_pressed = pressed,
            MouseButton::Right => self.is_right_pressed = pressed,
            _ => (),
        }
    }

    pub fn set_shift_held(&mut self, held: bool) {
        if held != self.is_shift_held {
            log::debug!("Shift state changed: {}", held);
        }
        self.is_shift_held = held;
    }

    /// Forgets all held buttons, e.g. when the window loses focus mid-drag
    pub fn release_all(&mut self) {
        self.is_left_pressed = false;
        self.is_middle_pressed = false;
        self.is_right_pressed = false;
        self.is_shift_held = false;
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        if self.is_middle_pressed || (self.is_left_pressed && self.is_shift_held) {
            Some(DragMode::Pan)
        } else if self.is_left_pressed {
            Some(DragMode::Orbit)
        } else if self.is_right_pressed {
            Some(DragMode::RotateModel)
        } else {
            None
        }
    }

    pub fn process_mouse_motion(
        &mut self,
        delta: (f64, f64),
        camera: &mut OrbitCamera,
        model: &mut ModelRotation,
    ) -> bool {
        let (dx, dy) = (delta.0 as f32, delta.1 as f32);
        if dx == 0.0 && dy == 0.0 {
            return false;
        }

        match self.drag_mode() {
            Some(DragMode::Orbit) => {
                camera.add_yaw(-dx * self.rotate_speed);
                camera.add_pitch(dy * self.rotate_speed);
                true
            }
            Some(DragMode::Pan) => {
                camera.pan((-dx * self.pan_speed, dy * self.pan_speed));
                true
            }
            Some(DragMode::RotateModel) => {
                model.add(dx * self.model_rotate_speed, dy * self.model_rotate_speed);
                true
            }
            None => false,
        }
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta, camera: &mut OrbitCamera) -> bool {
        let scroll_amount = -match delta {
            MouseScrollDelta::LineDelta(_, scroll) => *scroll,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                *scroll as f32 / 40.0
            }
        };
        if scroll_amount == 0.0 {
            return false;
        }
        camera.add_distance(scroll_amount * self.zoom_speed);
        true
    }

    /// Returns true if currently panning
    pub fn is_panning(&self) -> bool {
        self.drag_mode() == Some(DragMode::Pan)
    }

    /// Returns true if currently rotating
    pub fn is_rotating(&self) -> bool {
        self.drag_mode() == Some(DragMode::Orbit)
    }
}
