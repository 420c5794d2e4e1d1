use std::f32::consts::{PI, TAU};

use cgmath::*;

use super::camera_utils::{convert_matrix4_to_array, CameraUniform};
use crate::config::{CameraSettings, FOV_RANGE_DEGREES};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Camera placed on a sphere around `target`
///
/// The world is Z-up. Yaw turns around Z starting from +Y, pitch lifts the
/// camera towards +Z. `eye` is always `target + direction() * distance`.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
    defaults: OrbitCameraDefaults,
}

#[derive(Debug, Clone, Copy)]
struct OrbitCameraDefaults {
    distance: f32,
    pitch: f32,
    yaw: f32,
    fovy: Rad<f32>,
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        Self::with_bounds(
            distance,
            pitch,
            yaw,
            target,
            aspect,
            OrbitCameraBounds::default(),
        )
    }

    pub fn with_bounds(
        distance: f32,
        pitch: f32,
        yaw: f32,
        target: Vector3<f32>,
        aspect: f32,
        bounds: OrbitCameraBounds,
    ) -> Self {
        let fovy = Rad(PI / 6.0);
        let mut camera = Self {
            distance: bounds.clamp_distance(distance),
            pitch: bounds.clamp_pitch(pitch),
            yaw: wrap_angle(yaw),
            eye: Vector3::zero(), // Will be auto-calculted in `update()` nevertheless.
            target,
            up: Vector3::unit_z(),
            bounds,
            aspect,
            fovy,
            znear: 0.5,
            zfar: 10_000.0,
            uniform: CameraUniform::default(),
            defaults: OrbitCameraDefaults {
                distance,
                pitch,
                yaw,
                fovy,
            },
        };
        camera.update();
        camera
    }

    /// Builds a camera from the start-up settings (angles in degrees)
    pub fn from_settings(settings: &CameraSettings, aspect: f32) -> Self {
        let bounds = OrbitCameraBounds {
            min_distance: settings.min_distance,
            max_distance: settings.max_distance,
            min_pitch: settings.min_pitch.to_radians(),
            max_pitch: settings.max_pitch.to_radians(),
        };
        let mut camera = Self::with_bounds(
            settings.distance,
            settings.pitch.to_radians(),
            settings.yaw.to_radians(),
            Vector3::zero(),
            aspect,
            bounds,
        );
        camera.fovy = Deg(settings.fov).into();
        camera.defaults.fovy = camera.fovy;
        camera
    }

    pub fn reset_to_default(&mut self) {
        self.distance = self.bounds.clamp_distance(self.defaults.distance);
        self.pitch = self.bounds.clamp_pitch(self.defaults.pitch);
        self.yaw = wrap_angle(self.defaults.yaw);
        self.fovy = self.defaults.fovy;
        self.target = Vector3::zero();

        self.update();
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = self.bounds.clamp_distance(distance);
        self.update();
    }

    /// Zooms by a fraction of the current distance, so a wheel notch feels
    /// the same close up and far away.
    pub fn add_distance(&mut self, delta: f32) {
        self.set_distance(self.distance + self.distance * delta);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = self.bounds.clamp_pitch(pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        self.yaw = wrap_angle(yaw);
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    pub fn set_target(&mut self, target: Vector3<f32>) {
        self.target = target;
        self.update();
    }

    pub fn set_fov(&mut self, fovy: Deg<f32>) {
        let (min, max) = FOV_RANGE_DEGREES;
        self.fovy = Deg(fovy.0.clamp(min, max)).into();
    }

    /// Pans the target relative to the current view direction
    /// delta.0 = horizontal pan (left/right relative to camera view)
    /// delta.1 = vertical pan (up/down relative to camera view)
    ///
    /// Both components are fractions of the orbit distance.
    pub fn pan(&mut self, delta: (f32, f32)) {
        let forward = self.forward();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        let movement = (right * delta.0 + up * delta.1) * self.distance;

        self.target += movement;
        self.update();
    }

    /// Centres the orbit on a bounding sphere and backs off until the whole
    /// sphere fits the vertical field of view.
    pub fn frame_bounds(&mut self, center: Vector3<f32>, radius: f32) {
        self.target = center;
        let half_fov = (self.fovy.0 * 0.5).max(f32::EPSILON);
        let fit_distance = radius.max(0.0) / half_fov.sin() * 1.05;
        self.set_distance(fit_distance);
    }

    /// Unit vector from the target towards the eye
    pub fn direction(&self) -> Vector3<f32> {
        orbit_direction(self.pitch, self.yaw)
    }

    /// Unit vector the camera looks along
    pub fn forward(&self) -> Vector3<f32> {
        -self.direction()
    }

    pub fn eye(&self) -> Vector3<f32> {
        self.eye
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(Point3::from_vec(self.eye), self.forward(), self.up)
    }

    /// View-projection for the window's aspect ratio
    pub fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.view_projection_with_aspect(self.aspect)
    }

    /// View-projection for a render target of a different shape, such as
    /// an exported icon.
    pub fn view_projection_with_aspect(&self, aspect: f32) -> Matrix4<f32> {
        let proj = OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, aspect, self.znear, self.zfar);
        proj * self.view_matrix()
    }

    /// Updates the camera after changing `distance`, `pitch` or `yaw`.
    fn update(&mut self) {
        self.eye = calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn update_view_proj(&mut self) {
        self.uniform = CameraUniform {
            view_position: [self.eye.x, self.eye.y, self.eye.z, 1.0],
            view_proj: convert_matrix4_to_array(self.build_view_projection_matrix()),
        };
    }

    pub fn uniform_for_aspect(&self, aspect: f32) -> CameraUniform {
        CameraUniform {
            view_position: [self.eye.x, self.eye.y, self.eye.z, 1.0],
            view_proj: convert_matrix4_to_array(self.view_projection_with_aspect(aspect)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCameraBounds {
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: 10.0,
            max_distance: 1000.0,
            min_pitch: -89f32.to_radians(),
            max_pitch: 89f32.to_radians(),
        }
    }
}

impl OrbitCameraBounds {
    pub fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance)
    }

    pub fn clamp_pitch(&self, pitch: f32) -> f32 {
        pitch.clamp(self.min_pitch, self.max_pitch)
    }
}

/// Wraps an angle into (-PI, PI]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

pub fn orbit_direction(pitch: f32, yaw: f32) -> Vector3<f32> {
    Vector3::new(
        pitch.cos() * yaw.sin(),
        pitch.cos() * yaw.cos(),
        pitch.sin(),
    )
    .normalize()
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    target + orbit_direction(pitch, yaw) * distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-3
    }

    #[test]
    fn eye_matches_spherical_formula() {
        let target = Vector3::new(1.0, -2.0, 3.0);
        let camera = OrbitCamera::new(50.0, 0.3, 1.2, target, 1.0);

        let expected = target
            + Vector3::new(0.3f32.cos() * 1.2f32.sin(), 0.3f32.cos() * 1.2f32.cos(), 0.3f32.sin())
                * 50.0;
        assert!(approx(camera.eye(), expected));
    }

    #[test]
    fn zero_angles_look_down_negative_y() {
        let camera = OrbitCamera::new(100.0, 0.0, 0.0, Vector3::zero(), 1.0);
        assert!(approx(camera.eye(), Vector3::new(0.0, 100.0, 0.0)));
        assert!(approx(camera.forward(), Vector3::new(0.0, -1.0, 0.0)));
    }

    #[test]
    fn target_projects_to_the_centre() {
        let camera = OrbitCamera::new(80.0, 0.4, -2.0, Vector3::new(3.0, 4.0, 5.0), 1.5);
        let clip = camera.build_view_projection_matrix() * camera.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;

        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn random_orbits_keep_invariants() {
        let mut rng = rand::rng();
        let mut camera = OrbitCamera::new(100.0, 0.0, 0.0, Vector3::zero(), 1.0);

        for _ in 0..500 {
            match rng.random_range(0..4) {
                0 => camera.add_yaw(rng.random_range(-10.0..10.0)),
                1 => camera.add_pitch(rng.random_range(-10.0..10.0)),
                2 => camera.add_distance(rng.random_range(-2.0..5.0)),
                _ => camera.pan((rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0))),
            }

            assert!(camera.pitch >= -89f32.to_radians() && camera.pitch <= 89f32.to_radians());
            assert!(camera.distance >= 10.0 && camera.distance <= 1000.0);
            assert!(camera.yaw > -PI - 1e-5 && camera.yaw <= PI + 1e-5);
            assert!((camera.direction().magnitude() - 1.0).abs() < 1e-4);

            let expected = camera.target + camera.direction() * camera.distance;
            assert!((camera.eye() - expected).magnitude() < 1e-2);
        }
    }

    #[test]
    fn pitch_and_distance_are_clamped() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        assert_eq!(camera.distance, 10.0);

        camera.set_distance(5000.0);
        assert_eq!(camera.distance, 1000.0);

        camera.set_pitch(PI);
        assert!((camera.pitch - 89f32.to_radians()).abs() < 1e-6);
        camera.set_pitch(-PI);
        assert!((camera.pitch + 89f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn view_matrix_puts_target_in_front() {
        let camera = OrbitCamera::new(80.0, 0.4, -2.0, Vector3::new(3.0, 4.0, 5.0), 1.0);
        let view_space = camera.view_matrix() * camera.target.extend(1.0);
        assert!(view_space.x.abs() < 1e-3);
        assert!(view_space.y.abs() < 1e-3);
        assert!((view_space.z + 80.0).abs() < 1e-2);
    }

    #[test]
    fn pan_moves_target_and_eye_together() {
        let mut camera = OrbitCamera::new(100.0, 0.2, 0.7, Vector3::zero(), 1.0);
        let offset = camera.eye() - camera.target;

        camera.pan((0.1, -0.05));

        assert!(camera.target.magnitude() > 1.0);
        assert!(approx(camera.eye() - camera.target, offset));
        // Panning stays in the view plane
        assert!(camera.target.dot(camera.forward()).abs() < 1e-3);
    }

    #[test]
    fn zoom_is_proportional_to_distance() {
        let mut camera = OrbitCamera::new(100.0, 0.0, 0.0, Vector3::zero(), 1.0);
        camera.add_distance(-0.1);
        assert!((camera.distance - 90.0).abs() < 1e-4);
        camera.add_distance(0.5);
        assert!((camera.distance - 135.0).abs() < 1e-4);
    }

    #[test]
    fn frame_bounds_fits_sphere() {
        let mut camera = OrbitCamera::new(100.0, 0.3, 0.3, Vector3::zero(), 1.0);
        camera.frame_bounds(Vector3::new(0.0, 0.0, 20.0), 50.0);

        assert!(approx(camera.target, Vector3::new(0.0, 0.0, 20.0)));
        let half_fov = camera.fovy.0 * 0.5;
        assert!(camera.distance * half_fov.sin() >= 50.0);

        camera.frame_bounds(Vector3::zero(), 0.01);
        assert_eq!(camera.distance, 10.0);
    }

    #[test]
    fn wrap_angle_range() {
        assert!((wrap_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!((wrap_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-6);
        assert!((wrap_angle(TAU + 0.5) - 0.5).abs() < 1e-5);
    }

    #[test]
    fn reset_restores_configured_view() {
        let settings = CameraSettings::default();
        let mut camera = OrbitCamera::from_settings(&settings, 1.0);
        camera.add_yaw(1.0);
        camera.add_pitch(0.5);
        camera.pan((0.2, 0.2));
        camera.set_distance(700.0);

        camera.reset_to_default();

        assert!((camera.yaw - settings.yaw.to_radians()).abs() < 1e-5);
        assert!((camera.pitch - settings.pitch.to_radians()).abs() < 1e-5);
        assert_eq!(camera.distance, settings.distance);
        assert!(approx(camera.target, Vector3::zero()));
    }
}
