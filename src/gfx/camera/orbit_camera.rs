use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use crate::config::CameraConfig;
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

pub const MIN_PHI: f32 = 0.1;
pub const MAX_PHI: f32 = std::f32::consts::PI - 0.1;

/// Spherical camera orbiting the origin.
///
/// `theta` is the azimuth around +Y, `phi` the polar angle measured from +Y.
/// Every mutator reclamps and recomputes `eye`.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    /// Radians of orbit per pixel of drag.
    pub orbit_sensitivity: f32,
    /// Fractional radius change per wheel notch.
    pub zoom_step: f32,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
}

impl Camera for OrbitCamera {
    fn view_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.eye);
        let target = Point3::from_vec(self.target);
        Matrix4::look_at_rh(eye, target, self.up)
    }

    fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

impl OrbitCamera {
    pub fn new(radius: f32, theta: f32, phi: f32, aspect: f32) -> Self {
        let mut camera = Self {
            radius,
            theta,
            phi,
            eye: Vector3::zero(), // Will be auto-calculted in `update()` nevertheless.
            target: Vector3::zero(),
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            orbit_sensitivity: 0.01,
            zoom_step: 0.1,
            aspect,
            fovy: Deg(75.0).into(),
            znear: 0.1,
            zfar: 1000.0,
            uniform: CameraUniform::default(),
        };
        camera.clamp_and_update();
        camera
    }

    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self::new(config.radius, config.theta, config.phi, aspect);
        camera.bounds.min_radius = config.min_radius;
        camera.bounds.max_radius = config.max_radius;
        camera.orbit_sensitivity = config.orbit_sensitivity;
        camera.zoom_step = config.zoom_step;
        camera.fovy = Deg(config.fov_degrees).into();
        camera.znear = config.near;
        camera.zfar = config.far;
        camera.clamp_and_update();
        camera
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.clamp(self.bounds.min_radius, self.bounds.max_radius);
        self.update();
    }

    pub fn set_phi(&mut self, phi: f32) {
        self.phi = phi.clamp(self.bounds.min_phi, self.bounds.max_phi);
        self.update();
    }

    pub fn set_theta(&mut self, theta: f32) {
        self.theta = theta;
        self.update();
    }

    /// Adds to the azimuth; auto-rotation passes `speed * elapsed_seconds`.
    pub fn advance(&mut self, delta_theta: f32) {
        self.set_theta(self.theta + delta_theta);
    }

    /// Orbits by a pointer delta in pixels. Dragging right decreases theta,
    /// dragging down increases phi.
    pub fn orbit(&mut self, delta_x: f32, delta_y: f32) {
        self.theta -= delta_x * self.orbit_sensitivity;
        self.set_phi(self.phi + delta_y * self.orbit_sensitivity);
    }

    /// Scales the radius by `1 ± zoom_step` according to the sign of the
    /// wheel delta (positive zooms out). A zero delta is ignored.
    pub fn zoom(&mut self, wheel_delta_y: f32) {
        if wheel_delta_y > 0.0 {
            self.set_radius(self.radius * (1.0 + self.zoom_step));
        } else if wheel_delta_y < 0.0 {
            self.set_radius(self.radius * (1.0 - self.zoom_step));
        }
    }

    fn clamp_and_update(&mut self) {
        self.radius = self.radius.clamp(self.bounds.min_radius, self.bounds.max_radius);
        self.phi = self.phi.clamp(self.bounds.min_phi, self.bounds.max_phi);
        self.update();
    }

    /// Updates the camera after changing `radius`, `theta` or `phi`.
    fn update(&mut self) {
        self.eye = calculate_cartesian_eye_position(self.radius, self.theta, self.phi, self.target);
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view = convert_matrix4_to_array(self.view_matrix());
        self.uniform.proj = convert_matrix4_to_array(self.projection_matrix());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_radius: f32,
    pub max_radius: f32,
    pub min_phi: f32,
    pub max_phi: f32,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_radius: 8.0,
            max_radius: 80.0,
            min_phi: MIN_PHI,
            max_phi: MAX_PHI,
        }
    }
}

fn calculate_cartesian_eye_position(
    radius: f32,
    theta: f32,
    phi: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> OrbitCamera {
        OrbitCamera::from_config(&CameraConfig::default(), 16.0 / 9.0)
    }

    #[test]
    fn eye_follows_spherical_coordinates() {
        let mut cam = camera();
        cam.set_theta(0.0);
        cam.set_phi(std::f32::consts::FRAC_PI_2);
        cam.set_radius(10.0);

        assert_relative_eq!(cam.eye.x, 10.0, epsilon = 1e-4);
        assert_relative_eq!(cam.eye.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(cam.eye.z, 0.0, epsilon = 1e-4);
        assert_relative_eq!(cam.eye.magnitude(), cam.radius, epsilon = 1e-4);
    }

    #[test]
    fn phi_is_clamped_away_from_poles() {
        let mut cam = camera();
        for delta in [-1000.0, -3.0, 0.5, 3.0, 1000.0] {
            cam.orbit(0.0, delta * 100.0);
            assert!(cam.phi >= MIN_PHI && cam.phi <= MAX_PHI, "phi {}", cam.phi);
        }
    }

    #[test]
    fn zoom_is_sign_based_and_bounded() {
        let mut cam = camera();
        cam.set_radius(20.0);

        cam.zoom(3.0);
        assert_relative_eq!(cam.radius, 22.0, epsilon = 1e-4);
        cam.zoom(-120.0);
        assert_relative_eq!(cam.radius, 19.8, epsilon = 1e-4);
        cam.zoom(0.0);
        assert_relative_eq!(cam.radius, 19.8, epsilon = 1e-4);

        for _ in 0..100 {
            cam.zoom(1.0);
        }
        assert_eq!(cam.radius, 80.0);
        for _ in 0..100 {
            cam.zoom(-1.0);
        }
        assert_eq!(cam.radius, 8.0);
    }

    #[test]
    fn advance_moves_theta_only() {
        let mut cam = camera();
        let (radius, phi) = (cam.radius, cam.phi);
        cam.advance(0.3 * 0.5);
        assert_relative_eq!(cam.theta, 0.15, epsilon = 1e-6);
        assert_eq!(cam.radius, radius);
        assert_eq!(cam.phi, phi);
    }

    #[test]
    fn view_looks_at_origin() {
        let mut cam = camera();
        cam.orbit(37.0, -12.0);
        let origin_in_view = cam.view_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin_in_view.x, 0.0, epsilon = 1e-3);
        assert_relative_eq!(origin_in_view.y, 0.0, epsilon = 1e-3);
        assert_relative_eq!(-origin_in_view.z, cam.radius, epsilon = 1e-3);
    }
}
