use std::time::Instant;

use cgmath::{Matrix4, SquareMatrix};

use super::{camera_controller::CameraController, orbit_camera::OrbitCamera};

pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    /// Per-frame camera step: fires a due auto-rotate resume, then advances
    /// the azimuth by `rotation_speed * dt` while auto-rotation is on.
    pub fn tick(&mut self, dt: f32, rotation_speed: f32, now: Instant) {
        self.controller.poll_resume(now);
        if self.controller.auto_rotate() && rotation_speed > 0.0 && dt > 0.0 {
            self.camera.advance(rotation_speed * dt);
        }
        self.camera.update_view_proj();
    }
}

pub trait Camera: Sized {
    fn view_matrix(&self) -> Matrix4<f32>;

    fn projection_matrix(&self) -> Matrix4<f32>;
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct CameraUniform {
    /// The eye position of the camera in homogenous coordinates.
    ///
    /// Homogenous coordinates are used to fullfill the 16 byte alignment requirement.
    pub view_position: [f32; 4],

    /// World to view space. Point sprites are expanded in view space.
    pub view: [[f32; 4]; 4],

    pub proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    /// Creates a default [CameraUniform].
    fn default() -> Self {
        Self {
            view_position: [0.0; 4],
            view: convert_matrix4_to_array(Matrix4::identity()),
            proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn manager() -> CameraManager {
        CameraManager::new(
            OrbitCamera::from_config(&CameraConfig::default(), 1.0),
            CameraController::new(Duration::from_secs(2)),
        )
    }

    #[test]
    fn tick_rotates_by_speed_times_elapsed() {
        let mut manager = manager();
        manager.tick(0.5, 0.3, Instant::now());
        assert_relative_eq!(manager.camera.theta, 0.15, epsilon = 1e-6);
    }

    #[test]
    fn tick_holds_still_while_dragging_or_stopped() {
        let mut manager = manager();
        manager.tick(1.0, 0.0, Instant::now());
        assert_eq!(manager.camera.theta, 0.0);

        manager.controller.pointer_down((0.0, 0.0));
        manager.tick(1.0, 0.3, Instant::now());
        assert_eq!(manager.camera.theta, 0.0);
    }

    #[test]
    fn uniform_is_refreshed_on_tick() {
        let mut manager = manager();
        manager.tick(0.0, 0.3, Instant::now());
        let eye = manager.camera.eye;
        assert_eq!(manager.camera.uniform.view_position, [eye.x, eye.y, eye.z, 1.0]);
        assert_ne!(manager.camera.uniform.proj, CameraUniform::default().proj);
    }

    #[test]
    fn uniform_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 144);
    }
}
