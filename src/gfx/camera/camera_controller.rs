use std::time::{Duration, Instant};

use log::trace;

use super::orbit_camera::OrbitCamera;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { last: (f32, f32) },
}

/// Turns pointer drags and wheel input into camera motion, and owns the
/// auto-rotate flag that dragging suspends.
pub struct CameraController {
    state: DragState,
    auto_rotate: bool,
    resume_delay: Duration,
    resume_at: Option<Instant>,
}

impl CameraController {
    pub fn new(resume_delay: Duration) -> Self {
        Self {
            state: DragState::Idle,
            auto_rotate: true,
            resume_delay,
            resume_at: None,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn resume_at(&self) -> Option<Instant> {
        self.resume_at
    }

    /// Enters dragging and stops auto-rotation. A pending resume is dropped.
    pub fn pointer_down(&mut self, position: (f32, f32)) {
        self.state = DragState::Dragging { last: position };
        self.auto_rotate = false;
        self.resume_at = None;
    }

    /// Orbits by the delta since the last move. Returns whether the camera moved.
    pub fn pointer_move(&mut self, position: (f32, f32), camera: &mut OrbitCamera) -> bool {
        let DragState::Dragging { last } = self.state else {
            return false;
        };
        let (dx, dy) = (position.0 - last.0, position.1 - last.1);
        self.state = DragState::Dragging { last: position };
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        camera.orbit(dx, dy);
        trace!("orbit theta={:.3} phi={:.3}", camera.theta, camera.phi);
        true
    }

    /// Leaves dragging and schedules auto-rotation to come back.
    pub fn pointer_up(&mut self, now: Instant) {
        if self.is_dragging() {
            self.state = DragState::Idle;
            self.resume_at = Some(now + self.resume_delay);
        }
    }

    /// Fires the resume deadline if it has passed. A deadline reached while
    /// a new drag is in progress is discarded.
    pub fn poll_resume(&mut self, now: Instant) -> bool {
        match self.resume_at {
            Some(deadline) if now >= deadline => {
                self.resume_at = None;
                if self.is_dragging() {
                    return false;
                }
                self.auto_rotate = true;
                true
            }
            _ => false,
        }
    }

    /// Wheel input is independent of drag state.
    pub fn wheel(&mut self, delta_y: f32, camera: &mut OrbitCamera) {
        camera.zoom(delta_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use approx::assert_relative_eq;

    fn setup() -> (CameraController, OrbitCamera) {
        (
            CameraController::new(Duration::from_secs(2)),
            OrbitCamera::from_config(&CameraConfig::default(), 1.0),
        )
    }

    #[test]
    fn drag_orbits_and_suspends_rotation() {
        let (mut controller, mut camera) = setup();
        let (theta, phi) = (camera.theta, camera.phi);

        controller.pointer_down((100.0, 100.0));
        assert!(!controller.auto_rotate());
        assert!(controller.pointer_move((140.0, 130.0), &mut camera));

        assert_relative_eq!(camera.theta, theta - 0.40, epsilon = 1e-5);
        assert_relative_eq!(camera.phi, phi + 0.30, epsilon = 1e-5);
    }

    #[test]
    fn moves_without_drag_are_ignored() {
        let (mut controller, mut camera) = setup();
        let theta = camera.theta;
        assert!(!controller.pointer_move((50.0, 50.0), &mut camera));
        assert_eq!(camera.theta, theta);
    }

    #[test]
    fn rotation_resumes_after_quiet_period() {
        let (mut controller, _) = setup();
        let start = Instant::now();

        controller.pointer_down((0.0, 0.0));
        controller.pointer_up(start);
        assert!(!controller.poll_resume(start + Duration::from_millis(1999)));
        assert!(!controller.auto_rotate());
        assert!(controller.poll_resume(start + Duration::from_secs(2)));
        assert!(controller.auto_rotate());
    }

    #[test]
    fn new_drag_cancels_pending_resume() {
        let (mut controller, _) = setup();
        let start = Instant::now();

        controller.pointer_down((0.0, 0.0));
        controller.pointer_up(start);
        controller.pointer_down((5.0, 5.0));

        assert!(!controller.poll_resume(start + Duration::from_secs(10)));
        assert!(!controller.auto_rotate());
        assert!(controller.is_dragging());
    }

    #[test]
    fn release_without_press_schedules_nothing() {
        let (mut controller, _) = setup();
        controller.pointer_up(Instant::now());
        assert_eq!(controller.resume_at(), None);
        assert_eq!(controller.state(), DragState::Idle);
    }
}
