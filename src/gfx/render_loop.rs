use std::time::Instant;

/// Frame clock for the continuously redrawn scene.
///
/// The window event loop asks for a redraw while the loop is running;
/// [`RenderLoop::stop`] is the single cancellation point used on teardown.
#[derive(Debug)]
pub struct RenderLoop {
    running: bool,
    last_frame: Option<Instant>,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            running: true,
            last_frame: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds since the previous frame, zero on the first one, or `None`
    /// once stopped.
    pub fn begin_frame(&mut self, now: Instant) -> Option<f32> {
        if !self.running {
            return None;
        }
        let dt = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        Some(dt)
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.last_frame = None;
    }
}
