use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::ViewerConfig;
use crate::data::{load_or_fallback, DataSource, HttpDataSource, LoadKind, LoadedData, RequestId, SharedConnection};
use crate::error::{Result, VizError};
use crate::gfx::picking::CanvasRect;
use crate::gfx::RenderEngine;
use crate::ui::{viewer_panels, UiActions, UiManager};
use crate::viewer::{ComparisonRequest, ViewerState};

const WINDOW_TITLE: &str = "Wrapped.ai";

/// Fetch results delivered back to the event loop thread.
#[derive(Debug)]
pub enum AppEvent {
    DataLoaded {
        request: RequestId,
        data: LoadedData,
    },
    ComparisonLoaded {
        request: ComparisonRequest,
        result: Result<Vec<SharedConnection>>,
    },
}

pub struct WrappedApp {
    event_loop: EventLoop<AppEvent>,
    app_state: AppState,
}

impl WrappedApp {
    /// Builds the event loop, the HTTP client and the viewer state.
    pub fn new(config: ViewerConfig) -> Result<Self> {
        let event_loop = EventLoop::<AppEvent>::with_user_event()
            .build()
            .map_err(|e| VizError::Surface(format!("event loop: {e}")))?;

        let source = HttpDataSource::from_config(&config.api)?;
        let fetcher = Fetcher {
            source: Arc::new(source),
            proxy: event_loop.create_proxy(),
        };
        let viewer = ViewerState::new(&config, 1280.0 / 800.0);

        Ok(Self {
            event_loop,
            app_state: AppState {
                window: None,
                render_engine: None,
                ui_manager: None,
                viewer,
                fetcher,
                cursor: (0.0, 0.0),
            },
        })
    }

    /// Runs until the window is closed. The initial load starts right away
    /// so it overlaps window and device creation.
    pub fn run(mut self) -> Result<()> {
        let request = self.app_state.viewer.begin_data_request();
        self.app_state.fetcher.load(request, LoadKind::Initial);

        self.event_loop.set_control_flow(ControlFlow::Poll);
        self.event_loop
            .run_app(&mut self.app_state)
            .map_err(|e| VizError::Surface(format!("event loop: {e}")))
    }
}

/// Runs API calls on worker threads and posts the results as [`AppEvent`]s.
struct Fetcher {
    source: Arc<dyn DataSource + Send + Sync>,
    proxy: EventLoopProxy<AppEvent>,
}

impl Fetcher {
    fn load(&self, request: RequestId, kind: LoadKind) {
        let source = Arc::clone(&self.source);
        let proxy = self.proxy.clone();
        let spawned = thread::Builder::new()
            .name("data-fetch".to_string())
            .spawn(move || {
                let mut rng = StdRng::from_os_rng();
                let data = load_or_fallback(source.as_ref(), kind, &mut rng);
                delivered(proxy.send_event(AppEvent::DataLoaded { request, data }), "data");
            });

        if let Err(err) = spawned {
            warn!("could not start data fetch: {err}");
            let data = LoadedData::fallback(err.to_string(), &mut StdRng::from_os_rng());
            delivered(self.proxy.send_event(AppEvent::DataLoaded { request, data }), "data");
        }
    }

    fn compare(&self, request: ComparisonRequest) {
        let source = Arc::clone(&self.source);
        let proxy = self.proxy.clone();
        let worker_request = request.clone();
        let spawned = thread::Builder::new()
            .name("compare-fetch".to_string())
            .spawn(move || {
                let result = source.compare(&worker_request.current_user, &worker_request.target);
                let event = AppEvent::ComparisonLoaded {
                    request: worker_request,
                    result,
                };
                delivered(proxy.send_event(event), "comparison");
            });

        if let Err(err) = spawned {
            warn!("could not start comparison fetch: {err}");
            let event = AppEvent::ComparisonLoaded {
                request,
                result: Err(VizError::Io(err)),
            };
            delivered(self.proxy.send_event(event), "comparison");
        }
    }
}

/// Logs a fetch result that could not be posted because the event loop has
/// already closed.
fn delivered<E>(sent: std::result::Result<(), E>, what: &str) -> bool {
    match sent {
        Ok(()) => true,
        Err(_) => {
            warn!("event loop closed before {what} arrived; result dropped");
            false
        }
    }
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    viewer: ViewerState,
    fetcher: Fetcher,
    cursor: (f32, f32),
}

impl AppState {
    fn handle_actions(&mut self, actions: UiActions) {
        if actions.refresh {
            let request = self.viewer.begin_data_request();
            info!("refreshing data");
            self.fetcher.load(request, LoadKind::Refresh);
        }
        if let Some(target) = actions.compare {
            if let Some(request) = self.viewer.begin_comparison(&target) {
                self.fetcher.compare(request);
            }
        }
        if actions.exit_compare {
            self.viewer.exit_comparison();
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_running() {
            self.viewer.teardown();
        }
        event_loop.exit();
    }

    fn redraw(&mut self) {
        let (Some(render_engine), Some(window)) = (self.render_engine.as_mut(), self.window.as_ref())
        else {
            return;
        };

        if !self.viewer.tick(Instant::now()) {
            return;
        }

        if let Some(instances) = self.viewer.take_point_upload() {
            render_engine.upload_points(&instances);
        }
        if let Some(segments) = self.viewer.take_line_upload() {
            render_engine.upload_lines(segments);
        }
        render_engine.update(
            self.viewer.camera.camera.uniform,
            self.viewer.controls.point_size,
            self.viewer.controls.glow_intensity,
        );

        let mut actions = UiActions::default();
        let viewer = &mut self.viewer;
        let ui_manager = self.ui_manager.as_mut();
        let frame = match ui_manager {
            Some(ui_manager) => render_engine.render_frame(Some(
                |device: &wgpu::Device,
                 queue: &wgpu::Queue,
                 encoder: &mut wgpu::CommandEncoder,
                 view: &wgpu::TextureView| {
                    actions = ui_manager.update_logic(window, |ui| viewer_panels(ui, viewer));
                    ui_manager.render_display_only(device, queue, encoder, view);
                },
            )),
            None => render_engine.render_frame(
                None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
            ),
        };
        if let Err(err) = frame {
            error!("frame failed: {err}");
        }

        self.handle_actions(actions);
    }
}

impl ApplicationHandler<AppEvent> for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(1280, 800));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                error!("could not create window: {err}");
                self.shutdown(event_loop);
                return;
            }
        };

        let (width, height): (u32, u32) = window.inner_size().into();
        let window_clone = window.clone();
        let renderer = match pollster::block_on(RenderEngine::new(window_clone, width, height)) {
            Ok(renderer) => renderer,
            Err(err) => {
                error!("could not initialise rendering: {err}");
                self.shutdown(event_loop);
                return;
            }
        };

        let mut ui_manager = UiManager::new(
            renderer.device(),
            renderer.queue(),
            renderer.surface_format(),
            &window,
        );
        ui_manager.update_display_size(width, height);
        self.viewer.resize(width, height);

        self.ui_manager = Some(ui_manager);
        self.render_engine = Some(renderer);
        self.window = Some(window);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::DataLoaded { request, data } => {
                self.viewer.apply_data(request, data);
            }
            AppEvent::ComparisonLoaded { request, result } => {
                self.viewer.apply_comparison(request.id, &request, result);
            }
        }
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // UI gets first look, except while a scene drag is in progress
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) && !self.viewer.is_dragging() {
                self.viewer.pointer_left();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if !self.viewer.cancel_comparison() {
                    self.shutdown(event_loop);
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if width == 0 || height == 0 {
                    return;
                }
                self.viewer.resize(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                let size = window.inner_size();
                let rect = CanvasRect::new(0.0, 0.0, size.width as f32, size.height as f32);
                self.viewer.pointer_moved(self.cursor, rect);
            }
            WindowEvent::CursorLeft { .. } => self.viewer.pointer_left(),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.viewer.pointer_pressed(self.cursor),
                ElementState::Released => {
                    if let Some(index) = self.viewer.pointer_released(Instant::now()) {
                        debug!("selected point {index}");
                    }
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                // Positive delta zooms out, as with a browser wheel event
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(position) => -position.y as f32,
                };
                self.viewer.wheel(delta_y);
            }
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.viewer.is_running() {
            return;
        }
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.viewer.is_running() {
            self.viewer.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event_loop::EventLoopClosed;

    #[test]
    fn closed_event_loop_counts_as_undelivered() {
        assert!(delivered(Ok::<(), EventLoopClosed<()>>(()), "data"));
        assert!(!delivered(Err(EventLoopClosed(())), "comparison"));
    }
}
