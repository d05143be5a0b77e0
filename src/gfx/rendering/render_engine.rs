//! WGPU-based rendering engine for the point-cloud viewer
//!
//! Owns the surface, device and the two scene pipelines: additive glow
//! sprites for the points and alpha-blended lines for the comparison overlay.

use std::sync::Arc;

use log::{debug, info, warn};
use wgpu::{Device, TextureFormat};

use crate::error::{Result, VizError};
use crate::gfx::{camera::camera_utils::CameraUniform, overlay::LineSegment};

use super::line_renderer::{LineRenderer, LineVertex, LINE_PIPELINE};
use super::pipeline_manager::{PipelineConfig, PipelineManager, ADDITIVE_BLENDING};
use super::point_renderer::{PointInstance, PointRenderer, POINT_PIPELINE};
use super::scene_bindings::{PointStyleUniform, SceneBindings};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.05,
    a: 1.0,
};

/// Core rendering engine managing GPU resources and draw calls
///
/// There is no depth attachment: points are composited additively without
/// depth writes, and lines are drawn after them.
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    scene_bindings: SceneBindings,
    point_renderer: PointRenderer,
    line_renderer: LineRenderer,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Errors
    /// Returns [`VizError::Surface`] if no surface, adapter or device can be
    /// acquired.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| VizError::Surface(format!("create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| VizError::Surface(format!("request adapter: {e}")))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| VizError::Surface(format!("request device: {e}")))?;

        info!("using adapter {:?}", adapter.get_info().name);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| VizError::Surface("surface reports no formats".to_string()))?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let scene_bindings = SceneBindings::new(&device);
        let point_renderer = PointRenderer::new(&device);
        let line_renderer = LineRenderer::new(&device);

        // Wrap device and queue in Arc for pipeline manager
        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("glow", include_str!("shaders/glow_points.wgsl"));
        pipeline_manager.load_shader("lines", include_str!("shaders/connection_lines.wgsl"));

        pipeline_manager.register_pipeline(
            POINT_PIPELINE,
            PipelineConfig::default()
                .with_label("GLOW POINTS")
                .with_shader("glow")
                .with_bind_group_layouts(vec![scene_bindings.bind_group_layout().clone()])
                .with_vertex_buffers(vec![PointInstance::desc()])
                .with_blended_target(format, ADDITIVE_BLENDING),
        );

        pipeline_manager.register_pipeline(
            LINE_PIPELINE,
            PipelineConfig::default()
                .with_label("CONNECTION LINES")
                .with_shader("lines")
                .with_bind_group_layouts(vec![scene_bindings.bind_group_layout().clone()])
                .with_vertex_buffers(vec![LineVertex::desc()])
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_blended_target(format, wgpu::BlendState::ALPHA_BLENDING),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            return Err(VizError::Surface(errors.join("; ")));
        }

        Ok(RenderEngine {
            device: device_handle,
            config,
            format,
            surface,
            queue: queue_handle,
            pipeline_manager,
            scene_bindings,
            point_renderer,
            line_renderer,
        })
    }

    /// Renders a frame with an optional UI overlay drawn last
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame<F>(&mut self, ui_callback: Option<F>) -> Result<()>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface texture timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(VizError::Surface(e.to_string())),
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.scene_bindings.bind_group(), &[]);

            if let Some(pipeline) = self.pipeline_manager.pipeline(POINT_PIPELINE) {
                self.point_renderer.render(&mut render_pass, pipeline);
            }
            if let Some(pipeline) = self.pipeline_manager.pipeline(LINE_PIPELINE) {
                self.line_renderer.render(&mut render_pass, pipeline);
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Uploads camera matrices and point style for the next frame
    pub fn update(&mut self, camera_uniform: CameraUniform, point_size: f32, glow_intensity: f32) {
        let style = PointStyleUniform {
            viewport: [self.config.width as f32, self.config.height as f32],
            point_size,
            glow_intensity,
        };
        self.scene_bindings.update(&self.queue, camera_uniform, style);
    }

    /// Replaces all point instances
    pub fn upload_points(&mut self, instances: &[PointInstance]) {
        self.point_renderer.upload(&self.device, &self.queue, instances);
    }

    /// Replaces all connection lines; an empty slice clears the overlay
    pub fn upload_lines(&mut self, segments: &[LineSegment]) {
        self.line_renderer.upload(&self.device, &self.queue, segments);
    }

    /// Resizes the surface; zero-sized requests are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Returns the surface texture format
    ///
    /// Used for creating compatible render targets and UI systems.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
