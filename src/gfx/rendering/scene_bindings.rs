//! Per-frame uniforms shared by the point and line pipelines
//!
//! Binding 0 carries the camera, binding 1 the point style. Both live in
//! group 0 of every pipeline.

use crate::{gfx::camera::camera_utils::CameraUniform, wgpu_utils::uniform_buffer::UniformBuffer};

/// Live point styling. MUST match `PointStyle` in the glow shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointStyleUniform {
    /// Surface size in physical pixels.
    pub viewport: [f32; 2],
    pub point_size: f32,
    pub glow_intensity: f32,
}

impl Default for PointStyleUniform {
    fn default() -> Self {
        Self {
            viewport: [1.0, 1.0],
            point_size: 1.2,
            glow_intensity: 0.8,
        }
    }
}

pub struct SceneBindings {
    camera: UniformBuffer<CameraUniform>,
    style: UniformBuffer<PointStyleUniform>,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl SceneBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let camera = UniformBuffer::new_with_data(device, &CameraUniform::default());
        let style = UniformBuffer::new_with_data(device, &PointStyleUniform::default());

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: style.binding_resource(),
                },
            ],
        });

        Self {
            camera,
            style,
            bind_group_layout,
            bind_group,
        }
    }

    /// Uploads camera and style; unchanged values are not rewritten.
    pub fn update(&mut self, queue: &wgpu::Queue, camera: CameraUniform, style: PointStyleUniform) {
        self.camera.update_content(queue, camera);
        self.style.update_content(queue, style);
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
