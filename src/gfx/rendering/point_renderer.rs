//! Instanced point sprites
//!
//! One instance per conversation point; the six sprite corners are derived
//! from the vertex index in the shader, so no per-vertex buffer is bound.

use bytemuck::{Pod, Zeroable};
use wgpu::RenderPass;

use crate::gfx::point_cloud::PointCloudBuffers;
use crate::wgpu_utils::uniform_buffer::VertexArrayBuffer;

pub const POINT_PIPELINE: &str = "GlowPoints";

/// Instance data for a single point sprite
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    _padding: f32,
}

const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32x3];

impl PointInstance {
    pub fn new(position: [f32; 3], size: f32, color: [f32; 3]) -> Self {
        Self {
            position,
            size,
            color,
            _padding: 0.0,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE_ATTRIBUTES,
        }
    }
}

/// Zips display positions (filtered, possibly parked) with the built colours
/// and sizes.
pub fn build_instances(buffers: &PointCloudBuffers, display_positions: &[f32]) -> Vec<PointInstance> {
    display_positions
        .chunks_exact(3)
        .zip(buffers.colors.chunks_exact(3))
        .zip(&buffers.sizes)
        .map(|((position, color), size)| {
            PointInstance::new(
                [position[0], position[1], position[2]],
                *size,
                [color[0], color[1], color[2]],
            )
        })
        .collect()
}

pub struct PointRenderer {
    instances: VertexArrayBuffer<PointInstance>,
}

impl PointRenderer {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            instances: VertexArrayBuffer::new(device, 1024),
        }
    }

    /// Replaces every instance; the previous contents are discarded.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, instances: &[PointInstance]) {
        self.instances.replace(device, queue, instances);
    }

    pub fn render<'a>(&'a self, render_pass: &mut RenderPass<'a>, pipeline: &'a wgpu::RenderPipeline) {
        if self.instances.is_empty() {
            return;
        }
        render_pass.set_pipeline(pipeline);
        render_pass.set_vertex_buffer(0, self.instances.slice());
        render_pass.draw(0..6, 0..self.instances.len() as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<PointInstance>(), 32);
        assert_eq!(INSTANCE_ATTRIBUTES[1].offset, 12);
        assert_eq!(INSTANCE_ATTRIBUTES[2].offset, 16);
    }

    #[test]
    fn instances_take_display_positions() {
        let buffers = PointCloudBuffers {
            positions: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            colors: vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            sizes: vec![0.9, 1.1],
        };
        let display = vec![1.0, 2.0, 3.0, 10_000.0, 10_000.0, 10_000.0];

        let instances = build_instances(&buffers, &display);

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0], PointInstance::new([1.0, 2.0, 3.0], 0.9, [1.0, 0.0, 0.0]));
        assert_eq!(instances[1].position, [10_000.0; 3]);
        assert_eq!(instances[1].color, [0.0, 1.0, 0.0]);
    }
}
