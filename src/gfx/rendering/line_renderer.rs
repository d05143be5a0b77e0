//! Connection lines for comparison mode, alpha blended over the points.

use bytemuck::{Pod, Zeroable};
use wgpu::RenderPass;

use crate::gfx::overlay::LineSegment;
use crate::wgpu_utils::uniform_buffer::VertexArrayBuffer;

pub const LINE_PIPELINE: &str = "ConnectionLines";

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

const LINE_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

impl LineVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &LINE_ATTRIBUTES,
        }
    }
}

/// Two vertices per segment, for a `LineList` topology.
pub fn segment_vertices(segments: &[LineSegment]) -> Vec<LineVertex> {
    segments
        .iter()
        .flat_map(|segment| {
            [
                LineVertex {
                    position: segment.start,
                    color: segment.color,
                },
                LineVertex {
                    position: segment.end,
                    color: segment.color,
                },
            ]
        })
        .collect()
}

pub struct LineRenderer {
    vertices: VertexArrayBuffer<LineVertex>,
}

impl LineRenderer {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            vertices: VertexArrayBuffer::new(device, 16),
        }
    }

    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, segments: &[LineSegment]) {
        self.vertices.replace(device, queue, &segment_vertices(segments));
    }

    pub fn render<'a>(&'a self, render_pass: &mut RenderPass<'a>, pipeline: &'a wgpu::RenderPipeline) {
        if self.vertices.is_empty() {
            return;
        }
        render_pass.set_pipeline(pipeline);
        render_pass.set_vertex_buffer(0, self.vertices.slice());
        render_pass.draw(0..self.vertices.len() as u32, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_segment_becomes_two_vertices() {
        let segments = [
            LineSegment {
                start: [0.0, 0.0, 0.0],
                end: [1.0, 1.0, 1.0],
                color: [1.0, 1.0, 1.0, 0.7],
            },
            LineSegment {
                start: [2.0, 0.0, 0.0],
                end: [3.0, 0.0, 0.0],
                color: [1.0, 1.0, 1.0, 0.3],
            },
        ];

        let vertices = segment_vertices(&segments);
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[1].position, [1.0, 1.0, 1.0]);
        assert_eq!(vertices[3].color[3], 0.3);
    }
}
