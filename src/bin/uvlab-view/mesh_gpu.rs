//! GPU mesh buffer management for the viewer.

use wgpu::util::DeviceExt;

use uvlab::viewer::{Fit, Mat4, ShadedVertex};

/// Vertex buffer layout matching [`ShadedVertex`].
pub fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<ShadedVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    }
}

/// Flat-shaded triangles uploaded to the GPU.
pub struct GpuMesh {
    /// Three vertices per triangle.
    pub vertex_buffer: wgpu::Buffer,
    /// Number of vertices to draw.
    pub num_vertices: u32,
    /// Transform that centers the mesh and scales it into the unit sphere.
    pub fit: Mat4,
}

impl GpuMesh {
    /// Upload vertices. Returns `None` when there is nothing to draw.
    pub fn new(device: &wgpu::Device, vertices: &[ShadedVertex], fit: &Fit) -> Option<Self> {
        if vertices.is_empty() {
            return None;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Some(Self {
            vertex_buffer,
            num_vertices: vertices.len() as u32,
            fit: fit.matrix(),
        })
    }
}
