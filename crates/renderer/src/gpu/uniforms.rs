use bytemuck::{Pod, Zeroable};

/// Per-frame values shared by both passes, bound at `@group(0) @binding(0)`.
///
/// Mirrors `struct Uniforms` in the shader prelude: four tightly packed `f32`s.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub(crate) struct BlobUniforms {
    pub time: f32,
    pub drag_progress: f32,
    pub sway_progress: f32,
    pub aspect_ratio: f32,
}

impl BlobUniforms {
    pub fn new(time: f32, drag_progress: f32, sway_progress: f32, aspect_ratio: f32) -> Self {
        Self {
            time,
            drag_progress,
            sway_progress,
            aspect_ratio,
        }
    }

    pub fn byte_size() -> wgpu::BufferAddress {
        std::mem::size_of::<Self>() as wgpu::BufferAddress
    }
}

pub(crate) fn write_uniforms(queue: &wgpu::Queue, buffer: &wgpu::Buffer, uniforms: &BlobUniforms) {
    queue.write_buffer(buffer, 0, bytemuck::bytes_of(uniforms));
}
