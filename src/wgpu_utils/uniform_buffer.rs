// src/wgpu_utils/uniform_buffer.rs
use wgpu::util::DeviceExt;

/// A uniform buffer holding one `T`
///
/// Keeps a CPU copy of the last upload so unchanged content (a camera that
/// did not move, a material nobody touched) costs no queue write.
pub struct UniformBuffer<T> {
    buffer: wgpu::Buffer,
    uploaded: T,
}

impl<T: bytemuck::Pod> UniformBuffer<T> {
    pub fn new(device: &wgpu::Device, label: &str, content: T) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&content),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            buffer,
            uploaded: content,
        }
    }

    /// A buffer filled with zeroes, for content written before first use
    pub fn zeroed(device: &wgpu::Device, label: &str) -> Self {
        Self::new(device, label, T::zeroed())
    }

    /// Queues a write of `content`; returns false when it matches the last
    /// upload and nothing was written
    pub fn write(&mut self, queue: &wgpu::Queue, content: T) -> bool {
        if bytemuck::bytes_of(&self.uploaded) == bytemuck::bytes_of(&content) {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&content));
        self.uploaded = content;
        true
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::RenderEngine;

    #[test]
    fn unchanged_content_is_not_uploaded_again() {
        let Ok(engine) = pollster::block_on(RenderEngine::new_headless()) else {
            return;
        };

        let mut ubo = UniformBuffer::new(engine.device(), "Test", [1.0f32, 2.0, 3.0, 4.0]);
        assert!(!ubo.write(engine.queue(), [1.0, 2.0, 3.0, 4.0]));
        assert!(ubo.write(engine.queue(), [1.0, 2.0, 3.0, 5.0]));
        assert!(!ubo.write(engine.queue(), [1.0, 2.0, 3.0, 5.0]));

        let mut zeroed = UniformBuffer::<[u32; 4]>::zeroed(engine.device(), "Zeroed");
        assert!(!zeroed.write(engine.queue(), [0; 4]));
    }
}
