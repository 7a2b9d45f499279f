// src/wgpu_utils/uniform_buffer.rs - Typed uniform, storage and vertex buffers
use std::marker::PhantomData;

use crate::error::{LifeError, Result};

fn type_label<Content>() -> &'static str {
    let type_name = std::any::type_name::<Content>();
    let pos = type_name.rfind(':').unwrap_or(0);
    if pos > 0 {
        &type_name[(pos + 1)..]
    } else {
        type_name
    }
}

/// Uniform buffer holding a single `Content` value
pub struct UniformBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    previous_content: Vec<u8>,
}

impl<Content: bytemuck::Pod> UniformBuffer<Content> {
    /// Create buffer with initial data
    pub fn new_with_data(device: &wgpu::Device, initial_content: &Content) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("UniformBuffer: {}", type_label::<Content>())),
            size: std::mem::size_of::<Content>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: true,
        });

        buffer
            .slice(..)
            .get_mapped_range_mut()
            .copy_from_slice(bytemuck::bytes_of(initial_content));
        buffer.unmap();

        UniformBuffer {
            buffer,
            content_type: PhantomData,
            previous_content: bytemuck::bytes_of(initial_content).to_vec(),
        }
    }

    /// Update buffer content, skipping the write when nothing changed
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: Content) {
        let new_content = bytemuck::bytes_of(&content);
        if self.previous_content == new_content {
            return;
        }
        queue.write_buffer(&self.buffer, 0, new_content);
        self.previous_content = new_content.to_vec();
    }

    /// Get binding resource
    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }
}

/// Fixed-capacity buffer of `Content` elements
pub struct ArrayBuffer<Content> {
    buffer: wgpu::Buffer,
    content_type: PhantomData<Content>,
    capacity: usize,
    current_size: usize,
}

impl<Content: bytemuck::Pod> ArrayBuffer<Content> {
    fn byte_len(elements: usize) -> u64 {
        (elements * std::mem::size_of::<Content>()) as u64
    }

    /// Create an empty array buffer with the given usage
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        capacity: usize,
        usage: wgpu::BufferUsages,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{}<{}>", label, type_label::<Content>())),
            size: Self::byte_len(capacity),
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        ArrayBuffer {
            buffer,
            content_type: PhantomData,
            capacity,
            current_size: 0,
        }
    }

    /// Create new staging buffer for reading back GPU data
    pub fn new_staging(device: &wgpu::Device, capacity: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("StagingBuffer<{}>", type_label::<Content>())),
            size: Self::byte_len(capacity),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        ArrayBuffer {
            buffer,
            content_type: PhantomData,
            capacity,
            current_size: capacity,
        }
    }

    /// Overwrite the start of the buffer with `data`
    pub fn update_data(&mut self, queue: &wgpu::Queue, data: &[Content]) -> Result<()> {
        if data.len() > self.capacity {
            return Err(LifeError::SizeMismatch {
                expected: self.capacity,
                actual: data.len(),
            });
        }
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(data));
        }
        self.current_size = data.len();
        Ok(())
    }

    /// Copy `source` into this staging buffer and block until it can be read.
    ///
    /// The wait on the map callback doubles as the barrier that makes every
    /// previously submitted write to `source` visible.
    pub fn read_back(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &wgpu::Buffer,
    ) -> Result<Vec<Content>> {
        let size = Self::byte_len(self.capacity);
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });
        encoder.copy_buffer_to_buffer(source, 0, &self.buffer, 0, size);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = self.buffer.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| LifeError::DispatchFailure(format!("device poll failed: {e}")))?;

        match futures::executor::block_on(rx) {
            Ok(Ok(())) => {
                let data = {
                    let mapped = slice.get_mapped_range();
                    bytemuck::cast_slice::<u8, Content>(&mapped).to_vec()
                };
                self.buffer.unmap();
                Ok(data)
            }
            Ok(Err(e)) => Err(LifeError::DispatchFailure(format!("buffer map failed: {e}"))),
            Err(_) => Err(LifeError::DispatchFailure(
                "buffer map callback dropped".to_string(),
            )),
        }
    }

    /// Get binding resource
    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }

    /// Get the underlying buffer
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Get current number of elements
    pub fn len(&self) -> usize {
        self.current_size
    }

    pub fn is_empty(&self) -> bool {
        self.current_size == 0
    }

    /// Get capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
