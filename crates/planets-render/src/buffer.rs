//! Buffer creation helpers and the blocking readback path.

use std::sync::mpsc;

use wgpu::util::DeviceExt;

/// Failure while reading a GPU buffer back to the host.
#[derive(Debug, thiserror::Error)]
pub enum ReadbackError {
    #[error("failed to map buffer for reading: {0}")]
    Map(#[from] wgpu::BufferAsyncError),

    #[error("device poll failed while waiting for buffer map: {0}")]
    Poll(#[from] wgpu::PollError),

    #[error("buffer map callback was dropped before completion")]
    CallbackDropped,

    #[error("readback of {requested} bytes exceeds buffer size {available}")]
    OutOfRange { requested: u64, available: u64 },
}

/// Creates GPU buffers with consistent labels and usages.
pub struct BufferAllocator<'a> {
    device: &'a wgpu::Device,
}

impl<'a> BufferAllocator<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self { device }
    }

    /// Vertex buffer that can be fully overwritten with `Queue::write_buffer`.
    pub fn create_vertex_buffer(&self, label: &str, data: &[u8]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: data,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            })
    }

    /// Uninitialised storage buffer readable as a copy source.
    pub fn create_storage_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    /// Read-only storage buffer initialised from `data`.
    pub fn create_storage_buffer_init(&self, label: &str, data: &[u8]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: data,
                usage: wgpu::BufferUsages::STORAGE,
            })
    }

    pub fn create_uniform_buffer(&self, label: &str, data: &[u8]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: data,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
    }

    /// Host-mappable staging buffer that GPU copies land in.
    pub fn create_readback_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}

/// Map the first `size` bytes of `staging`, block until the GPU has finished
/// all submitted work, copy the bytes out and unmap.
///
/// `staging` must have been created with `MAP_READ` and every copy into it
/// must already be submitted.
pub fn read_buffer_blocking(
    device: &wgpu::Device,
    staging: &wgpu::Buffer,
    size: u64,
) -> Result<Vec<u8>, ReadbackError> {
    if size > staging.size() {
        return Err(ReadbackError::OutOfRange {
            requested: size,
            available: staging.size(),
        });
    }

    let slice = staging.slice(..size);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    })?;

    rx.recv().map_err(|_| ReadbackError::CallbackDropped)??;

    let bytes = slice.get_mapped_range().to_vec();
    staging.unmap();
    Ok(bytes)
}
