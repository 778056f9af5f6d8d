//! Headless wgpu plumbing: device setup, shader loading, buffer readback,
//! offscreen render targets, depth buffers, and the fly-through camera.

pub mod buffer;
pub mod camera;
pub mod depth;
pub mod gpu;
pub mod pass;
pub mod shader;

pub use buffer::{BufferAllocator, ReadbackError, read_buffer_blocking};
pub use camera::{Camera, Projection};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, init_render_context_blocking};
pub use pass::{OffscreenTarget, RenderPassBuilder, SPACE_BLACK};
pub use shader::{ShaderError, ShaderLibrary};
