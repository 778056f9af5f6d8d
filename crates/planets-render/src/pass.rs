//! Offscreen frame targets and render pass configuration.

use crate::{BufferAllocator, DepthBuffer, ReadbackError, RenderContext, read_buffer_blocking};

/// Near-black clear colour for space scenes.
pub const SPACE_BLACK: wgpu::Color = wgpu::Color {
    r: 0.005,
    g: 0.005,
    b: 0.012,
    a: 1.0,
};

/// Builder for the colour + depth pass drawn into an [`OffscreenTarget`].
#[derive(Debug)]
pub struct RenderPassBuilder {
    clear_color: wgpu::Color,
    clear_depth: bool,
    label: Option<&'static str>,
}

impl Default for RenderPassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPassBuilder {
    pub fn new() -> Self {
        Self {
            clear_color: SPACE_BLACK,
            clear_depth: true,
            label: None,
        }
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Keep the existing depth contents instead of clearing to the far plane.
    pub fn load_depth(mut self) -> Self {
        self.clear_depth = false;
        self
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Begin a render pass that writes colour and reverse-Z depth to `target`.
    pub fn begin<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        target: &'encoder OffscreenTarget,
    ) -> wgpu::RenderPass<'encoder> {
        let color_attachment = wgpu::RenderPassColorAttachment {
            view: &target.color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(self.clear_color),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        };

        let depth_load = if self.clear_depth {
            wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE)
        } else {
            wgpu::LoadOp::Load
        };

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &target.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// Colour and depth textures a frame is rendered into.
pub struct OffscreenTarget {
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: DepthBuffer,
    width: u32,
    height: u32,
}

impl OffscreenTarget {
    pub fn new(ctx: &RenderContext, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let color = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen-color"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: ctx.color_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            color,
            color_view,
            depth: DepthBuffer::new(&ctx.device, width, height),
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Copy the colour texture back to the host as tightly packed RGBA8 rows.
    ///
    /// Blocks until all previously submitted work has finished.
    pub fn read_rgba8(&self, ctx: &RenderContext) -> Result<Vec<u8>, ReadbackError> {
        let unpadded = self.width * 4;
        let padded = padded_bytes_per_row(unpadded);
        let size = u64::from(padded) * u64::from(self.height);

        let staging = BufferAllocator::new(&ctx.device).create_readback_buffer("frame-readback", size);
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-readback"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        ctx.queue.submit(Some(encoder.finish()));

        let mapped = read_buffer_blocking(&ctx.device, &staging, size)?;
        Ok(strip_row_padding(&mapped, unpadded, padded, self.height))
    }
}

/// Round a row up to `COPY_BYTES_PER_ROW_ALIGNMENT`.
fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

fn strip_row_padding(data: &[u8], unpadded: u32, padded: u32, rows: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((unpadded * rows) as usize);
    for row in data.chunks_exact(padded as usize).take(rows as usize) {
        pixels.extend_from_slice(&row[..unpadded as usize]);
    }
    pixels
}
