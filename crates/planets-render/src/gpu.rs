//! GPU device initialization.
//!
//! Provides [`RenderContext`] which owns the wgpu instance, adapter, device and
//! queue. There is no surface: frames are rendered into offscreen targets.

/// Error type for render context initialization failures.
#[derive(Debug, thiserror::Error)]
pub enum RenderContextError {
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// Failed to request GPU device.
    #[error("failed to request GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// Owns all GPU state: instance, adapter, device, and queue.
pub struct RenderContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Colour format used by offscreen targets and render pipelines.
    pub color_format: wgpu::TextureFormat,
}

impl RenderContext {
    /// Colour format of every offscreen frame.
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Initialize a headless GPU context asynchronously.
    pub async fn new_headless() -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(_) => return Err(RenderContextError::NoAdapter),
        };

        let info = adapter.get_info();
        log::info!(
            "Selected GPU: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let required_features = select_optional_features(adapter.features());
        if !required_features.contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER) {
            log::warn!("Adapter lacks clamp-to-border sampling; crater decals clamp to edge");
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("planets-device"),
                required_features,
                required_limits: required_limits(&adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            color_format: Self::COLOR_FORMAT,
        })
    }

    /// Whether samplers may use [`wgpu::AddressMode::ClampToBorder`].
    pub fn supports_clamp_to_border(&self) -> bool {
        self.device
            .features()
            .contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER)
    }
}

/// Initialize the GPU synchronously using `pollster`.
pub fn init_render_context_blocking() -> Result<RenderContext, RenderContextError> {
    pollster::block_on(RenderContext::new_headless())
}

/// Optional features requested when the adapter offers them.
fn select_optional_features(available: wgpu::Features) -> wgpu::Features {
    available & wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER
}

/// Default limits, widened to the adapter's storage and buffer sizes so that
/// fine sphere meshes fit in a single storage binding.
fn required_limits(adapter: &wgpu::Limits) -> wgpu::Limits {
    wgpu::Limits {
        max_storage_buffer_binding_size: adapter.max_storage_buffer_binding_size,
        max_buffer_size: adapter.max_buffer_size,
        ..wgpu::Limits::default()
    }
}
