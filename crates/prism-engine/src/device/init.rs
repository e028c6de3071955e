use super::bridge::WaitPolicy;

/// What [`crate::render::Renderer`] asks of the adapter, device and surface.
#[derive(Debug, Clone)]
pub struct DeviceSettings {
    /// Adapter preference passed to the adapter request.
    pub power_preference: wgpu::PowerPreference,

    /// Restrict adapter selection to the software fallback.
    pub force_fallback_adapter: bool,

    /// Pick an sRGB swapchain format if the surface offers one.
    pub prefer_srgb: bool,

    /// Requested present mode.
    ///
    /// FIFO is the only mode every surface supports; others fall back to it.
    pub present_mode: wgpu::PresentMode,

    /// Compositing alpha. `None` leaves it to the platform (`Auto`); an unsupported
    /// request degrades to the first mode the surface lists.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Features the device must have; adapters lacking any of them are rejected.
    pub required_features: wgpu::Features,

    /// Frames the presentation engine may queue ahead. Backends may ignore it.
    pub desired_maximum_frame_latency: u32,

    /// Bounds for the blocking adapter/device requests.
    pub wait: WaitPolicy,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            desired_maximum_frame_latency: 2,
            wait: WaitPolicy::default(),
        }
    }
}
