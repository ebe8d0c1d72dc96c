/// Surface and device preferences for [`super::Gpu::new`].
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick an sRGB surface format when the surface offers one.
    pub prefer_srgb: bool,

    pub present_mode: wgpu::PresentMode,

    /// Replaced by a supported mode when the surface does not offer it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub power_preference: wgpu::PowerPreference,

    /// Device creation fails without these.
    pub required_features: wgpu::Features,

    /// Enabled only where the adapter offers them.
    ///
    /// The capability probe reads back what the device actually got, so a
    /// feature listed here lowers the device tier instead of failing startup.
    pub optional_features: wgpu::Features,

    pub required_limits: wgpu::Limits,

    /// Hint only; support depends on platform and backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_features: wgpu::Features::empty(),
            optional_features: wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
