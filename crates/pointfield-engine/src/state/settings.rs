/// Values handed in by the controls layer at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualSettings {
    /// Number of points to simulate and draw.
    pub point_count: u32,

    /// Output resolution multiplier, used as the upscaling factor.
    pub scale: f32,

    /// Base render resolution in physical pixels.
    pub resolution: (u32, u32),

    /// Requested blur; honoured only on fully capable devices.
    pub blur: bool,
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            point_count: 100,
            scale: 2.0,
            resolution: (1300, 650),
            blur: false,
        }
    }
}
