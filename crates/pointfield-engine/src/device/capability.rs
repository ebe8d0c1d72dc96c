use crate::state::DeviceStatus;

use super::GpuBackend;

/// Format of the intermediate texture the blur kernel reads and writes in place.
pub const FILTER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Format of the upscaler output.
///
/// sRGB storage keeps the upscale filter working on perceptually encoded values.
pub const UPSCALE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// Feature tiers supported by a device.
///
/// Computed once at startup and immutable afterwards.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CapabilityReport {
    /// Compute work is available. Without it no degraded path exists.
    pub baseline: bool,
    /// Read-write storage textures, required by the blur kernel.
    pub supports_advanced_filter: bool,
    /// Filterable sRGB render targets, required by the upscaler.
    pub supports_upscaling: bool,
}

impl CapabilityReport {
    pub fn status(&self) -> DeviceStatus {
        if !self.baseline {
            DeviceStatus::Unsupported
        } else if !self.supports_advanced_filter {
            DeviceStatus::Limited
        } else {
            DeviceStatus::Full
        }
    }
}

/// Classifies the feature tiers of `backend`.
///
/// Never fails: a missing tier is reported, not raised.
pub fn probe<B: GpuBackend>(backend: &B) -> CapabilityReport {
    let baseline = backend
        .downlevel_flags()
        .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS);

    let supports_advanced_filter = backend
        .features()
        .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES)
        && backend
            .format_features(FILTER_FORMAT)
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::STORAGE_READ_WRITE);

    let upscale = backend.format_features(UPSCALE_FORMAT);
    let supports_upscaling = upscale
        .flags
        .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
        && upscale
            .allowed_usages
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING);

    let report = CapabilityReport {
        baseline,
        supports_advanced_filter,
        supports_upscaling,
    };
    log::debug!("capability probe: {report:?}");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::FakeBackend;

    #[test]
    fn full_device_reports_every_tier() {
        let report = probe(&FakeBackend::full());
        assert!(report.baseline);
        assert!(report.supports_advanced_filter);
        assert!(report.supports_upscaling);
        assert_eq!(report.status(), DeviceStatus::Full);
    }

    #[test]
    fn missing_adapter_specific_feature_limits_device() {
        let report = probe(&FakeBackend::limited());
        assert!(report.baseline);
        assert!(!report.supports_advanced_filter);
        assert_eq!(report.status(), DeviceStatus::Limited);
    }

    #[test]
    fn read_write_flag_is_required_even_with_feature() {
        let backend = FakeBackend::full().with_format_flags(
            FILTER_FORMAT,
            wgpu::TextureFormatFeatureFlags::FILTERABLE,
        );
        assert!(!probe(&backend).supports_advanced_filter);
    }

    #[test]
    fn no_compute_is_unsupported() {
        let report = probe(&FakeBackend::unsupported());
        assert!(!report.baseline);
        assert_eq!(report.status(), DeviceStatus::Unsupported);
    }

    #[test]
    fn unfilterable_output_disables_upscaling() {
        let report = probe(&FakeBackend::full().without_upscaling());
        assert!(!report.supports_upscaling);
        assert_eq!(report.status(), DeviceStatus::Full);
    }
}
