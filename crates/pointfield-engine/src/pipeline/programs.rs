//! Names of the programs the renderer's pipelines are built from.

use crate::device::CapabilityReport;

pub const POINTS_VERTEX: &str = "points_vertex";
pub const POINTS_FRAGMENT: &str = "points_fragment";
pub const UPDATE_POINTS: &str = "update_points";
pub const FULLSCREEN_VERTEX: &str = "fullscreen_vertex";
pub const COMPOSITE_FRAGMENT: &str = "composite_fragment";
pub const BLUR_IMAGE: &str = "blur_image";
pub const UPSCALE_FRAGMENT: &str = "upscale_fragment";

/// Programs a device with `capabilities` needs compiled.
///
/// Optional stages are left out entirely when the device cannot run them, so
/// their sources are never compiled.
pub fn required(capabilities: &CapabilityReport) -> Vec<&'static str> {
    let mut names = vec![
        POINTS_VERTEX,
        POINTS_FRAGMENT,
        UPDATE_POINTS,
        FULLSCREEN_VERTEX,
        COMPOSITE_FRAGMENT,
    ];
    if capabilities.supports_advanced_filter {
        names.push(BLUR_IMAGE);
    }
    if capabilities.supports_upscaling {
        names.push(UPSCALE_FRAGMENT);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_programs_follow_capabilities() {
        let bare = CapabilityReport {
            baseline: true,
            supports_advanced_filter: false,
            supports_upscaling: false,
        };
        let names = required(&bare);
        assert_eq!(names.len(), 5);
        assert!(!names.contains(&BLUR_IMAGE));

        let full = CapabilityReport {
            supports_advanced_filter: true,
            supports_upscaling: true,
            ..bare
        };
        let names = required(&full);
        assert!(names.contains(&BLUR_IMAGE));
        assert!(names.contains(&UPSCALE_FRAGMENT));
    }
}
