use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};

use super::VisualSettings;

/// Weight of the newest sample in the smoothed frame time.
const FRAMETIME_SMOOTHING: f64 = 0.1;

/// Raw status before the first capability probe.
const UNPROBED: u8 = u8::MAX;

/// Device tier as reported to the user.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeviceStatus {
    Full,
    Limited,
    Unsupported,
}

impl DeviceStatus {
    /// Fixed user-facing message for this tier.
    pub fn message(self) -> &'static str {
        match self {
            Self::Full => "All features are available on this device.",
            Self::Limited => {
                "This device does not support every feature; some visual effects are disabled."
            }
            Self::Unsupported => "This device cannot run the visualization.",
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            Self::Full => 0,
            Self::Limited => 1,
            Self::Unsupported => 2,
        }
    }

    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Full),
            1 => Some(Self::Limited),
            2 => Some(Self::Unsupported),
            _ => None,
        }
    }
}

/// Observable state shared by the render thread and the controls layer.
///
/// Every field is an independent atomic, so readers on other threads always
/// see a whole value, though not necessarily a consistent snapshot across
/// fields. Status, upscaling and frame time are written only by the engine.
#[derive(Debug)]
pub struct FrameState {
    requested_occupancy: AtomicU32,
    // width << 32 | height
    resolution: AtomicU64,
    resolution_scale: AtomicU32,
    status: AtomicU8,
    frametime_ms: AtomicU64,
    frametime_seeded: AtomicBool,
    upscaling_enabled: AtomicBool,
    blur_enabled: AtomicBool,
}

impl FrameState {
    pub fn new(settings: &VisualSettings) -> Self {
        let (width, height) = settings.resolution;
        Self {
            requested_occupancy: AtomicU32::new(settings.point_count),
            resolution: AtomicU64::new(pack(width, height)),
            resolution_scale: AtomicU32::new(settings.scale.to_bits()),
            status: AtomicU8::new(UNPROBED),
            frametime_ms: AtomicU64::new(0.0f64.to_bits()),
            frametime_seeded: AtomicBool::new(false),
            upscaling_enabled: AtomicBool::new(false),
            // Held until the probe confirms the device can blur.
            blur_enabled: AtomicBool::new(settings.blur),
        }
    }

    pub fn requested_occupancy(&self) -> u32 {
        self.requested_occupancy.load(Ordering::Relaxed)
    }

    pub fn set_requested_occupancy(&self, count: u32) {
        self.requested_occupancy.store(count, Ordering::Relaxed);
    }

    /// Base render resolution as `(width, height)`.
    pub fn resolution(&self) -> (u32, u32) {
        unpack(self.resolution.load(Ordering::Relaxed))
    }

    /// Takes effect on the next initialization.
    pub fn set_resolution(&self, width: u32, height: u32) {
        self.resolution.store(pack(width, height), Ordering::Relaxed);
    }

    pub fn resolution_scale(&self) -> f32 {
        f32::from_bits(self.resolution_scale.load(Ordering::Relaxed))
    }

    /// Takes effect on the next initialization.
    pub fn set_resolution_scale(&self, scale: f32) {
        self.resolution_scale
            .store(scale.to_bits(), Ordering::Relaxed);
    }

    /// `None` until a capability probe has run.
    pub fn status(&self) -> Option<DeviceStatus> {
        DeviceStatus::from_raw(self.status.load(Ordering::Acquire))
    }

    pub(crate) fn set_status(&self, status: DeviceStatus) {
        self.status.store(status.to_raw(), Ordering::Release);
        if status != DeviceStatus::Full {
            self.blur_enabled.store(false, Ordering::Relaxed);
        }
    }

    pub fn upscaling_enabled(&self) -> bool {
        self.upscaling_enabled.load(Ordering::Relaxed)
    }

    pub(crate) fn set_upscaling_enabled(&self, enabled: bool) {
        self.upscaling_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn blur_enabled(&self) -> bool {
        self.blur_enabled.load(Ordering::Relaxed)
    }

    /// Requests the blur effect on or off.
    ///
    /// Enabling is refused unless the device has been probed as `Full`. Returns
    /// whether the flag now matches the request.
    pub fn set_blur_enabled(&self, enabled: bool) -> bool {
        if enabled && self.status() != Some(DeviceStatus::Full) {
            return false;
        }
        self.blur_enabled.store(enabled, Ordering::Relaxed);
        true
    }

    /// Smoothed frame time in milliseconds.
    pub fn frametime_ms(&self) -> f64 {
        f64::from_bits(self.frametime_ms.load(Ordering::Relaxed))
    }

    /// Folds one frame duration into the smoothed frame time.
    ///
    /// The first sample seeds the average. Only the render thread writes this
    /// field, so the read-modify-write needs no compare-exchange.
    pub fn record_frame_time(&self, sample_ms: f64) {
        let next = if self.frametime_seeded.swap(true, Ordering::Relaxed) {
            let previous = self.frametime_ms();
            previous + FRAMETIME_SMOOTHING * (sample_ms - previous)
        } else {
            sample_ms
        };
        self.frametime_ms.store(next.to_bits(), Ordering::Relaxed);
    }

    pub fn frametime_label(&self) -> String {
        format!("{:.1} ms", self.frametime_ms())
    }
}

impl Default for FrameState {
    fn default() -> Self {
        Self::new(&VisualSettings::default())
    }
}

fn pack(width: u32, height: u32) -> u64 {
    (u64::from(width) << 32) | u64::from(height)
}

fn unpack(packed: u64) -> (u32, u32) {
    ((packed >> 32) as u32, packed as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_visual_settings() {
        let state = FrameState::default();
        assert_eq!(state.requested_occupancy(), 100);
        assert_eq!(state.resolution(), (1300, 650));
        assert_eq!(state.resolution_scale(), 2.0);
        assert_eq!(state.status(), None);
        assert!(!state.upscaling_enabled());
        assert!(!state.blur_enabled());
    }

    #[test]
    fn resolution_round_trips_extremes() {
        let state = FrameState::default();
        state.set_resolution(u32::MAX, 1);
        assert_eq!(state.resolution(), (u32::MAX, 1));
    }

    #[test]
    fn first_frame_time_seeds_the_average() {
        let state = FrameState::default();
        state.record_frame_time(16.0);
        assert_eq!(state.frametime_ms(), 16.0);
        state.record_frame_time(26.0);
        assert!((state.frametime_ms() - 17.0).abs() < 1e-9);
        assert_eq!(state.frametime_label(), "17.0 ms");
    }

    #[test]
    fn zero_millisecond_sample_still_seeds() {
        let state = FrameState::default();
        state.record_frame_time(0.0);
        state.record_frame_time(10.0);
        assert!((state.frametime_ms() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn blur_is_refused_before_the_probe() {
        let state = FrameState::new(&VisualSettings {
            blur: true,
            ..VisualSettings::default()
        });
        assert!(!state.set_blur_enabled(true));
        // The requested setting survives until the probe decides.
        assert!(state.blur_enabled());

        state.set_status(DeviceStatus::Full);
        assert_eq!(state.status(), Some(DeviceStatus::Full));
        assert!(state.blur_enabled());
    }

    #[test]
    fn blur_requires_full_status() {
        let state = FrameState::default();
        state.set_status(DeviceStatus::Full);
        assert!(state.set_blur_enabled(true));
        assert!(state.blur_enabled());

        state.set_status(DeviceStatus::Limited);
        assert!(!state.blur_enabled());
        assert!(!state.set_blur_enabled(true));
        assert!(!state.blur_enabled());
        // Turning it off is always accepted.
        assert!(state.set_blur_enabled(false));
    }

    #[test]
    fn status_messages_are_distinct() {
        let messages = [
            DeviceStatus::Full.message(),
            DeviceStatus::Limited.message(),
            DeviceStatus::Unsupported.message(),
        ];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
    }
}
