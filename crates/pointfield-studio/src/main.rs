use std::sync::Arc;

use pointfield_engine::device::GpuInit;
use pointfield_engine::logging::{init_logging, LoggingConfig};
use pointfield_engine::state::{FrameState, VisualSettings};
use pointfield_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

mod app;

use app::StudioApp;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let settings = VisualSettings::default();
    let state = Arc::new(FrameState::new(&settings));

    log::info!(
        "starting with {} points at {}x{} (scale {})",
        settings.point_count,
        settings.resolution.0,
        settings.resolution.1,
        settings.scale
    );
    log::info!("controls: Up/Down change point count, B toggles blur, Esc quits");

    let config = RuntimeConfig {
        title: "Pointfield Studio".to_string(),
        initial_size: LogicalSize::new(
            f64::from(settings.resolution.0),
            f64::from(settings.resolution.1),
        ),
    };

    Runtime::run(config, GpuInit::default(), StudioApp::new(state))
}
