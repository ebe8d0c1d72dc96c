use std::sync::Arc;

use pointfield_engine::core::{App, AppControl, FrameCtx};
use pointfield_engine::device::Gpu;
use pointfield_engine::error::{FrameError, InitError, Recovery};
use pointfield_engine::pipeline::{InitConfig, PipelineInitializer};
use pointfield_engine::render::FrameRenderer;
use pointfield_engine::state::FrameState;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

const MAX_POINTS: u32 = 1 << 20;

/// Frames between frame-time reports.
const REPORT_INTERVAL: u64 = 300;

enum Stage {
    /// Waiting for the first frame, when the surface format is known.
    Pending,
    Ready(FrameRenderer),
    /// Initialization failed with a recoverable error; only the clear colour
    /// is presented.
    Degraded,
    Terminated,
}

/// Drives initialization and per-frame rendering from the shared state.
pub struct StudioApp {
    state: Arc<FrameState>,
    stage: Stage,
}

impl StudioApp {
    pub fn new(state: Arc<FrameState>) -> Self {
        Self {
            state,
            stage: Stage::Pending,
        }
    }

    fn initialize(&self, gpu: &Gpu<'_>) -> Stage {
        let config = InitConfig {
            output_format: gpu.surface_format(),
            ..InitConfig::default()
        };

        let initializer = PipelineInitializer::new(Arc::clone(&self.state), config);
        match initializer.initialize(gpu.backend()) {
            Ok(resources) => {
                let renderer = FrameRenderer::new(gpu, resources, Arc::clone(&self.state));
                let capabilities = renderer.resources().capabilities();
                log::info!("{}", capabilities.status().message());
                log::debug!("device capabilities: {capabilities:?}");
                Stage::Ready(renderer)
            }
            Err(err) => {
                self.notify(&err);
                match err.recovery() {
                    Recovery::Terminate => Stage::Terminated,
                    Recovery::Degrade => Stage::Degraded,
                }
            }
        }
    }

    /// Blocking notification for a failed initialization.
    fn notify(&self, err: &InitError) {
        log::error!("{} ({err})", recovery_message(err.recovery()));
    }

    fn on_key(&mut self, key: KeyCode) -> AppControl {
        match key {
            KeyCode::Escape => return AppControl::Exit,
            KeyCode::ArrowUp | KeyCode::ArrowDown => {
                let count = next_occupancy(
                    self.state.requested_occupancy(),
                    key == KeyCode::ArrowUp,
                );
                self.state.set_requested_occupancy(count);
                log::info!("point count: {count}");
            }
            KeyCode::KeyB => {
                let wanted = !self.state.blur_enabled();
                if self.state.set_blur_enabled(wanted) {
                    log::info!("blur {}", if wanted { "on" } else { "off" });
                } else {
                    log::warn!("blur is not available on this device");
                }
            }
            _ => {}
        }
        AppControl::Continue
    }
}

impl App for StudioApp {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                match event.physical_key {
                    PhysicalKey::Code(code) => self.on_key(code),
                    PhysicalKey::Unidentified(_) => AppControl::Continue,
                }
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if matches!(self.stage, Stage::Pending) {
            self.stage = self.initialize(ctx.gpu);
        }

        // The first tick spans startup, not a frame.
        if ctx.time.frame_index > 0 {
            self.state.record_frame_time(ctx.time.elapsed_ms());
        }

        let result = match &mut self.stage {
            Stage::Ready(renderer) => renderer.draw(ctx),
            Stage::Degraded => ctx.clear(BACKGROUND).map_err(FrameError::Surface),
            Stage::Pending | Stage::Terminated => return AppControl::Exit,
        };

        match result {
            Ok(()) => {}
            Err(err) if err.is_fatal() => {
                log::error!("rendering stopped: {err}");
                return AppControl::Exit;
            }
            Err(err) => log::warn!("frame dropped: {err}"),
        }

        if ctx.time.frame_index % REPORT_INTERVAL == 0 && ctx.time.frame_index > 0 {
            log::info!(
                "{} points, {}, upscaling {}",
                self.state.requested_occupancy(),
                self.state.frametime_label(),
                if self.state.upscaling_enabled() { "on" } else { "off" }
            );
        }

        AppControl::Continue
    }

    fn on_exit(&mut self) {
        log::info!("exiting; last frame time {}", self.state.frametime_label());
    }
}

/// Fixed user-facing message for each recovery path.
fn recovery_message(recovery: Recovery) -> &'static str {
    match recovery {
        Recovery::Terminate => "The visualization cannot start; the application will close.",
        Recovery::Degrade => "The visualization could not be prepared; continuing without it.",
    }
}

/// Doubles or halves the point count within `1..=MAX_POINTS`.
fn next_occupancy(current: u32, up: bool) -> u32 {
    let next = if up {
        current.saturating_mul(2)
    } else {
        current / 2
    };
    next.clamp(1, MAX_POINTS)
}
