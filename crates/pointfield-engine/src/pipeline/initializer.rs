use std::fmt;
use std::sync::Arc;

use crate::buffer::AdaptiveBuffer;
use crate::device::{self, CapabilityReport, GpuBackend, FILTER_FORMAT, UPSCALE_FORMAT};
use crate::error::InitError;
use crate::render::Point;
use crate::resources::{
    factory, ComputePipelineSpec, ProgramCatalog, ProgramLibrary, RenderPipelineSpec, TextureSpec,
};
use crate::state::{DeviceStatus, FrameState};

use super::programs;
use super::{OffscreenPass, PipelineSet, RenderResources, RenderTargets, Upscaler};

/// Initialization parameters that do not come from the controls layer.
#[derive(Debug, Clone)]
pub struct InitConfig {
    /// The point buffer never shrinks below this many points.
    pub point_floor: u64,

    /// Format of the offscreen render target.
    pub render_format: wgpu::TextureFormat,

    /// Format of the presentation surface the composite pipeline draws to.
    pub output_format: wgpu::TextureFormat,

    /// Clear colour of the offscreen pass.
    pub clear_color: wgpu::Color,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            point_floor: 256,
            render_format: wgpu::TextureFormat::Rgba16Float,
            output_format: wgpu::TextureFormat::Bgra8UnormSrgb,
            clear_color: wgpu::Color::BLACK,
        }
    }
}

/// Preparation steps, in the order they run.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InitStep {
    Probe,
    Buffers,
    Programs,
    Pipelines,
    Textures,
    Upscaler,
}

impl fmt::Display for InitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Probe => "capability probe",
            Self::Buffers => "buffer preparation",
            Self::Programs => "program library",
            Self::Pipelines => "pipeline objects",
            Self::Textures => "texture preparation",
            Self::Upscaler => "upscaler preparation",
        })
    }
}

/// Builds `RenderResources` for one device.
///
/// Resolution, occupancy and scale are read from the shared state once, at
/// construction. Later changes to those fields apply to the next initializer.
pub struct PipelineInitializer {
    state: Arc<FrameState>,
    config: InitConfig,
    catalog: ProgramCatalog,
    resolution: (u32, u32),
    occupancy: u32,
    scale: f32,
}

impl PipelineInitializer {
    pub fn new(state: Arc<FrameState>, config: InitConfig) -> Self {
        let resolution = state.resolution();
        let occupancy = state.requested_occupancy();
        let scale = state.resolution_scale();
        Self {
            state,
            config,
            catalog: ProgramCatalog::builtin(),
            resolution,
            occupancy,
            scale,
        }
    }

    /// Resolves program names against `catalog` instead of the built-in one.
    pub fn with_catalog(mut self, catalog: ProgramCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Runs every step in order and stops at the first failure.
    ///
    /// On failure nothing built by earlier steps is returned; the error is
    /// the one the failing step raised. Status and upscaling flags in the
    /// shared state reflect how far initialization got.
    pub fn initialize<B: GpuBackend>(&self, backend: &B) -> Result<RenderResources<B>, InitError> {
        let capabilities = self.step(InitStep::Probe, || self.probe_device(backend))?;
        let points = self.step(InitStep::Buffers, || self.prepare_buffers(backend))?;
        let library = self.step(InitStep::Programs, || {
            self.prepare_programs(backend, &capabilities)
        })?;
        let pipelines = self.step(InitStep::Pipelines, || {
            self.prepare_pipelines(backend, &library, &capabilities)
        })?;
        let targets = self.step(InitStep::Textures, || self.prepare_textures(backend))?;
        let upscaler = self.step(InitStep::Upscaler, || {
            self.prepare_upscaler(backend, &library, &capabilities)
        })?;

        log::info!(
            "initialized: {:?}, {} points, {}x{}, upscaling {}",
            capabilities.status(),
            points.capacity(),
            targets.size.0,
            targets.size.1,
            upscaler.is_some()
        );

        Ok(RenderResources {
            capabilities,
            points,
            library,
            pipelines,
            targets,
            upscaler,
        })
    }

    fn step<T>(
        &self,
        step: InitStep,
        run: impl FnOnce() -> Result<T, InitError>,
    ) -> Result<T, InitError> {
        log::debug!("init: {step}");
        run().inspect_err(|e| log::error!("init: {step} failed: {e}"))
    }

    fn probe_device<B: GpuBackend>(&self, backend: &B) -> Result<CapabilityReport, InitError> {
        self.state.set_upscaling_enabled(false);

        let report = device::probe(backend);
        let status = report.status();
        self.state.set_status(status);

        match status {
            DeviceStatus::Unsupported => Err(InitError::UnsupportedDevice {
                reason: "compute shaders are not available".to_owned(),
            }),
            DeviceStatus::Limited => {
                log::warn!("advanced filter unavailable; blur disabled");
                Ok(report)
            }
            DeviceStatus::Full => Ok(report),
        }
    }

    fn prepare_buffers<B: GpuBackend>(
        &self,
        backend: &B,
    ) -> Result<AdaptiveBuffer<B>, InitError> {
        let points = AdaptiveBuffer::new(
            backend,
            u64::from(self.occupancy),
            self.config.point_floor,
            Point::STRIDE,
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            "points",
        )?;
        Ok(points)
    }

    fn prepare_programs<B: GpuBackend>(
        &self,
        backend: &B,
        capabilities: &CapabilityReport,
    ) -> Result<ProgramLibrary<B>, InitError> {
        let names = programs::required(capabilities);
        Ok(factory::make_program(backend, &self.catalog, names)?)
    }

    fn prepare_pipelines<B: GpuBackend>(
        &self,
        backend: &B,
        library: &ProgramLibrary<B>,
        capabilities: &CapabilityReport,
    ) -> Result<PipelineSet<B>, InitError> {
        let point_layouts = [Point::layout()];

        let points = factory::make_render_pipeline(
            backend,
            library,
            &RenderPipelineSpec {
                label: "points",
                vertex: programs::POINTS_VERTEX,
                fragment: programs::POINTS_FRAGMENT,
                format: self.config.render_format,
                topology: wgpu::PrimitiveTopology::PointList,
                vertex_buffers: &point_layouts,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            },
        )?;

        let composite = factory::make_render_pipeline(
            backend,
            library,
            &RenderPipelineSpec {
                label: "composite",
                vertex: programs::FULLSCREEN_VERTEX,
                fragment: programs::COMPOSITE_FRAGMENT,
                format: self.config.output_format,
                topology: wgpu::PrimitiveTopology::TriangleList,
                vertex_buffers: &[],
                blend: None,
            },
        )?;

        let simulate = factory::make_compute_pipeline(
            backend,
            library,
            &ComputePipelineSpec {
                label: "simulate",
                entry: programs::UPDATE_POINTS,
            },
        )?;

        let blur = if capabilities.supports_advanced_filter {
            Some(factory::make_compute_pipeline(
                backend,
                library,
                &ComputePipelineSpec {
                    label: "blur",
                    entry: programs::BLUR_IMAGE,
                },
            )?)
        } else {
            None
        };

        Ok(PipelineSet {
            points,
            composite,
            simulate,
            blur,
        })
    }

    fn prepare_textures<B: GpuBackend>(&self, backend: &B) -> Result<RenderTargets<B>, InitError> {
        let (width, height) = self.resolution;

        let color = factory::make_texture(
            backend,
            &TextureSpec {
                label: "render target",
                format: self.config.render_format,
                width,
                height,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
            },
        )?;

        let intermediate = factory::make_texture(
            backend,
            &TextureSpec {
                label: "intermediate",
                format: FILTER_FORMAT,
                width,
                height,
                usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            },
        )?;

        Ok(RenderTargets {
            color,
            intermediate,
            size: (width, height),
            pass: OffscreenPass {
                clear_color: self.config.clear_color,
            },
        })
    }

    fn prepare_upscaler<B: GpuBackend>(
        &self,
        backend: &B,
        library: &ProgramLibrary<B>,
        capabilities: &CapabilityReport,
    ) -> Result<Option<Upscaler<B>>, InitError> {
        if !capabilities.supports_upscaling {
            log::warn!("upscaling unavailable; presenting at base resolution");
            self.state.set_upscaling_enabled(false);
            return Ok(None);
        }

        let input_size = self.resolution;
        let output_size = scaled(input_size, self.scale);

        let output = factory::make_texture(
            backend,
            &TextureSpec {
                label: "upscaled output",
                format: UPSCALE_FORMAT,
                width: output_size.0,
                height: output_size.1,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
            },
        )?;

        let pipeline = factory::make_render_pipeline(
            backend,
            library,
            &RenderPipelineSpec {
                label: "upscale",
                vertex: programs::FULLSCREEN_VERTEX,
                fragment: programs::UPSCALE_FRAGMENT,
                format: UPSCALE_FORMAT,
                topology: wgpu::PrimitiveTopology::TriangleList,
                vertex_buffers: &[],
                blend: None,
            },
        )?;

        self.state.set_upscaling_enabled(true);
        Ok(Some(Upscaler {
            output,
            pipeline,
            input_size,
            output_size,
        }))
    }
}

/// `round(base * factor)` per axis; non-finite or negative factors give zero.
fn scaled((width, height): (u32, u32), factor: f32) -> (u32, u32) {
    let axis = |v: u32| (f64::from(v) * f64::from(factor)).round() as u32;
    (axis(width), axis(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::FakeBackend;
    use crate::error::{AllocationError, LibraryCreationError, Recovery};
    use crate::resources::ProgramSource;
    use crate::state::VisualSettings;

    fn state(settings: VisualSettings) -> Arc<FrameState> {
        Arc::new(FrameState::new(&settings))
    }

    fn initializer(state: &Arc<FrameState>) -> PipelineInitializer {
        PipelineInitializer::new(Arc::clone(state), InitConfig::default())
    }

    #[test]
    fn full_device_builds_everything() {
        let state = state(VisualSettings::default());
        let backend = FakeBackend::full();

        let resources = initializer(&state).initialize(&backend).unwrap();

        assert_eq!(state.status(), Some(DeviceStatus::Full));
        assert!(state.upscaling_enabled());
        assert!(resources.pipelines().blur.is_some());
        assert_eq!(resources.targets().size, (1300, 650));

        let upscaler = resources.upscaler().unwrap();
        assert_eq!(upscaler.input_size, (1300, 650));
        assert_eq!(upscaler.output_size, (2600, 1300));
        assert_eq!(upscaler.output.label(), "upscaled output");

        // 100 requested points, floor 256 -> 128 slots.
        assert_eq!(resources.points().capacity(), 128);
        assert_eq!(resources.library().module_count(), 3);
    }

    #[test]
    fn steps_allocate_in_order() {
        let state = state(VisualSettings::default());
        let backend = FakeBackend::full();
        initializer(&state).initialize(&backend).unwrap();

        let created = backend.created();
        let position = |entry: &str| created.iter().position(|e| e == entry).unwrap();
        assert!(position("buffer:points") < position("module:points"));
        assert!(position("pipeline:simulate") < position("texture:render target"));
        assert!(position("texture:intermediate") < position("texture:upscaled output"));
    }

    #[test]
    fn limited_device_completes_without_blur() {
        let state = state(VisualSettings {
            blur: true,
            ..VisualSettings::default()
        });
        let backend = FakeBackend::limited();

        let resources = initializer(&state).initialize(&backend).unwrap();

        assert_eq!(state.status(), Some(DeviceStatus::Limited));
        assert!(!state.blur_enabled());
        assert!(!state.set_blur_enabled(true));
        assert!(resources.pipelines().blur.is_none());
        assert!(!backend.has_created("module:blur"));
        assert!(resources.upscaler().is_some());
    }

    #[test]
    fn missing_program_stops_before_any_pipeline() {
        let state = state(VisualSettings::default());
        let backend = FakeBackend::full();
        let catalog = ProgramCatalog::new(
            "without blur",
            ProgramCatalog::builtin()
                .sources()
                .iter()
                .filter(|s| s.label != "blur")
                .cloned()
                .collect::<Vec<ProgramSource>>(),
        );

        let err = initializer(&state)
            .with_catalog(catalog)
            .initialize(&backend)
            .err()
            .unwrap();

        match &err {
            InitError::Library(inner @ LibraryCreationError::MissingProgram { .. }) => {
                assert_eq!(inner.missing_program(), Some(programs::BLUR_IMAGE));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.recovery(), Recovery::Degrade);
        assert_eq!(backend.count("pipeline:"), 0);
        assert_eq!(backend.count("texture:"), 0);
    }

    #[test]
    fn zero_resolution_fails_before_upscaler() {
        let state = state(VisualSettings {
            resolution: (0, 650),
            ..VisualSettings::default()
        });
        let backend = FakeBackend::full();

        let err = initializer(&state).initialize(&backend).err().unwrap();

        match err {
            InitError::Texture(inner) => {
                assert_eq!(inner.label, "render target");
                assert_eq!(inner.source, AllocationError::ZeroSized);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!backend.has_created("texture:upscaled output"));
        assert!(!backend.has_created("pipeline:upscale"));
        assert!(!state.upscaling_enabled());
    }

    #[test]
    fn unsupported_device_terminates_before_allocating() {
        let state = state(VisualSettings::default());
        let backend = FakeBackend::unsupported();

        let err = initializer(&state).initialize(&backend).err().unwrap();

        assert!(matches!(err, InitError::UnsupportedDevice { .. }));
        assert_eq!(err.recovery(), Recovery::Terminate);
        assert_eq!(state.status(), Some(DeviceStatus::Unsupported));
        assert!(backend.created().is_empty());
    }

    #[test]
    fn no_upscaling_support_is_not_an_error() {
        let state = state(VisualSettings::default());
        state.set_upscaling_enabled(true);
        let backend = FakeBackend::full().without_upscaling();

        let resources = initializer(&state).initialize(&backend).unwrap();

        assert!(resources.upscaler().is_none());
        assert!(!state.upscaling_enabled());
        assert!(!resources.library().contains(programs::UPSCALE_FRAGMENT));
    }

    #[test]
    fn buffer_failure_is_reported_before_programs() {
        let state = state(VisualSettings::default());
        let backend = FakeBackend::full();
        backend.reject("points");

        let err = initializer(&state).initialize(&backend).err().unwrap();

        assert!(matches!(err, InitError::Buffer(_)));
        assert_eq!(backend.count("module:"), 0);
    }

    #[test]
    fn settings_are_snapshotted_at_construction() {
        let state = state(VisualSettings::default());
        let init = initializer(&state);
        state.set_resolution(10, 10);
        state.set_resolution_scale(3.0);

        let resources = init.initialize(&FakeBackend::full()).unwrap();
        assert_eq!(resources.targets().size, (1300, 650));
        assert_eq!(resources.upscaler().unwrap().output_size, (2600, 1300));
        assert_eq!(resources.capabilities().status(), DeviceStatus::Full);
    }

    #[test]
    fn scaling_rounds_to_nearest() {
        assert_eq!(scaled((1300, 650), 2.0), (2600, 1300));
        assert_eq!(scaled((3, 3), 1.5), (5, 5));
        assert_eq!(scaled((100, 100), f32::NAN), (0, 0));
    }
}
