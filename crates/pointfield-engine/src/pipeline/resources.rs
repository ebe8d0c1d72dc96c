use crate::buffer::AdaptiveBuffer;
use crate::device::{CapabilityReport, GpuBackend};
use crate::resources::{Labeled, ProgramLibrary};

/// Everything `PipelineInitializer` produced for one device.
///
/// Handles are immutable once built. The point buffer is the only member
/// that changes afterwards, through [`RenderResources::points_mut`].
pub struct RenderResources<B: GpuBackend> {
    pub(crate) capabilities: CapabilityReport,
    pub(crate) points: AdaptiveBuffer<B>,
    pub(crate) library: ProgramLibrary<B>,
    pub(crate) pipelines: PipelineSet<B>,
    pub(crate) targets: RenderTargets<B>,
    pub(crate) upscaler: Option<Upscaler<B>>,
}

impl<B: GpuBackend> RenderResources<B> {
    pub fn capabilities(&self) -> &CapabilityReport {
        &self.capabilities
    }

    pub fn points(&self) -> &AdaptiveBuffer<B> {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut AdaptiveBuffer<B> {
        &mut self.points
    }

    pub fn library(&self) -> &ProgramLibrary<B> {
        &self.library
    }

    pub fn pipelines(&self) -> &PipelineSet<B> {
        &self.pipelines
    }

    pub fn targets(&self) -> &RenderTargets<B> {
        &self.targets
    }

    pub fn upscaler(&self) -> Option<&Upscaler<B>> {
        self.upscaler.as_ref()
    }
}

/// Fixed set of pipeline objects.
pub struct PipelineSet<B: GpuBackend> {
    /// Draws the point buffer into the render target.
    pub points: Labeled<B::RenderPipeline>,
    /// Draws the final image onto the presentation surface.
    pub composite: Labeled<B::RenderPipeline>,
    /// Advances the simulation in place.
    pub simulate: Labeled<B::ComputePipeline>,
    /// Present only on devices with the advanced filter tier.
    pub blur: Option<Labeled<B::ComputePipeline>>,
}

/// Offscreen textures at base resolution.
pub struct RenderTargets<B: GpuBackend> {
    /// Points are drawn here.
    pub color: Labeled<B::Texture>,
    /// Read-write image the blur kernel accumulates into.
    pub intermediate: Labeled<B::Texture>,
    pub size: (u32, u32),
    pub pass: OffscreenPass,
}

/// Load/store behavior of the offscreen points pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OffscreenPass {
    pub clear_color: wgpu::Color,
}

impl OffscreenPass {
    /// Clear on load, store on finish.
    pub fn color_ops(&self) -> wgpu::Operations<wgpu::Color> {
        wgpu::Operations {
            load: wgpu::LoadOp::Clear(self.clear_color),
            store: wgpu::StoreOp::Store,
        }
    }
}

/// Resamples the base image to the output resolution.
///
/// Filtering happens on sRGB-encoded values (the output texture is sRGB),
/// which keeps edges perceptually even instead of darkening them.
pub struct Upscaler<B: GpuBackend> {
    pub output: Labeled<B::Texture>,
    pub pipeline: Labeled<B::RenderPipeline>,
    pub input_size: (u32, u32),
    pub output_size: (u32, u32),
}
