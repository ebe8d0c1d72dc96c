//! In-memory `GpuBackend` for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use crate::error::AllocationError;
use crate::resources::{ComputePipelineSpec, RenderPipelineSpec};

use super::GpuBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeBuffer {
    pub label: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeTexture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeModule {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakePipeline {
    pub label: String,
}

/// Records every allocation and can be told to reject specific labels.
pub(crate) struct FakeBackend {
    features: wgpu::Features,
    downlevel: wgpu::DownlevelFlags,
    limits: wgpu::Limits,
    formats: HashMap<wgpu::TextureFormat, wgpu::TextureFormatFeatures>,
    rejected: RefCell<HashSet<String>>,
    created: RefCell<Vec<String>>,
    retired: Cell<usize>,
}

impl FakeBackend {
    pub fn full() -> Self {
        Self {
            features: wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
            downlevel: wgpu::DownlevelFlags::all(),
            limits: wgpu::Limits::default(),
            formats: HashMap::new(),
            rejected: RefCell::new(HashSet::new()),
            created: RefCell::new(Vec::new()),
            retired: Cell::new(0),
        }
    }

    /// Baseline device without the adapter-specific format feature.
    pub fn limited() -> Self {
        Self {
            features: wgpu::Features::empty(),
            ..Self::full()
        }
    }

    pub fn unsupported() -> Self {
        Self {
            downlevel: wgpu::DownlevelFlags::empty(),
            ..Self::full()
        }
    }

    pub fn without_upscaling(self) -> Self {
        self.with_format_flags(
            crate::device::UPSCALE_FORMAT,
            wgpu::TextureFormatFeatureFlags::empty(),
        )
    }

    pub fn with_format_flags(
        mut self,
        format: wgpu::TextureFormat,
        flags: wgpu::TextureFormatFeatureFlags,
    ) -> Self {
        self.formats.insert(
            format,
            wgpu::TextureFormatFeatures {
                allowed_usages: wgpu::TextureUsages::all(),
                flags,
            },
        );
        self
    }

    pub fn with_format_usages(
        mut self,
        format: wgpu::TextureFormat,
        allowed_usages: wgpu::TextureUsages,
    ) -> Self {
        self.formats.insert(
            format,
            wgpu::TextureFormatFeatures {
                allowed_usages,
                flags: wgpu::TextureFormatFeatureFlags::all(),
            },
        );
        self
    }

    pub fn with_limits(mut self, limits: wgpu::Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Makes every later allocation under `label` fail.
    pub fn reject(&self, label: &str) {
        self.rejected.borrow_mut().insert(label.to_owned());
    }

    /// Labels of every object created so far, prefixed by kind.
    pub fn created(&self) -> Vec<String> {
        self.created.borrow().clone()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.created
            .borrow()
            .iter()
            .filter(|entry| entry.starts_with(kind))
            .count()
    }

    pub fn has_created(&self, entry: &str) -> bool {
        self.created.borrow().iter().any(|e| e == entry)
    }

    pub fn retired(&self) -> usize {
        self.retired.get()
    }

    fn admit(&self, kind: &str, label: &str) -> Result<(), AllocationError> {
        if self.rejected.borrow().contains(label) {
            return Err(AllocationError::Rejected(format!("{kind} `{label}` refused")));
        }
        self.created.borrow_mut().push(format!("{kind}:{label}"));
        Ok(())
    }
}

impl GpuBackend for FakeBackend {
    type Buffer = FakeBuffer;
    type Texture = FakeTexture;
    type Module = FakeModule;
    type RenderPipeline = FakePipeline;
    type ComputePipeline = FakePipeline;

    fn features(&self) -> wgpu::Features {
        self.features
    }

    fn downlevel_flags(&self) -> wgpu::DownlevelFlags {
        self.downlevel
    }

    fn limits(&self) -> wgpu::Limits {
        self.limits.clone()
    }

    fn format_features(&self, format: wgpu::TextureFormat) -> wgpu::TextureFormatFeatures {
        self.formats
            .get(&format)
            .cloned()
            .unwrap_or(wgpu::TextureFormatFeatures {
                allowed_usages: wgpu::TextureUsages::all(),
                flags: wgpu::TextureFormatFeatureFlags::all(),
            })
    }

    fn create_buffer(
        &self,
        desc: &wgpu::BufferDescriptor<'_>,
    ) -> Result<Self::Buffer, AllocationError> {
        let label = desc.label.unwrap_or_default();
        self.admit("buffer", label)?;
        Ok(FakeBuffer {
            label: label.to_owned(),
            size: desc.size,
        })
    }

    fn retire_buffer(&self, _buffer: Self::Buffer) {
        self.retired.set(self.retired.get() + 1);
    }

    fn create_texture(
        &self,
        desc: &wgpu::TextureDescriptor<'_>,
    ) -> Result<Self::Texture, AllocationError> {
        let label = desc.label.unwrap_or_default();
        self.admit("texture", label)?;
        Ok(FakeTexture {
            label: label.to_owned(),
            width: desc.size.width,
            height: desc.size.height,
            format: desc.format,
        })
    }

    fn create_module(&self, label: &str, _wgsl: &str) -> Result<Self::Module, AllocationError> {
        self.admit("module", label)?;
        Ok(FakeModule {
            label: label.to_owned(),
        })
    }

    fn create_render_pipeline(
        &self,
        spec: &RenderPipelineSpec<'_>,
        _vertex: &Self::Module,
        _fragment: &Self::Module,
    ) -> Result<Self::RenderPipeline, AllocationError> {
        self.admit("pipeline", spec.label)?;
        Ok(FakePipeline {
            label: spec.label.to_owned(),
        })
    }

    fn create_compute_pipeline(
        &self,
        spec: &ComputePipelineSpec<'_>,
        _module: &Self::Module,
    ) -> Result<Self::ComputePipeline, AllocationError> {
        self.admit("pipeline", spec.label)?;
        Ok(FakePipeline {
            label: spec.label.to_owned(),
        })
    }
}
