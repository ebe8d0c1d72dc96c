use crate::error::AllocationError;
use crate::resources::{ComputePipelineSpec, RenderPipelineSpec};

/// Device boundary used by every resource-owning component.
///
/// Implementations perform raw allocation only. Validation against limits and
/// format capabilities happens in `resources::factory`, so every backend sees
/// the same rules.
///
/// The device is borrowed, never owned, by the components that allocate from it.
pub trait GpuBackend {
    type Buffer;
    type Texture;
    type Module;
    type RenderPipeline;
    type ComputePipeline;

    /// Features enabled on the logical device.
    fn features(&self) -> wgpu::Features;

    /// Downlevel capabilities of the adapter backing the device.
    fn downlevel_flags(&self) -> wgpu::DownlevelFlags;

    fn limits(&self) -> wgpu::Limits;

    fn format_features(&self, format: wgpu::TextureFormat) -> wgpu::TextureFormatFeatures;

    fn create_buffer(
        &self,
        desc: &wgpu::BufferDescriptor<'_>,
    ) -> Result<Self::Buffer, AllocationError>;

    /// Hands a replaced buffer to the device's deferred-release mechanism.
    ///
    /// The handle may still be referenced by submitted work; it must not be
    /// destroyed before that work completes.
    fn retire_buffer(&self, buffer: Self::Buffer) {
        drop(buffer);
    }

    fn create_texture(
        &self,
        desc: &wgpu::TextureDescriptor<'_>,
    ) -> Result<Self::Texture, AllocationError>;

    fn create_module(&self, label: &str, wgsl: &str) -> Result<Self::Module, AllocationError>;

    fn create_render_pipeline(
        &self,
        spec: &RenderPipelineSpec<'_>,
        vertex: &Self::Module,
        fragment: &Self::Module,
    ) -> Result<Self::RenderPipeline, AllocationError>;

    fn create_compute_pipeline(
        &self,
        spec: &ComputePipelineSpec<'_>,
        module: &Self::Module,
    ) -> Result<Self::ComputePipeline, AllocationError>;
}

/// Texture plus its default full view.
#[derive(Debug, Clone)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// `GpuBackend` over a live wgpu adapter/device pair.
///
/// wgpu handles are reference counted, so cloning this type is cheap and
/// dropping a buffer only releases it once the queue is done with it.
///
/// Every allocation runs inside out-of-memory and validation error scopes, so
/// a device-side failure comes back as an `AllocationError` instead of
/// reaching the uncaptured-error handler.
#[derive(Debug, Clone)]
pub struct WgpuBackend {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
}

impl WgpuBackend {
    pub fn new(adapter: wgpu::Adapter, device: wgpu::Device) -> Self {
        Self { adapter, device }
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Runs `create` with error scopes pushed and reports what they caught.
    ///
    /// Scopes are popped in reverse push order. Blocks until the device has
    /// validated the call.
    fn scoped<T>(&self, create: impl FnOnce(&wgpu::Device) -> T) -> Result<T, AllocationError> {
        let out_of_memory = self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let validation = self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let created = create(&self.device);

        let invalid = pollster::block_on(validation.pop());
        let exhausted = pollster::block_on(out_of_memory.pop());
        scope_result(invalid.or(exhausted))?;
        Ok(created)
    }
}

/// Maps whatever an error scope caught to an `AllocationError`.
pub(crate) fn scope_result(caught: Option<wgpu::Error>) -> Result<(), AllocationError> {
    match caught {
        None => Ok(()),
        Some(wgpu::Error::OutOfMemory { .. }) => Err(AllocationError::OutOfMemory),
        Some(wgpu::Error::Validation { description, .. }) => {
            Err(AllocationError::Rejected(description))
        }
        Some(other) => Err(AllocationError::Rejected(other.to_string())),
    }
}

impl GpuBackend for WgpuBackend {
    type Buffer = wgpu::Buffer;
    type Texture = GpuTexture;
    type Module = wgpu::ShaderModule;
    type RenderPipeline = wgpu::RenderPipeline;
    type ComputePipeline = wgpu::ComputePipeline;

    fn features(&self) -> wgpu::Features {
        self.device.features()
    }

    fn downlevel_flags(&self) -> wgpu::DownlevelFlags {
        self.adapter.get_downlevel_capabilities().flags
    }

    fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    fn format_features(&self, format: wgpu::TextureFormat) -> wgpu::TextureFormatFeatures {
        self.adapter.get_texture_format_features(format)
    }

    fn create_buffer(
        &self,
        desc: &wgpu::BufferDescriptor<'_>,
    ) -> Result<Self::Buffer, AllocationError> {
        self.scoped(|device| device.create_buffer(desc))
    }

    fn create_texture(
        &self,
        desc: &wgpu::TextureDescriptor<'_>,
    ) -> Result<Self::Texture, AllocationError> {
        self.scoped(|device| {
            let texture = device.create_texture(desc);
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            GpuTexture { texture, view }
        })
    }

    fn create_module(&self, label: &str, wgsl: &str) -> Result<Self::Module, AllocationError> {
        self.scoped(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(wgsl.to_owned().into()),
            })
        })
    }

    fn create_render_pipeline(
        &self,
        spec: &RenderPipelineSpec<'_>,
        vertex: &Self::Module,
        fragment: &Self::Module,
    ) -> Result<Self::RenderPipeline, AllocationError> {
        self.scoped(|device| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(spec.label),
                // Layout is derived from the programs' declared bindings.
                layout: None,
                vertex: wgpu::VertexState {
                    module: vertex,
                    entry_point: Some(spec.vertex),
                    compilation_options: Default::default(),
                    buffers: spec.vertex_buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: fragment,
                    entry_point: Some(spec.fragment),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: spec.format,
                        blend: spec.blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: spec.topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        })
    }

    fn create_compute_pipeline(
        &self,
        spec: &ComputePipelineSpec<'_>,
        module: &Self::Module,
    ) -> Result<Self::ComputePipeline, AllocationError> {
        self.scoped(|device| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(spec.label),
                layout: None,
                module,
                entry_point: Some(spec.entry),
                compilation_options: Default::default(),
                cache: None,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cause(message: &str) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        Box::new(std::io::Error::other(message.to_owned()))
    }

    #[test]
    fn empty_scope_is_success() {
        assert_eq!(scope_result(None), Ok(()));
    }

    #[test]
    fn out_of_memory_is_its_own_category() {
        let caught = wgpu::Error::OutOfMemory {
            source: cause("heap exhausted"),
        };
        assert_eq!(scope_result(Some(caught)), Err(AllocationError::OutOfMemory));
    }

    #[test]
    fn validation_failure_keeps_the_device_message() {
        let caught = wgpu::Error::Validation {
            source: cause("parse error"),
            description: "shader `blur` failed to parse".to_owned(),
        };
        assert_eq!(
            scope_result(Some(caught)),
            Err(AllocationError::Rejected(
                "shader `blur` failed to parse".to_owned()
            ))
        );
    }
}
