use std::ops::Deref;

/// A device object tagged with the label it was created under.
///
/// Labels are carried for diagnostics; the handle is immutable once built.
#[derive(Debug)]
pub struct Labeled<T> {
    label: String,
    inner: T,
}

impl<T> Labeled<T> {
    pub fn new(label: impl Into<String>, inner: T) -> Self {
        Self {
            label: label.into(),
            inner,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for Labeled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

/// Declarative 2D texture request.
#[derive(Debug, Clone)]
pub struct TextureSpec<'a> {
    pub label: &'a str,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
    pub usage: wgpu::TextureUsages,
}

impl TextureSpec<'_> {
    pub(crate) fn descriptor(&self) -> wgpu::TextureDescriptor<'_> {
        wgpu::TextureDescriptor {
            label: Some(self.label),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: self.usage,
            view_formats: &[],
        }
    }
}

/// Render pipeline built from a vertex/fragment program pair.
#[derive(Debug, Clone)]
pub struct RenderPipelineSpec<'a> {
    pub label: &'a str,
    pub vertex: &'a str,
    pub fragment: &'a str,
    pub format: wgpu::TextureFormat,
    pub topology: wgpu::PrimitiveTopology,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub blend: Option<wgpu::BlendState>,
}

/// Compute pipeline built from a single compute program.
#[derive(Debug, Clone)]
pub struct ComputePipelineSpec<'a> {
    pub label: &'a str,
    pub entry: &'a str,
}
