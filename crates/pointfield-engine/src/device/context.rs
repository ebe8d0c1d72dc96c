use std::sync::Arc;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::surface::{self, SurfaceErrorAction};
use super::{GpuInit, WgpuBackend};

/// One acquired surface texture and the encoder recording into it.
///
/// Holding it blocks acquisition of the next frame. Dropping it without
/// [`Gpu::submit`] discards the frame.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// wgpu objects bound to one window: surface, device and queue.
///
/// Resource code never sees this type; it allocates through [`Gpu::backend`].
pub struct Gpu<'w> {
    // Kept alive for the surface.
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'w>,
    backend: WgpuBackend,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    // Physical pixels; may be zero while minimized.
    size: PhysicalSize<u32>,
}

impl<'w> Gpu<'w> {
    /// Creates the surface for `window`, picks an adapter able to present to
    /// it, and opens a device with every optional feature the adapter offers.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = open_device(&adapter, &init).await?;
        let config = surface_config(&surface, &adapter, &init, size)?;
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            backend: WgpuBackend::new(adapter, device),
            queue,
            config,
            size,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Device boundary used for resource allocation.
    pub fn backend(&self) -> &WgpuBackend {
        &self.backend
    }

    pub fn device(&self) -> &wgpu::Device {
        self.backend.device()
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        surface::apply_resize(
            &self.surface,
            self.backend.device(),
            &mut self.config,
            &mut self.size,
            new_size,
        );
    }

    pub fn begin_frame(&self) -> Result<GpuFrame, wgpu::SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pointfield frame"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the frame's commands and presents it.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;
        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }

    /// Recovers from a failed acquisition where possible.
    pub fn handle_surface_error(&mut self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        surface::map_surface_error(
            &self.surface,
            self.backend.device(),
            &self.config,
            self.size,
            err,
        )
    }
}

async fn open_device(
    adapter: &wgpu::Adapter,
    init: &GpuInit,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    let info = adapter.get_info();
    let granted = adapter.features() & init.optional_features;
    let missing = init.optional_features - granted;
    log::info!("adapter `{}` ({:?})", info.name, info.backend);
    if !missing.is_empty() {
        log::warn!("adapter lacks optional features {missing:?}");
    }

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("pointfield device"),
            required_features: init.required_features | granted,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")?;

    // Allocations run inside error scopes; anything reaching this handler
    // came from per-frame work and only costs that frame.
    device.on_uncaptured_error(Arc::new(|error: wgpu::Error| {
        log::error!("uncaptured device error: {error}");
    }));

    Ok((device, queue))
}

fn surface_config(
    surface: &wgpu::Surface<'_>,
    adapter: &wgpu::Adapter,
    init: &GpuInit,
    size: PhysicalSize<u32>,
) -> Result<wgpu::SurfaceConfiguration> {
    let caps = surface.get_capabilities(adapter);
    let format = surface::choose_surface_format(&caps, init.prefer_srgb)
        .context("no supported surface formats")?;

    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width,
        height: size.height,
        present_mode: init.present_mode,
        alpha_mode: surface::choose_alpha_mode(&caps, init.alpha_mode),
        view_formats: vec![],
        desired_maximum_frame_latency: init.desired_maximum_frame_latency,
    })
}
