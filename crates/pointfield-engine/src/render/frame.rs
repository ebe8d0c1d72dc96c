use std::sync::Arc;

use crate::core::FrameCtx;
use crate::device::{Gpu, WgpuBackend};
use crate::error::FrameError;
use crate::pipeline::RenderResources;
use crate::state::FrameState;

use super::point::{spiral, SimParams};
use super::RenderTarget;

/// Must match `@workgroup_size` of `update_points`.
const SIMULATE_GROUP: u32 = 64;
/// Must match `@workgroup_size` of `blur_image`.
const BLUR_TILE: u32 = 8;

/// Bindings of whichever pipeline consumes the base image.
struct ImageBindings {
    plain: wgpu::BindGroup,
    blurred: wgpu::BindGroup,
}

/// Draws one frame per call from a set of `RenderResources`.
///
/// Per frame: resize the point buffer to the requested occupancy (and
/// repopulate it if it was replaced), simulate, draw points offscreen,
/// optionally blur and upscale, then composite onto the surface.
pub struct FrameRenderer {
    resources: RenderResources<WgpuBackend>,
    state: Arc<FrameState>,
    params: wgpu::Buffer,

    base_image: ImageBindings,
    upscaled: Option<wgpu::BindGroup>,
    blur: Option<wgpu::BindGroup>,

    // Keyed by point buffer generation.
    simulate: Option<(u64, wgpu::BindGroup)>,
    populated: Option<u64>,

    active_points: u32,
    elapsed: f32,
}

impl FrameRenderer {
    pub fn new(
        gpu: &Gpu<'_>,
        resources: RenderResources<WgpuBackend>,
        state: Arc<FrameState>,
    ) -> Self {
        let device = gpu.device();

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("pointfield sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("simulation params"),
            size: std::mem::size_of::<SimParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let targets = resources.targets();
        let pipelines = resources.pipelines();

        // The upscaler samples with `textureLoad`, so its layout has no sampler.
        let (consumer, consumer_sampler) = match resources.upscaler() {
            Some(upscaler) => (&*upscaler.pipeline, None),
            None => (&*pipelines.composite, Some(&sampler)),
        };
        let base_image = ImageBindings {
            plain: image_bind_group(
                device,
                consumer,
                &targets.color.view,
                consumer_sampler,
                "base image",
            ),
            blurred: image_bind_group(
                device,
                consumer,
                &targets.intermediate.view,
                consumer_sampler,
                "blurred image",
            ),
        };

        let upscaled = resources.upscaler().map(|upscaler| {
            image_bind_group(
                device,
                &pipelines.composite,
                &upscaler.output.view,
                Some(&sampler),
                "upscaled image",
            )
        });

        let blur = pipelines.blur.as_ref().map(|pipeline| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("blur"),
                layout: &pipeline.get_bind_group_layout(0),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&targets.color.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&targets.intermediate.view),
                    },
                ],
            })
        });

        Self {
            resources,
            state,
            params,
            base_image,
            upscaled,
            blur,
            simulate: None,
            populated: None,
            active_points: 0,
            elapsed: 0.0,
        }
    }

    pub fn resources(&self) -> &RenderResources<WgpuBackend> {
        &self.resources
    }

    /// Prepares, encodes and presents one frame.
    ///
    /// Nothing is submitted when an error is returned.
    pub fn draw(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<(), FrameError> {
        self.prepare(ctx.gpu, ctx.time.dt)?;
        ctx.present(|target| self.encode(target))
            .map_err(FrameError::Surface)
    }

    /// Frame-start work: buffer sizing, repopulation and uniforms.
    ///
    /// Runs before any command referencing the point buffer is encoded, so a
    /// replaced buffer is never seen by this frame's commands.
    fn prepare(&mut self, gpu: &Gpu<'_>, dt: f32) -> Result<(), FrameError> {
        let requested = self.state.requested_occupancy();
        self.resources
            .points_mut()
            .resize(gpu.backend(), u64::from(requested))?;

        let points = self.resources.points();
        let generation = points.generation();

        // A new generation means the contents are undefined.
        if self.populated != Some(generation) {
            let layout = spiral(usize::try_from(points.capacity()).unwrap_or(usize::MAX));
            gpu.queue()
                .write_buffer(points.buffer(), 0, bytemuck::cast_slice(&layout));
            self.populated = Some(generation);
        }

        if self.simulate.as_ref().map(|(g, _)| *g) != Some(generation) {
            let pipeline = &self.resources.pipelines().simulate;
            let bind_group = gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("simulate"),
                layout: &pipeline.get_bind_group_layout(0),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: points.buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: self.params.as_entire_binding(),
                    },
                ],
            });
            self.simulate = Some((generation, bind_group));
        }

        self.active_points = active_count(requested, points.capacity());
        self.elapsed += dt;

        gpu.queue().write_buffer(
            &self.params,
            0,
            bytemuck::bytes_of(&SimParams {
                count: self.active_points,
                dt,
                time: self.elapsed,
                _pad: 0,
            }),
        );

        Ok(())
    }

    fn encode(&self, target: &mut RenderTarget<'_>) {
        let resources = &self.resources;
        let pipelines = resources.pipelines();
        let targets = resources.targets();
        let count = self.active_points;

        if count > 0 {
            if let Some((_, bind_group)) = &self.simulate {
                let mut cpass = target
                    .encoder
                    .begin_compute_pass(&wgpu::ComputePassDescriptor {
                        label: Some("simulate"),
                        timestamp_writes: None,
                    });
                cpass.set_pipeline(&pipelines.simulate);
                cpass.set_bind_group(0, bind_group, &[]);
                cpass.dispatch_workgroups(count.div_ceil(SIMULATE_GROUP), 1, 1);
            }
        }

        {
            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("points"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &targets.color.view,
                    resolve_target: None,
                    ops: targets.pass.color_ops(),
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if count > 0 {
                let points = resources.points();
                let bytes = u64::from(count) * points.element_stride();
                rpass.set_pipeline(&pipelines.points);
                rpass.set_vertex_buffer(0, points.buffer().slice(..bytes));
                rpass.draw(0..count, 0..1);
            }
        }

        let mut blurred = false;
        if self.state.blur_enabled() {
            if let (Some(pipeline), Some(bind_group)) = (&pipelines.blur, &self.blur) {
                let (width, height) = targets.size;
                let mut cpass = target
                    .encoder
                    .begin_compute_pass(&wgpu::ComputePassDescriptor {
                        label: Some("blur"),
                        timestamp_writes: None,
                    });
                cpass.set_pipeline(pipeline);
                cpass.set_bind_group(0, bind_group, &[]);
                cpass.dispatch_workgroups(width.div_ceil(BLUR_TILE), height.div_ceil(BLUR_TILE), 1);
                blurred = true;
            }
        }

        let base = if blurred {
            &self.base_image.blurred
        } else {
            &self.base_image.plain
        };

        let composite_source = match (resources.upscaler(), &self.upscaled) {
            (Some(upscaler), Some(upscaled)) => {
                fullscreen_pass(
                    target.encoder,
                    &upscaler.output.view,
                    &upscaler.pipeline,
                    base,
                    "upscale",
                );
                upscaled
            }
            _ => base,
        };

        fullscreen_pass(
            target.encoder,
            target.color_view,
            &pipelines.composite,
            composite_source,
            "composite",
        );
    }
}

/// Points drawn this frame: the request, bounded by what the buffer holds.
fn active_count(requested: u32, capacity: u64) -> u32 {
    u32::try_from(capacity).map_or(requested, |capacity| requested.min(capacity))
}

fn image_bind_group(
    device: &wgpu::Device,
    pipeline: &wgpu::RenderPipeline,
    view: &wgpu::TextureView,
    sampler: Option<&wgpu::Sampler>,
    label: &str,
) -> wgpu::BindGroup {
    let mut entries = vec![wgpu::BindGroupEntry {
        binding: 0,
        resource: wgpu::BindingResource::TextureView(view),
    }];
    if let Some(sampler) = sampler {
        entries.push(wgpu::BindGroupEntry {
            binding: 1,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
    }

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &pipeline.get_bind_group_layout(0),
        entries: &entries,
    })
}

fn fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
    label: &str,
) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });

    rpass.set_pipeline(pipeline);
    rpass.set_bind_group(0, bind_group, &[]);
    rpass.draw(0..3, 0..1);
}
