//! Stateless construction of device objects from declarative descriptions.
//!
//! Every request is validated against the backend's limits and format
//! capabilities before the backend is asked to allocate, and every failure
//! names the resource it was building.

use std::collections::{BTreeMap, BTreeSet};

use crate::device::GpuBackend;
use crate::error::{
    AllocationError, BufferCreationError, LibraryCreationError, PipelineCreationError,
    TextureCreationError,
};

use super::{
    ComputePipelineSpec, Labeled, ProgramCatalog, ProgramLibrary, ProgramStage,
    RenderPipelineSpec, TextureSpec,
};

/// Allocates room for `elements` items of `stride` bytes.
///
/// Contents are uninitialized.
pub fn make_buffer<B: GpuBackend>(
    backend: &B,
    label: &str,
    usage: wgpu::BufferUsages,
    elements: u64,
    stride: u64,
) -> Result<B::Buffer, BufferCreationError> {
    let fail = |source| BufferCreationError {
        label: label.to_owned(),
        source,
    };

    let limit = backend.limits().max_buffer_size;
    let size = elements
        .checked_mul(stride)
        .ok_or(AllocationError::ExceedsLimit {
            requested: u64::MAX,
            limit,
        })
        .map_err(fail)?;

    if size == 0 {
        return Err(fail(AllocationError::ZeroSized));
    }
    if size > limit {
        return Err(fail(AllocationError::ExceedsLimit {
            requested: size,
            limit,
        }));
    }

    backend
        .create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        })
        .map_err(fail)
}

pub fn make_texture<B: GpuBackend>(
    backend: &B,
    spec: &TextureSpec<'_>,
) -> Result<Labeled<B::Texture>, TextureCreationError> {
    let fail = |source| TextureCreationError {
        label: spec.label.to_owned(),
        source,
    };

    if spec.width == 0 || spec.height == 0 {
        return Err(fail(AllocationError::ZeroSized));
    }

    let limit = backend.limits().max_texture_dimension_2d;
    let largest = spec.width.max(spec.height);
    if largest > limit {
        return Err(fail(AllocationError::ExceedsLimit {
            requested: u64::from(largest),
            limit: u64::from(limit),
        }));
    }

    if !backend
        .format_features(spec.format)
        .allowed_usages
        .contains(spec.usage)
    {
        return Err(fail(AllocationError::UnsupportedFormat(spec.format)));
    }

    let texture = backend.create_texture(&spec.descriptor()).map_err(fail)?;
    Ok(Labeled::new(spec.label, texture))
}

/// Compiles the sources that declare `names` into one library.
///
/// Names are resolved in sorted order, so the first missing name reported is
/// deterministic. Sources that declare none of the names are not compiled.
pub fn make_program<'a, B: GpuBackend>(
    backend: &B,
    catalog: &ProgramCatalog,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<ProgramLibrary<B>, LibraryCreationError> {
    let names: BTreeSet<&str> = names.into_iter().collect();
    let index = catalog.index();

    let mut resolved = BTreeMap::new();
    for name in names {
        let Some(&(stage, source)) = index.get(name) else {
            return Err(LibraryCreationError::MissingProgram {
                library: catalog.label().to_owned(),
                name: name.to_owned(),
            });
        };
        resolved.insert(name.to_owned(), (stage, source));
    }

    // Compile each needed source once, renumbering to the compiled set.
    let needed: BTreeSet<usize> = resolved.values().map(|&(_, source)| source).collect();
    let mut modules = Vec::with_capacity(needed.len());
    let mut slot_of = BTreeMap::new();
    for source_index in needed {
        let source = &catalog.sources()[source_index];
        let module = backend
            .create_module(&source.label, &source.wgsl)
            .map_err(|source_err| LibraryCreationError::Compile {
                library: catalog.label().to_owned(),
                source_label: source.label.clone(),
                source: source_err,
            })?;
        slot_of.insert(source_index, modules.len());
        modules.push(Labeled::new(source.label.clone(), module));
    }

    let programs = resolved
        .into_iter()
        .map(|(name, (stage, source))| (name, (stage, slot_of[&source])))
        .collect();

    Ok(ProgramLibrary::new(
        catalog.label().to_owned(),
        modules,
        programs,
    ))
}

fn lookup<'l, B: GpuBackend>(
    library: &'l ProgramLibrary<B>,
    pipeline: &str,
    name: &str,
    stage: ProgramStage,
) -> Result<&'l B::Module, PipelineCreationError> {
    match library.program(name) {
        Some((module, found)) if found == stage => Ok(module),
        _ => Err(PipelineCreationError::MissingProgram {
            pipeline: pipeline.to_owned(),
            stage: stage.as_str(),
            name: name.to_owned(),
        }),
    }
}

pub fn make_render_pipeline<B: GpuBackend>(
    backend: &B,
    library: &ProgramLibrary<B>,
    spec: &RenderPipelineSpec<'_>,
) -> Result<Labeled<B::RenderPipeline>, PipelineCreationError> {
    let vertex = lookup(library, spec.label, spec.vertex, ProgramStage::Vertex)?;
    let fragment = lookup(library, spec.label, spec.fragment, ProgramStage::Fragment)?;

    let reject = |source| PipelineCreationError::Rejected {
        pipeline: spec.label.to_owned(),
        source,
    };

    if !backend
        .format_features(spec.format)
        .allowed_usages
        .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
    {
        return Err(reject(AllocationError::UnsupportedFormat(spec.format)));
    }

    let pipeline = backend
        .create_render_pipeline(spec, vertex, fragment)
        .map_err(reject)?;
    Ok(Labeled::new(spec.label, pipeline))
}

pub fn make_compute_pipeline<B: GpuBackend>(
    backend: &B,
    library: &ProgramLibrary<B>,
    spec: &ComputePipelineSpec<'_>,
) -> Result<Labeled<B::ComputePipeline>, PipelineCreationError> {
    let module = lookup(library, spec.label, spec.entry, ProgramStage::Compute)?;
    let pipeline = backend
        .create_compute_pipeline(spec, module)
        .map_err(|source| PipelineCreationError::Rejected {
            pipeline: spec.label.to_owned(),
            source,
        })?;
    Ok(Labeled::new(spec.label, pipeline))
}
