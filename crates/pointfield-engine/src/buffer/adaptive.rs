use crate::device::GpuBackend;
use crate::error::BufferCreationError;
use crate::resources::factory;

use super::policy::{self, BufferStatus};

/// Result of one `AdaptiveBuffer::resize` call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ResizeOutcome {
    pub status: BufferStatus,
    pub previous_capacity: u64,
    pub capacity: u64,
}

impl ResizeOutcome {
    /// The buffer was replaced; its contents are undefined and must be rewritten.
    pub fn reallocated(&self) -> bool {
        self.status.reallocates()
    }
}

/// Device buffer of fixed-stride elements that follows a changing occupancy.
///
/// Grows by doubling and shrinks by halving, but only once occupancy falls
/// under a quarter of capacity and never below `minimum_floor`. The gap
/// between the two thresholds keeps occupancy that hovers around a boundary
/// from reallocating every frame.
///
/// Exactly one device buffer is owned at a time. A replaced buffer is handed
/// to [`GpuBackend::retire_buffer`]; call `resize` only at frame start, before
/// any command referencing the buffer is encoded for that frame.
pub struct AdaptiveBuffer<B: GpuBackend> {
    buffer: B::Buffer,
    label: String,
    usage: wgpu::BufferUsages,
    element_stride: u64,
    capacity: u64,
    minimum_floor: u64,
    last_observed: Option<u64>,
    status: BufferStatus,
    generation: u64,
}

impl<B: GpuBackend> AdaptiveBuffer<B> {
    /// Allocates `max(initial_count, minimum_floor / 2)` elements.
    pub fn new(
        backend: &B,
        initial_count: u64,
        minimum_floor: u64,
        element_stride: u64,
        usage: wgpu::BufferUsages,
        label: impl Into<String>,
    ) -> Result<Self, BufferCreationError> {
        let label = label.into();
        let capacity = policy::initial_capacity(initial_count, minimum_floor);
        let buffer = factory::make_buffer(backend, &label, usage, capacity, element_stride)?;

        log::debug!(
            "buffer `{label}`: {capacity} x {element_stride} bytes (floor {minimum_floor})"
        );

        Ok(Self {
            buffer,
            label,
            usage,
            element_stride,
            capacity,
            minimum_floor,
            last_observed: None,
            status: BufferStatus::Invalid,
            generation: 0,
        })
    }

    /// Re-sizes the buffer for `requested` elements.
    ///
    /// On error the previous buffer, capacity and observed count are kept, so
    /// the same request is re-evaluated next time. Callers must abort the
    /// current frame rather than draw with the stale buffer.
    pub fn resize(
        &mut self,
        backend: &B,
        requested: u64,
    ) -> Result<ResizeOutcome, BufferCreationError> {
        let previous_capacity = self.capacity;
        let status = policy::classify(
            requested,
            self.last_observed,
            self.capacity,
            self.minimum_floor,
        );
        let target = policy::target_capacity(status, self.capacity, requested);

        if status.reallocates() {
            let replacement =
                factory::make_buffer(backend, &self.label, self.usage, target, self.element_stride)?;
            let retired = std::mem::replace(&mut self.buffer, replacement);
            backend.retire_buffer(retired);

            self.capacity = target;
            self.generation += 1;
            log::debug!(
                "buffer `{}` {:?}: {} -> {} elements for {} requested",
                self.label,
                status,
                previous_capacity,
                target,
                requested
            );
        }

        self.last_observed = Some(requested);
        self.status = status;

        Ok(ResizeOutcome {
            status,
            previous_capacity,
            capacity: self.capacity,
        })
    }

    pub fn buffer(&self) -> &B::Buffer {
        &self.buffer
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn status(&self) -> BufferStatus {
        self.status
    }

    /// Capacity in elements.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn minimum_floor(&self) -> u64 {
        self.minimum_floor
    }

    pub fn element_stride(&self) -> u64 {
        self.element_stride
    }

    pub fn byte_len(&self) -> u64 {
        self.capacity * self.element_stride
    }

    pub fn last_observed(&self) -> Option<u64> {
        self.last_observed
    }

    /// Bumped on every reallocation; bindings built from an older generation
    /// reference a retired buffer.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
