//! GPU device + surface management.
//!
//! `Gpu` owns the wgpu objects bound to the window and hands out frames.
//! Resource code never touches it directly: it allocates through the
//! `GpuBackend` seam, which `probe` also classifies into feature tiers.

mod backend;
mod capability;
mod context;
mod init;
mod surface;

#[cfg(test)]
pub(crate) mod testing;

pub use backend::{GpuBackend, GpuTexture, WgpuBackend};
pub use capability::{probe, CapabilityReport, FILTER_FORMAT, UPSCALE_FORMAT};
pub use context::{Gpu, GpuFrame};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
