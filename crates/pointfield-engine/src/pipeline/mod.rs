//! Startup preparation of every device resource the renderer needs.
//!
//! Initialization runs once per device. Re-initialization (for example after
//! a device loss) means building a new `PipelineInitializer` and calling
//! `initialize` again; the previous `RenderResources` is dropped as a whole.

mod initializer;
pub mod programs;
mod resources;

pub use initializer::{InitConfig, InitStep, PipelineInitializer};
pub use resources::{OffscreenPass, PipelineSet, RenderResources, RenderTargets, Upscaler};
