//! Declarative descriptions of device objects and the factory that builds them.

mod descriptors;
pub mod factory;
mod library;

pub use descriptors::{ComputePipelineSpec, Labeled, RenderPipelineSpec, TextureSpec};
pub use library::{ProgramCatalog, ProgramLibrary, ProgramSource, ProgramStage};
