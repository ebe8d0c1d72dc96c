//! Device buffers that follow a changing element count.

mod adaptive;
mod policy;

pub use adaptive::{AdaptiveBuffer, ResizeOutcome};
pub use policy::BufferStatus;
