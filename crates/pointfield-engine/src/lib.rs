//! Pointfield engine crate.
//!
//! GPU resource lifecycle for an interactive point-field visualization:
//! capability probing, fail-fast pipeline initialization, an adaptively
//! sized point buffer, and the window/GPU runtime that drives them.

pub mod buffer;
pub mod core;
pub mod device;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod resources;
pub mod state;
pub mod time;
pub mod window;
