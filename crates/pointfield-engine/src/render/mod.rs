//! GPU rendering subsystem.
//!
//! `FrameRenderer` turns `RenderResources` into one frame per call:
//! simulate, draw points offscreen, optionally blur and upscale, then
//! composite onto the surface.

mod frame;
mod point;
mod target;

pub use frame::FrameRenderer;
pub use point::{spiral, Point};
pub use target::RenderTarget;
