//! State shared between the renderer and whatever drives it.
//!
//! `FrameState` is the only value crossing that boundary. It is passed
//! explicitly as an `Arc`, never reached through a global.

mod frame_state;
mod settings;

pub use frame_state::{DeviceStatus, FrameState};
pub use settings::VisualSettings;
