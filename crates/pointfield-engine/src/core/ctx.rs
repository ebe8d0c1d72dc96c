use winit::window::{Window, WindowId};

use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::RenderTarget;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// Per-window handles.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Acquires the surface texture, lets `draw` record into it, then submits
    /// and presents.
    ///
    /// When the surface cannot be acquired nothing is recorded or submitted,
    /// and the action taken for the surface is returned.
    pub fn present<F>(&mut self, draw: F) -> Result<(), SurfaceErrorAction>
    where
        F: FnOnce(&mut RenderTarget<'_>),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => return Err(self.gpu.handle_surface_error(err)),
        };

        // RenderTarget borrows frame.encoder; dropped before submit() takes frame.
        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(&mut target);
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);
        Ok(())
    }

    /// Presents a frame that is only cleared to `color`.
    pub fn clear(&mut self, color: wgpu::Color) -> Result<(), SurfaceErrorAction> {
        self.present(|target| target.clear(color))
    }
}
