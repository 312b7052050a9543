use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::FrameCtx;

/// Tells the runtime whether to keep the loop alive.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// What the runtime drives. Implementations hold all application state;
/// the runtime owns the window, GPU and input plumbing.
pub trait App {
    /// Raw window event, before the runtime's own bookkeeping. Most
    /// applications rely on [`FrameCtx::input_frame`] instead.
    fn on_window_event(&mut self, _window_id: WindowId, _event: &WindowEvent) -> AppControl {
        AppControl::Continue
    }

    /// One frame: update state and draw through [`FrameCtx::render`].
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// The event loop is ending. Release anything that must go down in a
    /// deterministic order; dropping the app afterwards handles the rest.
    fn on_exit(&mut self) {}
}
