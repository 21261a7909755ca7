use winit::event::WindowEvent;

use super::ctx::{FrameCtx, InitCtx, TickCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
///
/// Per frame the runtime calls `on_tick` zero or more times (fixed rate),
/// then `on_frame` exactly once.
pub trait App {
    /// Called once after the GPU context exists and before the window is shown.
    /// An error aborts the runtime.
    fn on_init(&mut self, ctx: &mut InitCtx<'_>) -> anyhow::Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called for every raw window event.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Fixed-rate game logic.
    fn on_tick(&mut self, ctx: &mut TickCtx<'_>) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once before the window and GPU context are torn down.
    fn on_exit(&mut self) {}
}
