//! Engine-facing contracts between the runtime loop and the game.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, InitCtx, TickCtx, WindowCtx};
