//! Window + runtime loop.
//!
//! Owns the `winit` event loop and the single game window, and drives the
//! fixed-rate tick / per-frame render cycle.

mod config;
mod runtime;

pub use config::RuntimeConfig;
pub use runtime::{Runtime, RuntimeCtx};
