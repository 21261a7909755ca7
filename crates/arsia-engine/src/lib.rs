//! Arsia engine crate.
//!
//! Window runtime, GPU context, fixed-rate game loop, and vertex upload used
//! by the `arsia` binary.

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod model;
pub mod paint;
pub mod render;
pub mod time;
pub mod window;
