//! Time subsystem.
//!
//! - `FrameClock` measures per-frame delta time (one per window)
//! - `FixedTimestep` turns those deltas into fixed-rate logic ticks

mod fixed_timestep;
mod frame_clock;

pub use fixed_timestep::{FixedTimestep, TimestepError};
pub use frame_clock::{FrameClock, FrameTime};
