//! Color values used for clearing and tinting.

mod color;

pub use color::Color;
