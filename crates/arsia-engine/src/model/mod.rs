//! Vertex data upload.
//!
//! `ModelLoader` turns flat position arrays into GPU vertex buffers and hands
//! back `RawModel`s that the renderer can draw.

mod loader;
mod raw_model;
mod upload;

pub use loader::{position_layout, ModelLoader, POSITION_ATTRIBUTES};
pub use raw_model::{ModelId, RawModel};
pub use upload::{floats_to_upload_bytes, vertex_count, ModelError, POSITION_COMPONENTS};
