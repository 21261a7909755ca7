//! GPU device + surface management.
//!
//! - creates the wgpu Instance/Adapter/Device/Queue
//! - creates and configures the Surface (swapchain)
//! - acquires frames and provides encoders/views for rendering

mod gpu;

#[cfg(test)]
pub(crate) use gpu::map_surface_error;
pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
