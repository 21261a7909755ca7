//! GPU rendering subsystem.
//!
//! Renderers own their GPU pipelines; vertex data comes from
//! [`ModelLoader`](crate::model::ModelLoader).

mod ctx;
mod model;

pub use ctx::{RenderCtx, RenderTarget};
pub use model::ModelRenderer;
