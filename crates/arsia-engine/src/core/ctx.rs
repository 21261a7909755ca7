use std::time::Duration;

use winit::window::Window;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::input::{InputFrame, InputState};
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// The game window.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

/// Context for [`App::on_init`](super::App::on_init).
pub struct InitCtx<'a> {
    pub window: WindowCtx<'a>,
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
}

/// Context for [`App::on_tick`](super::App::on_tick).
pub struct TickCtx<'a> {
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    /// Index of this tick, starting at 0.
    pub tick_index: u64,
    /// Fixed simulated time step.
    pub dt: Duration,
    pub runtime: &'a mut RuntimeCtx,
}

/// Context for [`App::on_frame`](super::App::on_frame).
///
/// `'w` is the window borrow carried by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
    /// Progress towards the next tick in `[0, 1]`, for interpolation.
    pub alpha: f32,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Clears the surface with `clear`, calls `draw` with a ready
    /// [`RenderCtx`] and [`RenderTarget`], then presents the frame.
    ///
    /// Transient surface errors skip the frame. A fatal one is recorded on the
    /// runtime, so the loop stops and `Runtime::run` returns it as an error.
    pub fn render<F>(&mut self, clear: Color, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let detail = err.to_string();
                let action = self.gpu.handle_surface_error(err);
                return resolve_surface_error(action, &detail, self.runtime);
            }
        };

        // Clear pass, dropped before the encoder is reused.
        {
            let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("arsia clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
        );

        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(&rctx, &mut target);
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        AppControl::Continue
    }
}

/// Turns a surface error action into loop control. `Fatal` records an error on
/// `runtime`.
pub(crate) fn resolve_surface_error(
    action: SurfaceErrorAction,
    detail: &str,
    runtime: &mut RuntimeCtx,
) -> AppControl {
    match action {
        SurfaceErrorAction::Fatal => {
            runtime.fail(anyhow::anyhow!("surface lost beyond recovery: {detail}"));
            AppControl::Exit
        }
        SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => AppControl::Continue,
    }
}
