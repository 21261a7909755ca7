use std::time::Duration;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, InitCtx, TickCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::{InputEvent, InputFrame, InputState, Key, KeyState, Modifiers};
use crate::time::{FixedTimestep, FrameClock};

use super::config::RuntimeConfig;

/// Loop-level requests made by the application during a callback.
///
/// Applied after the callback returns.
#[derive(Debug, Default)]
pub struct RuntimeCtx {
    exit_requested: bool,
    failure: Option<anyhow::Error>,
}

impl RuntimeCtx {
    /// Requests the loop to stop after the current frame.
    pub fn exit(&mut self) {
        self.exit_requested = true;
    }

    /// Stops the loop and makes [`Runtime::run`] return `err`.
    ///
    /// The first recorded failure wins.
    pub fn fail(&mut self, err: anyhow::Error) {
        self.exit_requested = true;
        if self.failure.is_none() {
            self.failure = Some(err);
        }
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub(crate) fn take_failure(&mut self) -> Option<anyhow::Error> {
        self.failure.take()
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and runs the loop until it closes.
    ///
    /// Failures while creating the window, the GPU context, or inside
    /// [`App::on_init`](crate::core::App::on_init) end the loop and are
    /// returned here.
    pub fn run<A>(config: RuntimeConfig, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut state = AppState::new(config, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    input_state: InputState,
    input_frame: InputFrame,
    clock: FrameClock,
    timestep: FixedTimestep,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    app: A,

    entry: Option<WindowEntry>,
    initialized: bool,
    exit_requested: bool,
    fatal: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, app: A) -> Self {
        Self {
            config,
            app,
            entry: None,
            initialized: false,
            exit_requested: false,
            fatal: None,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal = Some(err);
        self.request_exit(event_loop);
    }

    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let cfg = &self.config;
        let size = PhysicalSize::new(cfg.width, cfg.height);
        anyhow::ensure!(size.width > 0 && size.height > 0, "window size must be non-zero");

        let timestep = FixedTimestep::new(cfg.tick_rate_hz)
            .and_then(|t| t.with_max_ticks_per_frame(cfg.max_ticks_per_frame))
            .context("invalid tick configuration")?;

        // Hidden until the first frame can be drawn.
        let mut attrs = Window::default_attributes()
            .with_title(cfg.title.clone())
            .with_inner_size(size)
            .with_resizable(cfg.resizable)
            .with_visible(false)
            .with_active(true);

        if cfg.centered {
            match event_loop.primary_monitor() {
                Some(monitor) => {
                    attrs = attrs.with_position(centered_position(
                        monitor.position(),
                        monitor.size(),
                        size,
                    ));
                }
                None => log::debug!("no primary monitor reported; window not centred"),
            }
        }

        log::info!(
            "creating window \"{}\" ({}x{})",
            cfg.title,
            size.width,
            size.height
        );

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = GpuInit::default().vsync(cfg.vsync);

        let entry = WindowEntryTryBuilder {
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
            timestep,
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let app = &mut self.app;
        entry
            .with(|fields| {
                let mut ctx = InitCtx {
                    window: WindowCtx {
                        window: fields.window,
                    },
                    device: fields.gpu.device(),
                    queue: fields.gpu.queue(),
                    surface_format: fields.gpu.surface_format(),
                };
                app.on_init(&mut ctx)
            })
            .context("application initialization failed")?;
        self.initialized = true;

        let mut entry = entry;
        entry.with_window(|w| {
            w.set_visible(true);
            w.focus_window();
            w.request_redraw();
        });
        entry.with_clock_mut(|c| c.reset());

        self.entry = Some(entry);
        Ok(())
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.open_window(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw; v-sync paces the loop.
        if let Some(entry) = self.entry.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let (app, entry) = (&mut self.app, &mut self.entry);
        let Some(entry) = entry.as_mut() else {
            return;
        };

        let close_on_escape = self.config.close_on_escape;
        let mut close = false;
        let mut failure = None;

        if let Some(ev) = translate_input_event(&event) {
            if close_on_escape && is_escape_release(&ev) {
                log::debug!("escape released; closing window");
                close = true;
            }
            entry.with_mut(|fields| fields.input_state.apply_event(fields.input_frame, ev));
        }

        if app.on_window_event(&event) == AppControl::Exit {
            close = true;
        }

        match &event {
            WindowEvent::CloseRequested => close = true,

            WindowEvent::Resized(new_size) => {
                entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_gpu_mut(|gpu| gpu.resize(new_size));
            }

            WindowEvent::RedrawRequested if !close => match drive_frame(app, entry) {
                Ok(AppControl::Continue) => {}
                Ok(AppControl::Exit) => close = true,
                Err(err) => failure = Some(err),
            },

            _ => {}
        }

        if let Some(err) = failure {
            self.fail(event_loop, err);
        } else if close {
            self.request_exit(event_loop);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.initialized {
            self.initialized = false;
            self.app.on_exit();
        }

        if let Some(entry) = self.entry.take() {
            let frames = entry.borrow_clock().frames();
            let ticks = entry.borrow_timestep().tick_index();
            log::info!("shutting down after {frames} frames, {ticks} ticks");
        }
    }
}

/// Runs the due ticks and one frame. Per-frame input is cleared afterwards.
fn drive_frame<A: CoreApp>(app: &mut A, entry: &mut WindowEntry) -> Result<AppControl> {
    entry.with_mut(|fields| {
        let ft = fields.clock.tick();
        let mut runtime = RuntimeCtx::default();

        let control = {
            let window = fields.window;
            let gpu = &mut *fields.gpu;
            let input = &*fields.input_state;
            let input_frame = &*fields.input_frame;

            step_loop(
                app,
                input,
                input_frame,
                &mut *fields.timestep,
                ft.dt,
                &mut runtime,
                |app, runtime, alpha| {
                    log::trace!("frame {}", ft.frame_index);

                    let mut ctx = FrameCtx {
                        window: WindowCtx { window },
                        gpu,
                        input,
                        input_frame,
                        time: ft,
                        alpha,
                        runtime,
                    };
                    app.on_frame(&mut ctx)
                },
            )
        };

        fields.input_frame.clear();
        finish_step(control, &mut runtime)
    })
}

/// Feeds `dt` to the timestep and runs the due ticks in order, then `frame`
/// exactly once. A tick that exits skips the remaining ticks and the frame.
fn step_loop<A, F>(
    app: &mut A,
    input: &InputState,
    input_frame: &InputFrame,
    timestep: &mut FixedTimestep,
    dt: Duration,
    runtime: &mut RuntimeCtx,
    frame: F,
) -> AppControl
where
    A: CoreApp,
    F: FnOnce(&mut A, &mut RuntimeCtx, f32) -> AppControl,
{
    let due = timestep.advance(dt);
    let first_tick = timestep.tick_index() - u64::from(due);
    let tick_dt = timestep.interval();

    for i in 0..u64::from(due) {
        let mut ctx = TickCtx {
            input,
            input_frame,
            tick_index: first_tick + i,
            dt: tick_dt,
            runtime: &mut *runtime,
        };
        if app.on_tick(&mut ctx) == AppControl::Exit || runtime.exit_requested() {
            return AppControl::Exit;
        }
    }

    frame(app, runtime, timestep.alpha())
}

/// Folds the requests recorded during a frame into its result.
fn finish_step(control: AppControl, runtime: &mut RuntimeCtx) -> Result<AppControl> {
    if let Some(err) = runtime.take_failure() {
        return Err(err);
    }
    if runtime.exit_requested() {
        return Ok(AppControl::Exit);
    }
    Ok(control)
}

/// Top-left position that centres `window` on a monitor.
///
/// A window larger than the monitor is pinned to the monitor's origin.
pub(crate) fn centered_position(
    monitor_pos: PhysicalPosition<i32>,
    monitor_size: PhysicalSize<u32>,
    window: PhysicalSize<u32>,
) -> PhysicalPosition<i32> {
    let offset = |m: u32, w: u32| (m.saturating_sub(w) / 2) as i32;
    PhysicalPosition::new(
        monitor_pos.x + offset(monitor_size.width, window.width),
        monitor_pos.y + offset(monitor_size.height, window.height),
    )
}

fn is_escape_release(ev: &InputEvent) -> bool {
    matches!(
        ev,
        InputEvent::Key {
            key: Key::Escape,
            state: KeyState::Released,
            ..
        }
    )
}

fn translate_input_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::ModifiersChanged(m) => Some(InputEvent::ModifiersChanged(map_modifiers(m.state()))),

        WindowEvent::Focused(f) => Some(InputEvent::Focused(*f)),

        WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),

        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::PointerMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),

        WindowEvent::KeyboardInput { event, .. } => {
            let state = match event.state {
                ElementState::Pressed => KeyState::Pressed,
                ElementState::Released => KeyState::Released,
            };
            Some(InputEvent::Key {
                key: map_key(event.physical_key),
                state,
                repeat: event.repeat,
            })
        }

        _ => None,
    }
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = pk else {
        return Key::Unknown(0);
    };

    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,

        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
        KeyCode::SuperLeft | KeyCode::SuperRight => Key::Meta,

        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,

        KeyCode::Digit0 => Key::Digit0,
        KeyCode::Digit1 => Key::Digit1,
        KeyCode::Digit2 => Key::Digit2,
        KeyCode::Digit3 => Key::Digit3,
        KeyCode::Digit4 => Key::Digit4,
        KeyCode::Digit5 => Key::Digit5,
        KeyCode::Digit6 => Key::Digit6,
        KeyCode::Digit7 => Key::Digit7,
        KeyCode::Digit8 => Key::Digit8,
        KeyCode::Digit9 => Key::Digit9,

        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7,
        KeyCode::F8 => Key::F8,
        KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10,
        KeyCode::F11 => Key::F11,
        KeyCode::F12 => Key::F12,

        other => Key::Unknown(other as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: i32, y: i32) -> PhysicalPosition<i32> {
        PhysicalPosition::new(x, y)
    }

    fn size(w: u32, h: u32) -> PhysicalSize<u32> {
        PhysicalSize::new(w, h)
    }

    #[test]
    fn centres_window_on_monitor() {
        let p = centered_position(pos(0, 0), size(1920, 1080), size(1280, 720));
        assert_eq!(p, pos(320, 180));
    }

    #[test]
    fn centring_respects_monitor_origin() {
        let p = centered_position(pos(1920, -100), size(1920, 1080), size(1280, 720));
        assert_eq!(p, pos(2240, 80));
    }

    #[test]
    fn oversized_window_pins_to_origin() {
        let p = centered_position(pos(10, 20), size(800, 600), size(1280, 720));
        assert_eq!(p, pos(10, 20));
    }

    #[test]
    fn escape_maps_and_release_is_detected() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::Escape)), Key::Escape);

        let release = InputEvent::Key { key: Key::Escape, state: KeyState::Released, repeat: false };
        let press = InputEvent::Key { key: Key::Escape, state: KeyState::Pressed, repeat: false };
        assert!(is_escape_release(&release));
        assert!(!is_escape_release(&press));
    }

    #[test]
    fn unlisted_keys_are_unknown() {
        assert!(matches!(map_key(PhysicalKey::Code(KeyCode::NumLock)), Key::Unknown(_)));
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        exit_on_tick: Option<u64>,
        fail_on_tick: Option<u64>,
    }

    impl CoreApp for Recorder {
        fn on_tick(&mut self, ctx: &mut TickCtx<'_>) -> AppControl {
            self.calls.push(format!("tick {}", ctx.tick_index));
            if self.fail_on_tick == Some(ctx.tick_index) {
                ctx.runtime.fail(anyhow::anyhow!("tick {} failed", ctx.tick_index));
            }
            if self.exit_on_tick == Some(ctx.tick_index) {
                return AppControl::Exit;
            }
            AppControl::Continue
        }

        fn on_frame(&mut self, _ctx: &mut FrameCtx<'_, '_>) -> AppControl {
            AppControl::Continue
        }
    }

    fn mark_frame(app: &mut Recorder, _runtime: &mut RuntimeCtx, _alpha: f32) -> AppControl {
        app.calls.push("frame".to_string());
        AppControl::Continue
    }

    fn step(
        app: &mut Recorder,
        timestep: &mut FixedTimestep,
        dt_ms: u64,
        runtime: &mut RuntimeCtx,
    ) -> AppControl {
        let input = InputState::default();
        let input_frame = InputFrame::default();
        step_loop(
            app,
            &input,
            &input_frame,
            timestep,
            Duration::from_millis(dt_ms),
            runtime,
            mark_frame,
        )
    }

    #[test]
    fn ticks_run_before_the_single_frame() {
        let mut app = Recorder::default();
        let mut ts = FixedTimestep::default().with_max_ticks_per_frame(3).unwrap();
        let mut runtime = RuntimeCtx::default();

        assert_eq!(step(&mut app, &mut ts, 50, &mut runtime), AppControl::Continue);
        assert_eq!(step(&mut app, &mut ts, 100, &mut runtime), AppControl::Continue);
        assert_eq!(app.calls, ["tick 0", "frame", "tick 1", "tick 2", "frame"]);
    }

    #[test]
    fn frame_renders_without_due_ticks() {
        let mut app = Recorder::default();
        let mut ts = FixedTimestep::default();
        let mut runtime = RuntimeCtx::default();

        step(&mut app, &mut ts, 16, &mut runtime);
        step(&mut app, &mut ts, 16, &mut runtime);
        assert_eq!(app.calls, ["frame", "frame"]);
    }

    #[test]
    fn exiting_tick_skips_remaining_ticks_and_frame() {
        let mut app = Recorder { exit_on_tick: Some(0), ..Default::default() };
        let mut ts = FixedTimestep::default().with_max_ticks_per_frame(2).unwrap();
        let mut runtime = RuntimeCtx::default();

        assert_eq!(step(&mut app, &mut ts, 100, &mut runtime), AppControl::Exit);
        assert_eq!(app.calls, ["tick 0"]);
    }

    #[test]
    fn failing_tick_ends_step_with_error() {
        let mut app = Recorder { fail_on_tick: Some(1), ..Default::default() };
        let mut ts = FixedTimestep::default().with_max_ticks_per_frame(3).unwrap();
        let mut runtime = RuntimeCtx::default();

        let control = step(&mut app, &mut ts, 150, &mut runtime);
        assert_eq!(control, AppControl::Exit);
        assert_eq!(app.calls, ["tick 0", "tick 1"]);

        let err = finish_step(control, &mut runtime).unwrap_err();
        assert_eq!(err.to_string(), "tick 1 failed");
    }

    #[test]
    fn finish_step_reports_failure_exit_and_continue() {
        let mut runtime = RuntimeCtx::default();
        runtime.fail(anyhow::anyhow!("surface lost"));
        runtime.fail(anyhow::anyhow!("later"));
        let err = finish_step(AppControl::Exit, &mut runtime).unwrap_err();
        assert_eq!(err.to_string(), "surface lost");

        let mut runtime = RuntimeCtx::default();
        runtime.exit();
        assert_eq!(finish_step(AppControl::Continue, &mut runtime).unwrap(), AppControl::Exit);

        let mut runtime = RuntimeCtx::default();
        assert_eq!(finish_step(AppControl::Continue, &mut runtime).unwrap(), AppControl::Continue);
    }

    #[test]
    fn runtime_ctx_records_exit() {
        let mut ctx = RuntimeCtx::default();
        assert!(!ctx.exit_requested());
        ctx.exit();
        assert!(ctx.exit_requested());
    }
}
