use arsia_engine::core::{App, AppControl, FrameCtx, InitCtx, TickCtx};
use arsia_engine::logging::{init_logging, LoggingConfig};
use arsia_engine::model::{ModelLoader, RawModel};
use arsia_engine::paint::Color;
use arsia_engine::render::ModelRenderer;
use arsia_engine::window::{Runtime, RuntimeConfig};

const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;
const WINDOW_TITLE: &str = "Arsia";

const CLEAR_COLOR: Color = Color::RED;
const QUAD_COLOR: Color = Color::WHITE;

/// Two counter-clockwise triangles forming a quad in clip space.
#[rustfmt::skip]
const QUAD_POSITIONS: [f32; 18] = [
    -0.5,  0.5, 0.0,
    -0.5, -0.5, 0.0,
     0.5, -0.5, 0.0,

     0.5, -0.5, 0.0,
     0.5,  0.5, 0.0,
    -0.5,  0.5, 0.0,
];

#[derive(Default)]
struct QuadApp {
    loader: ModelLoader,
    renderer: ModelRenderer,
    quad: Option<RawModel>,
    ticks_per_second: u64,
}

impl App for QuadApp {
    fn on_init(&mut self, ctx: &mut InitCtx<'_>) -> anyhow::Result<()> {
        let quad = self.loader.load_to_vao(ctx.device, &QUAD_POSITIONS)?;
        log::info!("quad uploaded: {} vertices", quad.vertex_count());
        self.quad = Some(quad);
        Ok(())
    }

    fn on_tick(&mut self, ctx: &mut TickCtx<'_>) -> AppControl {
        if self.ticks_per_second == 0 {
            self.ticks_per_second = (1.0 / ctx.dt.as_secs_f64()).round().max(1.0) as u64;
        }
        if ctx.tick_index % self.ticks_per_second == 0 {
            log::debug!("tick {}", ctx.tick_index);
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(quad) = self.quad else {
            return AppControl::Continue;
        };

        let (loader, renderer) = (&self.loader, &mut self.renderer);
        ctx.render(CLEAR_COLOR, |rctx, target| {
            renderer.render(rctx, target, loader, &quad, QUAD_COLOR);
        })
    }

    fn on_exit(&mut self) {
        self.quad = None;
        self.loader.clean_up();
    }
}

fn debug_enabled() -> bool {
    std::env::var("ARSIA_DEBUG").is_ok_and(|v| !v.is_empty() && v != "0")
}

fn run() -> anyhow::Result<()> {
    let config = RuntimeConfig::new(WINDOW_TITLE).size(WINDOW_WIDTH, WINDOW_HEIGHT);
    Runtime::run(config, QuadApp::default())
}

fn main() {
    init_logging(LoggingConfig::default().with_debug(debug_enabled()));

    log::info!("starting {WINDOW_TITLE}");
    if let Err(err) = run() {
        log::error!("fatal: {err:#}");
        eprintln!("{err:?}");
        std::process::exit(1);
    }
    log::info!("terminated cleanly");
}
