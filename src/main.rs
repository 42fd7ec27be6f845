use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use tile_relay::cli::Cli;
use tile_relay::core::{DrivePhase, FrameClock, Orchestrator, ViewControls};
use tile_relay::input_adapter::WinitController;
use tile_relay::present::Presenter;
use tile_relay::scenes::OrbitRenderer;
use tile_relay::RelayConfig;

// === Constants ===

const INITIAL_WINDOW_WIDTH: u32 = 800;
const INITIAL_WINDOW_HEIGHT: u32 = 600;
/// How often to poll for tiles while a frame is in flight
const POLL_INTERVAL: Duration = Duration::from_millis(2);
const HEADLESS_FRAME_TIMEOUT: Duration = Duration::from_secs(30);

// === Application ===

struct App {
    relay: Orchestrator,
    controls: ViewControls,
    input: WinitController,
    clock: FrameClock,
    last_update: Duration,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
}

impl App {
    fn new(config: &RelayConfig) -> Result<Self> {
        let relay = Orchestrator::new(config, OrbitRenderer)?;
        Ok(Self {
            relay,
            controls: ViewControls::new(config.view, (INITIAL_WINDOW_WIDTH, INITIAL_WINDOW_HEIGHT)),
            input: WinitController::new(),
            clock: FrameClock::new(),
            last_update: Duration::ZERO,
            window: None,
            presenter: None,
        })
    }

    fn update_title(&self) {
        let Some(window) = &self.window else {
            return;
        };
        let timing = match self.relay.last_frame_time_ms() {
            Some(ms) => format!("{ms:.1} ms"),
            None => "--".to_string(),
        };
        let state = if self.relay.drive_state().is_animating {
            "playing"
        } else {
            "paused"
        };
        let (width, height) = self.relay.visible_dimensions();
        window.set_title(&format!("Tile Relay - {timing} - {width}x{height} - {state}"));
    }

    fn present(&mut self) {
        let Some(presenter) = &mut self.presenter else {
            return;
        };
        let (width, height) = self.relay.visible_dimensions();
        if let Err(e) = presenter.present(self.relay.visible_pixels(), width, height) {
            error!("present failed: {e}");
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title("Tile Relay")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    INITIAL_WINDOW_WIDTH,
                    INITIAL_WINDOW_HEIGHT,
                )),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let presenter = match Presenter::new(window.clone()) {
            Ok(p) => p,
            Err(e) => {
                error!("failed to initialize presenter: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.controls.set_viewport(size.width, size.height);
        self.window = Some(window);
        self.presenter = Some(presenter);
        self.update_title();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match &event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.present();
                return;
            }
            _ => {}
        }

        for input in self.input.process_event(&event, &mut self.controls) {
            self.relay.handle(input);
        }
        self.update_title();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.clock.now();
        let dt = now.saturating_sub(self.last_update).as_secs_f32();
        self.last_update = now;

        if let Some(input) = self.input.update(dt, &mut self.controls) {
            self.relay.handle(input);
        }

        match self.relay.tick(now, &self.controls) {
            Ok(report) => {
                if report.completed.is_some() {
                    self.update_title();
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            Err(e) => warn!("tick failed: {e}"),
        }

        let idle = self.relay.phase() == DrivePhase::Idle && !self.input.is_interacting();
        event_loop.set_control_flow(if idle {
            ControlFlow::Wait
        } else {
            ControlFlow::WaitUntil(Instant::now() + POLL_INTERVAL)
        });
    }
}

// === Headless ===

fn run_headless(cli: &Cli, config: &RelayConfig) -> Result<()> {
    let mut relay = Orchestrator::new(config, OrbitRenderer)?;
    let controls = ViewControls::new(config.view, (cli.width, cli.height));
    let clock = FrameClock::new();

    info!(
        "headless: up to {} frames at {}x{} viewport",
        cli.frames, cli.width, cli.height
    );

    let mut total = Duration::ZERO;
    while relay.frames_published() < cli.frames {
        let report = relay.tick(clock.now(), &controls)?;
        if report.dispatched.is_none() && relay.phase() == DrivePhase::Idle {
            info!("paused and idle, stopping");
            break;
        }

        let Some(stats) = relay.wait_for_frame(HEADLESS_FRAME_TIMEOUT) else {
            bail!("timed out waiting for frame {}", relay.frames_published() + 1);
        };
        total += stats.elapsed;
        info!(
            "frame {:>4}  {}x{}  {:8.2} ms  t={:.3}s",
            stats.number,
            stats.width,
            stats.height,
            stats.elapsed_ms(),
            stats.animation_time
        );
    }

    let frames = relay.frames_published();
    if frames > 0 {
        println!(
            "{} frames, mean {:.2} ms, {} dropped tile results",
            frames,
            total.as_secs_f64() * 1000.0 / frames as f64,
            relay.dropped_results()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = cli.resolve_config().context("failed to load configuration")?;

    if cli.headless {
        return run_headless(&cli, &config);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(&config)?;

    info!("Tile Relay - Controls: WASD/R/F move, arrows or drag rotate, Z/X fov, +/- resolution, M supersampling, P/Space play, Escape quit");
    event_loop.run_app(&mut app)?;

    Ok(())
}
