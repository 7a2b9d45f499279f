use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::{LifeConfig, StepBackend},
    gfx::{context::GraphicsContext, geometry::GridLineMesh, renderer::FrameRenderer},
    simulation::{
        cpu::CpuStepEngine,
        gpu::GpuStepEngine,
        manager::SimulationManager,
        traits::StepEngine,
    },
};

const TITLE_REFRESH: Duration = Duration::from_millis(500);

pub struct LifeApp {
    config: LifeConfig,
}

/// Everything created once the event loop hands us a window
struct Session {
    window: Arc<Window>,
    context: GraphicsContext,
    renderer: FrameRenderer,
    simulation: SimulationManager,
    last_frame: Instant,
    last_title: Instant,
}

struct AppState {
    config: LifeConfig,
    session: Option<Session>,
    fatal: Option<anyhow::Error>,
}

impl LifeApp {
    pub fn new(config: LifeConfig) -> Self {
        Self { config }
    }

    /// Runs the event loop until the window closes
    pub fn run(self) -> anyhow::Result<()> {
        self.config.validate().context("Invalid configuration")?;

        let event_loop = EventLoop::new().context("Failed to create event loop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut state = AppState {
            config: self.config,
            session: None,
            fatal: None,
        };
        event_loop
            .run_app(&mut state)
            .context("Event loop terminated abnormally")?;

        match state.fatal.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Session {
    fn start(config: &LifeConfig, event_loop: &ActiveEventLoop) -> anyhow::Result<Self> {
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(config.title.as_str())
                    .with_inner_size(LogicalSize::new(config.window_width, config.window_height)),
            )
            .context("Failed to create window")?;
        let window = Arc::new(window);

        let (width, height) = window.inner_size().into();
        let context = pollster::block_on(GraphicsContext::new(window.clone(), width, height))
            .context("Failed to initialise graphics")?;

        let size = config.grid_size()?;
        let engine: Box<dyn StepEngine> = match config.backend {
            StepBackend::Gpu => Box::new(
                GpuStepEngine::new(context.gpu(), size, config.rule, config.neighborhood)
                    .context("Failed to create the GPU step engine")?,
            ),
            StepBackend::Cpu => Box::new(CpuStepEngine::new(config.rule, config.neighborhood)),
        };
        info!(
            "Rule {} with {:?} neighborhood on the {} backend",
            config.rule, config.neighborhood, config.backend
        );

        let simulation = SimulationManager::from_config(config, engine)?;
        let grid = GridLineMesh::build(size);
        let renderer = FrameRenderer::new(&context, &grid, config.palette)
            .context("Failed to create the frame renderer")?;

        let now = Instant::now();
        Ok(Self {
            window,
            context,
            renderer,
            simulation,
            last_frame: now,
            last_title: now,
        })
    }

    fn handle_key(&mut self, key_code: KeyCode) {
        match key_code {
            KeyCode::Space => self.simulation.toggle_running(),
            KeyCode::KeyN | KeyCode::ArrowRight => self.simulation.request_single_step(),
            KeyCode::KeyR => {
                if let Err(e) = self.simulation.reset() {
                    warn!("Reset failed: {e}");
                }
            }
            KeyCode::ArrowUp => self.simulation.double_rate(),
            KeyCode::ArrowDown => self.simulation.halve_rate(),
            _ => (),
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.context.resize(width, height);
        self.renderer.resize(self.context.queue(), width, height);
    }

    /// Step if due, upload the new mesh, draw
    fn redraw(&mut self, config: &LifeConfig) -> anyhow::Result<()> {
        let now = Instant::now();
        let delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        // On a failed step the previous mesh stays on screen
        self.simulation.tick(delta_time);

        if let Some(mesh) = self.simulation.take_mesh_update() {
            self.renderer
                .upload_cells(self.context.queue(), mesh)
                .context("Failed to upload live cells")?;
        }

        self.renderer
            .render(&mut self.context)
            .context("Failed to render frame")?;

        if now.duration_since(self.last_title) >= TITLE_REFRESH {
            self.last_title = now;
            self.window.set_title(&format!(
                "{} | {} | generation {} | {} alive | {} gen/s{}",
                config.title,
                self.simulation.engine_name(),
                self.simulation.generation(),
                self.simulation.live_count(),
                self.simulation.rate(),
                if self.simulation.is_running() {
                    ""
                } else {
                    " | paused"
                }
            ));
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.simulation.drain();
        self.context.gpu().wait_idle();
    }
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!("{e:#}");
        if let Some(mut session) = self.session.take() {
            session.shutdown();
        }
        self.fatal = Some(e);
        event_loop.exit();
    }

    fn quit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut session) = self.session.take() {
            session.shutdown();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }

        match Session::start(&self.config, event_loop) {
            Ok(session) => self.session = Some(session),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if key_code == KeyCode::Escape {
                    self.quit(event_loop);
                } else {
                    session.handle_key(key_code);
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                session.resize(width, height);
            }
            WindowEvent::CloseRequested => {
                self.quit(event_loop);
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = session.redraw(&self.config) {
                    self.fail(event_loop, e);
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = self.session.as_ref() {
            session.window.request_redraw();
        }
    }
}
