//! Host game loop.
//!
//! [`Game`] owns a `winit` event loop and a `wgpu` surface and drives a
//! [`LifecycleHub`]. User code subscribes to the hub and controls the game
//! through a [`GameHandle`]; it never implements a trait of its own.
//!
//! # Lifecycle Flow
//!
//! 1. The window and GPU context are created, the device is published on the
//!    [`GraphicsHandle`](crate::context::GraphicsHandle).
//! 2. `initialize` fires once; the base step configures the surface.
//! 3. Every redraw:
//!    1. the frame clock ticks and `update` fires with the new [`GameTime`];
//!       the base step applies size and fullscreen requests and refreshes
//!       the title,
//!    2. the next surface texture is acquired and cleared to the clear colour,
//!    3. `draw` fires; the base step presents the frame.
//! 4. When the window changes size, `resize` fires with the new size; the base
//!    step reconfigures the surface.
//! 5. An exit request through [`GameHandle::exit`] or closing the window fires
//!    `unload` once and ends the loop. A subscriber error ends the loop without
//!    unloading and is returned from [`Game::run`].

use std::{rc::Rc, sync::Arc};

use anyhow::{Result, anyhow};
use instant::Instant;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Fullscreen, Window},
};

use crate::{
    config::GameConfig,
    context::{Context, GameHandle},
    data_structures::texture::Size,
    lifecycle::{HostEngine, LifecycleHub},
    time::{FrameClock, GameTime},
};

/// A window plus game loop that fires the hub's events.
pub struct Game {
    config: GameConfig,
    hub: Rc<LifecycleHub>,
    handle: GameHandle,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let handle = GameHandle::new(
            config.clear_colour,
            Size::new(config.width, config.height),
        );
        Self {
            config,
            hub: Rc::new(LifecycleHub::new()),
            handle,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The hub to subscribe to. Clone the `Rc` (or downgrade it) to reach the
    /// hub from inside subscribers.
    pub fn hub(&self) -> &Rc<LifecycleHub> {
        &self.hub
    }

    pub fn handle(&self) -> GameHandle {
        self.handle.clone()
    }

    /// Open the window and run until exit. Blocks the calling thread.
    pub fn run(self) -> Result<()> {
        self.config.validate()?;

        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };

        #[cfg(all(feature = "integration-tests", target_os = "linux"))]
        let event_loop: EventLoop<()> = {
            use winit::platform::wayland::EventLoopBuilderExtWayland;

            winit::event_loop::EventLoop::builder()
                .with_any_thread(true)
                .build()?
        };

        #[cfg(all(feature = "integration-tests", target_os = "windows"))]
        let event_loop: EventLoop<()> = {
            use winit::platform::windows::EventLoopBuilderExtWindows;

            winit::event_loop::EventLoop::builder()
                .with_any_thread(true)
                .build()?
        };

        #[cfg(not(all(
            feature = "integration-tests",
            any(target_os = "linux", target_os = "windows")
        )))]
        let event_loop: EventLoop<()> = EventLoop::new()?;

        if self.config.show_credits {
            log::info!("Hey there, from {}!", self.config.title);
        }

        let mut app = App::new(self)?;
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Live GPU state plus the frame being drawn.
struct AppState {
    ctx: Context,
    frame: Option<wgpu::SurfaceTexture>,
    is_surface_configured: bool,
}

impl AppState {
    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }
}

/// The engine's own step for each phase, run after the subscribers.
struct EngineBase<'a> {
    state: &'a mut AppState,
    handle: &'a GameHandle,
    config: &'a GameConfig,
    clock: &'a FrameClock,
    title_refreshed_ms: &'a mut u128,
}

impl EngineBase<'_> {
    /// Acquire and clear the next frame. `false` when there is nothing to
    /// draw on this tick.
    fn begin_frame(&mut self) -> Result<bool> {
        if !self.state.is_surface_configured {
            return Ok(false);
        }
        match self.state.ctx.begin_frame(self.handle.clear_colour()) {
            Ok(frame) => {
                self.state.frame = Some(frame);
                Ok(true)
            }
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.state.ctx.window.inner_size();
                self.state.resize(size.width, size.height);
                Ok(false)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, skipping frame");
                Ok(false)
            }
            Err(e) => Err(anyhow!("unable to acquire a frame: {}", e)),
        }
    }

    fn window_title(&self) -> String {
        if self.config.show_credits {
            format!("{} - FPS: {}", self.config.title, self.clock.fps())
        } else {
            self.config.title.clone()
        }
    }
}

impl HostEngine for EngineBase<'_> {
    fn initialize(&mut self) -> Result<()> {
        let size = self.state.ctx.window.inner_size();
        self.state.resize(size.width, size.height);
        self.handle
            .record_window_size(Size::new(size.width, size.height));
        self.state.ctx.window.set_title(&self.window_title());
        log::debug!("surface configured at {}x{}", size.width, size.height);
        Ok(())
    }

    fn update(&mut self, _time: &GameTime) -> Result<()> {
        if let Some(size) = self.handle.take_window_size_request() {
            let requested = PhysicalSize::new(size.width, size.height);
            // Some platforms apply the size right away and send no resize event.
            if let Some(applied) = self.state.ctx.window.request_inner_size(requested) {
                self.state.resize(applied.width, applied.height);
                self.handle
                    .record_window_size(Size::new(applied.width, applied.height));
            }
        }
        if let Some(fullscreen) = self.handle.take_fullscreen_request() {
            self.state.ctx.window.set_fullscreen(if fullscreen {
                Some(Fullscreen::Borderless(None))
            } else {
                None
            });
        }
        let elapsed_ms = self.clock.elapsed_milliseconds();
        if elapsed_ms.saturating_sub(*self.title_refreshed_ms) > 1000 {
            *self.title_refreshed_ms = elapsed_ms;
            self.state.ctx.window.set_title(&self.window_title());
        }
        Ok(())
    }

    fn draw(&mut self, _time: &GameTime) -> Result<()> {
        if let Some(frame) = self.state.frame.take() {
            self.state.ctx.present(frame);
        }
        Ok(())
    }

    fn resize(&mut self, size: Size) -> Result<()> {
        self.state.resize(size.width, size.height);
        Ok(())
    }

    fn unload(&mut self) -> Result<()> {
        // An acquired frame must not outlive the surface.
        self.state.frame = None;
        log::debug!("unloaded");
        Ok(())
    }
}

struct App {
    async_runtime: tokio::runtime::Runtime,
    config: GameConfig,
    hub: Rc<LifecycleHub>,
    handle: GameHandle,
    state: Option<AppState>,
    clock: FrameClock,
    title_refreshed_ms: u128,
    unloaded: bool,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(game: Game) -> Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Builder::new_current_thread().build()?,
            config: game.config,
            hub: game.hub,
            handle: game.handle,
            state: None,
            clock: FrameClock::default(),
            title_refreshed_ms: 0,
            unloaded: false,
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("stopping the game loop: {:#}", err);
        self.error = Some(err);
        event_loop.exit();
    }

    /// Fire unload (once) and stop the event loop.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if !self.unloaded {
            self.unloaded = true;
            let result = match self.base() {
                Some((hub, mut base)) => hub.unload(&mut base),
                None => Ok(()),
            };
            if let Err(e) = result {
                return self.fail(event_loop, e);
            }
        }
        event_loop.exit();
    }

    fn create_state(&mut self, event_loop: &ActiveEventLoop) -> Result<AppState> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(self.config.resizable);
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let ctx = self
            .async_runtime
            .block_on(Context::new(window, self.config.vsync))?;

        Ok(AppState {
            ctx,
            frame: None,
            is_surface_configured: false,
        })
    }

    fn base<'a>(&'a mut self) -> Option<(Rc<LifecycleHub>, EngineBase<'a>)> {
        let state = self.state.as_mut()?;
        Some((
            Rc::clone(&self.hub),
            EngineBase {
                state,
                handle: &self.handle,
                config: &self.config,
                clock: &self.clock,
                title_refreshed_ms: &mut self.title_refreshed_ms,
            },
        ))
    }

    fn frame(&mut self) -> Result<()> {
        let time = self.clock.tick(Instant::now());
        let Some((hub, mut base)) = self.base() else {
            return Ok(());
        };
        hub.update(&time, &mut base)?;
        if base.handle.exit_requested() {
            return Ok(());
        }
        if base.begin_frame()? {
            hub.draw(&time, &mut base)?;
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Resumed is delivered again after a suspend; the hub initializes once.
        if self.state.is_some() {
            return;
        }
        let state = match self.create_state(event_loop) {
            Ok(state) => state,
            Err(e) => return self.fail(event_loop, e),
        };
        self.handle.graphics().publish(state.ctx.graphics());
        self.state = Some(state);
        self.clock = FrameClock::default();

        let result = match self.base() {
            Some((hub, mut base)) => hub.initialize(&mut base),
            None => Ok(()),
        };
        if let Err(e) = result {
            return self.fail(event_loop, e);
        }
        if self.handle.exit_requested() {
            log::info!("exit requested during initialize");
            return self.shutdown(event_loop);
        }
        if let Some(state) = &self.state {
            state.ctx.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if self.state.is_none() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                let size = Size::new(size.width, size.height);
                self.handle.record_window_size(size);
                let result = match self.base() {
                    Some((hub, mut base)) => hub.resize(size, &mut base),
                    None => Ok(()),
                };
                if let Err(e) = result {
                    return self.fail(event_loop, e);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.frame() {
                    return self.fail(event_loop, e);
                }
                if self.handle.exit_requested() {
                    log::info!("exit requested");
                    self.shutdown(event_loop);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &self.state else {
            return;
        };
        match self.config.target_frame_time() {
            Some(step) => {
                let next = self.clock.last_time() + step;
                if Instant::now() >= next {
                    event_loop.set_control_flow(ControlFlow::Poll);
                    state.ctx.window.request_redraw();
                } else {
                    event_loop.set_control_flow(ControlFlow::WaitUntil(next));
                }
            }
            None => state.ctx.window.request_redraw(),
        }
    }
}
