//! GPU/window context of the running game and the handles given to user code.
//!
//! [`Context`] owns the surface and device of the host loop. User code never
//! sees it directly: it gets a [`GameHandle`], which exposes the runtime knobs
//! (clear colour, fullscreen, exit) and, once the window exists, the device and
//! queue through [`GraphicsHandle`].

use std::{
    cell::{Cell, OnceCell},
    rc::Rc,
    sync::Arc,
};

use anyhow::Context as _;
use winit::window::Window;

use crate::data_structures::{color::Color, texture::Size};

/// Device, queue and surface format of the running game.
///
/// Device and queue are reference counted internally, so cloning is cheap.
#[derive(Debug, Clone)]
pub struct Graphics {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub format: wgpu::TextureFormat,
}

/// Slot that holds the [`Graphics`] once the host created them.
#[derive(Debug, Clone, Default)]
pub struct GraphicsHandle {
    slot: Rc<OnceCell<Graphics>>,
}

impl GraphicsHandle {
    pub fn get(&self) -> Option<&Graphics> {
        self.slot.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Store the graphics. Only the first call has an effect.
    pub(crate) fn publish(&self, graphics: Graphics) -> bool {
        self.slot.set(graphics).is_ok()
    }
}

#[derive(Debug)]
struct Shared {
    graphics: GraphicsHandle,
    clear_colour: Cell<Color>,
    window_size: Cell<Size>,
    window_size_request: Cell<Option<Size>>,
    fullscreen: Cell<bool>,
    fullscreen_request: Cell<Option<bool>>,
    exit_requested: Cell<bool>,
}

/// Runtime controls of a [`Game`](crate::flow::Game), cheap to clone into
/// subscriber closures.
#[derive(Debug, Clone)]
pub struct GameHandle {
    shared: Rc<Shared>,
}

impl GameHandle {
    pub(crate) fn new(clear_colour: Color, window_size: Size) -> Self {
        Self {
            shared: Rc::new(Shared {
                graphics: GraphicsHandle::default(),
                clear_colour: Cell::new(clear_colour),
                window_size: Cell::new(window_size),
                window_size_request: Cell::new(None),
                fullscreen: Cell::new(false),
                fullscreen_request: Cell::new(None),
                exit_requested: Cell::new(false),
            }),
        }
    }

    pub fn graphics(&self) -> &GraphicsHandle {
        &self.shared.graphics
    }

    /// Colour the frame is cleared to before the draw subscribers run.
    pub fn clear_colour(&self) -> Color {
        self.shared.clear_colour.get()
    }

    pub fn set_clear_colour(&self, colour: Color) {
        self.shared.clear_colour.set(colour);
    }

    /// Inner size of the window in physical pixels, or the pending request.
    pub fn window_size(&self) -> Size {
        self.shared
            .window_size_request
            .get()
            .unwrap_or(self.shared.window_size.get())
    }

    /// Ask for a new inner window size. Applied on the next update; the
    /// platform may pick a different size, reported through resize.
    pub fn set_window_size(&self, size: Size) {
        self.shared.window_size_request.set(Some(size));
    }

    pub(crate) fn take_window_size_request(&self) -> Option<Size> {
        self.shared.window_size_request.take()
    }

    /// Record the size the window actually has.
    pub(crate) fn record_window_size(&self, size: Size) {
        self.shared.window_size.set(size);
    }

    pub fn fullscreen(&self) -> bool {
        self.shared
            .fullscreen_request
            .get()
            .unwrap_or(self.shared.fullscreen.get())
    }

    /// Switch to borderless fullscreen or back. Applied on the next update.
    pub fn set_fullscreen(&self, fullscreen: bool) {
        self.shared.fullscreen_request.set(Some(fullscreen));
    }

    pub(crate) fn take_fullscreen_request(&self) -> Option<bool> {
        let request = self.shared.fullscreen_request.take();
        if let Some(fullscreen) = request {
            self.shared.fullscreen.set(fullscreen);
        }
        request
    }

    /// Ask the loop to stop after the current phase. Unload fires before the
    /// loop ends.
    pub fn exit(&self) {
        self.shared.exit_requested.set(true);
    }

    pub fn exit_requested(&self) -> bool {
        self.shared.exit_requested.get()
    }
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl Context {
    pub async fn new(window: Arc<Window>, vsync: bool) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating the window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter fits the window surface")?;
        log::debug!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await
            .context("requesting the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are uploaded as sRGB bytes, prefer a surface that matches.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no texture formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
        })
    }

    pub fn graphics(&self) -> Graphics {
        Graphics {
            device: self.device.clone(),
            queue: self.queue.clone(),
            format: self.config.format,
        }
    }

    /// Apply a new surface size. Zero sizes (minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        true
    }

    /// Acquire the next surface texture and clear it to `clear_colour`.
    pub fn begin_frame(
        &self,
        clear_colour: Color,
    ) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clear Encoder"),
            });
        {
            let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_colour.into()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(output)
    }

    pub fn present(&self, frame: wgpu::SurfaceTexture) {
        self.window.pre_present_notify();
        frame.present();
    }
}
