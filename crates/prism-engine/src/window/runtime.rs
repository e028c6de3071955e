use anyhow::{Context, Result};
use ouroboros::self_referencing;
use prism_geom::Geometry;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::device::WgpuApi;
use crate::render::{FrameOutcome, Renderer, RendererConfig};

/// Opens the demo window and keeps drawing into it.
pub struct Runtime;

impl Runtime {
    /// Opens the window, starts the renderer and draws until the window closes.
    ///
    /// Returns an error when startup fails or a frame fails fatally; in both
    /// cases GPU state has already been released.
    pub fn run(config: RendererConfig, geometry: Geometry) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, geometry);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[not_covariant]
    renderer: Renderer<WgpuApi<'this>>,
}

struct AppState {
    config: RendererConfig,
    geometry: Geometry,

    entry: Option<WindowEntry>,
    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl AppState {
    fn new(config: RendererConfig, geometry: Geometry) -> Self {
        Self {
            config,
            geometry,
            entry: None,
            failure: None,
            exit_requested: false,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowId> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height))
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;
        let id = window.id();

        let (config, geometry) = (&self.config, &self.geometry);
        let entry = WindowEntryTryBuilder {
            window,
            renderer_builder: |w| {
                Renderer::start(WgpuApi::new(w, config.device.wait), config, geometry)
            },
        }
        .try_build()
        .context("renderer startup failed")?;

        self.entry = Some(entry);
        Ok(id)
    }

    /// Records the first fatal error and stops the loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.failure.get_or_insert(error);
        self.close_window();
        self.request_exit(event_loop);
    }

    /// Shuts the renderer down, then destroys the window.
    fn close_window(&mut self) {
        if let Some(mut entry) = self.entry.take() {
            entry.with_renderer_mut(|r| r.shutdown());
            drop(entry);
            log::info!("window closed");
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        match self.create_window_entry(event_loop) {
            Ok(_) => {
                if let Some(entry) = &self.entry {
                    entry.with_window(|w| w.request_redraw());
                }
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(entry) = &self.entry {
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

        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.close_window();
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                entry.with_renderer_mut(|r| r.resize(new_size.width, new_size.height));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                entry.with_renderer_mut(|r| r.resize(new_size.width, new_size.height));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => {
                entry.with_window(|w| w.pre_present_notify());
                match entry.with_renderer_mut(|r| r.render_frame()) {
                    Ok(FrameOutcome::Presented | FrameOutcome::Suspended) => {}
                    Ok(FrameOutcome::Skipped(status)) => {
                        log::trace!("frame skipped: {status}");
                    }
                    Err(e) => {
                        self.fail(event_loop, anyhow::Error::new(e).context("rendering stopped"));
                    }
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.close_window();
    }
}
