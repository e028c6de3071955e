use prism_geom::Geometry;

use crate::device::{
    apply_resize, build_config, required_limits, DeviceRequest, DeviceSettings, GpuApi, GpuError,
    ResizeOutcome,
};
use crate::resources::{create_point_pipeline, limit_needs, upload_geometry, DrawCall, Scene};

use super::config::RendererConfig;
use super::frame::{FrameContext, FrameExecutor, FrameOutcome, FrameStats};
use super::startup::{stage, StartupError, StartupStage};

/// Owns every GPU object of the run, from instance to pipeline.
///
/// Handles are held as options so partial startup state can be released in
/// order. [`Renderer::shutdown`] runs on drop.
pub struct Renderer<A: GpuApi> {
    api: A,
    settings: DeviceSettings,
    clear_color: wgpu::Color,

    instance: Option<A::Instance>,
    surface: Option<A::Surface>,
    adapter: Option<A::Adapter>,
    device: Option<A::Device>,
    queue: Option<A::Queue>,
    scene: Option<Scene<A>>,

    config: Option<wgpu::SurfaceConfiguration>,
    configured: bool,
    suspended: bool,

    frames: FrameExecutor,
    shut_down: bool,
}

impl<A: GpuApi> Renderer<A> {
    fn empty(api: A, config: &RendererConfig) -> Self {
        Self {
            api,
            settings: config.device.clone(),
            clear_color: config.clear_color,
            instance: None,
            surface: None,
            adapter: None,
            device: None,
            queue: None,
            scene: None,
            config: None,
            configured: false,
            suspended: false,
            frames: FrameExecutor::new(),
            shut_down: false,
        }
    }

    /// Runs every startup stage in order and returns a renderer ready to draw.
    ///
    /// On failure, everything acquired so far is released before returning.
    pub fn start(api: A, config: &RendererConfig, geometry: &Geometry) -> Result<Self, StartupError> {
        let mut r = Self::empty(api, config);

        let instance = stage(StartupStage::CreateInstance, r.api.create_instance())?;
        let instance = r.instance.insert(instance);

        let surface = stage(StartupStage::CreateSurface, r.api.create_surface(instance))?;
        let surface = r.surface.insert(surface);

        let adapter = stage(
            StartupStage::RequestAdapter,
            r.api.request_adapter(instance, surface, &r.settings),
        )?;
        let adapter_caps = r.api.adapter_capabilities(&adapter);
        adapter_caps.log("adapter");
        let adapter = r.adapter.insert(adapter);

        r.instance = None;
        log::debug!("instance released");

        let needs = limit_needs(geometry);
        let (device, queue) = stage(
            StartupStage::RequestDevice,
            required_limits(&adapter_caps.limits, &needs).and_then(|required_limits| {
                let request = DeviceRequest {
                    label: "prism device",
                    required_features: r.settings.required_features,
                    required_limits,
                };
                r.api.request_device(adapter, &request, &r.settings)
            }),
        )?;
        r.api.device_capabilities(&device).log("device");
        let surface_caps = r.api.surface_capabilities(surface, adapter);
        let device = r.device.insert(device);
        let queue = r.queue.insert(queue);

        r.adapter = None;
        log::debug!("adapter released");

        let (width, height) = r.api.drawable_size();
        let surface_config = stage(
            StartupStage::ConfigureSurface,
            build_config(&surface_caps, &r.settings, width, height).ok_or_else(|| {
                GpuError::SurfaceAcquisition("surface reports no formats for this adapter".into())
            }),
        )?;
        if width == 0 || height == 0 {
            log::debug!("drawable is zero-sized; configuration deferred");
            r.suspended = true;
        } else {
            r.api.configure_surface(surface, device, &surface_config);
            r.configured = true;
        }
        log::info!(
            "surface: {:?} {}x{} {:?} {:?}",
            surface_config.format,
            surface_config.width,
            surface_config.height,
            surface_config.present_mode,
            surface_config.alpha_mode,
        );
        let format = surface_config.format;
        r.config = Some(surface_config);

        let shader = stage(
            StartupStage::CompileShader,
            config.shader.load().and_then(|src| {
                r.api.create_shader_module(device, &config.shader.label(), &src)
            }),
        )?;

        let pipeline = stage(
            StartupStage::CreatePipeline,
            create_point_pipeline(&mut r.api, device, &shader, format),
        )?;
        drop(shader);
        log::debug!("shader module released");

        let (vertex_buffers, index_buffer) = stage(
            StartupStage::UploadGeometry,
            upload_geometry(&mut r.api, device, queue, geometry),
        )?;

        r.scene = Some(Scene::new(
            pipeline,
            vertex_buffers,
            index_buffer,
            DrawCall::for_geometry(geometry),
        ));

        log::info!(
            "renderer ready: {} point(s), {} triangle(s)",
            geometry.point_count(),
            geometry.triangle_count()
        );
        Ok(r)
    }

    /// Applies a new drawable size before the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (Some(surface), Some(device), Some(config)) =
            (self.surface.as_ref(), self.device.as_ref(), self.config.as_mut())
        else {
            return;
        };

        match apply_resize(config, width, height) {
            ResizeOutcome::Deferred => {
                log::debug!("drawable is zero-sized; configuration deferred");
                self.suspended = true;
            }
            ResizeOutcome::Unchanged if self.configured => {
                self.suspended = false;
            }
            ResizeOutcome::Unchanged | ResizeOutcome::Reconfigure => {
                self.api.configure_surface(surface, device, config);
                self.configured = true;
                self.suspended = false;
                log::debug!("surface configured at {}x{}", config.width, config.height);
            }
        }
    }

    /// Runs one frame. `Err` means rendering must stop.
    pub fn render_frame(&mut self) -> Result<FrameOutcome, GpuError> {
        if self.suspended {
            return Ok(FrameOutcome::Suspended);
        }

        let (Some(surface), Some(device), Some(queue), Some(config), Some(scene)) = (
            self.surface.as_ref(),
            self.device.as_ref(),
            self.queue.as_ref(),
            self.config.as_ref(),
            self.scene.as_ref(),
        ) else {
            log::debug!("frame requested without a live renderer");
            return Ok(FrameOutcome::Suspended);
        };

        let ctx = FrameContext {
            surface,
            device,
            queue,
            config,
            scene,
            clear: self.clear_color,
        };
        self.frames.execute(&mut self.api, &ctx)
    }

    pub fn surface_config(&self) -> Option<&wgpu::SurfaceConfiguration> {
        self.config.as_ref()
    }

    pub fn frame_stats(&self) -> &FrameStats {
        self.frames.stats()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Releases every GPU object in reverse dependency order:
    /// buffers, pipeline, surface configuration, queue, device, surface.
    ///
    /// Idempotent; handles left over from a failed startup are released too.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        if let Some(scene) = self.scene.take() {
            scene.release_all();
        }

        if let Some(surface) = self.surface.as_ref() {
            if self.configured {
                self.api.unconfigure_surface(surface);
                self.configured = false;
            }
        }

        if self.queue.take().is_some() {
            log::debug!("queue released");
        }
        if self.device.take().is_some() {
            log::debug!("device released");
        }
        if self.adapter.take().is_some() {
            log::debug!("adapter released");
        }
        if self.surface.take().is_some() {
            log::debug!("surface released");
        }
        if self.instance.take().is_some() {
            log::debug!("instance released");
        }

        let stats = self.frames.stats();
        log::info!(
            "renderer shut down after {} presented and {} skipped frame(s)",
            stats.presented,
            stats.skipped
        );
    }
}

impl<A: GpuApi> Drop for Renderer<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
