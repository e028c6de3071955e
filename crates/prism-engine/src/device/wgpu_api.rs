use std::ops::Range;
use std::sync::{Arc, Mutex};

use winit::window::Window;

use super::api::{BufferDesc, DeviceRequest, GpuApi, PipelineDesc};
use super::bridge::{self, WaitPolicy};
use super::error::{GpuError, SurfaceStatus};
use super::init::DeviceSettings;
use super::inspect::Capabilities;

/// The swapchain texture acquired for one frame and the view the pass renders into.
///
/// The next frame cannot be acquired until this one is presented.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

/// Device errors that escaped every error scope, in arrival order.
///
/// The uncaptured-error handler may run on a driver thread; it only appends here.
#[derive(Clone, Default)]
struct ErrorSink(Arc<Mutex<Vec<String>>>);

impl ErrorSink {
    fn push(&self, message: String) {
        if let Ok(mut errors) = self.0.lock() {
            errors.push(message);
        }
    }

    fn drain(&self) -> Vec<String> {
        match self.0.lock() {
            Ok(mut errors) => std::mem::take(&mut *errors),
            Err(_) => Vec::new(),
        }
    }

    /// Logs and clears what arrived since the last report. Returns the count.
    fn report(&self, after: &str) -> usize {
        let errors = self.drain();
        for message in &errors {
            log::error!("device error after {after}: {message}");
        }
        errors.len()
    }
}

fn install_device_callbacks(device: &wgpu::Device, sink: &ErrorSink) {
    device.set_device_lost_callback(|reason, message| {
        log::error!("device lost ({reason:?}): {message}");
    });

    let sink = sink.clone();
    let handler: Box<dyn wgpu::UncapturedErrorHandler> =
        Box::new(move |error: wgpu::Error| sink.push(error.to_string()));
    device.on_uncaptured_error(handler.into());
}

/// Services the device's callbacks without blocking.
fn device_dispatch(device: &wgpu::Device) -> impl FnMut() + '_ {
    move || {
        if let Err(e) = device.poll(wgpu::PollType::Poll) {
            log::warn!("device poll failed: {e}");
        }
    }
}

/// Runs `create` inside out-of-memory and validation error scopes.
///
/// Anything the scopes catch fails the creation of `what`; errors raised by
/// other calls never land here.
fn scoped<T>(
    device: &wgpu::Device,
    wait: &WaitPolicy,
    what: &'static str,
    create: impl FnOnce() -> T,
) -> Result<T, GpuError> {
    match capture(device, wait, what, create)? {
        (value, None) => Ok(value),
        (_, Some(error)) => {
            log::error!("failed to create {what}: {error}");
            Err(GpuError::resource(what, error.to_string()))
        }
    }
}

/// Like [`scoped`], but hands back the (possibly invalid) object with the error.
fn capture<T>(
    device: &wgpu::Device,
    wait: &WaitPolicy,
    what: &'static str,
    create: impl FnOnce() -> T,
) -> Result<(T, Option<wgpu::Error>), GpuError> {
    let out_of_memory = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let validation = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let value = create();

    let invalid = pop_scope(device, wait, what, validation)?;
    let exhausted = pop_scope(device, wait, what, out_of_memory)?;
    Ok((value, invalid.or(exhausted)))
}

fn pop_scope(
    device: &wgpu::Device,
    wait: &WaitPolicy,
    what: &'static str,
    scope: wgpu::ErrorScopeGuard,
) -> Result<Option<wgpu::Error>, GpuError> {
    bridge::resolve_sync("error scope", scope.pop(), device_dispatch(device), wait)
        .map_err(|e| GpuError::resource(what, e.to_string()))
}

/// [`GpuApi`] backed by wgpu, presenting to a winit window.
///
/// The surface borrows the window, so the window must outlive every handle
/// created through this API.
pub struct WgpuApi<'w> {
    window: &'w Window,
    wait: WaitPolicy,
    errors: ErrorSink,
}

impl<'w> WgpuApi<'w> {
    pub fn new(window: &'w Window, wait: WaitPolicy) -> Self {
        Self {
            window,
            wait,
            errors: ErrorSink::default(),
        }
    }
}

impl<'w> GpuApi for WgpuApi<'w> {
    type Instance = wgpu::Instance;
    type Surface = wgpu::Surface<'w>;
    type Adapter = wgpu::Adapter;
    type Device = wgpu::Device;
    type Queue = wgpu::Queue;
    type ShaderModule = wgpu::ShaderModule;
    type Pipeline = wgpu::RenderPipeline;
    type Buffer = wgpu::Buffer;
    type Frame = GpuFrame;
    type Encoder = wgpu::CommandEncoder;
    type Pass = wgpu::RenderPass<'static>;
    type Commands = wgpu::CommandBuffer;

    fn create_instance(&mut self) -> Result<wgpu::Instance, GpuError> {
        Ok(wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        }))
    }

    fn create_surface(&mut self, instance: &wgpu::Instance) -> Result<wgpu::Surface<'w>, GpuError> {
        instance
            .create_surface(self.window)
            .map_err(|e| GpuError::SurfaceAcquisition(e.to_string()))
    }

    fn request_adapter(
        &mut self,
        instance: &wgpu::Instance,
        surface: &wgpu::Surface<'w>,
        settings: &DeviceSettings,
    ) -> Result<wgpu::Adapter, GpuError> {
        let options = wgpu::RequestAdapterOptions {
            power_preference: settings.power_preference,
            compatible_surface: Some(surface),
            force_fallback_adapter: settings.force_fallback_adapter,
        };

        bridge::request_sync(
            "adapter",
            async { instance.request_adapter(&options).await.map_err(|e| e.to_string()) },
            || {
                instance.poll_all(false);
            },
            &settings.wait,
        )
        .map_err(|source| GpuError::DeviceNegotiation { stage: "adapter", source })
    }

    fn adapter_capabilities(&self, adapter: &wgpu::Adapter) -> Capabilities {
        Capabilities {
            identity: Some(adapter.get_info().into()),
            limits: adapter.limits(),
            features: adapter.features(),
        }
    }

    fn request_device(
        &mut self,
        adapter: &wgpu::Adapter,
        request: &DeviceRequest,
        settings: &DeviceSettings,
    ) -> Result<(wgpu::Device, wgpu::Queue), GpuError> {
        let desc = wgpu::DeviceDescriptor {
            label: Some(request.label),
            required_features: request.required_features,
            required_limits: request.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        };

        // The instance is gone by now; nothing to dispatch but the thread.
        let (device, queue) = bridge::request_sync(
            "device",
            async { adapter.request_device(&desc).await.map_err(|e| e.to_string()) },
            std::thread::yield_now,
            &settings.wait,
        )
        .map_err(|source| GpuError::DeviceNegotiation { stage: "device", source })?;

        install_device_callbacks(&device, &self.errors);
        Ok((device, queue))
    }

    fn device_capabilities(&self, device: &wgpu::Device) -> Capabilities {
        Capabilities {
            identity: None,
            limits: device.limits(),
            features: device.features(),
        }
    }

    fn surface_capabilities(
        &self,
        surface: &wgpu::Surface<'w>,
        adapter: &wgpu::Adapter,
    ) -> wgpu::SurfaceCapabilities {
        surface.get_capabilities(adapter)
    }

    fn drawable_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn configure_surface(
        &mut self,
        surface: &wgpu::Surface<'w>,
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) {
        surface.configure(device, config);
    }

    fn unconfigure_surface(&mut self, _surface: &wgpu::Surface<'w>) {
        // wgpu has no explicit unconfigure; the swapchain goes with the surface.
        log::debug!("surface unconfigured");
    }

    fn create_shader_module(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
    ) -> Result<wgpu::ShaderModule, GpuError> {
        let (module, scope_error) = capture(device, &self.wait, "shader module", || {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        })?;

        let info = bridge::resolve_sync(
            "shader compilation info",
            module.get_compilation_info(),
            device_dispatch(device),
            &self.wait,
        )
        .map_err(|e| GpuError::resource("shader module", e.to_string()))?;

        let mut first_error = None;
        for msg in &info.messages {
            let at = msg
                .location
                .as_ref()
                .map(|l| format!(" at {}:{}", l.line_number, l.line_position))
                .unwrap_or_default();
            match msg.message_type {
                wgpu::CompilationMessageType::Error => {
                    log::error!("{label}{at}: {}", msg.message);
                    first_error.get_or_insert_with(|| format!("{}{at}", msg.message));
                }
                wgpu::CompilationMessageType::Warning => log::warn!("{label}{at}: {}", msg.message),
                _ => log::info!("{label}{at}: {}", msg.message),
            }
        }

        // Located compiler diagnostics beat the scope's summary of the same failure.
        match (first_error, scope_error) {
            (Some(message), _) => Err(GpuError::resource("shader module", message)),
            (None, Some(error)) => {
                log::error!("failed to create shader module: {error}");
                Err(GpuError::resource("shader module", error.to_string()))
            }
            (None, None) => Ok(module),
        }
    }

    fn create_pipeline(
        &mut self,
        device: &wgpu::Device,
        shader: &wgpu::ShaderModule,
        desc: &PipelineDesc<'_>,
    ) -> Result<wgpu::RenderPipeline, GpuError> {
        scoped(device, &self.wait, "render pipeline", || {
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(desc.label),
                bind_group_layouts: &[],
                immediate_size: 0,
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&layout),

                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some(desc.vertex_entry),
                    compilation_options: Default::default(),
                    buffers: desc.vertex_layouts,
                },

                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some(desc.fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: desc.target_format,
                        blend: desc.blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: desc.primitive,
                depth_stencil: None,
                multisample: desc.multisample,
                multiview_mask: None,
                cache: None,
            })
        })
    }

    fn create_buffer(&mut self, device: &wgpu::Device, desc: &BufferDesc<'_>) -> Result<wgpu::Buffer, GpuError> {
        scoped(device, &self.wait, "buffer", || {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(desc.label),
                size: desc.size,
                usage: desc.usage,
                mapped_at_creation: false,
            })
        })
    }

    fn write_buffer(&mut self, queue: &wgpu::Queue, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        queue.write_buffer(buffer, offset, data);
        self.errors.report("buffer upload");
    }

    fn acquire_frame(&mut self, surface: &wgpu::Surface<'w>) -> Result<GpuFrame, SurfaceStatus> {
        let surface_texture = surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        Ok(GpuFrame { surface_texture, view })
    }

    fn create_encoder(&mut self, device: &wgpu::Device) -> Result<wgpu::CommandEncoder, GpuError> {
        scoped(device, &self.wait, "command encoder", || {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("prism frame encoder"),
            })
        })
    }

    fn begin_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        frame: &GpuFrame,
        clear: wgpu::Color,
    ) -> Result<wgpu::RenderPass<'static>, GpuError> {
        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prism main pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        // Encoding errors surface when the encoder is finished.
        Ok(pass.forget_lifetime())
    }

    fn set_pipeline(&mut self, pass: &mut wgpu::RenderPass<'static>, pipeline: &wgpu::RenderPipeline) {
        pass.set_pipeline(pipeline);
    }

    fn set_vertex_buffer(&mut self, pass: &mut wgpu::RenderPass<'static>, slot: u32, buffer: &wgpu::Buffer) {
        pass.set_vertex_buffer(slot, buffer.slice(..));
    }

    fn set_index_buffer(&mut self, pass: &mut wgpu::RenderPass<'static>, buffer: &wgpu::Buffer) {
        pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint16);
    }

    fn draw(&mut self, pass: &mut wgpu::RenderPass<'static>, vertices: Range<u32>, instances: Range<u32>) {
        pass.draw(vertices, instances);
    }

    fn draw_indexed(
        &mut self,
        pass: &mut wgpu::RenderPass<'static>,
        indices: Range<u32>,
        instances: Range<u32>,
    ) {
        pass.draw_indexed(indices, 0, instances);
    }

    fn end_pass(&mut self, pass: wgpu::RenderPass<'static>) {
        drop(pass);
    }

    fn finish(
        &mut self,
        device: &wgpu::Device,
        encoder: wgpu::CommandEncoder,
    ) -> Result<wgpu::CommandBuffer, GpuError> {
        scoped(device, &self.wait, "command buffer", || encoder.finish())
    }

    fn submit(&mut self, queue: &wgpu::Queue, commands: wgpu::CommandBuffer) {
        queue.submit(std::iter::once(commands));
        self.errors.report("submit");
    }

    fn present(&mut self, frame: GpuFrame) {
        let GpuFrame { surface_texture, view } = frame;
        surface_texture.present();
        drop(view);
    }

    fn poll(&mut self, device: &wgpu::Device) {
        let mut dispatch = device_dispatch(device);
        dispatch();
        self.errors.report("device poll");
    }
}
