//! Recording [`GpuApi`] double.
//!
//! Every handle is a [`Handle`] that journals its own release on drop, so tests
//! can assert creation/release order, release counts and the number of live
//! surface frames without a GPU.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use crate::device::bridge::{Completion, RequestStatus};
use crate::device::{
    AdapterIdentity, BufferDesc, Capabilities, DeviceRequest, DeviceSettings, GpuApi, GpuError,
    PipelineDesc, SurfaceStatus,
};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Kind {
    Instance,
    Surface,
    Adapter,
    Device,
    Queue,
    ShaderModule,
    Pipeline,
    Buffer,
    Frame,
    Encoder,
    Pass,
    Commands,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Created(Kind, u32),
    Released(Kind, u32),
    Configured { width: u32, height: u32 },
    Unconfigured,
    Write { buffer: u32, offset: u64, data: Vec<u8> },
    AcquireFailed(SurfaceStatus),
    PassBegun { frame: u32 },
    SetPipeline(u32),
    SetVertexBuffer { slot: u32, buffer: u32 },
    SetIndexBuffer(u32),
    Draw { vertices: Range<u32>, instances: Range<u32> },
    DrawIndexed { indices: Range<u32>, instances: Range<u32> },
    PassEnded,
    Submitted(u32),
    Presented(u32),
    Polled,
}

#[derive(Default)]
struct Shared {
    journal: Vec<Event>,
    next_id: u32,
    live_frames: u32,
    max_live_frames: u32,
    releases: HashMap<(Kind, u32), u32>,
    buffer_sizes: HashMap<u32, u64>,
    pipeline_formats: Vec<wgpu::TextureFormat>,
}

pub struct Handle {
    kind: Kind,
    id: u32,
    shared: Rc<RefCell<Shared>>,
}

impl Handle {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind, self.id)
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        let mut shared = self.shared.borrow_mut();
        *shared.releases.entry((self.kind, self.id)).or_insert(0) += 1;
        if self.kind == Kind::Frame {
            shared.live_frames -= 1;
        }
        shared.journal.push(Event::Released(self.kind, self.id));
    }
}

fn make(shared: &Rc<RefCell<Shared>>, kind: Kind) -> Handle {
    let mut s = shared.borrow_mut();
    let id = s.next_id;
    s.next_id += 1;
    if kind == Kind::Frame {
        s.live_frames += 1;
        s.max_live_frames = s.max_live_frames.max(s.live_frames);
    }
    s.journal.push(Event::Created(kind, id));
    Handle {
        kind,
        id,
        shared: Rc::clone(shared),
    }
}

/// Read access to what a [`RecordingApi`] saw, kept after the API is moved.
#[derive(Clone)]
pub struct Journal(Rc<RefCell<Shared>>);

impl Journal {
    pub fn journal(&self) -> Vec<Event> {
        self.0.borrow().journal.clone()
    }

    /// Returns and clears the journal.
    pub fn take_journal(&self) -> Vec<Event> {
        std::mem::take(&mut self.0.borrow_mut().journal)
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.0.borrow().journal.iter().filter(|e| pred(e)).count()
    }

    pub fn created(&self, kind: Kind) -> usize {
        self.count(|e| matches!(e, Event::Created(k, _) if *k == kind))
    }

    pub fn released(&self, kind: Kind) -> usize {
        self.count(|e| matches!(e, Event::Released(k, _) if *k == kind))
    }

    /// Number of times each handle was released.
    pub fn release_counts(&self) -> HashMap<(Kind, u32), u32> {
        self.0.borrow().releases.clone()
    }

    pub fn live_frames(&self) -> u32 {
        self.0.borrow().live_frames
    }

    pub fn max_live_frames(&self) -> u32 {
        self.0.borrow().max_live_frames
    }

    pub fn buffer_size(&self, id: u32) -> Option<u64> {
        self.0.borrow().buffer_sizes.get(&id).copied()
    }

    pub fn pipeline_formats(&self) -> Vec<wgpu::TextureFormat> {
        self.0.borrow().pipeline_formats.clone()
    }
}

pub struct RecordingApi {
    shared: Rc<RefCell<Shared>>,
    fail_kind: Option<Kind>,
    adapter_status: Option<RequestStatus>,
    device_status: Option<RequestStatus>,
    acquire_script: VecDeque<Option<SurfaceStatus>>,
    drawable: (u32, u32),
    formats: Vec<wgpu::TextureFormat>,
    limits: wgpu::Limits,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self {
            shared: Rc::default(),
            fail_kind: None,
            adapter_status: None,
            device_status: None,
            acquire_script: VecDeque::new(),
            drawable: (640, 480),
            formats: vec![wgpu::TextureFormat::Bgra8UnormSrgb],
            limits: wgpu::Limits::default(),
        }
    }

    pub fn journal_handle(&self) -> Journal {
        Journal(Rc::clone(&self.shared))
    }

    /// Makes every creation of `kind` fail.
    pub fn fail_creating(mut self, kind: Kind) -> Self {
        self.fail_kind = Some(kind);
        self
    }

    /// Makes the adapter or device request complete with `status` and no handle.
    pub fn fail_request(mut self, kind: Kind, status: RequestStatus) -> Self {
        match kind {
            Kind::Adapter => self.adapter_status = Some(status),
            Kind::Device => self.device_status = Some(status),
            other => panic!("{other:?} is not requested through the bridge"),
        }
        self
    }

    /// Queues acquisition results; `None` acquires normally. Once the script
    /// runs out every acquisition succeeds.
    pub fn script_acquire(mut self, results: impl IntoIterator<Item = Option<SurfaceStatus>>) -> Self {
        self.acquire_script.extend(results);
        self
    }

    pub fn with_drawable_size(mut self, width: u32, height: u32) -> Self {
        self.drawable = (width, height);
        self
    }

    pub fn with_surface_formats(mut self, formats: Vec<wgpu::TextureFormat>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_limits(mut self, limits: wgpu::Limits) -> Self {
        self.limits = limits;
        self
    }

    /// A fresh handle, as if created by the API.
    pub fn handle(&self, kind: Kind) -> Handle {
        make(&self.shared, kind)
    }

    fn record(&self, event: Event) {
        self.shared.borrow_mut().journal.push(event);
    }

    fn create(&self, kind: Kind, what: &'static str) -> Result<Handle, GpuError> {
        if self.fail_kind == Some(kind) {
            return Err(GpuError::resource(what, "injected failure"));
        }
        Ok(make(&self.shared, kind))
    }

    /// Completes on the second pump, like a driver that needs event dispatch.
    fn bridged<T>(
        &self,
        what: &'static str,
        status: Option<RequestStatus>,
        settings: &DeviceSettings,
        value: impl FnOnce() -> T,
    ) -> Result<T, GpuError> {
        let completion = Completion::new();
        let mut pending = Some((completion.handler(), value));
        let mut ticks = 0;

        completion
            .wait(
                what,
                || {
                    ticks += 1;
                    if ticks < 2 {
                        return;
                    }
                    if let Some((handler, value)) = pending.take() {
                        match status {
                            None => handler.succeed(value()),
                            Some(s) => handler.fail(s, format!("injected {what} failure")),
                        }
                    }
                },
                &settings.wait,
            )
            .map_err(|source| GpuError::DeviceNegotiation { stage: what, source })
    }
}

impl GpuApi for RecordingApi {
    type Instance = Handle;
    type Surface = Handle;
    type Adapter = Handle;
    type Device = Handle;
    type Queue = Handle;
    type ShaderModule = Handle;
    type Pipeline = Handle;
    type Buffer = Handle;
    type Frame = Handle;
    type Encoder = Handle;
    type Pass = Handle;
    type Commands = Handle;

    fn create_instance(&mut self) -> Result<Handle, GpuError> {
        if self.fail_kind == Some(Kind::Instance) {
            return Err(GpuError::EnvironmentInit("injected failure".into()));
        }
        Ok(make(&self.shared, Kind::Instance))
    }

    fn create_surface(&mut self, _instance: &Handle) -> Result<Handle, GpuError> {
        if self.fail_kind == Some(Kind::Surface) {
            return Err(GpuError::SurfaceAcquisition("injected failure".into()));
        }
        Ok(make(&self.shared, Kind::Surface))
    }

    fn request_adapter(
        &mut self,
        _instance: &Handle,
        _surface: &Handle,
        settings: &DeviceSettings,
    ) -> Result<Handle, GpuError> {
        let shared = Rc::clone(&self.shared);
        self.bridged("adapter", self.adapter_status, settings, move || {
            make(&shared, Kind::Adapter)
        })
    }

    fn adapter_capabilities(&self, _adapter: &Handle) -> Capabilities {
        Capabilities {
            identity: Some(AdapterIdentity {
                name: "recording adapter".into(),
                ..Default::default()
            }),
            limits: self.limits.clone(),
            features: wgpu::Features::empty(),
        }
    }

    fn request_device(
        &mut self,
        _adapter: &Handle,
        _request: &DeviceRequest,
        settings: &DeviceSettings,
    ) -> Result<(Handle, Handle), GpuError> {
        let shared = Rc::clone(&self.shared);
        self.bridged("device", self.device_status, settings, move || {
            (make(&shared, Kind::Device), make(&shared, Kind::Queue))
        })
    }

    fn device_capabilities(&self, _device: &Handle) -> Capabilities {
        Capabilities {
            identity: None,
            limits: self.limits.clone(),
            features: wgpu::Features::empty(),
        }
    }

    fn surface_capabilities(&self, _surface: &Handle, _adapter: &Handle) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats: self.formats.clone(),
            present_modes: vec![wgpu::PresentMode::Fifo],
            alpha_modes: vec![wgpu::CompositeAlphaMode::Opaque],
            usages: wgpu::TextureUsages::RENDER_ATTACHMENT,
        }
    }

    fn drawable_size(&self) -> (u32, u32) {
        self.drawable
    }

    fn configure_surface(
        &mut self,
        _surface: &Handle,
        _device: &Handle,
        config: &wgpu::SurfaceConfiguration,
    ) {
        self.record(Event::Configured {
            width: config.width,
            height: config.height,
        });
    }

    fn unconfigure_surface(&mut self, _surface: &Handle) {
        self.record(Event::Unconfigured);
    }

    fn create_shader_module(
        &mut self,
        _device: &Handle,
        _label: &str,
        _source: &str,
    ) -> Result<Handle, GpuError> {
        self.create(Kind::ShaderModule, "shader module")
    }

    fn create_pipeline(
        &mut self,
        _device: &Handle,
        _shader: &Handle,
        desc: &PipelineDesc<'_>,
    ) -> Result<Handle, GpuError> {
        let pipeline = self.create(Kind::Pipeline, "render pipeline")?;
        self.shared.borrow_mut().pipeline_formats.push(desc.target_format);
        Ok(pipeline)
    }

    fn create_buffer(&mut self, _device: &Handle, desc: &BufferDesc<'_>) -> Result<Handle, GpuError> {
        let buffer = self.create(Kind::Buffer, "buffer")?;
        self.shared.borrow_mut().buffer_sizes.insert(buffer.id, desc.size);
        Ok(buffer)
    }

    fn write_buffer(&mut self, _queue: &Handle, buffer: &Handle, offset: u64, data: &[u8]) {
        self.record(Event::Write {
            buffer: buffer.id,
            offset,
            data: data.to_vec(),
        });
    }

    fn acquire_frame(&mut self, _surface: &Handle) -> Result<Handle, SurfaceStatus> {
        if let Some(Some(status)) = self.acquire_script.pop_front() {
            self.record(Event::AcquireFailed(status));
            return Err(status);
        }
        Ok(make(&self.shared, Kind::Frame))
    }

    fn create_encoder(&mut self, _device: &Handle) -> Result<Handle, GpuError> {
        self.create(Kind::Encoder, "command encoder")
    }

    fn begin_pass(&mut self, _encoder: &mut Handle, frame: &Handle, _clear: wgpu::Color) -> Result<Handle, GpuError> {
        let pass = self.create(Kind::Pass, "render pass")?;
        self.record(Event::PassBegun { frame: frame.id });
        Ok(pass)
    }

    fn set_pipeline(&mut self, _pass: &mut Handle, pipeline: &Handle) {
        self.record(Event::SetPipeline(pipeline.id));
    }

    fn set_vertex_buffer(&mut self, _pass: &mut Handle, slot: u32, buffer: &Handle) {
        self.record(Event::SetVertexBuffer { slot, buffer: buffer.id });
    }

    fn set_index_buffer(&mut self, _pass: &mut Handle, buffer: &Handle) {
        self.record(Event::SetIndexBuffer(buffer.id));
    }

    fn draw(&mut self, _pass: &mut Handle, vertices: Range<u32>, instances: Range<u32>) {
        self.record(Event::Draw { vertices, instances });
    }

    fn draw_indexed(&mut self, _pass: &mut Handle, indices: Range<u32>, instances: Range<u32>) {
        self.record(Event::DrawIndexed { indices, instances });
    }

    fn end_pass(&mut self, pass: Handle) {
        self.record(Event::PassEnded);
        drop(pass);
    }

    fn finish(&mut self, _device: &Handle, encoder: Handle) -> Result<Handle, GpuError> {
        let commands = self.create(Kind::Commands, "command buffer")?;
        drop(encoder);
        Ok(commands)
    }

    fn submit(&mut self, _queue: &Handle, commands: Handle) {
        self.record(Event::Submitted(commands.id));
        drop(commands);
    }

    fn present(&mut self, frame: Handle) {
        self.record(Event::Presented(frame.id));
        drop(frame);
    }

    fn poll(&mut self, _device: &Handle) {
        self.record(Event::Polled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_journal_their_release() {
        let api = RecordingApi::new();
        let recorded = api.journal_handle();

        let buffer = api.handle(Kind::Buffer);
        let id = buffer.id();
        drop(buffer);

        assert_eq!(recorded.journal(), vec![Event::Created(Kind::Buffer, id), Event::Released(Kind::Buffer, id)]);
        assert_eq!(recorded.release_counts().get(&(Kind::Buffer, id)), Some(&1));
    }

    #[test]
    fn scripted_statuses_then_success() {
        let mut api = RecordingApi::new().script_acquire([Some(SurfaceStatus::Lost), None]);
        let surface = api.handle(Kind::Surface);

        assert_eq!(api.acquire_frame(&surface).unwrap_err(), SurfaceStatus::Lost);
        let first = api.acquire_frame(&surface).unwrap();
        drop(first);
        assert!(api.acquire_frame(&surface).is_ok());
    }

    #[test]
    fn live_frames_are_counted() {
        let mut api = RecordingApi::new();
        let recorded = api.journal_handle();
        let surface = api.handle(Kind::Surface);

        let a = api.acquire_frame(&surface).unwrap();
        let b = api.acquire_frame(&surface).unwrap();
        assert_eq!(recorded.live_frames(), 2);
        drop(a);
        drop(b);
        assert_eq!(recorded.live_frames(), 0);
        assert_eq!(recorded.max_live_frames(), 2);
    }

    #[test]
    fn failed_request_goes_through_the_bridge() {
        let mut api = RecordingApi::new().fail_request(Kind::Adapter, RequestStatus::Unavailable);
        let instance = api.handle(Kind::Instance);
        let surface = api.handle(Kind::Surface);

        let err = api
            .request_adapter(&instance, &surface, &DeviceSettings::default())
            .unwrap_err();

        assert!(matches!(err, GpuError::DeviceNegotiation { stage: "adapter", .. }));
    }
}
