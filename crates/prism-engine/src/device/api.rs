//! The seam between the renderer and the GPU API.
//!
//! Startup, frame execution and teardown are written against [`GpuApi`].
//! Production code uses [`super::WgpuApi`]; tests substitute a recording double.
//!
//! Handles are owned values: dropping one releases the underlying GPU object.
//! Callers control release order by controlling drop order.

use std::ops::Range;

use super::error::{GpuError, SurfaceStatus};
use super::init::DeviceSettings;
use super::inspect::Capabilities;

/// Device request negotiated from adapter capabilities.
#[derive(Debug, Clone)]
pub struct DeviceRequest {
    pub label: &'static str,
    pub required_features: wgpu::Features,
    pub required_limits: wgpu::Limits,
}

#[derive(Debug, Clone)]
pub struct BufferDesc<'a> {
    pub label: &'a str,
    /// Backing size in bytes; already aligned by the caller.
    pub size: u64,
    pub usage: wgpu::BufferUsages,
}

/// Everything needed to build the render pipeline besides the shader module.
#[derive(Debug, Clone)]
pub struct PipelineDesc<'a> {
    pub label: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    pub vertex_layouts: &'a [wgpu::VertexBufferLayout<'a>],
    pub target_format: wgpu::TextureFormat,
    pub blend: Option<wgpu::BlendState>,
    pub primitive: wgpu::PrimitiveState,
    pub multisample: wgpu::MultisampleState,
}

/// GPU operations used by the renderer, one method per API call it makes.
pub trait GpuApi {
    type Instance;
    type Surface;
    type Adapter;
    type Device;
    type Queue;
    type ShaderModule;
    type Pipeline;
    type Buffer;
    /// Acquired surface texture plus its view; one per frame.
    type Frame;
    type Encoder;
    /// The frame's render pass while it records.
    type Pass;
    type Commands;

    fn create_instance(&mut self) -> Result<Self::Instance, GpuError>;

    fn create_surface(&mut self, instance: &Self::Instance) -> Result<Self::Surface, GpuError>;

    /// Blocking adapter request (see [`super::bridge`]).
    fn request_adapter(
        &mut self,
        instance: &Self::Instance,
        surface: &Self::Surface,
        settings: &DeviceSettings,
    ) -> Result<Self::Adapter, GpuError>;

    fn adapter_capabilities(&self, adapter: &Self::Adapter) -> Capabilities;

    /// Blocking device request (see [`super::bridge`]).
    fn request_device(
        &mut self,
        adapter: &Self::Adapter,
        request: &DeviceRequest,
        settings: &DeviceSettings,
    ) -> Result<(Self::Device, Self::Queue), GpuError>;

    fn device_capabilities(&self, device: &Self::Device) -> Capabilities;

    fn surface_capabilities(
        &self,
        surface: &Self::Surface,
        adapter: &Self::Adapter,
    ) -> wgpu::SurfaceCapabilities;

    /// Current drawable size in physical pixels.
    fn drawable_size(&self) -> (u32, u32);

    fn configure_surface(
        &mut self,
        surface: &Self::Surface,
        device: &Self::Device,
        config: &wgpu::SurfaceConfiguration,
    );

    fn unconfigure_surface(&mut self, surface: &Self::Surface);

    fn create_shader_module(
        &mut self,
        device: &Self::Device,
        label: &str,
        source: &str,
    ) -> Result<Self::ShaderModule, GpuError>;

    fn create_pipeline(
        &mut self,
        device: &Self::Device,
        shader: &Self::ShaderModule,
        desc: &PipelineDesc<'_>,
    ) -> Result<Self::Pipeline, GpuError>;

    fn create_buffer(
        &mut self,
        device: &Self::Device,
        desc: &BufferDesc<'_>,
    ) -> Result<Self::Buffer, GpuError>;

    /// Queue upload. `data.len()` must be a multiple of 4.
    fn write_buffer(&mut self, queue: &Self::Queue, buffer: &Self::Buffer, offset: u64, data: &[u8]);

    fn acquire_frame(&mut self, surface: &Self::Surface) -> Result<Self::Frame, SurfaceStatus>;

    fn create_encoder(&mut self, device: &Self::Device) -> Result<Self::Encoder, GpuError>;

    /// Begins the frame's render pass: clears the frame's view to `clear`
    /// and stores the result.
    fn begin_pass(
        &mut self,
        encoder: &mut Self::Encoder,
        frame: &Self::Frame,
        clear: wgpu::Color,
    ) -> Result<Self::Pass, GpuError>;

    fn set_pipeline(&mut self, pass: &mut Self::Pass, pipeline: &Self::Pipeline);

    fn set_vertex_buffer(&mut self, pass: &mut Self::Pass, slot: u32, buffer: &Self::Buffer);

    /// Binds `u16` indices.
    fn set_index_buffer(&mut self, pass: &mut Self::Pass, buffer: &Self::Buffer);

    fn draw(&mut self, pass: &mut Self::Pass, vertices: Range<u32>, instances: Range<u32>);

    fn draw_indexed(&mut self, pass: &mut Self::Pass, indices: Range<u32>, instances: Range<u32>);

    fn end_pass(&mut self, pass: Self::Pass);

    fn finish(&mut self, device: &Self::Device, encoder: Self::Encoder) -> Result<Self::Commands, GpuError>;

    fn submit(&mut self, queue: &Self::Queue, commands: Self::Commands);

    /// Presents the frame, then releases its view.
    fn present(&mut self, frame: Self::Frame);

    /// Non-blocking device poll.
    fn poll(&mut self, device: &Self::Device);
}
