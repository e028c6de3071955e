use std::path::PathBuf;

use crate::device::{DeviceSettings, WaitPolicy};
use crate::resources::ShaderSource;

/// Window and renderer configuration.
///
/// Defaults open a fixed 640x480 window titled "WebGPU Renderer", present with
/// FIFO on a high-performance adapter and draw with the embedded shader.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub title: String,
    /// Initial window size in logical pixels.
    pub width: u32,
    pub height: u32,
    pub resizable: bool,

    /// Clear color of the single render pass.
    pub clear_color: wgpu::Color,

    pub shader: ShaderSource,

    pub device: DeviceSettings,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            title: "WebGPU Renderer".to_string(),
            width: 640,
            height: 480,
            resizable: false,
            clear_color: wgpu::Color {
                r: 0.05,
                g: 0.05,
                b: 0.05,
                a: 1.0,
            },
            shader: ShaderSource::Embedded,
            device: DeviceSettings::default(),
        }
    }
}

impl RendererConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn with_clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_shader(mut self, shader: ShaderSource) -> Self {
        self.shader = shader;
        self
    }

    pub fn with_shader_file(self, path: impl Into<PathBuf>) -> Self {
        self.with_shader(ShaderSource::File(path.into()))
    }

    pub fn with_present_mode(mut self, mode: wgpu::PresentMode) -> Self {
        self.device.present_mode = mode;
        self
    }

    pub fn with_alpha_mode(mut self, mode: wgpu::CompositeAlphaMode) -> Self {
        self.device.alpha_mode = Some(mode);
        self
    }

    pub fn prefer_srgb(mut self, prefer: bool) -> Self {
        self.device.prefer_srgb = prefer;
        self
    }

    pub fn with_power_preference(mut self, preference: wgpu::PowerPreference) -> Self {
        self.device.power_preference = preference;
        self
    }

    pub fn with_frame_latency(mut self, frames: u32) -> Self {
        self.device.desired_maximum_frame_latency = frames;
        self
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.device.wait = wait;
        self
    }
}
