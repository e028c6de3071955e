use thiserror::Error;

use super::bridge::BridgeError;

/// Failure taxonomy for GPU bring-up and rendering.
///
/// Every variant is unrecoverable: it aborts startup (or stops the render loop)
/// after partial state has been released. A surface texture that cannot be had
/// this frame is not an error; see [`SurfaceStatus`].
#[derive(Debug, Error)]
pub enum GpuError {
    /// Windowing system or GPU instance unavailable.
    #[error("environment initialization failed: {0}")]
    EnvironmentInit(String),

    /// The window could not provide a presentation surface, or the surface
    /// cannot be configured for the chosen adapter.
    #[error("surface acquisition failed: {0}")]
    SurfaceAcquisition(String),

    /// Adapter or device request reported a failure status.
    #[error("{stage} request failed: {source}")]
    DeviceNegotiation {
        stage: &'static str,
        #[source]
        source: BridgeError,
    },

    /// The adapter cannot satisfy a limit the renderer depends on.
    #[error("adapter supports {limit} = {supported}, renderer needs {needed}")]
    LimitsUnsupported {
        limit: &'static str,
        needed: u64,
        supported: u64,
    },

    /// Shader, pipeline, buffer or command creation failed.
    #[error("failed to create {what}: {message}")]
    ResourceCreation { what: &'static str, message: String },
}

impl GpuError {
    pub(crate) fn resource(what: &'static str, message: impl Into<String>) -> Self {
        Self::ResourceCreation { what, message: message.into() }
    }
}

/// Non-success status reported when acquiring the next surface texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SurfaceStatus {
    Timeout,
    Outdated,
    Lost,
    OutOfMemory,
    Other,
}

impl SurfaceStatus {
    /// Decides how the frame loop reacts to this status.
    pub fn action(self) -> SurfaceErrorAction {
        match self {
            SurfaceStatus::Lost | SurfaceStatus::Outdated => SurfaceErrorAction::Reconfigure,
            SurfaceStatus::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceStatus::Timeout | SurfaceStatus::Other => SurfaceErrorAction::SkipFrame,
        }
    }
}

impl std::fmt::Display for SurfaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SurfaceStatus::Timeout => "timeout",
            SurfaceStatus::Outdated => "outdated",
            SurfaceStatus::Lost => "lost",
            SurfaceStatus::OutOfMemory => "out of memory",
            SurfaceStatus::Other => "other",
        };
        f.write_str(s)
    }
}

impl From<wgpu::SurfaceError> for SurfaceStatus {
    fn from(err: wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Timeout => SurfaceStatus::Timeout,
            wgpu::SurfaceError::Outdated => SurfaceStatus::Outdated,
            wgpu::SurfaceError::Lost => SurfaceStatus::Lost,
            wgpu::SurfaceError::OutOfMemory => SurfaceStatus::OutOfMemory,
            wgpu::SurfaceError::Other => SurfaceStatus::Other,
        }
    }
}

/// High-level response after a surface acquisition failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Reconfigure the surface, skip this frame; rendering resumes next frame.
    Reconfigure,
    /// Drop this frame and try again on the next one.
    SkipFrame,
    /// Stop rendering; the surface will not recover.
    Fatal,
}
