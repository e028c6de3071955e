//! Adapter, device and surface setup, plus the seam the renderer draws through.
//!
//! Covers:
//! - turning the asynchronous adapter/device requests into blocking calls
//! - inspecting adapter capabilities and negotiating device limits
//! - negotiating and applying the surface configuration
//! - the [`GpuApi`] seam and its wgpu implementation

mod api;
pub mod bridge;
mod error;
mod init;
mod inspect;
mod surface;
mod wgpu_api;

pub use api::{BufferDesc, DeviceRequest, GpuApi, PipelineDesc};
pub use bridge::{BridgeError, RequestStatus, WaitPolicy};
pub use error::{GpuError, SurfaceErrorAction, SurfaceStatus};
pub use init::DeviceSettings;
pub use inspect::{limit_rows, required_limits, AdapterIdentity, Capabilities, LimitNeeds};
pub use surface::{
    apply_resize, build_config, choose_alpha_mode, choose_present_mode, negotiate_format,
    ResizeOutcome,
};
pub use wgpu_api::{GpuFrame, WgpuApi};
