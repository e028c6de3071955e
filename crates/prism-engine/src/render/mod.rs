//! Renderer: ordered startup, per-frame execution and teardown.

mod config;
mod frame;
mod renderer;
mod startup;

pub use config::RendererConfig;
pub use frame::{FrameContext, FrameExecutor, FrameOutcome, FramePhase, FrameStats};
pub use renderer::Renderer;
pub use startup::{StartupError, StartupStage};
