//! The `winit` event loop that owns the window and drives the renderer.

mod runtime;

pub use runtime::Runtime;
