//! Prism engine crate.
//!
//! A GPU rendering context on wgpu: blocking adapter/device acquisition,
//! surface configuration, persistent resources, and a per-frame executor that
//! draws one geometry with one render pass.

pub mod device;
pub mod logging;
pub mod render;
pub mod resources;
pub mod window;

#[cfg(test)]
mod testing;
