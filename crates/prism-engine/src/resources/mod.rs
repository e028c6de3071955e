//! Persistent GPU resources: vertex/index buffers, the shader program and the
//! render pipeline, bundled into a [`Scene`].
//!
//! Everything here is created once at startup and released at shutdown, in the
//! order the [`Scene`] fields are declared.

mod buffer;
mod pipeline;
mod scene;
mod shader;
mod vertex;

pub use buffer::{aligned_size, BufferKind, GpuBuffer, COPY_ALIGNMENT};
pub use pipeline::{create_point_pipeline, FRAGMENT_ENTRY, VERTEX_ENTRY};
pub use scene::{limit_needs, upload_geometry, DrawCall, Scene};
pub use shader::ShaderSource;
pub use vertex::PointVertex;
