use prism_geom::Geometry;

use crate::device::{GpuApi, GpuError, LimitNeeds};

use super::buffer::{aligned_size, BufferKind, GpuBuffer};
use super::vertex::PointVertex;

/// The single draw issued per frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DrawCall {
    Indexed { index_count: u32, instance_count: u32 },
    Direct { vertex_count: u32, instance_count: u32 },
}

impl DrawCall {
    /// Indexed when the geometry has indices, otherwise one vertex per point.
    pub fn for_geometry(geometry: &Geometry) -> Self {
        if geometry.is_indexed() {
            DrawCall::Indexed {
                index_count: geometry.indices.len() as u32,
                instance_count: 1,
            }
        } else {
            DrawCall::Direct {
                vertex_count: geometry.point_count() as u32,
                instance_count: 1,
            }
        }
    }
}

/// Persistent objects bound by the frame's render pass.
///
/// Fields drop in declaration order: buffers before the pipeline.
pub struct Scene<A: GpuApi + ?Sized> {
    vertex_buffers: Vec<GpuBuffer<A>>,
    index_buffer: Option<GpuBuffer<A>>,
    pipeline: A::Pipeline,
    draw: DrawCall,
}

impl<A: GpuApi + ?Sized> Scene<A> {
    pub fn new(
        pipeline: A::Pipeline,
        vertex_buffers: Vec<GpuBuffer<A>>,
        index_buffer: Option<GpuBuffer<A>>,
        draw: DrawCall,
    ) -> Self {
        Self {
            vertex_buffers,
            index_buffer,
            pipeline,
            draw,
        }
    }

    pub fn pipeline(&self) -> &A::Pipeline {
        &self.pipeline
    }

    /// Vertex buffers in slot order.
    pub fn vertex_buffers(&self) -> &[GpuBuffer<A>] {
        &self.vertex_buffers
    }

    pub fn index_buffer(&self) -> Option<&GpuBuffer<A>> {
        self.index_buffer.as_ref()
    }

    pub fn draw(&self) -> DrawCall {
        self.draw
    }

    /// Releases buffers, then the pipeline.
    pub fn release_all(self) {
        let Scene {
            vertex_buffers,
            index_buffer,
            pipeline,
            ..
        } = self;

        let count = vertex_buffers.len() + usize::from(index_buffer.is_some());
        drop(vertex_buffers);
        drop(index_buffer);
        log::debug!("released {count} buffer(s)");

        drop(pipeline);
        log::debug!("released render pipeline");
    }
}

/// Creates and fills the vertex buffer (slot 0) and, for indexed geometry,
/// the `u16` index buffer.
pub fn upload_geometry<A: GpuApi + ?Sized>(
    api: &mut A,
    device: &A::Device,
    queue: &A::Queue,
    geometry: &Geometry,
) -> Result<(Vec<GpuBuffer<A>>, Option<GpuBuffer<A>>), GpuError> {
    if geometry.is_empty() {
        return Err(GpuError::resource("vertex buffer", "geometry has no points"));
    }

    let points: &[PointVertex] = bytemuck::try_cast_slice(&geometry.points)
        .map_err(|e| GpuError::resource("vertex buffer", e.to_string()))?;

    let vertices = GpuBuffer::create_init(
        api,
        device,
        queue,
        "prism vertex buffer",
        BufferKind::Vertex,
        bytemuck::cast_slice(points),
    )?;

    let indices = if geometry.is_indexed() {
        Some(GpuBuffer::create_init(
            api,
            device,
            queue,
            "prism index buffer",
            BufferKind::Index,
            bytemuck::cast_slice(&geometry.indices),
        )?)
    } else {
        None
    };

    Ok((vec![vertices], indices))
}

/// Device limits the renderer depends on to draw `geometry`.
pub fn limit_needs(geometry: &Geometry) -> LimitNeeds {
    let vertex_bytes = aligned_size(geometry.points.len() as u64 * 4);
    let index_bytes = aligned_size(geometry.indices.len() as u64 * 2);

    LimitNeeds {
        vertex_attributes: PointVertex::attribute_count(),
        vertex_buffers: 1,
        vertex_stride: PointVertex::STRIDE as u32,
        buffer_size: vertex_bytes.max(index_bytes),
    }
}
