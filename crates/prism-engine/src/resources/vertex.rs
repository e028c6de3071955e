use bytemuck::{Pod, Zeroable};

/// Interleaved point as stored in geometry files: position then color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

impl PointVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x3];

    pub const STRIDE: u64 = std::mem::size_of::<PointVertex>() as u64;

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    pub fn attribute_count() -> u32 {
        Self::ATTRS.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_interleaved_points() {
        let layout = PointVertex::layout();
        assert_eq!(layout.array_stride, 20);
        assert_eq!(layout.attributes.len(), 2);

        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(layout.attributes[0].shader_location, 0);

        assert_eq!(layout.attributes[1].offset, 8);
        assert_eq!(layout.attributes[1].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(layout.attributes[1].shader_location, 1);
    }

    #[test]
    fn flat_floats_cast_to_points() {
        let flat = [0.5f32, -0.5, 1.0, 0.0, 0.0, -0.5, -0.5, 0.0, 1.0, 0.0];
        let points: &[PointVertex] = bytemuck::cast_slice(&flat);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].position, [-0.5, -0.5]);
        assert_eq!(points[1].color, [0.0, 1.0, 0.0]);
    }
}
