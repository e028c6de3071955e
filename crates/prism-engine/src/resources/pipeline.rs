use crate::device::{GpuApi, GpuError, PipelineDesc};

use super::vertex::PointVertex;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Creates the triangle-list pipeline drawing [`PointVertex`] geometry into
/// `target_format`.
///
/// The shader module is only needed for creation; the caller may release it
/// once this returns.
pub fn create_point_pipeline<A: GpuApi + ?Sized>(
    api: &mut A,
    device: &A::Device,
    shader: &A::ShaderModule,
    target_format: wgpu::TextureFormat,
) -> Result<A::Pipeline, GpuError> {
    let layouts = [PointVertex::layout()];

    let desc = PipelineDesc {
        label: "prism point pipeline",
        vertex_entry: VERTEX_ENTRY,
        fragment_entry: FRAGMENT_ENTRY,
        vertex_layouts: &layouts,
        target_format,
        blend: Some(wgpu::BlendState::ALPHA_BLENDING),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        multisample: wgpu::MultisampleState::default(),
    };

    api.create_pipeline(device, shader, &desc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Kind, RecordingApi};

    #[test]
    fn pipeline_failure_is_reported() {
        let mut api = RecordingApi::new().fail_creating(Kind::Pipeline);
        let device = api.handle(Kind::Device);
        let shader = api.handle(Kind::ShaderModule);

        let err = create_point_pipeline(&mut api, &device, &shader, wgpu::TextureFormat::Bgra8UnormSrgb)
            .err()
            .unwrap();

        assert!(matches!(err, GpuError::ResourceCreation { what: "render pipeline", .. }));
    }

    #[test]
    fn pipeline_targets_surface_format() {
        let mut api = RecordingApi::new();
        let recorded = api.journal_handle();
        let device = api.handle(Kind::Device);
        let shader = api.handle(Kind::ShaderModule);

        let _pipeline =
            create_point_pipeline(&mut api, &device, &shader, wgpu::TextureFormat::Rgba8UnormSrgb)
                .unwrap();

        assert_eq!(recorded.pipeline_formats(), vec![wgpu::TextureFormat::Rgba8UnormSrgb]);
    }
}
