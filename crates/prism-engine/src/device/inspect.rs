//! Capability inspection and required-limit negotiation.
//!
//! Nothing here mutates GPU state. The report is diagnostic; the limit
//! negotiation keeps the device request within what the adapter supports.

use super::error::GpuError;

/// Vendor/device identity of an adapter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterIdentity {
    pub name: String,
    pub vendor_id: u32,
    pub device_id: u32,
    pub device_type: String,
    pub driver: String,
    pub driver_info: String,
    pub backend: String,
}

impl From<wgpu::AdapterInfo> for AdapterIdentity {
    fn from(info: wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name,
            vendor_id: info.vendor,
            device_id: info.device,
            device_type: format!("{:?}", info.device_type),
            driver: info.driver,
            driver_info: info.driver_info,
            backend: format!("{:?}", info.backend),
        }
    }
}

/// Limits, features and (for adapters) identity of a GPU object.
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub identity: Option<AdapterIdentity>,
    pub limits: wgpu::Limits,
    pub features: wgpu::Features,
}

impl Capabilities {
    /// Logs the full report at `info`, one line per entry.
    pub fn log(&self, subject: &str) {
        log::info!("{subject} limits:");
        for (name, value) in limit_rows(&self.limits) {
            log::info!("  - {name:<48} {value}");
        }

        log::info!("{subject} features: {:?}", self.features);

        if let Some(id) = &self.identity {
            log::info!("{subject} properties:");
            log::info!("  - name:         {}", id.name);
            log::info!("  - vendor id:    {:#06x}", id.vendor_id);
            log::info!("  - device id:    {:#06x}", id.device_id);
            log::info!("  - device type:  {}", id.device_type);
            log::info!("  - backend:      {}", id.backend);
            if !id.driver.is_empty() {
                log::info!("  - driver:       {}", id.driver);
            }
            if !id.driver_info.is_empty() {
                log::info!("  - driver info:  {}", id.driver_info);
            }
        }
    }
}

macro_rules! max_limits {
    ($mac:ident!($($args:tt)*)) => {
        $mac!($($args)*;
            max_texture_dimension_1d,
            max_texture_dimension_2d,
            max_texture_dimension_3d,
            max_texture_array_layers,
            max_bind_groups,
            max_bindings_per_bind_group,
            max_dynamic_uniform_buffers_per_pipeline_layout,
            max_dynamic_storage_buffers_per_pipeline_layout,
            max_sampled_textures_per_shader_stage,
            max_samplers_per_shader_stage,
            max_storage_buffers_per_shader_stage,
            max_storage_textures_per_shader_stage,
            max_uniform_buffers_per_shader_stage,
            max_binding_array_elements_per_shader_stage,
            max_binding_array_sampler_elements_per_shader_stage,
            max_uniform_buffer_binding_size,
            max_storage_buffer_binding_size,
            max_vertex_buffers,
            max_buffer_size,
            max_vertex_attributes,
            max_vertex_buffer_array_stride,
            max_inter_stage_shader_components,
            max_color_attachments,
            max_color_attachment_bytes_per_sample,
            max_compute_workgroup_storage_size,
            max_compute_invocations_per_workgroup,
            max_compute_workgroup_size_x,
            max_compute_workgroup_size_y,
            max_compute_workgroup_size_z,
            max_compute_workgroups_per_dimension,
            max_immediate_size,
            max_non_sampler_bindings,
            max_task_mesh_workgroup_total_count,
            max_task_mesh_workgroups_per_dimension,
            max_task_invocations_per_workgroup,
            max_task_invocations_per_dimension,
            max_mesh_invocations_per_workgroup,
            max_mesh_invocations_per_dimension,
            max_task_payload_size,
            max_mesh_output_vertices,
            max_mesh_output_primitives,
            max_mesh_output_layers,
            max_mesh_multiview_view_count,
            max_blas_primitive_count,
            max_blas_geometry_count,
            max_tlas_instance_count,
            max_acceleration_structures_per_shader_stage,
            max_multiview_view_count
        )
    };
}

macro_rules! alignment_limits {
    ($mac:ident!($($args:tt)*)) => {
        $mac!($($args)*;
            min_uniform_buffer_offset_alignment,
            min_storage_buffer_offset_alignment
        )
    };
}

macro_rules! rows {
    ($limits:ident, $rows:ident; $($field:ident),*) => {
        $( $rows.push((stringify!($field), $limits.$field.to_string())); )*
    };
}

macro_rules! clamp_max {
    ($wanted:ident, $supported:ident; $($field:ident),*) => {
        $( $wanted.$field = $wanted.$field.min($supported.$field); )*
    };
}

macro_rules! clamp_alignment {
    ($wanted:ident, $supported:ident; $($field:ident),*) => {
        $( $wanted.$field = $wanted.$field.max($supported.$field); )*
    };
}

/// Returns `(name, value)` pairs for the reported limits, in a stable order.
pub fn limit_rows(limits: &wgpu::Limits) -> Vec<(&'static str, String)> {
    let mut out = Vec::new();
    max_limits!(rows!(limits, out));
    alignment_limits!(rows!(limits, out));
    out
}

/// Vertex-side requirements of the renderer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LimitNeeds {
    pub vertex_attributes: u32,
    pub vertex_buffers: u32,
    pub vertex_stride: u32,
    /// Largest single buffer the renderer will create, in bytes.
    pub buffer_size: u64,
}

/// Computes the limits to request from the device.
///
/// Starts from the downlevel baseline, pins the vertex limits to exactly what
/// the renderer uses, and lifts texture dimensions to the adapter's so the
/// surface can match any window size. The result never exceeds a `max_*`
/// limit of the adapter nor undercuts one of its alignments.
pub fn required_limits(
    supported: &wgpu::Limits,
    needs: &LimitNeeds,
) -> Result<wgpu::Limits, GpuError> {
    check_need(
        "max_vertex_attributes",
        needs.vertex_attributes.into(),
        supported.max_vertex_attributes.into(),
    )?;
    check_need(
        "max_vertex_buffers",
        needs.vertex_buffers.into(),
        supported.max_vertex_buffers.into(),
    )?;
    check_need(
        "max_vertex_buffer_array_stride",
        needs.vertex_stride.into(),
        supported.max_vertex_buffer_array_stride.into(),
    )?;
    check_need("max_buffer_size", needs.buffer_size, supported.max_buffer_size)?;

    let mut wanted = wgpu::Limits::downlevel_defaults();
    wanted.max_vertex_attributes = needs.vertex_attributes;
    wanted.max_vertex_buffers = needs.vertex_buffers;
    wanted.max_vertex_buffer_array_stride = needs.vertex_stride;
    wanted.max_buffer_size = wanted.max_buffer_size.max(needs.buffer_size);
    wanted.max_texture_dimension_1d = supported.max_texture_dimension_1d;
    wanted.max_texture_dimension_2d = supported.max_texture_dimension_2d;

    max_limits!(clamp_max!(wanted, supported));
    alignment_limits!(clamp_alignment!(wanted, supported));

    // Catches limits added to wgpu but missing from the lists above.
    let mut over = None;
    wanted.check_limits_with_fail_fn(supported, true, |limit, requested, allowed| {
        over = Some((limit, requested, allowed));
    });
    if let Some((limit, needed, supported)) = over {
        log::error!("requested {limit} = {needed} exceeds adapter's {supported}");
        return Err(GpuError::LimitsUnsupported { limit, needed, supported });
    }

    Ok(wanted)
}

fn check_need(limit: &'static str, needed: u64, supported: u64) -> Result<(), GpuError> {
    if needed > supported {
        log::error!("adapter supports {limit} = {supported}, renderer needs {needed}");
        return Err(GpuError::LimitsUnsupported { limit, needed, supported });
    }
    Ok(())
}
