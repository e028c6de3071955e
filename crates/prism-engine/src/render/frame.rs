//! Per-frame execution: acquire, encode, submit, present, idle.

use std::collections::HashMap;

use crate::device::{GpuApi, GpuError, SurfaceErrorAction, SurfaceStatus};
use crate::resources::{DrawCall, Scene};

/// Frames between two statistics reports.
const STATS_INTERVAL: u64 = 600;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FramePhase {
    AcquireTarget,
    Encode,
    Submit,
    Present,
    Idle,
}

/// Result of one non-fatal frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Presented,
    /// No target this frame; nothing was encoded, submitted or presented.
    Skipped(SurfaceStatus),
    /// Drawable is zero-sized or the renderer is shut down.
    Suspended,
}

/// Frame counters.
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    pub presented: u64,
    pub skipped: u64,
    pub skipped_by_status: HashMap<SurfaceStatus, u64>,
    pub consecutive_skips: u32,
}

impl FrameStats {
    fn record_presented(&mut self) {
        self.presented += 1;
        self.consecutive_skips = 0;

        if self.presented % STATS_INTERVAL == 0 {
            log::debug!(
                "frames: {} presented, {} skipped",
                self.presented,
                self.skipped
            );
        }
    }

    /// Returns `true` the first time `status` is seen.
    fn record_skipped(&mut self, status: SurfaceStatus) -> bool {
        self.skipped += 1;
        self.consecutive_skips += 1;
        let seen = self.skipped_by_status.entry(status).or_insert(0);
        *seen += 1;
        *seen == 1
    }
}

/// Everything a frame reads; borrowed from the renderer for one frame.
pub struct FrameContext<'a, A: GpuApi> {
    pub surface: &'a A::Surface,
    pub device: &'a A::Device,
    pub queue: &'a A::Queue,
    pub config: &'a wgpu::SurfaceConfiguration,
    pub scene: &'a Scene<A>,
    pub clear: wgpu::Color,
}

/// Drives one frame at a time through its phases.
///
/// The surface frame is released when `present` returns, so at most one frame
/// is alive, and the next acquisition always follows the previous present.
#[derive(Debug)]
pub struct FrameExecutor {
    phase: FramePhase,
    stats: FrameStats,
}

impl Default for FrameExecutor {
    fn default() -> Self {
        Self {
            phase: FramePhase::Idle,
            stats: FrameStats::default(),
        }
    }
}

impl FrameExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Runs one frame.
    ///
    /// `Err` is fatal for the run: creation failures while encoding, or an
    /// out-of-memory surface.
    pub fn execute<A: GpuApi>(
        &mut self,
        api: &mut A,
        ctx: &FrameContext<'_, A>,
    ) -> Result<FrameOutcome, GpuError> {
        let result = self.run_phases(api, ctx);
        self.phase = FramePhase::Idle;
        if let Err(e) = &result {
            log::error!("frame failed: {e}");
        }
        result
    }

    fn run_phases<A: GpuApi>(
        &mut self,
        api: &mut A,
        ctx: &FrameContext<'_, A>,
    ) -> Result<FrameOutcome, GpuError> {
        self.phase = FramePhase::AcquireTarget;
        let frame = match api.acquire_frame(ctx.surface) {
            Ok(frame) => frame,
            Err(status) => return self.skip(api, ctx, status),
        };

        self.phase = FramePhase::Encode;
        let mut encoder = api.create_encoder(ctx.device)?;
        encode_pass(api, &mut encoder, &frame, ctx)?;

        self.phase = FramePhase::Submit;
        let commands = api.finish(ctx.device, encoder)?;
        api.submit(ctx.queue, commands);

        self.phase = FramePhase::Present;
        api.present(frame);

        self.phase = FramePhase::Idle;
        api.poll(ctx.device);

        self.stats.record_presented();
        Ok(FrameOutcome::Presented)
    }

    fn skip<A: GpuApi>(
        &mut self,
        api: &mut A,
        ctx: &FrameContext<'_, A>,
        status: SurfaceStatus,
    ) -> Result<FrameOutcome, GpuError> {
        match status.action() {
            SurfaceErrorAction::Fatal => {
                return Err(GpuError::SurfaceAcquisition(format!(
                    "surface texture acquisition failed: {status}"
                )));
            }
            SurfaceErrorAction::Reconfigure => {
                api.configure_surface(ctx.surface, ctx.device, ctx.config);
            }
            SurfaceErrorAction::SkipFrame => {}
        }

        if self.stats.record_skipped(status) {
            log::warn!("surface texture unavailable ({status}); skipping frame");
        } else {
            log::debug!("surface texture unavailable ({status}); skipping frame");
        }
        Ok(FrameOutcome::Skipped(status))
    }
}

/// Records the frame's single render pass: bind the scene, issue its draw.
fn encode_pass<A: GpuApi>(
    api: &mut A,
    encoder: &mut A::Encoder,
    frame: &A::Frame,
    ctx: &FrameContext<'_, A>,
) -> Result<(), GpuError> {
    let scene = ctx.scene;
    let mut pass = api.begin_pass(encoder, frame, ctx.clear)?;

    api.set_pipeline(&mut pass, scene.pipeline());
    for (slot, buffer) in (0u32..).zip(scene.vertex_buffers()) {
        api.set_vertex_buffer(&mut pass, slot, buffer.handle());
    }
    if let Some(indices) = scene.index_buffer() {
        api.set_index_buffer(&mut pass, indices.handle());
    }

    match scene.draw() {
        DrawCall::Indexed { index_count, instance_count } => {
            api.draw_indexed(&mut pass, 0..index_count, 0..instance_count)
        }
        DrawCall::Direct { vertex_count, instance_count } => {
            api.draw(&mut pass, 0..vertex_count, 0..instance_count)
        }
    }

    api.end_pass(pass);
    Ok(())
}
