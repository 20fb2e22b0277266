use std::time::{Duration, Instant};

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, trace};
use winit::dpi::PhysicalSize;

use crate::geometry::BlobGeometry;
use crate::types::RendererConfig;

use super::context::GpuContext;
use super::offscreen::{create_backdrop_sampler, OffscreenTarget};
use super::pipeline::{BlobPipelines, PipelineLayouts};
use super::uniforms::{write_uniforms, BlobUniforms};

const CLEAR: wgpu::Color = wgpu::Color::TRANSPARENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameOutcome {
    Presented,
    /// The offscreen target is missing or sized for a previous surface; try
    /// again next frame.
    Deferred,
}

pub(crate) struct GpuState {
    context: GpuContext,
    layouts: PipelineLayouts,
    pipelines: BlobPipelines,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    offscreen: Option<OffscreenTarget>,
    stats: FrameStats,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        config: &RendererConfig,
        geometry: &BlobGeometry,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(
            target,
            initial_size,
            config.power,
            config.vsync,
            config.surface_alpha,
        )?;
        let layouts = PipelineLayouts::new(&context.device);
        let pipelines = BlobPipelines::new(
            &context.device,
            &layouts,
            context.surface_format,
            geometry,
            &config.palette,
        )?;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform buffer"),
            size: BlobUniforms::byte_size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform bind group"),
                layout: &layouts.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });
        let sampler = create_backdrop_sampler(&context.device);
        write_uniforms(&context.queue, &uniform_buffer, &BlobUniforms::default());

        let mut state = Self {
            context,
            layouts,
            pipelines,
            uniform_buffer,
            uniform_bind_group,
            sampler,
            offscreen: None,
            stats: FrameStats::new(config.stats_interval),
        };
        state.rebuild_offscreen();
        Ok(state)
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    /// Reconfigures the swapchain and replaces the offscreen target. Runs
    /// between frames on the event loop thread.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if self.context.resize(new_size) {
            self.rebuild_offscreen();
        }
    }

    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    // The replacement is fully built before the old target is dropped.
    fn rebuild_offscreen(&mut self) {
        let target = OffscreenTarget::new(
            &self.context.device,
            &self.layouts,
            &self.uniform_buffer,
            &self.sampler,
            self.context.surface_format,
            self.context.size,
        );
        debug!(
            width = target.size.width,
            height = target.size.height,
            "rebuilt background target"
        );
        self.offscreen = Some(target);
    }

    /// Uploads `uniforms`, then draws the background pass into the offscreen
    /// target and the glass pass into the swapchain in one submission.
    pub(crate) fn render(
        &mut self,
        uniforms: &BlobUniforms,
    ) -> Result<FrameOutcome, wgpu::SurfaceError> {
        let target_size = self.offscreen.as_ref().map(|target| target.size);
        let (FrameOutcome::Presented, Some(target)) = (
            readiness(target_size, self.context.size),
            self.offscreen.as_ref(),
        ) else {
            trace!(?target_size, "background target not ready; deferring frame");
            return Ok(FrameOutcome::Deferred);
        };

        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        write_uniforms(&self.context.queue, &self.uniform_buffer, uniforms);

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("blob frame encoder"),
                });

        {
            let mut pass = begin_clear_pass(&mut encoder, "background pass", &target.view);
            pass.set_pipeline(&self.pipelines.background);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        {
            let mut pass = begin_clear_pass(&mut encoder, "glass pass", &view);
            pass.set_pipeline(&self.pipelines.glass);
            pass.set_bind_group(0, &target.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.stats.record(Instant::now(), uniforms);
        Ok(FrameOutcome::Presented)
    }
}

/// A frame can only be drawn once the background target matches the surface.
fn readiness(target_size: Option<PhysicalSize<u32>>, surface_size: PhysicalSize<u32>) -> FrameOutcome {
    match target_size {
        Some(size) if size == surface_size => FrameOutcome::Presented,
        _ => FrameOutcome::Deferred,
    }
}

fn begin_clear_pass<'encoder>(
    encoder: &'encoder mut wgpu::CommandEncoder,
    label: &'static str,
    view: &wgpu::TextureView,
) -> wgpu::RenderPass<'encoder> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(CLEAR),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    })
}

/// Frame counter that reports throughput at a fixed interval.
struct FrameStats {
    interval: Duration,
    last_report: Instant,
    frames: u32,
    total_frames: u64,
}

impl FrameStats {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_report: Instant::now(),
            frames: 0,
            total_frames: 0,
        }
    }

    /// Returns the measured rate when a report is due.
    fn record(&mut self, now: Instant, uniforms: &BlobUniforms) -> Option<f32> {
        self.frames += 1;
        self.total_frames += 1;
        let elapsed = now.saturating_duration_since(self.last_report);
        if elapsed < self.interval {
            return None;
        }
        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.last_report = now;
        debug!(
            fps = fps.round(),
            frame_count = self.total_frames,
            time = uniforms.time,
            progress = uniforms.drag_progress,
            "render stats"
        );
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_background_target_defers_frame() {
        assert_eq!(
            readiness(None, PhysicalSize::new(800, 600)),
            FrameOutcome::Deferred
        );
    }

    #[test]
    fn stale_background_target_defers_frame() {
        let surface = PhysicalSize::new(1600, 900);
        assert_eq!(
            readiness(Some(PhysicalSize::new(800, 600)), surface),
            FrameOutcome::Deferred
        );
        assert_eq!(
            readiness(Some(PhysicalSize::new(1600, 600)), surface),
            FrameOutcome::Deferred
        );
        assert_eq!(readiness(Some(surface), surface), FrameOutcome::Presented);
    }

    #[test]
    fn stats_report_once_per_interval() {
        let mut stats = FrameStats::new(Duration::from_secs(1));
        let start = stats.last_report;
        let uniforms = BlobUniforms::default();
        for frame in 1..60 {
            let now = start + Duration::from_millis(frame * 16);
            assert_eq!(stats.record(now, &uniforms), None);
        }
        let fps = stats
            .record(start + Duration::from_secs(1), &uniforms)
            .expect("report due");
        assert_eq!(fps, 60.0);
        assert_eq!(stats.frames, 0);
        assert_eq!(
            stats.record(start + Duration::from_millis(1016), &uniforms),
            None
        );
    }
}
