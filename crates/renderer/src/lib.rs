//! Renderer crate for the glass blob.
//!
//! A frosted-glass drawer drawn with two `wgpu` passes and driven by pointer
//! gestures. The overall flow is:
//!
//! ```text
//!   glassblob (CLI)
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!                          │                                   │
//!          pointer/touch ──▶ Scene ──▶ advance() ──▶ BlobUniforms ─▶ GPU UBO
//!                                                              │
//!                     background pass ─▶ offscreen ─▶ glass pass ─▶ swapchain
//! ```
//!
//! `WindowState` owns the GPU resources and the `Scene`, the
//! explicit context object holding the animation state. Each frame the scene
//! eases toward its targets, the snapshot is uploaded, and the background and
//! glass passes are encoded into a single submission so the glass pass always
//! samples the background written in the same frame. Progress and gesture
//! outcomes are published on a channel returned by [`Renderer::signals`].

mod animation;
mod compile;
mod geometry;
mod gpu;
mod interaction;
mod runtime;
mod scene;
mod types;
mod window;

use anyhow::Result;
use crossbeam_channel::{bounded, Receiver, Sender};

pub use animation::AnimationTuning;
pub use geometry::{BlobGeometry, Viewport};
pub use gpu::GpuUnavailable;
pub use interaction::{
    AnimationState, BlobInteraction, DragAnchor, GesturePhase, InteractionTuning, PointerKind,
    Snap, SnapReason,
};
pub use runtime::{FrameClock, FrameScheduler};
pub use types::{GpuPowerPreference, Palette, RendererConfig, SurfaceAlpha};

/// Pending signals kept for a slow observer before new ones are dropped.
const SIGNAL_CAPACITY: usize = 256;

/// Observable output of the render loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlobSignal {
    /// Drawer openness after this frame's damping step, sent every frame.
    Progress(f32),
    /// Overlaid content should (or should no longer) accept input.
    ContentInteractive(bool),
    /// A gesture resolved.
    Snapped { open: bool },
}

/// Entry point that owns the window configuration and the signal channel.
pub struct Renderer {
    config: RendererConfig,
    signal_tx: Sender<BlobSignal>,
    signal_rx: Receiver<BlobSignal>,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        let (signal_tx, signal_rx) = bounded(SIGNAL_CAPACITY);
        Self {
            config,
            signal_tx,
            signal_rx,
        }
    }

    /// Receiver for [`BlobSignal`]s. May be called any number of times before
    /// [`Renderer::run`]; all receivers share one queue.
    pub fn signals(&self) -> Receiver<BlobSignal> {
        self.signal_rx.clone()
    }

    /// Opens the window and renders until it is closed.
    ///
    /// Fails with a [`GpuUnavailable`] in the error chain when no surface,
    /// adapter or device can be acquired.
    pub fn run(self) -> Result<()> {
        let Renderer {
            config,
            signal_tx,
            signal_rx,
        } = self;
        drop(signal_rx);
        tracing::info!(
            width = config.surface_size.0,
            height = config.surface_size.1,
            fps = ?config.target_fps,
            vsync = config.vsync,
            "starting glass blob"
        );
        window::run_window(config, signal_tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_share_one_queue() {
        let renderer = Renderer::new(RendererConfig::default());
        let first = renderer.signals();
        let second = renderer.signals();
        renderer
            .signal_tx
            .try_send(BlobSignal::Snapped { open: true })
            .expect("channel has room");
        assert_eq!(first.try_recv(), Ok(BlobSignal::Snapped { open: true }));
        assert!(second.try_recv().is_err());
    }

    #[test]
    fn channel_drops_when_observer_is_slow() {
        let renderer = Renderer::new(RendererConfig::default());
        for _ in 0..SIGNAL_CAPACITY {
            renderer
                .signal_tx
                .try_send(BlobSignal::Progress(0.0))
                .expect("channel has room");
        }
        assert!(renderer
            .signal_tx
            .try_send(BlobSignal::Progress(1.0))
            .is_err());
    }
}
