//! Explicit per-window context: animation state, viewport and tuning.
//!
//! Input handlers and the frame loop both go through [`Scene`]; nothing about
//! the blob lives in globals.

use winit::dpi::PhysicalSize;

use crate::animation::AnimationTuning;
use crate::geometry::{BlobGeometry, Viewport};
use crate::gpu::BlobUniforms;
use crate::interaction::{BlobInteraction, InteractionTuning, PointerKind, Snap};

/// Values produced by one frame step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FrameSnapshot {
    pub uniforms: BlobUniforms,
    pub progress: f32,
    pub content_interactive: bool,
    /// Set when `content_interactive` differs from the previous frame.
    pub content_changed: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct Scene {
    interaction: BlobInteraction,
    viewport: Viewport,
    animation: AnimationTuning,
    content_interactive: bool,
}

impl Scene {
    pub fn new(
        size: PhysicalSize<u32>,
        interaction: InteractionTuning,
        animation: AnimationTuning,
        geometry: BlobGeometry,
    ) -> Self {
        Self {
            interaction: BlobInteraction::new(interaction, geometry),
            viewport: Viewport::from_size(size),
            animation,
            content_interactive: true,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[cfg(test)]
    pub fn state(&self) -> &crate::interaction::AnimationState {
        self.interaction.state()
    }

    /// Returns `true` when the viewport changed.
    pub fn resize(&mut self, size: PhysicalSize<u32>) -> bool {
        let viewport = Viewport::from_size(size);
        if viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        true
    }

    pub fn pointer_down(&mut self, kind: PointerKind, x: f64, y: f64) -> bool {
        self.interaction.pointer_down(&self.viewport, kind, x, y)
    }

    pub fn pointer_move(&mut self, kind: PointerKind, x: f64, y: f64) {
        self.interaction.pointer_move(&self.viewport, kind, x, y);
    }

    pub fn pointer_up(&mut self, kind: PointerKind) -> Option<Snap> {
        self.interaction.pointer_up(kind)
    }

    pub fn cancel_gesture(&mut self) -> Option<Snap> {
        self.interaction.cancel()
    }

    /// Damps the animation one frame and snapshots the result.
    pub fn advance(&mut self, seconds: f32) -> FrameSnapshot {
        self.interaction.advance(&self.animation);
        let state = self.interaction.state();
        let uniforms = BlobUniforms::new(
            seconds,
            state.drag_progress,
            state.sway_progress,
            self.viewport.aspect_ratio(),
        );
        let content_interactive = self.animation.content_interactive(state.drag_progress);
        let content_changed = content_interactive != self.content_interactive;
        self.content_interactive = content_interactive;
        FrameSnapshot {
            uniforms,
            progress: state.drag_progress,
            content_interactive,
            content_changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(width: u32, height: u32) -> Scene {
        Scene::new(
            PhysicalSize::new(width, height),
            InteractionTuning::default(),
            AnimationTuning::default(),
            BlobGeometry::default(),
        )
    }

    #[test]
    fn snapshot_carries_time_and_aspect() {
        let mut scene = scene(800, 400);
        let frame = scene.advance(2.5);
        assert_eq!(frame.uniforms.time, 2.5);
        assert_eq!(frame.uniforms.aspect_ratio, 2.0);
        assert_eq!(frame.uniforms.drag_progress, 0.0);
        assert!(frame.content_interactive);
        assert!(!frame.content_changed);
    }

    #[test]
    fn resize_updates_next_uniforms_and_hit_test() {
        let mut scene = scene(800, 800);
        assert_eq!(scene.advance(0.0).uniforms.aspect_ratio, 1.0);

        // 30% across the width grabs the closed blob at 1:1.
        assert!(scene.pointer_down(PointerKind::Mouse, 240.0, 780.0));
        assert!(scene.pointer_up(PointerKind::Mouse).is_some());

        assert!(scene.resize(PhysicalSize::new(1600, 800)));
        assert!(!scene.resize(PhysicalSize::new(1600, 800)));
        let frame = scene.advance(0.016);
        assert_eq!(frame.uniforms.aspect_ratio, 2.0);

        // The same relative position misses once the view is twice as wide.
        assert!(!scene.pointer_down(PointerKind::Mouse, 480.0, 780.0));
        assert!(scene.pointer_down(PointerKind::Mouse, 800.0, 780.0));
    }

    #[test]
    fn content_lock_toggles_once_past_threshold() {
        let mut scene = scene(800, 800);
        assert!(scene.pointer_down(PointerKind::Mouse, 400.0, 780.0));
        scene.pointer_move(PointerKind::Mouse, 400.0, -800.0);

        let mut changes = Vec::new();
        for frame in 0..300 {
            let snapshot = scene.advance(frame as f32 / 60.0);
            assert!((0.0..=1.0).contains(&snapshot.progress));
            if snapshot.content_changed {
                changes.push((snapshot.progress, snapshot.content_interactive));
            }
        }
        assert_eq!(changes.len(), 1);
        let (progress, interactive) = changes[0];
        assert!(progress > 0.9);
        assert!(!interactive);

        let snap = scene.pointer_up(PointerKind::Mouse).expect("gesture resolves");
        assert!(snap.open);
        assert!(scene.state().is_open);
    }
}
