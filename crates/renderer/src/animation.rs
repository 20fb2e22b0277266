//! Frame-rate damping of the drawer animation.

/// Rates used by the per-frame damping step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationTuning {
    /// Fraction of the remaining distance covered per frame while a gesture is active.
    pub drag_rate: f32,
    /// Fraction of the remaining distance covered per frame while settling.
    pub settle_rate: f32,
    /// Drag progress above which overlaid content stops accepting input.
    pub content_lock_threshold: f32,
}

impl Default for AnimationTuning {
    fn default() -> Self {
        Self {
            drag_rate: 0.09,
            settle_rate: 0.02,
            content_lock_threshold: 0.9,
        }
    }
}

impl AnimationTuning {
    pub fn rate(&self, dragging: bool) -> f32 {
        if dragging {
            self.drag_rate
        } else {
            self.settle_rate
        }
    }

    pub fn content_interactive(&self, drag_progress: f32) -> bool {
        drag_progress <= self.content_lock_threshold
    }
}

/// Moves `current` toward `target` by `rate` of the remaining distance.
///
/// For `0 < rate < 1` the distance to the target shrinks every step and the
/// value never crosses it.
pub(crate) fn damp(current: f32, target: f32, rate: f32) -> f32 {
    current + (target - current) * rate
}
