//! Pointer gestures that open and close the blob.
//!
//! A gesture only starts when the pointer lands inside the blob's hit region.
//! While it is active, vertical motion drives the drawer openness and
//! horizontal motion sways the blob; the drawer itself eases toward those
//! targets in [`BlobInteraction::advance`]. Releasing the pointer resolves the
//! gesture into an open or closed state, preferring the release velocity over
//! the position reached.

use tracing::{debug, info, trace};

use crate::animation::{damp, AnimationTuning};
use crate::geometry::{BlobGeometry, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Dragging,
}

/// Animated values shared between gestures and the frame loop.
///
/// `drag_progress` and `target_drag_progress` stay within `[0, 1]`. `is_open`
/// records how the last gesture resolved and is not derived from the current
/// progress.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationState {
    pub drag_progress: f32,
    pub target_drag_progress: f32,
    pub sway_progress: f32,
    pub target_sway_progress: f32,
    pub is_dragging: bool,
    pub is_open: bool,
    pub drag_velocity: f32,
    pub last_drag_y: f32,
}

/// Offsets captured when a gesture starts so the blob does not jump to the
/// pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragAnchor {
    pub drag_offset: f32,
    pub sway_offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionTuning {
    /// Drag progress per unit of vertical pointer travel.
    pub sensitivity: f32,
    /// Sway per unit of horizontal pointer travel.
    pub sway_gain: f32,
    /// Release velocity beyond which the direction of travel decides the snap.
    pub snap_velocity: f32,
    /// Drag progress above which a slow release opens the blob.
    pub snap_threshold: f32,
    /// Extra grab area around the blob, per axis, in NDC units.
    pub hit_margin: [f32; 2],
}

impl Default for InteractionTuning {
    fn default() -> Self {
        Self {
            sensitivity: 0.7,
            sway_gain: 1.2,
            snap_velocity: 0.01,
            snap_threshold: 0.5,
            hit_margin: [0.1, 0.15],
        }
    }
}

impl InteractionTuning {
    /// Resolves a released gesture into open or closed.
    pub fn snap(&self, velocity: f32, drag_progress: f32) -> Snap {
        if velocity > self.snap_velocity {
            Snap {
                open: true,
                reason: SnapReason::Velocity,
            }
        } else if velocity < -self.snap_velocity {
            Snap {
                open: false,
                reason: SnapReason::Velocity,
            }
        } else {
            Snap {
                open: drag_progress > self.snap_threshold,
                reason: SnapReason::Position,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapReason {
    Velocity,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snap {
    pub open: bool,
    pub reason: SnapReason,
}

#[derive(Debug, Clone)]
pub struct BlobInteraction {
    state: AnimationState,
    anchor: Option<DragAnchor>,
    pointer: Option<PointerKind>,
    tuning: InteractionTuning,
    geometry: BlobGeometry,
}

impl BlobInteraction {
    pub fn new(tuning: InteractionTuning, geometry: BlobGeometry) -> Self {
        Self {
            state: AnimationState::default(),
            anchor: None,
            pointer: None,
            tuning,
            geometry,
        }
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn anchor(&self) -> Option<DragAnchor> {
        self.anchor
    }

    pub fn geometry(&self) -> &BlobGeometry {
        &self.geometry
    }

    pub fn phase(&self) -> GesturePhase {
        if self.state.is_dragging {
            GesturePhase::Dragging
        } else {
            GesturePhase::Idle
        }
    }

    /// Whether a pointer at physical position `(x, y)` would grab the blob.
    pub fn hit_test(&self, viewport: &Viewport, x: f64, y: f64) -> bool {
        let point = viewport.to_ndc(x, y);
        self.geometry
            .hit_region(
                self.state.drag_progress,
                self.state.sway_progress,
                self.tuning.hit_margin,
            )
            .contains(point)
    }

    /// Starts a gesture. Returns `false` when the pointer missed the blob or a
    /// gesture is already active.
    pub fn pointer_down(&mut self, viewport: &Viewport, kind: PointerKind, x: f64, y: f64) -> bool {
        if self.state.is_dragging {
            trace!(?kind, "pointer down ignored; gesture already active");
            return false;
        }
        if !self.hit_test(viewport, x, y) {
            trace!(?kind, x, y, "pointer down outside blob");
            return false;
        }

        let [raw_x, raw_y] = viewport.raw_pointer(x, y);
        let state = &mut self.state;
        self.anchor = Some(DragAnchor {
            drag_offset: state.drag_progress / self.tuning.sensitivity - raw_y,
            sway_offset: state.sway_progress / self.tuning.sway_gain - raw_x,
        });
        state.target_drag_progress = state.drag_progress;
        state.target_sway_progress = state.sway_progress;
        state.last_drag_y = state.drag_progress;
        state.drag_velocity = 0.0;
        state.is_dragging = true;
        self.pointer = Some(kind);
        debug!(?kind, progress = state.drag_progress, "gesture started");
        true
    }

    pub fn pointer_move(&mut self, viewport: &Viewport, kind: PointerKind, x: f64, y: f64) {
        let Some(anchor) = self.active_anchor(kind) else {
            return;
        };
        let [raw_x, raw_y] = viewport.raw_pointer(x, y);
        let desired = (raw_y + anchor.drag_offset) * self.tuning.sensitivity;
        let state = &mut self.state;
        state.target_drag_progress = desired.clamp(0.0, 1.0);
        state.target_sway_progress = (raw_x + anchor.sway_offset) * self.tuning.sway_gain;
        // Velocity follows the eased progress, so it only builds up across frames.
        state.drag_velocity = state.drag_progress - state.last_drag_y;
        state.last_drag_y = state.drag_progress;
    }

    /// Ends the active gesture and returns how it resolved. Ending while idle
    /// does nothing.
    pub fn pointer_up(&mut self, kind: PointerKind) -> Option<Snap> {
        self.active_anchor(kind)?;

        let snap = self
            .tuning
            .snap(self.state.drag_velocity, self.state.drag_progress);
        let state = &mut self.state;
        state.is_dragging = false;
        state.is_open = snap.open;
        state.target_drag_progress = if snap.open { 1.0 } else { 0.0 };
        state.target_sway_progress = 0.0;
        self.pointer = None;
        info!(
            open = snap.open,
            reason = ?snap.reason,
            velocity = state.drag_velocity,
            progress = state.drag_progress,
            "blob snapped"
        );
        Some(snap)
    }

    /// Abandons the active gesture as if it had been released.
    pub fn cancel(&mut self) -> Option<Snap> {
        let kind = self.pointer?;
        self.pointer_up(kind)
    }

    /// Eases drag and sway one frame toward their targets.
    pub fn advance(&mut self, tuning: &AnimationTuning) {
        let rate = tuning.rate(self.state.is_dragging);
        let state = &mut self.state;
        state.drag_progress =
            damp(state.drag_progress, state.target_drag_progress, rate).clamp(0.0, 1.0);
        state.sway_progress = damp(state.sway_progress, state.target_sway_progress, rate);
    }

    fn active_anchor(&self, kind: PointerKind) -> Option<DragAnchor> {
        if !self.state.is_dragging || self.pointer != Some(kind) {
            return None;
        }
        self.anchor
    }
}
