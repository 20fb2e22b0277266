//! GPU side of the blob.
//!
//! - `context` owns the wgpu instance, device and surface and picks the
//!   swapchain format, present mode and alpha mode.
//! - `pipeline` builds the background and glass render pipelines from the
//!   composed WGSL.
//! - `offscreen` holds the background pass target together with the glass
//!   bind group that samples it; both are replaced on resize.
//! - `uniforms` is the per-frame record shared by both passes.
//! - `state` glues everything together and exposes the `GpuState` API used by
//!   `window`.

mod context;
mod offscreen;
mod pipeline;
mod state;
mod uniforms;

pub use context::GpuUnavailable;
pub(crate) use state::{FrameOutcome, GpuState};
pub(crate) use uniforms::BlobUniforms;
