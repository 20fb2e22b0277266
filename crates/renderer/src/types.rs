use std::time::Duration;

use crate::animation::AnimationTuning;
use crate::interaction::InteractionTuning;

/// Declares how the compositor should treat the swapchain alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceAlpha {
    /// Frames fully cover the window.
    #[default]
    Opaque,
    /// Areas outside the blob and the highlight line show what lies behind the window.
    Transparent,
}

/// Adapter selection hint forwarded to `wgpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

impl From<GpuPowerPreference> for wgpu::PowerPreference {
    fn from(value: GpuPowerPreference) -> Self {
        match value {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        }
    }
}

/// Colors baked into the shader prelude. Components lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// Highlight line color at the top of the window.
    pub line_top: [f32; 3],
    /// Highlight line color at the bottom of the window.
    pub line_bottom: [f32; 3],
    /// Frosted base the blurred background is pulled toward.
    pub glass: [f32; 3],
    /// Color bleeding into the lower edge of the closed blob.
    pub tint: [f32; 3],
    /// Edge highlight along the blob outline.
    pub rim: [f32; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            line_top: [0.1, 0.529, 1.0],
            line_bottom: [0.0, 0.529, 1.0],
            glass: [0.929, 0.937, 0.949],
            tint: [0.008, 0.843, 1.0],
            rim: [1.0, 1.0, 1.0],
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// Mirrors the merged configuration file and CLI flags.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub window_title: String,
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    pub surface_alpha: SurfaceAlpha,
    /// Optional FPS cap; `None` renders on every display refresh.
    pub target_fps: Option<f32>,
    /// Prefer a tear-free present mode.
    pub vsync: bool,
    pub power: GpuPowerPreference,
    /// How often render statistics are logged at debug level.
    pub stats_interval: Duration,
    pub interaction: InteractionTuning,
    pub animation: AnimationTuning,
    pub palette: Palette,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            window_title: "Glass Blob".to_string(),
            surface_size: (1280, 800),
            surface_alpha: SurfaceAlpha::Opaque,
            target_fps: None,
            vsync: true,
            power: GpuPowerPreference::default(),
            stats_interval: Duration::from_secs(1),
            interaction: InteractionTuning::default(),
            animation: AnimationTuning::default(),
            palette: Palette::default(),
        }
    }
}
