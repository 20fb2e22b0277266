use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::types::{GpuPowerPreference, SurfaceAlpha};

/// The host cannot provide what the blob needs to draw. Reported once; there is
/// no fallback rendering path.
#[derive(Debug, thiserror::Error)]
pub enum GpuUnavailable {
    #[error("failed to acquire native window handles: {0}")]
    WindowHandle(#[source] raw_window_handle::HandleError),
    #[error("failed to create rendering surface: {0}")]
    Surface(#[source] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[source] wgpu::RequestAdapterError),
    #[error("adapter cannot present to this window")]
    IncompatibleSurface,
    #[error("failed to create GPU device: {0}")]
    Device(#[source] wgpu::RequestDeviceError),
}

pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub surface_format: wgpu::TextureFormat,
}

impl GpuContext {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        power: GpuPowerPreference,
        vsync: bool,
        surface_alpha: SurfaceAlpha,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(GpuUnavailable::WindowHandle)?;
        let display_handle = target
            .display_handle()
            .map_err(GpuUnavailable::WindowHandle)?;

        // The window outlives the surface: both are owned by the window state and
        // the surface is dropped first.
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .map_err(GpuUnavailable::Surface)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: power.into(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(GpuUnavailable::Adapter)?;

        let adapter_info = adapter.get_info();
        let limits = adapter.limits();
        tracing::debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            ?power,
            "selected GPU adapter"
        );

        let max_dimension = limits.max_texture_dimension_2d;
        let requested_width = initial_size.width.max(1);
        let requested_height = initial_size.height.max(1);
        if requested_width > max_dimension || requested_height > max_dimension {
            anyhow::bail!(
                "GPU max texture dimension is {max_dimension}, requested surface is {width}x{height}",
                max_dimension = max_dimension,
                width = requested_width,
                height = requested_height
            );
        }

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = choose_surface_format(&surface_caps.formats)
            .ok_or(GpuUnavailable::IncompatibleSurface)?;
        if surface_format.is_srgb() {
            tracing::warn!(
                ?surface_format,
                "no linear (non-sRGB) surface format available; colors will look washed out"
            );
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("glassblob device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .map_err(GpuUnavailable::Device)?;

        let present_mode = choose_present_mode(&surface_caps.present_modes, vsync);
        let alpha_mode = choose_alpha_mode(&surface_caps.alpha_modes, surface_alpha);
        if surface_alpha == SurfaceAlpha::Transparent
            && alpha_mode == wgpu::CompositeAlphaMode::Opaque
        {
            tracing::warn!(
                supported = ?surface_caps.alpha_modes,
                "compositor does not support transparent surfaces; rendering opaque"
            );
        }
        tracing::debug!(?present_mode, ?alpha_mode, ?surface_format, "configured surface");

        let size = PhysicalSize::new(requested_width, requested_height);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            surface_format,
        })
    }

    /// Reconfigures the swapchain. Zero-sized requests (minimised windows) are
    /// ignored and the previous size is kept.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) -> bool {
        if new_size.width == 0 || new_size.height == 0 {
            return false;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        true
    }

    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// Shader colors are authored in gamma space, so a non-sRGB target keeps them
/// as written.
pub(crate) fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|format| !format.is_srgb())
        .or_else(|| formats.first().copied())
}

pub(crate) fn choose_present_mode(modes: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    let find = |wanted: wgpu::PresentMode| modes.iter().copied().find(|mode| *mode == wanted);
    let fallback = find(wgpu::PresentMode::Fifo)
        .or_else(|| modes.first().copied())
        .unwrap_or(wgpu::PresentMode::Fifo);
    if vsync {
        fallback
    } else {
        find(wgpu::PresentMode::Immediate)
            .or_else(|| find(wgpu::PresentMode::Mailbox))
            .unwrap_or(fallback)
    }
}

pub(crate) fn choose_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    surface_alpha: SurfaceAlpha,
) -> wgpu::CompositeAlphaMode {
    let find = |wanted: wgpu::CompositeAlphaMode| modes.iter().copied().find(|mode| *mode == wanted);
    let opaque = find(wgpu::CompositeAlphaMode::Opaque)
        .or_else(|| modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);
    match surface_alpha {
        SurfaceAlpha::Opaque => opaque,
        SurfaceAlpha::Transparent => find(wgpu::CompositeAlphaMode::PreMultiplied)
            .or_else(|| find(wgpu::CompositeAlphaMode::PostMultiplied))
            .unwrap_or(opaque),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{CompositeAlphaMode, PresentMode, TextureFormat};

    #[test]
    fn vsync_prefers_fifo() {
        let modes = [PresentMode::Immediate, PresentMode::Mailbox, PresentMode::Fifo];
        assert_eq!(choose_present_mode(&modes, true), PresentMode::Fifo);
    }

    #[test]
    fn no_vsync_prefers_immediate_then_mailbox() {
        let all = [PresentMode::Fifo, PresentMode::Mailbox, PresentMode::Immediate];
        assert_eq!(choose_present_mode(&all, false), PresentMode::Immediate);
        let no_immediate = [PresentMode::Fifo, PresentMode::Mailbox];
        assert_eq!(choose_present_mode(&no_immediate, false), PresentMode::Mailbox);
        let fifo_only = [PresentMode::Fifo];
        assert_eq!(choose_present_mode(&fifo_only, false), PresentMode::Fifo);
    }

    #[test]
    fn present_mode_falls_back_to_first_supported() {
        let modes = [PresentMode::FifoRelaxed];
        assert_eq!(choose_present_mode(&modes, true), PresentMode::FifoRelaxed);
        assert_eq!(choose_present_mode(&[], true), PresentMode::Fifo);
    }

    #[test]
    fn transparent_prefers_premultiplied() {
        let modes = [
            CompositeAlphaMode::Opaque,
            CompositeAlphaMode::PostMultiplied,
            CompositeAlphaMode::PreMultiplied,
        ];
        assert_eq!(
            choose_alpha_mode(&modes, SurfaceAlpha::Transparent),
            CompositeAlphaMode::PreMultiplied
        );
        assert_eq!(
            choose_alpha_mode(&modes, SurfaceAlpha::Opaque),
            CompositeAlphaMode::Opaque
        );
    }

    #[test]
    fn transparent_degrades_to_opaque() {
        let modes = [CompositeAlphaMode::Opaque];
        assert_eq!(
            choose_alpha_mode(&modes, SurfaceAlpha::Transparent),
            CompositeAlphaMode::Opaque
        );
    }

    #[test]
    fn surface_format_prefers_linear_encoding() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(
            choose_surface_format(&formats),
            Some(TextureFormat::Bgra8Unorm)
        );
        let srgb_only = [TextureFormat::Rgba8UnormSrgb];
        assert_eq!(
            choose_surface_format(&srgb_only),
            Some(TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(choose_surface_format(&[]), None);
    }
}
