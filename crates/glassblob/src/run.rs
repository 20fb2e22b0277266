use std::path::Path;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use blobconfig::{BlobConfig, PowerSetting};
use renderer::{
    AnimationTuning, BlobSignal, GpuPowerPreference, GpuUnavailable, InteractionTuning, Palette,
    Renderer, RendererConfig, SurfaceAlpha,
};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::paths;

pub fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli);
    config
        .validate()
        .context("command-line overrides produced an invalid configuration")?;

    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let renderer = Renderer::new(renderer_config(&config));
    let signals = renderer.signals();
    let observer = thread::Builder::new()
        .name("glassblob-signals".into())
        .spawn(move || {
            for signal in signals.iter() {
                log_signal(signal);
            }
        })
        .context("failed to spawn signal observer")?;

    let outcome = renderer.run();
    join_observer(observer);

    match outcome {
        Ok(()) => Ok(()),
        Err(err) => match err.chain().find_map(|cause| cause.downcast_ref::<GpuUnavailable>()) {
            Some(unavailable) => {
                tracing::error!(error = %unavailable, "GPU rendering is unavailable on this system");
                Ok(())
            }
            None => Err(err),
        },
    }
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// An explicit `--config` must exist; the discovered file is optional.
fn load_config(explicit: Option<&Path>) -> Result<BlobConfig> {
    if let Some(path) = explicit {
        let config = BlobConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        return Ok(config);
    }

    let path = paths::config_file()?;
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no configuration file; using defaults");
        return Ok(BlobConfig::default());
    }
    let config = BlobConfig::load(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

fn apply_overrides(config: &mut BlobConfig, cli: &Cli) {
    if let Some((width, height)) = cli.size {
        config.window.width = width;
        config.window.height = height;
    }
    if let Some(fps) = cli.fps {
        config.render.fps = Some(fps);
    }
    if cli.transparent {
        config.window.transparent = true;
    }
    if cli.no_vsync {
        config.render.vsync = false;
    }
    if let Some(power) = cli.power {
        config.render.power = power;
    }
}

fn renderer_config(config: &BlobConfig) -> RendererConfig {
    let interaction = &config.interaction;
    let animation = &config.animation;
    let palette = &config.palette;
    RendererConfig {
        window_title: config.window.title.clone(),
        surface_size: (config.window.width, config.window.height),
        surface_alpha: if config.window.transparent {
            SurfaceAlpha::Transparent
        } else {
            SurfaceAlpha::Opaque
        },
        target_fps: config.render.fps,
        vsync: config.render.vsync,
        power: match config.render.power {
            PowerSetting::Low => GpuPowerPreference::Low,
            PowerSetting::High => GpuPowerPreference::High,
        },
        stats_interval: config.render.stats_interval,
        interaction: InteractionTuning {
            sensitivity: interaction.sensitivity,
            sway_gain: interaction.sway_gain,
            snap_velocity: interaction.snap_velocity,
            snap_threshold: interaction.snap_threshold,
            hit_margin: [interaction.hit_margin_x, interaction.hit_margin_y],
        },
        animation: AnimationTuning {
            drag_rate: animation.drag_rate,
            settle_rate: animation.settle_rate,
            content_lock_threshold: animation.content_lock_threshold,
        },
        palette: Palette {
            line_top: palette.line_top.0,
            line_bottom: palette.line_bottom.0,
            glass: palette.glass.0,
            tint: palette.tint.0,
            rim: palette.rim.0,
        },
    }
}

/// Returns `false` when the observer panicked.
fn join_observer(observer: JoinHandle<()>) -> bool {
    match observer.join() {
        Ok(()) => true,
        Err(_) => {
            tracing::warn!("signal observer thread panicked");
            false
        }
    }
}

fn log_signal(signal: BlobSignal) {
    match signal {
        BlobSignal::Progress(progress) => tracing::trace!(progress, "blob progress"),
        BlobSignal::ContentInteractive(interactive) => {
            tracing::info!(interactive, "content interactivity changed")
        }
        BlobSignal::Snapped { open } => tracing::debug!(open, "gesture resolved"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn overrides_replace_file_values() {
        let mut config = BlobConfig::default();
        let cli = Cli::try_parse_from([
            "glassblob",
            "--size",
            "640x480",
            "--fps",
            "24",
            "--no-vsync",
            "--power",
            "low",
        ])
        .unwrap();
        apply_overrides(&mut config, &cli);

        assert_eq!((config.window.width, config.window.height), (640, 480));
        assert_eq!(config.render.fps, Some(24.0));
        assert!(!config.render.vsync);
        assert_eq!(config.render.power, PowerSetting::Low);
        assert!(!config.window.transparent);
    }

    #[test]
    fn absent_flags_keep_file_values() {
        let mut config = BlobConfig::default();
        config.render.vsync = false;
        config.window.transparent = true;
        let cli = Cli::try_parse_from(["glassblob"]).unwrap();
        apply_overrides(&mut config, &cli);

        assert!(!config.render.vsync);
        assert!(config.window.transparent);
    }

    #[test]
    fn renderer_config_carries_every_section() {
        let mut config = BlobConfig::default();
        config.window.transparent = true;
        config.interaction.hit_margin_x = 0.2;
        config.interaction.hit_margin_y = 0.3;
        config.animation.settle_rate = 0.05;
        config.render.stats_interval = Duration::from_secs(5);
        config.palette.rim.0 = [0.5, 0.25, 0.0];

        let mapped = renderer_config(&config);
        assert_eq!(mapped.surface_alpha, SurfaceAlpha::Transparent);
        assert_eq!(mapped.surface_size, (1280, 800));
        assert_eq!(mapped.interaction.hit_margin, [0.2, 0.3]);
        assert_eq!(mapped.animation.settle_rate, 0.05);
        assert_eq!(mapped.stats_interval, Duration::from_secs(5));
        assert_eq!(mapped.palette.rim, [0.5, 0.25, 0.0]);
        assert_eq!(mapped.power, GpuPowerPreference::High);
    }

    #[test]
    fn defaults_match_renderer_defaults() {
        let mapped = renderer_config(&BlobConfig::default());
        let expected = RendererConfig::default();
        assert_eq!(mapped.window_title, expected.window_title);
        assert_eq!(mapped.interaction, expected.interaction);
        assert_eq!(mapped.animation, expected.animation);
        assert_eq!(mapped.palette, expected.palette);
    }

    #[test]
    fn observer_panic_is_reported() {
        let observer = thread::spawn(|| panic!("observer failed"));
        assert!(!join_observer(observer));
        assert!(join_observer(thread::spawn(|| {})));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("absent.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn explicit_config_is_loaded() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("blob.toml");
        fs::write(&path, "[window]\ntitle = \"Drawer\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.window.title, "Drawer");
    }
}
