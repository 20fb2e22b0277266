use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level glassblob configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlobConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub interaction: InteractionSection,
    #[serde(default)]
    pub animation: AnimationSection,
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub palette: PaletteSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSection {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Request a compositor-blended surface instead of an opaque one.
    pub transparent: bool,
}

/// Gesture tuning. Units are normalised screen fractions.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InteractionSection {
    pub sensitivity: f32,
    pub sway_gain: f32,
    pub snap_velocity: f32,
    pub snap_threshold: f32,
    pub hit_margin_x: f32,
    pub hit_margin_y: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationSection {
    /// Per-frame damping rate while a finger or the mouse holds the blob.
    pub drag_rate: f32,
    /// Per-frame damping rate while the blob settles after release.
    pub settle_rate: f32,
    pub content_lock_threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    pub vsync: bool,
    pub power: PowerSetting,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub stats_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PaletteSection {
    pub line_top: Rgb,
    pub line_bottom: Rgb,
    pub glass: Rgb,
    pub tint: Rgb,
    pub rim: Rgb,
}

/// RGB triple in `[0, 1]`, accepted as `[r, g, b]` or `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub [f32; 3]);

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            window: WindowSection::default(),
            interaction: InteractionSection::default(),
            animation: AnimationSection::default(),
            render: RenderSection::default(),
            palette: PaletteSection::default(),
        }
    }
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: "Glass Blob".to_string(),
            width: 1280,
            height: 800,
            transparent: false,
        }
    }
}

impl Default for InteractionSection {
    fn default() -> Self {
        Self {
            sensitivity: 0.7,
            sway_gain: 1.2,
            snap_velocity: 0.01,
            snap_threshold: 0.5,
            hit_margin_x: 0.1,
            hit_margin_y: 0.15,
        }
    }
}

impl Default for AnimationSection {
    fn default() -> Self {
        Self {
            drag_rate: 0.09,
            settle_rate: 0.02,
            content_lock_threshold: 0.9,
        }
    }
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            fps: None,
            vsync: true,
            power: PowerSetting::High,
            stats_interval: Duration::from_secs(1),
        }
    }
}

impl Default for PaletteSection {
    fn default() -> Self {
        Self {
            line_top: Rgb([0.1, 0.529, 1.0]),
            line_bottom: Rgb([0.0, 0.529, 1.0]),
            glass: Rgb([0.929, 0.937, 0.949]),
            tint: Rgb([0.008, 0.843, 1.0]),
            rim: Rgb([1.0, 1.0, 1.0]),
        }
    }
}

impl BlobConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: BlobConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(
                "window width and height must be greater than zero".into(),
            ));
        }

        let interaction = &self.interaction;
        require_positive("interaction.sensitivity", interaction.sensitivity)?;
        require_positive("interaction.sway_gain", interaction.sway_gain)?;
        require_non_negative("interaction.snap_velocity", interaction.snap_velocity)?;
        require_unit("interaction.snap_threshold", interaction.snap_threshold)?;
        require_non_negative("interaction.hit_margin_x", interaction.hit_margin_x)?;
        require_non_negative("interaction.hit_margin_y", interaction.hit_margin_y)?;

        let animation = &self.animation;
        require_rate("animation.drag_rate", animation.drag_rate)?;
        require_rate("animation.settle_rate", animation.settle_rate)?;
        require_unit(
            "animation.content_lock_threshold",
            animation.content_lock_threshold,
        )?;

        if let Some(fps) = self.render.fps {
            require_non_negative("render.fps", fps)?;
        }
        if self.render.stats_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "render.stats_interval must be greater than zero".into(),
            ));
        }

        let palette = &self.palette;
        for (name, color) in [
            ("palette.line_top", palette.line_top),
            ("palette.line_bottom", palette.line_bottom),
            ("palette.glass", palette.glass),
            ("palette.tint", palette.tint),
            ("palette.rim", palette.rim),
        ] {
            if color.0.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(ConfigError::Invalid(format!(
                    "{name} components must lie within [0, 1]"
                )));
            }
        }

        Ok(())
    }
}

fn require_positive(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be > 0")))
    }
}

fn require_non_negative(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be >= 0")))
    }
}

fn require_unit(name: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must lie within [0, 1]")))
    }
}

// Damping must stay strictly inside (0, 1) or the blob either freezes or overshoots.
fn require_rate(name: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must lie strictly between 0 and 1"
        )))
    }
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl Serialize for Rgb {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Hex(String),
            Components([f32; 3]),
        }

        match Helper::deserialize(deserializer)? {
            Helper::Components(components) => Ok(Rgb(components)),
            Helper::Hex(raw) => parse_hex_color(&raw).map_err(de::Error::custom),
        }
    }
}

fn parse_hex_color(raw: &str) -> Result<Rgb, String> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.len() != 6 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(format!("invalid color '{raw}'; expected #rrggbb"));
    }
    let channel = |index: usize| -> Result<f32, String> {
        u8::from_str_radix(&digits[index..index + 2], 16)
            .map(|value| value as f32 / 255.0)
            .map_err(|err| format!("invalid color '{raw}': {err}"))
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r##"
version = 1

[window]
title = "Drawer"
width = 900
height = 600
transparent = true

[interaction]
sensitivity = 0.8
snap_threshold = 0.4

[animation]
settle_rate = 0.05

[render]
fps = 30
vsync = false
power = "low"
stats_interval = "5s"

[palette]
tint = "#ff8000"
glass = [0.5, 0.5, 0.5]
"##;

    #[test]
    fn parses_sample_config() {
        let config = BlobConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.window.title, "Drawer");
        assert_eq!((config.window.width, config.window.height), (900, 600));
        assert!(config.window.transparent);
        assert_eq!(config.interaction.sensitivity, 0.8);
        assert_eq!(config.interaction.snap_threshold, 0.4);
        assert_eq!(config.interaction.sway_gain, 1.2);
        assert_eq!(config.animation.settle_rate, 0.05);
        assert_eq!(config.animation.drag_rate, 0.09);
        assert_eq!(config.render.fps, Some(30.0));
        assert!(!config.render.vsync);
        assert_eq!(config.render.power, PowerSetting::Low);
        assert_eq!(config.render.stats_interval, Duration::from_secs(5));
        assert_eq!(config.palette.tint, Rgb([1.0, 128.0 / 255.0, 0.0]));
        assert_eq!(config.palette.glass, Rgb([0.5, 0.5, 0.5]));
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = BlobConfig::from_toml_str("").expect("parse empty config");
        assert_eq!(config, BlobConfig::default());
    }

    #[test]
    fn rejects_unknown_version() {
        let err = BlobConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_damping_rate_of_one() {
        let err = BlobConfig::from_toml_str("[animation]\ndrag_rate = 1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("drag_rate")));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let err = BlobConfig::from_toml_str("[interaction]\nsnap_threshold = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_color() {
        let err = BlobConfig::from_toml_str("[palette]\nrim = \"#12\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_color_outside_unit_range() {
        let err = BlobConfig::from_toml_str("[palette]\nrim = [1.0, 2.0, 0.0]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn serialised_defaults_parse_back() {
        let original = BlobConfig::default();
        let text = original.to_toml_string().expect("serialise defaults");
        assert!(text.contains("stats_interval = \"1s\""));
        let reparsed = BlobConfig::from_toml_str(&text).expect("reparse");
        assert_eq!(reparsed, original);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[window]\nwidth = 640\nheight = 480").expect("write config");
        let config = BlobConfig::load(file.path()).expect("load config");
        assert_eq!((config.window.width, config.window.height), (640, 480));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = BlobConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
