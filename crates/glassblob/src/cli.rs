use std::path::PathBuf;

use blobconfig::PowerSetting;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "glassblob",
    author,
    version,
    about = "Frosted-glass drawer you can drag open and shut"
)]
pub struct Cli {
    /// Configuration file to load instead of the discovered `config.toml`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Initial window size in physical pixels (e.g. `1280x800`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Optional FPS cap (0=uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Let the desktop show through everywhere except the blob and the line.
    #[arg(long)]
    pub transparent: bool,

    /// Present immediately instead of waiting for vertical blank.
    #[arg(long)]
    pub no_vsync: bool,

    /// Adapter power preference: `low` or `high`.
    #[arg(long, value_name = "low|high", value_parser = parse_power)]
    pub power: Option<PowerSetting>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{value}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{value}'"))?;
    if width == 0 || height == 0 {
        return Err("width and height must be greater than zero".to_string());
    }
    Ok((width, height))
}

fn parse_power(value: &str) -> Result<PowerSetting, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" => Ok(PowerSetting::Low),
        "high" => Ok(PowerSetting::High),
        other => Err(format!("unknown power preference '{other}' (use low or high)")),
    }
}
