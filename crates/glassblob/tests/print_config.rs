use std::fs;
use std::process::{Command, Output};

use blobconfig::{BlobConfig, PowerSetting};
use tempfile::TempDir;

fn glassblob(config_dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_glassblob"))
        .env("GLASSBLOB_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run glassblob")
}

fn printed_config(output: &Output) -> BlobConfig {
    assert!(
        output.status.success(),
        "glassblob failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout.clone()).expect("utf-8 output");
    BlobConfig::from_toml_str(&stdout).expect("printed config parses")
}

#[test]
fn prints_defaults_without_a_config_file() {
    let root = TempDir::new().unwrap();

    let output = glassblob(root.path(), &["--print-config"]);

    assert_eq!(printed_config(&output), BlobConfig::default());
}

#[test]
fn discovered_config_and_flags_are_merged() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        r##"
[window]
title = "Drawer"
transparent = true

[render]
fps = 60.0
stats_interval = "5s"

[palette]
rim = "#ff8000"
"##,
    )
    .unwrap();

    let output = glassblob(
        root.path(),
        &["--print-config", "--size", "900x700", "--power", "low"],
    );
    let config = printed_config(&output);

    assert_eq!(config.window.title, "Drawer");
    assert!(config.window.transparent);
    assert_eq!((config.window.width, config.window.height), (900, 700));
    assert_eq!(config.render.fps, Some(60.0));
    assert_eq!(config.render.power, PowerSetting::Low);
    assert_eq!(config.render.stats_interval.as_secs(), 5);
    assert_eq!(config.palette.rim.0[0], 1.0);
}

#[test]
fn explicit_config_overrides_discovery() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config.toml"), "[window]\ntitle = \"Discovered\"\n").unwrap();
    let explicit = root.path().join("explicit.toml");
    fs::write(&explicit, "[window]\ntitle = \"Explicit\"\n").unwrap();

    let output = glassblob(
        root.path(),
        &["--print-config", "--config", explicit.to_str().unwrap()],
    );

    assert_eq!(printed_config(&output).window.title, "Explicit");
}

#[test]
fn invalid_config_fails() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        "[animation]\ndrag_rate = 2.0\n",
    )
    .unwrap();

    let output = glassblob(root.path(), &["--print-config"]);

    assert!(!output.status.success());
}
