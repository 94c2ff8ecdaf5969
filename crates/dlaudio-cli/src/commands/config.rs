use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;
use dlaudio_core::config::Config;

pub async fn run(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = Config::load(config_path)?;

    println!("dlaudio configuration\n");

    let rendered = toml::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{}", rendered.trim_end());

    if config.paths.yt_dlp.is_none() || config.paths.ffmpeg.is_none() {
        println!("\n# Unset paths are auto-detected from PATH");
    }

    // Show config file locations
    println!("\nConfig file locations (in priority order):");
    if let Some(p) = config_path {
        println!("  1. {} (specified)", p.display());
    }
    if let Some(user_config) = Config::user_config_path() {
        println!("  2. {}", user_config.display());
    }
    println!("  3. Environment variables (DLAUDIO_*, nested keys with `__`, e.g. DLAUDIO_OUTPUT__DIRECTORY)");

    Ok(ExitCode::SUCCESS)
}
