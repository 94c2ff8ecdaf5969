use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::args::ExtractOptions;
use dlaudio_core::{
    config::Config,
    downloader::Downloader,
    error::DlAudioError,
    metadata::TrackTags,
    pipeline::{MetadataOutcome, Pipeline, PipelineConfig, PipelineStage},
};

pub async fn run(url: &str, options: &ExtractOptions, config_path: Option<&Path>) -> Result<ExitCode> {
    let config = Config::load(config_path)?;

    let output_dir = options
        .output
        .clone()
        .unwrap_or_else(|| config.output.directory.clone());
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    // Dependencies are checked before any network activity
    let tools = match config.tools() {
        Ok(tools) => tools,
        Err(e) => {
            eprintln!("Missing dependency: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut download = config.download.clone();
    if let Some(ref selector) = options.format_selector {
        download.format = selector.clone();
    }
    if options.no_thumbnail {
        download.thumbnail = false;
    }

    let pipeline_config = PipelineConfig {
        url: url.to_string(),
        output_dir,
        download: download.clone(),
        tools: tools.clone(),
    };

    println!("Processing: {}", url);

    let (tx, mut rx) = mpsc::channel(32);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {msg}")?);

    let progress_handle = tokio::spawn(async move {
        while let Some(stage) = rx.recv().await {
            match stage {
                PipelineStage::Downloading { source } => {
                    pb.enable_steady_tick(Duration::from_millis(100));
                    pb.set_message(format!("Downloading from {}...", source));
                }
                PipelineStage::Downloaded { title } => {
                    pb.set_message(format!("Downloaded: {}", truncate(&title, 40)));
                }
                PipelineStage::Resolving => {
                    pb.set_message("Locating converted file...");
                }
                PipelineStage::EmbeddingMetadata => {
                    pb.set_message("Embedding metadata...");
                }
                PipelineStage::Complete { duration, .. } => {
                    pb.finish_with_message(format!("Done ({:.1}s)", duration.as_secs_f32()));
                }
                PipelineStage::Failed { stage, error } => {
                    pb.abandon_with_message(format!("Failed at {}: {}", stage, error));
                }
            }
        }
    });

    let pipeline = Pipeline::new(pipeline_config, tx);
    let result = pipeline.run().await;

    // Closes the progress channel
    drop(pipeline);
    progress_handle.await?;

    match result {
        Ok(outcome) => {
            match outcome.metadata {
                MetadataOutcome::Embedded(ref tags) => print_tags(tags),
                MetadataOutcome::Failed(ref e) => {
                    println!("   Warning: could not set metadata: {}", e);
                }
                MetadataOutcome::Skipped => {}
            }

            if !outcome.output.exists() {
                eprintln!("\nError: downloaded file not found: {}", outcome.output.display());
                return Ok(ExitCode::FAILURE);
            }

            let file_name = outcome
                .output
                .file_name()
                .unwrap_or_default()
                .to_string_lossy();
            println!("\nAudio saved (audio only): {}", file_name);
            println!("   Path: {}", outcome.output.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(DlAudioError::Download(e)) if e.is_format_unavailable() => {
            println!("\nFormat not available. Available formats:");
            // Second extractor round trip, only to show what the site offers
            if let Err(e) = Downloader::new(&tools, download).list_formats(url).await {
                eprintln!("Error: {}", e);
            }
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            eprintln!("\nError: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_tags(tags: &TrackTags) {
    println!("   Metadata set:");
    println!("     - Artist: {}", tags.artist);
    println!("     - Album: {}", tags.album);
    println!("     - Title: {}", tags.title);
    if let Some(ref year) = tags.year {
        println!("     - Year: {}", year);
    }
    if let Some(cover) = tags.cover {
        println!("     - Cover: {}", cover);
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
