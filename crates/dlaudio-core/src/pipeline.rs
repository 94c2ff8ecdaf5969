//! Pipeline orchestration: download, locate, tag

use crate::config::{DownloadConfig, Tools};
use crate::downloader::{DownloadResult, Downloader};
use crate::error::{DlAudioError, MetadataError};
use crate::metadata::{TagWriter, TrackTags};
use crate::output::resolve_output;
use crate::source::SourceLabel;

use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub url: String,
    /// Must already exist; the CLI creates it before checking dependencies
    pub output_dir: PathBuf,
    pub download: DownloadConfig,
    pub tools: Tools,
}

/// Pipeline progress stages
#[derive(Debug, Clone)]
pub enum PipelineStage {
    Downloading { source: SourceLabel },
    Downloaded { title: String },
    Resolving,
    EmbeddingMetadata,
    Complete { output: PathBuf, duration: Duration },
    Failed { stage: String, error: String },
}

/// Result of the tagging step, reported separately from the download
#[derive(Debug)]
pub enum MetadataOutcome {
    Embedded(TrackTags),
    /// No downloaded file was found, so nothing was tagged
    Skipped,
    Failed(MetadataError),
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub source: SourceLabel,
    pub output: PathBuf,
    pub metadata: MetadataOutcome,
}

/// Main processing pipeline
pub struct Pipeline {
    config: PipelineConfig,
    downloader: Downloader,
    progress_tx: mpsc::Sender<PipelineStage>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, progress_tx: mpsc::Sender<PipelineStage>) -> Self {
        let downloader = Downloader::new(&config.tools, config.download.clone());
        Self {
            config,
            downloader,
            progress_tx,
        }
    }

    pub async fn run(&self) -> Result<PipelineOutcome, DlAudioError> {
        let start_time = Instant::now();
        let source = SourceLabel::from_url(&self.config.url);

        info!("Starting pipeline for: {} (source: {})", self.config.url, source);

        // 1. Download and convert
        let _ = self.progress_tx.send(PipelineStage::Downloading { source }).await;

        let download_result = self
            .downloader
            .download(&self.config.url, &self.config.output_dir, source)
            .await
            .map_err(|e| {
                let _ = self.progress_tx.try_send(PipelineStage::Failed {
                    stage: "download".to_string(),
                    error: e.to_string(),
                });
                e
            })?;

        let _ = self.progress_tx.send(PipelineStage::Downloaded {
            title: download_result.metadata.title.clone(),
        }).await;

        // 2. Locate the file and tag it
        let writer = TagWriter::new(self.config.download.thumbnail);
        let outcome = finalize(download_result, source, writer, &self.progress_tx).await?;

        let duration = start_time.elapsed();
        info!("Pipeline complete: {} ({:.1}s)", outcome.output.display(), duration.as_secs_f32());

        let _ = self.progress_tx.send(PipelineStage::Complete {
            output: outcome.output.clone(),
            duration,
        }).await;

        Ok(outcome)
    }
}

/// Normalize the downloaded file's extension and embed tags.
///
/// Tagging failures are recorded in the outcome and never fail the run.
pub async fn finalize(
    download: DownloadResult,
    source: SourceLabel,
    writer: TagWriter,
    progress_tx: &mpsc::Sender<PipelineStage>,
) -> Result<PipelineOutcome, DlAudioError> {
    let _ = progress_tx.send(PipelineStage::Resolving).await;

    let Some(path) = resolve_output(&download.base)? else {
        warn!("Downloaded file not found: {}", download.expected_path.display());
        return Ok(PipelineOutcome {
            source,
            output: download.expected_path,
            metadata: MetadataOutcome::Skipped,
        });
    };

    let _ = progress_tx.send(PipelineStage::EmbeddingMetadata).await;

    let metadata = download.metadata;
    let audio = path.clone();
    let embedded = tokio::task::spawn_blocking(move || writer.embed(&audio, &metadata, source)).await;

    let metadata = match embedded {
        Ok(Ok(tags)) => {
            debug!("Tags written: {:?}", tags);
            MetadataOutcome::Embedded(tags)
        }
        Ok(Err(e)) => {
            warn!("Failed to set metadata: {}", e);
            MetadataOutcome::Failed(e)
        }
        Err(e) => {
            warn!("Tagging task failed: {}", e);
            MetadataOutcome::Failed(MetadataError::Io(std::io::Error::other(e)))
        }
    };

    Ok(PipelineOutcome {
        source,
        output: path,
        metadata,
    })
}
