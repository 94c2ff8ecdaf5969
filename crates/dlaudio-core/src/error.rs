//! Error types for dlaudio-core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DlAudioError>;

#[derive(Error, Debug)]
pub enum DlAudioError {
    #[error("Missing dependency: {0}")]
    Dependency(#[from] DependencyError),

    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Metadata embedding failed: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("yt-dlp not found. Install with: brew install yt-dlp  # macOS\n   or: sudo apt install yt-dlp  # Linux")]
    YtDlpNotFound,

    #[error("FFmpeg is required for audio conversion. Install with: brew install ffmpeg  # macOS\n   or: sudo apt install ffmpeg  # Linux")]
    FfmpegNotFound,
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Requested format is not available: {0}")]
    FormatUnavailable(String),

    #[error("Video unavailable or private ({url}): {message}")]
    VideoUnavailable { url: String, message: String },

    #[error("Invalid URL ({url}): {message}")]
    InvalidUrl { url: String, message: String },

    #[error("yt-dlp failed ({}): {message}", exit_status(.code))]
    ExtractorFailed { code: Option<i32>, message: String },

    #[error("Failed to parse metadata: {0}")]
    MetadataParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl DownloadError {
    /// Whether the format listing fallback should run for this error
    pub fn is_format_unavailable(&self) -> bool {
        matches!(self, DownloadError::FormatUnavailable(_))
    }
}

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("MP4 tag error: {0}")]
    Tag(#[from] mp4ameta::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}
