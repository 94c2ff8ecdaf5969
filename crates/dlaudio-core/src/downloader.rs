//! Audio downloader using yt-dlp (ffmpeg does the M4A conversion as a post-processor)

use crate::config::{DownloadConfig, Tools};
use crate::error::DownloadError;
use crate::output::{with_extension, CANONICAL_EXTENSION};
use crate::source::SourceLabel;
use regex::Regex;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Downloader {
    yt_dlp_path: PathBuf,
    ffmpeg_location: Option<PathBuf>,
    options: DownloadConfig,
}

#[derive(Debug)]
pub struct DownloadResult {
    pub metadata: VideoMetadata,
    /// `<output_dir>/<base>`, shared by the audio file and its thumbnail
    pub base: PathBuf,
    /// `<base>.m4a`
    pub expected_path: PathBuf,
}

/// Fields of the yt-dlp info JSON the tagging step reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub id: String,
    #[serde(default = "unknown")]
    pub title: String,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader_name: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub ext: String,
    /// Sanitized output filename as chosen by yt-dlp
    #[serde(default, rename = "_filename")]
    pub filename: Option<PathBuf>,
}

fn unknown() -> String {
    "Unknown".to_string()
}

impl VideoMetadata {
    /// Parse the first JSON object printed by `--print-json`
    pub fn from_print_json(stdout: &str) -> Result<Self, DownloadError> {
        let line = stdout
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with('{'))
            .ok_or_else(|| DownloadError::MetadataParse("yt-dlp printed no JSON".to_string()))?;

        serde_json::from_str(line).map_err(|e| DownloadError::MetadataParse(e.to_string()))
    }
}

impl Downloader {
    pub fn new(tools: &Tools, options: DownloadConfig) -> Self {
        Self {
            yt_dlp_path: tools.yt_dlp.clone(),
            ffmpeg_location: tools.ffmpeg_configured.then(|| tools.ffmpeg.clone()),
            options,
        }
    }

    /// Download the best audio stream and convert it to M4A in `output_dir`
    pub async fn download(
        &self,
        url: &str,
        output_dir: &Path,
        source: SourceLabel,
    ) -> Result<DownloadResult, DownloadError> {
        info!("Downloading audio from: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(self.download_args(url, output_dir, source))
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(classify_failure(url, output.status.code(), &stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let metadata = VideoMetadata::from_print_json(&stdout)?;
        debug!("Downloaded: {} ({})", metadata.title, metadata.id);

        let base = output_base(output_dir, source, &metadata);
        let expected_path = with_extension(&base, CANONICAL_EXTENSION);

        Ok(DownloadResult {
            metadata,
            base,
            expected_path,
        })
    }

    /// Print the formats available for `url` to the terminal
    pub async fn list_formats(&self, url: &str) -> Result<(), DownloadError> {
        info!("Listing available formats for: {}", url);

        let status = Command::new(&self.yt_dlp_path)
            .args(["--list-formats", url])
            .status()
            .await?;

        if !status.success() {
            return Err(DownloadError::ExtractorFailed {
                code: status.code(),
                message: "format listing failed".to_string(),
            });
        }
        Ok(())
    }

    fn download_args(&self, url: &str, output_dir: &Path, source: SourceLabel) -> Vec<OsString> {
        let template = output_dir.join(format!("{} %(title)s.%(ext)s", source));

        let mut args: Vec<OsString> = vec![
            "-f".into(),
            self.options.format.clone().into(),
            // ffmpeg post-processor; quality 0 copies the stream when the codec already matches
            "--extract-audio".into(),
            "--audio-format".into(),
            CANONICAL_EXTENSION.into(),
            "--audio-quality".into(),
            self.options.audio_quality.clone().into(),
            // Standard tags, overwritten later by the tag writer
            "--embed-metadata".into(),
        ];

        if self.options.thumbnail {
            for arg in ["--write-thumbnail", "--convert-thumbnails", "jpg"] {
                args.push(arg.into());
            }
        }

        if let Some(ref ffmpeg) = self.ffmpeg_location {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.clone().into_os_string());
        }

        for arg in ["--no-playlist", "--no-warnings", "-o"] {
            args.push(arg.into());
        }
        args.push(template.into_os_string());
        args.push("--print-json".into());
        args.push(url.into());
        args
    }
}

/// `<output_dir>/<source> <title>`, preferring the stem yt-dlp actually wrote
pub fn output_base(output_dir: &Path, source: SourceLabel, metadata: &VideoMetadata) -> PathBuf {
    let stem = metadata
        .filename
        .as_deref()
        .and_then(Path::file_stem)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{} {}", source, metadata.title));
    output_dir.join(stem)
}

/// Map a failed yt-dlp run to a download error from its stderr
pub fn classify_failure(url: &str, code: Option<i32>, stderr: &str) -> DownloadError {
    let message = last_error_line(stderr).unwrap_or_else(|| stderr.trim().to_string());

    if is_format_unavailable(stderr) {
        return DownloadError::FormatUnavailable(message);
    }
    if stderr.contains("Video unavailable") || stderr.contains("Private video") {
        return DownloadError::VideoUnavailable {
            url: url.to_string(),
            message,
        };
    }
    if stderr.contains("is not a valid URL") || stderr.contains("Unsupported URL") {
        return DownloadError::InvalidUrl {
            url: url.to_string(),
            message,
        };
    }
    DownloadError::ExtractorFailed { code, message }
}

fn is_format_unavailable(stderr: &str) -> bool {
    Regex::new(r"(?i)format is not available")
        .map(|re| re.is_match(stderr))
        .unwrap_or(false)
}

fn last_error_line(stderr: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^ERROR:\s*(.+)$").ok()?;
    re.captures_iter(stderr)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
