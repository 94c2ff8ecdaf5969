//! Configuration management for dlaudio

use crate::error::{ConfigError, DependencyError};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Format selector: best audio-only stream, then any stream with audio, then anything.
pub const DEFAULT_FORMAT_SELECTOR: &str = "bestaudio[acodec!=none]/bestaudio/best";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub output: OutputConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to yt-dlp binary (auto-detected if not set)
    pub yt_dlp: Option<PathBuf>,
    /// Path to FFmpeg binary (auto-detected if not set)
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output directory
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// yt-dlp format selector
    pub format: String,
    /// Audio quality passed to the ffmpeg post-processor (0 = best)
    pub audio_quality: String,
    /// Download the thumbnail and embed it as cover art
    pub thumbnail: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            output: OutputConfig {
                directory: PathBuf::from("downloads"),
            },
            download: DownloadConfig {
                format: DEFAULT_FORMAT_SELECTOR.to_string(),
                audio_quality: "0".to_string(),
                thumbnail: true,
            },
        }
    }
}

/// Resolved external binaries
#[derive(Debug, Clone)]
pub struct Tools {
    pub yt_dlp: PathBuf,
    pub ffmpeg: PathBuf,
    /// Whether ffmpeg was set explicitly and must be handed to yt-dlp
    pub ffmpeg_configured: bool,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(default_config) = Self::user_config_path() {
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::InvalidValue(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("DLAUDIO_").split("__"));

        figment.extract().map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// Location of the per-user config file
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("dlaudio/config.toml"))
    }

    /// Get yt-dlp path, auto-detecting if not configured
    pub fn yt_dlp_path(&self) -> Result<PathBuf, DependencyError> {
        match self.paths.yt_dlp {
            Some(ref path) => Ok(path.clone()),
            None => which::which("yt-dlp").map_err(|_| DependencyError::YtDlpNotFound),
        }
    }

    /// Get FFmpeg path, auto-detecting if not configured
    pub fn ffmpeg_path(&self) -> Result<PathBuf, DependencyError> {
        match self.paths.ffmpeg {
            Some(ref path) => Ok(path.clone()),
            None => which::which("ffmpeg").map_err(|_| DependencyError::FfmpegNotFound),
        }
    }

    /// Resolve every external binary the download flow needs
    pub fn tools(&self) -> Result<Tools, DependencyError> {
        Ok(Tools {
            yt_dlp: self.yt_dlp_path()?,
            ffmpeg: self.ffmpeg_path()?,
            ffmpeg_configured: self.paths.ffmpeg.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output.directory, PathBuf::from("downloads"));
        assert_eq!(config.download.format, DEFAULT_FORMAT_SELECTOR);
        assert_eq!(config.download.audio_quality, "0");
        assert!(config.download.thumbnail);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[output]\ndirectory = \"music\"\n\n[download]\nthumbnail = false\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.output.directory, PathBuf::from("music"));
        assert!(!config.download.thumbnail);
        assert_eq!(config.download.format, DEFAULT_FORMAT_SELECTOR);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_configured_paths_skip_lookup() {
        let mut config = Config::default();
        config.paths.yt_dlp = Some(PathBuf::from("/opt/bin/yt-dlp"));
        config.paths.ffmpeg = Some(PathBuf::from("/opt/bin/ffmpeg"));

        let tools = config.tools().unwrap();
        assert_eq!(tools.yt_dlp, PathBuf::from("/opt/bin/yt-dlp"));
        assert_eq!(tools.ffmpeg, PathBuf::from("/opt/bin/ffmpeg"));
        assert!(tools.ffmpeg_configured);
    }
}
