//! dlaudio-core: audio-only downloads with M4A tags and cover art

pub mod config;
pub mod downloader;
pub mod error;
pub mod metadata;
pub mod output;
pub mod pipeline;
pub mod source;

pub use config::Config;
pub use error::{DlAudioError, Result};
pub use source::SourceLabel;
