use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dlaudio")]
#[command(author, version, about = "Download only the audio of a video as a tagged M4A file")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Video URL to process (shorthand for `extract <URL>`)
    #[arg(value_name = "URL")]
    pub url: Option<String>,

    #[command(flatten)]
    pub options: ExtractOptions,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the audio of a single URL
    Extract {
        /// Video URL (YouTube, Rutube or any site yt-dlp supports)
        url: String,

        #[command(flatten)]
        options: ExtractOptions,
    },

    /// Check external dependencies
    Doctor,

    /// Show configuration
    Config,
}

#[derive(clap::Args, Clone, Debug, Default)]
pub struct ExtractOptions {
    /// Output directory, created if absent [default: downloads]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// yt-dlp format selector
    #[arg(long, value_name = "SELECTOR")]
    pub format_selector: Option<String>,

    /// Do not download or embed the thumbnail
    #[arg(long)]
    pub no_thumbnail: bool,
}
