use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediavault")]
#[command(author, version, about = "Media resolution and adaptive streaming server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the streaming server
    Start {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,

    /// Add an entry to the media catalog
    AddMedia {
        /// Media kind: audio (or music) / video
        #[arg(long)]
        kind: String,

        /// File name, path, remote URL or YouTube URL
        #[arg(long)]
        locator: String,

        /// Display title (defaults to the locator)
        #[arg(long)]
        title: Option<String>,

        /// Thumbnail URL stored with the entry
        #[arg(long)]
        thumbnail: Option<String>,
    },

    /// Print the playback descriptor for a locator as JSON
    Classify {
        /// Locator to classify
        locator: String,

        /// Media kind used for the descriptor
        #[arg(long, default_value = "video")]
        kind: String,
    },
}
