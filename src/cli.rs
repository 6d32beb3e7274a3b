use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hlsrelay")]
#[command(author, version, about = "Transparent HLS relay with playlist rewriting")]
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
    /// Start the relay server
    Start {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Rewrite a local playlist file and print it to stdout
    Rewrite {
        /// Playlist file to rewrite ("-" reads stdin)
        #[arg(required = true)]
        input: PathBuf,

        /// URL the playlist was fetched from; relative entries resolve against it
        #[arg(long)]
        base: String,

        /// Also rewrite URI attributes on key, map and rendition tags
        #[arg(long)]
        attribute_uris: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
