use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Download remote audio once and keep a decoded raw PCM copy on disk.
#[derive(Debug, Parser)]
#[command(name = "pcmcache", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "PCMCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory of the cache, overriding the configuration
    #[arg(long, global = true)]
    pub cache_root: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ensure a decoded copy exists, downloading and decoding it if needed
    Fetch {
        /// Watch URL, short link or bare media identifier
        identifier: String,
        /// Collection (directory) the entry is filed under
        #[arg(long, short)]
        collection: String,
        /// Item name of the entry; defaults to the media identifier
        #[arg(long, short)]
        item: Option<String>,
    },
    /// Print where an entry would be stored, without touching the network
    Path { collection: String, item: String },
}
