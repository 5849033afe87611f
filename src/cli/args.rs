//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// hubshell - Offline-first application shell
///
/// Versioned offline resource cache, connectivity monitoring and
/// notification permission handling for the ConnectHub front end.
#[derive(Parser, Debug)]
#[command(name = "hubshell")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "HUBSHELL_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the current cache version from its manifest
    Install(InstallArgs),

    /// Fetch a resource cache-first, falling back to the network
    Fetch(FetchArgs),

    /// Show cache stores and connectivity
    Status,

    /// Run the shell: notifications, cache registration and network watch
    Watch(WatchArgs),

    /// Delete cache stores
    Clear(ClearArgs),

    /// Print the installable application descriptor
    Descriptor(DescriptorArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
pub struct InstallArgs {
    /// Cache version to install (defaults to cache.version)
    #[arg(long)]
    pub version: Option<String>,

    /// Leave the version waiting instead of activating it
    #[arg(long)]
    pub no_activate: bool,
}

#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Resource path or URL, resolved against cache.origin
    pub resource: String,

    /// Request method; anything but GET bypasses the cache
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request header as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Request body sent with POST, PUT or PATCH
    #[arg(short, long)]
    pub data: Option<String>,

    /// Write the body to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Read "online"/"offline" connectivity events from stdin
    #[arg(long)]
    pub stdin_events: bool,

    /// Override the poll interval in seconds
    #[arg(long)]
    pub interval: Option<u64>,

    /// Allow notifications without prompting
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
pub struct ClearArgs {
    /// Only delete this store
    #[arg(long)]
    pub version: Option<String>,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct DescriptorArgs {
    /// Write the descriptor to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.version)
        key: String,
        /// Value to set
        value: String,
    },
}
