use std::path::PathBuf;

use clap::{Parser, Subcommand};
use stagecast_cache::DEFAULT_BASE_URL;

/// Default period between scheduled cache refreshes.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

#[derive(Parser)]
#[command(name = "stagecast")]
#[command(about = "Stage local files for deployment and keep the remote cache fresh")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, global = true, env = "STAGECAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory staging areas are created under (default: system temp dir)
    #[arg(long, global = true, env = "STAGECAST_STAGING_ROOT")]
    pub staging_root: Option<PathBuf>,

    /// Remote API base URL
    #[arg(long, global = true, env = "STAGECAST_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Package a file or directory into its staging area
    Share {
        /// File or directory to share
        path: PathBuf,
    },
    /// Remove the staging area of a previously shared path
    Discard {
        path: PathBuf,
    },
    /// Store the API token
    Login {
        token: String,
    },
    /// Forget the API token and every cached entry
    Logout,
    /// Refresh the local cache once
    Refresh {
        /// Only refresh this kind (deployments, aliases)
        #[arg(long)]
        kind: Option<String>,

        /// Token to use instead of the stored one
        #[arg(long)]
        token: Option<String>,
    },
    /// Keep refreshing the cache until stopped or the session is revoked
    Watch {
        /// Seconds between refreshes
        #[arg(long, default_value_t = DEFAULT_REFRESH_INTERVAL_SECS)]
        interval_secs: u64,

        /// Token to use instead of the stored one
        #[arg(long)]
        token: Option<String>,
    },
    /// Show session and cache state
    Status,
}
