//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Shared team cost-cache coordinator.
#[derive(Debug, Parser)]
#[command(name = "teamcost", version, about)]
pub struct Cli {
    /// Config file path (default: platform config dir).
    #[arg(long, global = true, env = "TEAMCOST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Object-store root directory.
    #[arg(long, global = true)]
    pub store_root: Option<PathBuf>,

    /// JSON file the file-backed fetcher reads cost reports from.
    #[arg(long, global = true)]
    pub data_file: Option<PathBuf>,

    /// Client display name shown to teammates.
    #[arg(long, global = true)]
    pub name: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show cached cost state for tracked teams.
    Status(StatusArgs),
    /// Request a manual refresh for a team.
    Refresh(RefreshArgs),
    /// Run the auto-refresh scheduler until interrupted.
    Run,
    /// List manual-refresh audit records for a team.
    Audit(AuditArgs),
}

#[derive(Debug, clap::Args)]
pub struct StatusArgs {
    /// Limit output to one team.
    #[arg(long)]
    pub team: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct RefreshArgs {
    /// Team to refresh.
    #[arg(long)]
    pub team: String,
}

#[derive(Debug, clap::Args)]
pub struct AuditArgs {
    /// Team whose audit trail to list.
    #[arg(long)]
    pub team: String,
}
