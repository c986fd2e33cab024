//! CLI argument definitions for the kbmirror binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Mirror account identities into a semantic graph store
#[derive(Parser, Debug)]
#[command(name = "kbmirror")]
#[command(about = "kbmirror: keep account identities mirrored in a graph store")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where to find the graph store
#[derive(clap::Args, Debug)]
pub struct StoreArgs {
    /// WebSocket endpoint of the graph store (overrides the config file)
    #[arg(short, long, global = true, env = "KBMIRROR_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Path to a JSON config file
    #[arg(short, long, global = true, env = "KBMIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run against an empty in-process store instead of a live one
    #[arg(long, global = true)]
    pub in_memory: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether an account is mirrored
    Exists(UsernameArgs),
    /// Create the identity subgraph for an account
    Create(UsernameArgs),
    /// Delete every identity subgraph for an account
    Delete(UsernameArgs),
    /// Rename an account's login link
    Rename(RenameArgs),
    /// Replay account lifecycle events (JSON lines) through the mirror hook
    Events(EventsArgs),
}

/// Arguments for commands acting on one account
#[derive(clap::Args, Debug)]
pub struct UsernameArgs {
    /// Account username
    pub username: String,
}

/// Arguments for the rename command
#[derive(clap::Args, Debug)]
pub struct RenameArgs {
    /// Current username
    pub username: String,

    /// New username
    pub new_username: String,
}

/// Arguments for the events command
#[derive(clap::Args, Debug)]
pub struct EventsArgs {
    /// File with one JSON event per line; reads stdin when omitted
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}
