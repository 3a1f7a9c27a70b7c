// CLI argument parsing and definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "wp-manager")]
#[command(about = "Manage WordPress instances inside a Docker-in-Docker workspace host")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Workspace directory (overrides WP_WORKSPACE_DIR)
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Initialize the workspace document
    Init {
        /// Workspace name
        name: String,
        /// Workspace type: workspace (one implicit site) or multi-instance
        #[arg(long = "type", default_value = "multi-instance")]
        workspace_type: String,
        /// MySQL version code for the workspace site (e.g. 80)
        mysql: Option<String>,
        /// PHP version code for the workspace site (e.g. 83)
        php: Option<String>,
        /// Web server: nginx or apache
        webserver: Option<String>,
    },
    /// Start shared services and the workspace site (host startup hook)
    Boot,
    /// Create a new WordPress instance
    Create {
        /// Instance name
        name: String,
        /// MySQL version code (e.g. 80)
        mysql: Option<String>,
        /// PHP version code (e.g. 83)
        php: Option<String>,
        /// Web server: nginx or apache
        webserver: Option<String>,
    },
    /// Start an instance
    Start {
        /// Instance name
        name: String,
    },
    /// Stop an instance
    Stop {
        /// Instance name
        name: String,
    },
    /// Remove an instance, its containers, files and database
    Remove {
        /// Instance name
        name: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// List instances
    List,
    /// Show instance details and credentials
    Info {
        /// Instance name
        name: String,
    },
    /// Clone an instance into a new one
    Clone {
        /// Source instance
        source: String,
        /// Target instance (must not exist)
        target: String,
        /// shared-reference, full-copy or files-only-copy
        #[arg(default_value = "full-copy")]
        strategy: String,
    },
    /// Show container logs
    Logs {
        /// Instance name
        name: String,
        /// mysql, php or web (all services when omitted)
        service: Option<String>,
        /// Follow log output
        #[arg(short, long)]
        follow: bool,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Init { .. } => "init",
            Command::Boot => "boot",
            Command::Create { .. } => "create",
            Command::Start { .. } => "start",
            Command::Stop { .. } => "stop",
            Command::Remove { .. } => "remove",
            Command::List => "list",
            Command::Info { .. } => "info",
            Command::Clone { .. } => "clone",
            Command::Logs { .. } => "logs",
        }
    }
}
