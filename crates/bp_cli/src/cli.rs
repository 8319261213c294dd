use bp_core::documents::ReleaseStatus;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bp_cli")]
#[command(about = "Blueprints signed workspace CLI")]
pub struct Cli {
    /// Directory holding local identities. Defaults to `BP_IDENTITY_ROOT`, then `~/.blueprints/identities`.
    #[arg(long = "identity-root", global = true)]
    pub identity_root: Option<String>,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    Identity {
        #[command(subcommand)]
        cmd: IdentityCmd,
    },
    Workspace {
        #[command(subcommand)]
        cmd: WorkspaceCmd,
    },
    Trust {
        #[command(subcommand)]
        cmd: TrustCmd,
    },
    Sync {
        #[command(subcommand)]
        cmd: SyncCmd,
    },
}

#[derive(Subcommand)]
pub enum IdentityCmd {
    Create {
        display_name: String,
        #[arg(long = "now-ms")]
        now_ms: Option<i64>,
    },
    List,
}

#[derive(Subcommand)]
pub enum WorkspaceCmd {
    Init {
        local_root: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        #[arg(long = "shared-root")]
        shared_root: String,
        #[arg(long = "initial-version")]
        initial_version: Option<String>,
        #[arg(long = "versioning-scheme")]
        versioning_scheme: Option<String>,
        #[arg(long = "now-ms")]
        now_ms: Option<i64>,
    },
    Show {
        local_root: String,
        #[arg(long = "now-ms")]
        now_ms: Option<i64>,
    },
    AddVersion {
        local_root: String,
        #[arg(long)]
        name: String,
        #[arg(long, value_enum, default_value_t = StatusArg::Planned)]
        status: StatusArg,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long = "now-ms")]
        now_ms: Option<i64>,
    },
    AddItem {
        local_root: String,
        #[arg(long = "version-id")]
        version_id: String,
        #[arg(long)]
        title: String,
        #[arg(long = "type", default_value = "feature")]
        item_type: String,
        #[arg(long, default_value = "added")]
        category: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        done: bool,
        #[arg(long = "now-ms")]
        now_ms: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum TrustCmd {
    Check {
        local_root: String,
        #[arg(long = "now-ms")]
        now_ms: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum SyncCmd {
    Status {
        local_root: String,
        #[arg(long = "shared-root")]
        shared_root: Option<String>,
    },
    Push {
        local_root: String,
        #[arg(long = "shared-root")]
        shared_root: Option<String>,
        #[arg(long = "now-ms")]
        now_ms: Option<i64>,
    },
    Pull {
        local_root: String,
        #[arg(long = "shared-root")]
        shared_root: Option<String>,
        #[arg(long = "now-ms")]
        now_ms: Option<i64>,
    },
    Verify {
        root: String,
        /// Document paths relative to `root`. Defaults to every document in the root.
        document_paths: Vec<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Planned,
    InProgress,
    Frozen,
    Released,
}

impl From<StatusArg> for ReleaseStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Planned => ReleaseStatus::Planned,
            StatusArg::InProgress => ReleaseStatus::InProgress,
            StatusArg::Frozen => ReleaseStatus::Frozen,
            StatusArg::Released => ReleaseStatus::Released,
        }
    }
}
