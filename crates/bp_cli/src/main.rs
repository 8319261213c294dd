mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Command, IdentityCmd, SyncCmd, TrustCmd, WorkspaceCmd};
use commands::{identity_root, now_ms, Outcome};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_env("BP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let identity_root = identity_root(cli.identity_root.as_deref());
    let identity_root = identity_root.as_path();

    let result = match cli.cmd {
        Command::Identity { cmd } => match cmd {
            IdentityCmd::Create {
                display_name,
                now_ms: now,
            } => commands::identity::run_create(identity_root, &display_name, now.unwrap_or_else(now_ms)),
            IdentityCmd::List => commands::identity::run_list(identity_root),
        },
        Command::Workspace { cmd } => match cmd {
            WorkspaceCmd::Init {
                local_root,
                name,
                code,
                shared_root,
                initial_version,
                versioning_scheme,
                now_ms: now,
            } => commands::workspace::run_init(
                identity_root,
                Path::new(&local_root),
                &commands::workspace::InitArgs {
                    name: &name,
                    code: &code,
                    shared_root: Path::new(&shared_root),
                    initial_version: initial_version.as_deref(),
                    versioning_scheme: versioning_scheme.as_deref(),
                },
                now.unwrap_or_else(now_ms),
            ),
            WorkspaceCmd::Show {
                local_root,
                now_ms: now,
            } => commands::workspace::run_show(identity_root, Path::new(&local_root), now.unwrap_or_else(now_ms)),
            WorkspaceCmd::AddVersion {
                local_root,
                name,
                status,
                notes,
                now_ms: now,
            } => commands::workspace::run_add_version(
                identity_root,
                Path::new(&local_root),
                &name,
                status.into(),
                notes.as_deref(),
                now.unwrap_or_else(now_ms),
            ),
            WorkspaceCmd::AddItem {
                local_root,
                version_id,
                title,
                item_type,
                category,
                description,
                done,
                now_ms: now,
            } => commands::workspace::run_add_item(
                identity_root,
                Path::new(&local_root),
                &commands::workspace::AddItemArgs {
                    version_id: &version_id,
                    title: &title,
                    item_type: &item_type,
                    category: &category,
                    description: description.as_deref(),
                    done,
                },
                now.unwrap_or_else(now_ms),
            ),
        },
        Command::Trust { cmd } => match cmd {
            TrustCmd::Check {
                local_root,
                now_ms: now,
            } => commands::trust::run_check(identity_root, Path::new(&local_root), now.unwrap_or_else(now_ms)),
        },
        Command::Sync { cmd } => match cmd {
            SyncCmd::Status {
                local_root,
                shared_root,
            } => commands::sync::run_status(Path::new(&local_root), shared_root.as_deref()),
            SyncCmd::Push {
                local_root,
                shared_root,
                now_ms: now,
            } => commands::sync::run_push(
                identity_root,
                Path::new(&local_root),
                shared_root.as_deref(),
                now.unwrap_or_else(now_ms),
            ),
            SyncCmd::Pull {
                local_root,
                shared_root,
                now_ms: now,
            } => commands::sync::run_pull(
                identity_root,
                Path::new(&local_root),
                shared_root.as_deref(),
                now.unwrap_or_else(now_ms),
            ),
            SyncCmd::Verify { root, document_paths } => {
                commands::sync::run_verify(identity_root, Path::new(&root), &document_paths, now_ms())
            }
        },
    };

    match result {
        Ok(Outcome::Done) => {}
        Ok(Outcome::Blocked) => std::process::exit(2),
        Err(err) => {
            eprintln!("{}: {}", err.code, err.message);
            std::process::exit(1);
        }
    }
}
