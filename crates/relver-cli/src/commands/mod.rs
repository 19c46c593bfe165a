//! Command handlers.

use std::path::PathBuf;

use miette::Result;

use relver_util::errors::RelverError;

use crate::cli::{Cli, Command};

mod commit;
mod tree;
mod update;

pub fn dispatch(args: Cli) -> Result<()> {
    match args.command {
        Command::Update {
            base_version,
            build_number,
            defer_commit,
            metadata,
        } => update::run(update::UpdateArgs {
            base_version,
            build_number,
            defer_commit,
            metadata,
        }),
        Command::Tree => tree::run(),
        Command::Commit => commit::run(),
    }
}

/// The module tree root: the nearest ancestor of the working directory
/// holding a `pom.xml`.
pub fn project_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(RelverError::Io)?;
    relver_util::fs::find_ancestor_with(&cwd, "pom.xml").ok_or_else(|| {
        RelverError::Config {
            message: format!("no pom.xml found in {} or any parent", cwd.display()),
        }
        .into()
    })
}
