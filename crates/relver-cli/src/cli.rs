//! CLI argument definitions for relver.
//!
//! Uses `clap` derive macros. Each command corresponds to a handler in
//! [`super::commands`].

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "relver",
    version,
    about = "Continuous versioning for Maven multi-module trees",
    long_about = "relver replaces the SNAPSHOT workflow: it detects changed modules, \
                  assigns them real qualified versions, propagates the bump through \
                  the module graph, and rewrites the pom.xml files in place without \
                  reformatting them."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect changes, assign new versions, and rewrite descriptors
    Update {
        /// Base version for newly assigned versions (overrides relver.toml)
        #[arg(long)]
        base_version: Option<String>,
        /// Use this build number as the qualifier instead of a timestamp
        #[arg(long)]
        build_number: Option<u64>,
        /// Rewrite descriptors and the registry but defer the commit
        #[arg(long)]
        defer_commit: bool,
        /// Print the run report as JSON instead of a summary
        #[arg(long)]
        metadata: bool,
    },

    /// Print the module tree without touching any file
    Tree,

    /// Commit the descriptors registered by a deferred update run
    Commit,
}

pub fn parse() -> Cli {
    Cli::parse()
}
