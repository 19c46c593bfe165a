//! Version-control seam for relver.
//!
//! The pipeline only needs three questions answered: is a path under
//! version control, did a module directory change since an instant, and
//! can the rewritten descriptors be committed. [`ScmHandler`] is that
//! seam; [`git::GitScm`] answers it with the `git` CLI, and tests inject
//! stubs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use relver_util::errors::RelverResult;

pub mod git;

/// Prefix of commits created by relver itself. Change detection skips
/// them so a version-bump commit does not mark its module dirty again.
pub const COMMIT_MESSAGE_PREFIX: &str = "[relver]";

/// Abstraction over the version control system.
pub trait ScmHandler {
    /// Whether `path` lies inside a checked-out working copy.
    fn is_working_copy(&self, path: &Path) -> bool;

    /// Whether `module_dir` saw commits after `since`, ignoring commits
    /// made by relver itself.
    fn changes_since(&self, module_dir: &Path, since: DateTime<Utc>) -> RelverResult<bool>;

    /// Commit the given files with `message`.
    fn commit_files(&self, files: &[PathBuf], message: &str) -> RelverResult<()>;
}
