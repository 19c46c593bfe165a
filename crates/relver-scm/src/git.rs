//! Git implementation of [`ScmHandler`] over the `git` CLI.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use relver_util::errors::{RelverError, RelverResult};

use crate::{ScmHandler, COMMIT_MESSAGE_PREFIX};

/// How many commits back change detection looks per module directory.
const LOG_DEPTH: &str = "100";

/// Git-backed SCM handler.
pub struct GitScm {
    repo_root: Option<PathBuf>,
}

impl GitScm {
    /// Discover the repository containing `base_dir` by walking up to the
    /// first ancestor holding a `.git` entry.
    pub fn discover(base_dir: &Path) -> Self {
        let repo_root = relver_util::fs::find_ancestor_with(base_dir, ".git");
        match repo_root {
            Some(ref root) => info!(repo = %root.display(), "using git repository"),
            None => warn!(
                path = %base_dir.display(),
                "project does not seem to be inside a git repository"
            ),
        }
        Self { repo_root }
    }

    fn run(&self, cwd: &Path, args: &[&str]) -> RelverResult<String> {
        debug!(?args, cwd = %cwd.display(), "running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| RelverError::Scm {
                message: format!("failed to run git: {e}"),
            })?;
        if !output.status.success() {
            return Err(RelverError::Scm {
                message: format!(
                    "git {} failed: {}",
                    args.first().unwrap_or(&""),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ScmHandler for GitScm {
    fn is_working_copy(&self, _path: &Path) -> bool {
        self.repo_root.is_some()
    }

    fn changes_since(&self, module_dir: &Path, since: DateTime<Utc>) -> RelverResult<bool> {
        if self.repo_root.is_none() {
            return Ok(false);
        }

        // Commit time + subject for the latest commits touching the
        // module directory, newest first.
        let log = match self.run(
            module_dir,
            &["log", "-n", LOG_DEPTH, "--format=%ct\t%s", "--", "."],
        ) {
            Ok(log) => log,
            Err(e) => {
                // An uninspectable history counts as changed.
                warn!(
                    path = %module_dir.display(),
                    error = %e,
                    "failed to check for changes, assuming the module changed"
                );
                return Ok(true);
            }
        };

        for line in log.lines() {
            let (commit_time, subject) = match line.split_once('\t') {
                Some(parts) => parts,
                None => (line, ""),
            };
            let Ok(epoch) = commit_time.trim().parse::<i64>() else {
                continue;
            };
            if epoch <= since.timestamp() {
                break;
            }
            if !subject.starts_with(COMMIT_MESSAGE_PREFIX) {
                debug!(
                    path = %module_dir.display(),
                    subject,
                    "change since reference instant"
                );
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn commit_files(&self, files: &[PathBuf], message: &str) -> RelverResult<()> {
        let Some(ref root) = self.repo_root else {
            return Err(RelverError::Scm {
                message: "cannot commit: not inside a git repository".to_string(),
            }
            .into());
        };

        for file in files {
            self.run(root, &["add", &file.to_string_lossy()])?;
        }
        self.run(root, &["commit", "-m", message])?;
        info!(files = files.len(), "committed rewritten descriptors");
        Ok(())
    }
}
