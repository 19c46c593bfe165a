//! Deferred commit of descriptors registered by an earlier `update` run.

use std::path::Path;

use tracing::info;

use relver_scm::{ScmHandler, COMMIT_MESSAGE_PREFIX};
use relver_util::errors::{RelverError, RelverResult};

use crate::outputs::DIRTY_MODULES_REGISTRY;

/// Commit every descriptor listed in the dirty-module registry.
///
/// Returns the number of committed descriptors; zero when there is no
/// registry (nothing was deferred).
pub fn commit_registered(project_root: &Path, scm: &dyn ScmHandler) -> RelverResult<usize> {
    let registry = project_root.join(DIRTY_MODULES_REGISTRY);
    if !registry.is_file() {
        info!("no dirty modules registry, nothing to commit");
        return Ok(0);
    }

    let content = std::fs::read_to_string(&registry).map_err(RelverError::Io)?;
    let descriptors: Vec<_> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|dir| {
            if dir == "." {
                project_root.join("pom.xml")
            } else {
                project_root.join(dir).join("pom.xml")
            }
        })
        .collect();

    if descriptors.is_empty() {
        info!("dirty modules registry is empty, nothing to commit");
        return Ok(0);
    }

    let message = format!(
        "{COMMIT_MESSAGE_PREFIX} Version of {} artifacts updated",
        descriptors.len()
    );
    scm.commit_files(&descriptors, &message)?;
    Ok(descriptors.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::cell::RefCell;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingScm {
        committed: RefCell<Vec<PathBuf>>,
    }

    impl ScmHandler for RecordingScm {
        fn is_working_copy(&self, _path: &Path) -> bool {
            true
        }

        fn changes_since(&self, _module_dir: &Path, _since: DateTime<Utc>) -> RelverResult<bool> {
            Ok(false)
        }

        fn commit_files(&self, files: &[PathBuf], _message: &str) -> RelverResult<()> {
            self.committed.borrow_mut().extend(files.iter().cloned());
            Ok(())
        }
    }

    #[test]
    fn missing_registry_commits_nothing() {
        let tmp = TempDir::new().unwrap();
        let scm = RecordingScm::default();
        assert_eq!(commit_registered(tmp.path(), &scm).unwrap(), 0);
        assert!(scm.committed.borrow().is_empty());
    }

    #[test]
    fn registry_entries_are_committed() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(DIRTY_MODULES_REGISTRY),
            ".\ncore\napps/web\n",
        )
        .unwrap();

        let scm = RecordingScm::default();
        assert_eq!(commit_registered(tmp.path(), &scm).unwrap(), 3);
        let committed = scm.committed.borrow();
        assert_eq!(committed[0], tmp.path().join("pom.xml"));
        assert_eq!(committed[1], tmp.path().join("core/pom.xml"));
        assert_eq!(committed[2], tmp.path().join("apps/web/pom.xml"));
    }
}
