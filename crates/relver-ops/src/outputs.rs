//! Files written at the end of a successful run.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use relver_util::errors::{RelverError, RelverResult};

/// Registry of module directories whose descriptor was rewritten.
pub const DIRTY_MODULES_REGISTRY: &str = "relver-dirty-modules.txt";

/// Property file consumed by CI for incremental builds.
pub const CHANGED_PROJECTS_FILE: &str = "relver-changed-projects.properties";

/// Stored reference instant for the next run's change detection.
pub const CHANGE_TRACKER_FILE: &str = "relver-change-tracker.txt";

/// Module directories relative to the project root, `.` for the root
/// itself, in the order the descriptors were patched.
pub fn project_paths(project_root: &Path, pom_paths: &[PathBuf]) -> Vec<String> {
    pom_paths
        .iter()
        .filter_map(|pom| {
            let dir = pom.parent()?;
            let rel = relver_util::fs::relative_path(project_root, dir)?;
            Some(if rel.is_empty() { ".".to_string() } else { rel })
        })
        .collect()
}

/// Write the dirty-module registry, one module directory per line.
pub fn write_dirty_modules_registry(
    project_root: &Path,
    pom_paths: &[PathBuf],
) -> RelverResult<PathBuf> {
    let path = project_root.join(DIRTY_MODULES_REGISTRY);
    info!(path = %path.display(), "writing dirty modules registry");

    let mut content = String::new();
    for dir in project_paths(project_root, pom_paths) {
        content.push_str(&dir);
        content.push('\n');
    }
    std::fs::write(&path, content).map_err(RelverError::Io)?;
    Ok(path)
}

/// Write `relver.changed.projects=` as a comma-separated project list.
/// CI property injection cannot handle an empty value, so an empty set
/// becomes `.`.
pub fn write_changed_projects_file(
    project_root: &Path,
    pom_paths: &[PathBuf],
) -> RelverResult<PathBuf> {
    let path = project_root.join(CHANGED_PROJECTS_FILE);
    info!(path = %path.display(), "writing changed projects property file");

    let mut projects = project_paths(project_root, pom_paths).join(",");
    if projects.is_empty() {
        projects = ".".to_string();
    }

    let content = format!(
        "# Changed projects, generated by relver.\n\
         # Build only the modules that received a new version with:\n\
         #   mvn --projects ${{relver.changed.projects}} install\n\
         relver.changed.projects={projects}\n"
    );
    std::fs::write(&path, content).map_err(RelverError::Io)?;
    Ok(path)
}

/// Write a shell (or batch, on Windows) script that builds exactly the
/// rewritten modules.
pub fn write_incremental_build_script(
    project_root: &Path,
    pom_paths: &[PathBuf],
) -> RelverResult<PathBuf> {
    let projects = project_paths(project_root, pom_paths).join(",");

    if cfg!(windows) {
        let path = project_root.join("relverBuildIncremental.bat");
        info!(path = %path.display(), "writing incremental build script");
        let content = format!(
            "@ECHO OFF\r\n\
             REM Incremental build script generated by relver\r\n\
             REM To install all modified modules call:\r\n\
             REM   relverBuildIncremental.bat install\r\n\r\n\
             SET MVN_EXEC=mvn.bat\r\n\
             IF DEFINED M2_HOME (set MVN_EXEC=%M2_HOME%\\bin\\mvn.bat)\r\n\
             %MVN_EXEC% --projects {projects} %*\r\n"
        );
        std::fs::write(&path, content).map_err(RelverError::Io)?;
        Ok(path)
    } else {
        let path = project_root.join("relverBuildIncremental.sh");
        info!(path = %path.display(), "writing incremental build script");
        let content = format!(
            "#!/bin/sh\n\
             # Incremental build script generated by relver\n\
             # To install all modified modules call:\n\
             #   ./relverBuildIncremental.sh install\n\n\
             MVN_EXEC=mvn\n\
             if [ -n \"$M2_HOME\" ]; then\n\
             \x20\x20MVN_EXEC=$M2_HOME/bin/mvn\n\
             fi\n\
             $MVN_EXEC --projects {projects} \"$@\"\n"
        );
        std::fs::write(&path, content).map_err(RelverError::Io)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path).map_err(RelverError::Io)?.permissions();
            perms.set_mode(perms.mode() | 0o100);
            std::fs::set_permissions(&path, perms).map_err(RelverError::Io)?;
        }
        Ok(path)
    }
}

/// Store the reference instant used by this run.
pub fn store_change_tracker(project_root: &Path, value: &str) -> RelverResult<PathBuf> {
    let path = project_root.join(CHANGE_TRACKER_FILE);
    info!(path = %path.display(), "storing change tracker instant");
    std::fs::write(&path, value).map_err(RelverError::Io)?;
    Ok(path)
}

/// Read the reference instant stored by the previous run, if any.
pub fn read_change_tracker(project_root: &Path) -> Option<String> {
    let path = project_root.join(CHANGE_TRACKER_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let value = content.lines().next().unwrap_or_default().trim().to_string();
            (!value.is_empty()).then_some(value)
        }
        Err(_) => {
            warn!(path = %path.display(), "no stored change tracker instant");
            None
        }
    }
}
