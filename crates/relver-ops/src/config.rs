use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use relver_util::errors::{RelverError, RelverResult};

/// Name of the project configuration file at the tree root.
pub const CONFIG_FILE: &str = "relver.toml";

/// Configuration for a version-update run, loaded from `relver.toml`.
/// CLI flags override file values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Base version new versions are derived from, e.g. `1.4.0`.
    /// Required for `update`; the qualifier is appended to it.
    #[serde(default, rename = "base-version")]
    pub base_version: Option<String>,

    /// How the version qualifier is produced.
    #[serde(default)]
    pub qualifier: QualifierStrategy,

    /// Separator between base version and qualifier.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// `chrono` format of timestamp qualifiers.
    #[serde(default = "default_timestamp_pattern", rename = "timestamp-pattern")]
    pub timestamp_pattern: String,

    /// Build number used by the `build-number` qualifier strategy.
    #[serde(default, rename = "build-number")]
    pub build_number: Option<u64>,

    /// Write descriptors and the registry but leave committing to a later
    /// `relver commit`.
    #[serde(default, rename = "defer-commit")]
    pub defer_commit: bool,

    /// Also write `mvn --projects` scripts for incremental builds.
    #[serde(default, rename = "generate-incremental-build-scripts")]
    pub generate_build_scripts: bool,

    /// Also write the changed-projects property file.
    #[serde(default, rename = "generate-changed-projects-file")]
    pub generate_changed_projects_file: bool,

    /// Track the reference instant in a file instead of reading it back
    /// from each module's version qualifier.
    #[serde(default, rename = "use-change-tracker-file")]
    pub use_change_tracker_file: bool,

    /// External artifacts to follow, as `group:artifact[:range]` patterns.
    #[serde(default, rename = "upstream-dependencies")]
    pub upstream_dependencies: Vec<String>,

    /// Root of the repository mirror used for upstream lookups.
    #[serde(default, rename = "upstream-repository")]
    pub upstream_repository: Option<PathBuf>,

    /// Warn and continue instead of failing the run when an upstream
    /// lookup errors.
    #[serde(default, rename = "dont-fail-on-upstream-resolution")]
    pub dont_fail_on_upstream_resolution: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            base_version: None,
            qualifier: QualifierStrategy::default(),
            separator: default_separator(),
            timestamp_pattern: default_timestamp_pattern(),
            build_number: None,
            defer_commit: false,
            generate_build_scripts: false,
            generate_changed_projects_file: false,
            use_change_tracker_file: false,
            upstream_dependencies: Vec::new(),
            upstream_repository: None,
            dont_fail_on_upstream_resolution: false,
        }
    }
}

/// Qualifier appended to the base version of every dirty module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QualifierStrategy {
    /// Timestamp of the run, formatted with `timestamp-pattern`.
    #[default]
    Timestamp,
    /// Externally supplied build number.
    BuildNumber,
}

fn default_separator() -> String {
    "-".to_string()
}

fn default_timestamp_pattern() -> String {
    "%Y%m%d%H%M%S".to_string()
}

impl UpdateConfig {
    /// Load `relver.toml` from the project root, or defaults when the
    /// file does not exist.
    pub fn load_or_default(project_root: &Path) -> RelverResult<Self> {
        let path = project_root.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| RelverError::Config {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            RelverError::Config {
                message: format!("failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }
}
