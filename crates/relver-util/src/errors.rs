use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all relver operations.
#[derive(Debug, Error, Diagnostic)]
pub enum RelverError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed POM descriptor.
    #[error("POM error: {message}")]
    #[diagnostic(help("Check the pom.xml for a missing groupId/version or broken XML"))]
    Pom { message: String },

    /// Module graph construction or propagation failed.
    #[error("Module graph error: {message}")]
    Graph { message: String },

    /// A property is referenced by edges that require different new versions.
    #[error("property '{property}' is referenced with conflicting target versions: \"{existing}\" vs \"{conflicting}\"")]
    #[diagnostic(help(
        "All dependencies whose version is ${{{property}}} must resolve to the same new version"
    ))]
    PropertyConflict {
        property: String,
        existing: String,
        conflicting: String,
    },

    /// Version control interaction failed.
    #[error("SCM error: {message}")]
    Scm { message: String },

    /// Upstream version lookup failed.
    #[error("Upstream resolution failed: {message}")]
    Upstream { message: String },

    /// Invalid or unreadable configuration.
    #[error("Config error: {message}")]
    Config { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type RelverResult<T> = miette::Result<T>;
