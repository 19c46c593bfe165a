//! Upstream version resolution seam.

use relver_util::errors::RelverResult;

use crate::artifact::ArtifactRef;

/// Resolves the latest available version of an external artifact.
///
/// Implementations live outside the core (repository metadata, registries);
/// the pipeline rebinds matching edges to
/// [`crate::artifact::DependencyTarget::Upstream`] when a newer version
/// comes back.
pub trait UpstreamResolver {
    /// Latest version newer than the referenced one, or `None` when the
    /// artifact is unknown or already current.
    fn resolve_latest(&self, artifact: &ArtifactRef) -> RelverResult<Option<String>>;
}

/// What to do when an upstream lookup fails.
///
/// Supplied by the caller; the pipeline never hardcodes a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpstreamPolicy {
    /// Abort the run on the first failed lookup.
    #[default]
    Fail,
    /// Log a warning and treat the reference as unresolved.
    WarnAndContinue,
}
