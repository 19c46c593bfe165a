use std::fmt;

use crate::module::ModuleId;

/// Immutable identity of a build artifact: `group:artifact`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactId {
    pub group_id: String,
    pub artifact_id: String,
}

impl ArtifactId {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// A reference to an artifact outside the local module graph.
///
/// The version may be absent (inherited or managed elsewhere) or a
/// `${placeholder}` that a property resolves.
#[derive(Debug, Clone)]
pub struct ArtifactRef {
    pub id: ArtifactId,
    pub version: Option<String>,
}

/// An external artifact for which the upstream resolver found a newer
/// version. Treated like a dirty local module wherever edges are inspected.
#[derive(Debug, Clone)]
pub struct UpdatedUpstream {
    pub id: ArtifactId,
    pub version: Option<String>,
    pub new_version: String,
}

/// The target of a version-reference edge.
///
/// Starts out as `External` when parsed; graph linking rebinds targets
/// whose identity matches a local module to `Module`, and upstream
/// resolution rebinds matching externals to `Upstream`. Every consumer
/// matches this exhaustively.
#[derive(Debug, Clone)]
pub enum DependencyTarget {
    /// A module of the local graph, by arena index.
    Module(ModuleId),
    /// An artifact outside the graph.
    External(ArtifactRef),
    /// An external artifact with a resolved newer version.
    Upstream(UpdatedUpstream),
}

impl DependencyTarget {
    /// Identity of the target when it is not a local module.
    ///
    /// `Module` targets resolve their identity through the graph arena.
    pub fn external_id(&self) -> Option<&ArtifactId> {
        match self {
            DependencyTarget::Module(_) => None,
            DependencyTarget::External(r) => Some(&r.id),
            DependencyTarget::Upstream(u) => Some(&u.id),
        }
    }
}
