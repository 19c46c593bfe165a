use std::path::PathBuf;

use crate::artifact::{ArtifactId, DependencyTarget};

/// Stable index of a module in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub usize);

/// Where in the descriptor a version-reference edge was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Dependency,
    DependencyManagement,
    Plugin,
}

/// A version-reference edge: one descriptor location tying a version
/// string to an artifact identity.
#[derive(Debug, Clone)]
pub struct ModuleEdge {
    pub kind: EdgeKind,
    /// 1-based descriptor line of the version text. When the declaration
    /// has no version element, this is the artifactId line instead.
    pub version_line: usize,
    /// The literal version text from the descriptor (`${name}` included),
    /// kept across target rebinding so property matching stays textual.
    pub raw_version: Option<String>,
    pub target: DependencyTarget,
}

/// Address of an edge in the arena: module index + position in its edge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeId {
    pub module: ModuleId,
    pub edge: usize,
}

/// A property declared in a descriptor, used as a version placeholder.
#[derive(Debug, Clone)]
pub struct ModuleProperty {
    pub name: String,
    /// 1-based line of the property declaration.
    pub line: usize,
    /// Every edge (in any module) whose raw version text is `${name}`.
    /// Filled by graph linking.
    pub references: Vec<EdgeId>,
}

impl ModuleProperty {
    pub fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
            references: Vec::new(),
        }
    }
}

/// The parent reference of a module, itself a version-reference edge.
#[derive(Debug, Clone)]
pub struct ParentRef {
    pub version_line: usize,
    pub target: DependencyTarget,
}

/// A locally owned buildable unit, bound to one descriptor file.
#[derive(Debug, Clone)]
pub struct Module {
    pub pom_path: PathBuf,
    pub id: ArtifactId,
    /// Effective version: the declared one, or the parent's when the
    /// descriptor has no version element. May be a `${placeholder}`.
    pub version: String,
    /// 1-based line of the version element, or of the artifactId element
    /// when the version is inherited.
    pub version_line: usize,
    /// True when the version was inherited and patching must insert a
    /// version element instead of replacing one.
    pub insert_version_tag: bool,
    pub parent: Option<ParentRef>,
    /// Dependency, dependency-management, and plugin edges in descriptor
    /// order.
    pub edges: Vec<ModuleEdge>,
    pub properties: Vec<ModuleProperty>,
    /// Modules whose parent reference resolved to this module. Filled by
    /// graph linking.
    pub children: Vec<ModuleId>,
    pub dirty: bool,
    pub new_version: Option<String>,
}

impl Module {
    pub fn new(
        pom_path: impl Into<PathBuf>,
        id: ArtifactId,
        version: impl Into<String>,
        version_line: usize,
    ) -> Self {
        Self {
            pom_path: pom_path.into(),
            id,
            version: version.into(),
            version_line,
            insert_version_tag: false,
            parent: None,
            edges: Vec::new(),
            properties: Vec::new(),
            children: Vec::new(),
            dirty: false,
            new_version: None,
        }
    }

    /// `group:artifact:version` coordinate string.
    pub fn coordinate(&self) -> String {
        format!("{}:{}", self.id, self.version)
    }
}
