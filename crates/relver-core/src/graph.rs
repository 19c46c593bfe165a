//! Module graph arena and the linking pass.

use std::collections::HashMap;

use tracing::debug;

use crate::artifact::{ArtifactId, DependencyTarget};
use crate::module::{EdgeId, Module, ModuleId};

/// The in-memory module graph: an arena of modules addressed by
/// [`ModuleId`], so parent/child and property relations stay non-owning.
///
/// Identity (`group:artifact`) selects a module; duplicate identities are
/// not validated and resolve to the first occurrence.
pub struct ModuleGraph {
    modules: Vec<Module>,
    /// Lookup from identity to arena index (first occurrence wins).
    index: HashMap<ArtifactId, ModuleId>,
}

impl ModuleGraph {
    /// Build an arena over parsed modules. Call [`ModuleGraph::link`]
    /// afterwards to rebind edges and fill property references.
    pub fn new(modules: Vec<Module>) -> Self {
        let mut index = HashMap::new();
        for (i, module) in modules.iter().enumerate() {
            index.entry(module.id.clone()).or_insert(ModuleId(i));
        }
        Self { modules, index }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ModuleId> {
        (0..self.modules.len()).map(ModuleId)
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Look up a module by identity.
    pub fn find(&self, id: &ArtifactId) -> Option<ModuleId> {
        self.index.get(id).copied()
    }

    /// Identity of an edge target, resolving module targets through the arena.
    pub fn target_id<'a>(&'a self, target: &'a DependencyTarget) -> &'a ArtifactId {
        match target {
            DependencyTarget::Module(id) => &self.module(*id).id,
            DependencyTarget::External(r) => &r.id,
            DependencyTarget::Upstream(u) => &u.id,
        }
    }

    /// Modules whose parent is not a local module (tree roots).
    pub fn roots(&self) -> Vec<ModuleId> {
        self.ids()
            .filter(|id| {
                !matches!(
                    self.module(*id).parent,
                    Some(ref p) if matches!(p.target, DependencyTarget::Module(_))
                )
            })
            .collect()
    }

    /// Link the parsed modules into a navigable graph.
    ///
    /// Rebinds every parent and dependency edge whose identity matches a
    /// local module, records `children` back-references, and attaches to
    /// each declared property every edge (across all modules) whose raw
    /// version text is exactly `${name}`. Edges matching no local module
    /// stay external.
    pub fn link(&mut self) {
        // Parents: rebind and record children.
        let mut parent_links: Vec<(ModuleId, ModuleId)> = Vec::new();
        for id in self.ids() {
            let module = self.module(id);
            if let Some(ref parent) = module.parent {
                if let Some(ext) = parent.target.external_id() {
                    if let Some(parent_id) = self.find(ext) {
                        parent_links.push((id, parent_id));
                    }
                }
            }
        }
        for (child, parent) in parent_links {
            debug!(
                child = %self.module(child).id,
                parent = %self.module(parent).id,
                "linked parent module"
            );
            if let Some(ref mut parent_ref) = self.modules[child.0].parent {
                parent_ref.target = DependencyTarget::Module(parent);
            }
            self.modules[parent.0].children.push(child);
        }

        // Dependency, dependency-management, and plugin edges.
        for i in 0..self.modules.len() {
            for e in 0..self.modules[i].edges.len() {
                let resolved = self.modules[i].edges[e]
                    .target
                    .external_id()
                    .and_then(|ext| self.index.get(ext).copied());
                if let Some(target_id) = resolved {
                    self.modules[i].edges[e].target = DependencyTarget::Module(target_id);
                }
            }
        }

        // Properties: attach every edge whose version text is exactly
        // `${name}`. No partial substitution, no recursive resolution.
        let mut property_refs: Vec<(ModuleId, usize, Vec<EdgeId>)> = Vec::new();
        for id in self.ids() {
            for (p, property) in self.module(id).properties.iter().enumerate() {
                let placeholder = format!("${{{}}}", property.name);
                let mut references = Vec::new();
                for source in self.ids() {
                    for (e, edge) in self.module(source).edges.iter().enumerate() {
                        if edge.raw_version.as_deref() == Some(placeholder.as_str()) {
                            references.push(EdgeId {
                                module: source,
                                edge: e,
                            });
                        }
                    }
                }
                if !references.is_empty() {
                    property_refs.push((id, p, references));
                }
            }
        }
        for (id, p, references) in property_refs {
            self.modules[id.0].properties[p].references = references;
        }
    }
}
