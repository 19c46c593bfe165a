//! Dependency ordering of the dirty module set.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::artifact::DependencyTarget;
use crate::graph::ModuleGraph;
use crate::module::ModuleId;

/// Result of [`sort_dirty_in_dependency_order`].
#[derive(Debug)]
pub struct SortOutcome {
    /// Dependencies-before-dependents order of the resolved modules, or
    /// the full module list in original order when `stuck` is non-empty.
    pub order: Vec<ModuleId>,
    /// Modules whose mutual references could not be ordered. Empty on
    /// success.
    pub stuck: Vec<ModuleId>,
}

impl SortOutcome {
    pub fn is_fallback(&self) -> bool {
        !self.stuck.is_empty()
    }
}

/// Order the resolved modules (dirty AND carrying an assigned new
/// version) so that every module follows the modules it references.
///
/// Pool scan: repeatedly walk the unresolved pool from the start and move
/// the first candidate with no remaining reference into the pool to the
/// result, restarting the walk after every removal. Quadratic rescans are
/// fine at dirty-set sizes. When a full walk removes nothing, the
/// remaining candidates reference each other (or something unreachable):
/// the sorter warns, names them, and returns the original full input list
/// unchanged rather than failing the run.
pub fn sort_dirty_in_dependency_order(graph: &ModuleGraph) -> SortOutcome {
    let mut pool: Vec<ModuleId> = graph
        .ids()
        .filter(|id| {
            let module = graph.module(*id);
            module.dirty && module.new_version.is_some()
        })
        .collect();
    let mut pool_members: HashSet<ModuleId> = pool.iter().copied().collect();

    let mut order = Vec::with_capacity(pool.len());
    let mut i = 0;

    while i < pool.len() {
        let candidate = pool[i];
        if references_pool_member(graph, candidate, &pool_members) {
            i += 1;
        } else {
            debug!(module = %graph.module(candidate).id, "dependency order resolved");
            order.push(candidate);
            pool.remove(i);
            pool_members.remove(&candidate);
            i = 0;
        }
    }

    if pool.is_empty() {
        return SortOutcome {
            order,
            stuck: Vec::new(),
        };
    }

    for id in &pool {
        warn!(module = %graph.module(*id).id, "could not resolve dependency order");
    }

    SortOutcome {
        order: graph.ids().collect(),
        stuck: pool,
    }
}

/// Whether `id` still references any module left in the pool, through its
/// parent, any edge, or any edge referencing one of its properties.
fn references_pool_member(
    graph: &ModuleGraph,
    id: ModuleId,
    pool_members: &HashSet<ModuleId>,
) -> bool {
    let module = graph.module(id);

    if let Some(ref parent) = module.parent {
        if let DependencyTarget::Module(parent_id) = parent.target {
            if pool_members.contains(&parent_id) {
                return true;
            }
        }
    }

    for edge in &module.edges {
        if let DependencyTarget::Module(target_id) = edge.target {
            if pool_members.contains(&target_id) {
                return true;
            }
        }
    }

    for property in &module.properties {
        for reference in &property.references {
            let edge = &graph.module(reference.module).edges[reference.edge];
            if let DependencyTarget::Module(target_id) = edge.target {
                if pool_members.contains(&target_id) {
                    return true;
                }
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactId, ArtifactRef};
    use crate::module::{EdgeKind, Module, ModuleEdge, ParentRef};

    fn resolved_module(artifact: &str) -> Module {
        let mut module = Module::new(
            format!("{artifact}/pom.xml"),
            ArtifactId::new("org.example", artifact),
            "1.0.0",
            4,
        );
        module.dirty = true;
        module.new_version = Some(format!("2.0.0-{artifact}"));
        module
    }

    fn dependency_on(artifact: &str) -> ModuleEdge {
        ModuleEdge {
            kind: EdgeKind::Dependency,
            version_line: 10,
            raw_version: Some("1.0.0".to_string()),
            target: DependencyTarget::External(ArtifactRef {
                id: ArtifactId::new("org.example", artifact),
                version: Some("1.0.0".to_string()),
            }),
        }
    }

    fn parent_ref(artifact: &str) -> ParentRef {
        ParentRef {
            version_line: 7,
            target: DependencyTarget::External(ArtifactRef {
                id: ArtifactId::new("org.example", artifact),
                version: Some("1.0.0".to_string()),
            }),
        }
    }

    fn names(graph: &ModuleGraph, ids: &[ModuleId]) -> Vec<String> {
        ids.iter()
            .map(|id| graph.module(*id).id.artifact_id.clone())
            .collect()
    }

    #[test]
    fn parents_and_dependencies_come_first() {
        // m2's parent is m1, m3's parent is m2, m4's parent is m1 and m4
        // depends on m3. Input deliberately out of order.
        let m1 = resolved_module("m1");
        let mut m2 = resolved_module("m2");
        m2.parent = Some(parent_ref("m1"));
        let mut m3 = resolved_module("m3");
        m3.parent = Some(parent_ref("m2"));
        let mut m4 = resolved_module("m4");
        m4.parent = Some(parent_ref("m1"));
        m4.edges.push(dependency_on("m3"));

        let mut graph = ModuleGraph::new(vec![m3, m2, m4, m1]);
        graph.link();

        let outcome = sort_dirty_in_dependency_order(&graph);
        assert!(!outcome.is_fallback());
        assert_eq!(names(&graph, &outcome.order), vec!["m1", "m2", "m3", "m4"]);
    }

    #[test]
    fn unresolved_candidates_are_skipped() {
        // y is dirty but has no assigned version, so it is not a candidate
        // and must not block x.
        let mut x = resolved_module("x");
        x.edges.push(dependency_on("y"));
        let mut y = resolved_module("y");
        y.new_version = None;

        let mut graph = ModuleGraph::new(vec![x, y]);
        graph.link();

        let outcome = sort_dirty_in_dependency_order(&graph);
        assert!(!outcome.is_fallback());
        assert_eq!(names(&graph, &outcome.order), vec!["x"]);
    }

    #[test]
    fn cycle_falls_back_to_original_full_list() {
        // x <-> z reference each other; y is independent.
        let mut x = resolved_module("x");
        x.edges.push(dependency_on("y"));
        x.edges.push(dependency_on("z"));
        let y = resolved_module("y");
        let mut z = resolved_module("z");
        z.edges.push(dependency_on("x"));

        let mut graph = ModuleGraph::new(vec![x, y, z]);
        graph.link();

        let outcome = sort_dirty_in_dependency_order(&graph);
        assert!(outcome.is_fallback());
        // Fallback returns every module in the original input order.
        assert_eq!(names(&graph, &outcome.order), vec!["x", "y", "z"]);
        let mut stuck = names(&graph, &outcome.stuck);
        stuck.sort();
        assert_eq!(stuck, vec!["x", "z"]);
    }

    #[test]
    fn cycle_without_third_party_resolves_the_rest() {
        // Same shape but z is not a candidate: x and y order normally.
        let mut x = resolved_module("x");
        x.edges.push(dependency_on("y"));
        x.edges.push(dependency_on("z"));
        let y = resolved_module("y");
        let mut z = resolved_module("z");
        z.edges.push(dependency_on("x"));
        z.dirty = false;
        z.new_version = None;

        let mut graph = ModuleGraph::new(vec![x, y, z]);
        graph.link();

        let outcome = sort_dirty_in_dependency_order(&graph);
        assert!(!outcome.is_fallback());
        assert_eq!(names(&graph, &outcome.order), vec!["y", "x"]);
    }

    #[test]
    fn property_mediated_reference_blocks_declaring_module() {
        use crate::module::ModuleProperty;

        // holder declares a property referenced by an edge targeting dep:
        // dep must precede holder.
        let mut holder = resolved_module("holder");
        holder.properties.push(ModuleProperty::new("depVersion", 9));
        let dep = resolved_module("dep");
        let mut user = resolved_module("user");
        let mut edge = dependency_on("dep");
        edge.raw_version = Some("${depVersion}".to_string());
        user.edges.push(edge);

        let mut graph = ModuleGraph::new(vec![holder, dep, user]);
        graph.link();

        let outcome = sort_dirty_in_dependency_order(&graph);
        assert!(!outcome.is_fallback());
        let ordered = names(&graph, &outcome.order);
        let dep_pos = ordered.iter().position(|n| n == "dep").unwrap();
        let holder_pos = ordered.iter().position(|n| n == "holder").unwrap();
        assert!(dep_pos < holder_pos);
    }

    #[test]
    fn empty_dirty_set_yields_empty_order() {
        let mut m = resolved_module("m");
        m.dirty = false;
        m.new_version = None;

        let graph = ModuleGraph::new(vec![m]);
        let outcome = sort_dirty_in_dependency_order(&graph);
        assert!(!outcome.is_fallback());
        assert!(outcome.order.is_empty());
    }
}
