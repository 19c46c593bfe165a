//! Dirty-state propagation to a fixed point.
//!
//! A module becomes dirty when its parent, or any dependency,
//! dependency-management, plugin, or property-mediated reference resolves
//! to a dirty module or to an upstream artifact with a newer version.
//! One pass propagates the state a single hop; the caller iterates until
//! nothing changes.

use relver_util::errors::{RelverError, RelverResult};
use tracing::debug;

use crate::artifact::DependencyTarget;
use crate::graph::ModuleGraph;
use crate::module::ModuleId;

/// Result of a full propagation run.
#[derive(Debug, Default)]
pub struct PropagationReport {
    /// Number of passes that marked at least one module.
    pub passes: usize,
    /// Every module marked dirty by propagation, in marking order.
    pub newly_dirty: Vec<ModuleId>,
}

/// Run a single propagation pass and return the modules it marked dirty.
///
/// Marks within the pass are visible to later modules of the same pass,
/// so the hop count per pass is a lower bound, never less than one.
pub fn propagate_one_pass(graph: &mut ModuleGraph) -> Vec<ModuleId> {
    let mut newly_dirty = Vec::new();

    for id in graph.ids().collect::<Vec<_>>() {
        if graph.module(id).dirty {
            continue;
        }

        if let Some(reason) = dirty_reason(graph, id) {
            debug!(module = %graph.module(id).id, reason, "marking module dirty");
            graph.module_mut(id).dirty = true;
            newly_dirty.push(id);
        }
    }

    newly_dirty
}

/// Iterate [`propagate_one_pass`] until a pass changes nothing.
///
/// The loop is bounded at module count + 1 passes: every changing pass
/// marks at least one module, so exceeding the bound means the graph is
/// malformed (identity cycle) and propagation aborts instead of looping.
pub fn propagate(graph: &mut ModuleGraph) -> RelverResult<PropagationReport> {
    let max_passes = graph.len() + 1;
    let mut report = PropagationReport::default();

    for _ in 0..max_passes {
        let marked = propagate_one_pass(graph);
        if marked.is_empty() {
            return Ok(report);
        }
        report.passes += 1;
        report.newly_dirty.extend(marked);
    }

    Err(RelverError::Graph {
        message: format!(
            "dirty propagation did not settle within {max_passes} passes; \
             the module graph contains a reference cycle"
        ),
    }
    .into())
}

/// Why `id` must be marked dirty now, or `None` if it stays clean.
///
/// The parent is checked first; otherwise the module's own edges are
/// scanned in descriptor order, then the edges referencing its
/// properties, stopping at the first dirty or upstream target.
fn dirty_reason(graph: &ModuleGraph, id: ModuleId) -> Option<&'static str> {
    let module = graph.module(id);

    if let Some(ref parent) = module.parent {
        match parent.target {
            DependencyTarget::Module(parent_id) if graph.module(parent_id).dirty => {
                return Some("parent is dirty");
            }
            DependencyTarget::Upstream(_) => return Some("upstream parent has a newer version"),
            _ => {}
        }
    }

    for edge in &module.edges {
        match edge.target {
            DependencyTarget::Module(target_id) if graph.module(target_id).dirty => {
                return Some("dependency is dirty");
            }
            DependencyTarget::Upstream(_) => {
                return Some("upstream dependency has a newer version");
            }
            _ => {}
        }
    }

    for property in &module.properties {
        for reference in &property.references {
            let edge = &graph.module(reference.module).edges[reference.edge];
            match edge.target {
                DependencyTarget::Module(target_id) if graph.module(target_id).dirty => {
                    return Some("property-referenced dependency is dirty");
                }
                DependencyTarget::Upstream(_) => {
                    return Some("property-referenced upstream has a newer version");
                }
                _ => {}
            }
        }
    }

    None
}
