//! Human-readable module tree rendering.

use std::collections::HashSet;

use crate::graph::ModuleGraph;
use crate::module::ModuleId;

/// Render the parent/child tree below `root` to a string.
///
/// Each module prints as `group:artifact:version`, with ` -> newVersion`
/// appended when it is dirty (or a placeholder note when dirty without an
/// assigned version yet).
pub fn render_module_tree(graph: &ModuleGraph, root: ModuleId) -> String {
    let mut output = String::new();
    output.push_str(&module_label(graph, root));
    output.push('\n');

    let mut visited = HashSet::new();
    visited.insert(root);

    let children = &graph.module(root).children;
    let count = children.len();
    for (i, child) in children.iter().enumerate() {
        render_subtree(graph, &mut output, *child, "", i == count - 1, &mut visited);
    }

    output
}

fn render_subtree(
    graph: &ModuleGraph,
    output: &mut String,
    id: ModuleId,
    prefix: &str,
    is_last: bool,
    visited: &mut HashSet<ModuleId>,
) {
    let connector = if is_last { "└── " } else { "├── " };
    output.push_str(&format!("{prefix}{connector}{}\n", module_label(graph, id)));

    if !visited.insert(id) {
        return;
    }

    let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
    let children = &graph.module(id).children;
    let count = children.len();
    for (i, child) in children.iter().enumerate() {
        render_subtree(
            graph,
            output,
            *child,
            &child_prefix,
            i == count - 1,
            visited,
        );
    }

    visited.remove(&id);
}

fn module_label(graph: &ModuleGraph, id: ModuleId) -> String {
    let module = graph.module(id);
    if module.dirty {
        match module.new_version {
            Some(ref new_version) => format!("{} -> {new_version}", module.coordinate()),
            None => format!("{} -> (dirty, no version assigned)", module.coordinate()),
        }
    } else {
        module.coordinate()
    }
}
