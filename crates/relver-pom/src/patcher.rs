//! Line-anchored descriptor patching.
//!
//! Patching never reparses or reserializes the document: it builds at most
//! one edit command per physical line, rewrites only the matched span of
//! those lines, and leaves every other byte untouched. The result is
//! committed through a temp file + atomic rename, so the descriptor on
//! disk is always either fully old or fully new.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use relver_core::artifact::DependencyTarget;
use relver_core::graph::ModuleGraph;
use relver_core::module::{ModuleId, ModuleProperty};
use relver_util::errors::{RelverError, RelverResult};

/// One pending edit on a descriptor line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOp {
    /// Rewrite the inner text of `<tag>…</tag>` on the line.
    Replace { tag: String, value: String },
    /// Add a new line holding `text` directly after the anchor line,
    /// matching its indentation. Used only for a module's own missing
    /// version element.
    InsertAfter { text: String },
}

/// An edit command anchored to a 1-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchCommand {
    pub line: usize,
    pub op: PatchOp,
}

/// Build the edit commands for one dirty module.
///
/// Covers the module's own version (REPLACE, or INSERT when the version
/// was inherited), its parent and every dependency edge whose target
/// carries a new version (always REPLACE), and its properties. Later
/// commands on the same line win, so at most one edit per physical line
/// survives.
pub fn build_patch_commands(
    graph: &ModuleGraph,
    id: ModuleId,
) -> RelverResult<Vec<PatchCommand>> {
    let module = graph.module(id);
    let mut commands: BTreeMap<usize, PatchCommand> = BTreeMap::new();

    // The module's own version.
    match module.new_version {
        Some(ref new_version) => {
            let op = if module.insert_version_tag {
                PatchOp::InsertAfter {
                    text: format!("<version>{new_version}</version>"),
                }
            } else {
                PatchOp::Replace {
                    tag: "version".to_string(),
                    value: new_version.clone(),
                }
            };
            commands.insert(
                module.version_line,
                PatchCommand {
                    line: module.version_line,
                    op,
                },
            );
        }
        None => {
            warn!(module = %module.id, "no new version assigned, cannot update the version element");
        }
    }

    // Parent and dependency references: always REPLACE, never INSERT.
    if let Some(ref parent) = module.parent {
        if let Some(new_version) = target_new_version(graph, &parent.target) {
            commands.insert(
                parent.version_line,
                replace_version(parent.version_line, new_version),
            );
        }
    }
    for edge in &module.edges {
        if let Some(new_version) = target_new_version(graph, &edge.target) {
            commands.insert(
                edge.version_line,
                replace_version(edge.version_line, new_version),
            );
        }
    }

    // Properties: one agreed value across every referencing edge.
    for property in &module.properties {
        if let Some(value) = property_new_value(graph, property)? {
            commands.insert(
                property.line,
                PatchCommand {
                    line: property.line,
                    op: PatchOp::Replace {
                        tag: property.name.clone(),
                        value,
                    },
                },
            );
        }
    }

    Ok(commands.into_values().collect())
}

/// New version carried by an edge target, if any.
///
/// Local modules contribute their assigned version only while dirty;
/// upstream targets always carry one; plain externals never do.
fn target_new_version(graph: &ModuleGraph, target: &DependencyTarget) -> Option<String> {
    match target {
        DependencyTarget::Module(module_id) => {
            let module = graph.module(*module_id);
            if module.dirty {
                module.new_version.clone()
            } else {
                None
            }
        }
        DependencyTarget::Upstream(upstream) => Some(upstream.new_version.clone()),
        DependencyTarget::External(_) => None,
    }
}

/// The single new value for a property, or an error when referencing
/// edges disagree. `None` when no referencing edge carries a new version.
fn property_new_value(
    graph: &ModuleGraph,
    property: &ModuleProperty,
) -> RelverResult<Option<String>> {
    let mut value: Option<String> = None;
    for reference in &property.references {
        let edge = &graph.module(reference.module).edges[reference.edge];
        let Some(candidate) = target_new_version(graph, &edge.target) else {
            continue;
        };
        match value {
            Some(ref existing) if *existing != candidate => {
                return Err(RelverError::PropertyConflict {
                    property: property.name.clone(),
                    existing: existing.clone(),
                    conflicting: candidate,
                }
                .into());
            }
            _ => value = Some(candidate),
        }
    }
    Ok(value)
}

fn replace_version(line: usize, value: String) -> PatchCommand {
    PatchCommand {
        line,
        op: PatchOp::Replace {
            tag: "version".to_string(),
            value,
        },
    }
}

/// Apply edit commands to descriptor text.
///
/// Lines without a command are copied byte-identically, line endings
/// included. A commanded line whose expected `<tag>…</tag>` span is
/// missing is copied unchanged with a warning.
pub fn apply_commands(content: &str, commands: &[PatchCommand]) -> String {
    let by_line: BTreeMap<usize, &PatchCommand> =
        commands.iter().map(|c| (c.line, c)).collect();

    let mut output = String::with_capacity(content.len());
    for (i, line) in content.split_inclusive('\n').enumerate() {
        match by_line.get(&(i + 1)) {
            None => output.push_str(line),
            Some(command) => match &command.op {
                PatchOp::Replace { tag, value } => {
                    output.push_str(&replace_span(line, tag, value, command.line));
                }
                PatchOp::InsertAfter { text } => {
                    output.push_str(line);
                    let ending = line_ending(line);
                    if ending.is_empty() {
                        output.push('\n');
                    }
                    let body = &line[..line.len() - ending.len()];
                    let indent: String = body
                        .chars()
                        .take_while(|c| c.is_whitespace())
                        .collect();
                    output.push_str(&indent);
                    output.push_str(text);
                    output.push_str(ending);
                }
            },
        }
    }
    output
}

fn line_ending(line: &str) -> &str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

fn replace_span(line: &str, tag: &str, value: &str, line_no: usize) -> String {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    match (line.find(&open), line.find(&close)) {
        (Some(start), Some(end)) if end >= start + open.len() => {
            debug!(tag, value, line = line_no, "rewriting version span");
            format!("{}{}{}", &line[..start + open.len()], value, &line[end..])
        }
        _ => {
            warn!(tag, line = line_no, "expected element not found on line, leaving it unchanged");
            line.to_string()
        }
    }
}

/// Build and apply the commands for a dirty module, committing the result
/// atomically over the original descriptor.
pub fn patch_module(graph: &ModuleGraph, id: ModuleId) -> RelverResult<()> {
    let module = graph.module(id);
    if !module.dirty {
        return Ok(());
    }

    let commands = build_patch_commands(graph, id)?;
    if commands.is_empty() {
        return Ok(());
    }

    let content =
        std::fs::read_to_string(&module.pom_path).map_err(|e| RelverError::Pom {
            message: format!("failed to read {}: {e}", module.pom_path.display()),
        })?;
    let patched = apply_commands(&content, &commands);

    debug!(path = %module.pom_path.display(), commands = commands.len(), "rewriting descriptor");
    relver_util::fs::write_atomic(&module.pom_path, &patched).map_err(|e| {
        RelverError::Pom {
            message: format!("failed to update {}: {e}", module.pom_path.display()),
        }
    })?;

    Ok(())
}
