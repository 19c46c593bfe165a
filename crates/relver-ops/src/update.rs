//! The version-update pipeline.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use relver_core::artifact::{DependencyTarget, UpdatedUpstream};
use relver_core::graph::ModuleGraph;
use relver_core::module::{EdgeKind, ModuleId};
use relver_core::propagate;
use relver_core::sort::sort_dirty_in_dependency_order;
use relver_core::tree::render_module_tree;
use relver_core::upstream::{UpstreamPolicy, UpstreamResolver};
use relver_pom::{patcher, traverse};
use relver_scm::{ScmHandler, COMMIT_MESSAGE_PREFIX};
use relver_util::errors::{RelverError, RelverResult};

use crate::config::{QualifierStrategy, UpdateConfig};
use crate::outputs;
use crate::qualifier;

/// Machine-readable result of an update run.
#[derive(Debug, Default, Serialize)]
pub struct UpdateReport {
    /// Descriptor files that were rewritten, in patch order.
    pub patched_files: Vec<PathBuf>,
    /// `group:artifact:version -> newVersion` of the rewritten modules in
    /// dependency order (dependencies first).
    pub ordered_modules: Vec<String>,
    /// Non-fatal findings: unresolved upstreams, unsortable modules.
    pub warnings: Vec<String>,
    /// Number of propagation passes that changed something.
    pub propagation_passes: usize,
    /// Rendered module tree, one block per root.
    pub tree: String,
}

/// Run the whole pipeline on the module tree rooted at `project_root`.
///
/// Change detection and committing go through `scm`; upstream version
/// lookups go through `upstream` when one is configured. Already-patched
/// descriptors stay committed when a later step fails.
pub fn update_versions(
    project_root: &Path,
    config: &UpdateConfig,
    scm: &dyn ScmHandler,
    upstream: Option<&dyn UpstreamResolver>,
) -> RelverResult<UpdateReport> {
    let now = Utc::now();
    let mut report = UpdateReport::default();

    info!(root = %project_root.display(), "scanning for modules");
    let modules = traverse::read_all_modules(project_root)?;
    info!(count = modules.len(), "modules found");

    let mut graph = ModuleGraph::new(modules);
    graph.link();

    seed_dirty(&mut graph, project_root, config, scm)?;

    if let Some(resolver) = upstream {
        let policy = if config.dont_fail_on_upstream_resolution {
            UpstreamPolicy::WarnAndContinue
        } else {
            UpstreamPolicy::Fail
        };
        rebind_upstreams(&mut graph, resolver, policy, &mut report.warnings)?;
    }

    let propagation = propagate::propagate(&mut graph)?;
    report.propagation_passes = propagation.passes;
    info!(
        newly_dirty = propagation.newly_dirty.len(),
        passes = propagation.passes,
        "dirty state propagated"
    );

    assign_new_versions(&mut graph, config, scm, now)?;

    for root in graph.roots() {
        report.tree.push_str(&render_module_tree(&graph, root));
    }
    info!("module tree:\n{}", report.tree);

    let outcome = sort_dirty_in_dependency_order(&graph);
    for id in &outcome.stuck {
        report
            .warnings
            .push(format!("could not resolve dependency order for {}", graph.module(*id).id));
    }

    for id in resolved_in_order(&graph, &outcome.order) {
        patcher::patch_module(&graph, id)?;
        let module = graph.module(id);
        report.patched_files.push(module.pom_path.clone());
        report.ordered_modules.push(format!(
            "{} -> {}",
            module.coordinate(),
            module.new_version.as_deref().unwrap_or("?")
        ));
    }

    write_outputs(project_root, config, &report, now)?;

    if report.patched_files.is_empty() {
        info!("modules are up-to-date, no versions updated");
    } else if config.defer_commit {
        info!("deferring the commit; run `relver commit` to commit the changes");
    } else {
        let message = format!(
            "{COMMIT_MESSAGE_PREFIX} Version of {} artifacts updated",
            report.patched_files.len()
        );
        scm.commit_files(&report.patched_files, &message)?;
    }

    Ok(report)
}

/// Mark every module that needs a new version before propagation:
/// placeholder versions, SNAPSHOT or unparseable qualifiers, and modules
/// whose directory changed since the reference instant.
fn seed_dirty(
    graph: &mut ModuleGraph,
    project_root: &Path,
    config: &UpdateConfig,
    scm: &dyn ScmHandler,
) -> RelverResult<()> {
    let stored_tracker = config
        .use_change_tracker_file
        .then(|| outputs::read_change_tracker(project_root))
        .flatten();

    for id in graph.ids().collect::<Vec<_>>() {
        let module = graph.module(id);
        let version = module.version.clone();
        let module_name = module.id.to_string();
        let module_dir = module
            .pom_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let reason: Option<String> = if version.starts_with("${") {
            Some("version is a property placeholder".to_string())
        } else if config.use_change_tracker_file && stored_tracker.is_none() {
            Some("no stored change tracker instant".to_string())
        } else {
            let qualifier_text = match stored_tracker {
                Some(ref tracker) => Some(tracker.as_str()),
                None => qualifier::version_qualifier(&version),
            };
            match qualifier_text {
                None => Some(format!("no qualifier in version {version}")),
                Some("SNAPSHOT") => Some("SNAPSHOT version".to_string()),
                Some(qualifier_text) => {
                    match qualifier::parse_timestamp(qualifier_text, &config.timestamp_pattern) {
                        None => Some(format!("invalid timestamp qualifier '{qualifier_text}'")),
                        Some(since) => {
                            if scm.changes_since(&module_dir, since)? {
                                Some(format!("changes since {qualifier_text}"))
                            } else {
                                None
                            }
                        }
                    }
                }
            }
        };

        if let Some(reason) = reason {
            info!(module = %module_name, reason, "assigning a new version");
            graph.module_mut(id).dirty = true;
        }
    }

    Ok(())
}

/// Replace external parent and dependency targets with `Upstream` when
/// the resolver reports a newer version. Dependency-management entries
/// pin versions for others and are not followed.
fn rebind_upstreams(
    graph: &mut ModuleGraph,
    resolver: &dyn UpstreamResolver,
    policy: UpstreamPolicy,
    warnings: &mut Vec<String>,
) -> RelverResult<()> {
    for id in graph.ids().collect::<Vec<_>>() {
        if let Some(parent) = graph.module(id).parent.clone() {
            if let DependencyTarget::External(ref artifact) = parent.target {
                if let Some(updated) = resolve_one(resolver, artifact, policy, warnings)? {
                    if let Some(ref mut parent) = graph.module_mut(id).parent {
                        parent.target = DependencyTarget::Upstream(updated);
                    }
                }
            }
        }

        for e in 0..graph.module(id).edges.len() {
            let edge = &graph.module(id).edges[e];
            if edge.kind == EdgeKind::DependencyManagement {
                continue;
            }
            let DependencyTarget::External(artifact) = edge.target.clone() else {
                continue;
            };
            if let Some(updated) = resolve_one(resolver, &artifact, policy, warnings)? {
                graph.module_mut(id).edges[e].target = DependencyTarget::Upstream(updated);
            }
        }
    }
    Ok(())
}

fn resolve_one(
    resolver: &dyn UpstreamResolver,
    artifact: &relver_core::artifact::ArtifactRef,
    policy: UpstreamPolicy,
    warnings: &mut Vec<String>,
) -> RelverResult<Option<UpdatedUpstream>> {
    match resolver.resolve_latest(artifact) {
        Ok(Some(new_version)) => {
            info!(artifact = %artifact.id, new_version, "newer upstream version found");
            Ok(Some(UpdatedUpstream {
                id: artifact.id.clone(),
                version: artifact.version.clone(),
                new_version,
            }))
        }
        Ok(None) => Ok(None),
        Err(e) => match policy {
            UpstreamPolicy::Fail => Err(e),
            UpstreamPolicy::WarnAndContinue => {
                warn!(artifact = %artifact.id, error = %e, "upstream resolution failed");
                warnings.push(format!("upstream resolution failed for {}: {e}", artifact.id));
                Ok(None)
            }
        },
    }
}

/// Assign `base<separator><qualifier>` to every dirty module. Every dirty
/// module directory must be a working copy.
fn assign_new_versions(
    graph: &mut ModuleGraph,
    config: &UpdateConfig,
    scm: &dyn ScmHandler,
    now: DateTime<Utc>,
) -> RelverResult<()> {
    let base_version = config.base_version.as_deref().ok_or_else(|| {
        RelverError::Config {
            message: "base-version is required to assign new versions".to_string(),
        }
    })?;

    let qualifier_text = match config.qualifier {
        QualifierStrategy::Timestamp => qualifier::format_timestamp(now, &config.timestamp_pattern),
        QualifierStrategy::BuildNumber => config
            .build_number
            .ok_or_else(|| RelverError::Config {
                message: "build-number is required for the build-number qualifier".to_string(),
            })?
            .to_string(),
    };
    let new_version = format!("{base_version}{}{qualifier_text}", config.separator);

    for id in graph.ids().collect::<Vec<_>>() {
        let module = graph.module(id);
        if !module.dirty {
            continue;
        }
        let module_dir = module.pom_path.parent().map(Path::to_path_buf).unwrap_or_default();
        if !scm.is_working_copy(&module_dir) {
            return Err(RelverError::Scm {
                message: format!("module path is not a working copy: {}", module_dir.display()),
            }
            .into());
        }
        debug!(module = %module.id, new_version, "assigning new version");
        graph.module_mut(id).new_version = Some(new_version.clone());
    }

    Ok(())
}

/// Modules to patch, in sorted order: the dirty subset with an assigned
/// version. On sorter fallback the order still contains every module, so
/// the filter keeps behavior identical either way.
fn resolved_in_order(graph: &ModuleGraph, order: &[ModuleId]) -> Vec<ModuleId> {
    order
        .iter()
        .copied()
        .filter(|id| {
            let module = graph.module(*id);
            module.dirty && module.new_version.is_some()
        })
        .collect()
}

fn write_outputs(
    project_root: &Path,
    config: &UpdateConfig,
    report: &UpdateReport,
    now: DateTime<Utc>,
) -> RelverResult<()> {
    if config.generate_changed_projects_file {
        outputs::write_changed_projects_file(project_root, &report.patched_files)?;
    }

    if !report.patched_files.is_empty() {
        outputs::write_dirty_modules_registry(project_root, &report.patched_files)?;
        if config.generate_build_scripts {
            outputs::write_incremental_build_script(project_root, &report.patched_files)?;
        }
    }

    if config.use_change_tracker_file {
        let tracker = qualifier::format_timestamp(now, &config.timestamp_pattern);
        outputs::store_change_tracker(project_root, &tracker)?;
    }

    Ok(())
}
