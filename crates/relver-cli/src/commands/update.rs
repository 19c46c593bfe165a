//! Handler for `relver update`.

use miette::Result;

use relver_core::upstream::UpstreamResolver;
use relver_ops::config::{QualifierStrategy, UpdateConfig};
use relver_ops::update::update_versions;
use relver_pom::upstream::{RepositoryUpstreamResolver, UpstreamSpec};
use relver_scm::git::GitScm;
use relver_util::errors::RelverError;

pub struct UpdateArgs {
    pub base_version: Option<String>,
    pub build_number: Option<u64>,
    pub defer_commit: bool,
    pub metadata: bool,
}

pub fn run(args: UpdateArgs) -> Result<()> {
    let root = super::project_root()?;
    let mut config = UpdateConfig::load_or_default(&root)?;

    if args.base_version.is_some() {
        config.base_version = args.base_version;
    }
    if let Some(build_number) = args.build_number {
        config.qualifier = QualifierStrategy::BuildNumber;
        config.build_number = Some(build_number);
    }
    if args.defer_commit {
        config.defer_commit = true;
    }

    let scm = GitScm::discover(&root);
    let resolver = build_resolver(&config)?;

    let report = update_versions(
        &root,
        &config,
        &scm,
        resolver.as_ref().map(|r| r as &dyn UpstreamResolver),
    )?;

    if args.metadata {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).map_err(|e| RelverError::Generic {
                message: format!("failed to serialize the report: {e}"),
            })?
        );
        return Ok(());
    }

    if report.patched_files.is_empty() {
        println!("Modules are up-to-date. No versions updated.");
    } else {
        println!("Updated {} descriptors:", report.patched_files.len());
        for module in &report.ordered_modules {
            println!("  {module}");
        }
        if config.defer_commit {
            println!("Commit deferred. Run `relver commit` to commit the changes.");
        }
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }

    Ok(())
}

/// Repository-backed resolver when upstream tracking is configured.
fn build_resolver(config: &UpdateConfig) -> Result<Option<RepositoryUpstreamResolver>> {
    let Some(ref repository) = config.upstream_repository else {
        return Ok(None);
    };
    if config.upstream_dependencies.is_empty() {
        return Ok(None);
    }

    let specs = config
        .upstream_dependencies
        .iter()
        .map(|spec| UpstreamSpec::parse(spec))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(RepositoryUpstreamResolver::new(repository, specs)))
}
