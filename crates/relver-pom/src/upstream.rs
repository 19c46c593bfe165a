//! Upstream version lookup against a Maven repository mirror.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use relver_core::artifact::{ArtifactId, ArtifactRef};
use relver_core::upstream::UpstreamResolver;
use relver_util::errors::{RelverError, RelverResult};

use crate::version::{MavenVersion, VersionRange};

/// Which external artifacts to track, with an optional version bound.
///
/// Parsed from `group:artifact` or `group:artifact:[1.0,2.0)`; both the
/// group and artifact parts accept glob wildcards.
#[derive(Debug, Clone)]
pub struct UpstreamSpec {
    group: GlobMatcher,
    artifact: GlobMatcher,
    range: Option<VersionRange>,
}

impl UpstreamSpec {
    pub fn parse(spec: &str) -> RelverResult<Self> {
        let (coords, range) = match spec.match_indices(':').nth(1) {
            Some((i, _)) => {
                let range = VersionRange::parse(&spec[i + 1..]).ok_or_else(|| {
                    RelverError::Config {
                        message: format!("invalid version range in upstream spec '{spec}'"),
                    }
                })?;
                (&spec[..i], Some(range))
            }
            None => (spec, None),
        };

        let (group, artifact) = coords.split_once(':').ok_or_else(|| RelverError::Config {
            message: format!("upstream spec '{spec}' must look like group:artifact[:range]"),
        })?;

        let matcher = |pattern: &str| -> RelverResult<GlobMatcher> {
            Ok(Glob::new(pattern)
                .map_err(|e| RelverError::Config {
                    message: format!("invalid pattern '{pattern}' in upstream spec: {e}"),
                })?
                .compile_matcher())
        };

        Ok(Self {
            group: matcher(group)?,
            artifact: matcher(artifact)?,
            range,
        })
    }

    pub fn matches(&self, id: &ArtifactId) -> bool {
        self.group.is_match(&id.group_id) && self.artifact.is_match(&id.artifact_id)
    }
}

/// Versions listed in an artifact-level `maven-metadata.xml`.
#[derive(Debug, Default)]
struct RepositoryMetadata {
    versions: Vec<String>,
}

/// Resolves upstream versions from a local Maven repository layout
/// (`<root>/<group/as/path>/<artifact>/maven-metadata.xml`).
pub struct RepositoryUpstreamResolver {
    repository_root: PathBuf,
    specs: Vec<UpstreamSpec>,
}

impl RepositoryUpstreamResolver {
    pub fn new(repository_root: impl Into<PathBuf>, specs: Vec<UpstreamSpec>) -> Self {
        Self {
            repository_root: repository_root.into(),
            specs,
        }
    }

    fn metadata_path(&self, id: &ArtifactId) -> PathBuf {
        let mut path = self.repository_root.clone();
        for part in id.group_id.split('.') {
            path.push(part);
        }
        path.push(&id.artifact_id);
        path.push("maven-metadata.xml");
        path
    }
}

impl UpstreamResolver for RepositoryUpstreamResolver {
    fn resolve_latest(&self, artifact: &ArtifactRef) -> RelverResult<Option<String>> {
        let Some(spec) = self.specs.iter().find(|s| s.matches(&artifact.id)) else {
            return Ok(None);
        };

        let metadata_path = self.metadata_path(&artifact.id);
        let xml = std::fs::read_to_string(&metadata_path).map_err(|e| RelverError::Upstream {
            message: format!(
                "no repository metadata for {} at {}: {e}",
                artifact.id,
                metadata_path.display()
            ),
        })?;
        let metadata = parse_repository_metadata(&xml, &metadata_path)?;

        let current = artifact.version.as_deref().map(MavenVersion::parse);
        let best = metadata
            .versions
            .iter()
            .map(|v| MavenVersion::parse(v))
            .filter(|v| spec.range.as_ref().map_or(true, |r| r.contains(v)))
            .max();

        match best {
            Some(best) if current.as_ref().map_or(true, |c| best > *c) => {
                debug!(artifact = %artifact.id, version = %best, "found newer upstream version");
                Ok(Some(best.as_str().to_string()))
            }
            _ => Ok(None),
        }
    }
}

/// Parse an artifact-level `maven-metadata.xml` version listing.
fn parse_repository_metadata(xml: &str, path: &Path) -> RelverResult<RepositoryMetadata> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut metadata = RepositoryMetadata::default();
    let mut elem_path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                elem_path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                if elem_path.join(">") == "metadata>versioning>versions>version" {
                    metadata.versions.push(text_buf.clone());
                }
                elem_path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(RelverError::Upstream {
                    message: format!("failed to parse {}: {e}", path.display()),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(metadata)
}
