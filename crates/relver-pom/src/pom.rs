//! Line-tracked POM reading.
//!
//! Parses a descriptor into a [`Module`], recording the 1-based source
//! line of every version string (module version, parent version,
//! dependency/plugin versions, property declarations). The patcher relies
//! on these lines; nothing here ever rewrites the document.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use relver_core::artifact::{ArtifactId, ArtifactRef, DependencyTarget};
use relver_core::module::{EdgeKind, Module, ModuleEdge, ModuleProperty, ParentRef};
use relver_util::errors::{RelverError, RelverResult};

/// Group used by Maven when a plugin declares none.
const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

/// Read and parse one descriptor file.
pub fn read_module(path: &Path) -> RelverResult<Module> {
    debug!(path = %path.display(), "loading POM file");
    let xml = std::fs::read_to_string(path).map_err(|e| RelverError::Pom {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    parse_module(&xml, path)
}

/// Accumulator for an in-flight dependency, plugin, or parent element.
struct ElementAcc {
    kind: EdgeKind,
    /// `path.len()` at the element's start tag; fields are only assigned
    /// from direct children, which keeps exclusion blocks out.
    depth: usize,
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    artifact_line: usize,
    version_line: Option<usize>,
}

impl ElementAcc {
    fn new(kind: EdgeKind, depth: usize, line: usize) -> Self {
        Self {
            kind,
            depth,
            group_id: None,
            artifact_id: None,
            version: None,
            artifact_line: line,
            version_line: None,
        }
    }

    /// Line of the version text, falling back to the artifactId line when
    /// the element has no version.
    fn version_line(&self) -> usize {
        self.version_line.unwrap_or(self.artifact_line)
    }
}

/// Parse descriptor XML into a [`Module`].
///
/// The module's identity and version fall back to the parent declaration;
/// a descriptor with neither is malformed and fails the run.
pub fn parse_module(xml: &str, path: &Path) -> RelverResult<Module> {
    let line_starts = index_line_starts(xml);
    let line_of = |pos: usize| -> usize { line_starts.partition_point(|&start| start <= pos) };

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut elem_path: Vec<String> = Vec::new();
    let mut text_buf = String::new();
    let mut last_start_line = 1usize;

    let mut group_id: Option<String> = None;
    let mut artifact_id: Option<String> = None;
    let mut version: Option<String> = None;
    let mut artifact_line = 1usize;
    let mut version_line: Option<usize> = None;

    let mut parent: Option<ElementAcc> = None;
    let mut properties: Vec<ModuleProperty> = Vec::new();
    let mut edges: Vec<ModuleEdge> = Vec::new();
    // Stack, because plugins nest their own dependency elements.
    let mut open_elements: Vec<ElementAcc> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                elem_path.push(tag);
                text_buf.clear();

                let pos = reader.buffer_position() as usize;
                last_start_line = line_of(pos.saturating_sub(1));

                let ctx = elem_path.join(">");
                match ctx.as_str() {
                    "project>parent" => {
                        parent = Some(ElementAcc::new(
                            EdgeKind::Dependency,
                            elem_path.len(),
                            last_start_line,
                        ));
                    }
                    "project>dependencies>dependency"
                    | "project>build>plugins>plugin>dependencies>dependency"
                    | "project>profiles>profile>dependencies>dependency"
                    | "project>profiles>profile>build>plugins>plugin>dependencies>dependency" => {
                        open_elements.push(ElementAcc::new(
                            EdgeKind::Dependency,
                            elem_path.len(),
                            last_start_line,
                        ));
                    }
                    "project>dependencyManagement>dependencies>dependency" => {
                        open_elements.push(ElementAcc::new(
                            EdgeKind::DependencyManagement,
                            elem_path.len(),
                            last_start_line,
                        ));
                    }
                    "project>build>plugins>plugin"
                    | "project>profiles>profile>build>plugins>plugin" => {
                        open_elements.push(ElementAcc::new(
                            EdgeKind::Plugin,
                            elem_path.len(),
                            last_start_line,
                        ));
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                // Self-closing elements matter only as empty properties.
                if elem_path.join(">") == "project>properties" {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    let pos = reader.buffer_position() as usize;
                    properties.push(ModuleProperty::new(name, line_of(pos.saturating_sub(1))));
                }
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                let depth = elem_path.len();
                let field = elem_path.last().map(|s| s.as_str()).unwrap_or_default();

                // Declared properties: direct children of <properties>.
                if depth == 3 && elem_path.get(1).map(|s| s.as_str()) == Some("properties") {
                    properties.push(ModuleProperty::new(field, last_start_line));
                }

                // Fields of the innermost open dependency/plugin element.
                let assigned = if let Some(acc) = open_elements.last_mut() {
                    if depth == acc.depth + 1 {
                        assign_field(acc, field, &text_buf, last_start_line)
                    } else {
                        false
                    }
                } else {
                    false
                };

                if !assigned {
                    if let Some(ref mut acc) = parent {
                        let inside_parent = depth == acc.depth + 1
                            && elem_path.get(1).map(|s| s.as_str()) == Some("parent");
                        if inside_parent {
                            assign_field(acc, field, &text_buf, last_start_line);
                        }
                    }
                }

                // Top-level project fields.
                if depth == 2 {
                    match field {
                        "groupId" => group_id = Some(text_buf.clone()),
                        "artifactId" => {
                            artifact_id = Some(text_buf.clone());
                            artifact_line = last_start_line;
                        }
                        "version" => {
                            version = Some(text_buf.clone());
                            version_line = Some(last_start_line);
                        }
                        _ => {}
                    }
                }

                // Close out a finished dependency/plugin element.
                if open_elements.last().is_some_and(|acc| acc.depth == depth) {
                    if let Some(acc) = open_elements.pop() {
                        if let Some(edge) = finish_edge(acc, path) {
                            edges.push(edge);
                        }
                    }
                }

                elem_path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(RelverError::Pom {
                    message: format!("failed to parse {}: {e}", path.display()),
                }
                .into());
            }
            _ => {}
        }
    }

    assemble_module(
        path,
        group_id,
        artifact_id,
        version,
        artifact_line,
        version_line,
        parent,
        properties,
        edges,
    )
}

/// Byte offset of the first character of every line.
fn index_line_starts(xml: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in xml.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

fn assign_field(acc: &mut ElementAcc, field: &str, value: &str, line: usize) -> bool {
    match field {
        "groupId" => acc.group_id = Some(value.to_string()),
        "artifactId" => {
            acc.artifact_id = Some(value.to_string());
            acc.artifact_line = line;
        }
        "version" => {
            acc.version = Some(value.to_string());
            acc.version_line = Some(line);
        }
        _ => return false,
    }
    true
}

fn finish_edge(acc: ElementAcc, path: &Path) -> Option<ModuleEdge> {
    let Some(artifact_id) = acc.artifact_id.clone() else {
        warn!(
            path = %path.display(),
            "skipping a declaration without an artifactId"
        );
        return None;
    };
    let group_id = match acc.group_id.clone() {
        Some(g) => g,
        None if acc.kind == EdgeKind::Plugin => DEFAULT_PLUGIN_GROUP.to_string(),
        None => {
            warn!(
                path = %path.display(),
                artifact = %artifact_id,
                "skipping a dependency without a groupId"
            );
            return None;
        }
    };

    Some(ModuleEdge {
        kind: acc.kind,
        version_line: acc.version_line(),
        raw_version: acc.version.clone(),
        target: DependencyTarget::External(ArtifactRef {
            id: ArtifactId::new(group_id, artifact_id),
            version: acc.version,
        }),
    })
}

#[allow(clippy::too_many_arguments)]
fn assemble_module(
    path: &Path,
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    artifact_line: usize,
    version_line: Option<usize>,
    parent: Option<ElementAcc>,
    properties: Vec<ModuleProperty>,
    edges: Vec<ModuleEdge>,
) -> RelverResult<Module> {
    let artifact_id = artifact_id.ok_or_else(|| RelverError::Pom {
        message: format!("invalid POM {}: artifactId is not set", path.display()),
    })?;

    let group_id = match group_id.or_else(|| parent.as_ref().and_then(|p| p.group_id.clone())) {
        Some(g) => g,
        None => {
            return Err(RelverError::Pom {
                message: format!(
                    "invalid POM {}: groupId is not set and no parent either",
                    path.display()
                ),
            }
            .into());
        }
    };

    let mut insert_version_tag = false;
    let version = match version.or_else(|| {
        parent.as_ref().and_then(|p| {
            insert_version_tag = true;
            p.version.clone()
        })
    }) {
        Some(v) => v,
        None => {
            return Err(RelverError::Pom {
                message: format!(
                    "invalid POM {}: version is not set and no parent either",
                    path.display()
                ),
            }
            .into());
        }
    };

    let mut module = Module::new(path, ArtifactId::new(group_id, artifact_id), version, 0);
    module.version_line = version_line.unwrap_or(artifact_line);
    module.insert_version_tag = insert_version_tag;
    module.properties = properties;
    module.edges = edges;

    if let Some(acc) = parent {
        let (Some(parent_group), Some(parent_artifact)) =
            (acc.group_id.clone(), acc.artifact_id.clone())
        else {
            return Err(RelverError::Pom {
                message: format!(
                    "invalid POM {}: parent declaration is missing groupId or artifactId",
                    path.display()
                ),
            }
            .into());
        };
        module.parent = Some(ParentRef {
            version_line: acc.version_line(),
            target: DependencyTarget::External(ArtifactRef {
                id: ArtifactId::new(parent_group, parent_artifact),
                version: acc.version,
            }),
        });
    }

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(xml: &str) -> Module {
        parse_module(xml, &PathBuf::from("pom.xml")).unwrap()
    }

    const SIMPLE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>org.example</groupId>
    <artifactId>core</artifactId>
    <version>1.0.0-SNAPSHOT</version>
    <packaging>jar</packaging>

    <dependencies>
        <dependency>
            <groupId>org.example</groupId>
            <artifactId>util</artifactId>
            <version>1.0.0-SNAPSHOT</version>
        </dependency>
        <dependency>
            <groupId>junit</groupId>
            <artifactId>junit</artifactId>
            <version>4.13.2</version>
            <scope>test</scope>
        </dependency>
    </dependencies>
</project>"#;

    #[test]
    fn reads_identity_and_version_lines() {
        let module = parse(SIMPLE_POM);
        assert_eq!(module.id, ArtifactId::new("org.example", "core"));
        assert_eq!(module.version, "1.0.0-SNAPSHOT");
        assert_eq!(module.version_line, 6);
        assert!(!module.insert_version_tag);
        assert!(module.parent.is_none());

        assert_eq!(module.edges.len(), 2);
        assert_eq!(module.edges[0].version_line, 13);
        assert_eq!(module.edges[0].raw_version.as_deref(), Some("1.0.0-SNAPSHOT"));
        assert_eq!(module.edges[1].version_line, 18);
    }

    #[test]
    fn version_inherited_from_parent_flags_insertion() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <parent>
        <groupId>org.example</groupId>
        <artifactId>parent</artifactId>
        <version>2.0.0</version>
    </parent>
    <artifactId>child</artifactId>
</project>"#;
        let module = parse(xml);
        assert_eq!(module.id, ArtifactId::new("org.example", "child"));
        assert_eq!(module.version, "2.0.0");
        assert!(module.insert_version_tag);
        // No version element: the artifactId line anchors the insert.
        assert_eq!(module.version_line, 8);

        let parent = module.parent.as_ref().unwrap();
        assert_eq!(parent.version_line, 6);
        match &parent.target {
            DependencyTarget::External(r) => {
                assert_eq!(r.id, ArtifactId::new("org.example", "parent"));
                assert_eq!(r.version.as_deref(), Some("2.0.0"));
            }
            other => panic!("expected external parent, got {other:?}"),
        }
    }

    #[test]
    fn reads_properties_with_lines() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>lib</artifactId>
    <version>1.0.0</version>

    <properties>
        <util.version>3.0.0</util.version>
        <skipTests>true</skipTests>
    </properties>
</project>"#;
        let module = parse(xml);
        assert_eq!(module.properties.len(), 2);
        assert_eq!(module.properties[0].name, "util.version");
        assert_eq!(module.properties[0].line, 8);
        assert_eq!(module.properties[1].name, "skipTests");
        assert_eq!(module.properties[1].line, 9);
    }

    #[test]
    fn dependency_management_and_plugins_become_edges() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>parent</artifactId>
    <version>1.0.0</version>

    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.example</groupId>
                <artifactId>core</artifactId>
                <version>1.0.0</version>
            </dependency>
        </dependencies>
    </dependencyManagement>

    <build>
        <plugins>
            <plugin>
                <groupId>org.example</groupId>
                <artifactId>build-plugin</artifactId>
                <version>0.9.0</version>
                <dependencies>
                    <dependency>
                        <groupId>org.example</groupId>
                        <artifactId>plugin-helper</artifactId>
                        <version>0.2.0</version>
                    </dependency>
                </dependencies>
            </plugin>
        </plugins>
    </build>
</project>"#;
        let module = parse(xml);
        assert_eq!(module.edges.len(), 3);

        let mgmt = module
            .edges
            .iter()
            .find(|e| e.kind == EdgeKind::DependencyManagement)
            .unwrap();
        assert_eq!(mgmt.version_line, 12);

        let plugin = module
            .edges
            .iter()
            .find(|e| e.kind == EdgeKind::Plugin)
            .unwrap();
        assert_eq!(plugin.version_line, 22);
        assert_eq!(plugin.raw_version.as_deref(), Some("0.9.0"));

        let helper = module
            .edges
            .iter()
            .find(|e| {
                e.kind == EdgeKind::Dependency
                    && matches!(&e.target, DependencyTarget::External(r) if r.id.artifact_id == "plugin-helper")
            })
            .unwrap();
        assert_eq!(helper.version_line, 27);
    }

    #[test]
    fn plugin_without_group_gets_maven_default() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0.0</version>
    <build>
        <plugins>
            <plugin>
                <artifactId>maven-compiler-plugin</artifactId>
                <version>3.13.0</version>
            </plugin>
        </plugins>
    </build>
</project>"#;
        let module = parse(xml);
        assert_eq!(module.edges.len(), 1);
        match &module.edges[0].target {
            DependencyTarget::External(r) => {
                assert_eq!(r.id.group_id, DEFAULT_PLUGIN_GROUP);
            }
            other => panic!("expected external plugin, got {other:?}"),
        }
    }

    #[test]
    fn profile_dependencies_are_collected() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0.0</version>
    <profiles>
        <profile>
            <id>ci</id>
            <dependencies>
                <dependency>
                    <groupId>org.example</groupId>
                    <artifactId>ci-support</artifactId>
                    <version>0.5.0</version>
                </dependency>
            </dependencies>
        </profile>
    </profiles>
</project>"#;
        let module = parse(xml);
        assert_eq!(module.edges.len(), 1);
        assert_eq!(module.edges[0].version_line, 13);
    }

    #[test]
    fn exclusions_do_not_clobber_dependency_identity() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0.0</version>
    <dependencies>
        <dependency>
            <groupId>com.example</groupId>
            <artifactId>lib</artifactId>
            <version>1.2.3</version>
            <exclusions>
                <exclusion>
                    <groupId>commons-logging</groupId>
                    <artifactId>commons-logging</artifactId>
                </exclusion>
            </exclusions>
        </dependency>
    </dependencies>
</project>"#;
        let module = parse(xml);
        assert_eq!(module.edges.len(), 1);
        match &module.edges[0].target {
            DependencyTarget::External(r) => {
                assert_eq!(r.id, ArtifactId::new("com.example", "lib"));
            }
            other => panic!("expected external dependency, got {other:?}"),
        }
        assert_eq!(module.edges[0].version_line, 10);
    }

    #[test]
    fn missing_identity_is_fatal() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <artifactId>orphan</artifactId>
</project>"#;
        let err = parse_module(xml, &PathBuf::from("pom.xml")).unwrap_err();
        assert!(err.to_string().contains("groupId is not set"));
    }

    #[test]
    fn missing_version_without_parent_is_fatal() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>orphan</artifactId>
</project>"#;
        let err = parse_module(xml, &PathBuf::from("pom.xml")).unwrap_err();
        assert!(err.to_string().contains("version is not set"));
    }

    #[test]
    fn placeholder_version_is_preserved_verbatim() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>lib</artifactId>
    <version>2.0.0-${buildVersion}</version>
</project>"#;
        let module = parse(xml);
        assert_eq!(module.version, "2.0.0-${buildVersion}");
    }
}
