//! Recursive module discovery over `<modules>` declarations.

use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use relver_core::module::Module;
use relver_util::errors::{RelverError, RelverResult};

use crate::pom;

/// Find every descriptor of the module tree rooted at `root_dir`,
/// depth-first, root first.
pub fn find_descriptors(root_dir: &Path) -> RelverResult<Vec<PathBuf>> {
    let mut descriptors = Vec::new();
    collect(root_dir, &mut descriptors)?;
    Ok(descriptors)
}

/// Read every module of the tree rooted at `root_dir`, in discovery order.
pub fn read_all_modules(root_dir: &Path) -> RelverResult<Vec<Module>> {
    let mut modules = Vec::new();
    for descriptor in find_descriptors(root_dir)? {
        modules.push(pom::read_module(&descriptor)?);
    }
    Ok(modules)
}

fn collect(dir: &Path, descriptors: &mut Vec<PathBuf>) -> RelverResult<()> {
    let descriptor = dir.join("pom.xml");
    let xml = std::fs::read_to_string(&descriptor).map_err(|e| RelverError::Pom {
        message: format!("failed to read {}: {e}", descriptor.display()),
    })?;
    debug!(path = %descriptor.display(), "found module descriptor");

    let module_dirs = read_module_dirs(&xml, &descriptor)?;
    descriptors.push(descriptor);

    for module_dir in module_dirs {
        collect(&dir.join(module_dir), descriptors)?;
    }
    Ok(())
}

/// `<modules>` entries of a descriptor, including profile modules,
/// deduplicated in declaration order.
fn read_module_dirs(xml: &str, path: &Path) -> RelverResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut elem_path: Vec<String> = Vec::new();
    let mut text_buf = String::new();
    let mut dirs: Vec<String> = Vec::new();

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
                let ctx = elem_path.join(">");
                if (ctx == "project>modules>module"
                    || ctx == "project>profiles>profile>modules>module")
                    && !text_buf.is_empty()
                    && !dirs.contains(&text_buf)
                {
                    dirs.push(text_buf.clone());
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

    Ok(dirs)
}
