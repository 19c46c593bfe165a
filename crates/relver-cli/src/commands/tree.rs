//! Handler for `relver tree`.

use miette::Result;

use relver_core::graph::ModuleGraph;
use relver_core::tree::render_module_tree;
use relver_pom::traverse;

pub fn run() -> Result<()> {
    let root = super::project_root()?;

    let modules = traverse::read_all_modules(&root)?;
    let mut graph = ModuleGraph::new(modules);
    graph.link();

    for root_id in graph.roots() {
        print!("{}", render_module_tree(&graph, root_id));
    }

    Ok(())
}
