//! Handler for `relver commit`.

use miette::Result;

use relver_ops::commit::commit_registered;
use relver_scm::git::GitScm;

pub fn run() -> Result<()> {
    let root = super::project_root()?;
    let scm = GitScm::discover(&root);

    let committed = commit_registered(&root, &scm)?;
    if committed == 0 {
        println!("Nothing to commit.");
    } else {
        println!("Committed {committed} descriptors.");
    }
    Ok(())
}
