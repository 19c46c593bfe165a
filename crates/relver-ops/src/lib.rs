//! relver operations.
//!
//! `update` runs the whole pipeline: discover and read the module tree,
//! link the graph, seed the dirty set from version qualifiers and SCM
//! history, fold in upstream version bumps, propagate to a fixed point,
//! assign new versions, patch the descriptors in dependency order, write
//! the run outputs, and commit. `commit` finishes a run that was executed
//! with a deferred commit.

pub mod commit;
pub mod config;
pub mod outputs;
pub mod qualifier;
pub mod update;
