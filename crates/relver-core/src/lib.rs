//! Core data types and algorithms for relver.
//!
//! This crate defines the in-memory module graph and the algorithms that
//! drive a versioning run: linking parsed modules into a navigable graph,
//! propagating the "needs a new version" state through parent, dependency,
//! and property relations, ordering the dirty modules so that dependencies
//! come before their dependents, and rendering the module tree for
//! reporting.
//!
//! This crate performs no I/O; descriptor reading and patching live in
//! `relver-pom`.

pub mod artifact;
pub mod graph;
pub mod module;
pub mod propagate;
pub mod sort;
pub mod tree;
pub mod upstream;
