//! POM descriptor handling for relver.
//!
//! Reading (`pom`) keeps track of the 1-based source line of every version
//! string so that patching (`patcher`) can rewrite exactly those lines and
//! nothing else. Descriptors maintained by hand keep their comments,
//! whitespace, and element order: relver never serializes a parsed model
//! back to XML.

pub mod patcher;
pub mod pom;
pub mod traverse;
pub mod upstream;
pub mod version;
