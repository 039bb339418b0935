//! Rewrite engine and the passes around it.
//!
//! - `parsers`: swc parsing of source files and loading of string data
//! - `matchers`: syntax-tree predicates (debug guards, registrations, recognizers)
//! - `edits`: same-length edit lists
//! - `strip`: debug-code and namespace-registration stripping
//! - `inject`: import injection heuristics
//! - `strings`: string reference rewriting and string module generation
//! - `exports`: export extraction, namespace buckets and barrels
//! - `scanner`, `walker`, `context`: the copy-and-patch run
//! - `verify`: removed-namespace verification
//! - `manifest`, `stages`: repository revisions and external build stages

pub mod context;
pub mod edits;
pub mod exports;
pub mod inject;
pub mod manifest;
pub mod matchers;
pub mod parsers;
pub mod scanner;
pub mod stages;
pub mod strings;
pub mod strip;
pub mod verify;
pub mod walker;

pub use context::{BuildContext, BuildOptions, PatchSummary};
pub use walker::{BuildSummary, copy_and_patch, run_build};
