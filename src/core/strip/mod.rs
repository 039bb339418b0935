//! Same-length strippers run on each file of the production variant.
//!
//! - `debug`: debug guards on assertion and logging predicates
//! - `namespace`: top-level namespace registrations

pub mod debug;
pub mod namespace;

pub use debug::{DebugStripResult, strip_debug_code};
pub use namespace::{NamespaceStripResult, strip_namespace_registrations};
