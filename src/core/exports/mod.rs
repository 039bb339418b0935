//! Export extraction and the per-namespace barrel modules built from it.
//!
//! - `extract`: what one module exports
//! - `resolve`: routing into namespace buckets, conflict checks, runtime taint, barrels

pub mod extract;
pub mod resolve;

use serde::Serialize;

pub use extract::{exports_of_module, extract_exports};
pub use resolve::{ExportBuckets, ExportRouter};

/// Name under which a module's default export is listed.
pub const DEFAULT_EXPORT: &str = "default";

/// `type Align = typeof AlignValues[number]` paired with its value list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StringEnum {
    pub type_name: String,
    pub values_name: String,
}

/// Exports of one module, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportList {
    pub values: Vec<String>,
    pub types: Vec<String>,
    pub string_enums: Vec<StringEnum>,
    /// Sources of `export * from '...'`. Reported only; the barrels reference
    /// the original declarations.
    pub star_reexports: Vec<String>,
}

impl ExportList {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.types.is_empty()
    }
}

/// One name a barrel re-exports from a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    /// Name the module exports it under (`default` for default exports).
    pub source_name: String,
    /// Name in the barrel.
    pub exported_name: String,
    pub is_type_only: bool,
    pub is_default: bool,
    /// Set when the module (or anything it imports) needs a running simulation.
    pub requires_runtime_environment: bool,
    /// Module path relative to the destination root.
    pub destination_path: String,
}

impl ExportRecord {
    /// `Foo` or `default as Foo`, as written in a barrel's export clause.
    pub fn export_clause(&self) -> String {
        if self.source_name == self.exported_name {
            self.exported_name.clone()
        } else {
            format!("{} as {}", self.source_name, self.exported_name)
        }
    }
}
