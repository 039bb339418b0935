//! Parsers for source code and string data files.
//!
//! - `source`: TS/JS source parser (uses swc for AST generation)
//! - `locale`: localized string JSON files and locale data

pub mod locale;
pub mod source;
