//! flatstack - flattens a multi-repository TypeScript ecosystem into one package
//!
//! Every source file of every repository is copied into one destination tree
//! while its text is rewritten: synthetic imports are injected, debug guards and
//! namespace registrations are stripped with same-length edits (source maps stay
//! valid), and localized string accesses are replaced by per-key modules. Barrel
//! modules, string modules and a revision manifest are generated afterwards.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer
//! - `config`: Configuration file loading and defaults
//! - `core`: Rewrite engine and build pipeline
//! - `errors`: Fatal build conditions
//! - `utils`: Naming and path helpers

pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod utils;
