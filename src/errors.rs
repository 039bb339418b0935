//! Fatal build conditions.
//!
//! Every variant aborts the whole run. Pipeline functions return `anyhow::Result`
//! and wrap these with context, so callers that need to branch on the condition can
//! `downcast_ref::<BuildError>()`.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::exports::ExportRecord;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error(
        "cannot maintain source map compatibility: replacement of {replacement_len} bytes does not fit span {start}..{end}"
    )]
    ReplacementTooLong {
        start: usize,
        end: usize,
        replacement_len: usize,
    },

    #[error("overlapping edits at {first_start}..{first_end} and {second_start}..{second_end}")]
    OverlappingEdits {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    #[error("debug guard on '{predicate}' survived stripping in {file}")]
    DebugGuardSurvived { file: String, predicate: String },

    #[error("failed to remove all string usages of {prefix} in {file}: found {count} references, expected 2")]
    ResidualStringReference {
        file: String,
        prefix: String,
        count: usize,
    },

    #[error("string identifier {identifier} is generated by both {first} and {second}")]
    StringIdentifierCollision {
        identifier: String,
        first: String,
        second: String,
    },

    #[error("namespace pattern used: {pattern} in {file}")]
    NamespacePatternUsed { pattern: String, file: String },

    #[error("missing {locale} string for {repo}/{key}")]
    MissingBaseString {
        repo: String,
        key: String,
        locale: String,
    },

    #[error("duplicate export for {name}:\n{}", format_records(.records))]
    DuplicateExport {
        name: String,
        records: Vec<ExportRecord>,
    },

    #[error("{path} in {repo} routes to unknown export namespace '{namespace}'")]
    UnknownNamespace {
        repo: String,
        path: String,
        namespace: String,
    },

    #[error("{path} in {repo} does not have an explicit export mapping")]
    UnmappedLocalSource { repo: String, path: String },

    #[error("repo not found: {repo} (expected at {})", .path.display())]
    RepoNotFound { repo: String, path: PathBuf },

    #[error("stage '{stage}' failed with {}", exit_description(.code))]
    StageFailed { stage: String, code: Option<i32> },
}

fn format_records(records: &[ExportRecord]) -> String {
    serde_json::to_string_pretty(records).unwrap_or_else(|_| format!("{records:?}"))
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}
