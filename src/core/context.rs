//! State threaded through one copy-and-patch run.
//!
//! Everything the walk accumulates lives here instead of in globals: removed
//! namespace patterns, referenced string keys, export buckets and the final text
//! of each written file. The walk only appends; the passes after the walk read it.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::{Path, PathBuf},
};

use anyhow::Result;
use serde::Serialize;

use crate::{
    config::{Config, ExclusionMatcher, resolve},
    core::{exports::ExportBuckets, matchers::DebugPredicates, strings::StringUsages},
};

/// Which output variant a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    pub remove_assertions: bool,
    pub remove_namespacing: bool,
}

impl BuildOptions {
    pub fn production() -> Self {
        Self {
            remove_assertions: true,
            remove_namespacing: true,
        }
    }

    pub fn development() -> Self {
        Self {
            remove_assertions: false,
            remove_namespacing: false,
        }
    }

    pub fn label(&self) -> String {
        let mut label = String::new();
        if self.remove_assertions {
            label.push_str(" no-assert");
        }
        if self.remove_namespacing {
            label.push_str(" no-namespace");
        }
        label
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::production()
    }
}

/// Resolved locations of one run.
#[derive(Debug, Clone)]
pub struct BuildPaths {
    /// Project directory (where the config file lives).
    pub base: PathBuf,
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub translations_root: PathBuf,
    pub locale_data: PathBuf,
}

impl BuildPaths {
    pub fn new(config: &Config, base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
            source_root: resolve(base, &config.source_root),
            dest_root: config.dest_dir(base),
            translations_root: resolve(base, &config.translations_root),
            locale_data: resolve(base, &config.locale_data_path),
        }
    }
}

/// Accumulated state of one copy-and-patch run.
pub struct BuildContext<'a> {
    pub config: &'a Config,
    pub options: BuildOptions,
    pub paths: BuildPaths,
    pub exclusions: ExclusionMatcher,
    pub predicates: DebugPredicates,
    /// `namespace.name` of every stripped registration.
    pub removed_patterns: BTreeSet<String>,
    pub string_usages: StringUsages,
    /// `*Strings.ts` aggregates seen during the walk, relative to the destination root.
    pub aggregate_modules: Vec<String>,
    pub buckets: ExportBuckets,
    /// Final text of every processed file (local sources included), by
    /// destination path.
    pub written: HashMap<String, String>,
    pub stats: WalkStats,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a Config, base: &Path, options: BuildOptions) -> Result<Self> {
        Ok(Self {
            config,
            options,
            paths: BuildPaths::new(config, base),
            exclusions: config.exclusion_matcher()?,
            predicates: DebugPredicates::new(config.debug_identifiers()),
            removed_patterns: BTreeSet::new(),
            string_usages: StringUsages::new(),
            aggregate_modules: Vec::new(),
            buckets: ExportBuckets::new(&config.namespaces, &config.runtime_namespace),
            written: HashMap::new(),
            stats: WalkStats::default(),
        })
    }
}

/// Counters reported after a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkStats {
    pub files_written: usize,
    /// Local sources read in place.
    pub local_files: usize,
    pub files_excluded: usize,
    pub debug_guards_removed: usize,
    pub registrations_removed: usize,
    pub heuristics_fired: BTreeMap<String, usize>,
}

/// What a copy-and-patch run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSummary {
    pub options: BuildOptions,
    pub stats: WalkStats,
    pub removed_patterns: usize,
    pub string_keys: usize,
    pub aggregate_modules: usize,
    pub export_records: usize,
    pub runtime_modules: usize,
    pub barrels: Vec<String>,
    pub missing_post_patches: Vec<String>,
}
