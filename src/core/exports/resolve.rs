//! Routes export records into namespace buckets and writes one barrel per bucket.
//!
//! Buckets move through three states: records are added while files are walked
//! (`Unresolved`); `resolve` drops known duplicates, rejects conflicts and moves
//! every record that reaches the runtime namespace through imports
//! (`Resolving`); barrels can only be rendered once `Resolved`.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use regex::Regex;

use super::{DEFAULT_EXPORT, ExportList, ExportRecord};
use crate::config::{Config, DuplicateResolution};
use crate::errors::BuildError;
use crate::utils::{camel_case, relative_import_path};

/// Decides which bucket and name each export of a file gets.
pub struct ExportRouter<'a> {
    config: &'a Config,
}

impl<'a> ExportRouter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn is_skipped(&self, repo: &str, dest_path: &str) -> bool {
        self.config.export_skips.iter().any(|skip| {
            skip.repo.as_deref().is_none_or(|r| r == repo) && dest_path.contains(&skip.path_contains)
        })
    }

    /// First matching route, or the repository's own namespace. Local sources
    /// have no fallback: a file without a route is fatal.
    pub fn namespace_for(&self, repo: &str, dest_path: &str) -> Result<String> {
        if let Some(local) = self.config.local_sources.as_ref().filter(|l| l.repo == repo) {
            return local
                .routes
                .iter()
                .find(|route| dest_path.contains(&route.path_contains))
                .map(|route| route.namespace.clone())
                .ok_or_else(|| {
                    BuildError::UnmappedLocalSource {
                        repo: repo.to_string(),
                        path: dest_path.to_string(),
                    }
                    .into()
                });
        }
        Ok(self
            .config
            .namespace_routes
            .iter()
            .find(|route| {
                route.repo == repo
                    && route
                        .path_contains
                        .as_deref()
                        .is_none_or(|p| dest_path.contains(p))
            })
            .map(|route| route.namespace.clone())
            .unwrap_or_else(|| repo.to_string()))
    }

    fn exported_name(&self, repo: &str, dest_path: &str, name: &str) -> String {
        let name = if name == DEFAULT_EXPORT {
            module_base_name(dest_path)
        } else {
            name.to_string()
        };
        self.config
            .export_renames
            .iter()
            .find(|rename| rename.repo == repo && rename.from == name)
            .map(|rename| rename.to.clone())
            .unwrap_or(name)
    }

    /// Records for every export of a file together with the bucket each goes to.
    pub fn records(
        &self,
        repo: &str,
        dest_path: &str,
        exports: &ExportList,
    ) -> Result<Vec<(String, ExportRecord)>> {
        if exports.is_empty() || self.is_skipped(repo, dest_path) {
            return Ok(Vec::new());
        }
        let namespace = self.namespace_for(repo, dest_path)?;
        let requires_runtime_environment = namespace == self.config.runtime_namespace;

        let values = exports.values.iter().map(|name| (name, false));
        let types = exports.types.iter().map(|name| (name, true));
        let records: Vec<(String, ExportRecord)> = values
            .chain(types)
            .map(|(name, is_type_only)| {
                let record = ExportRecord {
                    source_name: name.clone(),
                    exported_name: self.exported_name(repo, dest_path, name),
                    is_type_only,
                    is_default: name == DEFAULT_EXPORT,
                    requires_runtime_environment,
                    destination_path: dest_path.to_string(),
                };
                (namespace.clone(), record)
            })
            .collect();
        Ok(records)
    }
}

/// `joist/js/Sim.ts` -> `Sim`.
fn module_base_name(dest_path: &str) -> String {
    let file_name = dest_path.rsplit('/').next().unwrap_or(dest_path);
    file_name
        .strip_suffix(".ts")
        .or_else(|| file_name.strip_suffix(".js"))
        .unwrap_or(file_name)
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolutionState {
    Unresolved,
    Resolving,
    Resolved,
}

/// Export records grouped by output namespace. A record is in exactly one bucket.
#[derive(Debug, Clone)]
pub struct ExportBuckets {
    buckets: BTreeMap<String, Vec<ExportRecord>>,
    runtime_namespace: String,
    state: ResolutionState,
}

impl ExportBuckets {
    pub fn new(namespaces: &[String], runtime_namespace: &str) -> Self {
        Self {
            buckets: namespaces
                .iter()
                .map(|namespace| (namespace.clone(), Vec::new()))
                .collect(),
            runtime_namespace: runtime_namespace.to_string(),
            state: ResolutionState::Unresolved,
        }
    }

    pub fn add(&mut self, repo: &str, namespace: &str, record: ExportRecord) -> Result<()> {
        if self.state != ResolutionState::Unresolved {
            bail!("cannot add exports after resolution started");
        }
        let Some(bucket) = self.buckets.get_mut(namespace) else {
            return Err(BuildError::UnknownNamespace {
                repo: repo.to_string(),
                path: record.destination_path,
                namespace: namespace.to_string(),
            }
            .into());
        };
        bucket.push(record);
        Ok(())
    }

    pub fn bucket(&self, namespace: &str) -> &[ExportRecord] {
        self.buckets.get(namespace).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn all_records(&self) -> impl Iterator<Item = &ExportRecord> {
        self.buckets.values().flatten()
    }

    /// Drops the redundant record of each known duplicate.
    pub fn apply_duplicate_resolutions(&mut self, resolutions: &[DuplicateResolution]) {
        for resolution in resolutions {
            match resolution {
                DuplicateResolution::PreferPath {
                    namespace,
                    name,
                    path_contains,
                } => {
                    let Some(bucket) = self.buckets.get_mut(namespace) else {
                        continue;
                    };
                    let preferred = bucket.iter().any(|r| {
                        &r.exported_name == name && r.destination_path.contains(path_contains)
                    });
                    let redundant = bucket.iter().position(|r| {
                        &r.exported_name == name && !r.destination_path.contains(path_contains)
                    });
                    if let (true, Some(index)) = (preferred, redundant) {
                        let removed = bucket.remove(index);
                        log::debug!("dropped duplicate {} from {}", name, removed.destination_path);
                    }
                }
                DuplicateResolution::PreferDefault { namespace, name } => {
                    let Some(bucket) = self.buckets.get_mut(namespace) else {
                        continue;
                    };
                    let named = bucket
                        .iter()
                        .position(|r| &r.exported_name == name && &r.source_name == name);
                    let has_default = bucket
                        .iter()
                        .any(|r| &r.exported_name == name && r.source_name == DEFAULT_EXPORT);
                    if let (Some(index), true) = (named, has_default) {
                        let removed = bucket.remove(index);
                        log::debug!(
                            "dropped named export {} of {} in favor of its default",
                            name,
                            removed.destination_path
                        );
                    }
                }
            }
        }
    }

    /// Fails on any exported name used by two records. Values and types are
    /// separate name spaces.
    pub fn check_duplicates(&self) -> Result<()> {
        for is_type_only in [false, true] {
            let mut seen: HashMap<&str, usize> = HashMap::new();
            for record in self.all_records().filter(|r| r.is_type_only == is_type_only) {
                let count = seen.entry(record.exported_name.as_str()).or_default();
                *count += 1;
                if *count > 1 {
                    let records = self
                        .all_records()
                        .filter(|r| {
                            r.is_type_only == is_type_only
                                && r.exported_name == record.exported_name
                        })
                        .cloned()
                        .collect();
                    return Err(BuildError::DuplicateExport {
                        name: record.exported_name.clone(),
                        records,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Closes the set of runtime-dependent modules over imports and moves their
    /// records into the runtime bucket.
    ///
    /// `texts` maps destination paths to final module text. A module is tainted
    /// when it imports (by relative specifier) a tainted module. Each round adds at
    /// least one module or ends the loop, so this terminates on any import graph,
    /// cyclic ones included. Returns the tainted paths.
    pub fn propagate_runtime_taint(&mut self, texts: &HashMap<String, String>) -> BTreeSet<String> {
        let exported_paths: BTreeSet<String> = self
            .all_records()
            .map(|r| r.destination_path.clone())
            .collect();
        let mut tainted: BTreeSet<String> = self
            .all_records()
            .filter(|r| r.requires_runtime_environment)
            .map(|r| r.destination_path.clone())
            .collect();

        let mut rounds = 0;
        loop {
            rounds += 1;
            let additions: Vec<String> = exported_paths
                .iter()
                .filter(|path| !tainted.contains(*path))
                .filter(|path| {
                    texts.get(*path).is_some_and(|text| {
                        tainted.iter().any(|target| {
                            text.contains(&format!("'{}'", relative_import_path(path, target)))
                        })
                    })
                })
                .cloned()
                .collect();
            if additions.is_empty() {
                break;
            }
            tainted.extend(additions);
        }
        log::debug!(
            "runtime taint reached {} modules in {} rounds",
            tainted.len(),
            rounds
        );

        let mut moved = Vec::new();
        for (namespace, bucket) in self.buckets.iter_mut() {
            if *namespace == self.runtime_namespace {
                continue;
            }
            let (taken, kept): (Vec<ExportRecord>, Vec<ExportRecord>) = bucket
                .drain(..)
                .partition(|r| tainted.contains(&r.destination_path));
            *bucket = kept;
            moved.extend(taken);
        }
        let runtime = self.buckets.entry(self.runtime_namespace.clone()).or_default();
        for mut record in moved {
            record.requires_runtime_environment = true;
            runtime.push(record);
        }
        for record in runtime.iter_mut() {
            record.requires_runtime_environment = true;
        }

        tainted
    }

    /// Runs the resolution steps in order.
    pub fn resolve(
        &mut self,
        resolutions: &[DuplicateResolution],
        texts: &HashMap<String, String>,
    ) -> Result<BTreeSet<String>> {
        self.state = ResolutionState::Resolving;
        self.apply_duplicate_resolutions(resolutions);
        self.check_duplicates()?;
        let tainted = self.propagate_runtime_taint(texts);
        self.state = ResolutionState::Resolved;
        Ok(tainted)
    }

    /// Barrel source for one namespace: per module (sorted by path) one value
    /// export line and one type export line. The namespace's own registry object
    /// is left out unless listed in `exported_namespaces`.
    pub fn render_barrel(&self, namespace: &str, exported_namespaces: &[String]) -> Result<String> {
        if self.state != ResolutionState::Resolved {
            bail!("barrels can only be rendered after resolution");
        }
        let self_reference = Regex::new(&format!(
            "^{}(Namespace)?$",
            regex::escape(&camel_case(namespace))
        ))?;
        let barrel_path = format!("{namespace}.ts");

        let mut by_path: BTreeMap<&str, Vec<&ExportRecord>> = BTreeMap::new();
        for record in self.bucket(namespace) {
            if exported_namespaces.contains(&record.exported_name)
                || !self_reference.is_match(&record.exported_name)
            {
                by_path
                    .entry(record.destination_path.as_str())
                    .or_default()
                    .push(record);
            }
        }

        let mut lines = Vec::new();
        for (path, records) in by_path {
            let specifier = relative_import_path(&barrel_path, path);
            for is_type_only in [false, true] {
                let clauses: Vec<String> = records
                    .iter()
                    .filter(|r| r.is_type_only == is_type_only)
                    .map(|r| r.export_clause())
                    .collect();
                if !clauses.is_empty() {
                    lines.push(format!(
                        "export {}{{ {} }} from '{}';",
                        if is_type_only { "type " } else { "" },
                        clauses.join(", "),
                        specifier
                    ));
                }
            }
        }

        Ok(format!(
            "/* eslint-disable */
/* @formatter:off */

/**
 * \"Barrel\" file for {namespace}, so that we can export all of the API of the repo.
 *
 * Auto-generated by flatstack
 */

{}
",
            lines.join("\n")
        ))
    }

    /// Writes `<dest>/<namespace>.ts` for every bucket not in `unwritten`.
    pub fn write_barrels(
        &self,
        dest_root: &Path,
        unwritten: &[String],
        exported_namespaces: &[String],
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for namespace in self.buckets.keys() {
            if unwritten.contains(namespace) {
                continue;
            }
            let path = dest_root.join(format!("{namespace}.ts"));
            let content = self.render_barrel(namespace, exported_namespaces)?;
            fs::write(&path, content)
                .with_context(|| format!("Failed to write barrel: {:?}", path))?;
            written.push(path);
        }
        Ok(written)
    }
}
