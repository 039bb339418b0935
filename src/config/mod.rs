use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result, bail};
use glob::Pattern;
use serde::{Deserialize, Serialize};

mod defaults;

pub const CONFIG_FILE_NAME: &str = ".flatstackrc.json";

/// Routes exports of a repository (optionally only paths containing a substring)
/// into a namespace bucket other than the repository's own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceRoute {
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_contains: Option<String>,
    pub namespace: String,
}

/// Files whose declarations are never exported from a barrel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSkip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    pub path_contains: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRename {
    pub repo: String,
    pub from: String,
    pub to: String,
}

/// Known duplicate exports and which record survives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DuplicateResolution {
    /// Keep the record whose path contains `path_contains`, drop the other one.
    #[serde(rename_all = "camelCase")]
    PreferPath {
        namespace: String,
        name: String,
        path_contains: String,
    },
    /// A module exports `name` both by name and as default; keep the default.
    #[serde(rename_all = "camelCase")]
    PreferDefault { namespace: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    /// Path relative to the destination root.
    pub file: String,
    pub before: String,
    pub after: String,
}

/// A file of the local sources and the barrel its exports go to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalRoute {
    pub path_contains: String,
    pub namespace: String,
}

/// Sources that already live in the destination tree (`<destRoot>/<repo>`).
/// They are patched and exported like repository files but never written, and
/// every file with exports needs an explicit route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSources {
    pub repo: String,
    pub routes: Vec<LocalRoute>,
}

/// When an external stage runs relative to the two output variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StagePhase {
    /// After the production variant is written.
    Production,
    /// After the development variant is written.
    Development,
    /// After both variants, at the end of the build.
    Final,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageConfig {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    pub phase: StagePhase,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "defaults::repos")]
    pub repos: Vec<String>,
    /// Directory containing one checkout per repository.
    #[serde(default = "defaults::source_root")]
    pub source_root: String,
    /// Directory the flattened tree is written into.
    #[serde(default = "defaults::dest_root")]
    pub dest_root: String,
    /// Path substrings (or globs, when they contain `*` or `?`) that are never copied.
    #[serde(default = "defaults::exclusions")]
    pub exclusions: Vec<String>,
    #[serde(default = "defaults::skipped_directories")]
    pub skipped_directories: Vec<String>,
    #[serde(default = "defaults::source_suffixes")]
    pub source_suffixes: Vec<String>,
    #[serde(default = "defaults::debug_predicates")]
    pub debug_predicates: Vec<String>,
    #[serde(default = "defaults::debug_channels")]
    pub debug_channels: Vec<String>,
    /// `namespace.name` registrations that survive namespace stripping.
    #[serde(default = "defaults::allowed_namespaces")]
    pub allowed_namespaces: Vec<String>,
    /// Namespace objects that barrels export despite matching the barrel's own name.
    #[serde(default = "defaults::exported_namespaces")]
    pub exported_namespaces: Vec<String>,
    #[serde(default = "defaults::namespace_identifier_overrides")]
    pub namespace_identifier_overrides: BTreeMap<String, String>,
    #[serde(default = "defaults::string_repos")]
    pub string_repos: Vec<String>,
    #[serde(default = "defaults::base_locale")]
    pub base_locale: String,
    #[serde(default = "defaults::locale_data_path")]
    pub locale_data_path: String,
    #[serde(default = "defaults::translations_root")]
    pub translations_root: String,
    #[serde(default = "defaults::namespaces")]
    pub namespaces: Vec<String>,
    #[serde(default = "defaults::runtime_namespace")]
    pub runtime_namespace: String,
    #[serde(default = "defaults::namespace_routes")]
    pub namespace_routes: Vec<NamespaceRoute>,
    #[serde(default = "defaults::export_skips")]
    pub export_skips: Vec<ExportSkip>,
    #[serde(default = "defaults::export_renames")]
    pub export_renames: Vec<ExportRename>,
    #[serde(default = "defaults::duplicate_resolutions")]
    pub duplicate_resolutions: Vec<DuplicateResolution>,
    #[serde(default = "defaults::unwritten_barrels")]
    pub unwritten_barrels: Vec<String>,
    #[serde(default = "defaults::injection_exempt_repos")]
    pub injection_exempt_repos: Vec<String>,
    #[serde(default = "defaults::post_patches")]
    pub post_patches: Vec<PostPatch>,
    #[serde(default = "defaults::stages")]
    pub stages: Vec<StageConfig>,
    #[serde(default = "defaults::local_sources")]
    pub local_sources: Option<LocalSources>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repos: defaults::repos(),
            source_root: defaults::source_root(),
            dest_root: defaults::dest_root(),
            exclusions: defaults::exclusions(),
            skipped_directories: defaults::skipped_directories(),
            source_suffixes: defaults::source_suffixes(),
            debug_predicates: defaults::debug_predicates(),
            debug_channels: defaults::debug_channels(),
            allowed_namespaces: defaults::allowed_namespaces(),
            exported_namespaces: defaults::exported_namespaces(),
            namespace_identifier_overrides: defaults::namespace_identifier_overrides(),
            string_repos: defaults::string_repos(),
            base_locale: defaults::base_locale(),
            locale_data_path: defaults::locale_data_path(),
            translations_root: defaults::translations_root(),
            namespaces: defaults::namespaces(),
            runtime_namespace: defaults::runtime_namespace(),
            namespace_routes: defaults::namespace_routes(),
            export_skips: defaults::export_skips(),
            export_renames: defaults::export_renames(),
            duplicate_resolutions: defaults::duplicate_resolutions(),
            unwritten_barrels: defaults::unwritten_barrels(),
            injection_exempt_repos: defaults::injection_exempt_repos(),
            post_patches: defaults::post_patches(),
            stages: defaults::stages(),
            local_sources: defaults::local_sources(),
        }
    }
}

fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if an exclusion glob is invalid or a route/resolution names
    /// a namespace that has no bucket.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.exclusions {
            if is_glob_pattern(pattern) {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in 'exclusions': \"{}\"", pattern)
                })?;
            }
        }

        if !self.namespaces.contains(&self.runtime_namespace) {
            bail!(
                "'runtimeNamespace' \"{}\" is not listed in 'namespaces'",
                self.runtime_namespace
            );
        }

        for route in &self.namespace_routes {
            if !self.namespaces.contains(&route.namespace) {
                bail!(
                    "Unknown namespace in 'namespaceRoutes': \"{}\"",
                    route.namespace
                );
            }
        }

        for route in self.local_sources.iter().flat_map(|local| &local.routes) {
            if !self.namespaces.contains(&route.namespace) {
                bail!(
                    "Unknown namespace in 'localSources': \"{}\"",
                    route.namespace
                );
            }
        }

        for resolution in &self.duplicate_resolutions {
            let namespace = match resolution {
                DuplicateResolution::PreferPath { namespace, .. }
                | DuplicateResolution::PreferDefault { namespace, .. } => namespace,
            };
            if !self.namespaces.contains(namespace) {
                bail!(
                    "Unknown namespace in 'duplicateResolutions': \"{}\"",
                    namespace
                );
            }
        }

        Ok(())
    }

    /// Exclusion matcher compiled from `exclusions` and `skipped_directories`.
    pub fn exclusion_matcher(&self) -> Result<ExclusionMatcher> {
        let mut substrings = Vec::new();
        let mut globs = Vec::new();
        for pattern in &self.exclusions {
            if is_glob_pattern(pattern) {
                globs.push(Pattern::new(pattern)?);
            } else {
                substrings.push(pattern.clone());
            }
        }
        Ok(ExclusionMatcher {
            substrings,
            globs,
            skipped_directories: self.skipped_directories.clone(),
        })
    }

    /// Identifier of the namespace object a repository registers into.
    pub fn namespace_identifier(&self, repo: &str) -> String {
        self.namespace_identifier_overrides
            .get(repo)
            .cloned()
            .unwrap_or_else(|| crate::utils::camel_case(repo))
    }

    /// Every identifier recognized as a debug predicate.
    pub fn debug_identifiers(&self) -> Vec<String> {
        self.debug_predicates
            .iter()
            .chain(&self.debug_channels)
            .cloned()
            .collect()
    }

    pub fn dest_dir(&self, base: &Path) -> PathBuf {
        resolve(base, &self.dest_root)
    }
}

/// Resolves a configured path against the project directory.
pub fn resolve(base: &Path, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Decides whether a repository-relative path (`repo/js/Foo.ts`) is skipped.
#[derive(Debug, Clone)]
pub struct ExclusionMatcher {
    substrings: Vec<String>,
    globs: Vec<Pattern>,
    skipped_directories: Vec<String>,
}

impl ExclusionMatcher {
    pub fn is_excluded(&self, repo_path: &str) -> bool {
        self.substrings.iter().any(|s| repo_path.contains(s.as_str()))
            || self.globs.iter().any(|p| p.matches(repo_path))
    }

    /// Directories are descended into unless their name has a dot or is a build
    /// output directory.
    pub fn should_descend(&self, dir_name: &str) -> bool {
        !dir_name.contains('.') && !self.skipped_directories.iter().any(|d| d == dir_name)
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}
