//! Localized string data files.
//!
//! Each repository ships a base-locale file `<repo>/<repo>-strings_<base>.json`;
//! translations live under the translations root as
//! `<repo>/<repo>-strings_<locale>.json`. Entries are objects with a `value` field,
//! addressed by dotted keys either literally (`"a.b": {...}`) or through nesting
//! (`"a": { "b": {...} }`).

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde_json::Value;

/// Parsed string file of one repository in one locale.
#[derive(Debug, Clone)]
pub struct StringFile {
    pub locale: String,
    pub path: PathBuf,
    root: Value,
}

impl StringFile {
    pub fn from_value(locale: &str, path: PathBuf, root: Value) -> Self {
        Self {
            locale: locale.to_string(),
            path,
            root,
        }
    }

    pub fn load(path: &Path, locale: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read string file: {:?}", path))?;
        let root: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse string file: {:?}", path))?;
        Ok(Self::from_value(locale, path.to_path_buf(), root))
    }

    /// Translated value of a dotted key, if present.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        let entry = self.root.get(key).or_else(|| {
            key.split('.')
                .try_fold(&self.root, |node, part| node.get(part))
        })?;
        entry.get("value")?.as_str()
    }
}

/// File name of a repository's string file for a locale.
pub fn string_file_name(repo: &str, locale: &str) -> String {
    format!("{repo}-strings_{locale}.json")
}

/// Base-locale file plus every translation that exists on disk, keyed by locale.
pub fn load_repo_string_files(
    repo_dir: &Path,
    translations_dir: &Path,
    repo: &str,
    base_locale: &str,
    locales: &[String],
) -> Result<BTreeMap<String, StringFile>> {
    let mut files = BTreeMap::new();

    let base_path = repo_dir.join(string_file_name(repo, base_locale));
    files.insert(
        base_locale.to_string(),
        StringFile::load(&base_path, base_locale)?,
    );

    for locale in locales.iter().filter(|l| *l != base_locale) {
        let path = translations_dir
            .join(repo)
            .join(string_file_name(repo, locale));
        if path.exists() {
            files.insert(locale.clone(), StringFile::load(&path, locale)?);
        }
    }

    Ok(files)
}

/// Locale codes listed in the locale data file (its top-level keys), plus the
/// locale data itself for the generated bridge module.
pub fn load_locale_data(path: &Path) -> Result<(Vec<String>, Value)> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read locale data: {:?}", path))?;
    let data: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse locale data: {:?}", path))?;
    let locales = data
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default();
    Ok((locales, data))
}

/// `phet.requirejsNamespace` from a repository's package.json, when available.
pub fn read_requirejs_namespace(repo_dir: &Path) -> Option<String> {
    let content = fs::read_to_string(repo_dir.join("package.json")).ok()?;
    let json: Value = serde_json::from_str(&content).ok()?;
    json.get("phet")?
        .get("requirejsNamespace")?
        .as_str()
        .map(String::from)
}
