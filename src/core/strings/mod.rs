//! Localized string references and the modules generated for them.
//!
//! - `rewrite`: replaces `JoistStrings.a.b` chains with per-key identifiers
//! - `generate`: per-key modules, regenerated aggregates and the bridge modules

pub mod generate;
pub mod rewrite;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::Result;

use crate::errors::BuildError;
use crate::utils::{pascal_case, sanitize_identifier};

pub use generate::{
    StringSources, generate_string_modules, regenerate_aggregate_modules, write_bridge_modules,
};
pub use rewrite::rewrite_string_references;

/// Identifier bound to a string key, e.g. `string_joist_a11y_home_StringProperty`.
///
/// ```
/// use flatstack::core::strings::string_identifier;
///
/// assert_eq!(string_identifier("joist", "title"), "string_joist_title_StringProperty");
/// assert_eq!(
///     string_identifier("scenery-phet", "a11y.home"),
///     "string_scenery_phet_a11y_home_StringProperty"
/// );
/// ```
pub fn string_identifier(repo: &str, key: &str) -> String {
    sanitize_identifier(&format!("string_{repo}_{key}_StringProperty"))
}

/// Generated module of a string key, relative to the destination root.
pub fn string_module_path(repo: &str, key: &str) -> String {
    format!("{repo}/js/strings/{}.ts", key.replace('.', "/"))
}

/// Name of a repository's string aggregate (`JoistStrings`).
pub fn aggregate_name(repo: &str) -> String {
    format!("{}Strings", pascal_case(repo))
}

/// One referenced string key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringUsage {
    pub repo: String,
    pub key: String,
    pub identifier: String,
    pub module_path: String,
    /// Locales with a translated value, filled in when the module is generated.
    pub locales: BTreeSet<String>,
}

/// Every string key referenced during a run, unique per `(repo, key)`.
///
/// Identifiers are unique too: two keys that sanitize to the same identifier
/// (`a.b` and `a_b`) cannot both be recorded.
#[derive(Debug, Clone, Default)]
pub struct StringUsages {
    usages: BTreeMap<(String, String), StringUsage>,
    identifiers: HashMap<String, (String, String)>,
}

impl StringUsages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a key if it is not known yet and returns its usage record.
    ///
    /// Fails when the key's identifier already belongs to a different key.
    pub fn record(&mut self, repo: &str, key: &str) -> Result<&StringUsage> {
        let id = (repo.to_string(), key.to_string());
        if !self.usages.contains_key(&id) {
            let identifier = string_identifier(repo, key);
            if let Some((other_repo, other_key)) = self.identifiers.get(&identifier) {
                return Err(BuildError::StringIdentifierCollision {
                    identifier,
                    first: format!("{other_repo}/{other_key}"),
                    second: format!("{repo}/{key}"),
                }
                .into());
            }
            self.identifiers.insert(identifier.clone(), id.clone());
            self.usages.insert(
                id.clone(),
                StringUsage {
                    repo: repo.to_string(),
                    key: key.to_string(),
                    identifier,
                    module_path: string_module_path(repo, key),
                    locales: BTreeSet::new(),
                },
            );
        }
        Ok(&self.usages[&id])
    }

    pub fn get(&self, repo: &str, key: &str) -> Option<&StringUsage> {
        self.usages.get(&(repo.to_string(), key.to_string()))
    }

    /// Repositories with at least one referenced key, sorted.
    pub fn repos(&self) -> Vec<String> {
        let repos: BTreeSet<&String> = self.usages.keys().map(|(repo, _)| repo).collect();
        repos.into_iter().cloned().collect()
    }

    /// Usages of one repository, sorted by key.
    pub fn for_repo(&self, repo: &str) -> Vec<&StringUsage> {
        self.usages
            .values()
            .filter(|usage| usage.repo == repo)
            .collect()
    }

    pub fn for_repo_mut(&mut self, repo: &str) -> impl Iterator<Item = &mut StringUsage> {
        self.usages
            .values_mut()
            .filter(move |usage| usage.repo == repo)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StringUsage> {
        self.usages.values()
    }

    pub fn len(&self) -> usize {
        self.usages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_is_deterministic() {
        assert_eq!(
            string_identifier("joist", "a11y.home"),
            string_identifier("joist", "a11y.home")
        );
    }

    #[test]
    fn test_module_path_nests_by_key() {
        assert_eq!(
            string_module_path("joist", "a11y.home"),
            "joist/js/strings/a11y/home.ts"
        );
    }

    #[test]
    fn test_aggregate_name() {
        assert_eq!(aggregate_name("scenery-phet"), "SceneryPhetStrings");
        assert_eq!(aggregate_name("joist"), "JoistStrings");
    }

    #[test]
    fn test_record_is_idempotent_and_sorted() {
        let mut usages = StringUsages::new();
        usages.record("sun", "b").unwrap();
        usages.record("joist", "title").unwrap();
        usages.record("sun", "a").unwrap();
        usages.record("sun", "b").unwrap();

        assert_eq!(usages.len(), 3);
        assert_eq!(usages.repos(), vec!["joist", "sun"]);
        let keys: Vec<&str> = usages.for_repo("sun").iter().map(|u| u.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(
            usages.get("joist", "title").map(|u| u.identifier.as_str()),
            Some("string_joist_title_StringProperty")
        );
    }

    #[test]
    fn test_colliding_identifiers_are_fatal() {
        let mut usages = StringUsages::new();
        usages.record("joist", "a.b").unwrap();
        let err = usages.record("joist", "a_b").unwrap_err();
        match err.downcast_ref::<BuildError>() {
            Some(BuildError::StringIdentifierCollision {
                identifier,
                first,
                second,
            }) => {
                assert_eq!(identifier, "string_joist_a_b_StringProperty");
                assert_eq!(first, "joist/a.b");
                assert_eq!(second, "joist/a_b");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(usages.len(), 1);
        // Recording the first key again is still fine.
        assert!(usages.record("joist", "a.b").is_ok());
    }
}
