//! Generated string modules.
//!
//! Three kinds of output:
//! - one module per referenced key, binding its identifier to a localized property
//! - each repository's `*Strings.ts` aggregate, rebuilt from the referenced keys
//! - the `babel/` bridge modules that define `phet.chipper.*` string globals

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{StringUsage, StringUsages, aggregate_name};
use crate::core::parsers::locale::{load_repo_string_files, read_requirejs_namespace};
use crate::errors::BuildError;
use crate::utils::{relative_import_path, upper_snake_case};

const GENERATED_HEADER: &str = "/* eslint-disable */\n/* @formatter:off */\n\n/**\n * Auto-generated by flatstack\n */\n";

const CHIPPER_PRECURSOR: &str =
    "self.phet = self.phet || {};self.phet.chipper = self.phet.chipper || {};";

/// Where string data is read from.
#[derive(Debug, Clone)]
pub struct StringSources<'a> {
    /// Directory containing the repository checkouts.
    pub source_root: &'a Path,
    /// Directory with `<repo>/<repo>-strings_<locale>.json` translations.
    pub translations_root: &'a Path,
    pub base_locale: &'a str,
    pub locales: &'a [String],
}

/// `phet.requirejsNamespace` of a repository, or its upper snake case name.
pub fn requirejs_namespace(repo_dir: &Path, repo: &str) -> String {
    read_requirejs_namespace(repo_dir).unwrap_or_else(|| upper_snake_case(repo))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write file: {:?}", path))
}

/// Source of one per-key string module.
pub fn render_string_module(
    usage: &StringUsage,
    requirejs_namespace: &str,
    values: &Map<String, Value>,
) -> Result<String> {
    let root = |module: &str| relative_import_path(&usage.module_path, module);
    let string_key = serde_json::to_string(&format!("{requirejs_namespace}/{}", usage.key))?;
    let value_map = serde_json::to_string_pretty(values)?;

    Ok(format!(
        "{GENERATED_HEADER}
import '{globals}';
import LocalizedString from '{localized_string}';
import LocalizedStringProperty from '{localized_string_property}';
import Tandem from '{tandem}';

export const {identifier} = new LocalizedStringProperty(
  new LocalizedString( {string_key}, {value_map}, Tandem.OPT_OUT ),
  Tandem.OPT_OUT
);
",
        globals = root("globals.js"),
        localized_string = root("chipper/js/browser/LocalizedString.js"),
        localized_string_property = root("chipper/js/browser/LocalizedStringProperty.js"),
        tandem = root("tandem/js/Tandem.js"),
        identifier = usage.identifier,
    ))
}

/// Writes a module for every referenced key and records which locales had a value.
///
/// A key without a base-locale value is fatal; missing translations are omitted.
/// Returns the number of modules written.
pub fn generate_string_modules(
    usages: &mut StringUsages,
    sources: &StringSources,
    dest_root: &Path,
) -> Result<usize> {
    let mut written = 0;

    for repo in usages.repos() {
        let repo_dir = sources.source_root.join(&repo);
        let files = load_repo_string_files(
            &repo_dir,
            sources.translations_root,
            &repo,
            sources.base_locale,
            sources.locales,
        )?;
        let namespace = requirejs_namespace(&repo_dir, &repo);

        // Base locale first, then translations in locale order.
        let ordered: Vec<_> = files
            .get(sources.base_locale)
            .into_iter()
            .chain(
                files
                    .iter()
                    .filter(|(locale, _)| *locale != sources.base_locale)
                    .map(|(_, file)| file),
            )
            .collect();

        for usage in usages.for_repo_mut(&repo) {
            let mut values = Map::new();
            for file in &ordered {
                match file.lookup(&usage.key) {
                    Some(value) => {
                        values.insert(file.locale.clone(), Value::String(value.to_string()));
                        usage.locales.insert(file.locale.clone());
                    }
                    None if file.locale == sources.base_locale => {
                        return Err(BuildError::MissingBaseString {
                            repo: repo.clone(),
                            key: usage.key.clone(),
                            locale: sources.base_locale.to_string(),
                        }
                        .into());
                    }
                    None => {}
                }
            }

            let content = render_string_module(usage, &namespace, &values)?;
            write_file(&dest_root.join(&usage.module_path), &content)?;
            written += 1;
        }
        log::debug!("generated string modules for {}", repo);
    }

    Ok(written)
}

/// Nested object literal of the keys a repository uses, leaves being identifiers.
#[derive(Debug, Default)]
struct KeyTree {
    entries: Vec<(String, KeyNode)>,
}

#[derive(Debug)]
enum KeyNode {
    Leaf(String),
    Branch(KeyTree),
}

impl KeyTree {
    fn insert(&mut self, parts: &[&str], identifier: &str) {
        let Some((first, rest)) = parts.split_first() else {
            return;
        };
        let position = self.entries.iter().position(|(name, _)| name == first);
        if rest.is_empty() {
            if position.is_none() {
                self.entries
                    .push((first.to_string(), KeyNode::Leaf(identifier.to_string())));
            }
            return;
        }
        let index = match position {
            Some(index) => index,
            None => {
                self.entries
                    .push((first.to_string(), KeyNode::Branch(KeyTree::default())));
                self.entries.len() - 1
            }
        };
        // A key that is both a leaf and a prefix of another key keeps the leaf.
        if let KeyNode::Branch(tree) = &mut self.entries[index].1 {
            tree.insert(rest, identifier);
        }
    }

    fn render(&self, indent: &str) -> String {
        let inner = format!("{indent}  ");
        let entries: Vec<String> = self
            .entries
            .iter()
            .map(|(name, node)| {
                let value = match node {
                    KeyNode::Leaf(identifier) => identifier.clone(),
                    KeyNode::Branch(tree) => tree.render(&inner),
                };
                format!("{inner}\"{name}\": {value}")
            })
            .collect();
        format!("{{\n{}\n{indent}}}", entries.join(",\n"))
    }
}

/// Source of a regenerated `*Strings.ts` aggregate.
pub fn render_aggregate_module(
    aggregate_path: &str,
    repo: &str,
    namespace: &str,
    usages: &[&StringUsage],
) -> String {
    let name = aggregate_name(repo);
    let namespace_import = format!(
        "import {namespace} from '{}';",
        relative_import_path(aggregate_path, &format!("{repo}/js/{namespace}.js"))
    );

    let (imports, body) = if usages.is_empty() {
        (String::new(), "{}".to_string())
    } else {
        let mut tree = KeyTree::default();
        let mut imports = Vec::new();
        for usage in usages {
            imports.push(format!(
                "import {{ {} }} from '{}';\n",
                usage.identifier,
                relative_import_path(aggregate_path, &usage.module_path)
            ));
            let parts: Vec<&str> = usage.key.split('.').collect();
            tree.insert(&parts, &usage.identifier);
        }
        (imports.concat(), tree.render(""))
    };

    format!(
        "{GENERATED_HEADER}
{namespace_import}
{imports}
const {name} = {body};

{namespace}.register( '{name}', {name} );

export default {name};
"
    )
}

/// Rewrites each aggregate module (`joist/js/JoistStrings.ts`, relative to the
/// destination root) to expose only the keys that were referenced.
pub fn regenerate_aggregate_modules<F>(
    aggregate_paths: &[String],
    usages: &StringUsages,
    namespace_identifier: F,
    dest_root: &Path,
) -> Result<usize>
where
    F: Fn(&str) -> String,
{
    for aggregate_path in aggregate_paths {
        let Some(repo) = aggregate_path.split('/').next() else {
            continue;
        };
        let repo_usages = usages.for_repo(repo);
        let content = render_aggregate_module(
            aggregate_path,
            repo,
            &namespace_identifier(repo),
            &repo_usages,
        );
        write_file(&dest_root.join(aggregate_path), &content)?;
        log::debug!(
            "regenerated {} with {} keys",
            aggregate_path,
            repo_usages.len()
        );
    }
    Ok(aggregate_paths.len())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StringRepoInfo<'a> {
    repo: &'a str,
    requirejs_namespace: String,
}

/// Writes `babel/babel-strings.js`, `babel/babel-metadata.js`,
/// `babel/babel-stringRepos.js` and `babel/localeData.js`.
pub fn write_bridge_modules(
    dest_root: &Path,
    source_root: &Path,
    string_repos: &[String],
    locale_data: &Value,
) -> Result<Vec<PathBuf>> {
    let babel_dir = dest_root.join("babel");

    let empty_strings: Map<String, Value> = locale_data
        .as_object()
        .map(|locales| {
            locales
                .keys()
                .map(|locale| (locale.clone(), Value::Object(Map::new())))
                .collect()
        })
        .unwrap_or_default();

    let repos_info: Vec<StringRepoInfo> = string_repos
        .iter()
        .map(|repo| StringRepoInfo {
            repo,
            requirejs_namespace: requirejs_namespace(&source_root.join(repo), repo),
        })
        .collect();

    let modules = [
        (
            "babel-strings.js",
            format!(
                "{CHIPPER_PRECURSOR}
const strings = {};
phet.chipper.strings = strings;
export default strings;
if ( phet.chipper.availableLocales ) {{
  Object.keys( strings ).forEach( locale => {{
    if ( !phet.chipper.availableLocales.includes( locale ) ) {{
      delete strings[ locale ];
    }}
  }} );
}}",
                serde_json::to_string(&empty_strings)?
            ),
        ),
        (
            "babel-metadata.js",
            format!(
                "{CHIPPER_PRECURSOR}
const metadata = {{}};
phet.chipper.stringMetadata = metadata;
export default metadata;"
            ),
        ),
        (
            "babel-stringRepos.js",
            format!(
                "{CHIPPER_PRECURSOR}
const stringRepos = {};
phet.chipper.stringRepos = stringRepos;
export default stringRepos;",
                serde_json::to_string(&repos_info)?
            ),
        ),
        (
            "localeData.js",
            format!(
                "{CHIPPER_PRECURSOR}
const localeData = {};
phet.chipper.localeData = localeData;
export default localeData;",
                serde_json::to_string(locale_data)?
            ),
        ),
    ];

    let mut written = Vec::new();
    for (file_name, content) in modules {
        let path = babel_dir.join(file_name);
        write_file(&path, &content)?;
        written.push(path);
    }
    Ok(written)
}
