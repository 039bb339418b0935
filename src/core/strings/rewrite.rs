//! Rewrites string aggregate accesses (`JoistStrings.a11y.homeStringProperty`)
//! into imports of generated per-key modules.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use super::{StringUsages, aggregate_name};
use crate::core::edits::{Edit, EditList};
use crate::core::inject::insert_import;
use crate::errors::BuildError;
use crate::utils::relative_import_path;

const STRING_PROPERTY_SUFFIX: &str = "StringProperty";

static ACCESS_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\.([a-zA-Z_$][a-zA-Z0-9_$]*)|\[\s*['"]([^'"]+)['"]\s*\]"#).unwrap()
});

fn access_chain_regex(prefix: &str) -> Result<Regex> {
    Ok(Regex::new(&format!(
        r#"{}(\.[a-zA-Z_$][a-zA-Z0-9_$]*|\[\s*['"][^'"]+['"]\s*\])+[^.\[]"#,
        regex::escape(prefix)
    ))?)
}

/// Key path recovered from an access chain, and how many bytes of the chain
/// (after the aggregate name) it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
struct KeyPath {
    key: String,
    chain_len: usize,
}

/// `.a11y[ 'home' ].value` -> `a11y.home`; `.titleStringProperty` -> `title`.
///
/// The key ends at the first `...StringProperty` segment. Without one, a trailing
/// `.value` is an accessor rather than part of the key and stays in the text.
fn key_path(chain: &str) -> Option<KeyPath> {
    let mut parts = Vec::new();
    let mut ends = Vec::new();
    for captures in ACCESS_SEGMENT.captures_iter(chain) {
        let segment = captures.get(1).or_else(|| captures.get(2))?;
        let whole = captures.get(0)?;
        if let Some(stem) = segment.as_str().strip_suffix(STRING_PROPERTY_SUFFIX) {
            if !stem.is_empty() {
                parts.push(stem.to_string());
            }
            return (!parts.is_empty()).then(|| KeyPath {
                key: parts.join("."),
                chain_len: whole.end(),
            });
        }
        parts.push(segment.as_str().to_string());
        ends.push(whole.end());
    }

    if parts.len() > 1 && parts.last().is_some_and(|p| p == "value") {
        parts.pop();
        ends.pop();
    }
    let chain_len = *ends.last()?;
    Some(KeyPath {
        key: parts.join("."),
        chain_len,
    })
}

/// Rewrites every access of `string_repo`'s aggregate in a file.
///
/// Keys are registered in `usages`. Files that do not import the aggregate are
/// returned unchanged. After rewriting, the aggregate name may only remain in its
/// own import line (twice: binding and path); the line is then dropped.
pub fn rewrite_string_references(
    text: &str,
    string_repo: &str,
    dest_path: &str,
    usages: &mut StringUsages,
) -> Result<String> {
    let prefix = aggregate_name(string_repo);
    if !text.contains(&format!("import {prefix} from")) {
        return Ok(text.to_string());
    }

    let chain_regex = access_chain_regex(&prefix)?;
    let mut edits = EditList::new();
    let mut imports: Vec<String> = Vec::new();

    for found in chain_regex.find_iter(text) {
        // The final character only terminates the chain.
        let matched = &found.as_str()[..found.as_str().len() - 1];
        if matched == format!("{prefix}.js") {
            continue;
        }
        let Some(path) = key_path(&matched[prefix.len()..]) else {
            continue;
        };

        let usage = usages.record(string_repo, &path.key)?;
        let import = format!(
            "import {{ {} }} from '{}';",
            usage.identifier,
            relative_import_path(dest_path, &usage.module_path)
        );
        if !imports.contains(&import) {
            imports.push(import);
        }

        let start = found.start();
        edits.push(Edit::new(
            start..start + prefix.len() + path.chain_len,
            usage.identifier.clone(),
        ));
        log::trace!("{}: {} -> {}", dest_path, matched, usage.identifier);
    }

    let mut output = edits.apply(text)?;
    for import in imports.iter().rev() {
        output = insert_import(&output, import);
    }

    let count = output.matches(prefix.as_str()).count();
    if count != 2 {
        return Err(BuildError::ResidualStringReference {
            file: dest_path.to_string(),
            prefix,
            count,
        }
        .into());
    }

    let aggregate_import = Regex::new(&format!(
        r"\nimport {0} from '[^']+';|^import {0} from '[^']+';\n?",
        regex::escape(&prefix)
    ))?;
    Ok(aggregate_import.replace_all(&output, "").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_path_forms() {
        let path = |chain: &str| key_path(chain).map(|p| p.key);
        assert_eq!(path(".title.value"), Some("title".to_string()));
        assert_eq!(path(".titleStringProperty"), Some("title".to_string()));
        assert_eq!(
            path(".a11y[ 'homeStringProperty' ]"),
            Some("a11y.home".to_string())
        );
        assert_eq!(path(".a11y.home"), Some("a11y.home".to_string()));
        assert_eq!(path(".value"), Some("value".to_string()));
    }

    #[test]
    fn test_key_path_stops_after_string_property() {
        let chain = ".screens.homeStringProperty.value";
        let path = key_path(chain).unwrap();
        assert_eq!(path.key, "screens.home");
        assert_eq!(&chain[..path.chain_len], ".screens.homeStringProperty");
    }

    #[test]
    fn test_value_access_is_rewritten() {
        let text = "// Copyright\nimport Foo from './Foo.js';\nimport JoistStrings from './JoistStrings.js';\n\nconst title = JoistStrings.title.value;\n";
        let mut usages = StringUsages::new();
        let output =
            rewrite_string_references(text, "joist", "joist/js/Sim.ts", &mut usages).unwrap();

        assert_eq!(
            output,
            "// Copyright\nimport { string_joist_title_StringProperty } from './strings/title.js';\nimport Foo from './Foo.js';\n\nconst title = string_joist_title_StringProperty.value;\n"
        );
        assert!(usages.get("joist", "title").is_some());
    }

    #[test]
    fn test_string_properties_are_deduplicated() {
        let text = "import JoistStrings from '../../joist/js/JoistStrings.js';\nconst a = new Text( JoistStrings.a11y.homeStringProperty );\nconst b = new Text( JoistStrings.a11y[ 'homeStringProperty' ] );\nconst c = JoistStrings.preferences.titleStringProperty;\n";
        let mut usages = StringUsages::new();
        let output =
            rewrite_string_references(text, "joist", "sun/js/Dialog.ts", &mut usages).unwrap();

        assert!(!output.contains("JoistStrings"));
        assert_eq!(
            output
                .matches("import { string_joist_a11y_home_StringProperty } from '../../joist/js/strings/a11y/home.js';")
                .count(),
            1
        );
        assert!(output.contains("const b = new Text( string_joist_a11y_home_StringProperty );"));
        assert!(output.contains("const c = string_joist_preferences_title_StringProperty;"));
        assert_eq!(usages.len(), 2);
    }

    #[test]
    fn test_files_without_aggregate_import_are_untouched() {
        let text = "const x = JoistStrings.title;\n";
        let mut usages = StringUsages::new();
        let output =
            rewrite_string_references(text, "joist", "joist/js/Sim.ts", &mut usages).unwrap();
        assert_eq!(output, text);
        assert!(usages.is_empty());
    }

    #[test]
    fn test_residual_reference_is_fatal() {
        let text = "import JoistStrings from './JoistStrings.js';\nconst strings = JoistStrings;\n";
        let mut usages = StringUsages::new();
        let err =
            rewrite_string_references(text, "joist", "joist/js/Sim.ts", &mut usages).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ResidualStringReference { count: 3, .. })
        ));
    }
}
