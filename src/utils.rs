//! Common utility functions shared across the codebase.

use std::path::{Component, Path};

/// Splits a repository-style name into lowercase words.
///
/// Word boundaries are any non-alphanumeric character and lower-to-upper case
/// transitions, so `scenery-phet`, `scenery_phet` and `sceneryPhet` all produce
/// `["scenery", "phet"]`.
fn words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in name.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Converts a repository name to camel case.
///
/// ```
/// use flatstack::utils::camel_case;
///
/// assert_eq!(camel_case("scenery-phet"), "sceneryPhet");
/// assert_eq!(camel_case("query-string-machine"), "queryStringMachine");
/// assert_eq!(camel_case("joist"), "joist");
/// ```
pub fn camel_case(name: &str) -> String {
    words(name)
        .iter()
        .enumerate()
        .map(|(i, word)| if i == 0 { word.clone() } else { capitalize(word) })
        .collect()
}

/// Converts a repository name to Pascal case (`scenery-phet` -> `SceneryPhet`).
pub fn pascal_case(name: &str) -> String {
    words(name).iter().map(|word| capitalize(word)).collect()
}

/// Converts a repository name to upper snake case (`scenery-phet` -> `SCENERY_PHET`).
pub fn upper_snake_case(name: &str) -> String {
    words(name)
        .iter()
        .map(|word| word.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Replaces every character outside `[a-zA-Z0-9_]` with an underscore.
pub fn sanitize_identifier(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Joins path components with forward slashes regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Computes the module specifier that imports `target` from the file `from_file`.
///
/// Both paths are relative to the same root (the destination tree). The result
/// always starts with `.` so it is never mistaken for a bare package import, and a
/// trailing `.ts` is rewritten to `.js` the way emitted modules reference each other.
///
/// ```
/// use flatstack::utils::relative_import_path;
///
/// assert_eq!(relative_import_path("joist/js/Sim.ts", "globals.js"), "../../globals.js");
/// assert_eq!(relative_import_path("joist/js/Sim.ts", "joist/js/Screen.ts"), "./Screen.js");
/// ```
pub fn relative_import_path(from_file: &str, target: &str) -> String {
    let from_dir: Vec<&str> = {
        let mut parts: Vec<&str> = from_file.split('/').filter(|p| !p.is_empty() && *p != ".").collect();
        parts.pop();
        parts
    };
    let target_parts: Vec<&str> = target.split('/').filter(|p| !p.is_empty() && *p != ".").collect();

    let common = from_dir
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::new();
    parts.extend(std::iter::repeat_n("..", from_dir.len() - common));
    parts.extend(&target_parts[common..]);

    let joined = parts.join("/");
    let joined = match joined.strip_suffix(".ts") {
        Some(stem) => format!("{stem}.js"),
        None => joined,
    };
    if joined.starts_with('.') {
        joined
    } else {
        format!("./{joined}")
    }
}
