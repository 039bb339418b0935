//! Removal of top-level namespace registrations (`fooNamespace.register( 'Bar', Bar );`).

use anyhow::Result;
use swc_common::Spanned;
use swc_ecma_ast::ModuleItem;

use crate::core::edits::{Edit, EditList};
use crate::core::matchers::namespace_registration;
use crate::core::parsers::source::parse_source;

#[derive(Debug, Clone, Default)]
pub struct NamespaceStripResult {
    pub text: String,
    /// `namespace.Name` patterns that were blanked, last statement first.
    pub removed_patterns: Vec<String>,
}

/// Blanks every top-level registration on `namespace` whose `namespace.Name`
/// pattern is not in `allowed`. Nested statements are left alone.
pub fn strip_namespace_registrations(
    text: &str,
    file_path: &str,
    namespace: &str,
    allowed: &[String],
) -> Result<NamespaceStripResult> {
    if !text.contains(namespace) {
        return Ok(NamespaceStripResult {
            text: text.to_string(),
            removed_patterns: Vec::new(),
        });
    }

    let parsed = parse_source(text, file_path)?;
    let mut edits = EditList::new();
    let mut removed_patterns = Vec::new();

    for item in parsed.module.body.iter().rev() {
        let ModuleItem::Stmt(stmt) = item else {
            continue;
        };
        let Some(registration) = namespace_registration(stmt, namespace) else {
            continue;
        };
        let pattern = format!("{namespace}.{}", registration.registered_name);
        if allowed.contains(&pattern) {
            log::trace!("{}: keeping allowed registration {}", file_path, pattern);
            continue;
        }
        let range = parsed.range(stmt.span());
        edits.push(Edit::blank(range.clone(), &text[range]));
        removed_patterns.push(pattern);
    }

    debug_assert!(edits.preserves_length());
    Ok(NamespaceStripResult {
        text: edits.apply(text)?,
        removed_patterns,
    })
}
