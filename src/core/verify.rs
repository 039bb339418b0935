//! Checks that no written file still reads a namespace entry whose registration
//! was stripped.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::Result;
use rayon::prelude::*;
use swc_ecma_ast::{Expr, MemberExpr, MemberProp};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::parsers::source::parse_source;
use crate::errors::BuildError;

/// Removed `namespace.name` patterns grouped by namespace identifier.
fn group_patterns(patterns: &BTreeSet<String>) -> BTreeMap<&str, BTreeSet<&str>> {
    let mut grouped: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for pattern in patterns {
        if let Some((namespace, name)) = pattern.split_once('.') {
            grouped.entry(namespace).or_default().insert(name);
        }
    }
    grouped
}

/// Name the object of a member access ends in: `axon` for both `axon` and
/// `phet.axon`.
fn object_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Ident(ident) => Some(ident.sym.as_str()),
        Expr::Member(member) => match &member.prop {
            MemberProp::Ident(prop) => Some(prop.sym.as_str()),
            _ => None,
        },
        Expr::Paren(paren) => object_name(&paren.expr),
        _ => None,
    }
}

struct AccessFinder<'a> {
    patterns: &'a BTreeMap<&'a str, BTreeSet<&'a str>>,
    found: Option<String>,
}

impl Visit for AccessFinder<'_> {
    fn visit_member_expr(&mut self, node: &MemberExpr) {
        if self.found.is_some() {
            return;
        }
        if let (Some(object), MemberProp::Ident(property)) = (object_name(&node.obj), &node.prop) {
            let names = self.patterns.get(object);
            if names.is_some_and(|names| names.contains(property.sym.as_str())) {
                self.found = Some(format!("{}.{}", object, property.sym));
                return;
            }
        }
        node.visit_children_with(self);
    }
}

/// First removed pattern read in `text`, if any.
pub fn find_removed_access(
    text: &str,
    file_path: &str,
    patterns: &BTreeSet<String>,
) -> Result<Option<String>> {
    let grouped = group_patterns(patterns);
    if !grouped.keys().any(|namespace| text.contains(namespace)) {
        return Ok(None);
    }
    let parsed = parse_source(text, file_path)?;
    let mut finder = AccessFinder {
        patterns: &grouped,
        found: None,
    };
    parsed.module.visit_with(&mut finder);
    Ok(finder.found)
}

/// Scans every written file in parallel. The first violation (by path) is fatal.
pub fn verify_removed_namespaces(
    written: &HashMap<String, String>,
    patterns: &BTreeSet<String>,
) -> Result<()> {
    if patterns.is_empty() {
        return Ok(());
    }

    let mut violations: Vec<(String, String)> = written
        .par_iter()
        .map(|(path, text)| {
            find_removed_access(text, path, patterns)
                .map(|found| found.map(|pattern| (path.clone(), pattern)))
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();
    violations.sort();

    match violations.into_iter().next() {
        Some((file, pattern)) => Err(BuildError::NamespacePatternUsed { pattern, file }.into()),
        None => {
            log::debug!(
                "verified {} removed namespace patterns over {} files",
                patterns.len(),
                written.len()
            );
            Ok(())
        }
    }
}
