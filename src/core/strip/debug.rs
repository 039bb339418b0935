//! Removal of debug-only code (`assert && ...`, `if ( assert ) { ... }`).
//!
//! Every removal is a same-length replacement so the stripped file lines up
//! byte-for-byte with source maps generated from the unstripped one.

use anyhow::Result;
use swc_common::{Span, Spanned};
use swc_ecma_ast::{Expr, Stmt};
use swc_ecma_visit::{Visit, VisitWith};

use crate::core::edits::{Edit, EditList};
use crate::core::matchers::{DebugPredicates, is_debug_guard_expression, is_debug_guard_statement};
use crate::core::parsers::source::{ParsedSource, parse_source};
use crate::errors::BuildError;

const TS_EXPECT_ERROR: &str = "@ts-expect-error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardKind {
    /// `assert && check();` as a whole statement; the expression becomes nothing.
    ExpressionStatement,
    /// `if ( assert ) { ... }`; becomes an empty `if`.
    IfStatement,
    /// A guard used as a value somewhere else; becomes `false`.
    Expression,
}

impl GuardKind {
    fn replacement(self) -> &'static str {
        match self {
            GuardKind::ExpressionStatement => "",
            GuardKind::IfStatement => "if ( false ) {}",
            GuardKind::Expression => "false",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Guard {
    span: Span,
    kind: GuardKind,
}

/// Collects outermost debug guards. Matched nodes are not descended into.
struct GuardCollector<'a> {
    predicates: &'a DebugPredicates,
    guards: Vec<Guard>,
}

impl<'a> GuardCollector<'a> {
    fn collect(parsed: &ParsedSource, predicates: &'a DebugPredicates) -> Vec<Guard> {
        let mut collector = Self {
            predicates,
            guards: Vec::new(),
        };
        parsed.module.visit_with(&mut collector);
        collector.guards
    }

    fn record(&mut self, span: Span, kind: GuardKind) {
        self.guards.push(Guard { span, kind });
    }
}

impl Visit for GuardCollector<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::If(_) if is_debug_guard_statement(stmt, self.predicates) => {
                self.record(stmt.span(), GuardKind::IfStatement);
            }
            Stmt::Expr(expr_stmt) if is_debug_guard_expression(&expr_stmt.expr, self.predicates) => {
                self.record(expr_stmt.expr.span(), GuardKind::ExpressionStatement);
            }
            _ => stmt.visit_children_with(self),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if is_debug_guard_expression(expr, self.predicates) {
            self.record(expr.span(), GuardKind::Expression);
        } else {
            expr.visit_children_with(self);
        }
    }
}

/// Result of stripping one file.
#[derive(Debug, Clone)]
pub struct DebugStripResult {
    pub text: String,
    pub removed: usize,
}

/// Byte range to replace for a guard. A `@ts-expect-error` comment directly in
/// front of the guard is removed with it, otherwise it would suppress an error on
/// whatever follows.
fn guard_range(parsed: &ParsedSource, guard: &Guard) -> std::ops::Range<usize> {
    let range = parsed.range(guard.span);
    let comment_start = parsed
        .comments
        .leading_at(guard.span.lo)
        .iter()
        .filter(|c| c.text.contains(TS_EXPECT_ERROR))
        .map(|c| parsed.offset(c.span.lo))
        .min();
    match comment_start {
        Some(start) if start < range.start => start..range.end,
        _ => range,
    }
}

fn mentions_any(text: &str, predicates: &DebugPredicates) -> Option<String> {
    predicates
        .iter()
        .find(|name| text.contains(name))
        .map(String::from)
}

/// Strips every debug guard from `text`.
///
/// After stripping, a file that still mentions a predicate is re-parsed; a guard
/// found at that point means the edit computation went wrong, which is fatal.
pub fn strip_debug_code(
    text: &str,
    file_path: &str,
    predicates: &DebugPredicates,
) -> Result<DebugStripResult> {
    if mentions_any(text, predicates).is_none() {
        return Ok(DebugStripResult {
            text: text.to_string(),
            removed: 0,
        });
    }

    let parsed = parse_source(text, file_path)?;
    let guards = GuardCollector::collect(&parsed, predicates);

    let mut edits = EditList::new();
    for guard in &guards {
        let range = guard_range(&parsed, guard);
        log::trace!(
            "{}: removing {:?} at {}..{}",
            file_path,
            guard.kind,
            range.start,
            range.end
        );
        edits.push(Edit::same_length(range, guard.kind.replacement())?);
    }
    debug_assert!(edits.preserves_length());
    let stripped = edits.apply(text)?;

    if !guards.is_empty() && mentions_any(&stripped, predicates).is_some() {
        let reparsed = parse_source(&stripped, file_path)?;
        if let Some(survivor) = GuardCollector::collect(&reparsed, predicates).first() {
            let snippet = &stripped[reparsed.range(survivor.span)];
            let predicate = mentions_any(snippet, predicates).unwrap_or_default();
            return Err(BuildError::DebugGuardSurvived {
                file: file_path.to_string(),
                predicate,
            }
            .into());
        }
    }

    Ok(DebugStripResult {
        text: stripped,
        removed: guards.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn predicates() -> DebugPredicates {
        DebugPredicates::new(["assert", "assertSlow", "affirm", "sceneryLog"])
    }

    fn strip(text: &str) -> DebugStripResult {
        strip_debug_code(text, "test.ts", &predicates()).unwrap()
    }

    #[test]
    fn test_guard_statement_becomes_padded_empty_if() {
        let text = "if ( assert ) { assert( x > 0, 'bad' ); }";
        let result = strip(text);
        let expected = format!("{}if ( false ) {{}}", " ".repeat(text.len() - 15));
        assert_eq!(result.text, expected);
        assert_eq!(result.text.len(), text.len());
        assert_eq!(result.removed, 1);
    }

    #[test]
    fn test_expression_statement_is_blanked() {
        let text = "foo();\nassert && assert( foo() === 1, 'foo' );\nbar();\n";
        let result = strip(text);
        assert_eq!(result.text.len(), text.len());
        assert!(!result.text.contains("assert"));
        assert!(result.text.contains("foo();\n"));
        assert!(result.text.ends_with(";\nbar();\n"));
    }

    #[test]
    fn test_nested_guard_value_becomes_false() {
        let text = "const ok = assert && assertSlow && check( a );\n";
        let result = strip(text);
        assert_eq!(
            result.text,
            format!("const ok = {}false;\n", " ".repeat(29))
        );
    }

    #[test]
    fn test_guards_inside_functions_and_classes() {
        let text = "class A {\n  m() {\n    sceneryLog && sceneryLog.A( 'x' );\n    if ( assertSlow ) {\n      check();\n    }\n    return 1;\n  }\n}\n";
        let result = strip(text);
        assert_eq!(result.text.len(), text.len());
        assert_eq!(result.removed, 2);
        assert!(!result.text.contains("sceneryLog"));
        assert!(!result.text.contains("assertSlow"));
        assert!(result.text.contains("return 1;"));
    }

    #[test]
    fn test_else_if_guard() {
        let text = "if ( a ) { b(); }\nelse if ( assert && c ) { d(); }\n";
        let result = strip(text);
        assert_eq!(result.text.len(), text.len());
        assert!(result.text.contains("else "));
        assert!(result.text.trim_end().ends_with("if ( false ) {}"));
    }

    #[test]
    fn test_ts_expect_error_comment_is_removed_with_guard() {
        let text = "// @ts-expect-error\nassert && assert( window.x );\nfoo();\n";
        let result = strip(text);
        assert_eq!(result.text.len(), text.len());
        assert!(!result.text.contains("@ts-expect-error"));
        assert!(result.text.ends_with("foo();\n"));
    }

    #[test]
    fn test_untouched_without_predicates() {
        let text = "const assertion = a && b;\n";
        let result = strip(text);
        assert_eq!(result.text, text);
        assert_eq!(result.removed, 0);
    }

    #[test]
    fn test_non_guard_uses_survive() {
        let text = "import assert from './assert.js';\nassert( x );\n";
        let result = strip(text);
        assert_eq!(result.text, text);
    }

    #[test]
    fn test_too_short_span_is_fatal() {
        let err = strip_debug_code("if(assert)x;", "test.ts", &predicates()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ReplacementTooLong { .. })
        ));
    }
}
