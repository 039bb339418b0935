//! Pure structural predicates over swc syntax nodes.
//!
//! Nothing here mutates or allocates output; the strippers and extractors decide
//! what to do with a classification.

use std::collections::HashSet;

use swc_ecma_ast::{
    BinaryOp, Callee, Expr, ExprStmt, Lit, MemberProp, ModuleDecl, Pat, Stmt, TsEntityName,
    TsKeywordTypeKind, TsType, TsTypeQueryExpr, VarDeclarator,
};

/// Identifiers whose truthiness gates debug-only code (`assert`, a logging channel).
#[derive(Debug, Clone, Default)]
pub struct DebugPredicates {
    names: HashSet<String>,
}

impl DebugPredicates {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

fn unparen(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => unparen(&paren.expr),
        _ => expr,
    }
}

/// `assert`, `assertSlow`, ... as a bare identifier.
pub fn is_debug_predicate(expr: &Expr, predicates: &DebugPredicates) -> bool {
    matches!(unparen(expr), Expr::Ident(ident) if predicates.contains(ident.sym.as_str()))
}

fn is_predicate_or_guard(expr: &Expr, predicates: &DebugPredicates) -> bool {
    is_debug_predicate(expr, predicates) || is_debug_guard_expression(expr, predicates)
}

/// `assert && ...`, including chains such as `assert && assertSlow && check()`.
///
/// An `&&` whose right operand is a predicate or guard is falsy whenever debugging
/// is off as well, so `ready && assert` is also a guard.
pub fn is_debug_guard_expression(expr: &Expr, predicates: &DebugPredicates) -> bool {
    match expr {
        Expr::Bin(bin) if bin.op == BinaryOp::LogicalAnd => {
            is_predicate_or_guard(&bin.left, predicates)
                || is_predicate_or_guard(&bin.right, predicates)
        }
        _ => false,
    }
}

/// `if ( assert ) { ... }` or `if ( assert && ... ) { ... }`.
pub fn is_debug_guard_statement(stmt: &Stmt, predicates: &DebugPredicates) -> bool {
    match stmt {
        Stmt::If(if_stmt) => is_predicate_or_guard(&if_stmt.test, predicates),
        _ => false,
    }
}

/// A namespace registration found in a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub registered_name: String,
}

/// `<namespace>.register( '<Name>', value, ... )` as an expression statement.
///
/// Returns the registered name when the statement has exactly that shape: the
/// callee object is the given namespace identifier, there are at least two
/// arguments and the first one is a string literal.
pub fn namespace_registration(stmt: &Stmt, namespace: &str) -> Option<Registration> {
    let Stmt::Expr(ExprStmt { expr, .. }) = stmt else {
        return None;
    };
    let Expr::Call(call) = &**expr else {
        return None;
    };
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let Expr::Member(member) = &**callee else {
        return None;
    };
    let MemberProp::Ident(prop) = &member.prop else {
        return None;
    };
    if prop.sym.as_str() != "register" {
        return None;
    }
    let Expr::Ident(object) = &*member.obj else {
        return None;
    };
    if object.sym.as_str() != namespace || call.args.len() < 2 {
        return None;
    }
    let first = &call.args[0];
    if first.spread.is_some() {
        return None;
    }
    match &*first.expr {
        Expr::Lit(Lit::Str(s)) => s.value.as_str().map(|name| Registration {
            registered_name: name.to_string(),
        }),
        _ => None,
    }
}

pub fn is_namespace_registration_call(stmt: &Stmt, namespace: &str) -> bool {
    namespace_registration(stmt, namespace).is_some()
}

/// `export * from './module'`.
pub fn is_re_export_all_declaration(decl: &ModuleDecl) -> bool {
    matches!(decl, ModuleDecl::ExportAll(_))
}

/// `const VALUES = [ 'a', 'b' ] as const;` (a string enumeration's value list).
pub fn is_string_enum_array_declaration(declarator: &VarDeclarator) -> bool {
    if !matches!(declarator.name, Pat::Ident(_)) {
        return false;
    }
    let Some(init) = &declarator.init else {
        return false;
    };
    let Expr::TsConstAssertion(assertion) = &**init else {
        return false;
    };
    let Expr::Array(array) = &*assertion.expr else {
        return false;
    };
    !array.elems.is_empty()
        && array.elems.iter().all(|elem| {
            matches!(
                elem,
                Some(e) if e.spread.is_none() && matches!(&*e.expr, Expr::Lit(Lit::Str(_)))
            )
        })
}

/// For a type of the form `typeof VALUES[number]`, the name `VALUES`.
pub fn string_enum_type_source(ty: &TsType) -> Option<String> {
    let TsType::TsIndexedAccessType(indexed) = ty else {
        return None;
    };
    let TsType::TsKeywordType(index) = &*indexed.index_type else {
        return None;
    };
    if index.kind != TsKeywordTypeKind::TsNumberKeyword {
        return None;
    }
    let TsType::TsTypeQuery(query) = &*indexed.obj_type else {
        return None;
    };
    match &query.expr_name {
        TsTypeQueryExpr::TsEntityName(TsEntityName::Ident(ident)) => Some(ident.sym.to_string()),
        _ => None,
    }
}
