//! Collects what a module exports from its top-level declarations.

use std::collections::HashSet;

use anyhow::Result;
use swc_ecma_ast::{
    Decl, DefaultDecl, Expr, ExportSpecifier, Module, ModuleDecl, ModuleExportName, ModuleItem,
    Pat, Stmt, Str,
};

use super::{DEFAULT_EXPORT, ExportList, StringEnum};
use crate::core::matchers::{
    is_re_export_all_declaration, is_string_enum_array_declaration, string_enum_type_source,
};
use crate::core::parsers::source::parse_source;

fn module_export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => str_value(s),
    }
}

fn str_value(s: &Str) -> String {
    s.value.to_string_lossy().to_string()
}

/// Top-level declarations of a module, exported or not.
fn top_level_decls(module: &Module) -> impl Iterator<Item = &Decl> {
    module.body.iter().filter_map(|item| match item {
        ModuleItem::Stmt(Stmt::Decl(decl)) => Some(decl),
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => Some(&export.decl),
        _ => None,
    })
}

/// Names of locally declared type aliases and interfaces.
fn local_type_names(module: &Module) -> HashSet<String> {
    top_level_decls(module)
        .filter_map(|decl| match decl {
            Decl::TsTypeAlias(alias) => Some(alias.id.sym.to_string()),
            Decl::TsInterface(interface) => Some(interface.id.sym.to_string()),
            _ => None,
        })
        .collect()
}

fn string_enums(module: &Module) -> Vec<StringEnum> {
    let arrays: HashSet<String> = top_level_decls(module)
        .filter_map(|decl| match decl {
            Decl::Var(var) => Some(var.decls.iter()),
            _ => None,
        })
        .flatten()
        .filter(|declarator| is_string_enum_array_declaration(declarator))
        .filter_map(|declarator| match &declarator.name {
            Pat::Ident(binding) => Some(binding.id.sym.to_string()),
            _ => None,
        })
        .collect();

    top_level_decls(module)
        .filter_map(|decl| match decl {
            Decl::TsTypeAlias(alias) => string_enum_type_source(&alias.type_ann)
                .filter(|values| arrays.contains(values))
                .map(|values_name| StringEnum {
                    type_name: alias.id.sym.to_string(),
                    values_name,
                }),
            _ => None,
        })
        .collect()
}

fn push_declared(list: &mut ExportList, decl: &Decl) {
    match decl {
        Decl::Class(class) => list.values.push(class.ident.sym.to_string()),
        Decl::Fn(function) => list.values.push(function.ident.sym.to_string()),
        Decl::TsEnum(ts_enum) => list.values.push(ts_enum.id.sym.to_string()),
        Decl::Var(var) => {
            for declarator in &var.decls {
                if let Pat::Ident(binding) = &declarator.name {
                    list.values.push(binding.id.sym.to_string());
                }
            }
        }
        Decl::TsTypeAlias(alias) => list.types.push(alias.id.sym.to_string()),
        Decl::TsInterface(interface) => list.types.push(interface.id.sym.to_string()),
        _ => {}
    }
}

/// Exports of a parsed module, in declaration order.
///
/// Default exports are listed under the name `default`. Re-exported names count
/// as types when the export is type-only or the original name is a local type
/// alias or interface.
pub fn exports_of_module(module: &Module) -> ExportList {
    let local_types = local_type_names(module);
    let mut list = ExportList::default();

    for item in &module.body {
        let ModuleItem::ModuleDecl(decl) = item else {
            continue;
        };
        match decl {
            ModuleDecl::ExportDecl(export) => push_declared(&mut list, &export.decl),
            ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
                DefaultDecl::TsInterfaceDecl(_) => list.types.push(DEFAULT_EXPORT.to_string()),
                DefaultDecl::Class(_) | DefaultDecl::Fn(_) => {
                    list.values.push(DEFAULT_EXPORT.to_string())
                }
            },
            ModuleDecl::ExportDefaultExpr(export) => {
                let is_type = matches!(
                    &*export.expr,
                    Expr::Ident(ident) if local_types.contains(ident.sym.as_str())
                );
                if is_type {
                    list.types.push(DEFAULT_EXPORT.to_string());
                } else {
                    list.values.push(DEFAULT_EXPORT.to_string());
                }
            }
            ModuleDecl::ExportNamed(named) => {
                for specifier in &named.specifiers {
                    let ExportSpecifier::Named(specifier) = specifier else {
                        continue;
                    };
                    let original = module_export_name(&specifier.orig);
                    let exported = specifier
                        .exported
                        .as_ref()
                        .map(module_export_name)
                        .unwrap_or_else(|| original.clone());
                    if named.type_only
                        || specifier.is_type_only
                        || local_types.contains(&original)
                    {
                        list.types.push(exported);
                    } else {
                        list.values.push(exported);
                    }
                }
            }
            ModuleDecl::ExportAll(export) if is_re_export_all_declaration(decl) => {
                list.star_reexports.push(str_value(&export.src));
            }
            _ => {}
        }
    }

    list.string_enums = string_enums(module);
    list
}

/// Parses `text` and returns its exports.
pub fn extract_exports(text: &str, file_path: &str) -> Result<ExportList> {
    let parsed = parse_source(text, file_path)?;
    Ok(exports_of_module(&parsed.module))
}
