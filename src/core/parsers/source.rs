use anyhow::Result;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use swc_common::{
    BytePos, FileName, Globals, SourceMap, Span,
    comments::{Comment, SingleThreadedComments},
};
use swc_ecma_ast::Module;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

use crate::errors::BuildError;

/// Map of byte positions to comments.
pub type CommentMap = HashMap<BytePos, Vec<Comment>>;

/// Comments extracted from SingleThreadedComments during parsing, stored
/// independently of swc types so the parse result can cross threads.
#[derive(Debug, Clone)]
pub struct ExtractedComments {
    pub leading: CommentMap,
    pub trailing: CommentMap,
}

impl ExtractedComments {
    /// Extract comments from SingleThreadedComments.
    /// This must be called before SingleThreadedComments is dropped.
    pub fn from_swc(comments: &SingleThreadedComments) -> Self {
        let (leading, trailing) = comments.borrow_all();
        Self {
            leading: leading.iter().map(|(k, v)| (*k, v.clone())).collect(),
            trailing: trailing.iter().map(|(k, v)| (*k, v.clone())).collect(),
        }
    }

    /// Comments attached in front of the token starting at `pos`.
    pub fn leading_at(&self, pos: BytePos) -> &[Comment] {
        self.leading.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A parsed source file plus what is needed to map spans back to byte offsets
/// of the text it was parsed from.
pub struct ParsedSource {
    pub module: Module,
    pub comments: ExtractedComments,
    start_pos: BytePos,
}

impl ParsedSource {
    /// Byte offset of a position relative to the start of the parsed text.
    pub fn offset(&self, pos: BytePos) -> usize {
        (pos.0 - self.start_pos.0) as usize
    }

    /// Byte range of a span within the parsed text.
    pub fn range(&self, span: Span) -> Range<usize> {
        self.offset(span.lo)..self.offset(span.hi)
    }
}

/// Chooses TypeScript syntax for `.ts`/`.tsx` files and plain ECMAScript for
/// everything else (`.js`, `.mjs`).
fn syntax_for(file_path: &str) -> Syntax {
    if file_path.ends_with(".ts") || file_path.ends_with(".tsx") || file_path.ends_with(".mts") {
        Syntax::Typescript(TsSyntax {
            tsx: file_path.ends_with(".tsx"),
            ..Default::default()
        })
    } else {
        Syntax::Es(EsSyntax {
            jsx: false,
            ..Default::default()
        })
    }
}

/// Parse a source file's text into a module AST.
///
/// Every call uses its own `SourceMap` and swc globals, so callers may parse from
/// several threads at once.
pub fn parse_source(code: &str, file_path: &str) -> Result<ParsedSource> {
    use swc_common::GLOBALS;

    GLOBALS.set(&Globals::new(), || {
        let source_map = Arc::new(SourceMap::default());
        let source_file =
            source_map.new_source_file(FileName::Real(file_path.into()).into(), code.to_string());

        let comments = SingleThreadedComments::default();
        let mut parser = Parser::new(
            syntax_for(file_path),
            StringInput::from(&*source_file),
            Some(&comments),
        );

        let module = parser.parse_module().map_err(|e| BuildError::Parse {
            file: file_path.to_string(),
            message: format!("{:?}", e),
        })?;

        Ok(ParsedSource {
            module,
            comments: ExtractedComments::from_swc(&comments),
            start_pos: source_file.start_pos,
        })
    })
}
