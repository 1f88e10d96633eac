//! TypeScript declaration front-end.
//!
//! swc parses the whole module as TypeScript; [`lower`] then keeps the
//! exported interfaces, enums, classes and type aliases. Positions in
//! [`ParseError`] come from swc spans looked up in its `SourceMap`.

mod lower;

use std::path::Path;

use swc_common::sync::Lrc;
use swc_common::{BytePos, FileName, SourceMap, Spanned};
use swc_ecma_parser::lexer::Lexer;
use swc_ecma_parser::{Parser, StringInput, Syntax};

use crate::ast::Module;
use crate::errors::{Error, ParseError, Result};

/// Parses a TypeScript declaration module. Exported interfaces, enums, classes
/// and type aliases are kept; imports, value statements and non-exported
/// declarations are dropped.
pub fn parse_module(source: &str) -> Result<Module, ParseError> {
    let source_map: Lrc<SourceMap> = Default::default();
    let source_file = source_map.new_source_file(
        FileName::Custom("input.ts".into()).into(),
        source.to_string(),
    );
    let lexer = Lexer::new(
        Syntax::Typescript(Default::default()),
        Default::default(),
        StringInput::from(&*source_file),
        None,
    );
    let mut parser = Parser::new_from(lexer);
    let parsed = parser.parse_module();
    if let Some(err) = parser.take_errors().into_iter().next() {
        return Err(syntax_error(&source_map, err));
    }
    let program = parsed.map_err(|err| syntax_error(&source_map, err))?;
    lower::module(&source_map, &program)
}

pub fn parse_file(path: &Path) -> Result<Module> {
    let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_module(&source).map_err(|source| Error::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn syntax_error(source_map: &SourceMap, err: swc_ecma_parser::error::Error) -> ParseError {
    let pos = err.span().lo;
    error_at(source_map, pos, err.into_kind().msg())
}

/// 1-based line and column of `pos`.
pub(crate) fn error_at(
    source_map: &SourceMap,
    pos: BytePos,
    message: impl Into<String>,
) -> ParseError {
    let loc = source_map.lookup_char_pos(pos);
    ParseError::new(message, loc.line, loc.col.0 + 1)
}
