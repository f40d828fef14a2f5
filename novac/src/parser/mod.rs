pub mod lexer;
pub mod parser;
pub mod token;

use crate::error::CompileError;
use crate::ir::ast;

/// How the front end reacts to malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// The first lexical or grammar violation is an error.
    #[default]
    Strict,
    /// Invalid characters become `Unknown` tokens and the parser keeps
    /// whatever it managed to assemble.
    Lenient,
}

/// Главная функция парсера - из текста в AST
pub fn parse(source: &str, mode: Mode) -> Result<ast::Program, CompileError> {
    parser::parse_source(source, mode)
}

/// Lenient parse for editor-style tooling. Never fails.
pub fn parse_lenient(source: &str) -> ast::Program {
    parse(source, Mode::Lenient).unwrap_or_default()
}
