use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Invalid character {character:?} at line {line}, column {column}")]
    Lex { character: char, line: usize, column: usize },

    #[error("Integer literal {text} does not fit in 64 bits at line {line}, column {column}")]
    LiteralOverflow { text: String, line: usize, column: usize },

    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax { line: usize, column: usize, message: String },

    #[error("Function '{function}' expects {expected} arguments, but got {found}")]
    Arity { function: String, expected: usize, found: usize },

    #[error("Polyfill name '{name}' is already taken by another symbol")]
    NameCollision { name: String },

    /// A node that the compressor should have lowered reached the generator.
    #[error("Unsupported operation: {node} must be lowered before generation")]
    UnsupportedOperation { node: &'static str },

    #[error("Cannot remove node at '{key}': only members of an ordered sequence can be removed")]
    ForbiddenRemoval { key: String },

    #[error("{component}: restore or unsave called without a saved checkpoint")]
    CheckpointUnderflow { component: &'static str },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}
