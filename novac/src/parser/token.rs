use std::fmt;

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Identifiers and literals
    Identifier,
    Number,
    // Assignment
    Assign,        // =
    // Arithmetic
    Plus,          // +
    Minus,         // -
    Star,          // *
    Slash,         // /
    Percent,       // %
    StarStar,      // **
    // Bitwise
    Ampersand,     // &
    Pipe,          // |
    Caret,         // ^
    Tilde,         // ~
    ShiftLeft,     // <<
    ShiftRight,    // >>
    ShiftRightZero, // >>>
    // Comparison
    Equal,         // ==
    NotEqual,      // !=
    Greater,       // >
    GreaterEqual,  // >=
    Less,          // <
    LessEqual,     // <=
    // Logical
    AndAnd,        // &&
    OrOr,          // ||
    Bang,          // !
    // Punctuation
    Comma,         // ,
    Hash,          // #
    LParen,        // (
    RParen,        // )
    Question,      // ?
    Colon,         // :
    // Special
    Comment,
    Newline,
    Eof,
    Unknown,
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Identifier => "Identifier",
            Self::Number => "Number",
            Self::Assign => "Assignment",
            Self::Plus => "Plus",
            Self::Minus => "Minus",
            Self::Star => "Multiply",
            Self::Slash => "Divide",
            Self::Percent => "Remainder",
            Self::StarStar => "Exponentiation",
            Self::Ampersand => "And",
            Self::Pipe => "Or",
            Self::Caret => "Xor",
            Self::Tilde => "Not",
            Self::ShiftLeft => "LeftShift",
            Self::ShiftRight => "SignedRightShift",
            Self::ShiftRightZero => "ZeroFillRightShift",
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::Greater => "GreaterThan",
            Self::GreaterEqual => "GreaterThanOrEqual",
            Self::Less => "LessThan",
            Self::LessEqual => "LessThanOrEqual",
            Self::AndAnd => "LogicalAnd",
            Self::OrOr => "LogicalOr",
            Self::Bang => "LogicalNot",
            Self::Comma => "Comma",
            Self::Hash => "Hash",
            Self::LParen => "LeftParenthesis",
            Self::RParen => "RightParenthesis",
            Self::Question => "QuestionMark",
            Self::Colon => "Colon",
            Self::Comment => "Comment",
            Self::Newline => "NewLine",
            Self::Eof => "EndOfFile",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Literal payload carried by identifiers, numbers and comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValue {
    Text(String),
    Number(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub value: Option<TokenValue>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span, value: None }
    }

    pub fn with_value(kind: TokenKind, span: Span, value: TokenValue) -> Self {
        Self { kind, span, value: Some(value) }
    }

    /// Identifier name or comment text.
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            Some(TokenValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn number(&self) -> Option<i64> {
        match self.value {
            Some(TokenValue::Number(n)) => Some(n),
            _ => None,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
