use crate::parser::token::TokenKind;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// x = 2 + 8, max(a, b) = a > b ? a : b
    Assignment(AssignmentStatement),
    /// Run of blank lines between two statements
    Empty {
        blank_lines: usize,
        span: Option<Span>,
    },
    /// ; comment
    Comment {
        text: String,
        span: Option<Span>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentStatement {
    pub symbol: Symbol,
    pub operator: Operator<AssignOperator>,
    pub expression: Expression,
    pub span: Option<Span>,
}

/// Left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Variable(VariableDefinition),
    Function(FunctionDefinition),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub params: Vec<FunctionParameter>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameter {
    pub name: String,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// foo, #foo
    Identifier(IdentifierLiteral),
    /// Reference to a parameter of the enclosing function definition
    Argument(ArgumentIdentifier),
    /// 42
    Number(NumberLiteral),
    /// a + b
    Binary(BinaryExpression),
    /// -a, ~a, !a
    Unary(UnaryExpression),
    /// (a)
    Parenthesized(ParenthesizedExpression),
    /// max(a, b)
    Call(CallExpression),
    /// c ? a : b
    Ternary(TernaryExpression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierLiteral {
    pub name: String,
    pub is_global: bool,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentIdentifier {
    pub name: String,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub value: i64,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub left: Box<Expression>,
    pub operator: Operator<BinaryOperator>,
    pub right: Box<Expression>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: Operator<UnaryOperator>,
    pub operand: Box<Expression>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenthesizedExpression {
    pub inner: Box<Expression>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub callee: IdentifierLiteral,
    pub args: Vec<Expression>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TernaryExpression {
    pub condition: Box<Expression>,
    pub question: Operator<TernaryMark>,
    pub then_expr: Box<Expression>,
    pub colon: Operator<TernaryMark>,
    pub else_expr: Box<Expression>,
    pub span: Option<Span>,
}

/// Operator sign together with the place it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator<T> {
    pub sign: T,
    pub span: Option<Span>,
}

pub trait Glyph {
    fn glyph(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinaryOperator {
    Add,            // +
    Subtract,       // -
    Multiply,       // *
    Divide,         // /
    Remainder,      // %
    Power,          // **
    And,            // &
    Or,             // |
    Xor,            // ^
    ShiftLeft,      // <<
    ShiftRight,     // >>
    ShiftRightZero, // >>>
    LogicalAnd,     // &&
    LogicalOr,      // ||
    Equal,          // ==
    NotEqual,       // !=
    Greater,        // >
    GreaterEqual,   // >=
    Less,           // <
    LessEqual,      // <=
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,       // +
    Negate,     // -
    Not,        // ~
    LogicalNot, // !
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssignOperator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TernaryMark {
    Question,
    Colon,
}

impl BinaryOperator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Plus => Self::Add,
            TokenKind::Minus => Self::Subtract,
            TokenKind::Star => Self::Multiply,
            TokenKind::Slash => Self::Divide,
            TokenKind::Percent => Self::Remainder,
            TokenKind::StarStar => Self::Power,
            TokenKind::Ampersand => Self::And,
            TokenKind::Pipe => Self::Or,
            TokenKind::Caret => Self::Xor,
            TokenKind::ShiftLeft => Self::ShiftLeft,
            TokenKind::ShiftRight => Self::ShiftRight,
            TokenKind::ShiftRightZero => Self::ShiftRightZero,
            TokenKind::AndAnd => Self::LogicalAnd,
            TokenKind::OrOr => Self::LogicalOr,
            TokenKind::Equal => Self::Equal,
            TokenKind::NotEqual => Self::NotEqual,
            TokenKind::Greater => Self::Greater,
            TokenKind::GreaterEqual => Self::GreaterEqual,
            TokenKind::Less => Self::Less,
            TokenKind::LessEqual => Self::LessEqual,
            _ => return None,
        };
        Some(op)
    }

    /// Name of the token the operator is written with.
    pub fn token_name(&self) -> &'static str {
        let kind = match self {
            Self::Add => TokenKind::Plus,
            Self::Subtract => TokenKind::Minus,
            Self::Multiply => TokenKind::Star,
            Self::Divide => TokenKind::Slash,
            Self::Remainder => TokenKind::Percent,
            Self::Power => TokenKind::StarStar,
            Self::And => TokenKind::Ampersand,
            Self::Or => TokenKind::Pipe,
            Self::Xor => TokenKind::Caret,
            Self::ShiftLeft => TokenKind::ShiftLeft,
            Self::ShiftRight => TokenKind::ShiftRight,
            Self::ShiftRightZero => TokenKind::ShiftRightZero,
            Self::LogicalAnd => TokenKind::AndAnd,
            Self::LogicalOr => TokenKind::OrOr,
            Self::Equal => TokenKind::Equal,
            Self::NotEqual => TokenKind::NotEqual,
            Self::Greater => TokenKind::Greater,
            Self::GreaterEqual => TokenKind::GreaterEqual,
            Self::Less => TokenKind::Less,
            Self::LessEqual => TokenKind::LessEqual,
        };
        kind.name()
    }
}

impl Glyph for BinaryOperator {
    fn glyph(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Remainder => "%",
            Self::Power => "**",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::ShiftRightZero => ">>>",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::LessEqual => "<=",
        }
    }
}

impl UnaryOperator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(Self::Plus),
            TokenKind::Minus => Some(Self::Negate),
            TokenKind::Tilde => Some(Self::Not),
            TokenKind::Bang => Some(Self::LogicalNot),
            _ => None,
        }
    }
}

impl Glyph for UnaryOperator {
    fn glyph(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Negate => "-",
            Self::Not => "~",
            Self::LogicalNot => "!",
        }
    }
}

impl Glyph for AssignOperator {
    fn glyph(&self) -> &'static str {
        "="
    }
}

impl Glyph for TernaryMark {
    fn glyph(&self) -> &'static str {
        match self {
            Self::Question => "?",
            Self::Colon => ":",
        }
    }
}

impl<T: Glyph> Operator<T> {
    pub fn new(sign: T) -> Self {
        Self { sign, span: None }
    }

    pub fn at(sign: T, span: Span) -> Self {
        Self { sign, span: Some(span) }
    }

    pub fn glyph(&self) -> &'static str {
        self.sign.glyph()
    }
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements, span: None }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn assignments(&self) -> impl Iterator<Item = &AssignmentStatement> {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Assignment(assignment) => Some(assignment),
            _ => None,
        })
    }

    pub fn assignments_mut(&mut self) -> impl Iterator<Item = &mut AssignmentStatement> {
        self.statements.iter_mut().filter_map(|statement| match statement {
            Statement::Assignment(assignment) => Some(assignment),
            _ => None,
        })
    }
}

impl Statement {
    pub fn assign(symbol: Symbol, expression: Expression) -> Self {
        Self::Assignment(AssignmentStatement {
            symbol,
            operator: Operator::new(AssignOperator),
            expression,
            span: None,
        })
    }

    pub fn empty(blank_lines: usize) -> Self {
        Self::Empty { blank_lines, span: None }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment { text: text.into(), span: None }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Assignment(assignment) => assignment.span,
            Self::Empty { span, .. } | Self::Comment { span, .. } => *span,
        }
    }

    pub fn with_span(mut self, at: Span) -> Self {
        match &mut self {
            Self::Assignment(assignment) => assignment.span = Some(at),
            Self::Empty { span, .. } | Self::Comment { span, .. } => *span = Some(at),
        }
        self
    }
}

impl AssignmentStatement {
    pub fn function(&self) -> Option<&FunctionDefinition> {
        match &self.symbol {
            Symbol::Function(function) => Some(function),
            Symbol::Variable(_) => None,
        }
    }

    /// A statement without a source span was produced by a compiler pass.
    pub fn is_generated(&self) -> bool {
        self.span.is_none()
    }
}

impl Symbol {
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(VariableDefinition { name: name.into(), span: None })
    }

    pub fn function(name: impl Into<String>, params: &[&str]) -> Self {
        Self::Function(FunctionDefinition {
            name: name.into(),
            params: params.iter().map(|name| FunctionParameter::new(*name)).collect(),
            span: None,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Variable(variable) => &variable.name,
            Self::Function(function) => &function.name,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Variable(variable) => variable.span,
            Self::Function(function) => function.span,
        }
    }
}

impl FunctionDefinition {
    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|param| param.name == name)
    }

    pub fn param_names(&self) -> Vec<String> {
        self.params.iter().map(|param| param.name.clone()).collect()
    }
}

impl FunctionParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), span: None }
    }
}

impl IdentifierLiteral {
    pub fn new(name: impl Into<String>, is_global: bool) -> Self {
        Self { name: name.into(), is_global, span: None }
    }
}

impl Expression {
    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(IdentifierLiteral::new(name, false))
    }

    pub fn global(name: impl Into<String>) -> Self {
        Self::Identifier(IdentifierLiteral::new(name, true))
    }

    pub fn argument(name: impl Into<String>) -> Self {
        Self::Argument(ArgumentIdentifier { name: name.into(), span: None })
    }

    pub fn number(value: i64) -> Self {
        Self::Number(NumberLiteral { value, span: None })
    }

    pub fn binary(left: Expression, sign: BinaryOperator, right: Expression) -> Self {
        Self::Binary(BinaryExpression {
            left: Box::new(left),
            operator: Operator::new(sign),
            right: Box::new(right),
            span: None,
        })
    }

    pub fn unary(sign: UnaryOperator, operand: Expression) -> Self {
        Self::Unary(UnaryExpression {
            operator: Operator::new(sign),
            operand: Box::new(operand),
            span: None,
        })
    }

    pub fn group(inner: Expression) -> Self {
        Self::Parenthesized(ParenthesizedExpression { inner: Box::new(inner), span: None })
    }

    pub fn call(callee: impl Into<String>, args: Vec<Expression>) -> Self {
        Self::Call(CallExpression {
            callee: IdentifierLiteral::new(callee, false),
            args,
            span: None,
        })
    }

    pub fn ternary(condition: Expression, then_expr: Expression, else_expr: Expression) -> Self {
        Self::Ternary(TernaryExpression {
            condition: Box::new(condition),
            question: Operator::new(TernaryMark::Question),
            then_expr: Box::new(then_expr),
            colon: Operator::new(TernaryMark::Colon),
            else_expr: Box::new(else_expr),
            span: None,
        })
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Identifier(node) => node.span,
            Self::Argument(node) => node.span,
            Self::Number(node) => node.span,
            Self::Binary(node) => node.span,
            Self::Unary(node) => node.span,
            Self::Parenthesized(node) => node.span,
            Self::Call(node) => node.span,
            Self::Ternary(node) => node.span,
        }
    }

    pub fn with_span(mut self, at: Span) -> Self {
        let slot = match &mut self {
            Self::Identifier(node) => &mut node.span,
            Self::Argument(node) => &mut node.span,
            Self::Number(node) => &mut node.span,
            Self::Binary(node) => &mut node.span,
            Self::Unary(node) => &mut node.span,
            Self::Parenthesized(node) => &mut node.span,
            Self::Call(node) => &mut node.span,
            Self::Ternary(node) => &mut node.span,
        };
        *slot = Some(at);
        self
    }

    /// Literals, references, groups and calls never need extra parentheses.
    pub fn is_primary(&self) -> bool {
        matches!(
            self,
            Self::Identifier(_) | Self::Argument(_) | Self::Number(_) | Self::Parenthesized(_) | Self::Call(_)
        )
    }

    /// A primary, or a single operator applied to primaries.
    pub fn is_simple(&self) -> bool {
        match self {
            Self::Binary(binary) => binary.left.is_primary() && binary.right.is_primary(),
            Self::Unary(unary) => unary.operand.is_primary(),
            other => other.is_primary(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Identifier(_) => "IdentifierLiteral",
            Self::Argument(_) => "ArgumentIdentifier",
            Self::Number(_) => "NumberLiteral",
            Self::Binary(_) => "BinaryExpression",
            Self::Unary(_) => "UnaryExpression",
            Self::Parenthesized(_) => "ParenthesizedExpression",
            Self::Call(_) => "CallExpression",
            Self::Ternary(_) => "TernaryExpression",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_primary_and_simple_expressions() {
        let sum = Expression::binary(Expression::number(1), BinaryOperator::Add, Expression::argument("a"));
        assert!(!sum.is_primary());
        assert!(sum.is_simple());
        assert!(Expression::group(sum.clone()).is_primary());
        assert!(Expression::call("f", vec![sum.clone()]).is_primary());

        let nested = Expression::binary(sum.clone(), BinaryOperator::Multiply, Expression::number(2));
        assert!(!nested.is_simple());
        assert!(Expression::unary(UnaryOperator::Negate, Expression::global("p")).is_simple());
        assert!(!Expression::unary(UnaryOperator::Negate, sum).is_simple());
        assert!(!Expression::ternary(Expression::number(1), Expression::number(2), Expression::number(3)).is_simple());
    }

    #[test]
    fn clones_share_nothing() {
        let original = Expression::binary(Expression::identifier("x"), BinaryOperator::Add, Expression::number(1));
        let mut copy = original.clone();
        if let Expression::Binary(binary) = &mut copy {
            *binary.left = Expression::number(7);
        }
        assert_ne!(original, copy);
        assert!(matches!(&original, Expression::Binary(b) if *b.left == Expression::identifier("x")));
    }

    #[test]
    fn operator_tables_agree_with_tokens() {
        assert_eq!(BinaryOperator::from_token(TokenKind::ShiftRightZero), Some(BinaryOperator::ShiftRightZero));
        assert_eq!(BinaryOperator::GreaterEqual.token_name(), "GreaterThanOrEqual");
        assert_eq!(BinaryOperator::LogicalOr.glyph(), "||");
        assert_eq!(UnaryOperator::from_token(TokenKind::Tilde), Some(UnaryOperator::Not));
        assert_eq!(BinaryOperator::from_token(TokenKind::Comma), None);
        assert_eq!(UnaryOperator::from_token(TokenKind::Star), None);
    }

    #[test]
    fn spans_are_attached_by_constructors() {
        let span = Span::new(1, 1, 0, 3);
        assert_eq!(Expression::number(123).with_span(span).span(), Some(span));
        assert_eq!(Statement::empty(2).with_span(span).span(), Some(span));
        assert_eq!(Expression::identifier("x").span(), None);
    }
}
