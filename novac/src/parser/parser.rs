use std::mem;

use tracing::debug;

use crate::error::CompileError;
use crate::ir::ast::{
    ArgumentIdentifier, AssignOperator, AssignmentStatement, BinaryExpression, BinaryOperator, CallExpression,
    Expression, FunctionDefinition, FunctionParameter, IdentifierLiteral, NumberLiteral, Operator,
    ParenthesizedExpression, Program, Statement, Symbol, TernaryExpression, TernaryMark, UnaryExpression,
    UnaryOperator, VariableDefinition,
};
use crate::ir::{Action, NodeMut, visit};
use crate::span::Span;

use super::Mode;
use super::lexer::Lexer;
use super::token::{Token, TokenKind};

type Parsed<T> = Result<Option<T>, CompileError>;

const UNARY_OPERATORS: &[TokenKind] = &[TokenKind::Plus, TokenKind::Minus, TokenKind::Bang, TokenKind::Tilde];

/// Binary levels, loosest first. `**` is handled on its own, it folds right.
const BINARY_LEVELS: &[&[TokenKind]] = &[
    &[TokenKind::OrOr],
    &[TokenKind::AndAnd],
    &[TokenKind::Pipe],
    &[TokenKind::Caret],
    &[TokenKind::Ampersand],
    &[TokenKind::Equal, TokenKind::NotEqual],
    &[TokenKind::Greater, TokenKind::GreaterEqual, TokenKind::Less, TokenKind::LessEqual],
    &[TokenKind::ShiftLeft, TokenKind::ShiftRight, TokenKind::ShiftRightZero],
    &[TokenKind::Plus, TokenKind::Minus],
    &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
];

/// Groups, call arguments, ternary branches, prefixes and `**` operands
/// deeper than this are rejected instead of exhausting the stack.
pub const MAX_NESTING: usize = 32;

pub fn parse_source(source: &str, mode: Mode) -> Result<Program, CompileError> {
    Parser::new(source).parse(mode)
}

/// Everything needed to undo a speculative parse.
#[derive(Debug, Clone, Copy)]
struct Mark {
    position: usize,
    comments: usize,
}

pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    // zero-width span right after each token
    ends: Vec<Span>,
    position: usize,
    depth: usize,
    // comments met while skipping line breaks, waiting to become statements
    comments: Vec<Statement>,
    mode: Mode,
    eof: Token,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            ends: Vec::new(),
            position: 0,
            depth: 0,
            comments: Vec::new(),
            mode: Mode::Strict,
            eof: Token::new(TokenKind::Eof, Span::default()),
        }
    }

    /// Strict mode fails on the first grammar violation. Lenient mode never
    /// fails and returns whatever could be assembled.
    pub fn parse(&mut self, mode: Mode) -> Result<Program, CompileError> {
        self.mode = mode;

        let program = match (self.reset().and_then(|()| self.program()), mode) {
            (Ok(program), _) => program,
            (Err(err), Mode::Strict) => return Err(err),
            (Err(err), Mode::Lenient) => {
                debug!(error = %err, "lenient parse aborted");
                Program::default()
            }
        };
        debug!(statements = program.statements.len(), ?mode, "parsed program");
        Ok(program)
    }

    fn reset(&mut self) -> Result<(), CompileError> {
        let mut lexer = Lexer::new(self.source).with_mode(self.mode);
        self.tokens.clear();
        self.ends.clear();
        loop {
            let token = lexer.next()?;
            self.ends.push(lexer.location());
            if token.is(TokenKind::Eof) {
                self.eof = token;
                break;
            }
            self.tokens.push(token);
        }
        self.tokens.push(self.eof.clone());

        self.position = 0;
        self.depth = 0;
        self.comments.clear();
        Ok(())
    }

    fn mark(&self) -> Mark {
        Mark {
            position: self.position,
            comments: self.comments.len(),
        }
    }

    fn rollback(&mut self, mark: Mark) {
        self.position = mark.position;
        self.comments.truncate(mark.comments);
    }

    fn program(&mut self) -> Result<Program, CompileError> {
        let mut statements = Vec::new();
        let start = self.location();
        let mut end = None;
        let mut last: Option<Statement> = None;

        loop {
            if self.skip_comments() > 0 {
                statements.append(&mut self.comments);
            }
            if let Some(statement) = last.take() {
                statements.push(statement);
            }
            if self.is_at_end() {
                break;
            }
            if !statements.is_empty() && !self.match_kind(TokenKind::Newline) {
                self.error("'\\n' was expected.")?;
            }

            self.separator(&mut statements);
            if self.is_at_end() {
                break;
            }

            match self.statement()? {
                Some(statement) => {
                    statements.append(&mut self.comments);
                    end = statement.span().map(|span| span.end);
                    last = Some(statement);
                }
                None => self.comments.clear(),
            }
        }
        statements.append(&mut self.comments);
        if let Some(statement) = last {
            statements.push(statement);
        }

        bind_arguments(&mut statements)?;

        let end = end.unwrap_or(self.location().end);
        Ok(Program::new(statements).with_span(start.until(end)))
    }

    /// Line breaks and comments between two statements, in source order.
    /// The break that ends a comment line is not a blank line.
    fn separator(&mut self, statements: &mut Vec<Statement>) {
        let mut blank_lines = 0;
        let mut start = self.location();
        let mut after_comment = false;
        loop {
            let before = self.location();
            if self.match_kind(TokenKind::Newline) {
                if !after_comment {
                    if blank_lines == 0 {
                        start = before;
                    }
                    blank_lines += 1;
                }
                after_comment = false;
            } else if self.match_kind(TokenKind::Comment) {
                push_blank_lines(statements, blank_lines, start.until(before.end));
                blank_lines = 0;
                statements.push(self.comment_statement());
                after_comment = true;
            } else {
                break;
            }
        }
        push_blank_lines(statements, blank_lines, start.until(self.location().end));
    }

    fn statement(&mut self) -> Parsed<Statement> {
        self.skip_newlines();
        let Some(symbol) = self.symbol()? else {
            return Ok(None);
        };
        let start = symbol.span().unwrap_or_else(|| self.location());

        self.skip_newlines();
        let operator = if self.match_kind(TokenKind::Assign) {
            Operator::at(AssignOperator, self.previous().span)
        } else {
            self.error("'=' was expected.")?;
            Operator::new(AssignOperator)
        };

        self.skip_newlines();
        let Some(expression) = self.expression()? else {
            self.error("End of input.")?;
            return Ok(None);
        };
        let end = expression.span().map_or(self.location().end, |span| span.end);

        Ok(Some(Statement::Assignment(AssignmentStatement {
            symbol,
            operator,
            expression,
            span: Some(start.until(end)),
        })))
    }

    fn symbol(&mut self) -> Parsed<Symbol> {
        self.skip_newlines();
        let start = self.current().span;

        if !self.match_kind(TokenKind::Identifier) {
            self.advance();
            self.error_at(start, "Symbol expected.")?;
            return Ok(None);
        }
        let name = self.previous_text();

        let mark = self.mark();
        self.skip_newlines();
        if !self.match_kind(TokenKind::LParen) {
            self.rollback(mark);
            let span = Some(start.until(self.location().end));
            return Ok(Some(Symbol::Variable(VariableDefinition { name, span })));
        }

        let mut params = Vec::new();
        loop {
            self.skip_newlines();
            if self.match_kind(TokenKind::RParen) {
                break;
            }
            let before = self.position;
            if self.is_at_end() {
                self.error("Expect ')' after expression.")?;
            }

            let mut failed = false;
            self.skip_newlines();
            if !params.is_empty() && !self.match_kind(TokenKind::Comma) {
                self.error("Expect ',' after argument.")?;
                failed = true;
            }
            self.skip_newlines();
            if self.match_kind(TokenKind::Identifier) {
                params.push(FunctionParameter {
                    name: self.previous_text(),
                    span: Some(self.previous().span),
                });
            } else {
                let found = self.current().kind;
                self.error(&format!("Identifier expected but got '{}'", found))?;
                failed = true;
            }
            // lenient mode: give up once a broken parameter list stops consuming input
            if failed && self.position == before {
                return Ok(None);
            }
        }

        let span = Some(start.until(self.location().end));
        Ok(Some(Symbol::Function(FunctionDefinition { name, params, span })))
    }

    fn expression(&mut self) -> Parsed<Expression> {
        self.nested(|parser| {
            parser.skip_newlines();
            parser.ternary()
        })
    }

    // The condition stops at logical-or so that nested `?:` only ever
    // nests through the branches.
    fn ternary(&mut self) -> Parsed<Expression> {
        let mark = self.mark();
        self.skip_newlines();
        if self.is_at_end() {
            return Ok(None);
        }
        let start = self.current().span;
        let Some(condition) = self.binary(0)? else {
            self.rollback(mark);
            return Ok(None);
        };

        let mark = self.mark();
        self.skip_newlines();
        if !self.match_kind(TokenKind::Question) {
            self.rollback(mark);
            return Ok(Some(condition));
        }
        let question = Operator::at(TernaryMark::Question, self.previous().span);

        let mark = self.mark();
        self.skip_newlines();
        let Some(then_expr) = self.expression()? else {
            self.rollback(mark);
            return Ok(None);
        };
        self.skip_newlines();
        if !self.match_kind(TokenKind::Colon) {
            self.error("Incomplete ternary operator, ':' was expected.")?;
            self.rollback(mark);
            return Ok(Some(condition));
        }
        let colon = Operator::at(TernaryMark::Colon, self.previous().span);

        let mark = self.mark();
        self.skip_newlines();
        let Some(else_expr) = self.expression()? else {
            self.rollback(mark);
            return Ok(None);
        };

        Ok(Some(Expression::Ternary(TernaryExpression {
            condition: Box::new(condition),
            question,
            then_expr: Box::new(then_expr),
            colon,
            else_expr: Box::new(else_expr),
            span: Some(start.until(self.previous().span.end)),
        })))
    }

    /// Left-associative fold of every binary level from `level` down to the
    /// tightest one. Line breaks before an operator are only consumed when
    /// an operator of a wanted level actually follows them.
    fn binary(&mut self, level: usize) -> Parsed<Expression> {
        if self.is_at_end() {
            return Ok(None);
        }
        self.skip_newlines();
        let start = self.current().span;
        let Some(mut left) = self.exponentiation()? else {
            return Ok(None);
        };

        loop {
            let mark = self.mark();
            self.skip_newlines();
            let Some((found, operator)) = self.match_level(level) else {
                self.rollback(mark);
                break;
            };
            self.skip_newlines();
            // the right operand takes everything that binds tighter
            let Some(right) = self.binary(found + 1)? else {
                return Ok(None);
            };
            let end = right.span().map_or(self.location().end, |span| span.end);
            left = Expression::Binary(BinaryExpression {
                left: Box::new(left),
                operator,
                right: Box::new(right),
                span: Some(start.until(end)),
            });
        }

        Ok(Some(left))
    }

    // `**` folds to the right: 2 ** 3 ** 2 == 2 ** (3 ** 2)
    fn exponentiation(&mut self) -> Parsed<Expression> {
        if self.is_at_end() {
            return Ok(None);
        }
        self.skip_newlines();
        let start = self.current().span;
        let Some(base) = self.prefix()? else {
            return Ok(None);
        };

        let mark = self.mark();
        self.skip_newlines();
        let Some(operator) = self.match_binary(&[TokenKind::StarStar]) else {
            self.rollback(mark);
            return Ok(Some(base));
        };
        self.skip_newlines();
        let Some(exponent) = self.nested(Self::exponentiation)? else {
            return Ok(None);
        };
        let end = exponent.span().map_or(self.location().end, |span| span.end);

        Ok(Some(Expression::Binary(BinaryExpression {
            left: Box::new(base),
            operator,
            right: Box::new(exponent),
            span: Some(start.until(end)),
        })))
    }

    fn prefix(&mut self) -> Parsed<Expression> {
        if self.is_at_end() {
            return Ok(None);
        }
        self.skip_newlines();
        let start = self.current().span;

        if let Some(operator) = self.match_unary() {
            self.skip_newlines();
            let Some(operand) = self.nested(Self::prefix)? else {
                return Ok(None);
            };
            let end = operand.span().map_or(self.location().end, |span| span.end);
            return Ok(Some(Expression::Unary(UnaryExpression {
                operator,
                operand: Box::new(operand),
                span: Some(start.until(end)),
            })));
        }

        self.skip_newlines();
        self.primary()
    }

    fn primary(&mut self) -> Parsed<Expression> {
        self.skip_newlines();
        let start = self.current().span;

        if self.check(TokenKind::Identifier) || self.check(TokenKind::Hash) {
            let is_global = self.match_kind(TokenKind::Hash);
            if !self.match_kind(TokenKind::Identifier) {
                self.error("Expect an identifier after '#'.")?;
                return Ok(None);
            }
            let callee = IdentifierLiteral {
                name: self.previous_text(),
                is_global,
                span: Some(start.until(self.previous().span.end)),
            };

            let mark = self.mark();
            self.skip_newlines();
            if !self.match_kind(TokenKind::LParen) {
                self.rollback(mark);
                return Ok(Some(Expression::Identifier(callee)));
            }
            let Some(args) = self.arguments()? else {
                return Ok(None);
            };
            return Ok(Some(Expression::Call(CallExpression {
                callee,
                args,
                span: Some(start.until(self.previous().span.end)),
            })));
        }

        if self.match_kind(TokenKind::Number) {
            let value = self.previous().number().unwrap_or_default();
            return Ok(Some(Expression::Number(NumberLiteral {
                value,
                span: Some(start.until(self.previous().span.end)),
            })));
        }

        if self.match_kind(TokenKind::LParen) {
            self.skip_newlines();
            let Some(inner) = self.expression()? else {
                return Ok(None);
            };
            self.skip_newlines();
            if !self.match_kind(TokenKind::RParen) {
                self.error("Expect ')' after expression.")?;
            }
            return Ok(Some(Expression::Parenthesized(ParenthesizedExpression {
                inner: Box::new(inner),
                span: Some(start.until(self.previous().span.end)),
            })));
        }

        let token = self.current().clone();
        self.advance();
        self.error_at(
            token.span,
            &format!(
                "Unexpected token: '{}' at line={}, column={}",
                token.kind, token.span.line, token.span.column
            ),
        )?;
        Ok(None)
    }

    /// Call arguments after the opening parenthesis, up to and including `)`.
    fn arguments(&mut self) -> Parsed<Vec<Expression>> {
        let mut args = Vec::new();
        self.skip_newlines();
        loop {
            if self.is_at_end() {
                self.error("Expect ')' after expression.")?;
            }
            self.skip_newlines();
            if self.match_kind(TokenKind::RParen) {
                return Ok(Some(args));
            }
            self.skip_newlines();
            if !args.is_empty() && !self.match_kind(TokenKind::Comma) {
                self.error("Expect ',' after argument.")?;
            }
            self.skip_newlines();
            let Some(arg) = self.expression()? else {
                return Ok(None);
            };
            args.push(arg);
        }
    }

    /// Runs `parse` one nesting level deeper, or reports the expression as
    /// too deep once `MAX_NESTING` is reached.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Parsed<T>) -> Parsed<T> {
        if self.depth >= MAX_NESTING {
            self.error(&format!("Expression nested deeper than {} levels.", MAX_NESTING))?;
            return Ok(None);
        }
        self.depth += 1;
        let parsed = parse(self);
        self.depth -= 1;
        parsed
    }

    // Вспомогательные методы

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.eof)
    }

    fn previous(&self) -> &Token {
        self.position
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .unwrap_or(&self.eof)
    }

    /// Zero-width span right after the last consumed token.
    fn location(&self) -> Span {
        self.position
            .checked_sub(1)
            .and_then(|index| self.ends.get(index))
            .copied()
            .unwrap_or_default()
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.current().kind == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// An operator of `level` or of any tighter level, with the level it belongs to.
    fn match_level(&mut self, level: usize) -> Option<(usize, Operator<BinaryOperator>)> {
        let kind = self.current().kind;
        let found = BINARY_LEVELS
            .iter()
            .enumerate()
            .skip(level)
            .find_map(|(index, operators)| operators.contains(&kind).then_some(index))?;
        let operator = self.match_binary(BINARY_LEVELS[found])?;
        Some((found, operator))
    }

    fn match_binary(&mut self, operators: &[TokenKind]) -> Option<Operator<BinaryOperator>> {
        if self.is_at_end() || !operators.contains(&self.current().kind) {
            return None;
        }
        let sign = BinaryOperator::from_token(self.current().kind)?;
        self.advance();
        Some(Operator::at(sign, self.previous().span))
    }

    fn match_unary(&mut self) -> Option<Operator<UnaryOperator>> {
        if self.is_at_end() || !UNARY_OPERATORS.contains(&self.current().kind) {
            return None;
        }
        let sign = UnaryOperator::from_token(self.current().kind)?;
        self.advance();
        Some(Operator::at(sign, self.previous().span))
    }

    /// Skips line breaks and comments, buffering the comments.
    fn skip_newlines(&mut self) {
        loop {
            if self.match_kind(TokenKind::Comment) {
                self.buffer_comment();
            } else if !self.match_kind(TokenKind::Newline) {
                return;
            }
        }
    }

    fn skip_comments(&mut self) -> usize {
        let mut count = 0;
        while self.match_kind(TokenKind::Comment) {
            self.buffer_comment();
            count += 1;
        }
        count
    }

    fn buffer_comment(&mut self) {
        let comment = self.comment_statement();
        self.comments.push(comment);
    }

    fn comment_statement(&self) -> Statement {
        Statement::Comment {
            text: self.previous_text(),
            span: Some(self.previous().span),
        }
    }

    fn previous_text(&self) -> String {
        self.previous().text().unwrap_or_default().to_string()
    }

    fn is_at_end(&self) -> bool {
        self.current().is(TokenKind::Eof)
    }

    fn error(&mut self, message: &str) -> Result<(), CompileError> {
        let span = self.current().span;
        self.error_at(span, message)
    }

    fn error_at(&mut self, span: Span, message: &str) -> Result<(), CompileError> {
        if self.mode == Mode::Strict {
            return Err(CompileError::Syntax {
                line: span.line,
                column: span.column,
                message: message.to_string(),
            });
        }
        debug!(line = span.line, column = span.column, message, "recovering from syntax error");
        while self.match_kind(TokenKind::Unknown) {}
        Ok(())
    }
}

fn push_blank_lines(statements: &mut Vec<Statement>, blank_lines: usize, span: Span) {
    if blank_lines > 0 {
        statements.push(Statement::Empty {
            blank_lines,
            span: Some(span),
        });
    }
}

/// Inside a function body, plain references to the function's own
/// parameters become `ArgumentIdentifier`s. `#name` stays global.
fn bind_arguments(statements: &mut [Statement]) -> Result<(), CompileError> {
    for statement in statements.iter_mut() {
        let Statement::Assignment(assignment) = statement else {
            continue;
        };
        let Symbol::Function(function) = &assignment.symbol else {
            continue;
        };
        visit(NodeMut::Expression(&mut assignment.expression), &mut |node, _| {
            if let NodeMut::Expression(expression) = node {
                if let Expression::Identifier(ident) = expression {
                    if !ident.is_global && function.has_param(&ident.name) {
                        let name = mem::take(&mut ident.name);
                        let span = ident.span;
                        *expression = Expression::Argument(ArgumentIdentifier { name, span });
                    }
                }
            }
            Ok(Action::Keep)
        })?;
    }
    Ok(())
}
