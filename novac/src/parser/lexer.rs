use crate::error::CompileError;
use crate::span::Span;

use super::Mode;
use super::token::{Token, TokenKind, TokenValue};

/// Cursor position that the lexer can be rewound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Checkpoint {
    offset: usize,
    line: usize,
    column: usize,
    current: Option<char>,
}

pub struct Lexer<'src> {
    source: &'src str,
    offset: usize,
    line: usize,
    column: usize,
    current: Option<char>,
    saved: Vec<Checkpoint>,
    mode: Mode,
}

/// Drains the whole source in strict mode, including the trailing `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    Lexer::new(source).tokenize()
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
            current: source.chars().next(),
            saved: Vec::new(),
            mode: Mode::Strict,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            offset: self.offset,
            line: self.line,
            column: self.column,
            current: self.current,
        }
    }

    fn rewind(&mut self, checkpoint: Checkpoint) {
        self.offset = checkpoint.offset;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
        self.current = checkpoint.current;
    }

    /// Zero-width span at the cursor, i.e. right after the last token pulled.
    pub fn location(&self) -> Span {
        Span::new(self.line, self.column, self.offset, self.offset)
    }

    pub fn save(&mut self) {
        let checkpoint = self.checkpoint();
        self.saved.push(checkpoint);
    }

    /// Pops the last checkpoint and moves the cursor back to it.
    pub fn restore(&mut self) -> Result<(), CompileError> {
        let checkpoint = self
            .saved
            .pop()
            .ok_or(CompileError::CheckpointUnderflow { component: "Lexer" })?;
        self.rewind(checkpoint);
        Ok(())
    }

    /// Pops the last checkpoint, keeping the cursor where it is.
    pub fn unsave(&mut self) -> Result<(), CompileError> {
        self.saved
            .pop()
            .map(|_| ())
            .ok_or(CompileError::CheckpointUnderflow { component: "Lexer" })
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next()?;
            let done = token.is(TokenKind::Eof);
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    pub fn next(&mut self) -> Result<Token, CompileError> {
        while let Some(ch) = self.current {
            if is_blank(ch) {
                self.skip_whitespace();
                continue;
            }

            let (line, column, start) = (self.line, self.column, self.offset);

            if is_alpha(ch) {
                let mut ident = String::new();
                while let Some(c) = self.current.filter(|c| is_alpha(*c)) {
                    ident.push(c);
                    self.advance();
                }
                let span = Span::new(line, column, start, self.offset);
                return Ok(Token::with_value(TokenKind::Identifier, span, TokenValue::Text(ident)));
            }

            if ch.is_ascii_digit() {
                return self.number(line, column, start);
            }

            if ch == ';' {
                return Ok(self.comment(line, column, start));
            }

            let kind = match ch {
                '=' => self.either('=', TokenKind::Equal, TokenKind::Assign),
                '*' => self.either('*', TokenKind::StarStar, TokenKind::Star),
                '&' => self.either('&', TokenKind::AndAnd, TokenKind::Ampersand),
                '|' => self.either('|', TokenKind::OrOr, TokenKind::Pipe),
                '!' => self.either('=', TokenKind::NotEqual, TokenKind::Bang),
                '>' => {
                    self.advance();
                    if self.eat('>') {
                        if self.eat('>') {
                            TokenKind::ShiftRightZero
                        } else {
                            TokenKind::ShiftRight
                        }
                    } else if self.eat('=') {
                        TokenKind::GreaterEqual
                    } else {
                        TokenKind::Greater
                    }
                }
                '<' => {
                    self.advance();
                    if self.eat('<') {
                        TokenKind::ShiftLeft
                    } else if self.eat('=') {
                        TokenKind::LessEqual
                    } else {
                        TokenKind::Less
                    }
                }
                // "\r\n" and a lone "\r" both count as one line break
                '\r' => self.either('\n', TokenKind::Newline, TokenKind::Newline),
                _ => match single_char_kind(ch) {
                    Some(kind) => {
                        self.advance();
                        kind
                    }
                    None => return self.invalid(ch, line, column, start),
                },
            };
            return Ok(Token::new(kind, Span::new(line, column, start, self.offset)));
        }

        Ok(Token::new(
            TokenKind::Eof,
            Span::new(self.line, self.column, self.offset, self.offset),
        ))
    }

    fn number(&mut self, line: usize, column: usize, start: usize) -> Result<Token, CompileError> {
        while self.current.is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let span = Span::new(line, column, start, self.offset);
        match self.source[start..self.offset].parse::<i64>() {
            Ok(value) => Ok(Token::with_value(TokenKind::Number, span, TokenValue::Number(value))),
            Err(_) if self.mode == Mode::Lenient => Ok(Token::new(TokenKind::Unknown, span)),
            Err(_) => Err(CompileError::LiteralOverflow {
                text: self.source[start..self.offset].to_string(),
                line,
                column,
            }),
        }
    }

    // `; text` -> "text": the marker, one leading space and any '\r' are dropped
    fn comment(&mut self, line: usize, column: usize, start: usize) -> Token {
        let mut text = String::new();
        let mut n = 0;
        while let Some(c) = self.current.filter(|c| *c != '\n') {
            if c != '\r' && n > 0 && (n != 1 || c != ' ') {
                text.push(c);
            }
            self.advance();
            n += 1;
        }
        let span = Span::new(line, column, start, self.offset);
        Token::with_value(TokenKind::Comment, span, TokenValue::Text(text))
    }

    fn invalid(&mut self, character: char, line: usize, column: usize, start: usize) -> Result<Token, CompileError> {
        match self.mode {
            Mode::Lenient => {
                self.advance();
                Ok(Token::new(TokenKind::Unknown, Span::new(line, column, start, self.offset)))
            }
            Mode::Strict => Err(CompileError::Lex { character, line, column }),
        }
    }

    fn advance(&mut self) {
        let Some(ch) = self.current else { return };
        self.offset += ch.len_utf8();
        self.column += 1;
        self.current = self.source[self.offset..].chars().next();
        if ch == '\n' || (ch == '\r' && self.current != Some('\n')) {
            self.column = 1;
            self.line += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.current == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the current char, then `next` too if it follows.
    fn either(&mut self, next: char, double: TokenKind, single: TokenKind) -> TokenKind {
        self.advance();
        if self.eat(next) { double } else { single }
    }

    fn skip_whitespace(&mut self) {
        while self.current.is_some_and(is_blank) {
            self.advance();
        }
    }
}

fn single_char_kind(ch: char) -> Option<TokenKind> {
    let kind = match ch {
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        ',' => TokenKind::Comma,
        '~' => TokenKind::Tilde,
        '^' => TokenKind::Caret,
        '?' => TokenKind::Question,
        ':' => TokenKind::Colon,
        '#' => TokenKind::Hash,
        '\n' => TokenKind::Newline,
        _ => return None,
    };
    Some(kind)
}

fn is_alpha(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

// whitespace other than line breaks
fn is_blank(ch: char) -> bool {
    ch.is_whitespace() && ch != '\n' && ch != '\r'
}
