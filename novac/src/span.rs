#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub start: usize,
    pub end: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            line: 1,
            column: 1,
            start: 0,
            end: 0,
        }
    }
}

impl Span {
    pub fn new(line: usize, column: usize, start: usize, end: usize) -> Self {
        Self { line, column, start, end }
    }

    /// Span that begins where `self` begins and stops at byte offset `end`.
    pub fn until(self, end: usize) -> Self {
        Self { end, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn until_keeps_the_first_position() {
        let first = Span::new(2, 5, 10, 12);
        assert_eq!(first.until(17), Span::new(2, 5, 10, 17));
        assert_eq!(Span::default(), Span::new(1, 1, 0, 0));
    }
}
