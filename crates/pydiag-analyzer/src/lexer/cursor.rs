use pydiag_common::{Position, Span};

/// Low-level character reader over source text.
///
/// Tracks current position (line, column, byte offset) and provides
/// peek/advance primitives for the lexer. `\r\n` and lone `\r` both count
/// as one line break.
#[derive(Clone)]
pub struct Cursor<'src> {
    source: &'src str,
    chars: std::str::Chars<'src>,
    /// Byte offset of the *next* character to be consumed.
    offset: u32,
    line: u32,
    column: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars(),
            offset: 0,
            line: 1,
            column: 0,
        }
    }

    /// Current position in the source.
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    /// Peek at the next character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// Peek at the character after the next one.
    pub fn peek_second(&self) -> Option<char> {
        self.peek_nth(1)
    }

    /// Peek `n` characters ahead (`0` is the next character).
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n)
    }

    /// Consume and return the next character.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.offset += ch.len_utf8() as u32;
        match ch {
            '\n' => self.new_line(),
            '\r' => {
                if self.peek() != Some('\n') {
                    self.new_line();
                }
            }
            _ => self.column += 1,
        }
        Some(ch)
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.column = 0;
    }

    /// Consume the next character if it matches `expected`.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a line break (`\n`, `\r\n` or `\r`) if one is next.
    pub fn eat_newline(&mut self) -> bool {
        match self.peek() {
            Some('\n') => {
                self.advance();
                true
            }
            Some('\r') => {
                self.advance();
                self.eat('\n');
                true
            }
            _ => false,
        }
    }

    /// True if there are no more characters.
    pub fn is_eof(&self) -> bool {
        self.peek().is_none()
    }

    /// Slice the source from byte offset `start` to `end`.
    pub fn slice(&self, start: u32, end: u32) -> &'src str {
        &self.source[start as usize..end as usize]
    }

    /// Slice the source from byte offset `start` to the current offset.
    pub fn slice_from(&self, start: u32) -> &'src str {
        self.slice(start, self.offset)
    }

    /// Build a Span from a start position to the current position.
    pub fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.position())
    }

    /// Consume characters while `predicate` returns true.
    pub fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if predicate(ch) {
                self.advance();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.position(), Position::new(1, 2, 2));
        cursor.advance();
        assert_eq!(cursor.position(), Position::new(2, 0, 3));
    }

    #[test]
    fn crlf_is_one_line_break() {
        let mut cursor = Cursor::new("a\r\nb\rc");
        cursor.advance();
        assert!(cursor.eat_newline());
        assert_eq!(cursor.position(), Position::new(2, 0, 3));
        cursor.advance();
        assert!(cursor.eat_newline());
        assert_eq!(cursor.position(), Position::new(3, 0, 5));
    }

    #[test]
    fn columns_count_characters() {
        let mut cursor = Cursor::new("é=1");
        cursor.advance();
        let pos = cursor.position();
        assert_eq!(pos.column, 1);
        assert_eq!(pos.offset, 2);
    }
}
