use std::collections::VecDeque;

use pydiag_common::{Position, Span};

use super::cursor::Cursor;
use super::error::{LexError, LexErrorKind, NumberBase};
use super::literal::check_string_literal;
use super::token::{Token, TokenKind};

/// Deepest block nesting the lexer accepts.
pub const MAX_INDENT_LEVELS: usize = 100;
/// Deepest bracket nesting the lexer accepts.
pub const MAX_BRACKET_DEPTH: usize = 200;

/// Tab stops used when measuring indentation.
const TAB_SIZE: u32 = 8;

/// One level on the indentation stack.
///
/// `alt_width` measures the same whitespace with tabs counted as one column;
/// the two measures must agree in ordering, otherwise tabs and spaces are
/// being mixed ambiguously.
#[derive(Debug, Clone, Copy)]
struct IndentLevel {
    width: u32,
    alt_width: u32,
}

/// Everything the lexer produced for one source text.
#[derive(Debug, Clone)]
pub struct TokenStream {
    /// Tokens up to (not including) the first error.
    pub tokens: Vec<Token>,
    /// The error that stopped tokenization, if any.
    pub error: Option<LexError>,
}

/// Hand-written lazy lexer for Python source.
///
/// Produces layout tokens (`Newline`, `Nl`, `Indent`, `Dedent`, `EndMarker`)
/// the same way the reference tokenizer does, plus comments. Iterating yields
/// `Result<Token, LexError>`; the iterator is fused after the first error.
/// Creating a new `Lexer` over the same text restarts from the beginning.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    indents: Vec<IndentLevel>,
    brackets: Vec<(char, Position)>,
    pending: VecDeque<Token>,
    at_line_start: bool,
    line_has_content: bool,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            indents: vec![IndentLevel {
                width: 0,
                alt_width: 0,
            }],
            brackets: Vec::new(),
            pending: VecDeque::new(),
            at_line_start: true,
            line_has_content: false,
            finished: false,
        }
    }

    /// Tokenize the entire source, stopping at the first error.
    pub fn tokenize(self) -> TokenStream {
        let mut tokens = Vec::new();
        for item in self {
            match item {
                Ok(token) => tokens.push(token),
                Err(error) => {
                    return TokenStream {
                        tokens,
                        error: Some(error),
                    }
                }
            }
        }
        TokenStream {
            tokens,
            error: None,
        }
    }

    /// Scan the next token.
    fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            if self.at_line_start && self.brackets.is_empty() {
                self.at_line_start = false;
                if let Some(token) = self.scan_indentation()? {
                    return Ok(token);
                }
            }

            self.skip_inline_whitespace();

            let start = self.cursor.position();
            let Some(ch) = self.cursor.peek() else {
                return self.end_of_input(start);
            };

            match ch {
                '\\' => {
                    self.cursor.advance();
                    if self.cursor.eat_newline() {
                        continue;
                    }
                    if self.cursor.is_eof() {
                        return Err(self.error(LexErrorKind::UnexpectedEof, self.cursor.position()));
                    }
                    return Err(self.error(LexErrorKind::ContinuationCharacter, start));
                }
                '\n' | '\r' => {
                    self.cursor.eat_newline();
                    let kind = if self.brackets.is_empty() && self.line_has_content {
                        self.line_has_content = false;
                        TokenKind::Newline
                    } else {
                        TokenKind::Nl
                    };
                    self.at_line_start = self.brackets.is_empty();
                    return Ok(self.make_token(kind, start));
                }
                '#' => {
                    self.cursor.eat_while(|c| c != '\n' && c != '\r');
                    return Ok(self.make_token(TokenKind::Comment, start));
                }
                _ => {}
            }

            let token = self.scan_significant(start, ch)?;
            self.line_has_content = true;
            return Ok(token);
        }
    }

    /// Scan a token that belongs to a logical line.
    fn scan_significant(&mut self, start: Position, ch: char) -> Result<Token, LexError> {
        if ch == '"' || ch == '\'' {
            return self.scan_string(start);
        }
        if ch.is_ascii_digit() || (ch == '.' && self.cursor.peek_second().is_some_and(|c| c.is_ascii_digit())) {
            return self.scan_number(start);
        }
        if is_ident_start(ch) {
            return self.scan_identifier(start);
        }
        self.scan_operator(start)
    }

    // ---------------------------------------------------------------
    // Layout
    // ---------------------------------------------------------------

    /// Skip spaces, tabs and form feeds inside a line.
    fn skip_inline_whitespace(&mut self) {
        self.cursor.eat_while(|c| c == ' ' || c == '\t' || c == '\x0c');
    }

    /// Measure the indentation of a new logical line and emit `Indent` or
    /// `Dedent` tokens when it changes. Blank and comment-only lines are
    /// left alone.
    fn scan_indentation(&mut self) -> Result<Option<Token>, LexError> {
        let ws_start = self.cursor.position();
        let mut width = 0u32;
        let mut alt_width = 0u32;
        while let Some(ch) = self.cursor.peek() {
            match ch {
                ' ' => {
                    width += 1;
                    alt_width += 1;
                }
                '\t' => {
                    width = (width / TAB_SIZE + 1) * TAB_SIZE;
                    alt_width += 1;
                }
                '\x0c' => {
                    width = 0;
                    alt_width = 0;
                }
                _ => break,
            }
            self.cursor.advance();
        }

        if matches!(self.cursor.peek(), None | Some('#' | '\n' | '\r')) {
            return Ok(None);
        }

        let here = self.cursor.position();
        let top = self.current_indent();

        if width > top.width {
            if alt_width <= top.alt_width {
                return Err(self.error(LexErrorKind::TabError, here));
            }
            if self.indents.len() > MAX_INDENT_LEVELS {
                return Err(self.error(LexErrorKind::TooManyIndentLevels, here));
            }
            self.indents.push(IndentLevel { width, alt_width });
            let text = self.cursor.slice_from(ws_start.offset);
            return Ok(Some(Token::new(
                TokenKind::Indent,
                text,
                Span::new(ws_start, here),
            )));
        }

        if width < top.width {
            let mut dedents = 0usize;
            while width < self.current_indent().width {
                self.indents.pop();
                dedents += 1;
            }
            let top = self.current_indent();
            if width != top.width {
                return Err(self.error(LexErrorKind::UnindentMismatch, here));
            }
            if alt_width != top.alt_width {
                return Err(self.error(LexErrorKind::TabError, here));
            }
            for _ in 1..dedents {
                self.pending
                    .push_back(Token::new(TokenKind::Dedent, "", Span::point(here)));
            }
            return Ok(Some(Token::new(TokenKind::Dedent, "", Span::point(here))));
        }

        if alt_width != top.alt_width {
            return Err(self.error(LexErrorKind::TabError, here));
        }
        Ok(None)
    }

    fn current_indent(&self) -> IndentLevel {
        self.indents.last().copied().unwrap_or(IndentLevel {
            width: 0,
            alt_width: 0,
        })
    }

    /// Close the stream: final `Newline`, one `Dedent` per open block, `EndMarker`.
    fn end_of_input(&mut self, at: Position) -> Result<Token, LexError> {
        if let Some(&(open, position)) = self.brackets.last() {
            return Err(self.error(LexErrorKind::UnclosedBracket { open }, position));
        }

        self.finished = true;
        let point = Span::point(at);
        if self.line_has_content {
            self.line_has_content = false;
            self.pending.push_back(Token::new(TokenKind::Newline, "", point));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.pending.push_back(Token::new(TokenKind::Dedent, "", point));
        }
        self.pending.push_back(Token::new(TokenKind::EndMarker, "", point));

        // The queue was just filled, so it cannot be empty here.
        Ok(self
            .pending
            .pop_front()
            .unwrap_or_else(|| Token::new(TokenKind::EndMarker, "", point)))
    }

    // ---------------------------------------------------------------
    // Identifiers, keywords and string prefixes
    // ---------------------------------------------------------------

    fn scan_identifier(&mut self, start: Position) -> Result<Token, LexError> {
        self.cursor.eat_while(is_ident_continue);
        let lexeme = self.cursor.slice_from(start.offset);

        if is_string_prefix(lexeme) && matches!(self.cursor.peek(), Some('"' | '\'')) {
            return self.scan_string(start);
        }

        let kind = TokenKind::keyword_from_str(lexeme).unwrap_or(TokenKind::Name);
        Ok(self.make_token(kind, start))
    }

    // ---------------------------------------------------------------
    // String scanning
    // ---------------------------------------------------------------

    /// Scan a string literal whose prefix (if any) has been consumed and
    /// whose opening quote is next. A backslash protects the following
    /// character even in raw strings.
    fn scan_string(&mut self, start: Position) -> Result<Token, LexError> {
        let Some(quote) = self.cursor.advance() else {
            return Err(self.error(LexErrorKind::UnexpectedEof, start));
        };

        let triple = self.cursor.peek() == Some(quote) && self.cursor.peek_second() == Some(quote);
        if triple {
            self.cursor.advance();
            self.cursor.advance();
            return self.scan_triple_quoted(start, quote);
        }

        loop {
            match self.cursor.peek() {
                None | Some('\n' | '\r') => {
                    let kind = LexErrorKind::UnterminatedString {
                        detected_at: start.line,
                    };
                    return Err(self.error(kind, start));
                }
                Some('\\') => {
                    self.cursor.advance();
                    if !self.cursor.eat_newline() {
                        self.cursor.advance();
                    }
                }
                Some(c) => {
                    self.cursor.advance();
                    if c == quote {
                        return self.finish_string(start);
                    }
                }
            }
        }
    }

    fn scan_triple_quoted(&mut self, start: Position, quote: char) -> Result<Token, LexError> {
        loop {
            match self.cursor.advance() {
                None => {
                    let kind = LexErrorKind::UnterminatedTripleQuotedString {
                        detected_at: self.cursor.position().line,
                    };
                    return Err(self.error(kind, start));
                }
                Some('\\') => {
                    self.cursor.advance();
                }
                Some(c) if c == quote
                    && self.cursor.peek() == Some(quote)
                    && self.cursor.peek_second() == Some(quote) =>
                {
                    self.cursor.advance();
                    self.cursor.advance();
                    return self.finish_string(start);
                }
                Some(_) => {}
            }
        }
    }

    fn finish_string(&self, start: Position) -> Result<Token, LexError> {
        let token = self.make_token(TokenKind::String, start);
        check_string_literal(&token.lexeme).map_err(|kind| self.error(kind, start))?;
        Ok(token)
    }

    // ---------------------------------------------------------------
    // Number scanning
    // ---------------------------------------------------------------

    /// Scan a numeric literal: decimal/hex/octal/binary integers with
    /// underscores, floats with exponents, imaginary `j` suffixes.
    fn scan_number(&mut self, start: Position) -> Result<Token, LexError> {
        let first = self.cursor.peek().unwrap_or('0');

        if first == '0' {
            let base = match self.cursor.peek_second() {
                Some('x' | 'X') => Some((NumberBase::Hexadecimal, 16)),
                Some('o' | 'O') => Some((NumberBase::Octal, 8)),
                Some('b' | 'B') => Some((NumberBase::Binary, 2)),
                _ => None,
            };
            if let Some((base, radix)) = base {
                self.cursor.advance(); // 0
                self.cursor.advance(); // prefix
                self.eat('_');
                let any = self.eat_digits(|c| c.is_digit(radix));
                if !any || self.number_runs_into_name() {
                    return Err(self.error(LexErrorKind::InvalidNumber { base }, start));
                }
                return Ok(self.make_token(TokenKind::Number, start));
            }
        }

        let mut is_integer = true;
        if first == '.' {
            is_integer = false;
            self.cursor.advance();
            self.eat_digits(|c| c.is_ascii_digit());
        } else {
            self.eat_digits(|c| c.is_ascii_digit());
            if self.cursor.peek() == Some('.') {
                is_integer = false;
                self.cursor.advance();
                self.eat_digits(|c| c.is_ascii_digit());
            }
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            let has_exponent = match self.cursor.peek_second() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self.cursor.peek_nth(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                is_integer = false;
                self.cursor.advance();
                if matches!(self.cursor.peek(), Some('+' | '-')) {
                    self.cursor.advance();
                }
                self.eat_digits(|c| c.is_ascii_digit());
            }
        }

        if matches!(self.cursor.peek(), Some('j' | 'J')) {
            is_integer = false;
            self.cursor.advance();
        }

        if self.number_runs_into_name() {
            return Err(self.error(
                LexErrorKind::InvalidNumber {
                    base: NumberBase::Decimal,
                },
                start,
            ));
        }

        let lexeme = self.cursor.slice_from(start.offset);
        if is_integer && has_leading_zeros(lexeme) {
            return Err(self.error(LexErrorKind::LeadingZeros, start));
        }

        Ok(self.make_token(TokenKind::Number, start))
    }

    /// Whether identifier characters continue the literal. Operator
    /// keywords may follow a number directly (`1if x else 2`).
    fn number_runs_into_name(&self) -> bool {
        if !self.cursor.peek().is_some_and(is_ident_continue) {
            return false;
        }
        let word: String = (0..)
            .map_while(|n| self.cursor.peek_nth(n).filter(|&c| is_ident_continue(c)))
            .take(5)
            .collect();
        !matches!(
            TokenKind::keyword_from_str(&word),
            Some(
                TokenKind::And
                    | TokenKind::Else
                    | TokenKind::For
                    | TokenKind::If
                    | TokenKind::In
                    | TokenKind::Is
                    | TokenKind::Not
                    | TokenKind::Or
            )
        )
    }

    /// Consume digits with single underscores between them. Returns true if
    /// at least one digit was consumed.
    fn eat_digits(&mut self, is_digit: impl Fn(char) -> bool) -> bool {
        let mut any = false;
        loop {
            match self.cursor.peek() {
                Some(c) if is_digit(c) => {
                    self.cursor.advance();
                    any = true;
                }
                Some('_') if any && self.cursor.peek_second().is_some_and(&is_digit) => {
                    self.cursor.advance();
                }
                _ => return any,
            }
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.cursor.eat(expected)
    }

    // ---------------------------------------------------------------
    // Operators and delimiters
    // ---------------------------------------------------------------

    fn scan_operator(&mut self, start: Position) -> Result<Token, LexError> {
        let Some(ch) = self.cursor.advance() else {
            return Err(self.error(LexErrorKind::UnexpectedEof, start));
        };

        let kind = match ch {
            '(' | '[' | '{' => {
                if self.brackets.len() >= MAX_BRACKET_DEPTH {
                    return Err(self.error(LexErrorKind::TooManyNestedBrackets, start));
                }
                self.brackets.push((ch, start));
                match ch {
                    '(' => TokenKind::LeftParen,
                    '[' => TokenKind::LeftBracket,
                    _ => TokenKind::LeftBrace,
                }
            }
            ')' | ']' | '}' => {
                match self.brackets.pop() {
                    None => {
                        return Err(self.error(LexErrorKind::UnmatchedBracket { close: ch }, start));
                    }
                    Some((open, _)) if closing_for(open) != ch => {
                        return Err(self.error(
                            LexErrorKind::MismatchedBracket { open, close: ch },
                            start,
                        ));
                    }
                    Some(_) => {}
                }
                match ch {
                    ')' => TokenKind::RightParen,
                    ']' => TokenKind::RightBracket,
                    _ => TokenKind::RightBrace,
                }
            }
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '~' => TokenKind::Tilde,
            ':' => {
                if self.eat('=') {
                    TokenKind::ColonEqual
                } else {
                    TokenKind::Colon
                }
            }
            '.' => {
                if self.cursor.peek() == Some('.') && self.cursor.peek_second() == Some('.') {
                    self.cursor.advance();
                    self.cursor.advance();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            '+' => self.with_equal(TokenKind::Plus, TokenKind::PlusEqual),
            '-' => {
                if self.eat('>') {
                    TokenKind::Arrow
                } else {
                    self.with_equal(TokenKind::Minus, TokenKind::MinusEqual)
                }
            }
            '*' => {
                if self.eat('*') {
                    self.with_equal(TokenKind::DoubleStar, TokenKind::DoubleStarEqual)
                } else {
                    self.with_equal(TokenKind::Star, TokenKind::StarEqual)
                }
            }
            '/' => {
                if self.eat('/') {
                    self.with_equal(TokenKind::DoubleSlash, TokenKind::DoubleSlashEqual)
                } else {
                    self.with_equal(TokenKind::Slash, TokenKind::SlashEqual)
                }
            }
            '%' => self.with_equal(TokenKind::Percent, TokenKind::PercentEqual),
            '@' => self.with_equal(TokenKind::At, TokenKind::AtEqual),
            '&' => self.with_equal(TokenKind::Amper, TokenKind::AmperEqual),
            '|' => self.with_equal(TokenKind::Pipe, TokenKind::PipeEqual),
            '^' => self.with_equal(TokenKind::Caret, TokenKind::CaretEqual),
            '=' => self.with_equal(TokenKind::Equal, TokenKind::EqualEqual),
            '!' => {
                if self.eat('=') {
                    TokenKind::NotEqual
                } else {
                    return Err(self.error(LexErrorKind::invalid_character('!'), start));
                }
            }
            '<' => {
                if self.eat('<') {
                    self.with_equal(TokenKind::LeftShift, TokenKind::LeftShiftEqual)
                } else {
                    self.with_equal(TokenKind::Less, TokenKind::LessEqual)
                }
            }
            '>' => {
                if self.eat('>') {
                    self.with_equal(TokenKind::RightShift, TokenKind::RightShiftEqual)
                } else {
                    self.with_equal(TokenKind::Greater, TokenKind::GreaterEqual)
                }
            }
            other => {
                return Err(self.error(LexErrorKind::invalid_character(other), start));
            }
        };

        Ok(self.make_token(kind, start))
    }

    /// `plain` or, if `=` follows, `with_eq`.
    fn with_equal(&mut self, plain: TokenKind, with_eq: TokenKind) -> TokenKind {
        if self.eat('=') {
            with_eq
        } else {
            plain
        }
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    /// Create a token using the slice from `start` to current position.
    fn make_token(&self, kind: TokenKind, start: Position) -> Token {
        let lexeme = self.cursor.slice_from(start.offset);
        let span = self.cursor.span_from(start);
        Token::new(kind, lexeme, span)
    }

    fn error(&self, kind: LexErrorKind, position: Position) -> LexError {
        LexError::new(kind, position)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.pop_front() {
            return Some(Ok(token));
        }
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(token) => Some(Ok(token)),
            Err(error) => {
                self.finished = true;
                self.pending.clear();
                Some(Err(error))
            }
        }
    }
}

impl std::iter::FusedIterator for Lexer<'_> {}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `r`, `b`, `u`, `f` and the two-letter raw combinations, any case.
fn is_string_prefix(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "br" | "rb" | "fr" | "rf"
    )
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Decimal integers may not start with `0` unless every digit is `0`.
fn has_leading_zeros(lexeme: &str) -> bool {
    lexeme.len() > 1
        && lexeme.starts_with('0')
        && lexeme.chars().any(|c| c.is_ascii_digit() && c != '0')
}
