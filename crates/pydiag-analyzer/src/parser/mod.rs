mod declarations;
mod error;
mod expressions;
mod patterns;
mod statements;
mod targets;

pub use error::{ErrorCategory, ParseError, ParseErrorKind, ParseResult, TargetAction};

use pydiag_common::{Position, Span};

use crate::ast::*;
use crate::lexer::{LexError, Lexer, Token, TokenKind};

/// Deepest expression nesting the parser accepts.
pub const MAX_NESTING: usize = 200;

/// Parse a complete module.
pub fn parse(source: &str) -> ParseResult<Ast> {
    Parser::new(source).parse_module()
}

/// Recursive descent parser for Python modules.
///
/// Uses Pratt parsing for operator precedence and stops at the first error.
/// Comments and non-logical line breaks are dropped before parsing. A lexer
/// failure is kept as a terminal token: the parser reports it only when it
/// reaches that point, so an earlier grammar error takes priority.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    lex_error: Option<(usize, LexError)>,
    builder: AstBuilder,
    depth: usize,
    in_pattern: bool,
}

/// Saved parser state for speculative parsing.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    pos: usize,
    nodes: usize,
    depth: usize,
    in_pattern: bool,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let stream = Lexer::new(source).tokenize();
        let mut tokens: Vec<Token> = stream
            .tokens
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .collect();

        let lex_error = stream.error.map(|error| {
            tokens.push(Token::new(
                TokenKind::EndMarker,
                "",
                Span::point(error.position),
            ));
            (tokens.len() - 1, error)
        });
        if tokens.last().map(|t| t.kind) != Some(TokenKind::EndMarker) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or_else(Position::start);
            tokens.push(Token::new(TokenKind::EndMarker, "", Span::point(end)));
        }

        Self {
            tokens,
            pos: 0,
            lex_error,
            builder: AstBuilder::new(),
            depth: 0,
            in_pattern: false,
        }
    }

    /// Parse the entire token stream into an [`Ast`].
    pub fn parse_module(mut self) -> ParseResult<Ast> {
        let start = self.current().span.start;
        let mut body = Vec::new();

        while !self.is_at_end() {
            self.parse_statement(&mut body)?;
        }
        if self.at_lex_error() {
            return Err(self.error_here(ParseErrorKind::InvalidSyntax));
        }

        let span = Span::new(start, self.current().span.end);
        let root = self.builder.push(NodeKind::Module, span, body);
        Ok(self.builder.finish(root))
    }

    // ========================================================================
    // Token manipulation helpers
    // ========================================================================

    /// Peek at the current token kind.
    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    /// Peek at a token kind N positions ahead.
    fn peek_at(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::EndMarker)
    }

    /// Get the current token.
    fn current(&self) -> &Token {
        let index = self.pos.min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    /// Get the previous token (the one just consumed).
    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    /// Advance past the current token and return it.
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    /// True when the current token is a `Name` spelled `word` (soft keywords).
    fn check_soft_keyword(&self, word: &str) -> bool {
        self.peek() == TokenKind::Name && self.current().lexeme == word
    }

    /// Consume if the current token matches, otherwise do nothing.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a token of the expected kind, or fail with `expected ...`.
    fn expect(&mut self, kind: TokenKind) -> ParseResult<&Token> {
        if self.peek() == kind {
            Ok(self.advance())
        } else {
            Err(self.error_here(ParseErrorKind::Expected(kind.describe())))
        }
    }

    /// Consume a `Name` and return its text.
    fn expect_name(&mut self) -> ParseResult<String> {
        if self.check(TokenKind::Name) {
            Ok(self.advance().lexeme.clone())
        } else {
            Err(self.error_here(ParseErrorKind::InvalidSyntax))
        }
    }

    /// Check if the parser has reached the end of the token stream.
    fn is_at_end(&self) -> bool {
        self.peek() == TokenKind::EndMarker
    }

    fn at_lex_error(&self) -> bool {
        matches!(self.lex_error, Some((index, _)) if self.pos >= index)
    }

    /// Start position of the current token.
    fn current_start(&self) -> Position {
        self.current().span.start
    }

    /// Span from `start` to the end of the previous token.
    fn span_from(&self, start: Position) -> Span {
        Span::new(start, self.previous().span.end)
    }

    fn push(&mut self, kind: NodeKind, start: Position, children: Vec<NodeId>) -> NodeId {
        let span = self.span_from(start);
        self.builder.push(kind, span, children)
    }

    // ========================================================================
    // Errors, nesting and backtracking
    // ========================================================================

    /// Build an error at `position`, unless the parser is standing on the
    /// lexer's failure point, in which case the lexer error is reported.
    fn error_at(&self, kind: ParseErrorKind, position: Position) -> ParseError {
        match &self.lex_error {
            Some((index, lex)) if self.pos >= *index => {
                ParseError::new(ParseErrorKind::Lex(lex.kind.clone()), lex.position)
            }
            _ => ParseError::new(kind, position),
        }
    }

    fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        self.error_at(kind, self.current_start())
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here(ParseErrorKind::TooDeeplyNested));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            nodes: self.builder.len(),
            depth: self.depth,
            in_pattern: self.in_pattern,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.pos = checkpoint.pos;
        self.builder.truncate(checkpoint.nodes);
        self.depth = checkpoint.depth;
        self.in_pattern = checkpoint.in_pattern;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) fn parse_ok(source: &str) -> Ast {
        match parse(source) {
            Ok(ast) => ast,
            Err(err) => panic!("parse failed for {source:?}: {err} at {}", err.position),
        }
    }

    pub(super) fn parse_err(source: &str) -> ParseError {
        parse(source).expect_err("expected a parse error")
    }

    /// Every `Name` node as `(id, ctx)` in allocation order.
    pub(super) fn names(ast: &Ast) -> Vec<(String, ExprContext)> {
        #[derive(Default)]
        struct Names(Vec<(String, ExprContext)>);
        impl Visitor for Names {
            fn visit_name(&mut self, id: &str, ctx: ExprContext, _span: Span) {
                self.0.push((id.to_string(), ctx));
            }
        }
        let mut collected = Names::default();
        walk(ast, &mut collected).unwrap();
        collected.0
    }

    pub(super) fn stored(ast: &Ast) -> Vec<String> {
        names(ast)
            .into_iter()
            .filter(|(_, ctx)| *ctx == ExprContext::Store)
            .map(|(id, _)| id)
            .collect()
    }

    #[test]
    fn empty_module() {
        let ast = parse_ok("");
        let root = ast.get(ast.root()).unwrap();
        assert_eq!(root.kind, NodeKind::Module);
        assert!(root.children.is_empty());
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let ast = parse_ok("# header\n\nx = 1  # trailing\n\n");
        assert_eq!(ast.get(ast.root()).unwrap().children.len(), 1);
    }

    #[test]
    fn earlier_grammar_error_wins_over_later_lex_error() {
        let err = parse_err("if True\n    x = 1\ny = 'open\n");
        assert_eq!(err.kind, ParseErrorKind::Expected("':'"));
        assert_eq!(err.position.line, 1);
    }

    #[test]
    fn lex_error_surfaces_when_reached() {
        let err = parse_err("x = 1\ny = 'open\n");
        assert_eq!(
            err.kind,
            ParseErrorKind::Lex(crate::lexer::LexErrorKind::UnterminatedString { detected_at: 2 })
        );
        assert_eq!(err.position.line, 2);
    }

    #[test]
    fn unclosed_bracket_reported_at_opener() {
        let err = parse_err("x = [1,\n  2\n");
        assert_eq!(
            err.kind,
            ParseErrorKind::Lex(crate::lexer::LexErrorKind::UnclosedBracket { open: '[' })
        );
        assert_eq!(err.position, Position::new(1, 4, 4));
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let source = format!("x = {}1", "-".repeat(MAX_NESTING + 10));
        assert_eq!(parse_err(&source).kind, ParseErrorKind::TooDeeplyNested);
    }

    #[test]
    fn nesting_below_the_limit_parses() {
        let depth = 50;
        let source = format!("x = {}1{}\n", "(".repeat(depth), ")".repeat(depth));
        parse_ok(&source);
    }
}
