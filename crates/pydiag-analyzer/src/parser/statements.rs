use pydiag_common::Position;

use crate::ast::*;
use crate::lexer::TokenKind;

use super::expressions::{augmented_operator, can_start_expression};
use super::{ParseErrorKind, ParseResult, Parser};

impl Parser {
    /// Parse one logical line (or one compound statement) into `out`.
    pub(super) fn parse_statement(&mut self, out: &mut Vec<NodeId>) -> ParseResult<()> {
        let start = self.current_start();
        let stmt = match self.peek() {
            TokenKind::Indent => return Err(self.error_here(ParseErrorKind::UnexpectedIndent)),
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => self.parse_for(start, false)?,
            TokenKind::Try => self.parse_try()?,
            TokenKind::With => self.parse_with(start, false)?,
            TokenKind::Def => self.parse_function_def(Vec::new(), start, false)?,
            TokenKind::Class => self.parse_class_def(Vec::new(), start)?,
            TokenKind::At => self.parse_decorated()?,
            TokenKind::Async => self.parse_async(start)?,
            TokenKind::Name if self.check_soft_keyword("match") => match self.try_parse_match()? {
                Some(stmt) => stmt,
                None => return self.parse_simple_statements(out),
            },
            _ => return self.parse_simple_statements(out),
        };
        out.push(stmt);
        Ok(())
    }

    /// An indented suite, or simple statements on the header's line.
    pub(super) fn parse_block(
        &mut self,
        construct: &'static str,
        header_line: u32,
    ) -> ParseResult<NodeId> {
        let start = self.current_start();
        let mut body = Vec::new();

        if !self.eat(TokenKind::Newline) {
            self.parse_simple_statements(&mut body)?;
            return Ok(self.push(NodeKind::Block, start, body));
        }
        if !self.eat(TokenKind::Indent) {
            return Err(self.error_here(ParseErrorKind::MissingIndentedBlock {
                construct,
                header_line,
            }));
        }
        while !self.check(TokenKind::Dedent) && !self.is_at_end() {
            self.parse_statement(&mut body)?;
        }
        if !self.eat(TokenKind::Dedent) {
            return Err(self.error_here(ParseErrorKind::InvalidSyntax));
        }

        Ok(self.push(NodeKind::Block, start, body))
    }

    pub(super) fn expect_newline(&mut self) -> ParseResult<()> {
        if self.eat(TokenKind::Newline) {
            Ok(())
        } else {
            Err(self.error_here(ParseErrorKind::InvalidSyntax))
        }
    }

    // ========================================================================
    // Compound statements
    // ========================================================================

    /// `if cond: ... elif cond: ... else: ...`
    fn parse_if(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance(); // consume 'if'
        let mut children = vec![self.parse_named_expression()?];
        self.expect(TokenKind::Colon)?;
        children.push(self.parse_block("'if' statement", start.line)?);

        loop {
            let line = self.current().line();
            if self.eat(TokenKind::Elif) {
                children.push(self.parse_named_expression()?);
                self.expect(TokenKind::Colon)?;
                children.push(self.parse_block("'elif' statement", line)?);
            } else {
                self.parse_else_clause(&mut children)?;
                break;
            }
        }

        Ok(self.push(NodeKind::If, start, children))
    }

    /// Optional trailing `else:` block of `if`, `while`, `for` and `try`.
    fn parse_else_clause(&mut self, children: &mut Vec<NodeId>) -> ParseResult<()> {
        let line = self.current().line();
        if self.eat(TokenKind::Else) {
            self.expect(TokenKind::Colon)?;
            children.push(self.parse_block("'else' statement", line)?);
        }
        Ok(())
    }

    /// `while cond: ... [else: ...]`
    fn parse_while(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance(); // consume 'while'
        let mut children = vec![self.parse_named_expression()?];
        self.expect(TokenKind::Colon)?;
        children.push(self.parse_block("'while' statement", start.line)?);
        self.parse_else_clause(&mut children)?;
        Ok(self.push(NodeKind::While, start, children))
    }

    /// `[async] for targets in iterable: ... [else: ...]`
    fn parse_for(&mut self, start: Position, is_async: bool) -> ParseResult<NodeId> {
        let line = self.current().line();
        self.advance(); // consume 'for'
        let target = self.parse_target_list()?;
        self.store_target(target)?;
        self.expect(TokenKind::In)?;
        let iter = self.parse_star_expressions()?;
        self.expect(TokenKind::Colon)?;
        let mut children = vec![target, iter, self.parse_block("'for' statement", line)?];
        self.parse_else_clause(&mut children)?;
        Ok(self.push(NodeKind::For { is_async }, start, children))
    }

    /// `try:` with `except`/`except*` handlers, `else:` and `finally:`.
    fn parse_try(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance(); // consume 'try'
        self.expect(TokenKind::Colon)?;
        let mut children = vec![self.parse_block("'try' statement", start.line)?];

        if !self.check(TokenKind::Except) && !self.check(TokenKind::Finally) {
            return Err(self.error_here(ParseErrorKind::MissingExceptOrFinally));
        }

        let mut is_star: Option<bool> = None;
        while self.check(TokenKind::Except) {
            let handler_start = self.current_start();
            self.advance(); // consume 'except'
            let star = self.eat(TokenKind::Star);
            if is_star.is_some_and(|s| s != star) {
                return Err(self.error_at(ParseErrorKind::InvalidSyntax, handler_start));
            }
            is_star = Some(star);

            let mut handler = Vec::new();
            let mut name = None;
            if !self.check(TokenKind::Colon) {
                handler.push(self.parse_expression()?);
                if self.eat(TokenKind::As) {
                    name = Some(self.expect_name()?);
                }
            } else if star {
                return Err(self.error_here(ParseErrorKind::InvalidSyntax));
            }
            self.expect(TokenKind::Colon)?;
            let construct = if star {
                "'except*' statement"
            } else {
                "'except' statement"
            };
            handler.push(self.parse_block(construct, handler_start.line)?);
            children.push(self.push(NodeKind::ExceptHandler { name }, handler_start, handler));
        }

        if is_star.is_some() {
            self.parse_else_clause(&mut children)?;
        }
        let line = self.current().line();
        if self.eat(TokenKind::Finally) {
            self.expect(TokenKind::Colon)?;
            children.push(self.parse_block("'finally' statement", line)?);
        }

        Ok(self.push(
            NodeKind::Try {
                is_star: is_star.unwrap_or(false),
            },
            start,
            children,
        ))
    }

    /// `[async] with a as b, c:` including the parenthesised item form.
    fn parse_with(&mut self, start: Position, is_async: bool) -> ParseResult<NodeId> {
        let line = self.current().line();
        self.advance(); // consume 'with'

        let mut children = if self.check(TokenKind::LeftParen) {
            let checkpoint = self.checkpoint();
            match self.parse_parenthesized_with_items() {
                Ok(items) if self.check(TokenKind::Colon) => items,
                _ => {
                    self.restore(checkpoint);
                    self.parse_with_items()?
                }
            }
        } else {
            self.parse_with_items()?
        };

        self.expect(TokenKind::Colon)?;
        children.push(self.parse_block("'with' statement", line)?);
        Ok(self.push(NodeKind::With { is_async }, start, children))
    }

    fn parse_with_items(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut items = vec![self.parse_with_item()?];
        while self.eat(TokenKind::Comma) {
            items.push(self.parse_with_item()?);
        }
        Ok(items)
    }

    fn parse_parenthesized_with_items(&mut self) -> ParseResult<Vec<NodeId>> {
        self.advance(); // consume '('
        let mut items = vec![self.parse_with_item()?];
        while self.eat(TokenKind::Comma) {
            if self.check(TokenKind::RightParen) {
                break;
            }
            items.push(self.parse_with_item()?);
        }
        self.expect_closer(TokenKind::RightParen)?;
        Ok(items)
    }

    fn parse_with_item(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let mut children = vec![self.parse_expression()?];
        if self.eat(TokenKind::As) {
            let target = self.parse_bitwise_or()?;
            self.store_target(target)?;
            children.push(target);
        }
        Ok(self.push(NodeKind::WithItem, start, children))
    }

    /// `async def`, `async for`, `async with`.
    fn parse_async(&mut self, start: Position) -> ParseResult<NodeId> {
        self.advance(); // consume 'async'
        match self.peek() {
            TokenKind::Def => self.parse_function_def(Vec::new(), start, true),
            TokenKind::For => self.parse_for(start, true),
            TokenKind::With => self.parse_with(start, true),
            _ => Err(self.error_here(ParseErrorKind::InvalidSyntax)),
        }
    }

    // ========================================================================
    // Simple statements
    // ========================================================================

    /// `stmt; stmt; ...` up to and including the end of the logical line.
    fn parse_simple_statements(&mut self, out: &mut Vec<NodeId>) -> ParseResult<()> {
        loop {
            out.push(self.parse_simple_statement()?);
            if !self.eat(TokenKind::Semicolon) || self.check(TokenKind::Newline) {
                break;
            }
        }
        self.expect_newline()
    }

    fn parse_simple_statement(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        match self.peek() {
            TokenKind::Pass => self.parse_keyword_statement(NodeKind::Pass),
            TokenKind::Break => self.parse_keyword_statement(NodeKind::Break),
            TokenKind::Continue => self.parse_keyword_statement(NodeKind::Continue),
            TokenKind::Return => {
                self.advance();
                let mut children = Vec::new();
                if can_start_expression(self.peek()) {
                    children.push(self.parse_star_expressions()?);
                }
                Ok(self.push(NodeKind::Return, start, children))
            }
            TokenKind::Raise => {
                self.advance();
                let mut children = Vec::new();
                if can_start_expression(self.peek()) {
                    children.push(self.parse_expression()?);
                    if self.eat(TokenKind::From) {
                        children.push(self.parse_expression()?);
                    }
                }
                Ok(self.push(NodeKind::Raise, start, children))
            }
            TokenKind::Global | TokenKind::Nonlocal => {
                let is_global = self.check(TokenKind::Global);
                self.advance();
                let mut names = vec![self.expect_name()?];
                while self.eat(TokenKind::Comma) {
                    names.push(self.expect_name()?);
                }
                let kind = if is_global {
                    NodeKind::Global { names }
                } else {
                    NodeKind::Nonlocal { names }
                };
                Ok(self.push(kind, start, vec![]))
            }
            TokenKind::Del => {
                self.advance();
                let target = self.parse_target_list()?;
                self.delete_target(target)?;
                Ok(self.push(NodeKind::Delete, start, vec![target]))
            }
            TokenKind::Assert => {
                self.advance();
                let mut children = vec![self.parse_expression()?];
                if self.eat(TokenKind::Comma) {
                    children.push(self.parse_expression()?);
                }
                Ok(self.push(NodeKind::Assert, start, children))
            }
            TokenKind::Import => self.parse_import(),
            TokenKind::From => self.parse_import_from(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_keyword_statement(&mut self, kind: NodeKind) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance();
        Ok(self.push(kind, start, vec![]))
    }

    /// Expression statements and every assignment form.
    fn parse_expression_statement(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let first = self.parse_assignment_value()?;

        if self.check(TokenKind::Equal) {
            let mut targets = Vec::new();
            let mut value = first;
            while self.eat(TokenKind::Equal) {
                targets.push(value);
                value = self.parse_assignment_value()?;
            }
            for &target in &targets {
                self.store_target(target)?;
            }
            targets.push(value);
            return Ok(self.push(NodeKind::Assign, start, targets));
        }

        if let Some(op) = augmented_operator(self.peek()) {
            self.store_single_target(first, true)?;
            self.advance(); // consume operator
            let value = self.parse_assignment_value()?;
            return Ok(self.push(NodeKind::AugAssign { op }, start, vec![first, value]));
        }

        if self.check(TokenKind::Colon) {
            self.store_single_target(first, false)?;
            self.advance(); // consume ':'
            let mut children = vec![first, self.parse_expression()?];
            if self.eat(TokenKind::Equal) {
                children.push(self.parse_assignment_value()?);
            }
            return Ok(self.push(NodeKind::AnnAssign, start, children));
        }

        if self.is_print_statement(first) {
            return Err(self.error_at(ParseErrorKind::MissingParenthesesInPrint, start));
        }
        Ok(self.push(NodeKind::ExprStmt, start, vec![first]))
    }

    /// `print x` written as a statement.
    fn is_print_statement(&self, first: NodeId) -> bool {
        let is_print = matches!(
            self.builder.get(first).map(|n| &n.kind),
            Some(NodeKind::Name { id, .. }) if id == "print"
        );
        is_print
            && matches!(
                self.peek(),
                TokenKind::Name
                    | TokenKind::Number
                    | TokenKind::String
                    | TokenKind::None
                    | TokenKind::True
                    | TokenKind::False
                    | TokenKind::Ellipsis
                    | TokenKind::LeftBrace
                    | TokenKind::Lambda
                    | TokenKind::Not
                    | TokenKind::Await
            )
    }
}
