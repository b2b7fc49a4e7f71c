use pydiag_common::Position;

use crate::ast::*;
use crate::lexer::{is_bytes_literal, TokenKind};

use super::{ParseErrorKind, ParseResult, Parser};

// ============================================================================
// Binding powers for Pratt parsing
// ============================================================================
//
// Higher values bind tighter. (left_bp, right_bp): left < right = left-assoc.
//
//  or                              (1, 2)   flattened into one BoolOp
//  and                             (3, 4)   flattened into one BoolOp
//  not (prefix)                    5
//  comparisons, in, not in, is     (7, 8)   chained into one Compare
//  |                               (9, 10)
//  ^                               (11, 12)
//  &                               (13, 14)
//  <<, >>                          (15, 16)
//  +, -                            (17, 18)
//  *, /, //, %, @                  (19, 20)
//  +, -, ~ (prefix)                21
//  **                              (24, 21) right-assoc, binds a unary rhs
//  await (prefix)                  applies to a primary

fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::Or => Some((1, 2)),
        TokenKind::And => Some((3, 4)),
        TokenKind::Less
        | TokenKind::Greater
        | TokenKind::LessEqual
        | TokenKind::GreaterEqual
        | TokenKind::EqualEqual
        | TokenKind::NotEqual
        | TokenKind::In
        | TokenKind::Not
        | TokenKind::Is => Some((7, 8)),
        TokenKind::Pipe => Some((9, 10)),
        TokenKind::Caret => Some((11, 12)),
        TokenKind::Amper => Some((13, 14)),
        TokenKind::LeftShift | TokenKind::RightShift => Some((15, 16)),
        TokenKind::Plus | TokenKind::Minus => Some((17, 18)),
        TokenKind::Star
        | TokenKind::Slash
        | TokenKind::DoubleSlash
        | TokenKind::Percent
        | TokenKind::At => Some((19, 20)),
        TokenKind::DoubleStar => Some((24, 21)),
        _ => None,
    }
}

/// Operand binding power of prefix `not`.
const NOT_BP: u8 = 5;
/// Operand binding power of prefix `+`, `-` and `~`.
const UNARY_BP: u8 = 21;
/// Minimum binding power of a `bitwise_or` expression.
pub(super) const BITWISE_OR_BP: u8 = 9;

impl Parser {
    /// `expression`: conditional expressions and lambdas.
    pub(super) fn parse_expression(&mut self) -> ParseResult<NodeId> {
        self.nested(|p| p.parse_conditional())
    }

    fn parse_conditional(&mut self) -> ParseResult<NodeId> {
        if self.check(TokenKind::Lambda) {
            return self.parse_lambda();
        }
        let start = self.current_start();
        let body = self.parse_disjunction()?;
        if !self.eat(TokenKind::If) {
            return Ok(body);
        }
        let test = self.parse_disjunction()?;
        if !self.eat(TokenKind::Else) {
            return Err(self.error_here(ParseErrorKind::Expected("'else' after 'if' expression")));
        }
        let orelse = self.parse_expression()?;
        Ok(self.push(NodeKind::IfExp, start, vec![body, test, orelse]))
    }

    /// `disjunction`: everything from `or` down to primaries.
    pub(super) fn parse_disjunction(&mut self) -> ParseResult<NodeId> {
        self.parse_expr_bp(0)
    }

    /// `bitwise_or`: stops before comparisons, so a following `in` is left
    /// for the caller.
    pub(super) fn parse_bitwise_or(&mut self) -> ParseResult<NodeId> {
        self.parse_expr_bp(BITWISE_OR_BP)
    }

    /// `named_expression`: `name := value` or a plain expression.
    pub(super) fn parse_named_expression(&mut self) -> ParseResult<NodeId> {
        if self.check(TokenKind::Name) && self.peek_at(1) == TokenKind::ColonEqual {
            let start = self.current_start();
            let id = self.advance().lexeme.clone();
            let target = self.push(
                NodeKind::Name {
                    id,
                    ctx: ExprContext::Store,
                },
                start,
                vec![],
            );
            self.advance(); // consume ':='
            let value = self.parse_expression()?;
            return Ok(self.push(NodeKind::NamedExpr, start, vec![target, value]));
        }
        let expr = self.parse_expression()?;
        if self.check(TokenKind::ColonEqual) {
            return Err(self.error_here(ParseErrorKind::InvalidSyntax));
        }
        Ok(expr)
    }

    /// `star_expression`: `*bitwise_or` or an expression.
    pub(super) fn parse_star_expression(&mut self) -> ParseResult<NodeId> {
        if self.check(TokenKind::Star) {
            return self.parse_starred();
        }
        self.parse_expression()
    }

    /// `star_named_expression`: `*bitwise_or` or a named expression.
    pub(super) fn parse_star_named_expression(&mut self) -> ParseResult<NodeId> {
        if self.check(TokenKind::Star) {
            return self.parse_starred();
        }
        self.parse_named_expression()
    }

    fn parse_starred(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance(); // consume '*'
        let value = self.parse_bitwise_or()?;
        Ok(self.push(
            NodeKind::Starred {
                ctx: ExprContext::Load,
            },
            start,
            vec![value],
        ))
    }

    /// `star_expressions`: a comma-separated list becomes a tuple.
    pub(super) fn parse_star_expressions(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let first = self.parse_star_expression()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            if !can_start_expression(self.peek()) {
                break;
            }
            items.push(self.parse_star_expression()?);
        }
        Ok(self.push(
            NodeKind::Tuple {
                ctx: ExprContext::Load,
            },
            start,
            items,
        ))
    }

    /// `star_named_expressions` without brackets (match subjects).
    pub(super) fn parse_star_named_expressions(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let first = self.parse_star_named_expression()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            if !can_start_expression(self.peek()) {
                break;
            }
            items.push(self.parse_star_named_expression()?);
        }
        Ok(self.push(
            NodeKind::Tuple {
                ctx: ExprContext::Load,
            },
            start,
            items,
        ))
    }

    /// `yield [from] ...`
    pub(super) fn parse_yield_expression(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance(); // consume 'yield'
        if self.eat(TokenKind::From) {
            let value = self.parse_expression()?;
            return Ok(self.push(NodeKind::YieldFrom, start, vec![value]));
        }
        let mut children = Vec::new();
        if can_start_expression(self.peek()) {
            children.push(self.parse_star_expressions()?);
        }
        Ok(self.push(NodeKind::Yield, start, children))
    }

    /// Right-hand side of an assignment: a yield expression or `star_expressions`.
    pub(super) fn parse_assignment_value(&mut self) -> ParseResult<NodeId> {
        if self.check(TokenKind::Yield) {
            self.parse_yield_expression()
        } else {
            self.parse_star_expressions()
        }
    }

    /// `lambda [params]: body`
    fn parse_lambda(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance(); // consume 'lambda'
        let mut children = self.parse_parameters(TokenKind::Colon, false)?;
        self.expect(TokenKind::Colon)?;
        children.push(self.parse_expression()?);
        Ok(self.push(NodeKind::Lambda, start, children))
    }

    // ========================================================================
    // Pratt core
    // ========================================================================

    /// Core Pratt parser: parse an expression with a minimum binding power.
    fn parse_expr_bp(&mut self, min_bp: u8) -> ParseResult<NodeId> {
        self.nested(|p| p.parse_expr_bp_inner(min_bp))
    }

    fn parse_expr_bp_inner(&mut self, min_bp: u8) -> ParseResult<NodeId> {
        let start = self.current_start();
        let mut lhs = self.parse_prefix(min_bp)?;

        loop {
            let kind = self.peek();
            // `not` is only infix as part of `not in`
            if kind == TokenKind::Not && self.peek_at(1) != TokenKind::In {
                break;
            }
            let Some((left_bp, right_bp)) = infix_binding_power(kind) else {
                break;
            };
            if left_bp < min_bp {
                break;
            }

            lhs = match kind {
                TokenKind::Or | TokenKind::And => {
                    let op = if kind == TokenKind::Or {
                        BoolOp::Or
                    } else {
                        BoolOp::And
                    };
                    let mut operands = vec![lhs];
                    while self.eat(kind) {
                        operands.push(self.parse_expr_bp(right_bp)?);
                    }
                    self.push(NodeKind::BoolOp { op }, start, operands)
                }
                _ if comparison_start(kind) => self.parse_comparison(lhs, start, right_bp)?,
                _ => {
                    let Some(op) = binary_operator(kind) else {
                        break;
                    };
                    self.advance(); // consume operator
                    let rhs = self.parse_expr_bp(right_bp)?;
                    self.push(NodeKind::BinOp { op }, start, vec![lhs, rhs])
                }
            };
        }

        Ok(lhs)
    }

    /// Collect a comparison chain `a < b <= c` into one `Compare`.
    fn parse_comparison(
        &mut self,
        lhs: NodeId,
        start: Position,
        right_bp: u8,
    ) -> ParseResult<NodeId> {
        let mut ops = Vec::new();
        let mut children = vec![lhs];
        while let Some(op) = self.eat_comparison_operator() {
            ops.push(op);
            children.push(self.parse_expr_bp(right_bp)?);
        }
        Ok(self.push(NodeKind::Compare { ops }, start, children))
    }

    fn eat_comparison_operator(&mut self) -> Option<CmpOp> {
        let op = match self.peek() {
            TokenKind::Less => CmpOp::Lt,
            TokenKind::Greater => CmpOp::Gt,
            TokenKind::LessEqual => CmpOp::LtE,
            TokenKind::GreaterEqual => CmpOp::GtE,
            TokenKind::EqualEqual => CmpOp::Eq,
            TokenKind::NotEqual => CmpOp::NotEq,
            TokenKind::In => CmpOp::In,
            TokenKind::Not if self.peek_at(1) == TokenKind::In => {
                self.advance();
                CmpOp::NotIn
            }
            TokenKind::Is if self.peek_at(1) == TokenKind::Not => {
                self.advance();
                CmpOp::IsNot
            }
            TokenKind::Is => CmpOp::Is,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    /// Prefix operators, `await`, or a primary. `not` binds looser than
    /// comparisons and arithmetic, so it cannot start their operands.
    fn parse_prefix(&mut self, min_bp: u8) -> ParseResult<NodeId> {
        let start = self.current_start();
        let (op, bp) = match self.peek() {
            TokenKind::Not if min_bp > NOT_BP => {
                return Err(self.error_here(ParseErrorKind::InvalidSyntax));
            }
            TokenKind::Not => (UnaryOp::Not, NOT_BP),
            TokenKind::Minus => (UnaryOp::USub, UNARY_BP),
            TokenKind::Plus => (UnaryOp::UAdd, UNARY_BP),
            TokenKind::Tilde => (UnaryOp::Invert, UNARY_BP),
            TokenKind::Await => {
                self.advance();
                let operand = self.nested(|p| p.parse_primary())?;
                return Ok(self.push(NodeKind::Await, start, vec![operand]));
            }
            _ => return self.parse_primary(),
        };
        self.advance(); // consume operator
        let operand = self.parse_expr_bp(bp)?;
        Ok(self.push(NodeKind::UnaryOp { op }, start, vec![operand]))
    }

    // ========================================================================
    // Primaries and atoms
    // ========================================================================

    /// An atom followed by `.name`, `(args)` and `[slices]` trailers.
    fn parse_primary(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let mut expr = self.parse_atom()?;

        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let attr = self.expect_name()?;
                    expr = self.push(
                        NodeKind::Attribute {
                            attr,
                            ctx: ExprContext::Load,
                        },
                        start,
                        vec![expr],
                    );
                }
                TokenKind::LeftParen => {
                    self.advance();
                    let mut children = vec![expr];
                    children.extend(self.parse_call_arguments(true)?);
                    self.expect_closer(TokenKind::RightParen)?;
                    expr = self.push(NodeKind::Call, start, children);
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let slices = self.parse_slices()?;
                    self.expect_closer(TokenKind::RightBracket)?;
                    expr = self.push(
                        NodeKind::Subscript {
                            ctx: ExprContext::Load,
                        },
                        start,
                        vec![expr, slices],
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_atom(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let constant = match self.peek() {
            TokenKind::Name => {
                let id = self.advance().lexeme.clone();
                return Ok(self.push(
                    NodeKind::Name {
                        id,
                        ctx: ExprContext::Load,
                    },
                    start,
                    vec![],
                ));
            }
            TokenKind::Number => Constant::Number(self.current().lexeme.clone()),
            TokenKind::String => {
                let mut text = self.advance().lexeme.clone();
                let is_bytes = is_bytes_literal(&text);
                while self.check(TokenKind::String) {
                    if is_bytes_literal(&self.current().lexeme) != is_bytes {
                        return Err(self.error_at(ParseErrorKind::MixedBytesLiterals, start));
                    }
                    text.push(' ');
                    text.push_str(&self.advance().lexeme);
                }
                return Ok(self.push(
                    NodeKind::Constant {
                        value: Constant::Str(text),
                    },
                    start,
                    vec![],
                ));
            }
            TokenKind::None => Constant::None,
            TokenKind::True => Constant::True,
            TokenKind::False => Constant::False,
            TokenKind::Ellipsis => Constant::Ellipsis,
            TokenKind::LeftParen => return self.parse_paren_atom(),
            TokenKind::LeftBracket => return self.parse_list_atom(),
            TokenKind::LeftBrace => return self.parse_brace_atom(),
            _ => return Err(self.error_here(ParseErrorKind::InvalidSyntax)),
        };
        self.advance();
        Ok(self.push(NodeKind::Constant { value: constant }, start, vec![]))
    }

    /// `()`, `(expr)`, `(a, b)`, `(x for x in y)`, `(yield x)`.
    fn parse_paren_atom(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance(); // consume '('

        if self.eat(TokenKind::RightParen) {
            return Ok(self.push(
                NodeKind::Tuple {
                    ctx: ExprContext::Load,
                },
                start,
                vec![],
            ));
        }
        if self.check(TokenKind::Yield) {
            let value = self.parse_yield_expression()?;
            self.expect_closer(TokenKind::RightParen)?;
            return Ok(value);
        }

        let first = self.parse_display_item()?;
        if self.is_comprehension_start() {
            let mut children = vec![first];
            children.extend(self.parse_comprehension_clauses()?);
            self.expect_closer(TokenKind::RightParen)?;
            return Ok(self.push(NodeKind::GeneratorExp, start, children));
        }
        if self.check(TokenKind::Comma) {
            let items = self.parse_display_rest(first, TokenKind::RightParen)?;
            return Ok(self.push(
                NodeKind::Tuple {
                    ctx: ExprContext::Load,
                },
                start,
                items,
            ));
        }

        if matches!(self.node_kind(first), Some(NodeKind::Starred { .. })) {
            return Err(self.error_at(ParseErrorKind::InvalidSyntax, start));
        }
        self.expect_closer(TokenKind::RightParen)?;
        Ok(first)
    }

    /// `[...]` list displays and list comprehensions.
    fn parse_list_atom(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance(); // consume '['
        let list = NodeKind::List {
            ctx: ExprContext::Load,
        };

        if self.eat(TokenKind::RightBracket) {
            return Ok(self.push(list, start, vec![]));
        }
        let first = self.parse_display_item()?;
        if self.is_comprehension_start() {
            let mut children = vec![first];
            children.extend(self.parse_comprehension_clauses()?);
            self.expect_closer(TokenKind::RightBracket)?;
            return Ok(self.push(NodeKind::ListComp, start, children));
        }
        let items = self.parse_display_rest(first, TokenKind::RightBracket)?;
        Ok(self.push(list, start, items))
    }

    /// `{...}`: dicts, sets and their comprehensions.
    fn parse_brace_atom(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance(); // consume '{'

        if self.eat(TokenKind::RightBrace) {
            return Ok(self.push(NodeKind::Dict, start, vec![]));
        }
        if self.check(TokenKind::DoubleStar) {
            let mut entries = Vec::new();
            self.parse_dict_entry(&mut entries)?;
            return self.finish_dict(start, entries);
        }

        let first = self.parse_display_item()?;
        if self.eat(TokenKind::Colon) {
            let value_start = self.current_start();
            let value = self.parse_expression()?;
            let value = self.pattern_capture(value, value_start)?;
            if self.is_comprehension_start() {
                let mut children = vec![first, value];
                children.extend(self.parse_comprehension_clauses()?);
                self.expect_closer(TokenKind::RightBrace)?;
                return Ok(self.push(NodeKind::DictComp, start, children));
            }
            return self.finish_dict(start, vec![first, value]);
        }

        if self.is_comprehension_start() {
            let mut children = vec![first];
            children.extend(self.parse_comprehension_clauses()?);
            self.expect_closer(TokenKind::RightBrace)?;
            return Ok(self.push(NodeKind::SetComp, start, children));
        }
        let items = self.parse_display_rest(first, TokenKind::RightBrace)?;
        Ok(self.push(NodeKind::Set, start, items))
    }

    fn finish_dict(
        &mut self,
        start: Position,
        mut entries: Vec<NodeId>,
    ) -> ParseResult<NodeId> {
        while self.eat(TokenKind::Comma) {
            if self.check(TokenKind::RightBrace) {
                break;
            }
            self.parse_dict_entry(&mut entries)?;
        }
        self.expect_closer(TokenKind::RightBrace)?;
        Ok(self.push(NodeKind::Dict, start, entries))
    }

    /// `key: value` (two children) or `**mapping` (one `DictUnpack` child).
    fn parse_dict_entry(&mut self, entries: &mut Vec<NodeId>) -> ParseResult<()> {
        let start = self.current_start();
        if self.eat(TokenKind::DoubleStar) {
            let mapping = self.parse_bitwise_or()?;
            entries.push(self.push(NodeKind::DictUnpack, start, vec![mapping]));
            return Ok(());
        }
        let key = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;
        let value_start = self.current_start();
        let value = self.parse_expression()?;
        let value = self.pattern_capture(value, value_start)?;
        entries.push(key);
        entries.push(value);
        Ok(())
    }

    /// One element of a list, tuple or set display. Inside a `case`
    /// pattern an element may carry an `as name` capture.
    fn parse_display_item(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let item = self.parse_star_named_expression()?;
        self.pattern_capture(item, start)
    }

    /// Wrap `item` in a `MatchAs` when a `case` pattern continues with
    /// `as name`.
    pub(super) fn pattern_capture(&mut self, item: NodeId, start: Position) -> ParseResult<NodeId> {
        if self.in_pattern && self.eat(TokenKind::As) {
            let name = self.expect_name()?;
            return Ok(self.push(NodeKind::MatchAs { name }, start, vec![item]));
        }
        Ok(item)
    }

    /// Remaining `, item` elements of a display, then the closing bracket.
    fn parse_display_rest(&mut self, first: NodeId, closer: TokenKind) -> ParseResult<Vec<NodeId>> {
        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            if self.check(closer) {
                break;
            }
            items.push(self.parse_display_item()?);
        }
        self.expect_closer(closer)?;
        Ok(items)
    }

    /// Closing brackets report `invalid syntax` rather than `expected ')'`.
    pub(super) fn expect_closer(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error_here(ParseErrorKind::InvalidSyntax))
        }
    }

    pub(super) fn node_kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.builder.get(id).map(|node| &node.kind)
    }

    // ========================================================================
    // Calls and subscripts
    // ========================================================================

    /// Arguments of a call or a class header, up to (not including) `)`.
    ///
    /// A bare generator expression is only allowed as the sole argument of
    /// a call, never in a class header.
    pub(super) fn parse_call_arguments(&mut self, allow_generator: bool) -> ParseResult<Vec<NodeId>> {
        let mut args = Vec::new();
        let mut seen_keyword = false;
        let mut seen_keyword_unpacking = false;

        while !self.check(TokenKind::RightParen) {
            let start = self.current_start();
            let arg = match self.peek() {
                TokenKind::Star if seen_keyword_unpacking => {
                    return Err(self.error_here(ParseErrorKind::UnpackingAfterKeywordUnpacking));
                }
                TokenKind::Star => {
                    self.advance();
                    let value = self.parse_expression()?;
                    self.push(
                        NodeKind::Starred {
                            ctx: ExprContext::Load,
                        },
                        start,
                        vec![value],
                    )
                }
                TokenKind::DoubleStar => {
                    self.advance();
                    let value = self.parse_expression()?;
                    seen_keyword = true;
                    seen_keyword_unpacking = true;
                    self.push(NodeKind::Keyword { arg: None }, start, vec![value])
                }
                TokenKind::Name if self.peek_at(1) == TokenKind::Equal => {
                    let name = self.advance().lexeme.clone();
                    self.advance(); // consume '='
                    let value_start = self.current_start();
                    let value = self.parse_expression()?;
                    let value = self.pattern_capture(value, value_start)?;
                    seen_keyword = true;
                    self.push(NodeKind::Keyword { arg: Some(name) }, start, vec![value])
                }
                _ => {
                    let value = self.parse_named_expression()?;
                    if self.is_comprehension_start() {
                        let mut children = vec![value];
                        children.extend(self.parse_comprehension_clauses()?);
                        if !allow_generator {
                            return Err(self.error_at(ParseErrorKind::InvalidSyntax, start));
                        }
                        if !args.is_empty() || !self.check(TokenKind::RightParen) {
                            let kind = ParseErrorKind::UnparenthesizedGenerator;
                            return Err(self.error_at(kind, start));
                        }
                        self.push(NodeKind::GeneratorExp, start, children)
                    } else if self.check(TokenKind::Equal) {
                        return Err(self.error_at(ParseErrorKind::InvalidSyntax, start));
                    } else if seen_keyword {
                        return Err(self.error_at(ParseErrorKind::PositionalAfterKeyword, start));
                    } else {
                        self.pattern_capture(value, start)?
                    }
                }
            };
            args.push(arg);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        Ok(args)
    }

    /// Contents of `[...]` after a primary: one slice or a tuple of them.
    fn parse_slices(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let first = self.parse_slice()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            if self.check(TokenKind::RightBracket) {
                break;
            }
            items.push(self.parse_slice()?);
        }
        Ok(self.push(
            NodeKind::Tuple {
                ctx: ExprContext::Load,
            },
            start,
            items,
        ))
    }

    /// `[lower]:[upper][:[step]]` or a single (possibly starred) expression.
    fn parse_slice(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let mut children = Vec::new();
        if !self.check(TokenKind::Colon) {
            let lower = self.parse_star_named_expression()?;
            if !self.check(TokenKind::Colon) {
                return Ok(lower);
            }
            children.push(lower);
        }

        self.advance(); // consume ':'
        if !self.at_slice_boundary() {
            children.push(self.parse_expression()?);
        }
        if self.eat(TokenKind::Colon) && !self.at_slice_boundary() {
            children.push(self.parse_expression()?);
        }
        Ok(self.push(NodeKind::Slice, start, children))
    }

    fn at_slice_boundary(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Colon | TokenKind::Comma | TokenKind::RightBracket
        )
    }

    // ========================================================================
    // Comprehensions
    // ========================================================================

    pub(super) fn is_comprehension_start(&self) -> bool {
        self.check(TokenKind::For)
            || (self.check(TokenKind::Async) && self.peek_at(1) == TokenKind::For)
    }

    /// One or more `[async] for target in iter [if cond]*` clauses.
    fn parse_comprehension_clauses(&mut self) -> ParseResult<Vec<NodeId>> {
        let mut clauses = Vec::new();
        while self.is_comprehension_start() {
            let start = self.current_start();
            let is_async = self.eat(TokenKind::Async);
            self.advance(); // consume 'for'
            let target = self.parse_target_list()?;
            self.store_target(target)?;
            self.expect(TokenKind::In)?;
            let mut children = vec![target, self.parse_disjunction()?];
            while self.eat(TokenKind::If) {
                children.push(self.parse_disjunction()?);
            }
            clauses.push(self.push(NodeKind::Comprehension { is_async }, start, children));
        }
        Ok(clauses)
    }
}

/// Tokens that can begin an expression.
pub(super) fn can_start_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Name
            | TokenKind::Number
            | TokenKind::String
            | TokenKind::None
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Ellipsis
            | TokenKind::LeftParen
            | TokenKind::LeftBracket
            | TokenKind::LeftBrace
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Tilde
            | TokenKind::Not
            | TokenKind::Lambda
            | TokenKind::Await
            | TokenKind::Star
    )
}

fn comparison_start(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Less
            | TokenKind::Greater
            | TokenKind::LessEqual
            | TokenKind::GreaterEqual
            | TokenKind::EqualEqual
            | TokenKind::NotEqual
            | TokenKind::In
            | TokenKind::Not
            | TokenKind::Is
    )
}

fn binary_operator(kind: TokenKind) -> Option<Operator> {
    match kind {
        TokenKind::Plus => Some(Operator::Add),
        TokenKind::Minus => Some(Operator::Sub),
        TokenKind::Star => Some(Operator::Mult),
        TokenKind::At => Some(Operator::MatMult),
        TokenKind::Slash => Some(Operator::Div),
        TokenKind::DoubleSlash => Some(Operator::FloorDiv),
        TokenKind::Percent => Some(Operator::Mod),
        TokenKind::DoubleStar => Some(Operator::Pow),
        TokenKind::LeftShift => Some(Operator::LShift),
        TokenKind::RightShift => Some(Operator::RShift),
        TokenKind::Pipe => Some(Operator::BitOr),
        TokenKind::Caret => Some(Operator::BitXor),
        TokenKind::Amper => Some(Operator::BitAnd),
        _ => None,
    }
}

/// The operator of an augmented assignment token (`+=` is `Add`).
pub(super) fn augmented_operator(kind: TokenKind) -> Option<Operator> {
    match kind {
        TokenKind::PlusEqual => Some(Operator::Add),
        TokenKind::MinusEqual => Some(Operator::Sub),
        TokenKind::StarEqual => Some(Operator::Mult),
        TokenKind::AtEqual => Some(Operator::MatMult),
        TokenKind::SlashEqual => Some(Operator::Div),
        TokenKind::DoubleSlashEqual => Some(Operator::FloorDiv),
        TokenKind::PercentEqual => Some(Operator::Mod),
        TokenKind::DoubleStarEqual => Some(Operator::Pow),
        TokenKind::LeftShiftEqual => Some(Operator::LShift),
        TokenKind::RightShiftEqual => Some(Operator::RShift),
        TokenKind::PipeEqual => Some(Operator::BitOr),
        TokenKind::CaretEqual => Some(Operator::BitXor),
        TokenKind::AmperEqual => Some(Operator::BitAnd),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{names, parse_err, parse_ok, stored};
    use super::*;
    use crate::lexer::LexErrorKind;

    /// The expression of the first statement of a one-line module.
    fn expr_kind(source: &str) -> NodeKind {
        let ast = parse_ok(source);
        let module = ast.get(ast.root()).unwrap();
        let stmt = ast.get(module.children[0]).unwrap();
        assert_eq!(stmt.kind, NodeKind::ExprStmt);
        ast.get(stmt.children[0]).unwrap().kind.clone()
    }

    fn first_expr_children(source: &str) -> (Ast, Vec<NodeId>) {
        let ast = parse_ok(source);
        let module = ast.get(ast.root()).unwrap();
        let stmt = ast.get(module.children[0]).unwrap();
        let expr = ast.get(stmt.children[0]).unwrap();
        let children = expr.children.clone();
        (ast, children)
    }

    #[test]
    fn parse_binary_precedence() {
        let (ast, children) = first_expr_children("1 + 2 * 3");
        assert_eq!(
            ast.get(children[1]).unwrap().kind,
            NodeKind::BinOp { op: Operator::Mult }
        );
    }

    #[test]
    fn power_is_right_associative_and_binds_unary_rhs() {
        assert_eq!(expr_kind("2 ** 3 ** 2"), NodeKind::BinOp { op: Operator::Pow });
        let (ast, children) = first_expr_children("2 ** -1");
        assert_eq!(
            ast.get(children[1]).unwrap().kind,
            NodeKind::UnaryOp { op: UnaryOp::USub }
        );
        assert_eq!(
            expr_kind("-2 ** 2"),
            NodeKind::UnaryOp { op: UnaryOp::USub }
        );
    }

    #[test]
    fn parse_bool_ops_flatten() {
        let (_, children) = first_expr_children("a or b or c");
        assert_eq!(children.len(), 3);
        assert_eq!(expr_kind("not a and b"), NodeKind::BoolOp { op: BoolOp::And });
    }

    #[test]
    fn parse_chained_comparison() {
        assert_eq!(
            expr_kind("a < b <= c is not d not in e"),
            NodeKind::Compare {
                ops: vec![CmpOp::Lt, CmpOp::LtE, CmpOp::IsNot, CmpOp::NotIn]
            }
        );
    }

    #[test]
    fn parse_conditional_and_lambda() {
        assert_eq!(expr_kind("a if b else c"), NodeKind::IfExp);
        assert_eq!(expr_kind("lambda x, *ys, k=1, **kw: x"), NodeKind::Lambda);
        assert_eq!(
            parse_err("a if b\n").kind,
            ParseErrorKind::Expected("'else' after 'if' expression")
        );
    }

    #[test]
    fn parse_calls_attributes_subscripts() {
        assert_eq!(expr_kind("obj.method(a, *b, k=1, **c)"), NodeKind::Call);
        assert_eq!(
            expr_kind("a[1:2, ::3, x]"),
            NodeKind::Subscript {
                ctx: ExprContext::Load
            }
        );
        assert_eq!(expr_kind("sum(x for x in y)"), NodeKind::Call);
    }

    #[test]
    fn parse_displays() {
        assert_eq!(
            expr_kind("(1, *a, 2)"),
            NodeKind::Tuple {
                ctx: ExprContext::Load
            }
        );
        assert_eq!(
            expr_kind("()"),
            NodeKind::Tuple {
                ctx: ExprContext::Load
            }
        );
        assert_eq!(expr_kind("{1: 2, **m}"), NodeKind::Dict);
        assert_eq!(expr_kind("{1, 2}"), NodeKind::Set);
        assert_eq!(expr_kind("{}"), NodeKind::Dict);
        assert_eq!(
            expr_kind("[1, 2,]"),
            NodeKind::List {
                ctx: ExprContext::Load
            }
        );
    }

    #[test]
    fn parse_comprehensions_bind_targets() {
        let ast = parse_ok("[x * y for x in a if x for y in b]\n{k: v for k, v in d}\n");
        assert_eq!(stored(&ast), vec!["x", "y", "k", "v"]);
    }

    #[test]
    fn parse_walrus_binds() {
        let ast = parse_ok("if (n := len(a)) > 10:\n    pass\n");
        assert_eq!(stored(&ast), vec!["n"]);
    }

    #[test]
    fn adjacent_strings_concatenate() {
        assert_eq!(
            expr_kind("'a' \"b\""),
            NodeKind::Constant {
                value: Constant::Str("'a' \"b\"".into())
            }
        );
    }

    #[test]
    fn await_and_yield() {
        let ast = parse_ok("async def f():\n    x = await g()\n    y = yield x\n    yield from z\n");
        let loads: Vec<_> = names(&ast)
            .into_iter()
            .filter(|(_, ctx)| *ctx == ExprContext::Load)
            .map(|(id, _)| id)
            .collect();
        assert_eq!(loads, vec!["g", "x", "z"]);
    }

    #[test]
    fn positional_after_keyword_argument() {
        let err = parse_err("f(a=1, b)\n");
        assert_eq!(err.kind, ParseErrorKind::PositionalAfterKeyword);
        assert_eq!(err.position.column, 7);
    }

    #[test]
    fn missing_operand_is_invalid_syntax() {
        let err = parse_err("x = 1 +\n");
        assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
        assert_eq!(err.position.line, 1);
    }

    #[test]
    fn missing_comma_in_call() {
        assert_eq!(parse_err("f(a b)\n").kind, ParseErrorKind::InvalidSyntax);
    }

    #[test]
    fn argument_order_rules() {
        let err = parse_err("f(**kw, *args)\n");
        assert_eq!(err.kind, ParseErrorKind::UnpackingAfterKeywordUnpacking);
        assert_eq!(err.position.column, 8);

        for source in ["f(x for x in y, 1)\n", "f(1, x for x in y)\n", "f(x for x in y,)\n"] {
            assert_eq!(
                parse_err(source).kind,
                ParseErrorKind::UnparenthesizedGenerator,
                "{source}"
            );
        }
        parse_ok("f(*args, **kw)\nf(a=1, *args)\nf(**kw, a=1)\nf((x for x in y), 1)\n");
    }

    #[test]
    fn not_cannot_start_an_operand() {
        for source in ["a is not not b\n", "a == not b\n", "x = 1 + not 2\n"] {
            assert_eq!(parse_err(source).kind, ParseErrorKind::InvalidSyntax, "{source}");
        }
        let err = parse_err("a is not not b\n");
        assert_eq!(err.position.column, 9);
        assert_eq!(expr_kind("a and not b"), NodeKind::BoolOp { op: BoolOp::And });
        assert_eq!(expr_kind("not not a"), NodeKind::UnaryOp { op: UnaryOp::Not });
    }

    #[test]
    fn bytes_and_text_literals_do_not_mix() {
        let err = parse_err("x = 'a' b'b'\n");
        assert_eq!(err.kind, ParseErrorKind::MixedBytesLiterals);
        assert_eq!(err.to_string(), "cannot mix bytes and nonbytes literals");
        assert_eq!(err.position.column, 4);
        parse_ok("x = b'a' Rb'b'\ny = 'a' f'{x}'\n");

        let err = parse_err("x = b'\u{e9}'\n");
        assert_eq!(
            err.kind,
            ParseErrorKind::Lex(LexErrorKind::NonAsciiBytes)
        );
    }

    #[test]
    fn malformed_fstrings_are_syntax_errors() {
        assert_eq!(
            parse_err("print(f\"{name\")\n").kind,
            ParseErrorKind::Lex(LexErrorKind::FStringExpectingBrace)
        );
        assert_eq!(
            parse_err("f\"{}\"\n").to_string(),
            "f-string: valid expression required before '}'"
        );
        assert_eq!(
            parse_err("f\"{name!z}\"\n").to_string(),
            "f-string: invalid conversion character 'z': expected 's', 'r', or 'a'"
        );
        parse_ok("print(f\"{name!r:>{width}} {{done}}\")\n");
    }
}
