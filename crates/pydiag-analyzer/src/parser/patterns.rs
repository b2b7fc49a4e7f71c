//! `match` statements and `case` patterns.
//!
//! Patterns are parsed with the expression grammar (plus `as` captures) and
//! the bare names in capture positions are then rebound as stores.

use crate::ast::*;
use crate::lexer::TokenKind;

use super::{ParseErrorKind, ParseResult, Parser};

impl Parser {
    /// Parse a `match` statement if the soft keyword starts one.
    ///
    /// Returns `Ok(None)` with the parser rewound when `match` is an ordinary
    /// name (`match = 1`, `match(x)`).
    pub(super) fn try_parse_match(&mut self) -> ParseResult<Option<NodeId>> {
        let checkpoint = self.checkpoint();
        let start = self.current_start();
        self.advance(); // consume 'match'

        let subject = match self.parse_star_named_expressions() {
            Ok(subject)
                if self.check(TokenKind::Colon) && self.peek_at(1) == TokenKind::Newline =>
            {
                subject
            }
            _ => {
                self.restore(checkpoint);
                return Ok(None);
            }
        };
        self.advance(); // consume ':'
        self.advance(); // consume NEWLINE

        if !self.eat(TokenKind::Indent) {
            return Err(self.error_here(ParseErrorKind::MissingIndentedBlock {
                construct: "'match' statement",
                header_line: start.line,
            }));
        }

        let mut children = vec![subject];
        while !self.check(TokenKind::Dedent) && !self.is_at_end() {
            if self.check(TokenKind::Indent) {
                return Err(self.error_here(ParseErrorKind::UnexpectedIndent));
            }
            if !self.check_soft_keyword("case") {
                return Err(self.error_here(ParseErrorKind::InvalidSyntax));
            }
            children.push(self.parse_case()?);
        }
        if !self.eat(TokenKind::Dedent) {
            return Err(self.error_here(ParseErrorKind::InvalidSyntax));
        }

        Ok(Some(self.push(NodeKind::Match, start, children)))
    }

    /// `case pattern [if guard]: block`
    fn parse_case(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance(); // consume 'case'

        let mut children = vec![self.parse_patterns()?];
        if self.eat(TokenKind::If) {
            children.push(self.parse_named_expression()?);
        }
        self.expect(TokenKind::Colon)?;
        children.push(self.parse_block("'case' statement", start.line)?);

        Ok(self.push(NodeKind::MatchCase, start, children))
    }

    fn parse_patterns(&mut self) -> ParseResult<NodeId> {
        let was_in_pattern = self.in_pattern;
        self.in_pattern = true;
        let result = self.parse_open_sequence_pattern();
        self.in_pattern = was_in_pattern;

        let pattern = result?;
        self.check_pattern(pattern)?;
        Ok(pattern)
    }

    /// `a, *rest` without brackets becomes a tuple pattern.
    fn parse_open_sequence_pattern(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let first = self.parse_as_pattern()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            if self.check(TokenKind::Colon) || self.check(TokenKind::If) {
                break;
            }
            items.push(self.parse_as_pattern()?);
        }
        Ok(self.push(
            NodeKind::Tuple {
                ctx: ExprContext::Load,
            },
            start,
            items,
        ))
    }

    fn parse_as_pattern(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let pattern = if self.check(TokenKind::Star) {
            self.parse_star_named_expression()?
        } else {
            self.parse_bitwise_or()?
        };
        self.pattern_capture(pattern, start)
    }

    /// Reject expressions that are not patterns, and rebind bare names in
    /// capture positions as stores. Class names, dotted value patterns and
    /// mapping keys stay loads.
    ///
    /// Or-patterns build left-leaning chains without nesting, so the tree
    /// is walked with an explicit stack.
    fn check_pattern(&mut self, root: NodeId) -> ParseResult<()> {
        let mut stack = vec![(root, Slot::Pattern)];

        while let Some((id, slot)) = stack.pop() {
            let Some(node) = self.builder.get(id) else {
                continue;
            };
            let start = node.span.start;
            let kind = node.kind.clone();
            let children = node.children.clone();

            let valid = match (slot, &kind) {
                (_, NodeKind::Attribute { .. }) => {
                    stack.extend(children.iter().map(|&child| (child, Slot::Dotted)));
                    true
                }
                (Slot::Dotted, NodeKind::Name { .. }) => true,
                (Slot::Dotted, _) => false,
                (Slot::MappingKey, _) => self.is_literal_pattern(id),
                (_, _) if self.is_literal_pattern(id) => true,
                (Slot::SequenceItem, NodeKind::Starred { .. }) => match children.first() {
                    Some(&target) if self.is_name(target) => {
                        self.store_capture(target);
                        true
                    }
                    _ => false,
                },
                (_, NodeKind::Name { .. }) => {
                    self.store_capture(id);
                    true
                }
                (_, NodeKind::BinOp { op: Operator::BitOr }) => {
                    stack.extend(children.iter().map(|&child| (child, Slot::Pattern)));
                    true
                }
                (_, NodeKind::MatchAs { name }) => {
                    if name == "_" {
                        return Err(self.error_at(ParseErrorKind::WildcardTarget, start));
                    }
                    stack.extend(children.iter().map(|&child| (child, Slot::Pattern)));
                    true
                }
                (_, NodeKind::Tuple { .. } | NodeKind::List { .. }) => {
                    self.check_sequence(&children)?;
                    stack.extend(children.iter().map(|&child| (child, Slot::SequenceItem)));
                    true
                }
                (_, NodeKind::Call) => {
                    self.check_class_pattern(&children, &mut stack)?;
                    true
                }
                (_, NodeKind::Dict) => {
                    self.check_mapping(&children, &mut stack)?;
                    true
                }
                _ => false,
            };

            if !valid {
                return Err(self.error_at(ParseErrorKind::InvalidSyntax, start));
            }
        }
        Ok(())
    }

    /// At most one `*name` per sequence pattern.
    fn check_sequence(&self, items: &[NodeId]) -> ParseResult<()> {
        let mut stars = items
            .iter()
            .filter(|&&item| matches!(self.node_kind(item), Some(NodeKind::Starred { .. })));
        if let (Some(_), Some(&second)) = (stars.next(), stars.next()) {
            let start = self.builder.span(second).start;
            return Err(self.error_at(ParseErrorKind::InvalidSyntax, start));
        }
        Ok(())
    }

    /// `Dotted.Name(positional, keyword=pattern)`.
    fn check_class_pattern(
        &self,
        children: &[NodeId],
        stack: &mut Vec<(NodeId, Slot)>,
    ) -> ParseResult<()> {
        let Some((&class, arguments)) = children.split_first() else {
            return Ok(());
        };
        stack.push((class, Slot::Dotted));
        for &argument in arguments {
            let Some(node) = self.builder.get(argument) else {
                continue;
            };
            match &node.kind {
                NodeKind::Keyword { arg: Some(_) } => {
                    stack.extend(node.children.iter().map(|&value| (value, Slot::Pattern)));
                }
                NodeKind::Keyword { arg: None }
                | NodeKind::Starred { .. }
                | NodeKind::GeneratorExp => {
                    return Err(self.error_at(ParseErrorKind::InvalidSyntax, node.span.start));
                }
                _ => stack.push((argument, Slot::Pattern)),
            }
        }
        Ok(())
    }

    /// `{key: pattern, **rest}`: keys are literals or dotted values and a
    /// `**rest` capture may only come last.
    fn check_mapping(
        &mut self,
        entries: &[NodeId],
        stack: &mut Vec<(NodeId, Slot)>,
    ) -> ParseResult<()> {
        let mut index = 0;
        while index < entries.len() {
            let entry = entries[index];
            if matches!(self.node_kind(entry), Some(NodeKind::DictUnpack)) {
                let rest = self
                    .builder
                    .get(entry)
                    .and_then(|node| node.children.first().copied());
                let is_last = index + 1 == entries.len();
                match rest {
                    Some(rest) if is_last && self.is_name(rest) && !self.is_wildcard(rest) => {
                        self.store_capture(rest);
                    }
                    _ => {
                        let start = self.builder.span(entry).start;
                        return Err(self.error_at(ParseErrorKind::InvalidSyntax, start));
                    }
                }
                index += 1;
            } else {
                stack.push((entry, Slot::MappingKey));
                if let Some(&value) = entries.get(index + 1) {
                    stack.push((value, Slot::Pattern));
                }
                index += 2;
            }
        }
        Ok(())
    }

    /// Literal patterns: constants other than `...`, signed numbers and
    /// complex literals like `-1 + 2j`.
    fn is_literal_pattern(&self, id: NodeId) -> bool {
        let Some(node) = self.builder.get(id) else {
            return false;
        };
        match &node.kind {
            NodeKind::Constant { value } => !matches!(value, Constant::Ellipsis),
            NodeKind::UnaryOp { op: UnaryOp::USub } => self.signed_number(id).is_some(),
            NodeKind::BinOp {
                op: Operator::Add | Operator::Sub,
            } => match node.children.as_slice() {
                [real, imaginary] => {
                    self.signed_number(*real).is_some_and(|n| !is_imaginary(n))
                        && self.number(*imaginary).is_some_and(is_imaginary)
                }
                _ => false,
            },
            _ => false,
        }
    }

    /// Source text of a number literal, optionally negated.
    fn signed_number(&self, id: NodeId) -> Option<&str> {
        let node = self.builder.get(id)?;
        match (&node.kind, node.children.as_slice()) {
            (NodeKind::UnaryOp { op: UnaryOp::USub }, [operand]) => self.number(*operand),
            _ => self.number(id),
        }
    }

    fn number(&self, id: NodeId) -> Option<&str> {
        match self.node_kind(id)? {
            NodeKind::Constant {
                value: Constant::Number(text),
            } => Some(text.as_str()),
            _ => None,
        }
    }

    fn is_name(&self, id: NodeId) -> bool {
        matches!(self.node_kind(id), Some(NodeKind::Name { .. }))
    }

    fn is_wildcard(&self, id: NodeId) -> bool {
        matches!(self.node_kind(id), Some(NodeKind::Name { id: name, .. }) if name == "_")
    }

    fn store_capture(&mut self, id: NodeId) {
        if let Some(NodeKind::Name { ctx, .. }) = self.builder.get_mut(id).map(|node| &mut node.kind) {
            *ctx = ExprContext::Store;
        }
    }
}

/// What a node must be at its position inside a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Pattern,
    /// Element of a sequence pattern, where `*name` is allowed.
    SequenceItem,
    /// Key of a mapping pattern.
    MappingKey,
    /// Class name or the base of a value pattern: `Name` or `a.b.c`.
    Dotted,
}

fn is_imaginary(number: &str) -> bool {
    number.ends_with(['j', 'J'])
}
