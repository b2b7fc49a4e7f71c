use crate::ast::*;
use crate::lexer::TokenKind;

use super::expressions::can_start_expression;
use super::{ParseErrorKind, ParseResult, Parser, TargetAction};

impl Parser {
    /// `star_targets` of `for`, comprehensions and `del`: comma-separated
    /// items parsed at `bitwise_or` level so a following `in` is not consumed.
    pub(super) fn parse_target_list(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let first = self.parse_target_item()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            if !can_start_expression(self.peek()) {
                break;
            }
            items.push(self.parse_target_item()?);
        }
        Ok(self.push(
            NodeKind::Tuple {
                ctx: ExprContext::Load,
            },
            start,
            items,
        ))
    }

    fn parse_target_item(&mut self) -> ParseResult<NodeId> {
        if !self.check(TokenKind::Star) {
            return self.parse_bitwise_or();
        }
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

    /// Mark `target` (and its nested names) as bound.
    pub(super) fn store_target(&mut self, target: NodeId) -> ParseResult<()> {
        self.set_context(target, ExprContext::Store, TargetAction::Assign)
    }

    /// Mark `target` (and its nested names) as deleted.
    pub(super) fn delete_target(&mut self, target: NodeId) -> ParseResult<()> {
        self.set_context(target, ExprContext::Del, TargetAction::Delete)
    }

    /// Single-target forms (augmented assignment, annotation) accept only a
    /// name, an attribute or a subscript.
    pub(super) fn store_single_target(&mut self, target: NodeId, augmented: bool) -> ParseResult<()> {
        let Some(node) = self.builder.get(target) else {
            return Ok(());
        };
        let simple = matches!(
            node.kind,
            NodeKind::Name { .. } | NodeKind::Attribute { .. } | NodeKind::Subscript { .. }
        );
        if !simple {
            let position = node.span.start;
            let kind = if augmented {
                ParseErrorKind::IllegalAugmentedTarget(match node.kind {
                    NodeKind::Tuple { .. } => "tuple",
                    NodeKind::List { .. } => "list",
                    NodeKind::Starred { .. } => "starred",
                    _ => node.kind.describe(),
                })
            } else {
                ParseErrorKind::IllegalAnnotationTarget
            };
            return Err(self.error_at(kind, position));
        }
        self.store_target(target)
    }

    fn set_context(&mut self, id: NodeId, ctx: ExprContext, action: TargetAction) -> ParseResult<()> {
        let Some(node) = self.builder.get_mut(id) else {
            return Ok(());
        };
        let position = node.span.start;
        let outcome = match &mut node.kind {
            NodeKind::Name { ctx: slot, .. }
            | NodeKind::Attribute { ctx: slot, .. }
            | NodeKind::Subscript { ctx: slot } => {
                *slot = ctx;
                Ok(false)
            }
            NodeKind::Starred { .. } if action == TargetAction::Delete => Err("starred"),
            NodeKind::Starred { ctx: slot }
            | NodeKind::Tuple { ctx: slot }
            | NodeKind::List { ctx: slot } => {
                *slot = ctx;
                Ok(true)
            }
            other => Err(other.describe()),
        };
        let children = node.children.clone();

        match outcome {
            Err(what) => Err(self.error_at(ParseErrorKind::InvalidTarget { action, what }, position)),
            Ok(false) => Ok(()),
            Ok(true) => {
                for child in children {
                    self.set_context(child, ctx, action)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{names, parse_err, parse_ok, stored};
    use super::*;

    #[test]
    fn unpacking_targets_bind_every_name() {
        let ast = parse_ok("a, (b, [c, *d]) = x\n");
        assert_eq!(stored(&ast), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn attribute_and_subscript_targets_keep_their_base_loaded() {
        let ast = parse_ok("obj.attr = items[i] = 1\n");
        assert!(stored(&ast).is_empty());
        let loads: Vec<_> = names(&ast).into_iter().map(|(id, _)| id).collect();
        assert_eq!(loads, vec!["obj", "items", "i"]);
    }

    #[test]
    fn for_target_stops_before_in() {
        let ast = parse_ok("for k, v in pairs:\n    pass\n");
        assert_eq!(stored(&ast), vec!["k", "v"]);
    }

    #[test]
    fn del_marks_delete_context() {
        let ast = parse_ok("del a, b[0]\n");
        assert_eq!(
            names(&ast)[0],
            ("a".to_string(), ExprContext::Del)
        );
    }

    #[test]
    fn cannot_assign_to_call() {
        let err = parse_err("f() = 1\n");
        assert_eq!(
            err.kind,
            ParseErrorKind::InvalidTarget {
                action: TargetAction::Assign,
                what: "function call"
            }
        );
        assert_eq!(err.to_string(), "cannot assign to function call");
    }

    #[test]
    fn cannot_assign_to_keyword_constant() {
        assert_eq!(
            parse_err("None = 1\n").to_string(),
            "cannot assign to None"
        );
    }

    #[test]
    fn cannot_delete_literal() {
        assert_eq!(parse_err("del 1\n").to_string(), "cannot delete literal");
    }

    #[test]
    fn augmented_and_annotated_targets() {
        assert_eq!(
            parse_err("a, b += 1\n").kind,
            ParseErrorKind::IllegalAugmentedTarget("tuple")
        );
        assert_eq!(
            parse_err("(a, b): int\n").kind,
            ParseErrorKind::IllegalAnnotationTarget
        );
        let ast = parse_ok("total += 1\ncount: int = 0\n");
        assert_eq!(stored(&ast), vec!["total", "count"]);
    }
}
