use pydiag_common::Span;

use super::nodes::*;

/// Deepest node nesting [`walk`] will descend into.
pub const MAX_WALK_DEPTH: usize = 1000;

/// Why a walk stopped early.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalkError {
    #[error("syntax tree nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },
    #[error("node {0} is not part of the tree")]
    DanglingNode(NodeId),
}

/// Visitor over an arena [`Ast`].
///
/// `visit_node` is called once per node in pre-order and dispatches to the
/// specific hooks below; override the hooks you care about.
pub trait Visitor {
    fn visit_node(&mut self, node: &Node) {
        match &node.kind {
            NodeKind::Name { id, ctx } => self.visit_name(id, *ctx, node.span),
            NodeKind::FunctionDef { name, .. } => self.visit_function_def(name, node.span),
            NodeKind::ClassDef { name } => self.visit_class_def(name, node.span),
            NodeKind::Parameter { name, kind } => self.visit_parameter(name, *kind),
            NodeKind::Import { names } => self.visit_import(names),
            NodeKind::ImportFrom { module, names, .. } => {
                self.visit_import_from(module.as_deref(), names)
            }
            NodeKind::ExceptHandler { name: Some(name) } => self.visit_except_handler(name),
            NodeKind::MatchAs { name } => self.visit_match_capture(name),
            NodeKind::TypeParam { name } => self.visit_type_param(name),
            _ => {}
        }
    }

    fn visit_name(&mut self, _id: &str, _ctx: ExprContext, _span: Span) {}

    fn visit_function_def(&mut self, _name: &str, _span: Span) {}

    fn visit_class_def(&mut self, _name: &str, _span: Span) {}

    /// Parameters of both `def` and `lambda`.
    fn visit_parameter(&mut self, _name: &str, _kind: ParamKind) {}

    fn visit_import(&mut self, _names: &[Alias]) {}

    fn visit_import_from(&mut self, _module: Option<&str>, _names: &[Alias]) {}

    /// The `name` of `except E as name`.
    fn visit_except_handler(&mut self, _name: &str) {}

    /// The `name` of `case pattern as name`.
    fn visit_match_capture(&mut self, _name: &str) {}

    fn visit_type_param(&mut self, _name: &str) {}
}

/// Walk the whole tree in pre-order with the default depth limit.
pub fn walk<V: Visitor + ?Sized>(ast: &Ast, visitor: &mut V) -> Result<(), WalkError> {
    walk_with_limit(ast, visitor, MAX_WALK_DEPTH)
}

/// Iterative pre-order walk. Nodes visited before an error stay visited.
pub fn walk_with_limit<V: Visitor + ?Sized>(
    ast: &Ast,
    visitor: &mut V,
    limit: usize,
) -> Result<(), WalkError> {
    let mut stack = vec![(ast.root(), 1usize)];
    while let Some((id, depth)) = stack.pop() {
        if depth > limit {
            return Err(WalkError::DepthExceeded { limit });
        }
        let node = ast.get(id).ok_or(WalkError::DanglingNode(id))?;
        visitor.visit_node(node);
        stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct NameOrder(Vec<String>);

    impl Visitor for NameOrder {
        fn visit_name(&mut self, id: &str, _ctx: ExprContext, _span: Span) {
            self.0.push(id.to_string());
        }
    }

    fn name(builder: &mut AstBuilder, id: &str) -> NodeId {
        builder.push(
            NodeKind::Name {
                id: id.into(),
                ctx: ExprContext::Load,
            },
            Span::default(),
            vec![],
        )
    }

    #[test]
    fn visits_in_source_order() {
        let mut builder = AstBuilder::new();
        let a = name(&mut builder, "a");
        let b = name(&mut builder, "b");
        let add = builder.push(
            NodeKind::BinOp { op: Operator::Add },
            Span::default(),
            vec![a, b],
        );
        let c = name(&mut builder, "c");
        let s1 = builder.push(NodeKind::ExprStmt, Span::default(), vec![add]);
        let s2 = builder.push(NodeKind::ExprStmt, Span::default(), vec![c]);
        let root = builder.push(NodeKind::Module, Span::default(), vec![s1, s2]);
        let ast = builder.finish(root);

        let mut order = NameOrder::default();
        walk(&ast, &mut order).unwrap();
        assert_eq!(order.0, vec!["a", "b", "c"]);
    }

    #[test]
    fn depth_limit_keeps_partial_results() {
        let mut builder = AstBuilder::new();
        let mut inner = name(&mut builder, "deep");
        for _ in 0..10 {
            inner = builder.push(NodeKind::ExprStmt, Span::default(), vec![inner]);
        }
        let top = name(&mut builder, "top");
        let root = builder.push(NodeKind::Module, Span::default(), vec![top, inner]);
        let ast = builder.finish(root);

        let mut order = NameOrder::default();
        let err = walk_with_limit(&ast, &mut order, 5).unwrap_err();
        assert_eq!(err, WalkError::DepthExceeded { limit: 5 });
        assert_eq!(order.0, vec!["top"]);
    }

    #[test]
    fn dangling_child_is_reported() {
        let mut builder = AstBuilder::new();
        let bogus = NodeId(42);
        let root = builder.push(NodeKind::Module, Span::default(), vec![bogus]);
        let ast = builder.finish(root);

        let mut order = NameOrder::default();
        assert_eq!(
            walk(&ast, &mut order).unwrap_err(),
            WalkError::DanglingNode(bogus)
        );
    }
}
