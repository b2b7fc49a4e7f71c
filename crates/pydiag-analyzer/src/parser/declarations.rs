use pydiag_common::Position;

use crate::ast::*;
use crate::lexer::TokenKind;

use super::{ParseErrorKind, ParseResult, Parser};

impl Parser {
    // ========================================================================
    // Decorators, functions, classes
    // ========================================================================

    /// `@decorator` lines followed by a `def`, `async def` or `class`.
    pub(super) fn parse_decorated(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        let mut decorators = Vec::new();
        while self.check(TokenKind::At) {
            let decorator_start = self.current_start();
            self.advance(); // consume '@'
            let expr = self.parse_named_expression()?;
            self.expect_newline()?;
            decorators.push(self.push(NodeKind::Decorator, decorator_start, vec![expr]));
        }

        match self.peek() {
            TokenKind::Def => self.parse_function_def(decorators, start, false),
            TokenKind::Async if self.peek_at(1) == TokenKind::Def => {
                self.advance(); // consume 'async'
                self.parse_function_def(decorators, start, true)
            }
            TokenKind::Class => self.parse_class_def(decorators, start),
            _ => Err(self.error_here(ParseErrorKind::InvalidSyntax)),
        }
    }

    /// `def name[T](params) -> ret: body`, with the current token on `def`.
    pub(super) fn parse_function_def(
        &mut self,
        decorators: Vec<NodeId>,
        start: Position,
        is_async: bool,
    ) -> ParseResult<NodeId> {
        let header_line = self.current().line();
        self.advance(); // consume 'def'
        let name = self.expect_name()?;

        let mut children = decorators;
        children.extend(self.parse_type_params()?);
        self.expect(TokenKind::LeftParen)?;
        children.extend(self.parse_parameters(TokenKind::RightParen, true)?);
        self.expect_closer(TokenKind::RightParen)?;
        if self.eat(TokenKind::Arrow) {
            children.push(self.parse_expression()?);
        }
        self.expect(TokenKind::Colon)?;
        children.push(self.parse_block("function definition", header_line)?);

        Ok(self.push(NodeKind::FunctionDef { name, is_async }, start, children))
    }

    /// `class Name[T](bases, key=value): body`, with the current token on `class`.
    pub(super) fn parse_class_def(
        &mut self,
        decorators: Vec<NodeId>,
        start: Position,
    ) -> ParseResult<NodeId> {
        let header_line = self.current().line();
        self.advance(); // consume 'class'
        let name = self.expect_name()?;

        let mut children = decorators;
        children.extend(self.parse_type_params()?);
        if self.eat(TokenKind::LeftParen) {
            children.extend(self.parse_call_arguments(false)?);
            self.expect_closer(TokenKind::RightParen)?;
        }
        self.expect(TokenKind::Colon)?;
        children.push(self.parse_block("class definition", header_line)?);

        Ok(self.push(NodeKind::ClassDef { name }, start, children))
    }

    /// Optional `[T, *Ts, **P, U: bound = default]` list.
    fn parse_type_params(&mut self) -> ParseResult<Vec<NodeId>> {
        if !self.check(TokenKind::LeftBracket) {
            return Ok(Vec::new());
        }
        self.advance();
        if self.check(TokenKind::RightBracket) {
            return Err(self.error_here(ParseErrorKind::InvalidSyntax));
        }

        let mut params = Vec::new();
        while !self.check(TokenKind::RightBracket) {
            let start = self.current_start();
            if !self.eat(TokenKind::Star) {
                self.eat(TokenKind::DoubleStar);
            }
            let name = self.expect_name()?;
            let mut children = Vec::new();
            if self.eat(TokenKind::Colon) {
                children.push(self.parse_expression()?);
            }
            if self.eat(TokenKind::Equal) {
                children.push(self.parse_expression()?);
            }
            params.push(self.push(NodeKind::TypeParam { name }, start, children));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect_closer(TokenKind::RightBracket)?;
        Ok(params)
    }

    // ========================================================================
    // Parameters
    // ========================================================================

    /// Parameter list of a `def` (annotated) or a `lambda`, up to but not
    /// including `closer`.
    pub(super) fn parse_parameters(
        &mut self,
        closer: TokenKind,
        annotated: bool,
    ) -> ParseResult<Vec<NodeId>> {
        let mut params: Vec<NodeId> = Vec::new();
        let mut seen_default = false;
        let mut seen_slash = false;
        let mut keyword_only = false;
        let mut bare_star = false;
        let mut seen_var_keyword = false;

        while !self.check(closer) {
            if seen_var_keyword {
                return Err(self.error_here(ParseErrorKind::InvalidSyntax));
            }
            let start = self.current_start();
            match self.peek() {
                TokenKind::Slash => {
                    if seen_slash || keyword_only || params.is_empty() {
                        return Err(self.error_here(ParseErrorKind::InvalidSyntax));
                    }
                    self.advance();
                    seen_slash = true;
                    for &param in &params {
                        if let Some(node) = self.builder.get_mut(param) {
                            if let NodeKind::Parameter { kind, .. } = &mut node.kind {
                                *kind = ParamKind::PositionalOnly;
                            }
                        }
                    }
                }
                TokenKind::Star => {
                    if keyword_only {
                        return Err(self.error_here(ParseErrorKind::InvalidSyntax));
                    }
                    self.advance();
                    keyword_only = true;
                    if self.check(TokenKind::Name) {
                        let name = self.advance().lexeme.clone();
                        let children = self.parse_annotation(annotated)?;
                        params.push(self.push(
                            NodeKind::Parameter {
                                name,
                                kind: ParamKind::VarPositional,
                            },
                            start,
                            children,
                        ));
                    } else if self.check(TokenKind::Comma) {
                        bare_star = true;
                    } else {
                        return Err(self.error_here(ParseErrorKind::BareStarWithoutNames));
                    }
                }
                TokenKind::DoubleStar => {
                    if bare_star {
                        return Err(self.error_at(ParseErrorKind::BareStarWithoutNames, start));
                    }
                    self.advance();
                    let name = self.expect_name()?;
                    let children = self.parse_annotation(annotated)?;
                    seen_var_keyword = true;
                    params.push(self.push(
                        NodeKind::Parameter {
                            name,
                            kind: ParamKind::VarKeyword,
                        },
                        start,
                        children,
                    ));
                }
                _ => {
                    let name = self.expect_name()?;
                    let mut children = self.parse_annotation(annotated)?;
                    if self.eat(TokenKind::Equal) {
                        children.push(self.parse_expression()?);
                        if !keyword_only {
                            seen_default = true;
                        }
                    } else if seen_default && !keyword_only {
                        return Err(self.error_at(ParseErrorKind::NonDefaultAfterDefault, start));
                    }
                    bare_star = false;
                    let kind = if keyword_only {
                        ParamKind::KeywordOnly
                    } else {
                        ParamKind::Regular
                    };
                    params.push(self.push(NodeKind::Parameter { name, kind }, start, children));
                }
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if bare_star {
            return Err(self.error_here(ParseErrorKind::BareStarWithoutNames));
        }

        Ok(params)
    }

    fn parse_annotation(&mut self, annotated: bool) -> ParseResult<Vec<NodeId>> {
        if annotated && self.eat(TokenKind::Colon) {
            Ok(vec![self.parse_star_expression()?])
        } else {
            Ok(Vec::new())
        }
    }

    // ========================================================================
    // Imports
    // ========================================================================

    /// `import a.b as c, d`
    pub(super) fn parse_import(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance(); // consume 'import'

        let mut names = Vec::new();
        loop {
            let alias_start = self.current_start();
            let name = self.parse_dotted_name()?;
            let asname = self.parse_as_name()?;
            names.push(Alias {
                name,
                asname,
                span: self.span_from(alias_start),
            });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        Ok(self.push(NodeKind::Import { names }, start, vec![]))
    }

    /// `from ..pkg.mod import a as b, c`, `from . import (x, y,)`, `from m import *`
    pub(super) fn parse_import_from(&mut self) -> ParseResult<NodeId> {
        let start = self.current_start();
        self.advance(); // consume 'from'

        let mut level = 0u32;
        loop {
            if self.eat(TokenKind::Dot) {
                level += 1;
            } else if self.eat(TokenKind::Ellipsis) {
                level += 3;
            } else {
                break;
            }
        }
        let module = if self.check(TokenKind::Name) {
            Some(self.parse_dotted_name()?)
        } else {
            None
        };
        if module.is_none() && level == 0 {
            return Err(self.error_here(ParseErrorKind::InvalidSyntax));
        }
        self.expect(TokenKind::Import)?;

        let names = if self.check(TokenKind::Star) {
            let alias_start = self.current_start();
            self.advance();
            vec![Alias {
                name: "*".to_string(),
                asname: None,
                span: self.span_from(alias_start),
            }]
        } else if self.eat(TokenKind::LeftParen) {
            let mut names = vec![self.parse_import_alias()?];
            while self.eat(TokenKind::Comma) {
                if self.check(TokenKind::RightParen) {
                    break;
                }
                names.push(self.parse_import_alias()?);
            }
            self.expect_closer(TokenKind::RightParen)?;
            names
        } else {
            let mut names = vec![self.parse_import_alias()?];
            while self.eat(TokenKind::Comma) {
                names.push(self.parse_import_alias()?);
            }
            names
        };

        Ok(self.push(
            NodeKind::ImportFrom {
                module,
                level,
                names,
            },
            start,
            vec![],
        ))
    }

    fn parse_import_alias(&mut self) -> ParseResult<Alias> {
        let start = self.current_start();
        let name = self.expect_name()?;
        let asname = self.parse_as_name()?;
        Ok(Alias {
            name,
            asname,
            span: self.span_from(start),
        })
    }

    fn parse_as_name(&mut self) -> ParseResult<Option<String>> {
        if self.eat(TokenKind::As) {
            Ok(Some(self.expect_name()?))
        } else {
            Ok(None)
        }
    }

    fn parse_dotted_name(&mut self) -> ParseResult<String> {
        let mut name = self.expect_name()?;
        while self.eat(TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_name()?);
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{parse_err, parse_ok};
    use super::*;

    fn first_stmt(ast: &Ast) -> &Node {
        let module = ast.get(ast.root()).unwrap();
        ast.get(module.children[0]).unwrap()
    }

    fn params(ast: &Ast) -> Vec<(String, ParamKind)> {
        let func = first_stmt(ast);
        func.children
            .iter()
            .filter_map(|&id| match &ast.get(id).unwrap().kind {
                NodeKind::Parameter { name, kind } => Some((name.clone(), *kind)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn parse_function_with_all_parameter_kinds() {
        let ast = parse_ok("def f(a, b=1, /, c: int = 2, *args, d, e=3, **kw) -> None:\n    pass\n");
        assert_eq!(
            params(&ast),
            vec![
                ("a".to_string(), ParamKind::PositionalOnly),
                ("b".to_string(), ParamKind::PositionalOnly),
                ("c".to_string(), ParamKind::Regular),
                ("args".to_string(), ParamKind::VarPositional),
                ("d".to_string(), ParamKind::KeywordOnly),
                ("e".to_string(), ParamKind::KeywordOnly),
                ("kw".to_string(), ParamKind::VarKeyword),
            ]
        );
        assert_eq!(
            first_stmt(&ast).kind,
            NodeKind::FunctionDef {
                name: "f".into(),
                is_async: false
            }
        );
    }

    #[test]
    fn parse_decorated_async_function() {
        let ast = parse_ok("@cache\n@route('/x')\nasync def handler(req):\n    return req\n");
        let func = first_stmt(&ast);
        assert_eq!(
            func.kind,
            NodeKind::FunctionDef {
                name: "handler".into(),
                is_async: true
            }
        );
        assert_eq!(func.span.start.line, 1);
    }

    #[test]
    fn parse_class_with_bases_and_type_params() {
        let ast = parse_ok("class Box[T](Base, metaclass=Meta):\n    item: T\n");
        let class = first_stmt(&ast);
        assert_eq!(class.kind, NodeKind::ClassDef { name: "Box".into() });
        assert!(class
            .children
            .iter()
            .any(|&id| ast.get(id).unwrap().kind == NodeKind::TypeParam { name: "T".into() }));
    }

    #[test]
    fn parse_imports() {
        let ast = parse_ok("import os.path as p, sys\n");
        match &first_stmt(&ast).kind {
            NodeKind::Import { names } => {
                assert_eq!(names[0].name, "os.path");
                assert_eq!(names[0].asname.as_deref(), Some("p"));
                assert_eq!(names[1].name, "sys");
            }
            other => panic!("expected import, got {other:?}"),
        }

        let ast = parse_ok("from ..pkg import (a as b,\n    c,)\n");
        match &first_stmt(&ast).kind {
            NodeKind::ImportFrom {
                module,
                level,
                names,
            } => {
                assert_eq!(module.as_deref(), Some("pkg"));
                assert_eq!(*level, 2);
                assert_eq!(names.len(), 2);
            }
            other => panic!("expected import-from, got {other:?}"),
        }

        parse_ok("from . import *\n");
    }

    #[test]
    fn non_default_after_default() {
        let err = parse_err("def f(a=1, b):\n    pass\n");
        assert_eq!(err.kind, ParseErrorKind::NonDefaultAfterDefault);
        assert_eq!(err.position.column, 11);
    }

    #[test]
    fn bare_star_needs_keyword_parameters() {
        for source in [
            "def f(*):\n    pass\n",
            "def f(*, **k):\n    pass\n",
            "def f(a, *,):\n    pass\n",
            "g = lambda *: 0\n",
        ] {
            let err = parse_err(source);
            assert_eq!(err.kind, ParseErrorKind::BareStarWithoutNames, "{source}");
            assert_eq!(err.to_string(), "named arguments must follow bare *");
        }
        parse_ok("def f(*, key, **k):\n    pass\n");
    }

    #[test]
    fn class_header_rejects_bare_generator() {
        assert_eq!(
            parse_err("class C(x for x in y):\n    pass\n").kind,
            ParseErrorKind::InvalidSyntax
        );
        parse_ok("class C((x for x in y)):\n    pass\n");
    }

    #[test]
    fn missing_parenthesis_after_def_name() {
        assert_eq!(
            parse_err("def f:\n    pass\n").kind,
            ParseErrorKind::Expected("'('")
        );
    }

    #[test]
    fn import_without_names() {
        assert_eq!(parse_err("from os import\n").kind, ParseErrorKind::InvalidSyntax);
        assert_eq!(parse_err("import\n").kind, ParseErrorKind::InvalidSyntax);
    }
}
