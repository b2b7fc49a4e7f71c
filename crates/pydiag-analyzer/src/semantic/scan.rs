//! Token-level scan for indentation widths and unresolved names.

use pydiag_common::{Diagnostic, DiagnosticBag, DiagnosticKind};
use tracing::{debug, trace};

use crate::lexer::{LexError, Lexer, Token, TokenKind};

use super::binding::{BindingRule, OneTokenWindow};
use super::names::DefinedNames;

/// Re-tokenizes a snippet and reports indentation levels that are not a
/// multiple of the configured step and names that are never defined.
///
/// Each call to [`scan`](TokenScanner::scan) starts a fresh token stream.
#[derive(Debug, Clone)]
pub struct TokenScanner<R = OneTokenWindow> {
    indent_width: u32,
    rule: R,
}

impl TokenScanner<OneTokenWindow> {
    pub fn new(indent_width: u32) -> Self {
        Self::with_rule(indent_width, OneTokenWindow)
    }
}

/// Running indentation state of one scan.
#[derive(Debug, Default)]
struct IndentTracker {
    expected: i64,
    current: i64,
}

impl<R: BindingRule> TokenScanner<R> {
    pub fn with_rule(indent_width: u32, rule: R) -> Self {
        Self { indent_width, rule }
    }

    /// Scan `source`, growing `names` with every binding site found.
    ///
    /// A lexer failure stops the scan with one `TokenError`; diagnostics
    /// reported before that point are kept.
    pub fn scan(&self, source: &str, names: &mut DefinedNames) -> Vec<Diagnostic> {
        let mut bag = DiagnosticBag::new();
        let mut indent = IndentTracker::default();
        let mut stream = Lexer::new(source).peekable();
        let mut previous: Option<Token> = None;
        let step = i64::from(self.indent_width);

        while let Some(item) = stream.next() {
            let token = match item {
                Ok(token) => token,
                Err(err) => {
                    debug!(error = %err, "token scan aborted");
                    bag.report(token_error(&err));
                    break;
                }
            };
            let next = match stream.peek() {
                Some(Ok(next)) => Some(next),
                _ => None,
            };

            match token.kind {
                TokenKind::String | TokenKind::Comment => {}
                TokenKind::Indent => {
                    indent.current = token.lexeme.chars().count() as i64;
                    indent.expected += step;
                    trace!(width = indent.current, expected = indent.expected, "indent");
                    if indent.current != indent.expected {
                        bag.report(self.indentation_error(&token, indent.expected));
                    }
                }
                TokenKind::Dedent => {
                    indent.expected -= step;
                    indent.current = 0;
                }
                TokenKind::Name if !names.contains(&token.lexeme) => {
                    if self.rule.is_binding(previous.as_ref(), next) {
                        trace!(name = %token.lexeme, line = token.line(), "binding site");
                        names.insert(token.lexeme.as_str());
                    } else {
                        bag.report(undefined_name(&token));
                    }
                }
                _ => {}
            }
            previous = Some(token);
        }

        bag.into_diagnostics()
    }

    fn indentation_error(&self, token: &Token, expected: i64) -> Diagnostic {
        Diagnostic::error(
            DiagnosticKind::IndentationError,
            format!("IndentationError: unexpected indent (expected {expected} spaces)"),
        )
        .at_position(token.span.start)
        .with_suggestions([
            format!("Use {} spaces for indentation", self.indent_width),
            "Convert tabs to spaces".to_string(),
            "Fix indentation level".to_string(),
        ])
    }
}

fn undefined_name(token: &Token) -> Diagnostic {
    let name = &token.lexeme;
    Diagnostic::error(
        DiagnosticKind::NameError,
        format!("NameError: name '{name}' is not defined"),
    )
    .at_position(token.span.start)
    .with_suggestions([
        format!("Define variable '{name}' before using it"),
        format!("Check if '{name}' is misspelled"),
        format!("Import module if '{name}' is from a module"),
    ])
}

fn token_error(err: &LexError) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::TokenError, format!("TokenError: {err}"))
        .at(err.position.line, 0)
        .with_suggestion("Check the syntax of your code")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::builtins::SeedNames;

    fn scan(source: &str) -> Vec<Diagnostic> {
        let mut names = DefinedNames::from_seed(&SeedNames::default());
        TokenScanner::new(4).scan(source, &mut names)
    }

    #[test]
    fn clean_snippet() {
        assert!(scan("x = 1\nprint(x)\n").is_empty());
    }

    #[test]
    fn undefined_name_reported_with_suggestions() {
        let diags = scan("print(undefined_name)\n");
        assert_eq!(diags.len(), 1);
        let diag = &diags[0];
        assert_eq!(diag.kind, DiagnosticKind::NameError);
        assert_eq!(diag.message, "NameError: name 'undefined_name' is not defined");
        assert_eq!((diag.line, diag.column), (1, 6));
        assert_eq!(
            diag.suggestions,
            vec![
                "Define variable 'undefined_name' before using it",
                "Check if 'undefined_name' is misspelled",
                "Import module if 'undefined_name' is from a module",
            ]
        );
    }

    #[test]
    fn binding_site_defines_later_uses() {
        // `y` is followed by `=` once, so every other occurrence is known.
        assert!(scan("print(y)\ny = 2\nprint(y)\n").len() == 1);
        assert!(scan("y = 2\nprint(y)\n").is_empty());
    }

    #[test]
    fn strings_and_comments_are_skipped() {
        assert!(scan("s = 'ghost'  # phantom\n").is_empty());
    }

    #[test]
    fn keywords_are_not_names() {
        assert!(scan("x = 1\nif x and not x or x is None:\n    pass\n").is_empty());
    }

    #[test]
    fn indentation_width_checked() {
        let diags = scan("if True:\n  x = 1\n");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::IndentationError);
        assert_eq!(
            diags[0].message,
            "IndentationError: unexpected indent (expected 4 spaces)"
        );
        assert_eq!((diags[0].line, diags[0].column), (2, 0));
        assert_eq!(diags[0].suggestions[0], "Use 4 spaces for indentation");
    }

    #[test]
    fn nested_levels_and_dedents() {
        let source = "\
if True:
    if True:
        x = 1
    y = 2
if True:
    z = 3
";
        assert!(scan(source).is_empty());
    }

    #[test]
    fn configured_step() {
        let mut names = DefinedNames::from_seed(&SeedNames::default());
        let diags = TokenScanner::new(2).scan("if True:\n  x = 1\n", &mut names);
        assert!(diags.is_empty());
    }

    #[test]
    fn lexer_failure_becomes_token_error() {
        let diags = scan("x = 1\nvalue\ny = (1,\n");
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].kind, DiagnosticKind::NameError);
        let last = &diags[1];
        assert_eq!(last.kind, DiagnosticKind::TokenError);
        assert_eq!((last.line, last.column), (3, 0));
        assert_eq!(last.message, "TokenError: '(' was never closed");
        assert_eq!(last.suggestions, vec!["Check the syntax of your code"]);
    }

    #[test]
    fn custom_binding_rule() {
        struct NeverBinds;
        impl BindingRule for NeverBinds {
            fn is_binding(&self, _: Option<&Token>, _: Option<&Token>) -> bool {
                false
            }
        }
        let mut names = DefinedNames::from_seed(&SeedNames::default());
        let diags = TokenScanner::with_rule(4, NeverBinds).scan("y = 2\n", &mut names);
        assert_eq!(diags.len(), 1);
    }
}
