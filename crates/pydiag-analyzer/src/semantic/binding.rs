//! Local decision of whether an unknown name occurrence binds the name.

use crate::lexer::Token;

/// Decides, from the tokens around an unknown name, whether that occurrence
/// introduces the name instead of referencing it.
pub trait BindingRule {
    fn is_binding(&self, previous: Option<&Token>, next: Option<&Token>) -> bool;
}

const BINDING_PREDECESSORS: [&str; 5] = ["def", "class", "import", "from", "as"];
const BINDING_SUCCESSORS: [&str; 4] = ["=", "(", "import", "from"];

/// One token of lookbehind and lookahead, compared by token text.
///
/// This is a heuristic. `f(key=1)` treats `key` as bound and any called
/// name counts as a definition, so both false negatives and false positives
/// are expected.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneTokenWindow;

impl BindingRule for OneTokenWindow {
    fn is_binding(&self, previous: Option<&Token>, next: Option<&Token>) -> bool {
        previous.is_some_and(|t| BINDING_PREDECESSORS.contains(&t.lexeme.as_str()))
            || next.is_some_and(|t| BINDING_SUCCESSORS.contains(&t.lexeme.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;
    use pydiag_common::Span;

    fn token(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, Span::default())
    }

    #[test]
    fn keyword_before_binds() {
        let rule = OneTokenWindow;
        for (kind, text) in [
            (TokenKind::Def, "def"),
            (TokenKind::Class, "class"),
            (TokenKind::Import, "import"),
            (TokenKind::From, "from"),
            (TokenKind::As, "as"),
        ] {
            assert!(rule.is_binding(Some(&token(kind, text)), None), "{text}");
        }
    }

    #[test]
    fn assignment_or_call_after_binds() {
        let rule = OneTokenWindow;
        assert!(rule.is_binding(None, Some(&token(TokenKind::Equal, "="))));
        assert!(rule.is_binding(None, Some(&token(TokenKind::LeftParen, "("))));
        assert!(!rule.is_binding(None, Some(&token(TokenKind::EqualEqual, "=="))));
        assert!(!rule.is_binding(None, Some(&token(TokenKind::PlusEqual, "+="))));
    }

    #[test]
    fn plain_reference_does_not_bind() {
        let rule = OneTokenWindow;
        assert!(!rule.is_binding(None, None));
        assert!(!rule.is_binding(
            Some(&token(TokenKind::LeftParen, "(")),
            Some(&token(TokenKind::RightParen, ")"))
        ));
    }
}
