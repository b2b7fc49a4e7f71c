use std::fmt;

use pydiag_common::Position;

use crate::lexer::LexErrorKind;

/// Which family of diagnostic a parse failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Indentation,
    Syntax,
}

/// The operation an invalid target was used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetAction {
    Assign,
    Delete,
}

impl fmt::Display for TargetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TargetAction::Assign => "assign to",
            TargetAction::Delete => "delete",
        })
    }
}

/// Why the parser rejected the input. Display texts are user-facing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("expected {0}")]
    Expected(&'static str),
    #[error("invalid syntax")]
    InvalidSyntax,
    #[error("unexpected indent")]
    UnexpectedIndent,
    #[error("expected an indented block after {construct} on line {header_line}")]
    MissingIndentedBlock {
        construct: &'static str,
        header_line: u32,
    },
    #[error("cannot {action} {what}")]
    InvalidTarget {
        action: TargetAction,
        what: &'static str,
    },
    #[error("illegal target for annotation")]
    IllegalAnnotationTarget,
    #[error("'{0}' is an illegal expression for augmented assignment")]
    IllegalAugmentedTarget(&'static str),
    #[error("Missing parentheses in call to 'print'. Did you mean print(...)?")]
    MissingParenthesesInPrint,
    #[error("positional argument follows keyword argument")]
    PositionalAfterKeyword,
    #[error("iterable argument unpacking follows keyword argument unpacking")]
    UnpackingAfterKeywordUnpacking,
    #[error("Generator expression must be parenthesized")]
    UnparenthesizedGenerator,
    #[error("named arguments must follow bare *")]
    BareStarWithoutNames,
    #[error("cannot mix bytes and nonbytes literals")]
    MixedBytesLiterals,
    #[error("cannot use '_' as a target")]
    WildcardTarget,
    #[error("parameter without a default follows parameter with a default")]
    NonDefaultAfterDefault,
    #[error("expected 'except' or 'finally' block")]
    MissingExceptOrFinally,
    #[error("too many nested expressions")]
    TooDeeplyNested,
    #[error("{0}")]
    Lex(LexErrorKind),
}

impl ParseErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ParseErrorKind::UnexpectedIndent | ParseErrorKind::MissingIndentedBlock { .. } => {
                ErrorCategory::Indentation
            }
            ParseErrorKind::Lex(kind) if kind.is_indentation() => ErrorCategory::Indentation,
            _ => ErrorCategory::Syntax,
        }
    }
}

/// A parse failure at a source position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: Position,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: Position) -> Self {
        Self { kind, position }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

pub type ParseResult<T> = Result<T, ParseError>;
