use std::fmt;

use pydiag_common::Position;

/// Numeric literal bases, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberBase {
    Decimal,
    Hexadecimal,
    Octal,
    Binary,
}

impl fmt::Display for NumberBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NumberBase::Decimal => "decimal",
            NumberBase::Hexadecimal => "hexadecimal",
            NumberBase::Octal => "octal",
            NumberBase::Binary => "binary",
        })
    }
}

/// What went wrong while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unterminated string literal (detected at line {detected_at})")]
    UnterminatedString { detected_at: u32 },
    #[error("unterminated triple-quoted string literal (detected at line {detected_at})")]
    UnterminatedTripleQuotedString { detected_at: u32 },
    #[error("'{open}' was never closed")]
    UnclosedBracket { open: char },
    #[error("unmatched '{close}'")]
    UnmatchedBracket { close: char },
    #[error("closing parenthesis '{close}' does not match opening parenthesis '{open}'")]
    MismatchedBracket { open: char, close: char },
    #[error("invalid character '{ch}' (U+{code:04X})")]
    InvalidCharacter { ch: char, code: u32 },
    #[error("unexpected character after line continuation character")]
    ContinuationCharacter,
    #[error("unexpected EOF while parsing")]
    UnexpectedEof,
    #[error("invalid {base} literal")]
    InvalidNumber { base: NumberBase },
    #[error("leading zeros in decimal integer literals are not permitted; use an 0o prefix for octal integers")]
    LeadingZeros,
    #[error("unindent does not match any outer indentation level")]
    UnindentMismatch,
    #[error("inconsistent use of tabs and spaces in indentation")]
    TabError,
    #[error("too many levels of indentation")]
    TooManyIndentLevels,
    #[error("too many nested parentheses")]
    TooManyNestedBrackets,
    #[error("f-string: single '}}' is not allowed")]
    FStringSingleBrace,
    #[error("f-string: expecting '}}'")]
    FStringExpectingBrace,
    #[error("f-string: valid expression required before '}}'")]
    FStringEmptyExpression,
    #[error("f-string: invalid conversion character '{ch}': expected 's', 'r', or 'a'")]
    FStringConversion { ch: char },
    #[error("f-string: missing conversion character")]
    FStringMissingConversion,
    #[error("f-string: expressions nested too deeply")]
    FStringTooDeep,
    #[error("bytes can only contain ASCII literal characters")]
    NonAsciiBytes,
}

impl LexErrorKind {
    pub fn invalid_character(ch: char) -> Self {
        LexErrorKind::InvalidCharacter {
            ch,
            code: ch as u32,
        }
    }

    /// Failures of the indentation structure rather than of a single token.
    pub fn is_indentation(&self) -> bool {
        matches!(
            self,
            LexErrorKind::UnindentMismatch
                | LexErrorKind::TabError
                | LexErrorKind::TooManyIndentLevels
        )
    }
}

/// A tokenization failure at a source position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: Position,
}

impl LexError {
    pub fn new(kind: LexErrorKind, position: Position) -> Self {
        Self { kind, position }
    }
}
