use pydiag_common::Span;
use std::fmt;

/// A single token produced by the lexer.
///
/// `lexeme` is the raw source text of the token (string literals keep their
/// prefix and quotes; `Indent` carries the leading whitespace).
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    /// Line of the token's first character.
    pub fn line(&self) -> u32 {
        self.span.start.line
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.lexeme)
    }
}

/// All token kinds of Python source.
///
/// Soft keywords (`match`, `case`, `type`, `_`) are plain `Name`s; the
/// parser recognises them by lexeme where the grammar allows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Literals ===
    Name,
    Number,
    String,

    // === Keywords ===
    False,
    None,
    True,
    And,
    As,
    Assert,
    Async,
    Await,
    Break,
    Class,
    Continue,
    Def,
    Del,
    Elif,
    Else,
    Except,
    Finally,
    For,
    From,
    Global,
    If,
    Import,
    In,
    Is,
    Lambda,
    Nonlocal,
    Not,
    Or,
    Pass,
    Raise,
    Return,
    Try,
    While,
    With,
    Yield,

    // === Operators ===
    Plus,             // +
    Minus,            // -
    Star,             // *
    DoubleStar,       // **
    Slash,            // /
    DoubleSlash,      // //
    Percent,          // %
    At,               // @
    Amper,            // &
    Pipe,             // |
    Caret,            // ^
    Tilde,            // ~
    LeftShift,        // <<
    RightShift,       // >>
    Less,             // <
    Greater,          // >
    LessEqual,        // <=
    GreaterEqual,     // >=
    EqualEqual,       // ==
    NotEqual,         // !=
    Equal,            // =
    ColonEqual,       // :=
    Arrow,            // ->
    PlusEqual,        // +=
    MinusEqual,       // -=
    StarEqual,        // *=
    DoubleStarEqual,  // **=
    SlashEqual,       // /=
    DoubleSlashEqual, // //=
    PercentEqual,     // %=
    AtEqual,          // @=
    AmperEqual,       // &=
    PipeEqual,        // |=
    CaretEqual,       // ^=
    LeftShiftEqual,   // <<=
    RightShiftEqual,  // >>=

    // === Delimiters ===
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]
    LeftBrace,    // {
    RightBrace,   // }
    Comma,        // ,
    Colon,        // :
    Semicolon,    // ;
    Dot,          // .
    Ellipsis,     // ...

    // === Layout ===
    /// End of a logical line.
    Newline,
    /// Line break that does not end a logical line (blank lines, comment
    /// lines, breaks inside brackets).
    Nl,
    Comment,
    Indent,
    Dedent,
    EndMarker,
}

impl TokenKind {
    /// Try to match an identifier string to a hard keyword.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "False" => Some(TokenKind::False),
            "None" => Some(TokenKind::None),
            "True" => Some(TokenKind::True),
            "and" => Some(TokenKind::And),
            "as" => Some(TokenKind::As),
            "assert" => Some(TokenKind::Assert),
            "async" => Some(TokenKind::Async),
            "await" => Some(TokenKind::Await),
            "break" => Some(TokenKind::Break),
            "class" => Some(TokenKind::Class),
            "continue" => Some(TokenKind::Continue),
            "def" => Some(TokenKind::Def),
            "del" => Some(TokenKind::Del),
            "elif" => Some(TokenKind::Elif),
            "else" => Some(TokenKind::Else),
            "except" => Some(TokenKind::Except),
            "finally" => Some(TokenKind::Finally),
            "for" => Some(TokenKind::For),
            "from" => Some(TokenKind::From),
            "global" => Some(TokenKind::Global),
            "if" => Some(TokenKind::If),
            "import" => Some(TokenKind::Import),
            "in" => Some(TokenKind::In),
            "is" => Some(TokenKind::Is),
            "lambda" => Some(TokenKind::Lambda),
            "nonlocal" => Some(TokenKind::Nonlocal),
            "not" => Some(TokenKind::Not),
            "or" => Some(TokenKind::Or),
            "pass" => Some(TokenKind::Pass),
            "raise" => Some(TokenKind::Raise),
            "return" => Some(TokenKind::Return),
            "try" => Some(TokenKind::Try),
            "while" => Some(TokenKind::While),
            "with" => Some(TokenKind::With),
            "yield" => Some(TokenKind::Yield),
            _ => None,
        }
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::False
                | TokenKind::None
                | TokenKind::True
                | TokenKind::And
                | TokenKind::As
                | TokenKind::Assert
                | TokenKind::Async
                | TokenKind::Await
                | TokenKind::Break
                | TokenKind::Class
                | TokenKind::Continue
                | TokenKind::Def
                | TokenKind::Del
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::Except
                | TokenKind::Finally
                | TokenKind::For
                | TokenKind::From
                | TokenKind::Global
                | TokenKind::If
                | TokenKind::Import
                | TokenKind::In
                | TokenKind::Is
                | TokenKind::Lambda
                | TokenKind::Nonlocal
                | TokenKind::Not
                | TokenKind::Or
                | TokenKind::Pass
                | TokenKind::Raise
                | TokenKind::Return
                | TokenKind::Try
                | TokenKind::While
                | TokenKind::With
                | TokenKind::Yield
        )
    }

    /// Augmented assignment operators (`+=`, `**=`, ...).
    pub fn is_augmented_assign(self) -> bool {
        matches!(
            self,
            TokenKind::PlusEqual
                | TokenKind::MinusEqual
                | TokenKind::StarEqual
                | TokenKind::DoubleStarEqual
                | TokenKind::SlashEqual
                | TokenKind::DoubleSlashEqual
                | TokenKind::PercentEqual
                | TokenKind::AtEqual
                | TokenKind::AmperEqual
                | TokenKind::PipeEqual
                | TokenKind::CaretEqual
                | TokenKind::LeftShiftEqual
                | TokenKind::RightShiftEqual
        )
    }

    /// How the token reads in an "expected ..." message.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Name => "name",
            TokenKind::Colon => "':'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::RightBrace => "'}'",
            TokenKind::Equal => "'='",
            TokenKind::In => "'in'",
            TokenKind::Import => "'import'",
            TokenKind::Else => "'else'",
            TokenKind::Newline => "newline",
            TokenKind::Indent => "an indented block",
            _ => "token",
        }
    }

    /// Tokens the parser never sees: comments and non-logical line breaks.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::Nl)
    }
}
