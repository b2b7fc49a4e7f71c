pub mod cursor;
pub mod error;
mod literal;
pub mod token;

mod scanner;

pub use error::{LexError, LexErrorKind, NumberBase};
pub use literal::is_bytes_literal;
pub use scanner::{Lexer, TokenStream, MAX_BRACKET_DEPTH, MAX_INDENT_LEVELS};
pub use token::{Token, TokenKind};
