//! Python snippet diagnostics: lexer, parser and the analysis passes that
//! turn a snippet into an ordered list of [`Diagnostic`](pydiag_common::Diagnostic)s.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod semantic;

pub use semantic::{analyze, Analyzer};
