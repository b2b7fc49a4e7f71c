//! Full-grammar validity check, the first analysis phase.

use pydiag_common::{Diagnostic, DiagnosticKind};
use tracing::debug;

use crate::ast::Ast;
use crate::parser::{self, ErrorCategory, ParseError};

pub const INDENTATION_SUGGESTIONS: [&str; 3] = [
    "Check indentation level",
    "Use consistent indentation (spaces)",
    "Ensure proper block indentation",
];

pub const SYNTAX_SUGGESTIONS: [&str; 3] = [
    "Check syntax at the indicated position",
    "Verify matching parentheses and brackets",
    "Ensure proper indentation",
];

/// Parse `source`, returning the tree or the single diagnostic that
/// describes why it does not parse.
pub fn check_syntax(source: &str) -> Result<Ast, Diagnostic> {
    parser::parse(source).map_err(|err| {
        debug!(error = %err, position = %err.position, "syntax check failed");
        syntax_diagnostic(&err)
    })
}

/// Map a parse error onto its diagnostic kind and suggestion set.
pub fn syntax_diagnostic(err: &ParseError) -> Diagnostic {
    let (kind, suggestions) = match err.category() {
        ErrorCategory::Indentation => {
            (DiagnosticKind::IndentationError, INDENTATION_SUGGESTIONS)
        }
        ErrorCategory::Syntax => (DiagnosticKind::SyntaxError, SYNTAX_SUGGESTIONS),
    };
    Diagnostic::error(kind, err.to_string())
        .at_position(err.position)
        .with_suggestions(suggestions)
}
