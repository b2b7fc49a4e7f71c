use serde::{Deserialize, Serialize};

use crate::span::Position;

/// Severity level of a diagnostic.
///
/// Only `Error` is produced by the analyzer today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// Classification of a diagnostic. Serialized with the exact variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    SyntaxError,
    IndentationError,
    NameError,
    TokenError,
    InputError,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::SyntaxError => "SyntaxError",
            DiagnosticKind::IndentationError => "IndentationError",
            DiagnosticKind::NameError => "NameError",
            DiagnosticKind::TokenError => "TokenError",
            DiagnosticKind::InputError => "InputError",
        }
    }

    /// Generic remediation hints for a kind, used by front-ends when a
    /// diagnostic arrives without suggestions of its own.
    pub fn fallback_suggestions(self) -> &'static [&'static str] {
        match self {
            DiagnosticKind::NameError => &[
                "Define the variable before using it",
                "Check for typos in variable name",
                "Import required module",
            ],
            DiagnosticKind::SyntaxError => &[
                "Check for missing parentheses",
                "Verify indentation",
                "Check for missing colons",
            ],
            DiagnosticKind::IndentationError => &[
                "Use consistent indentation (spaces or tabs)",
                "Check indentation level",
            ],
            DiagnosticKind::TokenError | DiagnosticKind::InputError => {
                &["No specific suggestions available"]
            }
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported issue in a snippet.
///
/// Field names and their encoding are the wire format consumed by editor
/// front-ends: `{line, column, message, severity, type, suggestions}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based line.
    pub line: u32,
    /// 0-based column; 0 when unknown.
    pub column: u32,
    pub message: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
    /// Remediation hints, in display order.
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            line: 1,
            column: 0,
            message: message.into(),
            severity: Severity::Error,
            kind,
            suggestions: Vec::new(),
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn at_position(self, position: Position) -> Self {
        self.at(position.line, position.column)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions
            .extend(suggestions.into_iter().map(Into::into));
        self
    }

    /// The diagnostic's own suggestions, or the kind's generic ones if it has none.
    pub fn suggestions_or_fallback(&self) -> Vec<&str> {
        if self.suggestions.is_empty() {
            self.kind.fallback_suggestions().to_vec()
        } else {
            self.suggestions.iter().map(String::as_str).collect()
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// The diagnostic reported by the command line when no snippet is given.
    pub fn missing_input() -> Self {
        Diagnostic::error(DiagnosticKind::InputError, "No code provided for analysis")
            .with_suggestion("Provide Python code for analysis")
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}]\n  --> {}:{}",
            self.severity.as_str(),
            self.message,
            self.kind,
            self.line,
            self.column
        )
    }
}

/// Convenience collector for diagnostics during one analysis.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_field_names() {
        let diag = Diagnostic::error(DiagnosticKind::NameError, "NameError: name 'x' is not defined")
            .at(3, 4)
            .with_suggestion("Define variable 'x' before using it");
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["line"], 3);
        assert_eq!(json["column"], 4);
        assert_eq!(json["severity"], "error");
        assert_eq!(json["type"], "NameError");
        assert_eq!(json["suggestions"][0], "Define variable 'x' before using it");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn deserializes_wire_format() {
        let raw = r#"{"line":1,"column":0,"message":"m","severity":"error","type":"TokenError","suggestions":[]}"#;
        let diag: Diagnostic = serde_json::from_str(raw).unwrap();
        assert_eq!(diag.kind, DiagnosticKind::TokenError);
        assert_eq!(diag.severity, Severity::Error);
    }

    #[test]
    fn missing_input_diagnostic() {
        let diag = Diagnostic::missing_input();
        assert_eq!(diag.kind, DiagnosticKind::InputError);
        assert_eq!((diag.line, diag.column), (1, 0));
        assert_eq!(diag.message, "No code provided for analysis");
        assert_eq!(diag.suggestions, vec!["Provide Python code for analysis"]);
    }

    #[test]
    fn fallback_suggestions_only_when_empty() {
        let bare = Diagnostic::error(DiagnosticKind::SyntaxError, "invalid syntax");
        assert_eq!(
            bare.suggestions_or_fallback(),
            DiagnosticKind::SyntaxError.fallback_suggestions().to_vec()
        );

        let own = bare.clone().with_suggestion("Check the colon");
        assert_eq!(own.suggestions_or_fallback(), vec!["Check the colon"]);
    }

    #[test]
    fn bag_tracks_errors() {
        let mut bag = DiagnosticBag::new();
        assert!(!bag.has_errors());
        bag.report(Diagnostic::error(DiagnosticKind::NameError, "x"));
        assert!(bag.has_errors());
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.into_diagnostics().len(), 1);
    }
}
