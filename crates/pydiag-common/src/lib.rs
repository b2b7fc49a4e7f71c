pub mod config;
pub mod errors;
pub mod span;

pub use config::{AnalyzerConfig, ConfigError, DedupPolicy};
pub use errors::{Diagnostic, DiagnosticBag, DiagnosticKind, Severity};
pub use span::{Position, Span};
