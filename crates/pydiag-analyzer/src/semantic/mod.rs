//! The analysis pipeline.
//!
//! A snippet is first parsed in full. A parse failure is reported on its own
//! and nothing else runs. Otherwise the defined names are collected from the
//! tree, the token stream is scanned against them, and the scan's findings
//! are sorted and reduced.

pub mod aggregate;
pub mod binding;
pub mod builtins;
pub mod names;
pub mod scan;
pub mod syntax;

use pydiag_common::{AnalyzerConfig, Diagnostic};
use tracing::debug;

use self::aggregate::aggregate;
use self::builtins::SeedNames;
use self::names::NameCollector;
use self::scan::TokenScanner;
use self::syntax::check_syntax;

/// Diagnostic engine for Python snippets.
///
/// Holds only immutable configuration, so one analyzer can serve any number
/// of calls, including concurrent ones.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    seed: SeedNames,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let seed = SeedNames::new(&config);
        Self { config, seed }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze one snippet. Never fails: every problem, including malformed
    /// input, comes back as a diagnostic.
    pub fn analyze(&self, source: &str) -> Vec<Diagnostic> {
        let ast = match check_syntax(source) {
            Ok(ast) => ast,
            Err(diagnostic) => {
                debug!("syntax failure, skipping static scan");
                return vec![diagnostic];
            }
        };

        let mut names = NameCollector::new(&self.seed).collect(&ast);
        debug!(defined = names.len(), nodes = ast.len(), "collected defined names");

        let found = TokenScanner::new(self.config.indent_width).scan(source, &mut names);
        debug!(found = found.len(), "static scan finished");

        aggregate(found, self.config.dedup)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

/// Analyze `source` with the default configuration.
pub fn analyze(source: &str) -> Vec<Diagnostic> {
    Analyzer::default().analyze(source)
}
