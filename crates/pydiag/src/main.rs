use std::path::PathBuf;
use std::process;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, ValueEnum};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pydiag_analyzer::Analyzer;
use pydiag_common::{AnalyzerConfig, Diagnostic};

/// Python snippet diagnostics.
///
/// Reports syntax errors, indentation problems and undefined names in a
/// snippet of Python code as JSON.
#[derive(Parser)]
#[command(
    name = "pydiag",
    version,
    about,
    long_about = "Python snippet diagnostics.\n\nAnalyzes one snippet of Python source passed as an argument and prints the\nissues found as a JSON array on stdout.\n\n--format, --config and the RUST_LOG environment variable are optional extras.\nWithout them the output is the plain JSON array and nothing is logged\nbelow warnings.\n\nExamples:\n  pydiag 'print(x)'                   One NameError for x\n  pydiag 'def f():\\nreturn 1'        Literal \\n is read as a newline\n  pydiag --format pretty 'if x print(1)'\n  pydiag --config pydiag.toml 'app.run()'"
)]
struct Cli {
    /// Python source to analyze. Every literal `\n` is read as a newline.
    source: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// TOML file with analyzer settings.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// JSON array of diagnostics.
    Json,
    /// Annotated source excerpts.
    Pretty,
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match AnalyzerConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => AnalyzerConfig::default(),
    };

    let (source, diagnostics) = match cli.source {
        Some(raw) => {
            let source = normalize_newlines(&raw);
            let diagnostics = Analyzer::new(config).analyze(&source);
            (source, diagnostics)
        }
        None => {
            debug!("no source argument");
            (String::new(), vec![Diagnostic::missing_input()])
        }
    };

    match cli.format {
        OutputFormat::Json => match serde_json::to_string(&diagnostics) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: failed to serialize diagnostics: {}", e);
                process::exit(1);
            }
        },
        OutputFormat::Pretty => {
            for diag in &diagnostics {
                print_diagnostic(diag, &source);
            }
        }
    }
}

/// Shells hand over `\n` literally; only that escape is translated.
fn normalize_newlines(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

/// Character offset of a 1-based line and 0-based column, as ariadne
/// indexes its sources.
fn char_offset(source: &str, line: u32, column: u32) -> Option<usize> {
    let skipped_lines = line.saturating_sub(1) as usize;
    let mut lines = source.split_inclusive('\n');
    let mut offset = 0;
    for _ in 0..skipped_lines {
        offset += lines.next()?.chars().count();
    }
    let width = lines.next().map_or(0, |l| l.chars().count());
    Some(offset + (column as usize).min(width))
}

fn print_diagnostic(diag: &Diagnostic, source: &str) {
    const FILE_NAME: &str = "<snippet>";

    let len = source.chars().count();
    let start = char_offset(source, diag.line, diag.column).filter(|&s| s < len);
    let Some(start) = start else {
        println!(
            "{}: {} [{}] at {}:{}",
            diag.severity.as_str(),
            diag.message,
            diag.kind,
            diag.line,
            diag.column
        );
        for suggestion in diag.suggestions_or_fallback() {
            println!("   = help: {}", suggestion);
        }
        println!();
        return;
    };
    let end = start + 1;

    let report = Report::build(ReportKind::Error, FILE_NAME, start)
        .with_code(diag.kind.as_str())
        .with_message(&diag.message)
        .with_label(
            Label::new((FILE_NAME, start..end))
                .with_message(&diag.message)
                .with_color(Color::Red),
        )
        .with_help(diag.suggestions_or_fallback().join("; "));

    if let Err(e) = report
        .finish()
        .print((FILE_NAME, Source::from(source)))
    {
        eprintln!("error: failed to render diagnostic: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_backslash_n_is_translated() {
        assert_eq!(normalize_newlines(r"a = 1\nb = 2"), "a = 1\nb = 2");
        assert_eq!(normalize_newlines(r"a\tb"), r"a\tb");
    }

    #[test]
    fn offsets_follow_lines_and_characters() {
        let source = "x = 1\nπ = y\n";
        assert_eq!(char_offset(source, 1, 0), Some(0));
        assert_eq!(char_offset(source, 2, 0), Some(6));
        assert_eq!(char_offset(source, 2, 4), Some(10));
        assert_eq!(char_offset(source, 9, 0), None);
    }
}
