//! End-to-end behaviour of the analysis pipeline on whole snippets.

use pydiag_analyzer::{analyze, Analyzer};
use pydiag_common::{AnalyzerConfig, DedupPolicy, Diagnostic, DiagnosticKind};

fn kinds(diags: &[Diagnostic]) -> Vec<DiagnosticKind> {
    diags.iter().map(|d| d.kind).collect()
}

#[test]
fn missing_colon_reports_one_syntax_error() {
    let diags = analyze("if True\n    print(\"x\")\n");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::SyntaxError]);
    assert_eq!(diags[0].line, 1);
    assert_eq!(
        diags[0].suggestions,
        vec![
            "Check syntax at the indicated position",
            "Verify matching parentheses and brackets",
            "Ensure proper indentation",
        ]
    );
}

#[test]
fn unindented_body_reports_indentation_error() {
    let diags = analyze("def f():\nprint(\"x\")\n");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::IndentationError]);
    assert_eq!(diags[0].line, 2);
    assert_eq!(
        diags[0].suggestions,
        vec![
            "Check indentation level",
            "Use consistent indentation (spaces)",
            "Ensure proper block indentation",
        ]
    );
}

#[test]
fn undefined_name_reports_name_error() {
    let diags = analyze("print(undefined_name)");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::NameError]);
    assert!(diags[0].message.contains("undefined_name"));
    assert!(diags[0].suggestions.iter().any(|s| s.contains("Define variable")));
}

#[test]
fn syntax_error_suppresses_name_errors() {
    let diags = analyze("if x print(\"y\")");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::SyntaxError]);
}

#[test]
fn name_before_equals_is_a_binding_everywhere() {
    // `flag` is only ever a keyword argument, yet counts as defined.
    assert!(analyze("configure(flag=1)\nprint(flag)\n").is_empty());
}

#[test]
fn missing_colon_wins_over_later_problems() {
    let source = "\ndef calculate_sum(a, b)\n    return a + c  # undefined variable\n";
    let diags = analyze(source);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::SyntaxError]);
    assert_eq!(diags[0].line, 2);
}

#[test]
fn valid_code_with_odd_indentation() {
    let diags = analyze("if True:\n  x = 1\n");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::IndentationError]);
    assert_eq!(diags[0].line, 2);
    assert_eq!(
        diags[0].message,
        "IndentationError: unexpected indent (expected 4 spaces)"
    );
}

#[test]
fn clean_program() {
    let source = "\
import math
from typing import List


class Circle:
    def __init__(self, radius: float) -> None:
        self.radius = radius

    def area(self) -> float:
        return math.pow(self.radius, 2) * 3.14159


def total_area(circles: List[Circle]) -> float:
    return sum(c.area() for c in circles)


shapes = [Circle(r) for r in range(3)]
print(total_area(shapes))
";
    assert_eq!(analyze(source), Vec::<Diagnostic>::new());
}

#[test]
fn problems_sorted_and_one_per_line() {
    let diags = analyze("print(b, a)\nprint(c)\n");
    assert_eq!(diags.len(), 2);
    assert!(diags[0].message.contains("'b'"));
    assert_eq!((diags[0].line, diags[0].column), (1, 6));
    assert!(diags[1].message.contains("'c'"));
}

#[test]
fn keep_all_policy_reports_every_name() {
    let analyzer = Analyzer::new(AnalyzerConfig {
        dedup: DedupPolicy::KeepAll,
        ..AnalyzerConfig::default()
    });
    let diags = analyzer.analyze("print(b, a)\n");
    let columns: Vec<_> = diags.iter().map(|d| d.column).collect();
    assert_eq!(columns, vec![6, 9]);
}

#[test]
fn empty_and_blank_input() {
    assert!(analyze("").is_empty());
    assert!(analyze("\n\n   \n# only a comment\n").is_empty());
}

#[test]
fn tab_and_space_mixing() {
    let diags = analyze("if True:\n\tx = 1\n        y = 2\n");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::IndentationError]);
    assert_eq!(diags[0].line, 3);
}

#[test]
fn unclosed_bracket() {
    let diags = analyze("values = [1, 2,\n");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::SyntaxError]);
    assert_eq!((diags[0].line, diags[0].column), (1, 9));
    assert_eq!(diags[0].message, "'[' was never closed");
}

#[test]
fn deeply_nested_input_is_a_diagnostic() {
    let source = format!("x = {}1{}\n", "(".repeat(1000), ")".repeat(1000));
    let diags = analyze(&source);
    assert_eq!(kinds(&diags), vec![DiagnosticKind::SyntaxError]);
    assert_eq!(diags[0].message, "too many nested expressions");
}

#[test]
fn print_statement_from_python_two() {
    let diags = analyze("print \"hello\"\n");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::SyntaxError]);
    assert_eq!(
        diags[0].message,
        "Missing parentheses in call to 'print'. Did you mean print(...)?"
    );
}

#[test]
fn match_statement_captures() {
    let source = "\
command = input()
match command.split():
    case [\"go\", direction]:
        print(direction)
    case _:
        pass
";
    assert!(analyze(source).is_empty());
}

#[test]
fn long_or_pattern_returns_normally() {
    let alternatives = vec!["1"; 30_000].join(" | ");
    let source = format!("x = 1\nmatch x:\n    case {alternatives}:\n        pass\n");
    assert!(analyze(&source).is_empty());
}

#[test]
fn invalid_case_pattern_is_one_syntax_error() {
    let diags = analyze("value = 3\nmatch value:\n    case -x:\n        print(x)\n");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::SyntaxError]);
    assert_eq!((diags[0].line, diags[0].column), (3, 9));
}

#[test]
fn unclosed_fstring_field_is_one_syntax_error() {
    let diags = analyze("name = 'x'\nprint(f\"{name\")\n");
    assert_eq!(kinds(&diags), vec![DiagnosticKind::SyntaxError]);
    assert_eq!(diags[0].message, "f-string: expecting '}'");
    assert_eq!(diags[0].line, 2);
}

#[test]
fn keyword_right_after_number() {
    assert!(analyze("x = 1if 1 else 2\nprint(x)\n").is_empty());
}

#[test]
fn repeated_analysis_is_identical() {
    let source = "def f(a):\n   return a + b\n";
    assert_eq!(analyze(source), analyze(source));
}

#[test]
fn wire_format() {
    let diags = analyze("print(missing)\n");
    let json = serde_json::to_value(&diags).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "line": 1,
            "column": 6,
            "message": "NameError: name 'missing' is not defined",
            "severity": "error",
            "type": "NameError",
            "suggestions": [
                "Define variable 'missing' before using it",
                "Check if 'missing' is misspelled",
                "Import module if 'missing' is from a module"
            ]
        }])
    );
}
