//! Property-based tests of the guarantees every analysis result carries.

use proptest::prelude::*;

use pydiag_analyzer::analyze;
use pydiag_analyzer::semantic::syntax::check_syntax;
use pydiag_common::DiagnosticKind;

/// Snippets assembled from Python-looking fragments, so that a good share
/// of them parse and reach the token scan.
fn python_like() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        Just("x"),
        Just("value"),
        Just("print"),
        Just("def f(a):"),
        Just("class C:"),
        Just("if x:"),
        Just("for i in y:"),
        Just("return a"),
        Just(" = "),
        Just("("),
        Just(")"),
        Just("["),
        Just("]"),
        Just(", "),
        Just(" + "),
        Just("1"),
        Just("'s'"),
        Just("# c"),
        Just("\n"),
        Just("\n    "),
        Just("\n  "),
        Just("\t"),
        Just(":"),
        Just("import os"),
        Just("lambda q: q"),
    ];
    prop::collection::vec(fragment, 0..30).prop_map(|parts| parts.concat())
}

fn any_snippet() -> impl Strategy<Value = String> {
    prop_oneof![python_like(), "[ -~\t\n]{0,120}"]
}

proptest! {
    #[test]
    fn results_are_sorted_and_one_per_line(source in any_snippet()) {
        let diags = analyze(&source);
        for pair in diags.windows(2) {
            prop_assert!((pair[0].line, pair[0].column) <= (pair[1].line, pair[1].column));
            prop_assert_ne!(pair[0].line, pair[1].line);
        }
    }

    #[test]
    fn invalid_syntax_yields_exactly_one_diagnostic(source in any_snippet()) {
        let diags = analyze(&source);
        if check_syntax(&source).is_err() {
            prop_assert_eq!(diags.len(), 1);
            prop_assert!(matches!(
                diags[0].kind,
                DiagnosticKind::SyntaxError | DiagnosticKind::IndentationError
            ));
        } else {
            for diag in &diags {
                prop_assert!(matches!(
                    diag.kind,
                    DiagnosticKind::IndentationError
                        | DiagnosticKind::NameError
                        | DiagnosticKind::TokenError
                ));
            }
        }
    }

    #[test]
    fn analysis_is_deterministic(source in any_snippet()) {
        prop_assert_eq!(analyze(&source), analyze(&source));
    }

    #[test]
    fn diagnostics_are_well_formed(source in any_snippet()) {
        for diag in analyze(&source) {
            prop_assert!(diag.line >= 1);
            prop_assert!(!diag.message.is_empty());
            prop_assert!(!diag.suggestions.is_empty());
        }
    }
}
