//! Ordering and de-duplication of the final diagnostic list.

use pydiag_common::{DedupPolicy, Diagnostic};

/// Sort by `(line, column)` keeping the relative order of ties, then apply
/// `policy`.
pub fn aggregate(mut diagnostics: Vec<Diagnostic>, policy: DedupPolicy) -> Vec<Diagnostic> {
    diagnostics.sort_by_key(|d| (d.line, d.column));
    if policy == DedupPolicy::FirstPerLine {
        diagnostics.dedup_by_key(|d| d.line);
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use pydiag_common::DiagnosticKind;

    fn diag(line: u32, column: u32, message: &str) -> Diagnostic {
        Diagnostic::error(DiagnosticKind::NameError, message).at(line, column)
    }

    #[test]
    fn sorts_by_line_then_column() {
        let out = aggregate(
            vec![diag(3, 0, "c"), diag(1, 5, "b"), diag(1, 2, "a")],
            DedupPolicy::KeepAll,
        );
        let messages: Vec<_> = out.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
    }

    #[test]
    fn first_per_line_keeps_leftmost() {
        let out = aggregate(
            vec![diag(2, 9, "late"), diag(2, 1, "early"), diag(4, 0, "other")],
            DedupPolicy::FirstPerLine,
        );
        let messages: Vec<_> = out.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["early", "other"]);
    }

    #[test]
    fn ties_keep_report_order() {
        let out = aggregate(
            vec![diag(1, 0, "first"), diag(1, 0, "second")],
            DedupPolicy::FirstPerLine,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message, "first");

        let all = aggregate(
            vec![diag(1, 0, "first"), diag(1, 0, "second")],
            DedupPolicy::KeepAll,
        );
        assert_eq!(all[1].message, "second");
    }

    #[test]
    fn empty_input() {
        assert!(aggregate(Vec::new(), DedupPolicy::FirstPerLine).is_empty());
    }
}
