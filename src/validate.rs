// src/validate.rs
//! Output contract checks for model-returned cells.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::reconcile::UNAVAILABLE;

/// Result of checking one completion against its cell contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellOutcome {
    /// Passed unchanged.
    Exact(Vec<String>),
    /// Line count fixed up (truncated or padded with the sentinel).
    Corrected { lines: Vec<String>, received: usize },
    /// Contract violated and not correctable; the cell counts as absent.
    Rejected { reason: String },
}

impl CellOutcome {
    pub fn lines(&self) -> Option<&[String]> {
        match self {
            CellOutcome::Exact(lines) | CellOutcome::Corrected { lines, .. } => Some(lines),
            CellOutcome::Rejected { .. } => None,
        }
    }

    pub fn is_corrected(&self) -> bool {
        matches!(self, CellOutcome::Corrected { .. })
    }
}

/// Non-empty lines, right-trimmed.
pub fn non_empty_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.trim_end().to_string())
        .collect()
}

/// Force exactly `n` lines: truncate extras, pad missing ones with `n/a`.
pub fn correct_line_count(raw: &str, n: usize) -> CellOutcome {
    let mut lines = non_empty_lines(raw);
    let received = lines.len();
    if received == n {
        return CellOutcome::Exact(lines);
    }
    lines.truncate(n);
    lines.resize_with(n, || UNAVAILABLE.to_string());
    CellOutcome::Corrected { lines, received }
}

fn re_rain_percent() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        let pattern = format!(
            r"(?i)^rain:\s*(?:{}(?:\s|$)|\d{{1,3}}%?(?:\s*to\s*\d{{1,3}})?%)",
            regex::escape(UNAVAILABLE)
        );
        Regex::new(&pattern).unwrap()
    })
}

/// Every prefix must open some line (case-insensitive) and `Rain:` must
/// start with a percentage, or `n/a` when no source gives a chance.
/// No correction is attempted.
pub fn validate_prefix_block(raw: &str, prefixes: &[&str]) -> CellOutcome {
    let lines = non_empty_lines(raw);
    let opens = |prefix: &str| {
        lines.iter().find(|l| {
            let t = l.trim_start();
            t.len() >= prefix.len()
                && t.is_char_boundary(prefix.len())
                && t[..prefix.len()].eq_ignore_ascii_case(prefix)
        })
    };

    for &prefix in prefixes {
        let Some(line) = opens(prefix) else {
            return CellOutcome::Rejected {
                reason: format!("missing line starting with {prefix:?}"),
            };
        };
        if prefix.eq_ignore_ascii_case("rain:") && !re_rain_percent().is_match(line.trim_start()) {
            return CellOutcome::Rejected {
                reason: format!("rain line does not open with a percentage: {line:?}"),
            };
        }
    }
    CellOutcome::Exact(lines)
}
