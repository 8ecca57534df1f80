// src/reconcile.rs
//! Deterministic multi-source reconciliation.
//!
//! Given the values several sources report for one metric, compute the
//! displayed range and the single "best" value. The prompt's worked examples
//! are rendered from here, and callers that already hold structured readings
//! can skip the model for these decisions entirely.

use std::cmp::Ordering;
use std::fmt;

/// Shown wherever no source supplies a value.
pub const UNAVAILABLE: &str = "n/a";

/// One source's value for one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceReading {
    /// Priority rank of the reporting source (0 = highest priority).
    pub rank: usize,
    pub value: f64,
}

/// Which direction is meteorologically worse for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    HigherIsWorse,
    LowerIsWorse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    RainChance,
    WindSpeed,
    Temperature,
    CloudBase,
    FreezingLevel,
}

impl Metric {
    pub fn severity(self) -> Severity {
        match self {
            Metric::RainChance | Metric::WindSpeed => Severity::HigherIsWorse,
            Metric::Temperature | Metric::CloudBase | Metric::FreezingLevel => {
                Severity::LowerIsWorse
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRange {
    Unavailable,
    Single(f64),
    Span { min: f64, max: f64 },
}

/// [min, max] over every reporting source; collapses when they agree.
pub fn value_range(readings: &[SourceReading]) -> ValueRange {
    let mut values = readings.iter().map(|r| r.value).filter(|v| v.is_finite());
    let Some(first) = values.next() else {
        return ValueRange::Unavailable;
    };
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min == max {
        ValueRange::Single(min)
    } else {
        ValueRange::Span { min, max }
    }
}

impl fmt::Display for ValueRange {
    /// `n/a`, `15`, or `12 to 18`. Never a hyphen, never a midpoint.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ValueRange::Unavailable => f.write_str(UNAVAILABLE),
            ValueRange::Single(v) => f.write_str(&fmt_value(v)),
            ValueRange::Span { min, max } => write!(f, "{} to {}", fmt_value(min), fmt_value(max)),
        }
    }
}

/// Shorthand over bare values (rank is irrelevant to a range).
pub fn render_range(values: &[f64]) -> String {
    let readings: Vec<SourceReading> = values
        .iter()
        .map(|&value| SourceReading { rank: 0, value })
        .collect();
    value_range(&readings).to_string()
}

/// Value from the highest-priority reporting source; when the top two
/// reporting sources disagree, the worse of the two per `severity`.
///
/// Only sources that report a value take part: with rank 0 silent, ranks
/// 1 and 2 are the pair compared.
pub fn best_value(readings: &[SourceReading], severity: Severity) -> Option<f64> {
    let mut ranked: Vec<&SourceReading> =
        readings.iter().filter(|r| r.value.is_finite()).collect();
    ranked.sort_by_key(|r| r.rank);

    let top = ranked.first()?.value;
    let Some(second) = ranked.get(1).map(|r| r.value) else {
        return Some(top);
    };
    let worse = match (severity, top.partial_cmp(&second)) {
        (_, Some(Ordering::Equal)) | (_, None) => top,
        (Severity::HigherIsWorse, _) => top.max(second),
        (Severity::LowerIsWorse, _) => top.min(second),
    };
    Some(worse)
}

fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
