// src/compose.rs
//! Page composition: header metadata, per-cell HTML fragments, and literal
//! placeholder substitution into the externally supplied template.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::fmt;

use crate::slots::{Slot, SlotKind};

pub const PAGE_TITLE: &str = "Mountain Forecast";
pub const CONTENT_PLACEHOLDER: &str = "{{CONTENT}}";
pub const HEADER_PLACEHOLDER: &str = "{{HEADER}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    Moderate,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Confidence::High => "High",
            Confidence::Moderate => "Moderate",
            Confidence::Low => "Low",
        })
    }
}

/// A validated cell ready for layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub region_key: String,
    pub region_name: String,
    pub slot_key: String,
    pub slot_label: String,
    pub lines: Vec<String>,
    /// Line count had to be fixed up.
    pub corrected: bool,
}

impl Cell {
    pub fn placeholder(&self) -> String {
        format!("{{{{{}_{}}}}}", self.region_key, self.slot_key)
    }
}

/// "2026-10-18 07:05 UTC"
pub fn format_updated(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Moderate when every cell came back clean, Low when any needed correction.
pub fn grid_confidence(cells: &[Cell]) -> Confidence {
    if cells.iter().any(|c| c.corrected) {
        Confidence::Low
    } else {
        Confidence::Moderate
    }
}

pub fn grid_header(first_day: &str, last_day: &str, confidence: Confidence, updated: &str) -> String {
    [
        PAGE_TITLE.to_string(),
        format!("Next 3 days ({first_day} to {last_day})"),
        format!("Confidence: {confidence}"),
        format!("Last updated: {updated}"),
    ]
    .join("\n")
}

/// Put `Last updated: <ts>` right after the first `Confidence:` line. Without
/// one, insert `Confidence: Moderate` plus the timestamp after the second line
/// (or at the end of shorter text).
pub fn insert_last_updated(text: &str, updated: &str) -> String {
    // The stamp is ours alone; a model-written one is dropped.
    let mut lines: Vec<String> = text
        .lines()
        .filter(|l| !l.trim_start().to_ascii_lowercase().starts_with("last updated:"))
        .map(str::to_string)
        .collect();
    let stamp = format!("Last updated: {updated}");

    let confidence_at = lines
        .iter()
        .position(|l| l.trim_start().to_ascii_lowercase().starts_with("confidence:"));

    match confidence_at {
        Some(i) => lines.insert(i + 1, stamp),
        None => {
            tracing::debug!("no confidence line in block; inserting default");
            let at = lines.len().min(2);
            lines.insert(at, stamp);
            lines.insert(at, format!("Confidence: {}", Confidence::Moderate));
        }
    }
    lines.join("\n")
}

/// One `<span class="line">` per non-empty line, escaped, inside `<div class="lines">`.
pub fn lines_to_cell_html<S: AsRef<str>>(lines: &[S]) -> String {
    let spans: String = lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .map(|l| format!(r#"<span class="line">{}</span>"#, html_escape::encode_text(l)))
        .collect();
    format!(r#"<div class="lines">{spans}</div>"#)
}

/// Literal find-and-replace; no escaping, no expression syntax.
#[derive(Debug, Clone)]
pub struct Template {
    raw: String,
}

impl Template {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Every substitution is a required slot: a placeholder the template
    /// lacks means a cell would be dropped, so nothing is rendered.
    pub fn render(&self, substitutions: &[(String, String)]) -> Result<String> {
        let missing: Vec<&str> = substitutions
            .iter()
            .map(|(placeholder, _)| placeholder.as_str())
            .filter(|placeholder| !self.raw.contains(placeholder))
            .collect();
        if !missing.is_empty() {
            bail!("template lacks placeholders: {}", missing.join(", "));
        }

        let mut out = self.raw.clone();
        for (placeholder, value) in substitutions {
            out = out.replace(placeholder.as_str(), value);
        }
        Ok(out)
    }
}

/// Grid layout: header, day titles, one placeholder per (region, slot).
pub fn grid_substitutions(cells: &[Cell], slots: &[Slot], updated: &str) -> Vec<(String, String)> {
    let days: Vec<&Slot> = slots
        .iter()
        .filter(|s| matches!(s.kind, SlotKind::Day(_)))
        .collect();
    let first = days.first().map(|s| s.label.as_str()).unwrap_or_default();
    let last = days.last().map(|s| s.label.as_str()).unwrap_or_default();

    let mut subs = vec![(
        HEADER_PLACEHOLDER.to_string(),
        grid_header(first, last, grid_confidence(cells), updated),
    )];
    for (i, day) in days.iter().enumerate() {
        subs.push((format!("{{{{DAY{}_TITLE}}}}", i + 1), day.label.clone()));
    }
    for cell in cells {
        subs.push((cell.placeholder(), lines_to_cell_html(&cell.lines)));
    }
    subs
}

/// Weekend layout: every block stamped and stacked into `{{CONTENT}}`.
pub fn weekend_substitutions(cells: &[Cell], updated: &str) -> Vec<(String, String)> {
    let blocks: Vec<String> = cells
        .iter()
        .map(|cell| {
            let stamped = insert_last_updated(&cell.lines.join("\n"), updated);
            let lines: Vec<&str> = stamped.lines().collect();
            format!(
                r#"<section class="cell" data-region="{}" data-slot="{}">{}</section>"#,
                cell.region_key,
                cell.slot_key,
                lines_to_cell_html(&lines)
            )
        })
        .collect();
    vec![(CONTENT_PLACEHOLDER.to_string(), blocks.join("\n"))]
}
