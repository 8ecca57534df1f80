// src/prompt.rs
//! Instruction documents handed to the completion service, one per cell.
//!
//! The rules section carries the reconciliation policy in prose. Its worked
//! range examples come from `reconcile`, so the wording and the deterministic
//! rendering agree.

use crate::reconcile::{render_range, UNAVAILABLE};

/// Grid cell lines, in output order.
pub const GRID_LABELS: [&str; 7] = [
    "Rain",
    "Valley wind",
    "Hill wind",
    "Valley temp",
    "Hill temp",
    "Cloud base",
    "Freezing level",
];

/// Line prefixes a weekend block must carry.
pub const WEEKEND_PREFIXES: [&str; 5] = ["Rain:", "Wind:", "Temp:", "Cloud:", "Freezing level:"];

/// Longest free-text annotation allowed after a value.
pub const ANNOTATION_MAX_CHARS: usize = 25;

/// Everything that identifies one cell request.
#[derive(Debug, Clone, Copy)]
pub struct CellRequest<'a> {
    pub region: &'a str,
    pub slot_label: &'a str,
    /// Rendered `SourceBlob`.
    pub sources: &'a str,
    /// Source names, highest priority first.
    pub priority: &'a [&'a str],
}

fn priority_line(priority: &[&str]) -> String {
    let names: Vec<String> = priority.iter().map(|s| s.to_uppercase()).collect();
    names.join(" > ")
}

fn rules(priority: &[&str]) -> String {
    let spread = render_range(&[12.0, 18.0]);
    let flat = render_range(&[15.0, 15.0]);
    format!(
        "\
RULES:
- Use only values you can clearly extract from the sources above; otherwise write \"{UNAVAILABLE}\".
- When several sources give a value for the same metric, show the range from the lowest to the highest of them.
  * If only one source gives it, show that single value.
  * If no source gives it, write \"{UNAVAILABLE}\".
- If min = max, show only the single value (no range). Example: 15 and 15 -> \"{flat}\".
- If min differs from max, show ONLY the range and do NOT include any average or current value. Example: 12 and 18 -> \"{spread}\".
- Always use \"to\" for ranges (never hyphens).
- Where one value must be chosen, take it from the highest-priority source that gives one.
  If the two highest-priority sources disagree, choose the more conservative value (wetter, windier, colder, lower cloud).
- Source priority (highest first): {order}.
- Include wind direction on every wind line (e.g. \"W to SW 10 to 20 mph\" or \"W 15 mph\").
- You may append very brief helpful text ONLY if it adds value:
  * one line, under {ANNOTATION_MAX_CHARS} characters, lowercase
  * no commas, semicolons or full stops
  Examples: \"morning then dry\", \"gusty\", \"hill fog\", \"improving\", \"poor vis on tops\"
- Do not add commentary, headings or blank lines.",
        order = priority_line(priority),
    )
}

/// Fixed seven-line cell for one region and one day (or the outlook).
pub fn grid_cell_prompt(req: &CellRequest<'_>) -> String {
    let template: Vec<String> = GRID_LABELS.iter().map(|l| format!("{l}: ...")).collect();
    format!(
        "\
You are producing ONE forecast cell for ONE area and ONE day.

AREA: {region}
DAY: {day}

SOURCES (best-effort extracted text; may be incomplete):
{sources}

OUTPUT:
Return EXACTLY {n} lines, in this exact order (no extra lines):

{template}

{rules}",
        region = req.region,
        day = req.slot_label,
        sources = req.sources,
        n = GRID_LABELS.len(),
        template = template.join("\n"),
        rules = rules(req.priority),
    )
}

/// Free-form weekend block for one region and one weekend day.
pub fn weekend_cell_prompt(req: &CellRequest<'_>) -> String {
    format!(
        "\
You are writing the mountain forecast for ONE area on ONE weekend day.

AREA: {region}
DAY: {day}

SOURCES (best-effort extracted text; may be incomplete):
{sources}

OUTPUT:
Line 1: {region}
Line 2: {day}
Line 3: Confidence: High, Moderate or Low (how well the sources agree)
Then these lines, each starting with its label exactly as written:

Rain: <chance as a percentage, e.g. 60%, or \"{UNAVAILABLE}\" if no source gives one> ...
Wind: ...
Temp: ...
Cloud: ...
Freezing level: ...

{rules}",
        region = req.region,
        day = req.slot_label,
        sources = req.sources,
        rules = rules(req.priority),
    )
}
