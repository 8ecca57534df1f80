// src/slots.rs
//! Time slots a cell is produced for, and their human labels.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::config::Schema;

pub const OUTLOOK_LABEL: &str = "Outlook (days 4 to 7)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Day(NaiveDate),
    Outlook,
    Weekend(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub kind: SlotKind,
    /// e.g. "Saturday 24th October"
    pub label: String,
    /// Placeholder suffix, e.g. "DAY1", "OUTLOOK", "SAT".
    pub key: String,
}

/// Slots every region gets under `schema`, starting from `today`.
///
/// Weekend: the Saturday on or after `today` and the Sunday after it.
pub fn slots_for(schema: Schema, today: NaiveDate) -> Vec<Slot> {
    match schema {
        Schema::Grid => {
            let mut out: Vec<Slot> = (0..3)
                .map(|i| {
                    let d = today + Duration::days(i);
                    Slot {
                        kind: SlotKind::Day(d),
                        label: day_title(d),
                        key: format!("DAY{}", i + 1),
                    }
                })
                .collect();
            out.push(Slot {
                kind: SlotKind::Outlook,
                label: OUTLOOK_LABEL.to_string(),
                key: "OUTLOOK".to_string(),
            });
            out
        }
        Schema::Weekend => {
            let sat = next_saturday(today);
            let sun = sat + Duration::days(1);
            vec![
                Slot {
                    kind: SlotKind::Weekend(sat),
                    label: day_title(sat),
                    key: "SAT".to_string(),
                },
                Slot {
                    kind: SlotKind::Weekend(sun),
                    label: day_title(sun),
                    key: "SUN".to_string(),
                },
            ]
        }
    }
}

fn next_saturday(from: NaiveDate) -> NaiveDate {
    let ahead = (7 + Weekday::Sat.num_days_from_monday() as i64
        - from.weekday().num_days_from_monday() as i64)
        % 7;
    from + Duration::days(ahead)
}

fn ordinal(n: u32) -> String {
    let suffix = if (11..=13).contains(&(n % 100)) {
        "th"
    } else {
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{n}{suffix}")
}

/// "Saturday 24th October"
pub fn day_title(d: NaiveDate) -> String {
    format!("{} {} {}", d.format("%A"), ordinal(d.day()), d.format("%B"))
}
