// tests/pipeline_weekend.rs
use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use mountain_forecast::completion::FnCompleter;
use mountain_forecast::fetch::FixtureFetcher;
use mountain_forecast::{run, AbortReason, ForecastConfig, RunClock, RunOutcome, Schema};

const TEMPLATE: &str = "<main>\n{{CONTENT}}\n</main>";

fn clock() -> RunClock {
    RunClock {
        now: Utc.with_ymd_and_hms(2026, 10, 21, 18, 30, 0).unwrap(),
        // Wednesday
        today: NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(),
    }
}

fn config(dir: &Path) -> ForecastConfig {
    let mut cfg = ForecastConfig::default_seed();
    cfg.schema = Schema::Weekend;
    cfg.regions.truncate(2);
    cfg.template_path = dir.join("weekend.html");
    cfg.output_path = dir.join("weekend_out.html");
    std::fs::write(&cfg.template_path, TEMPLATE).unwrap();
    cfg
}

/// Echo region and day back in a well-formed block; only Eryri states confidence.
fn block(prompt: &str) -> Option<String> {
    let field = |key: &str| {
        prompt
            .lines()
            .find_map(|l| l.strip_prefix(key))
            .unwrap_or_default()
            .to_string()
    };
    let region = field("AREA: ");
    let day = field("DAY: ");
    let confidence = if region == "Eryri" { "Confidence: High\n" } else { "" };
    Some(format!(
        "{region}\n{day}\n{confidence}Rain: 70% heavy later\nWind: SW 30 to 45 mph\n\
         Temp: 1 to 4C\nCloud: 500m\nFreezing level: 1100m"
    ))
}

#[tokio::test]
async fn weekend_blocks_are_stamped_and_published() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let out = run(&cfg, &FixtureFetcher::new(), Arc::new(FnCompleter::new(block)), clock()).await;
    assert!(matches!(out, RunOutcome::Published { cells: 4, .. }), "{out:?}");

    let html = std::fs::read_to_string(&cfg.output_path).unwrap();
    assert!(html.starts_with("<main>\n<section class=\"cell\" data-region=\"PEAKS\" data-slot=\"SAT\">"));
    assert_eq!(html.matches("<section").count(), 4);
    assert_eq!(html.matches("Last updated: 2026-10-21 18:30 UTC").count(), 4);

    // Peaks had no confidence line: default inserted after the day line.
    assert!(html.contains(
        "<span class=\"line\">Saturday 24th October</span>\
         <span class=\"line\">Confidence: Moderate</span>\
         <span class=\"line\">Last updated: 2026-10-21 18:30 UTC</span>\
         <span class=\"line\">Rain: 70% heavy later</span>"
    ));
    // Eryri's own line kept, stamp right after it.
    assert!(html.contains(
        "<span class=\"line\">Confidence: High</span>\
         <span class=\"line\">Last updated: 2026-10-21 18:30 UTC</span>"
    ));
    assert!(html.contains("Sunday 25th October"));
}

#[tokio::test]
async fn prompt_carries_day_header_in_blob() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let completer = FnCompleter::new(|prompt: &str| {
        assert!(prompt.contains("=== DAY: "));
        block(prompt)
    });
    let out = run(&cfg, &FixtureFetcher::new(), Arc::new(completer), clock()).await;
    assert!(out.is_published(), "{out:?}");
}

#[tokio::test]
async fn malformed_block_aborts_without_write() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    std::fs::write(&cfg.output_path, "previous").unwrap();

    let completer = FnCompleter::new(|prompt: &str| {
        let text = block(prompt)?;
        if prompt.contains("DAY: Sunday") {
            Some(text.replace("Rain: 70%", "Rain: likely"))
        } else {
            Some(text)
        }
    });
    let out = run(&cfg, &FixtureFetcher::new(), Arc::new(completer), clock()).await;
    match out {
        RunOutcome::Aborted(AbortReason::RejectedCell { region, slot, .. }) => {
            assert_eq!(region, "The Peak District");
            assert_eq!(slot, "Sunday 25th October");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(std::fs::read_to_string(&cfg.output_path).unwrap(), "previous");
}

#[tokio::test]
async fn unavailable_rain_publishes() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let completer = FnCompleter::new(|prompt: &str| {
        Some(block(prompt)?.replace("Rain: 70% heavy later", "Rain: n/a"))
    });
    let out = run(&cfg, &FixtureFetcher::new(), Arc::new(completer), clock()).await;
    assert!(out.is_published(), "{out:?}");
    let html = std::fs::read_to_string(&cfg.output_path).unwrap();
    assert_eq!(html.matches("<span class=\"line\">Rain: n/a</span>").count(), 4);
}

#[tokio::test]
async fn grid_template_in_weekend_mode_keeps_previous_page() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    std::fs::copy(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("page_template.html"),
        &cfg.template_path,
    )
    .unwrap();
    std::fs::write(&cfg.output_path, "last good page").unwrap();

    let out = run(&cfg, &FixtureFetcher::new(), Arc::new(FnCompleter::new(block)), clock()).await;
    assert!(matches!(out, RunOutcome::Aborted(AbortReason::Template(_))), "{out:?}");
    assert_eq!(std::fs::read_to_string(&cfg.output_path).unwrap(), "last good page");
}

#[tokio::test]
async fn shipped_weekend_config_and_template_publish() {
    let dir = tempfile::tempdir().unwrap();
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut cfg = ForecastConfig::load_from(&root.join("config/weekend.toml")).unwrap();
    assert_eq!(cfg.schema, Schema::Weekend);
    cfg.template_path = root.join(&cfg.template_path);
    cfg.output_path = dir.path().join("weekend.html");

    let out = run(&cfg, &FixtureFetcher::new(), Arc::new(FnCompleter::new(block)), clock()).await;
    assert!(matches!(out, RunOutcome::Published { cells: 8, .. }), "{out:?}");
    let html = std::fs::read_to_string(&cfg.output_path).unwrap();
    assert!(!html.contains("{{"));
    assert_eq!(html.matches("<section class=\"cell\"").count(), 8);
}
