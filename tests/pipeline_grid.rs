// tests/pipeline_grid.rs
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use mountain_forecast::completion::FnCompleter;
use mountain_forecast::fetch::FixtureFetcher;
use mountain_forecast::{run, AbortReason, ForecastConfig, RunClock, RunOutcome};

const SEVEN: &str = "Rain: 40 to 70%\nValley wind: W 10 mph\nHill wind: W to SW 25 to 35 mph gusty\n\
                     Valley temp: 9 to 12C\nHill temp: 3 to 5C\nCloud base: 600m hill fog\nFreezing level: above summits";

fn clock() -> RunClock {
    RunClock {
        now: Utc.with_ymd_and_hms(2026, 10, 18, 7, 5, 0).unwrap(),
        today: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
    }
}

fn config(dir: &Path) -> ForecastConfig {
    let template = dir.join("page_template.html");
    std::fs::copy(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("page_template.html"),
        &template,
    )
    .unwrap();
    let mut cfg = ForecastConfig::default_seed();
    cfg.template_path = template;
    cfg.output_path = dir.join("index.html");
    cfg
}

fn fetcher(cfg: &ForecastConfig) -> FixtureFetcher {
    let mut f = FixtureFetcher::new();
    for region in &cfg.regions {
        f = f.with_page(
            &region.sources["mwis"],
            &format!("<h1>{}</h1><script>x()</script><p>Westerly gales</p>", region.name),
        );
    }
    f
}

#[tokio::test]
async fn full_success_publishes_every_cell() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let completer = FnCompleter::new(move |prompt: &str| {
        seen.fetch_add(1, Ordering::SeqCst);
        assert!(prompt.contains("Westerly gales"));
        assert!(!prompt.contains("x()"));
        Some(SEVEN.to_string())
    });

    let out = run(&cfg, &fetcher(&cfg), Arc::new(completer), clock()).await;
    assert!(matches!(out, RunOutcome::Published { cells: 16, .. }), "{out:?}");
    assert_eq!(calls.load(Ordering::SeqCst), 16);

    let html = std::fs::read_to_string(&cfg.output_path).unwrap();
    assert!(!html.contains("{{"), "unreplaced placeholder left");
    assert!(html.contains("Next 3 days (Sunday 18th October to Tuesday 20th October)"));
    assert!(html.contains("Confidence: Moderate"));
    assert!(html.contains("Last updated: 2026-10-18 07:05 UTC"));
    assert!(html.contains("<th>Monday 19th October</th>"));
    assert!(html.contains(r#"<span class="line">Hill wind: W to SW 25 to 35 mph gusty</span>"#));
    assert_eq!(html.matches(r#"<div class="lines">"#).count(), 16);
}

#[tokio::test]
async fn short_output_padded_and_confidence_drops() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let completer = FnCompleter::new(|prompt: &str| {
        if prompt.contains("DAY: Outlook") {
            Some("Rain: n/a\nValley wind: n/a".to_string())
        } else {
            Some(SEVEN.to_string())
        }
    });

    let out = run(&cfg, &fetcher(&cfg), Arc::new(completer), clock()).await;
    assert!(out.is_published(), "{out:?}");
    let html = std::fs::read_to_string(&cfg.output_path).unwrap();
    assert!(html.contains("Confidence: Low"));
    assert!(html.contains(
        r#"<span class="line">Valley wind: n/a</span><span class="line">n/a</span>"#
    ));
}

#[tokio::test]
async fn missing_cell_aborts_and_keeps_previous_page() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let previous = "<html>last good page</html>";
    std::fs::write(&cfg.output_path, previous).unwrap();

    let completer = FnCompleter::new(|prompt: &str| {
        if prompt.contains("AREA: Bannau Brycheiniog\nDAY: Monday 19th October") {
            None
        } else {
            Some(SEVEN.to_string())
        }
    });

    let out = run(&cfg, &fetcher(&cfg), Arc::new(completer), clock()).await;
    match out {
        RunOutcome::Aborted(AbortReason::MissingCell { region, slot }) => {
            assert_eq!(region, "Bannau Brycheiniog");
            assert_eq!(slot, "Monday 19th October");
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert_eq!(std::fs::read_to_string(&cfg.output_path).unwrap(), previous);
    assert!(!dir.path().join("index.html.tmp").exists());
}

#[tokio::test]
async fn concurrent_run_still_aborts_without_write() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.concurrency = 4;
    let completer = FnCompleter::new(|prompt: &str| {
        (!prompt.contains("AREA: Eryri")).then(|| SEVEN.to_string())
    });

    let out = run(&cfg, &fetcher(&cfg), Arc::new(completer), clock()).await;
    assert!(matches!(out, RunOutcome::Aborted(AbortReason::MissingCell { .. })), "{out:?}");
    assert!(!cfg.output_path.exists());
}

#[tokio::test]
async fn concurrent_success_keeps_cell_positions() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.concurrency = 5;
    let completer = FnCompleter::new(|prompt: &str| {
        let region = prompt
            .lines()
            .find_map(|l| l.strip_prefix("AREA: "))
            .unwrap_or_default()
            .to_string();
        Some(format!("Rain: {region}\n{}", SEVEN.lines().skip(1).collect::<Vec<_>>().join("\n")))
    });

    let out = run(&cfg, &fetcher(&cfg), Arc::new(completer), clock()).await;
    assert!(out.is_published(), "{out:?}");
    let html = std::fs::read_to_string(&cfg.output_path).unwrap();
    let lakes_row = html.split("The Lake District</th>").nth(1).unwrap();
    assert!(lakes_row.starts_with("\n        <td><div class=\"lines\"><span class=\"line\">Rain: The Lake District</span>"));
}

#[tokio::test]
async fn missing_template_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(dir.path());
    cfg.template_path = dir.path().join("absent.html");
    let completer = FnCompleter::new(|_: &str| Some(SEVEN.to_string()));

    let out = run(&cfg, &fetcher(&cfg), Arc::new(completer), clock()).await;
    assert!(matches!(out, RunOutcome::Aborted(AbortReason::Template(_))), "{out:?}");
    assert!(!cfg.output_path.exists());
}

#[tokio::test]
async fn template_lacking_a_cell_placeholder_keeps_previous_page() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let raw = std::fs::read_to_string(&cfg.template_path).unwrap();
    std::fs::write(&cfg.template_path, raw.replace("{{LAKES_OUTLOOK}}", "")).unwrap();
    let previous = "<html>last good page</html>";
    std::fs::write(&cfg.output_path, previous).unwrap();
    let completer = FnCompleter::new(|_: &str| Some(SEVEN.to_string()));

    let out = run(&cfg, &fetcher(&cfg), Arc::new(completer), clock()).await;
    match out {
        RunOutcome::Aborted(AbortReason::Template(e)) => {
            assert!(e.to_string().contains("{{LAKES_OUTLOOK}}"), "{e}");
        }
        other => panic!("expected template abort, got {other:?}"),
    }
    assert_eq!(std::fs::read_to_string(&cfg.output_path).unwrap(), previous);
    assert!(!dir.path().join("index.html.tmp").exists());
}
