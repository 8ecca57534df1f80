// src/pipeline.rs
//! End-to-end run: registry -> fetch -> blob -> prompt -> completion ->
//! validation -> composition -> publish. The first missing cell stops the
//! run before anything is written.

use chrono::{DateTime, Local, NaiveDate, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::blob::SourceBlob;
use crate::completion::{Completer, Credentials, OpenAiCompleter, ENV_API_KEY};
use crate::compose::{format_updated, grid_substitutions, weekend_substitutions, Cell};
use crate::config::{ForecastConfig, Schema};
use crate::error::{AbortReason, SkipReason};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::prompt::{grid_cell_prompt, weekend_cell_prompt, CellRequest, GRID_LABELS, WEEKEND_PREFIXES};
use crate::publish::Publisher;
use crate::slots::{slots_for, Slot};
use crate::validate::{correct_line_count, validate_prefix_block, CellOutcome};

#[derive(Debug)]
pub enum RunOutcome {
    Published { path: PathBuf, cells: usize },
    Skipped(SkipReason),
    Aborted(AbortReason),
}

impl RunOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, RunOutcome::Published { .. })
    }
}

/// Wall-clock inputs, injectable for tests.
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

impl RunClock {
    pub fn current() -> Self {
        Self {
            now: Utc::now(),
            today: Local::now().date_naive(),
        }
    }
}

/// One completion request, owned so it can move into a task.
#[derive(Debug, Clone)]
struct CellJob {
    index: usize,
    region_key: String,
    region_name: String,
    slot_key: String,
    slot_label: String,
    prompt: String,
}

/// Production entry: credential check, config load, live clients, run.
pub async fn run_from_env(clock: RunClock) -> RunOutcome {
    let Some(creds) = Credentials::from_env() else {
        return RunOutcome::Skipped(SkipReason::MissingCredential(ENV_API_KEY));
    };
    info!(model = %creds.model, "credential present");

    let cfg = match ForecastConfig::load_default() {
        Ok(c) => c,
        Err(e) => return RunOutcome::Aborted(AbortReason::Config(e)),
    };

    let fetcher = match HttpFetcher::new(&cfg.user_agent, Duration::from_secs(cfg.fetch_timeout_secs)) {
        Ok(f) => f,
        Err(e) => return RunOutcome::Aborted(AbortReason::Setup(e)),
    };
    let completer =
        match OpenAiCompleter::new(&creds, Duration::from_secs(cfg.completion_timeout_secs)) {
            Ok(c) => c,
            Err(e) => return RunOutcome::Aborted(AbortReason::Setup(e)),
        };

    run(&cfg, &fetcher, Arc::new(completer), clock).await
}

/// Run the pipeline with injected collaborators.
pub async fn run(
    cfg: &ForecastConfig,
    fetcher: &dyn Fetcher,
    completer: Arc<dyn Completer>,
    clock: RunClock,
) -> RunOutcome {
    let slots = slots_for(cfg.schema, clock.today);
    let updated = format_updated(clock.now);

    let jobs = build_jobs(cfg, fetcher, &slots).await;
    info!(
        cells = jobs.len(),
        concurrency = cfg.concurrency,
        provider = completer.provider_name(),
        "requesting cells"
    );

    let cells = match produce_cells(cfg.schema, completer, jobs, cfg.concurrency).await {
        Ok(c) => c,
        Err(reason) => return RunOutcome::Aborted(reason),
    };

    let mut publisher = Publisher::new(&cfg.template_path, &cfg.output_path);
    let template = match publisher.read_template().await {
        Ok(t) => t,
        Err(e) => return RunOutcome::Aborted(AbortReason::Template(e)),
    };

    let subs = match cfg.schema {
        Schema::Grid => grid_substitutions(&cells, &slots, &updated),
        Schema::Weekend => weekend_substitutions(&cells, &updated),
    };
    let html = match template.render(&subs) {
        Ok(h) => h,
        Err(e) => return RunOutcome::Aborted(AbortReason::Template(e)),
    };

    match publisher.publish(&html).await {
        Ok(()) => RunOutcome::Published {
            path: publisher.output_path().to_path_buf(),
            cells: cells.len(),
        },
        Err(e) => RunOutcome::Aborted(AbortReason::Write(e)),
    }
}

/// Fetch each region's sources once and build one prompt per (region, slot).
async fn build_jobs(cfg: &ForecastConfig, fetcher: &dyn Fetcher, slots: &[Slot]) -> Vec<CellJob> {
    let priority = cfg.priority_names();
    let mut jobs = Vec::with_capacity(cfg.regions.len() * slots.len());

    for region in &cfg.regions {
        info!(region = %region.name, "fetching sources");
        let blob = SourceBlob::collect(cfg, region, fetcher).await;
        if blob.ok_count() == 0 {
            warn!(region = %region.name, "no source fetched successfully");
        }
        let region_blob = blob.render(None);

        for slot in slots {
            let sources = match cfg.schema {
                Schema::Grid => region_blob.clone(),
                Schema::Weekend => blob.render(Some(slot.label.as_str())),
            };
            let req = CellRequest {
                region: &region.name,
                slot_label: &slot.label,
                sources: &sources,
                priority: &priority,
            };
            let prompt = match cfg.schema {
                Schema::Grid => grid_cell_prompt(&req),
                Schema::Weekend => weekend_cell_prompt(&req),
            };
            jobs.push(CellJob {
                index: jobs.len(),
                region_key: region.key.clone(),
                region_name: region.name.clone(),
                slot_key: slot.key.clone(),
                slot_label: slot.label.clone(),
                prompt,
            });
        }
    }
    jobs
}

async fn produce_cell(
    schema: Schema,
    completer: &dyn Completer,
    job: CellJob,
) -> Result<Cell, AbortReason> {
    let Some(raw) = completer.complete(&job.prompt).await else {
        return Err(AbortReason::MissingCell {
            region: job.region_name,
            slot: job.slot_label,
        });
    };

    let outcome = match schema {
        Schema::Grid => correct_line_count(&raw, GRID_LABELS.len()),
        Schema::Weekend => validate_prefix_block(&raw, &WEEKEND_PREFIXES),
    };
    let corrected = outcome.is_corrected();
    let lines = match outcome {
        CellOutcome::Exact(lines) => lines,
        CellOutcome::Corrected { lines, received } => {
            warn!(
                region = %job.region_name,
                slot = %job.slot_label,
                received,
                expected = lines.len(),
                "cell line count corrected"
            );
            lines
        }
        CellOutcome::Rejected { reason } => {
            return Err(AbortReason::RejectedCell {
                region: job.region_name,
                slot: job.slot_label,
                reason,
            })
        }
    };

    Ok(Cell {
        region_key: job.region_key,
        region_name: job.region_name,
        slot_key: job.slot_key,
        slot_label: job.slot_label,
        lines,
        corrected,
    })
}

/// At most `concurrency` completions in flight; the first failure drops the
/// rest. With `concurrency == 1` this is a plain sequential loop.
async fn produce_cells(
    schema: Schema,
    completer: Arc<dyn Completer>,
    jobs: Vec<CellJob>,
    concurrency: usize,
) -> Result<Vec<Cell>, AbortReason> {
    if concurrency <= 1 {
        let mut cells = Vec::with_capacity(jobs.len());
        for job in jobs {
            cells.push(produce_cell(schema, completer.as_ref(), job).await?);
        }
        return Ok(cells);
    }

    let total = jobs.len();
    let mut slots: Vec<Option<Cell>> = vec![None; total];
    let mut set: JoinSet<(usize, Result<Cell, AbortReason>)> = JoinSet::new();
    let mut pending = jobs.into_iter();

    loop {
        while set.len() < concurrency {
            let Some(job) = pending.next() else { break };
            let completer = Arc::clone(&completer);
            set.spawn(async move {
                let index = job.index;
                (index, produce_cell(schema, completer.as_ref(), job).await)
            });
        }
        let Some(joined) = set.join_next().await else { break };
        match joined {
            Ok((index, Ok(cell))) => slots[index] = Some(cell),
            Ok((_, Err(reason))) => {
                set.abort_all();
                return Err(reason);
            }
            Err(e) => {
                set.abort_all();
                return Err(AbortReason::Task(e.to_string()));
            }
        }
    }

    Ok(slots.into_iter().flatten().collect())
}
