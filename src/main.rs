//! Mountain forecast page generator — binary entrypoint.
//! One run: scrape sources, ask the model for each cell, publish the page.
//! Always exits 0; a failed run leaves the previous page in place.

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mountain_forecast::{run_from_env, RunClock, RunOutcome};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false))
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run_from_env(RunClock::current()).await {
        RunOutcome::Published { path, cells } => {
            info!(path = %path.display(), cells, "forecast generated and page updated");
        }
        RunOutcome::Skipped(reason) => warn!("{reason}"),
        RunOutcome::Aborted(reason) => {
            error!("{reason}; leaving existing page unchanged");
        }
    }
}
