mod bootstrap;

use std::time::Duration;

use anyhow::{Context, Result};
use logspark_core::settings::Settings;
use logspark_runtime::context::AppContext;
use logspark_runtime::orchestrator::Orchestrator;
use logspark_runtime::source;
use logspark_ui::app::{App, SessionEnd};

/// How long shutdown waits for the ingestion thread, which may be blocked
/// reading stdin.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let result = runtime.block_on(run());
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run() -> Result<()> {
    let settings = Settings::load()?;

    let app_dir = bootstrap::ensure_directories()?;
    let log_file = settings
        .log_file
        .clone()
        .unwrap_or_else(|| bootstrap::default_log_file(&app_dir));
    bootstrap::setup_logging(&settings.log_level, &log_file)?;

    tracing::info!("logspark v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        fields = ?settings.fields,
        distance = settings.distance,
        trend = ?settings.trend,
        format = ?settings.format,
        "configuration loaded"
    );

    // Config problems (missing nginx format) surface before the TUI starts.
    let records = source::open_stdin(&settings)?;

    let ctx = AppContext::from_settings(&settings);
    let store = ctx.store.clone();
    let (rx, handle) = Orchestrator::new(ctx).start(records);

    let app = App::new(&settings.theme, store);

    // Raw mode turns Ctrl+C into a key event, which the TUI treats as quit.
    // No SIGINT handler is installed, so an earlier Ctrl+C still terminates
    // the process.
    let end = app.run(rx).await?;
    handle.abort();

    match end {
        SessionEnd::Quit => {
            tracing::info!("exiting");
            Ok(())
        }
        SessionEnd::IngestFailed(error) => {
            tracing::error!(%error, "exiting after ingestion failure");
            Err(anyhow::Error::new(error).context("reading input"))
        }
    }
}
