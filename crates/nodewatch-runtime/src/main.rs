//! `nodewatch` - sensor broadcast ingestion service
//!
//! Reads hex-encoded broadcast payloads from stdin (one per line), keeps the
//! node registry, appends per-node CSV logs, forwards JSON lines to stdout
//! and renders the display cycle into the log on stderr.
//!
//! ```text
//! nodewatch [CONFIG]
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::info;

use nodewatch_core::{Clock, SystemClock};
use nodewatch_runtime::{
    feed_hex_lines, intake_channel, run_display, run_ingest, telemetry, RuntimeConfig, Service,
    TracingPanel,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, source) = match std::env::args().nth(1) {
        Some(path) => (RuntimeConfig::load(&path)?, Some(PathBuf::from(path))),
        None => RuntimeConfig::load_or_default()?,
    };
    config.validate()?;
    telemetry::init(&config.telemetry)?;

    info!(
        source = %source.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "defaults".into()),
        capacity = config.registry.capacity,
        manufacturer_id = %format!("{:#06x}", config.registry.manufacturer_id),
        duplicate_window = %humantime::format_duration(config.policy.duplicate_window),
        liveness_timeout = %humantime::format_duration(config.policy.liveness_timeout),
        "configuration loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    if !clock.is_synchronized() {
        tracing::warn!("system clock not synchronized, log writes will be skipped");
    }

    let service = Service::build(&config, clock, std::io::stdout())?;
    let (sender, receiver) = intake_channel(config.intake.queue_depth);
    let ingest = tokio::spawn(run_ingest(service.pipeline, receiver));

    let (stop_display, shutdown) = watch::channel(false);
    let display = config.display.enabled.then(|| {
        tokio::spawn(run_display(
            service.cycler,
            TracingPanel,
            service.probe,
            config.display.cycle,
            shutdown,
        ))
    });

    info!("reading broadcasts from stdin");
    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        fed = feed_hex_lines(stdin, &sender) => {
            let stats = fed?;
            info!(lines = stats.lines, forwarded = stats.forwarded, invalid = stats.invalid_hex, "input exhausted");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
        }
    }

    let dropped = sender.dropped();
    drop(sender);
    let stats = ingest.await?;
    info!(
        received = stats.received,
        accepted = stats.accepted(),
        suppressed = stats.suppressed,
        deferred = stats.deferred,
        rejected = stats.rejected,
        dropped,
        "shutting down"
    );

    let _ = stop_display.send(true);
    if let Some(display) = display {
        display.await?;
    }

    Ok(())
}
