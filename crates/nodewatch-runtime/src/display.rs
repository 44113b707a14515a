//! Periodic display refresh

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use nodewatch_core::Clock;
use nodewatch_sinks::{DisplayCycler, DisplayFrame, DisplayPanel, SystemStatus};

/// Derives the status screen from the collaborators
pub struct StatusProbe {
    log_dir: Option<PathBuf>,
    clock: Arc<dyn Clock>,
}

impl StatusProbe {
    /// `log_dir` is `None` when logging is disabled
    pub fn new(log_dir: Option<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        StatusProbe { log_dir, clock }
    }

    pub fn status(&self) -> SystemStatus {
        let log_medium = self.log_dir.as_ref().and_then(|dir| match std::fs::metadata(dir) {
            Ok(meta) if meta.is_dir() => None,
            Ok(_) => Some(-1),
            Err(e) => Some(e.raw_os_error().unwrap_or(-1)),
        });

        SystemStatus {
            log_medium,
            network: true,
            time: self.clock.is_synchronized(),
        }
    }
}

/// Panel that writes frames to the log
#[derive(Debug, Default)]
pub struct TracingPanel;

impl DisplayPanel for TracingPanel {
    fn show(&mut self, frame: &DisplayFrame) {
        tracing::info!(target: "nodewatch::display", fresh = frame.fresh, "{}", frame);
    }
}

/// Render one frame per `period` until `shutdown` flips to true
pub async fn run_display<P: DisplayPanel>(
    mut cycler: DisplayCycler,
    mut panel: P,
    probe: StatusProbe,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let frame = cycler.next_frame(probe.clock.now(), &probe.status());
                panel.show(&frame);
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}
