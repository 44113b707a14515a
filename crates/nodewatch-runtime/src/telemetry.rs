//! Logging setup

use tracing_subscriber::EnvFilter;

use nodewatch_core::{NodewatchError, NodewatchResult};

use crate::TelemetryConfig;

/// Install the global subscriber. `RUST_LOG` overrides `config.level`.
pub fn init(config: &TelemetryConfig) -> NodewatchResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| NodewatchError::InvalidConfig(format!("telemetry.level: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| NodewatchError::InvalidConfig(format!("logging already initialised: {}", e)))
}
