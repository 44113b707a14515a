//! Runtime configuration
//!
//! Loaded from `nodewatch.toml`. Every section and field has a default, so
//! an empty file (or no file at all) yields a working configuration.
//! Durations are written as human strings such as `"2s"` or `"500ms"`.
//!
//! ```toml
//! [registry]
//! capacity = 36
//! manufacturer_id = 0x02E5
//!
//! [policy]
//! duplicate_window = "2s"
//! liveness_timeout = "30s"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use nodewatch_core::{NodeId, NodewatchError, NodewatchResult};
use nodewatch_sinks::{ForwardConfig, DEFAULT_FORWARD_BUFFER, FORWARD_VERSION};
use nodewatch_state::{DEFAULT_CAPACITY, DEFAULT_DUPLICATE_WINDOW, DEFAULT_LIVENESS_TIMEOUT};
use nodewatch_wire::DEFAULT_MANUFACTURER_ID;

/// File name searched by [`RuntimeConfig::load_or_default`]
pub const CONFIG_FILE: &str = "nodewatch.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub registry: RegistryConfig,
    pub policy: PolicyConfig,
    pub intake: IntakeConfig,
    pub display: DisplayConfig,
    pub log: LogConfig,
    pub forward: ForwardSection,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub capacity: usize,
    pub manufacturer_id: u16,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            capacity: DEFAULT_CAPACITY,
            manufacturer_id: DEFAULT_MANUFACTURER_ID,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    #[serde(with = "human_duration")]
    pub duplicate_window: Duration,
    #[serde(with = "human_duration")]
    pub liveness_timeout: Duration,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Broadcasts buffered between the radio and the ingest task
    pub queue_depth: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        IntakeConfig { queue_depth: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    #[serde(with = "human_duration")]
    pub cycle: Duration,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            enabled: true,
            cycle: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            enabled: true,
            dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardSection {
    pub enabled: bool,
    pub buffer_size: usize,
    /// Node whose metric names carry no id suffix
    pub primary_node: u8,
    pub version: String,
}

impl Default for ForwardSection {
    fn default() -> Self {
        ForwardSection {
            enabled: true,
            buffer_size: DEFAULT_FORWARD_BUFFER,
            primary_node: 1,
            version: FORWARD_VERSION.to_string(),
        }
    }
}

impl ForwardSection {
    pub fn sink_config(&self) -> ForwardConfig {
        ForwardConfig {
            buffer_size: self.buffer_size,
            primary_node: NodeId::new(self.primary_node),
            version: self.version.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default filter; `RUST_LOG` takes precedence
    pub level: String,
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> NodewatchResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodewatchError::InvalidConfig(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
            .map_err(|e| NodewatchError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> NodewatchResult<Self> {
        toml::from_str(content).map_err(|e| NodewatchError::InvalidConfig(e.to_string()))
    }

    /// Search `config/nodewatch.toml` then `../config/nodewatch.toml`.
    ///
    /// Returns the path the configuration came from, `None` for defaults. A
    /// file that exists but does not parse is an error.
    pub fn load_or_default() -> NodewatchResult<(Self, Option<PathBuf>)> {
        let paths = [
            PathBuf::from("config").join(CONFIG_FILE),
            PathBuf::from("..").join("config").join(CONFIG_FILE),
        ];

        for path in paths {
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((Self::default(), None))
    }

    pub fn validate(&self) -> NodewatchResult<()> {
        if self.registry.capacity == 0 {
            return Err(NodewatchError::InvalidConfig("registry.capacity must be at least 1".into()));
        }
        if self.intake.queue_depth == 0 {
            return Err(NodewatchError::InvalidConfig("intake.queue_depth must be at least 1".into()));
        }
        if self.forward.buffer_size == 0 {
            return Err(NodewatchError::InvalidConfig("forward.buffer_size must be at least 1".into()));
        }
        if self.display.cycle.is_zero() {
            return Err(NodewatchError::InvalidConfig("display.cycle must be non-zero".into()));
        }
        if self.policy.duplicate_window >= self.policy.liveness_timeout {
            return Err(NodewatchError::InvalidConfig(format!(
                "policy.duplicate_window ({}) must be shorter than policy.liveness_timeout ({})",
                humantime::format_duration(self.policy.duplicate_window),
                humantime::format_duration(self.policy.liveness_timeout)
            )));
        }
        Ok(())
    }
}

mod human_duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = RuntimeConfig::from_toml("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.registry.capacity, 36);
        assert_eq!(config.policy.liveness_timeout, Duration::from_secs(30));
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_sections() {
        let config = RuntimeConfig::from_toml(
            r#"
            [registry]
            manufacturer_id = 0x1234

            [policy]
            duplicate_window = "500ms"

            [log]
            dir = "/var/lib/nodewatch"
            "#,
        )
        .unwrap();

        assert_eq!(config.registry.manufacturer_id, 0x1234);
        assert_eq!(config.registry.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.policy.duplicate_window, Duration::from_millis(500));
        assert_eq!(config.policy.liveness_timeout, DEFAULT_LIVENESS_TIMEOUT);
        assert_eq!(config.log.dir, PathBuf::from("/var/lib/nodewatch"));
        assert!(config.log.enabled);
    }

    #[test]
    fn test_bad_duration_rejected() {
        let result = RuntimeConfig::from_toml("[policy]\nliveness_timeout = \"soon\"\n");
        assert!(matches!(result, Err(NodewatchError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_window_shorter_than_timeout() {
        let mut config = RuntimeConfig::default();
        config.policy.duplicate_window = Duration::from_secs(30);
        assert!(config.validate().is_err());

        config.policy.duplicate_window = Duration::from_secs(29);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_sizes() {
        let mut config = RuntimeConfig::default();
        config.registry.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = RuntimeConfig::default();
        config.forward.buffer_size = 0;
        assert!(config.validate().is_err());

        let mut config = RuntimeConfig::default();
        config.intake.queue_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut config = RuntimeConfig::default();
        config.forward.primary_node = 7;
        config.display.cycle = Duration::from_secs(5);
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.forward.sink_config().primary_node, NodeId::new(7));
    }

    #[test]
    fn test_missing_file() {
        let result = RuntimeConfig::load("/nonexistent/nodewatch.toml");
        assert!(matches!(result, Err(NodewatchError::InvalidConfig(_))));
    }
}
