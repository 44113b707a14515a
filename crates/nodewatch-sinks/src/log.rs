//! Per-node CSV log
//!
//! Each node gets its own `node_<id>.csv` under the log directory. The
//! header is written when the file is created and every accepted reading
//! appends one record:
//!
//! ```text
//! Timestamp,Temperature,Humidity,Illuminance
//! 2024-05-01 12:00:03,23.50,61.20,300
//! ```
//!
//! Faulted temperature or humidity is written as `nan`, faulted
//! illuminance as `0`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, TimeZone};

use nodewatch_core::{Clock, NodeEntry, NodeId, NodewatchError, NodewatchResult, SensorValue, Timestamp};

use crate::{Sink, SinkKind};

pub const CSV_HEADER: &str = "Timestamp,Temperature,Humidity,Illuminance";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvLogSink {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl CsvLogSink {
    pub fn new(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        CsvLogSink {
            dir: dir.into(),
            clock,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the log directory is currently present
    pub fn is_available(&self) -> bool {
        self.dir.is_dir()
    }

    pub fn path_for(&self, id: NodeId) -> PathBuf {
        self.dir.join(format!("node_{}.csv", id))
    }

    fn append(&self, entry: &NodeEntry) -> std::io::Result<bool> {
        let path = self.path_for(entry.node_id);
        let created = !path.exists();

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut record = String::with_capacity(64);
        if created {
            record.push_str(CSV_HEADER);
            record.push('\n');
        }
        record.push_str(&format_record(entry, &format_time(entry.last_seen)?));
        record.push('\n');

        file.write_all(record.as_bytes())?;
        Ok(created)
    }
}

impl Sink for CsvLogSink {
    fn name(&self) -> &str {
        "csv-log"
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Log
    }

    fn offer(&mut self, entry: &NodeEntry) -> NodewatchResult<()> {
        if !self.clock.is_synchronized() {
            return Err(NodewatchError::ClockUnsynchronized);
        }
        if !self.is_available() {
            return Err(NodewatchError::LogMediumUnavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }

        let created = self
            .append(entry)
            .map_err(|e| NodewatchError::LogMediumUnavailable(e.to_string()))?;
        if created {
            tracing::info!(node = %entry.node_id, path = %self.path_for(entry.node_id).display(), "created log file");
        }
        Ok(())
    }
}

/// One CSV record, without the line terminator
pub fn format_record(entry: &NodeEntry, time: &str) -> String {
    format!(
        "{},{},{},{}",
        time,
        two_decimals(entry.temperature),
        two_decimals(entry.humidity),
        entry.illuminance.value().unwrap_or(0)
    )
}

fn two_decimals(value: SensorValue<f32>) -> String {
    match value {
        SensorValue::Value(v) => format!("{:.2}", v),
        SensorValue::Fault => "nan".to_string(),
    }
}

fn format_time(ts: Timestamp) -> std::io::Result<String> {
    Local
        .timestamp_millis_opt(ts.as_millis())
        .earliest()
        .map(|t| t.format(TIME_FORMAT).to_string())
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidData, format!("timestamp {:?} out of range", ts)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodewatch_core::{DecodedReading, ManualClock};
    use std::fs;

    const SYNCED: Timestamp = Timestamp(1_714_564_800_000);

    fn entry(node: u8, temperature: SensorValue<f32>, illuminance: SensorValue<u16>) -> NodeEntry {
        let reading = DecodedReading {
            node_id: NodeId::new(node),
            temperature,
            humidity: SensorValue::Value(61.2),
            illuminance,
        };
        NodeEntry::from_reading(&reading, SYNCED)
    }

    fn expected_time() -> String {
        Local
            .timestamp_millis_opt(SYNCED.as_millis())
            .earliest()
            .unwrap()
            .format(TIME_FORMAT)
            .to_string()
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(SYNCED));
        let mut sink = CsvLogSink::new(dir.path(), clock);

        let e = entry(5, SensorValue::Value(23.5), SensorValue::Value(300));
        sink.offer(&e).unwrap();
        sink.offer(&e).unwrap();

        let contents = fs::read_to_string(dir.path().join("node_5.csv")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], format!("{},23.50,61.20,300", expected_time()));
        assert_eq!(lines[1], lines[2]);
    }

    #[test]
    fn test_faults_formatting() {
        let e = entry(7, SensorValue::Fault, SensorValue::Fault);
        assert_eq!(format_record(&e, "T"), "T,nan,61.20,0");
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(SYNCED));
        let mut sink = CsvLogSink::new(dir.path().join("unmounted"), clock);

        assert!(!sink.is_available());
        let result = sink.offer(&entry(5, SensorValue::Value(1.0), SensorValue::Value(1)));
        assert!(matches!(result, Err(NodewatchError::LogMediumUnavailable(_))));
    }

    #[test]
    fn test_unsynchronized_clock_skips_write() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(SYNCED));
        clock.set_synchronized(false);
        let mut sink = CsvLogSink::new(dir.path(), clock);

        let result = sink.offer(&entry(5, SensorValue::Value(1.0), SensorValue::Value(1)));
        assert!(matches!(result, Err(NodewatchError::ClockUnsynchronized)));
        assert!(!sink.path_for(NodeId::new(5)).exists());
    }
}
