//! JSON-line forward channel
//!
//! Every accepted entry becomes one line on the channel:
//!
//! ```text
//! {"id":5,"v":"1.0","metrics":{"temperature_5":23.5,"humidity_5":61.2,"illuminance_5":300}}
//! ```
//!
//! Metric names carry a `_<id>` suffix except for the primary node. Faulted
//! channels are left out. Lines are encoded into a fixed-size buffer; a line
//! that does not fit is skipped, never truncated.

use std::io::{self, Write};

use bytes::{BufMut, BytesMut};
use serde::ser::{Serialize, SerializeMap, Serializer};

use nodewatch_core::{NodeEntry, NodeId, NodewatchError, NodewatchResult};

use crate::{Sink, SinkKind};

/// Default output buffer size in bytes
pub const DEFAULT_FORWARD_BUFFER: usize = 256;

/// Version tag carried by every message
pub const FORWARD_VERSION: &str = "1.0";

/// Node whose metric names are not suffixed
pub const DEFAULT_PRIMARY_NODE: NodeId = NodeId(1);

#[derive(Clone, Debug)]
pub struct ForwardConfig {
    pub buffer_size: usize,
    pub primary_node: NodeId,
    pub version: String,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        ForwardConfig {
            buffer_size: DEFAULT_FORWARD_BUFFER,
            primary_node: DEFAULT_PRIMARY_NODE,
            version: FORWARD_VERSION.to_string(),
        }
    }
}

#[derive(serde::Serialize)]
struct Message<'a> {
    id: u8,
    v: &'a str,
    metrics: Metrics<'a>,
}

struct Metrics<'a> {
    entry: &'a NodeEntry,
    suffix: Option<NodeId>,
}

impl Metrics<'_> {
    fn key(&self, name: &str) -> String {
        match self.suffix {
            Some(id) => format!("{}_{}", name, id),
            None => name.to_string(),
        }
    }
}

impl Serialize for Metrics<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(t) = self.entry.temperature.value() {
            map.serialize_entry(&self.key("temperature"), &round2(t))?;
        }
        if let Some(h) = self.entry.humidity.value() {
            map.serialize_entry(&self.key("humidity"), &round2(h))?;
        }
        if let Some(l) = self.entry.illuminance.value() {
            map.serialize_entry(&self.key("illuminance"), &l)?;
        }
        map.end()
    }
}

fn round2(v: f32) -> f64 {
    (v as f64 * 100.0).round() / 100.0
}

/// Forward sink over any byte stream
pub struct ForwardSink<W: Write> {
    out: W,
    buf: BytesMut,
    config: ForwardConfig,
}

impl<W: Write> ForwardSink<W> {
    pub fn new(out: W, config: ForwardConfig) -> Self {
        ForwardSink {
            out,
            buf: BytesMut::with_capacity(config.buffer_size),
            config,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn message<'a>(&'a self, entry: &'a NodeEntry) -> Message<'a> {
        let suffix = (entry.node_id != self.config.primary_node).then_some(entry.node_id);
        Message {
            id: entry.node_id.to_byte(),
            v: &self.config.version,
            metrics: Metrics { entry, suffix },
        }
    }

    /// Encode one line into the buffer, failing if it does not fit
    fn encode(&mut self, entry: &NodeEntry) -> NodewatchResult<()> {
        let capacity = self.config.buffer_size;
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();

        let written = {
            let mut writer = (&mut buf).limit(capacity).writer();
            serde_json::to_writer(&mut writer, &self.message(entry))
                .map_err(io::Error::from)
                .and_then(|()| writer.write_all(b"\n"))
        };
        self.buf = buf;

        match written {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::WriteZero => {
                self.buf.clear();
                let needed = serde_json::to_vec(&self.message(entry))
                    .map(|line| line.len() + 1)
                    .unwrap_or(capacity + 1);
                Err(NodewatchError::ForwardBufferOverflow { needed, capacity })
            }
            Err(e) => Err(NodewatchError::ForwardChannel(e.to_string())),
        }
    }
}

impl<W: Write + Send> Sink for ForwardSink<W> {
    fn name(&self) -> &str {
        "forward"
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Forward
    }

    fn offer(&mut self, entry: &NodeEntry) -> NodewatchResult<()> {
        self.encode(entry)?;

        let result = self
            .out
            .write_all(&self.buf)
            .and_then(|()| self.out.flush())
            .map_err(|e| NodewatchError::ForwardChannel(e.to_string()));
        self.buf.clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodewatch_core::{DecodedReading, SensorValue, Timestamp};

    fn entry(node: u8) -> NodeEntry {
        let reading = DecodedReading {
            node_id: NodeId::new(node),
            temperature: SensorValue::Value(23.5),
            humidity: SensorValue::Value(61.2),
            illuminance: SensorValue::Value(300),
        };
        NodeEntry::from_reading(&reading, Timestamp::from_secs(1))
    }

    fn sent(sink: &ForwardSink<Vec<u8>>) -> serde_json::Value {
        let text = std::str::from_utf8(sink.get_ref()).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.matches('\n').count(), 1);
        serde_json::from_str(text.trim_end()).unwrap()
    }

    #[test]
    fn test_secondary_node_metrics_suffixed() {
        let mut sink = ForwardSink::new(Vec::new(), ForwardConfig::default());
        sink.offer(&entry(5)).unwrap();

        let value = sent(&sink);
        assert_eq!(value["id"], 5);
        assert_eq!(value["v"], FORWARD_VERSION);
        assert_eq!(value["metrics"]["temperature_5"], 23.5);
        assert_eq!(value["metrics"]["humidity_5"], 61.2);
        assert_eq!(value["metrics"]["illuminance_5"], 300);
    }

    #[test]
    fn test_primary_node_unsuffixed() {
        let mut sink = ForwardSink::new(Vec::new(), ForwardConfig::default());
        sink.offer(&entry(1)).unwrap();

        let value = sent(&sink);
        assert_eq!(value["metrics"]["temperature"], 23.5);
        assert!(value["metrics"].get("temperature_1").is_none());
    }

    #[test]
    fn test_faulted_fields_omitted() {
        let mut e = entry(2);
        e.humidity = SensorValue::Fault;
        e.illuminance = SensorValue::Fault;

        let mut sink = ForwardSink::new(Vec::new(), ForwardConfig::default());
        sink.offer(&e).unwrap();

        let metrics = sent(&sink)["metrics"].as_object().unwrap().clone();
        assert_eq!(metrics.len(), 1);
        assert!(metrics.contains_key("temperature_2"));
    }

    #[test]
    fn test_overflow_is_skipped_not_truncated() {
        let config = ForwardConfig {
            buffer_size: 32,
            ..ForwardConfig::default()
        };
        let mut sink = ForwardSink::new(Vec::new(), config);

        let result = sink.offer(&entry(5));
        match result {
            Err(NodewatchError::ForwardBufferOverflow { needed, capacity }) => {
                assert_eq!(capacity, 32);
                assert!(needed > 32);
            }
            other => panic!("expected overflow, got {:?}", other),
        }
        assert!(sink.get_ref().is_empty());

        // The buffer is reusable after an overflow
        let mut sink = ForwardSink::new(Vec::new(), ForwardConfig::default());
        sink.offer(&entry(5)).unwrap();
        sink.offer(&entry(6)).unwrap();
        assert_eq!(std::str::from_utf8(sink.get_ref()).unwrap().lines().count(), 2);
    }

    struct ClosedChannel;

    impl Write for ClosedChannel {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_channel_failure() {
        let mut sink = ForwardSink::new(ClosedChannel, ForwardConfig::default());
        let result = sink.offer(&entry(5));
        assert!(matches!(result, Err(NodewatchError::ForwardChannel(_))));
    }
}
