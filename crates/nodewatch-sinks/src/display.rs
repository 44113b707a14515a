//! Display sink and cycler
//!
//! The display sink only records which entries arrived; the cycler is the
//! periodic consumer that walks the registry one node per cycle and renders
//! a four-row text frame for a 16-column panel.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use nodewatch_core::{NodeEntry, NodeId, NodewatchResult, SensorValue, Timestamp};
use nodewatch_state::{Liveness, LivenessClassifier, NodeRegistry};

use crate::{Sink, SinkKind};

/// Panel width in characters
pub const DISPLAY_COLUMNS: usize = 16;
/// Text rows per frame
pub const DISPLAY_ROWS: usize = 4;

const OFFLINE_ROW: &str = "    OFFLINE     ";

/// Entries delivered since the display last looked
#[derive(Debug, Default)]
pub struct DisplayCache {
    pending: Mutex<Vec<NodeEntry>>,
}

impl DisplayCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry, replacing any pending entry of the same node
    pub fn store(&self, entry: &NodeEntry) {
        let mut pending = self.pending.lock();
        match pending.iter_mut().find(|e| e.node_id == entry.node_id) {
            Some(slot) => *slot = *entry,
            None => pending.push(*entry),
        }
    }

    /// Drain everything stored since the previous call
    pub fn take_pending(&self) -> Vec<NodeEntry> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }
}

/// Sink feeding the [`DisplayCache`]; never fails
#[derive(Debug, Clone)]
pub struct DisplaySink {
    cache: Arc<DisplayCache>,
}

impl DisplaySink {
    pub fn new(cache: Arc<DisplayCache>) -> Self {
        DisplaySink { cache }
    }
}

impl Sink for DisplaySink {
    fn name(&self) -> &str {
        "display"
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Display
    }

    fn offer(&mut self, entry: &NodeEntry) -> NodewatchResult<()> {
        self.cache.store(entry);
        Ok(())
    }
}

/// Readiness of the collaborators shown on the status screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemStatus {
    /// `None` when the log medium is ready, otherwise an error code
    pub log_medium: Option<i32>,
    pub network: bool,
    pub time: bool,
}

impl SystemStatus {
    pub const READY: SystemStatus = SystemStatus {
        log_medium: None,
        network: true,
        time: true,
    };

    pub fn all_ready(&self) -> bool {
        self.log_medium.is_none() && self.network && self.time
    }
}

impl Default for SystemStatus {
    fn default() -> Self {
        SystemStatus::READY
    }
}

/// What a frame shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Status,
    Empty,
    Node { node: NodeId, liveness: Liveness },
}

/// One rendered screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayFrame {
    pub kind: FrameKind,
    pub rows: [String; DISPLAY_ROWS],
    /// The shown node delivered a reading since the previous frame
    pub fresh: bool,
}

impl DisplayFrame {
    fn new(kind: FrameKind, rows: [String; DISPLAY_ROWS]) -> Self {
        DisplayFrame {
            kind,
            rows: rows.map(clip),
            fresh: false,
        }
    }
}

impl fmt::Display for DisplayFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<&str> = self.rows.iter().map(|r| r.trim_end()).collect();
        write!(f, "{}", rows.join(" | "))
    }
}

fn clip(mut row: String) -> String {
    if let Some((idx, _)) = row.char_indices().nth(DISPLAY_COLUMNS) {
        row.truncate(idx);
    }
    row
}

/// Display collaborator
pub trait DisplayPanel: Send {
    fn show(&mut self, frame: &DisplayFrame);
}

/// Walks the registry one node per cycle
#[derive(Debug)]
pub struct DisplayCycler {
    registry: Arc<NodeRegistry>,
    cache: Arc<DisplayCache>,
    liveness: LivenessClassifier,
    position: usize,
}

impl DisplayCycler {
    pub fn new(registry: Arc<NodeRegistry>, cache: Arc<DisplayCache>, liveness: LivenessClassifier) -> Self {
        DisplayCycler {
            registry,
            cache,
            liveness,
            position: 0,
        }
    }

    /// Position of the node the next frame will show
    pub fn position(&self) -> usize {
        self.position
    }

    /// Render the frame for this cycle and advance.
    ///
    /// While any collaborator is not ready the status screen is shown and
    /// the position does not move.
    pub fn next_frame(&mut self, now: Timestamp, status: &SystemStatus) -> DisplayFrame {
        if !status.all_ready() {
            return render_status(status);
        }

        let fresh = self.cache.take_pending();
        let snapshot = self.registry.snapshot();
        if snapshot.is_empty() {
            self.position = 0;
            return DisplayFrame::new(
                FrameKind::Empty,
                ["Scanning...".into(), "No nodes found.".into(), String::new(), String::new()],
            );
        }

        if self.position >= snapshot.len() {
            self.position = 0;
        }
        let entry = &snapshot[self.position];
        let mut frame = render_node(entry, self.position, snapshot.len(), self.liveness.classify(entry, now));
        frame.fresh = fresh.iter().any(|e| e.node_id == entry.node_id);

        self.position = (self.position + 1) % snapshot.len();
        frame
    }
}

pub fn render_status(status: &SystemStatus) -> DisplayFrame {
    let log = match status.log_medium {
        None => "Log:     OK".to_string(),
        Some(code) => format!("Log: FAIL({})", code),
    };
    let ready = |ok: bool| if ok { "OK" } else { "..." };

    DisplayFrame::new(
        FrameKind::Status,
        [
            "System Status:".into(),
            log,
            format!("Net:     {}", ready(status.network)),
            format!("Time:    {}", ready(status.time)),
        ],
    )
}

/// Render one node; `position` is zero-based
pub fn render_node(entry: &NodeEntry, position: usize, count: usize, liveness: Liveness) -> DisplayFrame {
    let state = if liveness.is_online() { "ON" } else { "OFF" };
    let header = format!("#{}/{} ID:{:<3} {}", position + 1, count, entry.node_id.0, state);
    let kind = FrameKind::Node {
        node: entry.node_id,
        liveness,
    };

    if !liveness.is_online() {
        return DisplayFrame::new(kind, [header, String::new(), OFFLINE_ROW.into(), String::new()]);
    }

    let temperature = match entry.temperature {
        SensorValue::Value(t) => format!("Temp: {:.2} C", t),
        SensorValue::Fault => "Temp: error".into(),
    };
    let humidity = match entry.humidity {
        SensorValue::Value(h) => format!("Humi: {:.2} %", h),
        SensorValue::Fault => "Humi: error".into(),
    };
    let illuminance = format!("Lux:  {}", entry.illuminance);

    DisplayFrame::new(kind, [header, temperature, humidity, illuminance])
}
