//! Sink trait and dispatch

use std::fmt;

use nodewatch_core::{NodeEntry, NodewatchError, NodewatchResult};

/// What a sink does with an entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Display,
    Log,
    Forward,
    Custom,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SinkKind::Display => "display",
            SinkKind::Log => "log",
            SinkKind::Forward => "forward",
            SinkKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Consumer of accepted registry entries
pub trait Sink: Send {
    fn name(&self) -> &str;

    fn kind(&self) -> SinkKind;

    /// Deliver one accepted entry. Failures are not retried.
    fn offer(&mut self, entry: &NodeEntry) -> NodewatchResult<()>;
}

/// A sink that rejected an entry
#[derive(Debug)]
pub struct SinkFailure {
    pub sink: String,
    pub kind: SinkKind,
    pub error: NodewatchError,
}

/// Per-sink outcome of one dispatch
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failures: Vec<SinkFailure>,
}

impl DispatchReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, kind: SinkKind) -> bool {
        self.failures.iter().any(|f| f.kind == kind)
    }
}

/// Fans each accepted entry out to every registered sink
#[derive(Default)]
pub struct Dispatcher {
    sinks: Vec<Box<dyn Sink>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher { sinks: Vec::new() }
    }

    pub fn with_sink(mut self, sink: impl Sink + 'static) -> Self {
        self.add(sink);
        self
    }

    pub fn add(&mut self, sink: impl Sink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn add_boxed(&mut self, sink: Box<dyn Sink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Offer `entry` to every sink, in registration order
    pub fn dispatch(&mut self, entry: &NodeEntry) -> DispatchReport {
        let mut report = DispatchReport::default();

        for sink in self.sinks.iter_mut() {
            match sink.offer(entry) {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    tracing::warn!(
                        sink = sink.name(),
                        kind = %sink.kind(),
                        node = %entry.node_id,
                        %error,
                        "sink rejected entry"
                    );
                    report.failures.push(SinkFailure {
                        sink: sink.name().to_string(),
                        kind: sink.kind(),
                        error,
                    });
                }
            }
        }

        report
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|s| s.name()))
            .finish()
    }
}
