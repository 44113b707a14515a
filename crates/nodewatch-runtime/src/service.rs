//! Assembly of the pipeline and display loop from a [`RuntimeConfig`]

use std::io::Write;
use std::sync::Arc;

use nodewatch_core::{Clock, NodewatchResult};
use nodewatch_sinks::{CsvLogSink, DisplayCache, DisplayCycler, DisplaySink, Dispatcher, ForwardSink};
use nodewatch_state::{DedupPolicy, LivenessClassifier, NodeRegistry};
use nodewatch_wire::PayloadCodec;

use crate::{IngestPipeline, RuntimeConfig, StatusProbe};

/// Everything the binary runs
pub struct Service {
    pub pipeline: IngestPipeline,
    pub cycler: DisplayCycler,
    pub probe: StatusProbe,
}

impl Service {
    /// Build from a validated configuration; forward lines go to `forward_out`
    pub fn build<W>(config: &RuntimeConfig, clock: Arc<dyn Clock>, forward_out: W) -> NodewatchResult<Self>
    where
        W: Write + Send + 'static,
    {
        config.validate()?;

        let registry = Arc::new(NodeRegistry::new(config.registry.capacity));
        let policy = DedupPolicy::checked(config.policy.duplicate_window, config.policy.liveness_timeout)?;
        let liveness = LivenessClassifier::new(config.policy.liveness_timeout);
        let cache = Arc::new(DisplayCache::new());

        let mut dispatcher = Dispatcher::new();
        if config.display.enabled {
            dispatcher.add(DisplaySink::new(Arc::clone(&cache)));
        }
        if config.log.enabled {
            dispatcher.add(CsvLogSink::new(config.log.dir.clone(), Arc::clone(&clock)));
        }
        if config.forward.enabled {
            dispatcher.add(ForwardSink::new(forward_out, config.forward.sink_config()));
        }
        tracing::debug!(sinks = ?dispatcher, "sinks configured");

        let log_dir = config.log.enabled.then(|| config.log.dir.clone());
        let probe = StatusProbe::new(log_dir, Arc::clone(&clock));
        let cycler = DisplayCycler::new(Arc::clone(&registry), cache, liveness);
        let pipeline = IngestPipeline::new(
            PayloadCodec::new(config.registry.manufacturer_id),
            registry,
            policy,
            dispatcher,
            clock,
        );

        Ok(Service {
            pipeline,
            cycler,
            probe,
        })
    }
}
