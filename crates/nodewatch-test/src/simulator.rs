//! Sensor fleet simulator
//!
//! Produces the broadcast stream of a fleet of sensor nodes on a shared
//! timeline and replays it into an [`IngestPipeline`] on a [`ManualClock`].

use std::time::Duration;

use rand::Rng;

use nodewatch_core::{Clock, DecodedReading, ManualClock, NodeId, SensorValue, Timestamp};
use nodewatch_runtime::{IngestOutcome, IngestPipeline};
use nodewatch_wire::{PayloadCodec, RawReading, DEFAULT_MANUFACTURER_ID, PAYLOAD_SIZE};

use crate::radio::{PacketFate, Radio, RadioConfig};

/// A simulated sensor node
#[derive(Clone, Debug)]
pub struct SimulatedSensor {
    pub id: NodeId,
    /// Time between bursts
    pub period: Duration,
    next_burst: Timestamp,
    /// Stops broadcasting at this time, if set
    pub silent_after: Option<Timestamp>,
    temperature: f32,
    humidity: f32,
    illuminance: u16,
}

impl SimulatedSensor {
    pub fn new(id: NodeId, period: Duration, first_burst: Timestamp) -> Self {
        SimulatedSensor {
            id,
            period,
            next_burst: first_burst,
            silent_after: None,
            temperature: 21.0,
            humidity: 45.0,
            illuminance: 250,
        }
    }

    fn is_broadcasting(&self, at: Timestamp) -> bool {
        self.silent_after.map_or(true, |t| at < t)
    }

    fn drift<R: Rng>(&mut self, rng: &mut R) {
        self.temperature = (self.temperature + rng.gen_range(-0.3..0.3)).clamp(-20.0, 60.0);
        self.humidity = (self.humidity + rng.gen_range(-1.0..1.0)).clamp(0.0, 100.0);
        self.illuminance = self.illuminance.saturating_add_signed(rng.gen_range(-20..=20)).min(60_000);
    }

    fn reading(&self) -> DecodedReading {
        DecodedReading {
            node_id: self.id,
            temperature: SensorValue::Value(self.temperature),
            humidity: SensorValue::Value(self.humidity),
            illuminance: SensorValue::Value(self.illuminance),
        }
    }
}

/// One packet on the air
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Broadcast {
    pub at: Timestamp,
    pub payload: Vec<u8>,
}

/// Simulation statistics
#[derive(Clone, Debug, Default)]
pub struct SimStats {
    pub bursts: u64,
    pub packets_sent: u64,
    pub packets_lost: u64,
    pub faulted: u64,
    pub foreign: u64,
    pub truncated: u64,
}

/// Broadcast stream of a sensor fleet
pub struct FleetSimulator {
    sensors: Vec<SimulatedSensor>,
    radio: Radio,
    codec: PayloadCodec,
    stats: SimStats,
}

impl FleetSimulator {
    pub fn new(radio: RadioConfig, seed: u64) -> Self {
        FleetSimulator {
            sensors: Vec::new(),
            radio: Radio::new(radio, seed),
            codec: PayloadCodec::new(DEFAULT_MANUFACTURER_ID),
            stats: SimStats::default(),
        }
    }

    /// Add a sensor broadcasting every `period`, starting at `first_burst`
    pub fn add_sensor(&mut self, id: u8, period: Duration, first_burst: Timestamp) -> &mut SimulatedSensor {
        self.sensors.push(SimulatedSensor::new(NodeId::new(id), period, first_burst));
        let last = self.sensors.len() - 1;
        &mut self.sensors[last]
    }

    pub fn sensor_mut(&mut self, id: NodeId) -> Option<&mut SimulatedSensor> {
        self.sensors.iter_mut().find(|s| s.id == id)
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Every packet received before `end`, in time order
    pub fn broadcasts_until(&mut self, end: Timestamp) -> Vec<Broadcast> {
        let mut out = Vec::new();

        for i in 0..self.sensors.len() {
            while self.sensors[i].next_burst < end {
                let at = self.sensors[i].next_burst;
                let period = self.sensors[i].period;
                self.sensors[i].next_burst = at + period;

                if !self.sensors[i].is_broadcasting(at) {
                    continue;
                }
                self.sensors[i].drift(self.radio.rng());
                let reading = self.sensors[i].reading();
                self.burst(&reading, at, &mut out);
            }
        }

        out.sort_by_key(|b| b.at);
        out
    }

    fn burst(&mut self, reading: &DecodedReading, start: Timestamp, out: &mut Vec<Broadcast>) {
        self.stats.bursts += 1;
        let repeats = self.radio.burst_len();
        let spacing = self.radio.config().burst_spacing;
        let leading_fault = self.radio.leading_fault();

        for n in 0..repeats {
            let at = start + spacing * n;
            self.stats.packets_sent += 1;

            if self.radio.foreign() {
                self.stats.foreign += 1;
                let mut foreign = self.codec.to_raw(reading);
                foreign.manufacturer_id = 0x004C;
                out.push(Broadcast { at, payload: foreign.to_bytes().to_vec() });
            }

            if self.radio.fate() == PacketFate::Lost {
                self.stats.packets_lost += 1;
                continue;
            }

            let mut packet = *reading;
            if n == 0 && leading_fault {
                self.stats.faulted += 1;
                match self.radio.fault_channel() {
                    0 => packet.temperature = SensorValue::Fault,
                    1 => packet.humidity = SensorValue::Fault,
                    _ => packet.illuminance = SensorValue::Fault,
                }
            }

            let mut payload = self.codec.encode(&packet).to_vec();
            if self.radio.truncated() {
                self.stats.truncated += 1;
                payload.truncate(PAYLOAD_SIZE - 1);
            }
            out.push(Broadcast { at, payload });
        }
    }

    /// Replay everything up to `end` into `pipeline`, moving `clock` along
    pub fn drive(&mut self, pipeline: &mut IngestPipeline, clock: &ManualClock, end: Timestamp) -> Vec<(Broadcast, IngestOutcome)> {
        let mut outcomes = Vec::new();
        for broadcast in self.broadcasts_until(end) {
            if broadcast.at > clock.now() {
                clock.set(broadcast.at);
            }
            let outcome = pipeline.ingest(&broadcast.payload);
            outcomes.push((broadcast, outcome));
        }
        if end > clock.now() {
            clock.set(end);
        }
        outcomes
    }
}

/// Raw payload for one reading, as a node would broadcast it
pub fn payload(node: u8, temperature: i16, humidity: u16, illuminance: u16) -> [u8; PAYLOAD_SIZE] {
    RawReading {
        manufacturer_id: DEFAULT_MANUFACTURER_ID,
        node_id: NodeId::new(node),
        temperature,
        humidity,
        illuminance,
    }
    .to_bytes()
}
