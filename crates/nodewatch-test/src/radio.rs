//! Radio conditions for simulated broadcasts
//!
//! A sensor node repeats each reading several times in a short burst. The
//! radio model decides, per burst and per packet:
//! - how many repeats are sent and how far apart
//! - whether the first packet carries a faulted sensor channel
//! - packet loss
//! - unrelated broadcasts from other vendors and truncated payloads

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Radio configuration
#[derive(Clone, Debug)]
pub struct RadioConfig {
    /// Repeats per burst (inclusive range)
    pub burst_len: (u32, u32),
    /// Gap between repeats of one burst
    pub burst_spacing: Duration,
    /// Probability that the first packet of a burst has a faulted channel
    pub leading_fault_prob: f64,
    /// Per-packet loss rate (0.0 - 1.0)
    pub loss_rate: f64,
    /// Probability of a foreign-manufacturer broadcast per packet
    pub foreign_prob: f64,
    /// Probability of a truncated payload per packet
    pub truncate_prob: f64,
}

impl Default for RadioConfig {
    fn default() -> Self {
        RadioConfig {
            burst_len: (2, 4),
            burst_spacing: Duration::from_millis(20),
            leading_fault_prob: 0.2,
            loss_rate: 0.05,
            foreign_prob: 0.05,
            truncate_prob: 0.01,
        }
    }
}

impl RadioConfig {
    /// Every packet arrives, one per burst
    pub fn clean() -> Self {
        RadioConfig {
            burst_len: (1, 1),
            burst_spacing: Duration::from_millis(20),
            leading_fault_prob: 0.0,
            loss_rate: 0.0,
            foreign_prob: 0.0,
            truncate_prob: 0.0,
        }
    }

    /// Crowded 2.4 GHz band
    pub fn noisy() -> Self {
        RadioConfig {
            burst_len: (3, 6),
            burst_spacing: Duration::from_millis(15),
            leading_fault_prob: 0.5,
            loss_rate: 0.2,
            foreign_prob: 0.3,
            truncate_prob: 0.05,
        }
    }
}

/// What happens to one packet on the air
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketFate {
    Delivered,
    Lost,
}

/// Seeded source of radio decisions
pub struct Radio {
    config: RadioConfig,
    rng: StdRng,
}

impl Radio {
    pub fn new(config: RadioConfig, seed: u64) -> Self {
        Radio {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    pub fn burst_len(&mut self) -> u32 {
        let (min, max) = self.config.burst_len;
        self.rng.gen_range(min..=max.max(min))
    }

    pub fn leading_fault(&mut self) -> bool {
        self.chance(self.config.leading_fault_prob)
    }

    pub fn fate(&mut self) -> PacketFate {
        if self.chance(self.config.loss_rate) {
            PacketFate::Lost
        } else {
            PacketFate::Delivered
        }
    }

    pub fn foreign(&mut self) -> bool {
        self.chance(self.config.foreign_prob)
    }

    pub fn truncated(&mut self) -> bool {
        self.chance(self.config.truncate_prob)
    }

    /// Which of the three channels a faulted packet loses
    pub fn fault_channel(&mut self) -> usize {
        self.rng.gen_range(0..3)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    fn chance(&mut self, p: f64) -> bool {
        p > 0.0 && self.rng.gen::<f64>() < p
    }
}
