// Global clock: periodic key rotation on a jittered interval

use rand::rngs::StdRng;
use rand::Rng;

use crate::wsn_config::KeyRotationConfig;
use crate::wsn_interface::{EpochIndex, Event, KeyEpoch, SimTime};
use crate::wsn_scheduler::{Process, Resume};
use crate::wsn_simulation::SimContext;

/// Rotation history. Epoch 0 is the initial key, active from time 0.
#[derive(Debug, Default, Clone)]
pub struct KeySchedule {
    rotations: Vec<KeyEpoch>,
}

impl KeySchedule {
    pub fn new() -> Self {
        Self {
            rotations: Vec::new(),
        }
    }

    pub fn current(&self) -> EpochIndex {
        self.rotations.last().map(|e| e.index).unwrap_or(0)
    }

    pub fn rotate(&mut self, now: SimTime) -> KeyEpoch {
        let epoch = KeyEpoch {
            index: self.current() + 1,
            rotation_time: now,
        };
        self.rotations.push(epoch);
        epoch
    }

    pub fn rotations(&self) -> &[KeyEpoch] {
        &self.rotations
    }
}

pub struct GlobalClock {
    interval_us: SimTime,
    jitter_us: SimTime,
    rng: StdRng,
    waiting: bool,
}

impl GlobalClock {
    pub fn new(config: &KeyRotationConfig, rng: StdRng) -> Self {
        Self {
            interval_us: config.interval_us,
            jitter_us: config.jitter_us,
            rng,
            waiting: false,
        }
    }

    /// interval + U[-jitter, jitter), never below 1us
    pub fn next_interval(&mut self) -> SimTime {
        let jitter = i128::from(self.jitter_us);
        let offset = if jitter == 0 {
            0
        } else {
            self.rng.gen_range(-jitter..jitter)
        };
        let interval = (i128::from(self.interval_us) + offset).max(1);
        SimTime::try_from(interval).unwrap_or(SimTime::MAX)
    }
}

impl Process<SimContext> for GlobalClock {
    fn resume(&mut self, now: SimTime, ctx: &mut SimContext) -> Resume {
        if self.waiting {
            let epoch = ctx.keys.rotate(now);
            ctx.event_sink
                .log(now, None, Event::KeyRotated { epoch: epoch.index });
        }
        self.waiting = true;
        Resume::After(self.next_interval())
    }
}
