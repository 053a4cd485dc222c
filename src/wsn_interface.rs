use serde::{Deserialize, Serialize};

// virtual time in microseconds
pub type SimTime = u64;
pub type NodeId = u32;
pub type EpochIndex = u64;

/// Fixed 2D position in meters.
#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Location) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Outcome of one packet cycle. Immutable once logged.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PacketRecord {
    pub node: NodeId,
    /// per-node packet sequence, starting at 0
    pub seq: u64,
    pub start_time: SimTime,
    pub end_time: SimTime,
    pub latency_us: SimTime,
    pub success: bool,
    /// key epoch active when the packet was authenticated
    pub key_epoch: EpochIndex,
    pub digest: [u8; 32],
}

/// A key rotation performed by the global clock.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct KeyEpoch {
    pub index: EpochIndex,
    pub rotation_time: SimTime,
}

// ============================================================================
// Event Logging System
// ============================================================================

/// Events emitted by the simulation for debugging and analysis
#[derive(Debug, Clone)]
pub enum Event {
    /// Node woke up and started a new packet cycle
    PacketGenerated { seq: u64 },
    /// Packet reached the end of its cycle outside the jamming zone
    PacketDelivered { seq: u64, latency_us: SimTime },
    /// Packet was lost to the jammer
    PacketJammed { seq: u64, latency_us: SimTime },
    /// Global clock rotated the key epoch
    KeyRotated { epoch: EpochIndex },
}

/// Receives simulation events. `node` is `None` for global events.
pub trait EventSink {
    fn log(&mut self, time: SimTime, node: Option<NodeId>, event: Event);
}

/// No-op event sink (zero overhead)
pub struct NoOpSink;

impl EventSink for NoOpSink {
    #[inline(always)]
    fn log(&mut self, _time: SimTime, _node: Option<NodeId>, _event: Event) {}
}

/// Event sink writing through the `log` facade at debug level
pub struct LoggingEventSink {
    enabled: bool,
}

impl LoggingEventSink {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl EventSink for LoggingEventSink {
    fn log(&mut self, time: SimTime, node: Option<NodeId>, event: Event) {
        if !self.enabled {
            return;
        }

        let who = match node {
            Some(id) => format!("n:{}", id),
            None => "clock".to_string(),
        };

        match event {
            Event::PacketGenerated { seq } => {
                log::debug!("{:>12} {:>6} generated  seq:{}", time, who, seq);
            }
            Event::PacketDelivered { seq, latency_us } => {
                log::debug!(
                    "{:>12} {:>6} delivered  seq:{} latency:{}us",
                    time,
                    who,
                    seq,
                    latency_us
                );
            }
            Event::PacketJammed { seq, latency_us } => {
                log::debug!(
                    "{:>12} {:>6} jammed     seq:{} latency:{}us",
                    time,
                    who,
                    seq,
                    latency_us
                );
            }
            Event::KeyRotated { epoch } => {
                log::debug!("{:>12} {:>6} key epoch {} rotated", time, who, epoch);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_euclidean() {
        let a = Location::new(0.0, 0.0);
        let b = Location::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
        assert_eq!(a.distance(&a), 0.0);
    }

    struct Capture(std::sync::Mutex<Vec<(log::Level, String)>>);

    impl log::Log for Capture {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if let Ok(mut lines) = self.0.lock() {
                lines.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture(std::sync::Mutex::new(Vec::new()));

    #[test]
    fn test_logging_sink_emits_debug_only() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Trace);

        let mut sink = LoggingEventSink::new(true);
        sink.log(77, Some(3), Event::PacketGenerated { seq: 991 });
        sink.log(77_001, None, Event::KeyRotated { epoch: 4242 });

        let lines = CAPTURE.0.lock().unwrap();
        let ours: Vec<_> = lines
            .iter()
            .filter(|(_, msg)| msg.contains("seq:991") || msg.contains("key epoch 4242"))
            .collect();
        assert_eq!(ours.len(), 2);
        assert!(ours.iter().all(|(level, _)| *level == log::Level::Debug));
    }
}
