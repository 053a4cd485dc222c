use thiserror::Error;

use crate::wsn_interface::SimTime;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("key rotation interval {interval}us must exceed jitter {jitter}us")]
    KeyRotationJitterTooLarge { interval: SimTime, jitter: SimTime },

    #[error("jammer radius must be a non-negative number, got {0}")]
    NegativeJammerRadius(f64),

    #[error("area size must be a positive number, got {0}")]
    InvalidArea(f64),

    #[error("invalid packet gap range: min {min}us > max {max}us")]
    InvalidPacketGap { min: SimTime, max: SimTime },

    #[error("a packet cycle with zero gap and zero crypto delay never advances time")]
    ZeroLengthCycle,

    #[error("packet cycle overflows the clock: gap {gap}us + aes {aes}us + hmac {hmac}us")]
    CycleOverflow { gap: SimTime, aes: SimTime, hmac: SimTime },

    #[error("signal speed must be a positive number, got {0}")]
    InvalidSignalSpeed(f64),

    #[error("invalid {name} distribution: {reason}")]
    InvalidDistribution { name: &'static str, reason: String },

    #[error("graph latency sampler produced no connected samples")]
    EmptyLatencyTable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scenario error: {0}")]
    Scenario(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
