// Simulation Configuration

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::wsn_error::{ConfigError, Result};
use crate::wsn_graph_latency::GraphLatencyConfig;
use crate::wsn_interface::{Location, SimTime};
use crate::wsn_propagation::ChannelModel;

pub const SECOND_US: SimTime = 1_000_000;
pub const MINUTE_US: SimTime = 60 * SECOND_US;

/// Main simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub num_nodes: usize,
    /// side of the square deployment area, meters
    pub area_size: f64,
    pub sim_duration_us: SimTime,
    /// inclusive range of the sleep between two packet cycles
    pub packet_gap_us: (SimTime, SimTime),
    pub key_rotation: KeyRotationConfig,
    pub crypto: CryptoDelayConfig,
    pub jammer: JammerConfig,
    pub propagation: PropagationConfig,
    /// Random seed (None = generate random)
    #[serde(skip)]
    pub rng_seed: Option<[u8; 32]>,
    pub enable_event_logging: bool,
    pub csv_output_path: Option<String>,
}

/// Global clock key rotation timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyRotationConfig {
    pub interval_us: SimTime,
    pub jitter_us: SimTime,
}

/// Fixed crypto stage costs, normally taken from the crypto timing harness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoDelayConfig {
    pub aes_delay_us: SimTime,
    pub hmac_delay_us: SimTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JammerConfig {
    pub center: Location,
    pub radius: f64,
    /// informational only
    pub spectral_density_dbm: f64,
    pub jam_against: JamTarget,
}

/// Which location the jammer predicate is evaluated against for each packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JamTarget {
    /// the sending node's own fixed location
    FixedLocation,
    /// the reference point re-sampled for the packet's propagation
    FreshRandomLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// log-normal sigma of the shadowing multiplier
    pub shadowing_shape: f64,
    /// Rayleigh scale of the fading multiplier
    pub fading_scale: f64,
    pub signal_speed_m_per_s: f64,
    pub model: PropagationModel,
}

/// Propagation delay provider selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropagationModel {
    /// distance / c scaled by log-normal shadowing and Rayleigh fading
    Channel,
    /// constant delay regardless of distance
    Fixed { delay_us: SimTime },
    /// latency table drawn from the multi-hop graph sampler
    GraphSampled { sampler: GraphLatencyConfig },
}

// ============================================================================
// Default Configurations
// ============================================================================

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_nodes: 10,
            area_size: 2000.0,
            sim_duration_us: 3600 * SECOND_US,
            packet_gap_us: (500_000, 1_000_000),
            key_rotation: KeyRotationConfig::default(),
            crypto: CryptoDelayConfig::default(),
            jammer: JammerConfig::default(),
            propagation: PropagationConfig::default(),
            rng_seed: None,
            enable_event_logging: false,
            csv_output_path: None,
        }
    }
}

impl Default for KeyRotationConfig {
    fn default() -> Self {
        Self {
            interval_us: 15 * MINUTE_US,
            jitter_us: MINUTE_US,
        }
    }
}

impl Default for CryptoDelayConfig {
    fn default() -> Self {
        Self {
            aes_delay_us: 150,
            hmac_delay_us: 200,
        }
    }
}

impl Default for JammerConfig {
    fn default() -> Self {
        Self {
            center: Location::new(1000.0, 1000.0),
            radius: 500.0,
            spectral_density_dbm: -90.0,
            jam_against: JamTarget::FixedLocation,
        }
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            shadowing_shape: 0.2,
            fading_scale: 1.0,
            signal_speed_m_per_s: 300_000_000.0,
            model: PropagationModel::Channel,
        }
    }
}

impl SimConfig {
    /// Get or generate seed
    pub fn resolve_seed(&self) -> [u8; 32] {
        self.rng_seed.unwrap_or_else(|| {
            let mut temp_rng = StdRng::from_entropy();
            let mut seed = [0u8; 32];
            temp_rng.fill_bytes(&mut seed);
            seed
        })
    }

    /// Reject configurations that cannot produce a well-formed run.
    pub fn validate(&self) -> Result<()> {
        if !(self.area_size.is_finite() && self.area_size > 0.0) {
            return Err(ConfigError::InvalidArea(self.area_size));
        }

        let (min_gap, max_gap) = self.packet_gap_us;
        if min_gap > max_gap {
            return Err(ConfigError::InvalidPacketGap {
                min: min_gap,
                max: max_gap,
            });
        }
        let cycle = min_gap
            .checked_add(self.crypto.aes_delay_us)
            .and_then(|t| t.checked_add(self.crypto.hmac_delay_us))
            .ok_or(ConfigError::CycleOverflow {
                gap: min_gap,
                aes: self.crypto.aes_delay_us,
                hmac: self.crypto.hmac_delay_us,
            })?;
        if cycle == 0 {
            return Err(ConfigError::ZeroLengthCycle);
        }

        let rotation = &self.key_rotation;
        if rotation.interval_us <= rotation.jitter_us {
            return Err(ConfigError::KeyRotationJitterTooLarge {
                interval: rotation.interval_us,
                jitter: rotation.jitter_us,
            });
        }

        // NaN fails this too
        if !(self.jammer.radius >= 0.0) {
            return Err(ConfigError::NegativeJammerRadius(self.jammer.radius));
        }

        let speed = self.propagation.signal_speed_m_per_s;
        if !(speed.is_finite() && speed > 0.0) {
            return Err(ConfigError::InvalidSignalSpeed(speed));
        }
        ChannelModel::from_config(&self.propagation)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_jitter_must_be_below_interval() {
        let mut config = SimConfig::default();
        config.key_rotation = KeyRotationConfig {
            interval_us: 1000,
            jitter_us: 1000,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::KeyRotationJitterTooLarge {
                interval: 1000,
                jitter: 1000
            })
        ));

        config.key_rotation.interval_us = 0;
        config.key_rotation.jitter_us = 0;
        assert!(config.validate().is_err());

        config.key_rotation.interval_us = 1001;
        config.key_rotation.jitter_us = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_or_nan_radius_rejected() {
        let mut config = SimConfig::default();
        config.jammer.radius = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeJammerRadius(_))
        ));

        config.jammer.radius = f64::NAN;
        assert!(config.validate().is_err());

        config.jammer.radius = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_nodes_is_valid() {
        let config = SimConfig {
            num_nodes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gap_and_cycle_checks() {
        let mut config = SimConfig {
            packet_gap_us: (10, 5),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPacketGap { min: 10, max: 5 })
        ));

        config.packet_gap_us = (0, 0);
        config.crypto = CryptoDelayConfig {
            aes_delay_us: 0,
            hmac_delay_us: 0,
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroLengthCycle)));
    }

    #[test]
    fn test_cycle_overflow_rejected() {
        let mut config = SimConfig::default();
        config.crypto.aes_delay_us = SimTime::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CycleOverflow { aes: SimTime::MAX, .. })
        ));

        config.crypto.aes_delay_us = SimTime::MAX / 2;
        config.crypto.hmac_delay_us = SimTime::MAX / 2;
        config.packet_gap_us = (SimTime::MAX / 2, SimTime::MAX / 2);
        assert!(matches!(config.validate(), Err(ConfigError::CycleOverflow { .. })));
    }

    #[test]
    fn test_invalid_area_and_distribution() {
        let mut config = SimConfig {
            area_size: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidArea(_))));

        config.area_size = 100.0;
        config.propagation.fading_scale = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDistribution { .. })
        ));
    }

    #[test]
    fn test_resolve_seed_prefers_explicit_seed() {
        let config = SimConfig {
            rng_seed: Some([7u8; 32]),
            ..Default::default()
        };
        assert_eq!(config.resolve_seed(), [7u8; 32]);
    }

    #[test]
    fn test_partial_yaml_overrides_defaults() {
        let yaml = r#"
num_nodes: 3
jammer:
  radius: 0.0
  jam_against: fresh_random_location
propagation:
  model:
    kind: fixed
    delay_us: 25
"#;
        let config: SimConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.num_nodes, 3);
        assert_eq!(config.area_size, 2000.0);
        assert_eq!(config.jammer.radius, 0.0);
        assert_eq!(config.jammer.center, Location::new(1000.0, 1000.0));
        assert_eq!(config.jammer.jam_against, JamTarget::FreshRandomLocation);
        assert!(matches!(
            config.propagation.model,
            PropagationModel::Fixed { delay_us: 25 }
        ));
        assert_eq!(config.crypto.aes_delay_us, 150);
    }
}
