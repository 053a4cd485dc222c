//! Radio propagation delay models
//!
//! A [`DelayProvider`] maps the sender-to-reference distance of a packet to a
//! propagation delay in microseconds. Providers are pluggable; the node
//! process only ever sees the trait.

use std::f64::consts::SQRT_2;

use rand::rngs::StdRng;
use rand_distr::{Distribution, LogNormal, Weibull};

use crate::wsn_config::PropagationConfig;
use crate::wsn_error::{ConfigError, Result};
use crate::wsn_interface::SimTime;

pub trait DelayProvider {
    fn delay_us(&self, distance_m: f64, rng: &mut StdRng) -> SimTime;
}

/// Free-space delay scaled by log-normal shadowing and Rayleigh fading,
/// both sampled fresh per packet.
#[derive(Debug, Clone)]
pub struct ChannelModel {
    signal_speed_m_per_s: f64,
    shadowing: LogNormal<f64>,
    // Rayleigh(s) is Weibull(s * sqrt(2), 2)
    fading: Weibull<f64>,
}

impl ChannelModel {
    pub fn from_config(config: &PropagationConfig) -> Result<Self> {
        let shadowing = LogNormal::new(0.0, config.shadowing_shape).map_err(|e| {
            ConfigError::InvalidDistribution {
                name: "log-normal shadowing",
                reason: e.to_string(),
            }
        })?;
        let fading = Weibull::new(config.fading_scale * SQRT_2, 2.0).map_err(|e| {
            ConfigError::InvalidDistribution {
                name: "rayleigh fading",
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            signal_speed_m_per_s: config.signal_speed_m_per_s,
            shadowing,
            fading,
        })
    }

    pub fn base_delay_us(&self, distance_m: f64) -> f64 {
        distance_m / self.signal_speed_m_per_s * 1e6
    }
}

impl DelayProvider for ChannelModel {
    fn delay_us(&self, distance_m: f64, rng: &mut StdRng) -> SimTime {
        let shadowing = self.shadowing.sample(rng);
        let fading = self.fading.sample(rng);
        let delay = self.base_delay_us(distance_m) * shadowing * fading;
        // float -> int casts saturate and map NaN to 0
        delay.max(0.0) as SimTime
    }
}

/// Constant delay, used to override propagation entirely.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub SimTime);

impl DelayProvider for FixedDelay {
    fn delay_us(&self, _distance_m: f64, _rng: &mut StdRng) -> SimTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn channel() -> ChannelModel {
        ChannelModel::from_config(&PropagationConfig::default()).unwrap()
    }

    #[test]
    fn test_zero_distance_has_zero_delay() {
        let model = channel();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(model.delay_us(0.0, &mut rng), 0);
        }
    }

    #[test]
    fn test_base_delay_is_light_time() {
        let model = channel();
        // 3 km at 3e8 m/s is 10us
        assert!((model.base_delay_us(3000.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_delay_tracks_channel_multipliers() {
        let model = channel();
        let mut rng = StdRng::seed_from_u64(42);
        let samples = 20_000;
        let distance = 300_000.0; // 1000us base delay
        let total: u64 = (0..samples).map(|_| model.delay_us(distance, &mut rng)).sum();
        let mean = total as f64 / samples as f64;

        // E[lognormal(0, 0.2)] * E[rayleigh(1)] = e^0.02 * sqrt(pi/2) ~ 1.2785
        assert!(mean > 1150.0 && mean < 1400.0, "mean delay {}", mean);
    }

    #[test]
    fn test_same_seed_same_delays() {
        let model = channel();
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            assert_eq!(
                model.delay_us(150_000.0, &mut a),
                model.delay_us(150_000.0, &mut b)
            );
        }
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let config = PropagationConfig {
            shadowing_shape: -0.5,
            ..Default::default()
        };
        assert!(matches!(
            ChannelModel::from_config(&config),
            Err(ConfigError::InvalidDistribution { name: "log-normal shadowing", .. })
        ));

        let config = PropagationConfig {
            fading_scale: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            ChannelModel::from_config(&config),
            Err(ConfigError::InvalidDistribution { name: "rayleigh fading", .. })
        ));
    }

    #[test]
    fn test_fixed_delay_ignores_distance() {
        let mut rng = StdRng::seed_from_u64(0);
        let fixed = FixedDelay(37);
        assert_eq!(fixed.delay_us(0.0, &mut rng), 37);
        assert_eq!(fixed.delay_us(1e9, &mut rng), 37);
    }
}
