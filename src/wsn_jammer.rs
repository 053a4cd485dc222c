use crate::wsn_config::JammerConfig;
use crate::wsn_interface::Location;

/// Circular denial zone. Stateless after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Jammer {
    center: Location,
    radius: f64,
    spectral_density_dbm: f64,
}

impl Jammer {
    pub fn new(center: Location, radius: f64, spectral_density_dbm: f64) -> Self {
        Self {
            center,
            radius,
            spectral_density_dbm,
        }
    }

    pub fn from_config(config: &JammerConfig) -> Self {
        Self::new(config.center, config.radius, config.spectral_density_dbm)
    }

    /// A location is jammed iff it lies strictly inside the zone.
    pub fn jammed(&self, location: &Location) -> bool {
        location.distance(&self.center) < self.radius
    }

    pub fn center(&self) -> Location {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn spectral_density_dbm(&self) -> f64 {
        self.spectral_density_dbm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inside_and_outside_zone() {
        let jammer = Jammer::new(Location::new(1000.0, 1000.0), 500.0, -90.0);
        assert!(jammer.jammed(&Location::new(1000.0, 1000.0)));
        assert!(jammer.jammed(&Location::new(1200.0, 1300.0)));
        assert!(!jammer.jammed(&Location::new(0.0, 0.0)));
    }

    #[test]
    fn test_boundary_is_not_jammed() {
        let jammer = Jammer::new(Location::new(0.0, 0.0), 5.0, -90.0);
        assert!(!jammer.jammed(&Location::new(3.0, 4.0)));
        assert!(jammer.jammed(&Location::new(2.9, 4.0)));
    }

    #[test]
    fn test_zero_radius_never_jams() {
        let jammer = Jammer::new(Location::new(10.0, 10.0), 0.0, -90.0);
        assert!(!jammer.jammed(&Location::new(10.0, 10.0)));
    }
}
