// Centralized configuration for drift simulation parameters

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::species::SpeciesTable;

// ====================
// Boundaries
// ====================
/// Carriers are kept inside [BOUNDARY_MARGIN, 1 - BOUNDARY_MARGIN] of their region.
pub const BOUNDARY_MARGIN: f32 = 0.02;
/// New carriers are placed inside [SPAWN_MARGIN, 1 - SPAWN_MARGIN].
pub const SPAWN_MARGIN: f32 = 0.05;

// ====================
// Force Parameters
// ====================
/// Global-normalised distance below which a pair counts as in contact.
pub const PROXIMITY_THRESHOLD: f32 = 0.03;
/// Softening added to the squared distance before the inverse-cube terms.
pub const SOFTENING: f32 = 1.0e-3;
/// Lattice repulsion only acts within this region-normalised distance.
pub const LATTICE_CUTOFF: f32 = 0.08;
pub const LATTICE_SOFTENING: f32 = 4.0e-4;

// ====================
// Startup Ramp
// ====================
/// Forces stay off for this long after a carrier is created (ms).
pub const FORCE_DELAY_MS: f64 = 3000.0;
/// Forces then ramp linearly to full strength over this window (ms).
pub const FORCE_RAMP_MS: f64 = 1500.0;

// ====================
// Host
// ====================
/// Default frame interval for the headless host (60 Hz).
pub const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;
pub const DEFAULT_CANVAS_WIDTH: f32 = 1280.0;
pub const DEFAULT_CANVAS_HEIGHT: f32 = 720.0;
/// Rayon workers: max(MIN_THREADS, cores) - THREADS_LEAVE_FREE.
pub const MIN_THREADS: usize = 3;
pub const THREADS_LEAVE_FREE: usize = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("unknown dopant: {0}")]
    UnknownDopant(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub proximity_threshold: f32,
    pub softening: f32,
    pub lattice_cutoff: f32,
    pub lattice_softening: f32,
    pub force_delay_ms: f64,
    pub force_ramp_ms: f64,
    pub frame_interval_ms: f64,
    /// Seed for the jitter RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
    pub species: SpeciesTable,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: PROXIMITY_THRESHOLD,
            softening: SOFTENING,
            lattice_cutoff: LATTICE_CUTOFF,
            lattice_softening: LATTICE_SOFTENING,
            force_delay_ms: FORCE_DELAY_MS,
            force_ramp_ms: FORCE_RAMP_MS,
            frame_interval_ms: FRAME_INTERVAL_MS,
            seed: None,
            species: SpeciesTable::default(),
        }
    }
}

impl SimConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the integration unstable or divide by zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.softening > 0.0) || !(self.lattice_softening > 0.0) {
            return Err(ConfigError::Invalid("softening must be positive"));
        }
        if !(self.proximity_threshold >= 0.0) || !(self.lattice_cutoff >= 0.0) {
            return Err(ConfigError::Invalid("thresholds must be non-negative"));
        }
        if !(self.force_delay_ms >= 0.0) || !(self.force_ramp_ms >= 0.0) {
            return Err(ConfigError::Invalid("ramp windows must be non-negative"));
        }
        if !(self.frame_interval_ms > 0.0) {
            return Err(ConfigError::Invalid("frame interval must be positive"));
        }
        for props in [&self.species.electron, &self.species.hole] {
            if !(props.damping > 0.0 && props.damping < 1.0) {
                return Err(ConfigError::Invalid("damping must lie strictly between 0 and 1"));
            }
            if !(props.max_speed > 0.0) || !(props.max_accel > 0.0) {
                return Err(ConfigError::Invalid("speed and acceleration ceilings must be positive"));
            }
            if !(props.jitter >= 0.0) || !(props.initial_speed >= 0.0) {
                return Err(ConfigError::Invalid("jitter and initial speed must be non-negative"));
            }
            if !(props.crowding_slowdown >= 0.0) {
                return Err(ConfigError::Invalid("crowding slowdown must be non-negative"));
            }
            if !(props.bounce <= 0.0 && props.bounce >= -1.0) {
                return Err(ConfigError::Invalid("bounce must lie in [-1, 0]"));
            }
        }
        Ok(())
    }

    /// Startup ramp factor for a carrier born at `born_at`, evaluated at `now`.
    pub fn ramp(&self, born_at: f64, now: f64) -> f32 {
        let age = now - born_at;
        if age < self.force_delay_ms {
            return 0.0;
        }
        if self.force_ramp_ms <= 0.0 {
            return 1.0;
        }
        ((age - self.force_delay_ms) / self.force_ramp_ms).clamp(0.0, 1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg = SimConfig::from_toml_str("seed = 42\nforce_delay_ms = 500.0\n").unwrap();
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.force_delay_ms, 500.0);
        assert_eq!(cfg.proximity_threshold, PROXIMITY_THRESHOLD);
        assert_eq!(cfg.species, SpeciesTable::default());
    }

    #[test]
    fn rejects_damping_of_one() {
        let mut cfg = SimConfig::default();
        cfg.species.hole.damping = 1.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_softening() {
        let err = SimConfig::from_toml_str("softening = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SimConfig::from_toml_str("seed = \"abc\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn ramp_shape() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.ramp(100.0, 100.0), 0.0);
        assert_eq!(cfg.ramp(0.0, FORCE_DELAY_MS - 1.0), 0.0);
        let mid = cfg.ramp(0.0, FORCE_DELAY_MS + FORCE_RAMP_MS / 2.0);
        assert!((mid - 0.5).abs() < 1e-6);
        assert_eq!(cfg.ramp(0.0, FORCE_DELAY_MS + FORCE_RAMP_MS), 1.0);
        assert_eq!(cfg.ramp(0.0, 1.0e9), 1.0);
    }

    #[test]
    fn zero_ramp_window_is_a_step() {
        let cfg = SimConfig { force_delay_ms: 10.0, force_ramp_ms: 0.0, ..SimConfig::default() };
        assert_eq!(cfg.ramp(0.0, 9.0), 0.0);
        assert_eq!(cfg.ramp(0.0, 10.0), 1.0);
    }
}
