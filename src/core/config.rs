#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Neuron selection strategy used by the scheduler.
///
/// Fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FiringMode {
    /// Uniformly sample one non-sensory neuron per tick.
    Random,
    /// Layered queue propagation seeded from the sensory neurons.
    #[default]
    Wave,
}

impl core::str::FromStr for FiringMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(FiringMode::Random),
            "wave" => Ok(FiringMode::Wave),
            _ => Err("firing mode must be `random` or `wave`"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NetworkConfig {
    /// Total population, sensory and motor neurons included.
    pub size: usize,
    pub input_dim: usize,
    pub output_dim: usize,

    /// Mean in-degree as a fraction of the population.
    pub connectivity_ratio: f64,

    /// Decimal places kept by `Network::output`.
    pub precision: u32,

    pub mode: FiringMode,

    /// Attenuation of the weight update magnitude as firing accumulates.
    /// 1.0 disables decay.
    pub decay_factor: f64,

    // If set, makes behavior reproducible for evaluation.
    pub seed: Option<u64>,

    /// Log every wave's output snapshot at info level.
    pub report_output: bool,

    /// Cooperative delay between background ticks.
    pub tick_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            size: 256,
            input_dim: 8,
            output_dim: 4,
            connectivity_ratio: 0.01,
            precision: 2,
            mode: FiringMode::Wave,
            decay_factor: 1.0,
            seed: None,
            report_output: false,
            tick_interval_ms: 1,
        }
    }
}

impl NetworkConfig {
    pub const MAX_PRECISION: u32 = 15;

    /// Create a config with the given population and role counts.
    pub fn with_size(size: usize, input_dim: usize, output_dim: usize) -> Self {
        Self {
            size,
            input_dim,
            output_dim,
            ..Default::default()
        }
    }

    pub fn with_connectivity(mut self, ratio: f64) -> Self {
        self.connectivity_ratio = ratio;
        self
    }

    pub fn with_mode(mut self, mode: FiringMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_decay_factor(mut self, decay_factor: f64) -> Self {
        self.decay_factor = decay_factor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_report_output(mut self, enabled: bool) -> Self {
        self.report_output = enabled;
        self
    }

    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Target mean in-degree per neuron.
    pub fn connectivity(&self) -> usize {
        (self.size as f64 * self.connectivity_ratio).floor() as usize
    }

    /// Standard deviation of the in-degree draw, also the per-wave ban threshold.
    pub fn connectivity_sqrt(&self) -> usize {
        (self.connectivity() as f64).sqrt().floor() as usize
    }

    /// Validate the configuration, returning an error message if invalid.
    ///
    /// Role counts larger than the population are reported separately by
    /// `Network::new` as an empty-population condition.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.connectivity_ratio.is_finite()
            || self.connectivity_ratio < 0.0
            || self.connectivity_ratio > 1.0
        {
            return Err("connectivity_ratio must be in [0, 1]");
        }
        if !self.decay_factor.is_finite() || self.decay_factor <= 0.0 || self.decay_factor > 1.0 {
            return Err("decay_factor must be in (0, 1]");
        }
        if self.precision > Self::MAX_PRECISION {
            return Err("precision must be <= 15");
        }
        if self.mode == FiringMode::Random && self.output_dim == 0 {
            return Err("random firing needs at least one motor neuron");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_connectivity_truncates() {
        let cfg = NetworkConfig::with_size(50, 5, 5).with_connectivity(0.1);
        assert_eq!(cfg.connectivity(), 5);
        assert_eq!(cfg.connectivity_sqrt(), 2);

        let cfg = NetworkConfig::with_size(1000, 5, 5).with_connectivity(0.01);
        assert_eq!(cfg.connectivity(), 10);
        assert_eq!(cfg.connectivity_sqrt(), 3);
    }

    #[test]
    fn builder_sets_fields() {
        let cfg = NetworkConfig::with_size(64, 4, 2)
            .with_mode(FiringMode::Random)
            .with_precision(3)
            .with_decay_factor(0.5)
            .with_seed(9);
        assert_eq!(cfg.size, 64);
        assert_eq!(cfg.mode, FiringMode::Random);
        assert_eq!(cfg.precision, 3);
        assert_eq!(cfg.decay_factor, 0.5);
        assert_eq!(cfg.seed, Some(9));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let base = NetworkConfig::with_size(64, 4, 2);
        assert!(base.with_connectivity(1.5).validate().is_err());
        assert!(base.with_connectivity(f64::NAN).validate().is_err());
        assert!(base.with_decay_factor(0.0).validate().is_err());
        assert!(base.with_precision(40).validate().is_err());
        let no_motor = NetworkConfig::with_size(64, 4, 0).with_mode(FiringMode::Random);
        assert!(no_motor.validate().is_err());
    }

    #[test]
    fn firing_mode_parses() {
        assert_eq!("wave".parse::<FiringMode>(), Ok(FiringMode::Wave));
        assert_eq!(" Random ".parse::<FiringMode>(), Ok(FiringMode::Random));
        assert!("burst".parse::<FiringMode>().is_err());
    }
}
