use crate::error::{Error, Result};

/// Default bandwidth moved per assignment step.
pub const DEFAULT_SLICE: u64 = 100;
/// Share of timeslots a server may be pushed into its billed tier.
pub const DEFAULT_HEAVY_USE_FRACTION: f64 = 0.05;

/// How much bandwidth a single assignment step may move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceStrategy {
    /// At most `n` per step, regardless of tier.
    Fixed(u64),
    /// Fill a favored server in one step; spread the remainder evenly over the
    /// viable servers otherwise.
    Adaptive,
}

/// Which server wins among equally good candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    #[default]
    LowestIndex,
    HighestIndex,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocatorConfig {
    pub slice: SliceStrategy,
    /// Heavy-use ceiling is `floor(num_of_timeslots * heavy_use_fraction)`.
    pub heavy_use_fraction: f64,
    /// A server counts as heavily used in a timeslot when its load there is
    /// strictly above this value.
    pub heavy_bandwidth_threshold: u64,
    pub tie_break: TieBreak,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        AllocatorConfig {
            slice: SliceStrategy::Fixed(DEFAULT_SLICE),
            heavy_use_fraction: DEFAULT_HEAVY_USE_FRACTION,
            heavy_bandwidth_threshold: 0,
            tie_break: TieBreak::LowestIndex,
        }
    }
}

impl AllocatorConfig {
    pub fn validate(&self) -> Result<()> {
        if let SliceStrategy::Fixed(0) = self.slice {
            return Err(Error::ConfigError("Slice size must be greater than zero.".to_string()));
        }

        if !(0.0..=1.0).contains(&self.heavy_use_fraction) {
            return Err(Error::ConfigError(format!("Heavy-use fraction must lie in [0, 1], got {}.", self.heavy_use_fraction)));
        }

        Ok(())
    }
}
