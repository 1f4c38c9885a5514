use crate::domain::allocation::AllocationMatrix;
use crate::domain::utils::id::ServerIndex;
use crate::error::{Error, Result};

/// How a fractional percentile rank is turned into a sample position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    #[default]
    Ceil,
    Floor,
}

/// Percentile used to evaluate a finished allocation. Only used after the
/// run; the allocator itself works with the scoreboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileRule {
    pub percentile: f64,
    pub rounding: Rounding,
}

impl Default for PercentileRule {
    fn default() -> Self {
        PercentileRule { percentile: 0.95, rounding: Rounding::Ceil }
    }
}

impl PercentileRule {
    pub fn validate(&self) -> Result<()> {
        if !(self.percentile > 0.0 && self.percentile <= 1.0) {
            return Err(Error::ConfigError(format!("Percentile must lie in (0, 1], got {}.", self.percentile)));
        }
        Ok(())
    }

    /// 1-based rank of the billed sample among `len` ascending samples.
    pub fn rank(&self, len: usize) -> usize {
        let exact = len as f64 * self.percentile;
        let rank = match self.rounding {
            Rounding::Ceil => exact.ceil() as usize,
            Rounding::Floor => exact.floor() as usize,
        };
        rank.clamp(1, len.max(1))
    }

    /// Billed sample of one load series; zero for an empty series.
    pub fn billed_sample(&self, series: &[u64]) -> u64 {
        if series.is_empty() {
            return 0;
        }
        let mut sorted = series.to_vec();
        sorted.sort_unstable();
        sorted[self.rank(sorted.len()) - 1]
    }
}

/// Billed sample of every server, indexed by `ServerIndex`.
pub fn billed_samples(allocation: &AllocationMatrix, num_of_servers: usize, rule: &PercentileRule) -> Vec<u64> {
    (0..num_of_servers).map(|server| rule.billed_sample(&allocation.server_series(ServerIndex::new(server)))).collect()
}

/// Sum of the billed samples over all servers.
pub fn billing_estimate(allocation: &AllocationMatrix, num_of_servers: usize, rule: &PercentileRule) -> u64 {
    billed_samples(allocation, num_of_servers, rule).iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_rounding() {
        let ceil = PercentileRule::default();
        let floor = PercentileRule { rounding: Rounding::Floor, ..PercentileRule::default() };

        assert_eq!(ceil.rank(100), 95);
        assert_eq!(floor.rank(100), 95);
        assert_eq!(ceil.rank(10), 10);
        assert_eq!(floor.rank(10), 9);
        assert_eq!(floor.rank(1), 1);
    }

    #[test]
    fn test_billed_sample_ignores_top_five_percent() {
        let mut series: Vec<u64> = (1..=20).collect();
        series[19] = 1_000;

        // 20 samples: rank 19 is the second largest.
        assert_eq!(PercentileRule::default().billed_sample(&series), 19);
        assert_eq!(PercentileRule::default().billed_sample(&[]), 0);
    }

    #[test]
    fn test_invalid_percentile() {
        assert!(PercentileRule { percentile: 0.0, rounding: Rounding::Ceil }.validate().is_err());
        assert!(PercentileRule::default().validate().is_ok());
    }
}
