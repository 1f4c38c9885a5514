use crate::domain::utils::id::ServerIndex;

/// Number of timeslots in which each server was driven above the heavy-use
/// bandwidth threshold. Lives for the whole run and only ever grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    counts: Vec<u32>,
    /// Servers whose count is below this ceiling are still favored.
    ceiling: u32,
}

impl Scoreboard {
    pub fn new(num_of_servers: usize, ceiling: u32) -> Self {
        Scoreboard { counts: vec![0; num_of_servers], ceiling }
    }

    /// Ceiling derived from the run length: `floor(num_of_timeslots * fraction)`.
    pub fn for_run(num_of_servers: usize, num_of_timeslots: usize, heavy_use_fraction: f64) -> Self {
        Self::new(num_of_servers, heavy_use_ceiling(num_of_timeslots, heavy_use_fraction))
    }

    pub fn count(&self, server: ServerIndex) -> u32 {
        self.counts[server.index]
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn is_favored(&self, server: ServerIndex) -> bool {
        self.counts[server.index] < self.ceiling
    }

    /// Records one heavy timeslot for every server whose load exceeds
    /// `heavy_threshold`. `loads` is indexed by `ServerIndex`.
    pub fn record_timeslot(&mut self, loads: &[u64], heavy_threshold: u64) -> usize {
        let mut heavy = 0;
        for (count, load) in self.counts.iter_mut().zip(loads) {
            if *load > heavy_threshold {
                *count += 1;
                heavy += 1;
            }
        }
        heavy
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }
}

pub fn heavy_use_ceiling(num_of_timeslots: usize, heavy_use_fraction: f64) -> u32 {
    (num_of_timeslots as f64 * heavy_use_fraction).floor() as u32
}
