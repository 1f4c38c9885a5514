use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::problem::DemandMatrix;

/// Decides in which order timeslots are handed to the allocator.
///
/// Implementations return a permutation of `0..num_of_timeslots`; the values
/// are original timeslot indices.
pub trait VisitOrder {
    fn visit_order(&mut self, demand: &DemandMatrix) -> Vec<usize>;
}

/// Original temporal order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chronological;

impl VisitOrder for Chronological {
    fn visit_order(&mut self, demand: &DemandMatrix) -> Vec<usize> {
        (0..demand.num_of_timeslots()).collect()
    }
}

/// Busiest timeslots first, ties in temporal order, so the scoreboard spends
/// its favored slots where they save the most.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescendingDemand;

impl VisitOrder for DescendingDemand {
    fn visit_order(&mut self, demand: &DemandMatrix) -> Vec<usize> {
        let totals: Vec<u64> = demand.rows().iter().map(|row| row.total()).collect();
        let mut order: Vec<usize> = (0..totals.len()).collect();
        order.sort_by(|a, b| totals[*b].cmp(&totals[*a]).then(a.cmp(b)));
        order
    }
}

/// Seeded random order. The same seed always yields the same permutation.
#[derive(Debug, Clone)]
pub struct SeededShuffle {
    rng: StdRng,
}

impl SeededShuffle {
    pub fn new(seed: u64) -> Self {
        SeededShuffle { rng: StdRng::seed_from_u64(seed) }
    }
}

impl VisitOrder for SeededShuffle {
    fn visit_order(&mut self, demand: &DemandMatrix) -> Vec<usize> {
        let mut order: Vec<usize> = (0..demand.num_of_timeslots()).collect();
        order.shuffle(&mut self.rng);
        order
    }
}

/// Configuration-level choice of a [`VisitOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitOrderKind {
    #[default]
    Chronological,
    DescendingDemand,
    Shuffled { seed: u64 },
}

impl VisitOrderKind {
    pub fn build(self) -> Box<dyn VisitOrder> {
        match self {
            VisitOrderKind::Chronological => Box::new(Chronological),
            VisitOrderKind::DescendingDemand => Box::new(DescendingDemand),
            VisitOrderKind::Shuffled { seed } => Box::new(SeededShuffle::new(seed)),
        }
    }
}
