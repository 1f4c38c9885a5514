use std::collections::VecDeque;

use crate::domain::allocation::TimeslotAllocation;
use crate::domain::allocator_config::{AllocatorConfig, SliceStrategy, TieBreak};
use crate::domain::capacity_ledger::CapacityLedger;
use crate::domain::problem::{CapacityTable, DemandRow};
use crate::domain::reachability::ReachabilityTable;
use crate::domain::scoreboard::Scoreboard;
use crate::domain::utils::id::{ClientIndex, ServerIndex};

/// Preference tier a server was chosen from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Still below the heavy-use ceiling: concentrate load on it.
    Favored,
    /// Every viable server is past the ceiling: balance load.
    Fallback,
}

/// Greedy per-timeslot assignment of client demand onto servers.
///
/// Demands are served largest first from a FIFO queue; a client whose demand
/// is not covered by one step goes to the back of the queue with the rest.
pub struct TimeslotAllocator<'a> {
    reachability: &'a ReachabilityTable,
    capacity: &'a CapacityTable,
    config: AllocatorConfig,
    ledger: CapacityLedger,
    viable: Vec<ServerIndex>,
}

impl<'a> TimeslotAllocator<'a> {
    pub fn new(reachability: &'a ReachabilityTable, capacity: &'a CapacityTable, config: AllocatorConfig) -> Self {
        TimeslotAllocator { reachability, capacity, config, ledger: CapacityLedger::new(capacity), viable: Vec::new() }
    }

    /// Allocates one timeslot and records its heavy servers on `scoreboard`.
    ///
    /// `timeslot` is the original index of `demand` and is only carried into
    /// the result.
    pub fn allocate(&mut self, timeslot: usize, demand: &DemandRow, scoreboard: &mut Scoreboard) -> TimeslotAllocation {
        self.ledger.reset(self.capacity);
        let mut allocation = TimeslotAllocation::new(timeslot, demand.values.len(), self.capacity.len());

        let mut queue = Self::build_queue(demand);

        while let Some((client, remaining)) = queue.pop_front() {
            self.collect_viable(client);

            let Some((server, tier)) = self.select_server(scoreboard) else {
                log::debug!("Timeslot {}: {:?} has {} undeliverable.", timeslot, client, remaining);
                allocation.mark_unmet(client, remaining);
                continue;
            };

            let step = self.step_size(tier, remaining);
            let amount = self.ledger.get_adjust_requirement(server, step.min(remaining));

            let taken = self.ledger.take(server, amount);
            debug_assert!(taken, "{:?} granted {} beyond its remaining capacity", server, amount);
            allocation.grant(client, server, amount);

            let remaining = remaining - amount;
            if remaining > 0 {
                queue.push_back((client, remaining));
            }
        }

        let heavy = scoreboard.record_timeslot(self.ledger.granted_loads(), self.config.heavy_bandwidth_threshold);
        log::debug!("Timeslot {}: allocated {}, {} heavy servers.", timeslot, allocation.allocated_total(), heavy);

        allocation
    }

    /// Positive demands, largest first, ties by client index.
    fn build_queue(demand: &DemandRow) -> VecDeque<(ClientIndex, u64)> {
        let mut pending: Vec<(ClientIndex, u64)> =
            demand.values.iter().enumerate().filter(|(_, value)| **value > 0).map(|(client, value)| (ClientIndex::new(client), *value)).collect();

        pending.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        pending.into()
    }

    fn collect_viable(&mut self, client: ClientIndex) {
        let ledger = &self.ledger;
        self.viable.clear();
        self.viable.extend(self.reachability.reachable(client).iter().copied().filter(|server| ledger.has_capacity(*server)));
    }

    /// Picks the target among `self.viable`, or `None` if nothing is viable.
    fn select_server(&self, scoreboard: &Scoreboard) -> Option<(ServerIndex, Tier)> {
        let prefer_later = self.config.tie_break == TieBreak::HighestIndex;

        let mut favored: Option<(ServerIndex, u64)> = None;
        for &server in &self.viable {
            if !scoreboard.is_favored(server) {
                continue;
            }
            let granted = self.ledger.granted(server);
            let better = match favored {
                None => true,
                Some((_, best)) => granted > best || (prefer_later && granted == best),
            };
            if better {
                favored = Some((server, granted));
            }
        }

        if let Some((server, _)) = favored {
            return Some((server, Tier::Favored));
        }

        let mut fallback: Option<(ServerIndex, u64)> = None;
        for &server in &self.viable {
            let granted = self.ledger.granted(server);
            let better = match fallback {
                None => true,
                Some((_, best)) => granted < best || (prefer_later && granted == best),
            };
            if better {
                fallback = Some((server, granted));
            }
        }

        fallback.map(|(server, _)| (server, Tier::Fallback))
    }

    fn step_size(&self, tier: Tier, remaining: u64) -> u64 {
        match self.config.slice {
            SliceStrategy::Fixed(slice) => slice,
            SliceStrategy::Adaptive => match tier {
                Tier::Favored => remaining,
                Tier::Fallback => {
                    let viable = self.viable.len() as u64;
                    if remaining < viable { remaining } else { remaining / viable }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::problem::QosTable;

    fn c(index: usize) -> ClientIndex {
        ClientIndex::new(index)
    }

    fn s(index: usize) -> ServerIndex {
        ServerIndex::new(index)
    }

    /// Two servers (100, 50), two clients; client 1 can only reach server 1.
    fn two_by_two() -> (ReachabilityTable, CapacityTable) {
        let qos = QosTable::new(vec![vec![5, 20], vec![5, 5]]);
        (ReachabilityTable::build(&qos, 2, 10), CapacityTable::new(vec![100, 50]))
    }

    #[test]
    fn test_two_by_two_example() {
        let (reachability, capacity) = two_by_two();
        let mut allocator = TimeslotAllocator::new(&reachability, &capacity, AllocatorConfig::default());
        let mut scoreboard = Scoreboard::new(2, 0);

        let allocation = allocator.allocate(0, &DemandRow::new("t0", vec![80, 30]), &mut scoreboard);

        assert_eq!(allocation.granted(c(1), s(1)), 30);
        assert_eq!(allocation.granted(c(1), s(0)), 0);
        assert_eq!(allocation.client_total(c(0)), 80);
        assert!(allocation.granted(c(0), s(1)) <= 20);
        assert!(allocation.granted(c(0), s(0)) >= 60);
        assert_eq!(allocation.unmet_total(), 0);
        assert_eq!(scoreboard.counts(), &[1, 1]);
    }

    #[test]
    fn test_favored_tier_concentrates_load() {
        let qos = QosTable::new(vec![vec![1], vec![1], vec![1]]);
        let reachability = ReachabilityTable::build(&qos, 1, 10);
        let capacity = CapacityTable::new(vec![1000, 1000, 1000]);
        let mut allocator = TimeslotAllocator::new(&reachability, &capacity, AllocatorConfig::default());
        let mut scoreboard = Scoreboard::new(3, 5);

        let allocation = allocator.allocate(0, &DemandRow::new("t0", vec![450]), &mut scoreboard);

        assert_eq!(allocation.granted(c(0), s(0)), 450);
        assert_eq!(allocation.grants(c(0)).len(), 1);
        assert_eq!(scoreboard.counts(), &[1, 0, 0]);
    }

    #[test]
    fn test_fallback_tier_balances_load() {
        let qos = QosTable::new(vec![vec![1], vec![1], vec![1]]);
        let reachability = ReachabilityTable::build(&qos, 1, 10);
        let capacity = CapacityTable::new(vec![1000, 1000, 1000]);
        let mut allocator = TimeslotAllocator::new(&reachability, &capacity, AllocatorConfig::default());
        // Ceiling 0: no server is ever favored.
        let mut scoreboard = Scoreboard::new(3, 0);

        let allocation = allocator.allocate(0, &DemandRow::new("t0", vec![600]), &mut scoreboard);

        assert_eq!(allocation.server_loads(), &[200, 200, 200]);
    }

    #[test]
    fn test_exhausted_favorite_moves_to_next() {
        let qos = QosTable::new(vec![vec![1], vec![1]]);
        let reachability = ReachabilityTable::build(&qos, 1, 10);
        let capacity = CapacityTable::new(vec![150, 1000]);
        let mut allocator = TimeslotAllocator::new(&reachability, &capacity, AllocatorConfig::default());
        let mut scoreboard = Scoreboard::new(2, 3);

        let allocation = allocator.allocate(0, &DemandRow::new("t0", vec![400]), &mut scoreboard);

        assert_eq!(allocation.granted(c(0), s(0)), 150);
        assert_eq!(allocation.granted(c(0), s(1)), 250);
    }

    #[test]
    fn test_isolated_client_is_unmet() {
        let qos = QosTable::new(vec![vec![1, 99]]);
        let reachability = ReachabilityTable::build(&qos, 2, 10);
        let capacity = CapacityTable::new(vec![100]);
        let mut allocator = TimeslotAllocator::new(&reachability, &capacity, AllocatorConfig::default());
        let mut scoreboard = Scoreboard::new(1, 1);

        let allocation = allocator.allocate(0, &DemandRow::new("t0", vec![10, 70]), &mut scoreboard);

        assert_eq!(allocation.client_total(c(1)), 0);
        assert_eq!(allocation.unmet(c(1)), 70);
        assert_eq!(allocation.unmet(c(0)), 0);
        assert_eq!(allocation.client_total(c(0)), 10);
    }

    #[test]
    fn test_select_server_without_viable_servers() {
        let (reachability, capacity) = two_by_two();
        let allocator = TimeslotAllocator::new(&reachability, &capacity, AllocatorConfig::default());
        let scoreboard = Scoreboard::new(2, 1);

        assert_eq!(allocator.select_server(&scoreboard), None);
    }

    #[test]
    fn test_overload_leaves_residual_unmet() {
        let qos = QosTable::new(vec![vec![1]]);
        let reachability = ReachabilityTable::build(&qos, 1, 10);
        let capacity = CapacityTable::new(vec![120]);
        let mut allocator = TimeslotAllocator::new(&reachability, &capacity, AllocatorConfig::default());
        let mut scoreboard = Scoreboard::new(1, 1);

        let allocation = allocator.allocate(0, &DemandRow::new("t0", vec![300]), &mut scoreboard);

        assert_eq!(allocation.client_total(c(0)), 120);
        assert_eq!(allocation.unmet(c(0)), 180);
    }

    #[test]
    fn test_zero_demand_produces_no_grants_and_no_score() {
        let (reachability, capacity) = two_by_two();
        let mut allocator = TimeslotAllocator::new(&reachability, &capacity, AllocatorConfig::default());
        let mut scoreboard = Scoreboard::new(2, 1);

        let allocation = allocator.allocate(0, &DemandRow::new("t0", vec![0, 0]), &mut scoreboard);

        assert!(allocation.grants(c(0)).is_empty());
        assert_eq!(allocation.unmet_total(), 0);
        assert_eq!(scoreboard.counts(), &[0, 0]);
    }

    #[test]
    fn test_slice_interleaves_pending_clients() {
        // Both clients share one server; with slice 10 the larger client
        // cannot take the whole server before the smaller one is served.
        let qos = QosTable::new(vec![vec![1, 1]]);
        let reachability = ReachabilityTable::build(&qos, 2, 10);
        let capacity = CapacityTable::new(vec![50]);
        let config = AllocatorConfig { slice: SliceStrategy::Fixed(10), ..AllocatorConfig::default() };
        let mut allocator = TimeslotAllocator::new(&reachability, &capacity, config);
        let mut scoreboard = Scoreboard::new(1, 1);

        let allocation = allocator.allocate(0, &DemandRow::new("t0", vec![100, 20]), &mut scoreboard);

        assert_eq!(allocation.client_total(c(1)), 20);
        assert_eq!(allocation.client_total(c(0)), 30);
        assert_eq!(allocation.unmet(c(0)), 70);
    }

    #[test]
    fn test_tie_break_highest_index() {
        let qos = QosTable::new(vec![vec![1], vec![1]]);
        let reachability = ReachabilityTable::build(&qos, 1, 10);
        let capacity = CapacityTable::new(vec![1000, 1000]);
        let config = AllocatorConfig { tie_break: TieBreak::HighestIndex, ..AllocatorConfig::default() };
        let mut allocator = TimeslotAllocator::new(&reachability, &capacity, config);
        let mut scoreboard = Scoreboard::new(2, 1);

        let allocation = allocator.allocate(0, &DemandRow::new("t0", vec![50]), &mut scoreboard);

        assert_eq!(allocation.granted(c(0), s(1)), 50);
    }

    #[test]
    fn test_adaptive_slice() {
        let qos = QosTable::new(vec![vec![1], vec![1]]);
        let reachability = ReachabilityTable::build(&qos, 1, 10);
        let capacity = CapacityTable::new(vec![1000, 1000]);
        let config = AllocatorConfig { slice: SliceStrategy::Adaptive, ..AllocatorConfig::default() };
        let mut allocator = TimeslotAllocator::new(&reachability, &capacity, config);

        // Favored: the whole demand lands on one server in one step.
        let mut scoreboard = Scoreboard::new(2, 1);
        let allocation = allocator.allocate(0, &DemandRow::new("t0", vec![700]), &mut scoreboard);
        assert_eq!(allocation.server_loads(), &[700, 0]);

        // Fallback: spread evenly over the viable servers.
        let mut scoreboard = Scoreboard::new(2, 0);
        let allocation = allocator.allocate(1, &DemandRow::new("t1", vec![701]), &mut scoreboard);
        assert_eq!(allocation.client_total(c(0)), 701);
        assert_eq!(allocation.server_loads(), &[351, 350]);
    }
}
