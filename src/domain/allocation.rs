use std::collections::BTreeMap;

use crate::domain::utils::id::{ClientIndex, ServerIndex};

/// Allocation of a single timeslot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeslotAllocation {
    /// Original (temporal) index of the timeslot.
    pub timeslot: usize,
    /// `grants[client]`: bandwidth per server, only entries > 0.
    grants: Vec<BTreeMap<ServerIndex, u64>>,
    /// `unmet[client]`: demand that could not be placed on any server.
    unmet: Vec<u64>,
    /// `server_loads[server]`: total bandwidth granted on the server.
    server_loads: Vec<u64>,
}

impl TimeslotAllocation {
    pub fn new(timeslot: usize, num_of_clients: usize, num_of_servers: usize) -> Self {
        TimeslotAllocation {
            timeslot,
            grants: vec![BTreeMap::new(); num_of_clients],
            unmet: vec![0; num_of_clients],
            server_loads: vec![0; num_of_servers],
        }
    }

    pub fn grant(&mut self, client: ClientIndex, server: ServerIndex, bandwidth: u64) {
        if bandwidth == 0 {
            return;
        }
        *self.grants[client.index].entry(server).or_insert(0) += bandwidth;
        self.server_loads[server.index] += bandwidth;
    }

    pub fn mark_unmet(&mut self, client: ClientIndex, bandwidth: u64) {
        self.unmet[client.index] += bandwidth;
    }

    pub fn grants(&self, client: ClientIndex) -> &BTreeMap<ServerIndex, u64> {
        &self.grants[client.index]
    }

    pub fn granted(&self, client: ClientIndex, server: ServerIndex) -> u64 {
        self.grants[client.index].get(&server).copied().unwrap_or(0)
    }

    pub fn client_total(&self, client: ClientIndex) -> u64 {
        self.grants[client.index].values().sum()
    }

    pub fn unmet(&self, client: ClientIndex) -> u64 {
        self.unmet[client.index]
    }

    pub fn unmet_total(&self) -> u64 {
        self.unmet.iter().sum()
    }

    pub fn allocated_total(&self) -> u64 {
        self.server_loads.iter().sum()
    }

    pub fn server_load(&self, server: ServerIndex) -> u64 {
        self.server_loads[server.index]
    }

    pub fn server_loads(&self) -> &[u64] {
        &self.server_loads
    }

    /// Clients with positive unmet demand, with the unmet amount.
    pub fn unmet_clients(&self) -> impl Iterator<Item = (ClientIndex, u64)> + '_ {
        self.unmet.iter().enumerate().filter(|(_, unmet)| **unmet > 0).map(|(client, unmet)| (ClientIndex::new(client), *unmet))
    }
}

/// Allocation of a whole run, one entry per timeslot in original order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AllocationMatrix {
    timeslots: Vec<TimeslotAllocation>,
}

impl AllocationMatrix {
    pub fn new(timeslots: Vec<TimeslotAllocation>) -> Self {
        AllocationMatrix { timeslots }
    }

    pub fn timeslot(&self, timeslot: usize) -> &TimeslotAllocation {
        &self.timeslots[timeslot]
    }

    pub fn timeslots(&self) -> &[TimeslotAllocation] {
        &self.timeslots
    }

    pub fn len(&self) -> usize {
        self.timeslots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeslots.is_empty()
    }

    pub fn unmet_total(&self) -> u64 {
        self.timeslots.iter().map(TimeslotAllocation::unmet_total).sum()
    }

    pub fn allocated_total(&self) -> u64 {
        self.timeslots.iter().map(TimeslotAllocation::allocated_total).sum()
    }

    /// Load series of `server` across all timeslots, in original order.
    pub fn server_series(&self, server: ServerIndex) -> Vec<u64> {
        self.timeslots.iter().map(|timeslot| timeslot.server_load(server)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grants_accumulate_per_server() {
        let mut allocation = TimeslotAllocation::new(0, 2, 2);
        let (c0, s0, s1) = (ClientIndex::new(0), ServerIndex::new(0), ServerIndex::new(1));

        allocation.grant(c0, s1, 10);
        allocation.grant(c0, s1, 5);
        allocation.grant(c0, s0, 0);
        allocation.grant(c0, s0, 7);

        assert_eq!(allocation.granted(c0, s1), 15);
        assert_eq!(allocation.grants(c0).len(), 2);
        assert_eq!(allocation.client_total(c0), 22);
        assert_eq!(allocation.server_loads(), &[7, 15]);
    }

    #[test]
    fn test_unmet_is_distinct_from_no_demand() {
        let mut allocation = TimeslotAllocation::new(3, 2, 1);
        allocation.mark_unmet(ClientIndex::new(1), 40);

        assert_eq!(allocation.unmet(ClientIndex::new(0)), 0);
        assert_eq!(allocation.unmet(ClientIndex::new(1)), 40);
        assert_eq!(allocation.unmet_clients().collect::<Vec<_>>(), vec![(ClientIndex::new(1), 40)]);
        assert_eq!(allocation.unmet_total(), 40);
    }
}
