use crate::domain::problem::CapacityTable;
use crate::domain::utils::id::ServerIndex;

/// Remaining capacity and already-granted bandwidth per server, for the
/// timeslot currently being allocated.
///
/// Invariant: `remaining[s] + granted[s] == capacity[s]` for every server.
#[derive(Debug, Clone)]
pub struct CapacityLedger {
    remaining: Vec<u64>,
    granted: Vec<u64>,
}

impl CapacityLedger {
    pub fn new(capacity: &CapacityTable) -> Self {
        CapacityLedger { remaining: capacity.as_slice().to_vec(), granted: vec![0; capacity.len()] }
    }

    /// Restores the full static capacity and clears the granted counters.
    pub fn reset(&mut self, capacity: &CapacityTable) {
        self.remaining.clear();
        self.remaining.extend_from_slice(capacity.as_slice());
        self.granted.clear();
        self.granted.resize(capacity.len(), 0);
    }

    pub fn remaining(&self, server: ServerIndex) -> u64 {
        self.remaining[server.index]
    }

    pub fn granted(&self, server: ServerIndex) -> u64 {
        self.granted[server.index]
    }

    pub fn has_capacity(&self, server: ServerIndex) -> bool {
        self.remaining[server.index] > 0
    }

    /// Clamps a request to what `server` can still take.
    pub fn get_adjust_requirement(&self, server: ServerIndex, requirement: u64) -> u64 {
        requirement.min(self.remaining[server.index])
    }

    /// Books `amount` on `server`.
    ///
    /// # Returns
    /// `false` (and logs) if `amount` exceeds the remaining capacity; nothing is
    /// booked in that case.
    pub fn take(&mut self, server: ServerIndex, amount: u64) -> bool {
        if amount > self.remaining[server.index] {
            log::error!(
                "Grant of {} on {:?} exceeds remaining capacity {}. Signals an error in the allocator.",
                amount,
                server,
                self.remaining[server.index]
            );
            return false;
        }

        self.remaining[server.index] -= amount;
        self.granted[server.index] += amount;
        true
    }

    /// Granted bandwidth per server, indexed by `ServerIndex`.
    pub fn granted_loads(&self) -> &[u64] {
        &self.granted
    }
}
