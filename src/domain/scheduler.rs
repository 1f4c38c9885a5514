use crate::domain::allocation::{AllocationMatrix, TimeslotAllocation};
use crate::domain::allocator::TimeslotAllocator;
use crate::domain::allocator_config::AllocatorConfig;
use crate::domain::problem::ProblemInstance;
use crate::domain::reachability::ReachabilityTable;
use crate::domain::scoreboard::Scoreboard;
use crate::domain::visit_order::VisitOrder;
use crate::error::{Error, Result};

/// Result of a full scheduling run.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    /// One allocation per timeslot, in original temporal order.
    pub allocation: AllocationMatrix,
    /// Scoreboard after the last timeslot.
    pub scoreboard: Scoreboard,
    /// `visit_order[position]` is the original index visited at `position`.
    pub visit_order: Vec<usize>,
}

impl ScheduleOutcome {
    /// Position at which each original timeslot was visited.
    pub fn visit_positions(&self) -> Vec<usize> {
        let mut positions = vec![0; self.visit_order.len()];
        for (position, timeslot) in self.visit_order.iter().enumerate() {
            positions[*timeslot] = position;
        }
        positions
    }
}

/// Drives the allocator over all timeslots of one problem instance.
///
/// Timeslots are processed strictly one after another: every timeslot sees
/// the scoreboard increments of all timeslots visited before it.
pub struct TimeslotScheduler<'a> {
    instance: &'a ProblemInstance,
    reachability: ReachabilityTable,
    config: AllocatorConfig,
}

impl<'a> TimeslotScheduler<'a> {
    pub fn new(instance: &'a ProblemInstance, config: AllocatorConfig) -> Result<Self> {
        config.validate()?;

        let reachability = ReachabilityTable::build(&instance.qos, instance.clients.len(), instance.qos_constraint);
        for client in reachability.isolated_clients() {
            log::warn!(
                "Client '{}' reaches no server below QoS constraint {}. Its demand will be reported as unmet.",
                instance.clients.id_of(client),
                instance.qos_constraint
            );
        }

        Ok(TimeslotScheduler { instance, reachability, config })
    }

    pub fn run(&self, order: &mut dyn VisitOrder) -> Result<ScheduleOutcome> {
        let num_of_timeslots = self.instance.num_of_timeslots();
        let visit_order = order.visit_order(&self.instance.demand);
        check_permutation(&visit_order, num_of_timeslots)?;

        let mut scoreboard = Scoreboard::for_run(self.instance.servers.len(), num_of_timeslots, self.config.heavy_use_fraction);
        log::info!(
            "Scheduling {} timeslots over {} servers (heavy-use ceiling {}).",
            num_of_timeslots,
            self.instance.servers.len(),
            scoreboard.ceiling()
        );

        let mut allocator = TimeslotAllocator::new(&self.reachability, &self.instance.capacity, self.config);
        let mut slots: Vec<Option<TimeslotAllocation>> = vec![None; num_of_timeslots];

        for &timeslot in &visit_order {
            let row = self.instance.demand.row(timeslot);
            let allocation = allocator.allocate(timeslot, row, &mut scoreboard);

            for (client, unmet) in allocation.unmet_clients() {
                log::warn!(
                    "Timeslot {} ('{}'): {} of {} demanded by client '{}' could not be delivered.",
                    timeslot,
                    row.label,
                    unmet,
                    row.get(client),
                    self.instance.clients.id_of(client)
                );
            }

            slots[timeslot] = Some(allocation);
        }

        let allocation = AllocationMatrix::new(slots.into_iter().flatten().collect());
        log::info!("Scheduling finished: allocated {}, unmet {}.", allocation.allocated_total(), allocation.unmet_total());

        Ok(ScheduleOutcome { allocation, scoreboard, visit_order })
    }
}

fn check_permutation(order: &[usize], num_of_timeslots: usize) -> Result<()> {
    let mut seen = vec![false; num_of_timeslots];

    for &timeslot in order {
        match seen.get_mut(timeslot) {
            Some(flag) if !*flag => *flag = true,
            _ => {
                return Err(Error::ConfigError(format!(
                    "Visit order is not a permutation of {} timeslots (offending index {}).",
                    num_of_timeslots, timeslot
                )));
            }
        }
    }

    if order.len() != num_of_timeslots {
        return Err(Error::ConfigError(format!("Visit order covers {} of {} timeslots.", order.len(), num_of_timeslots)));
    }

    Ok(())
}
