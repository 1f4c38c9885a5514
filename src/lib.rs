use std::path::Path;

use crate::domain::allocator_config::AllocatorConfig;
use crate::domain::problem::ProblemInstance;
use crate::domain::scheduler::{ScheduleOutcome, TimeslotScheduler};
use crate::domain::visit_order::VisitOrderKind;
use crate::error::Result;
use crate::loader::data_source::load_problem;

pub mod api;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;
pub mod sink;

/// Schedules an already loaded instance.
pub fn schedule(instance: &ProblemInstance, config: AllocatorConfig, visit_order: VisitOrderKind) -> Result<ScheduleOutcome> {
    let scheduler = TimeslotScheduler::new(instance, config)?;
    let mut order = visit_order.build();
    scheduler.run(order.as_mut())
}

/// Loads the tables in `data_dir` and schedules them.
pub fn load_and_schedule(data_dir: &Path, config: AllocatorConfig, visit_order: VisitOrderKind) -> Result<(ProblemInstance, ScheduleOutcome)> {
    let instance = load_problem(data_dir)?;
    log::info!("Input tables loaded successfully.");

    let outcome = schedule(&instance, config, visit_order)?;
    Ok((instance, outcome))
}
