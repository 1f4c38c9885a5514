use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::billing::{PercentileRule, billed_samples};
use crate::domain::problem::ProblemInstance;
use crate::domain::scheduler::ScheduleOutcome;
use crate::error::Result;

/// One row of the per-timeslot report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimeslotStatistic {
    pub timeslot: usize,
    pub label: String,
    pub visit_position: usize,
    pub total_demand: u64,
    pub allocated: u64,
    pub unmet: u64,
    pub servers_used: usize,
    pub heavy_servers: usize,
}

/// Builds the report rows in original timeslot order.
pub fn timeslot_statistics(instance: &ProblemInstance, outcome: &ScheduleOutcome, heavy_threshold: u64) -> Vec<TimeslotStatistic> {
    let positions = outcome.visit_positions();

    outcome
        .allocation
        .timeslots()
        .iter()
        .map(|allocation| {
            let row = instance.demand.row(allocation.timeslot);
            TimeslotStatistic {
                timeslot: allocation.timeslot,
                label: row.label.clone(),
                visit_position: positions[allocation.timeslot],
                total_demand: row.total(),
                allocated: allocation.allocated_total(),
                unmet: allocation.unmet_total(),
                servers_used: allocation.server_loads().iter().filter(|load| **load > 0).count(),
                heavy_servers: allocation.server_loads().iter().filter(|load| **load > heavy_threshold).count(),
            }
        })
        .collect()
}

/// Writes the report as `;`-separated CSV with a header row.
pub fn write_statistics<W: Write>(writer: W, rows: &[TimeslotStatistic]) -> Result<()> {
    let mut csv_wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(writer);
    for row in rows {
        csv_wtr.serialize(row)?;
    }
    csv_wtr.flush()?;
    Ok(())
}

pub fn write_statistics_file(path: &Path, rows: &[TimeslotStatistic]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_statistics(File::create(path)?, rows)?;
    log::info!("Wrote {} timeslot statistics to '{}'.", rows.len(), path.display());
    Ok(())
}

/// Whole-run summary, serialized as JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub num_of_timeslots: usize,
    pub num_of_clients: usize,
    pub num_of_servers: usize,
    pub total_demand: u64,
    pub total_allocated: u64,
    pub total_unmet: u64,
    pub heavy_use_ceiling: u32,
    pub scoreboard: BTreeMap<String, u32>,
    pub billed_samples: BTreeMap<String, u64>,
    pub billing_estimate: u64,
}

impl RunSummary {
    pub fn new(instance: &ProblemInstance, outcome: &ScheduleOutcome, rule: &PercentileRule) -> Self {
        let samples = billed_samples(&outcome.allocation, instance.servers.len(), rule);

        let mut scoreboard = BTreeMap::new();
        let mut billed = BTreeMap::new();
        for server in instance.servers.indices() {
            let id = instance.servers.id_of(server).to_string();
            scoreboard.insert(id.clone(), outcome.scoreboard.count(server));
            billed.insert(id, samples[server.index]);
        }

        RunSummary {
            num_of_timeslots: instance.num_of_timeslots(),
            num_of_clients: instance.clients.len(),
            num_of_servers: instance.servers.len(),
            total_demand: instance.demand.total(),
            total_allocated: outcome.allocation.allocated_total(),
            total_unmet: outcome.allocation.unmet_total(),
            heavy_use_ceiling: outcome.scoreboard.ceiling(),
            scoreboard,
            billing_estimate: samples.iter().sum(),
            billed_samples: billed,
        }
    }

    pub fn write_json_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        log::info!("Wrote run summary to '{}'.", path.display());
        Ok(())
    }
}
