use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use edge_bandwidth_scheduler::api::tuning_dto::TuningDto;
use edge_bandwidth_scheduler::domain::allocator_config::SliceStrategy;
use edge_bandwidth_scheduler::domain::billing::billing_estimate;
use edge_bandwidth_scheduler::domain::utils::statistics::{RunSummary, timeslot_statistics, write_statistics_file};
use edge_bandwidth_scheduler::domain::visit_order::VisitOrderKind;
use edge_bandwidth_scheduler::loader::parser::parse_json_file;
use edge_bandwidth_scheduler::sink::solution_writer::write_solution_file;
use edge_bandwidth_scheduler::{load_and_schedule, logger};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VisitOrderArg {
    Chronological,
    DescendingDemand,
    Shuffled,
}

#[derive(Parser, Debug)]
#[command(name = "edge-scheduler", about = "Allocate edge bandwidth demand under 95th-percentile billing")]
struct Args {
    /// Directory holding demand.csv, site_bandwidth.csv, qos.csv and config.ini
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Solution file
    #[arg(short, long, default_value = "output/solution.txt")]
    output: PathBuf,

    /// JSON tuning file; command line values take precedence
    #[arg(short, long)]
    tuning: Option<PathBuf>,

    /// Fixed slice size per assignment step
    #[arg(long, conflicts_with = "adaptive_slice")]
    slice: Option<u64>,

    /// Fill favored servers in one step and spread the rest evenly
    #[arg(long)]
    adaptive_slice: bool,

    /// Order in which timeslots are allocated
    #[arg(long, value_enum)]
    visit_order: Option<VisitOrderArg>,

    /// Seed for the shuffled visit order
    #[arg(long)]
    seed: Option<u64>,

    /// Per-timeslot statistics CSV
    #[arg(long)]
    report: Option<PathBuf>,

    /// JSON run summary
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init();

    let tuning: TuningDto = match &args.tuning {
        Some(path) => parse_json_file(path).with_context(|| format!("reading tuning file '{}'", path.display()))?,
        None => TuningDto::default(),
    };

    let mut config = tuning.allocator_config();
    if let Some(slice) = args.slice {
        config.slice = SliceStrategy::Fixed(slice);
    }
    if args.adaptive_slice {
        config.slice = SliceStrategy::Adaptive;
    }

    let seed = args.seed.or(tuning.seed).unwrap_or(0);
    let visit_order = match args.visit_order {
        Some(VisitOrderArg::Chronological) => VisitOrderKind::Chronological,
        Some(VisitOrderArg::DescendingDemand) => VisitOrderKind::DescendingDemand,
        Some(VisitOrderArg::Shuffled) => VisitOrderKind::Shuffled { seed },
        None => match tuning.visit_order() {
            VisitOrderKind::Shuffled { .. } => VisitOrderKind::Shuffled { seed },
            other => other,
        },
    };

    let rule = tuning.percentile_rule();
    rule.validate()?;

    log::info!("Allocator configuration: {:?}, visit order {:?}.", config, visit_order);

    let (instance, outcome) = load_and_schedule(&args.data_dir, config, visit_order).context("scheduling failed")?;

    write_solution_file(&args.output, &instance, &outcome.allocation)?;

    if let Some(path) = &args.report {
        let rows = timeslot_statistics(&instance, &outcome, config.heavy_bandwidth_threshold);
        write_statistics_file(path, &rows)?;
    }

    if let Some(path) = &args.summary {
        RunSummary::new(&instance, &outcome, &rule).write_json_file(path)?;
    }

    log::info!(
        "Billing estimate ({:.0}th percentile, {:?}): {}. Unmet demand: {}.",
        rule.percentile * 100.0,
        rule.rounding,
        billing_estimate(&outcome.allocation, instance.servers.len(), &rule),
        outcome.allocation.unmet_total()
    );

    Ok(())
}
