//! mcsched: mixed-criticality EDF-VD scheduling simulator.
//!
//! `mcsched` (or `mcsched run`) simulates the workload described by the four
//! input files of a directory and writes the per-core logs, the global log
//! and the statistics file; `mcsched check` runs the offline schedulability
//! analysis only.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mcsched_core::platform::CoreParams;
use mcsched_core::schedulability::check_schedulability;
use mcsched_core::scheduler::{SimOutcome, Simulation};
use mcsched_ingest::load_workload;

mod report;

use report::{FileSink, write_global_report, write_statistics};

#[derive(Parser, Debug)]
#[command(name = "mcsched", version, about = "Mixed-criticality EDF-VD scheduling simulator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a workload directory up to its hyperperiod (the default)
    Run(RunArgs),

    /// Offline schedulability analysis: report (x, k) per core
    Check {
        /// Directory holding the input files
        #[arg(long, default_value = ".")]
        input_dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Directory holding the input files
    #[arg(long, default_value = ".")]
    input_dir: PathBuf,

    /// Directory the output files are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Derive (x, k) per core with the schedulability analyzer instead of
    /// taking them from the platform configuration file
    #[arg(long)]
    derive_params: bool,

    /// Also print the per-core statistics as JSON to stdout
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or_else(default_run) {
        Command::Run(args) => run(args),
        Command::Check { input_dir } => check(input_dir),
    }
}

fn default_run() -> Command {
    Command::Run(RunArgs {
        input_dir: PathBuf::from("."),
        output_dir: PathBuf::from("."),
        derive_params: false,
        json: false,
    })
}

fn run(args: RunArgs) -> Result<()> {
    let workload = load_workload(&args.input_dir)?;

    let core_params: Vec<CoreParams> = if args.derive_params {
        (0..workload.core_params.len())
            .map(|core| {
                let xf = check_schedulability(&workload.task_set, core);
                info!(core, x = xf.x, k = xf.k, "derived EDF-VD parameters");
                CoreParams { x_factor: xf.x, threshold_crit_lvl: xf.k }
            })
            .collect()
    } else {
        workload.core_params.clone()
    };

    let sink = FileSink::new(core_params.len());
    let mut sim = Simulation::new(workload.task_set, &core_params, sink)?;
    let outcome = sim.run();
    if outcome == SimOutcome::Infeasible {
        warn!("no core is schedulable; nothing was simulated");
    } else {
        info!(
            hyperperiod = sim.hyperperiod(),
            crit_level = sim.processor().crit_level,
            "simulation finished"
        );
    }

    write_global_report(
        &args.output_dir.join("output.txt"),
        sim.tasks(),
        &core_params,
        outcome,
        sim.hyperperiod(),
        sim.processor(),
    )?;
    write_statistics(&args.output_dir.join("statistics.txt"), sim.stats())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(sim.stats())?);
    }
    sim.into_sink().write_to(&args.output_dir)?;

    Ok(())
}

fn check(input_dir: PathBuf) -> Result<()> {
    let workload = load_workload(&input_dir)?;

    for core in 0..workload.core_params.len() {
        let xf = check_schedulability(&workload.task_set, core);
        if xf.is_schedulable() {
            println!("core {core}: x = {:.5}, k = {}", xf.x, xf.k);
        } else {
            println!("core {core}: not schedulable");
        }
    }
    Ok(())
}
