//! Presentation shell for `tank_core`: parses raw form-style text, calls
//! the pure engine, and renders structured outcomes as text or JSON.
//!
//! The playback loop (sampling the simulation over a time grid) lives
//! here; the core only answers point-in-time queries.

use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tank_core::{
    clock_after, fixed, hhmm, plan_transfer_raw, BatchChoice, PairParams, PairSim, RawPairInput,
    SimConfig, Simulation, Snapshot, TargetChoice, TransferOutcome, TransferReport,
    TIME_STEP_HOURS,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "tank_cli", about = "Tank transfer planner and simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PairKind {
    /// Percent-gauged consumer refilled from a depth-gauged source.
    Percent,
    /// Depth-gauged consumer refilled from a depth-gauged source.
    Depth,
}

impl PairKind {
    fn params(self) -> PairParams {
        match self {
            PairKind::Percent => PairParams::percent_gauged(),
            PairKind::Depth => PairParams::depth_gauged(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Plan an instantaneous transfer for one pair.
    Plan(PlanArgs),
    /// Print a trajectory table for both pairs.
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct PlanArgs {
    #[arg(long, value_enum)]
    pair: PairKind,
    /// Source vessel level (raw text; `,` or `.` decimals).
    #[arg(long)]
    source: String,
    /// Consumer vessel level.
    #[arg(long)]
    consumer: String,
    /// Consumption rate, consumer units per hour.
    #[arg(long)]
    rate: String,
    /// Custom depletion target; the preferred preset stands when this
    /// fails to parse.
    #[arg(long)]
    target: Option<String>,
    /// Replenishment batch in source units; omit for none.
    #[arg(long)]
    batch: Option<String>,
    /// Anchor runtime expiries to the local clock.
    #[arg(long)]
    clock: bool,
    /// Emit the structured outcome as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SimulateArgs {
    /// Query-time ceiling, hours.
    #[arg(long, default_value_t = 48.0)]
    horizon: f64,
    /// Sample spacing, hours.
    #[arg(long, default_value_t = 1.0)]
    every: f64,
    #[arg(long)]
    percent_source: Option<String>,
    #[arg(long)]
    percent_consumer: Option<String>,
    #[arg(long)]
    percent_rate: Option<String>,
    #[arg(long)]
    percent_target: Option<String>,
    #[arg(long)]
    depth_source: Option<String>,
    #[arg(long)]
    depth_consumer: Option<String>,
    #[arg(long)]
    depth_rate: Option<String>,
    #[arg(long)]
    depth_target: Option<String>,
    /// Add a wall-clock column anchored at now.
    #[arg(long)]
    clock: bool,
    /// Emit the sampled snapshots as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Plan(args) => run_plan(&args),
        Commands::Simulate(args) => run_simulate(&args),
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

fn plan_input(args: &PlanArgs, params: &PairParams) -> RawPairInput {
    RawPairInput {
        source_level: args.source.clone(),
        consumer_level: args.consumer.clone(),
        consumption_rate: args.rate.clone(),
        target: target_choice(args.target.as_deref(), params),
        batch: match &args.batch {
            Some(raw) => BatchChoice::Custom {
                raw: raw.clone(),
                fallback: None,
            },
            None => BatchChoice::None,
        },
    }
}

fn target_choice(custom: Option<&str>, params: &PairParams) -> TargetChoice {
    match custom {
        Some(raw) => TargetChoice::Custom {
            raw: raw.to_string(),
            fallback: params.default_target(),
        },
        None => TargetChoice::Preset(params.default_target()),
    }
}

fn run_plan(args: &PlanArgs) -> Result<()> {
    let params = args.pair.params();
    let now = args.clock.then(|| Local::now().naive_local());
    let outcome = plan_transfer_raw(&plan_input(args, &params), &params, now)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    match &outcome {
        TransferOutcome::NotNeeded { target } => println!(
            "source already at or below {} {}; no transfer needed",
            fixed(*target, 0),
            params.source_unit
        ),
        TransferOutcome::Transferred(report) => render_report(report, &params),
    }
    Ok(())
}

fn render_report(report: &TransferReport, params: &PairParams) {
    let src = &params.source_unit;
    let con = &params.consumer_unit;
    println!("pump source down to:  {} {src}", fixed(report.target, 0));
    println!(
        "drawn from source:    {} {src}",
        fixed(report.drawn_from_source, 1)
    );
    println!(
        "consumer gains:       {} {con}",
        fixed(report.gained_in_consumer, 1)
    );
    println!(
        "final consumer level: {} {con}",
        fixed(report.final_consumer_level, 1)
    );
    println!(
        "usable volume:        {} {con}",
        fixed(report.usable_volume, 1)
    );
    print!("runtime:              {} h", fixed(report.runtime_hours, 2));
    match &report.clock {
        Some(clock) => println!(" (empty at {})", hhmm(clock.primary_empty_at)),
        None => println!(),
    }
    if let Some(batch) = &report.batch {
        print!(
            "batch:                {} {src} -> {} {con}, lasts {} h",
            fixed(batch.size_in_source_units, 0),
            fixed(batch.converted, 1),
            fixed(batch.runtime_hours, 2)
        );
        match report.clock.and_then(|clock| clock.batch_empty_at) {
            Some(at) => println!(" (empty at {})", hhmm(at)),
            None => println!(),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulate
// ---------------------------------------------------------------------------

fn seeded_pair(
    params: PairParams,
    source: Option<&String>,
    consumer: Option<&String>,
    rate: Option<&String>,
    target: Option<&String>,
) -> PairSim {
    let raw = RawPairInput {
        source_level: source.cloned().unwrap_or_default(),
        consumer_level: consumer.cloned().unwrap_or_default(),
        consumption_rate: rate.cloned().unwrap_or_default(),
        target: target_choice(target.map(String::as_str), &params),
        batch: BatchChoice::None,
    };
    PairSim::from_raw(params, &raw)
}

fn run_simulate(args: &SimulateArgs) -> Result<()> {
    anyhow::ensure!(args.every > 0.0, "--every must be > 0");
    anyhow::ensure!(args.horizon >= 0.0, "--horizon must be >= 0");

    let percent = seeded_pair(
        PairParams::percent_gauged(),
        args.percent_source.as_ref(),
        args.percent_consumer.as_ref(),
        args.percent_rate.as_ref(),
        args.percent_target.as_ref(),
    );
    let depth = seeded_pair(
        PairParams::depth_gauged(),
        args.depth_source.as_ref(),
        args.depth_consumer.as_ref(),
        args.depth_rate.as_ref(),
        args.depth_target.as_ref(),
    );
    let sim = Simulation::with_config(
        vec![percent, depth],
        SimConfig {
            horizon_hours: args.horizon,
            step_hours: TIME_STEP_HOURS,
        },
    );
    let now = args.clock.then(|| Local::now().naive_local());

    let mut samples = Vec::new();
    let mut t = 0.0;
    while t <= args.horizon + 1e-9 {
        samples.push(sim.state_at(t.min(args.horizon))?);
        t += args.every;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&samples)?);
        return Ok(());
    }
    print_table(&samples, now);
    Ok(())
}

fn print_table(samples: &[Snapshot], now: Option<NaiveDateTime>) {
    let clock_header = if now.is_some() { "  clock" } else { "" };
    println!("     t{clock_header}  | percent src/con  | depth src/con   (* = transfer)");
    for snap in samples {
        print_row(snap, now);
    }
}

fn print_row(snap: &Snapshot, now: Option<NaiveDateTime>) {
    let clock_col = now.map_or(String::new(), |anchor| {
        format!("  {}", hhmm(clock_after(anchor, snap.elapsed_hours)))
    });
    let cells: Vec<String> = snap
        .pairs
        .iter()
        .map(|pair| {
            format!(
                "{:>7} {:>7}{}",
                fixed(pair.source_level, 1),
                fixed(pair.consumer_level, 1),
                if pair.transfer_active { " *" } else { "  " }
            )
        })
        .collect();
    println!("{:>6}{clock_col}  | {}", fixed(snap.elapsed_hours, 1), cells.join(" | "));
}
