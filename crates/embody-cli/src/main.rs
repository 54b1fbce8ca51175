//! embody CLI.
//!
//! - `embody run <scenario>` - run a sandbox scenario and print a summary
//! - `embody check <scenario>` - parse and validate a scenario without running it

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use embody_world::{RunSummary, ScenarioConfig, TickReport};

#[derive(Parser)]
#[command(name = "embody")]
#[command(about = "Agent/body mediation sandbox", version)]
struct Cli {
    /// Verbose output (arbitration trace at debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario
    Run {
        /// Scenario file (YAML)
        scenario: PathBuf,

        /// Override the scenario's tick count
        #[arg(long)]
        ticks: Option<u64>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,

        /// Include per-tick reports in the output
        #[arg(long)]
        reports: bool,
    },

    /// Validate a scenario file
    Check {
        /// Scenario file (YAML)
        scenario: PathBuf,
    },
}

#[derive(Serialize)]
struct RunOutput<'a> {
    scenario: String,
    seed: u64,
    ticks: u64,
    realized: usize,
    rejected: usize,
    discarded: usize,
    alive: usize,
    actions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    reports: Option<&'a [TickReport]>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    if cli.log_json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Run {
            scenario,
            ticks,
            json,
            reports,
        } => run_scenario(&scenario, ticks, json, reports),
        Commands::Check { scenario } => check_scenario(&scenario),
    }
}

fn run_scenario(path: &Path, ticks: Option<u64>, json: bool, reports: bool) -> Result<()> {
    let config = ScenarioConfig::load(path)?;
    let ticks = ticks.unwrap_or(config.ticks);
    tracing::info!(scenario = %path.display(), ticks, "Starting run");

    let mut scenario = config.build()?;
    let summary = scenario.run(ticks)?;
    let actions = scenario.simulation.world().actions().len();

    let output = RunOutput {
        scenario: path.display().to_string(),
        seed: config.seed,
        ticks: summary.ticks,
        realized: summary.realized,
        rejected: summary.rejected,
        discarded: summary.discarded,
        alive: summary.alive,
        actions,
        reports: reports.then_some(summary.reports.as_slice()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&output, &summary, reports);
    }
    Ok(())
}

fn print_summary(output: &RunOutput<'_>, summary: &RunSummary, reports: bool) {
    println!("Scenario: {}", output.scenario);
    println!("  seed:      {}", output.seed);
    println!("  ticks:     {}", output.ticks);
    println!("  realized:  {}", output.realized);
    println!("  rejected:  {}", output.rejected);
    println!("  discarded: {}", output.discarded);
    println!("  actions:   {}", output.actions);
    println!("  alive:     {}", output.alive);

    if reports {
        println!();
        for report in &summary.reports {
            println!("tick {}", report.tick);
            for body in &report.bodies {
                println!(
                    "  body {:>3} {} pos=({:.2}, {:.2}) seen={} ok={} dup={} rej={} real={} drop={}",
                    body.id.0,
                    if body.alive { "alive" } else { "dead " },
                    body.position.x,
                    body.position.y,
                    body.perceived,
                    body.accepted,
                    body.duplicates,
                    body.rejected,
                    body.realized,
                    body.discarded,
                );
            }
        }
    }
}

fn check_scenario(path: &Path) -> Result<()> {
    let config = ScenarioConfig::load(path)?;
    println!(
        "{}: ok ({} bodies, {} walls, {} objects, {} events)",
        path.display(),
        config.bodies.len(),
        config.world.walls.len(),
        config.world.objects.len(),
        config.events.len()
    );
    Ok(())
}
