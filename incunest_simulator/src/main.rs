//! CLI entry point for the simulation harness: scripted headless runs with CSV/JSONL output.

use clap::{Parser, Subcommand};
use incunest_shared::config::load_or_default;
use incunest_simulator::harness::{HarnessError, RunOptions, ScheduledAction, run};
use incunest_simulator::shell::{RESET_SIM, TOGGLE_DOOR, TOGGLE_FAN, TOGGLE_HEATER};
use std::path::PathBuf;

/// Simulation Harness CLI
#[derive(Parser, Debug)]
#[command(name = "incunest-sim", about = "Headless incubator simulation harness.")]
pub struct Cli {
    /// Path to a TOML config file (overrides defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for frames.csv and trace.jsonl
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Simulated seconds to run
    #[arg(long, default_value_t = 60.0)]
    duration: f64,

    /// Frames per simulated second
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Record every n-th frame
    #[arg(long, default_value_t = 60)]
    sample_every: u32,

    /// Scheduled action (e.g. --action 10:toggle-heater --action 30:setpoint=35)
    #[arg(long = "action", value_parser = parse_action)]
    actions: Vec<ScheduledAction>,

    /// Co-simulate the Wokwi heater and controller chips
    #[arg(long)]
    wokwi: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scripted simulation (default)
    Run,
    /// List the actions accepted by --action
    ListActions,
}

fn parse_action(s: &str) -> Result<ScheduledAction, String> {
    s.parse()
}

fn run_cli(cli: &Cli) -> Result<(), HarnessError> {
    let config_path = cli.config.as_ref().map(|p| p.to_string_lossy().into_owned());
    let config = load_or_default(config_path.as_deref())?;

    let options = RunOptions {
        duration_secs: cli.duration,
        fps: cli.fps,
        actions: cli.actions.clone(),
        wokwi: cli.wokwi,
        sample_every: cli.sample_every,
        output_dir: cli.output.clone(),
        simulation: config.simulation,
    };
    let summary = run(&options)?;

    println!("frames:          {}", summary.frames);
    println!("simulated:       {:.1}s", summary.simulated_secs);
    println!("temperature:     {:.2}..{:.2}°C", summary.min_temperature, summary.max_temperature);
    println!("heater duty:     {:.1}%", summary.heater_duty * 100.0);
    println!("actions applied: {}", summary.actions_applied);
    println!("final state:     {}", serde_json::to_string(&summary.final_state)?);
    if let Some(dir) = &cli.output {
        println!("output:          {}", dir.display());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = cli.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    match &cli.command {
        Some(Commands::ListActions) => {
            println!(
                "Available actions: {TOGGLE_DOOR}, {TOGGLE_HEATER}, {TOGGLE_FAN}, {RESET_SIM}, setpoint=<°C>"
            );
        }
        _ => {
            if let Err(e) = run_cli(&cli) {
                tracing::error!("Simulation failed: {e}");
                std::process::exit(1);
            }
        }
    }
}
