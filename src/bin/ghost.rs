//! G.H.O.S.T. simulator CLI binary.
//!
//! Runs decoy route-tree simulations and prints what an observer would see.
//!
//! # Commands
//!
//! - `run` - Run one or more seeded simulation sessions
//! - `init-config` - Print the default configuration as TOML

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use ghost::{run_sessions, Config, RunReport, Simulation, StrategyKind, VERSION};

#[derive(Parser)]
#[command(name = "ghost")]
#[command(version = VERSION)]
#[command(about = "G.H.O.S.T. - decoy route-tree simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    Run(RunArgs),

    /// Print the default configuration as TOML
    InitConfig,
}

#[derive(Args)]
struct RunArgs {
    /// Config file (default: user config dir, if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of cycles (bursts)
    #[arg(short = 'n', long)]
    cycles: Option<u64>,

    /// Strategy (tree, batch)
    #[arg(long)]
    strategy: Option<StrategyKind>,

    /// Number of candidate recipients
    #[arg(short, long)]
    universe: Option<u32>,

    /// Real recipient id
    #[arg(short, long)]
    real: Option<u32>,

    /// Minimum hop depth
    #[arg(long)]
    min_hops: Option<u32>,

    /// Maximum hop depth
    #[arg(long)]
    max_hops: Option<u32>,

    /// Maximum branching factor
    #[arg(short, long)]
    branching: Option<u32>,

    /// Give up on a burst after this many transmissions
    #[arg(long)]
    max_burst_iterations: Option<u64>,

    /// Independent sessions to run in parallel
    #[arg(long, default_value = "1")]
    sessions: usize,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Write reports (JSON, including emitted ids) to a file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::InitConfig => cmd_init_config(),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    init_logging(args.verbose, args.log_json);

    let config = load_config(&args)?;

    let reports = if args.sessions > 1 {
        run_sessions(&config, args.sessions)?
    } else {
        vec![Simulation::new(config)?.run()?]
    };

    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(&reports)?)?;
        tracing::info!("Wrote {} report(s) to {}", reports.len(), path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for (i, report) in reports.iter().enumerate() {
            print_summary(i, report);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn cmd_init_config() -> anyhow::Result<()> {
    print!("{}", Config::default().to_toml()?);
    Ok(())
}

/// File (explicit or default location), then environment, then CLI flags
fn load_config(args: &RunArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => match Config::default_path().filter(|p| p.exists()) {
            Some(path) => {
                tracing::debug!("Using config {}", path.display());
                Config::from_file(path)?
            },
            None => Config::default(),
        },
    }
    .apply_env();

    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }
    if let Some(cycles) = args.cycles {
        config.simulation.cycles = cycles;
    }
    if let Some(strategy) = args.strategy {
        config.simulation.strategy = strategy;
    }
    if let Some(universe) = args.universe {
        config.decoy.universe_size = universe;
    }
    if let Some(real) = args.real {
        config.decoy.real_recipient = real;
    }
    if let Some(min_hops) = args.min_hops {
        config.decoy.min_hops = min_hops;
    }
    if let Some(max_hops) = args.max_hops {
        config.decoy.max_hops = max_hops;
    }
    if let Some(branching) = args.branching {
        config.decoy.max_branching = branching;
    }
    if let Some(cap) = args.max_burst_iterations {
        config.decoy.max_burst_iterations = Some(cap);
    }

    config.validate()?;
    Ok(config)
}

fn print_summary(index: usize, report: &RunReport) {
    println!("=== Session {index} (seed {}) ===", report.seed);
    println!("Strategy:             {}", report.strategy);
    println!("Cycles:               {}", report.cycles);
    println!("Transmissions:        {}", report.transmissions);
    println!(
        "Real messages sent:   {} ({} bursts required one, {} gated)",
        report.real_messages_sent, report.bursts_with_real, report.gated
    );
    println!("Recipients emitted:   {}", report.emitted_count());
    println!("Mean frequency:       {:.2}", report.mean_frequency);
    println!(
        "Real {} frequency:   {} ({:.2}x mean)",
        report.real_recipient,
        report.real_recipient_frequency,
        report.real_exposure()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(argv: &[&str]) -> RunArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Run(args) => args,
            Commands::InitConfig => panic!("expected run"),
        }
    }

    #[test]
    fn test_log_json_flag() {
        assert!(run_args(&["ghost", "run", "--log-json"]).log_json);
        assert!(!run_args(&["ghost", "run"]).log_json);
    }

    #[test]
    fn test_flags_override_config() {
        let args = run_args(&[
            "ghost", "run", "--seed", "9", "--strategy", "batch", "--universe", "50", "--real", "7",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.simulation.seed, Some(9));
        assert_eq!(config.simulation.strategy, StrategyKind::Batch);
        assert_eq!(config.decoy.universe_size, 50);
        assert_eq!(config.decoy.real_recipient, 7);
    }
}
