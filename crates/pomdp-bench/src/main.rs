use std::path::PathBuf;

use clap::Parser;

use pomdp_bench::config::{HarnessConfig, ResolvedOutputs};
use pomdp_bench::logging::init_logging;
use pomdp_bench::runner::TrialRunner;

/// Particle-filter evaluation harness for the tiger problem.
#[derive(Debug, Parser)]
#[command(
    name = "pomdp-bench",
    author,
    version,
    about = "Rejection-sampling belief update harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of trials.
    #[arg(long, value_name = "COUNT")]
    trials: Option<usize>,

    /// Override the particle count per belief update.
    #[arg(long, value_name = "COUNT")]
    particles: Option<usize>,

    /// Override the RNG seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the worker-thread count (0 runs the serial path).
    #[arg(long, value_name = "COUNT")]
    workers: Option<usize>,

    /// Exit after validating the configuration (no trials are run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = HarnessConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(trials) = cli.trials {
        config.trials.count = trials;
    }

    if let Some(particles) = cli.particles {
        config.trials.particles = particles;
    }

    if let Some(seed) = cli.seed {
        config.trials.seed = Some(seed);
    }

    if let Some(workers) = cli.workers {
        config.trials.workers = workers;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    println!(
        "Loaded configuration '{}' ({} trials, {} particles)",
        config.run_id, config.trials.count, config.trials.particles
    );

    if cli.validate_only {
        println!("Configuration OK");
        return Ok(());
    }

    let _logging = init_logging(&config.logging, &outputs)?;
    let runner = TrialRunner::new(config);
    let summary = runner.run(&outputs)?;

    println!(
        "{} of {} trials filled ({} degraded); mean acceptance {:.3}, mean agreement {:.3}",
        summary.filled,
        summary.trials,
        summary.degraded,
        summary.mean_acceptance,
        summary.mean_agreement
    );
    println!("Trial records written to {}", outputs.jsonl.display());
    Ok(())
}
