use std::fs::{self, File};
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use pomdp_core::filter::{
    BeliefTreeIndex, FilterConfig, FilterMetrics, FilterStats, ParallelConfig, ParticleFilter,
    Proposal,
};
use pomdp_core::model::GenerativeModel;
use pomdp_tiger::{Door, Growl, TigerAction, TigerConfig, TigerModel, TigerState};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{Level, event};

use crate::config::{HarnessConfig, ResolvedOutputs};

const DEFAULT_SEED: u64 = 4242;

/// Drives repeated belief updates against the tiger model and records how
/// the particle filter behaves.
#[derive(Debug)]
pub struct TrialRunner {
    config: HarnessConfig,
}

/// One JSONL line per trial.
#[derive(Debug, Serialize)]
struct TrialRecord {
    trial: usize,
    observation: Growl,
    requested: usize,
    returned: usize,
    degraded: bool,
    /// Fraction of posterior particles agreeing with the observed growl.
    agreement: f64,
    metrics: FilterMetrics,
}

/// Aggregate results of a harness run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub trials: usize,
    pub filled: usize,
    pub degraded: usize,
    pub mean_acceptance: f64,
    pub mean_agreement: f64,
}

impl TrialRunner {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, outputs: &ResolvedOutputs) -> Result<RunSummary> {
        let trials = &self.config.trials;
        let model = TigerModel::new(TigerConfig {
            listen_accuracy: trials.listen_accuracy,
            ..TigerConfig::default()
        });
        let filter = ParticleFilter::new(FilterConfig {
            attempts_per_particle: trials.attempts_per_particle,
        });

        // Expand the root's action children and every growl class up front,
        // the same shape a solver leaves behind after its first simulations.
        let mut index = BeliefTreeIndex::new(model.create_observation_pool());
        let root = index.root();
        for action in model.create_action_pool().candidate_actions() {
            index.expand_action(root, action);
        }
        let listen_node = index.expand_action(root, TigerAction::Listen);
        for door in Door::BOTH {
            index
                .expand_observation(listen_node, &Growl(door))
                .expect("growl classifies");
        }

        let mut rng = StdRng::seed_from_u64(trials.seed.unwrap_or(DEFAULT_SEED));
        let mut writer = create_output(outputs)?;

        let mut summary = RunSummary::default();
        let mut acceptance_sum = 0.0;
        let mut agreement_sum = 0.0;

        for trial in 0..trials.count {
            let prior: Vec<TigerState> = (0..trials.particles)
                .map(|_| model.sample_an_init_state(&mut rng))
                .collect();
            let true_state = model.sample_an_init_state(&mut rng);
            let step = model.generate_step(&true_state, &TigerAction::Listen, &mut rng);
            let observation = step.result.observation;

            let mut stats = FilterStats::default();
            let outcome = if trials.workers > 1 {
                filter.generate_particles_parallel(
                    &model,
                    &index,
                    root,
                    &TigerAction::Listen,
                    &observation,
                    trials.particles,
                    Proposal::Prior(&prior),
                    ParallelConfig {
                        workers: trials.workers,
                    },
                    &mut rng,
                    Some(&mut stats),
                    None,
                )
            } else {
                filter.generate_particles_with(
                    &model,
                    &index,
                    root,
                    &TigerAction::Listen,
                    &observation,
                    trials.particles,
                    Proposal::Prior(&prior),
                    &mut rng,
                    Some(&mut stats),
                    None,
                )
            };

            let (posterior, degraded) = match outcome {
                Ok(particles) => (particles, false),
                Err(err) => {
                    event!(
                        target: "pomdp_bench::runner",
                        Level::WARN,
                        trial,
                        error = %err,
                        "informed proposal failed; retrying uninformed"
                    );
                    match filter.generate_particles_uninformed(
                        &model,
                        &index,
                        root,
                        &TigerAction::Listen,
                        &observation,
                        trials.particles,
                        &mut rng,
                    ) {
                        Ok(particles) => (particles, true),
                        // Planning quality degrades to the smaller set.
                        Err(err) => (err.into_accepted(), true),
                    }
                }
            };

            let metrics = FilterMetrics::from_stats(&stats);
            let agreement = if posterior.is_empty() {
                0.0
            } else {
                posterior
                    .iter()
                    .filter(|state| state.tiger == observation.0)
                    .count() as f64
                    / posterior.len() as f64
            };

            let record = TrialRecord {
                trial,
                observation,
                requested: trials.particles,
                returned: posterior.len(),
                degraded,
                agreement,
                metrics,
            };
            serde_json::to_writer(&mut writer, &record).context("serializing trial record")?;
            writeln!(writer).context("writing trial record")?;

            summary.trials += 1;
            if posterior.len() == trials.particles {
                summary.filled += 1;
            }
            if degraded {
                summary.degraded += 1;
            }
            acceptance_sum += metrics.acceptance_rate;
            agreement_sum += agreement;
        }

        writer.flush().context("flushing trial records")?;

        if summary.trials > 0 {
            summary.mean_acceptance = acceptance_sum / summary.trials as f64;
            summary.mean_agreement = agreement_sum / summary.trials as f64;
        }
        write_summary(&self.config.run_id, &summary, outputs)?;
        Ok(summary)
    }
}

fn create_output(outputs: &ResolvedOutputs) -> Result<BufWriter<File>> {
    if let Some(parent) = outputs.jsonl.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory at {}", parent.display()))?;
    }
    let file = File::create(&outputs.jsonl)
        .with_context(|| format!("creating trial output at {}", outputs.jsonl.display()))?;
    Ok(BufWriter::new(file))
}

fn write_summary(run_id: &str, summary: &RunSummary, outputs: &ResolvedOutputs) -> Result<()> {
    if let Some(parent) = outputs.summary.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating summary directory at {}", parent.display()))?;
    }
    let body = format!(
        "# Particle filter run `{run_id}`\n\n\
         - trials: {}\n\
         - filled: {}\n\
         - degraded: {}\n\
         - mean acceptance rate: {:.4}\n\
         - mean agreement with observation: {:.4}\n",
        summary.trials,
        summary.filled,
        summary.degraded,
        summary.mean_acceptance,
        summary.mean_agreement,
    );
    fs::write(&outputs.summary, body)
        .with_context(|| format!("writing summary at {}", outputs.summary.display()))?;
    Ok(())
}
