//! Worker-thread fan-out for the rejection loop.
//!
//! Each accepted particle is an independent trial against the same
//! proposal/target pair, so workers draw and test candidates concurrently.
//! Every worker owns its own RNG; the only shared mutable state is an atomic
//! count of accepted particles (for early stop) and the cancel token.
//! Thread-local partial results are merged after join.

use super::sampler::{CancelToken, FilterError, FilterStats, ParticleFilter, Proposal};
use super::tree::{ActionNodeHandle, BeliefNodeHandle, BeliefTreeView};
use crate::model::GenerativeModel;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

/// Worker layout for [`ParticleFilter::generate_particles_parallel`].
#[derive(Debug, Clone, Copy)]
pub struct ParallelConfig {
    pub workers: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

impl ParticleFilter {
    /// Parallel counterpart of
    /// [`generate_particles_with`](ParticleFilter::generate_particles_with).
    ///
    /// The attempt budget is split across `config.workers` scoped threads,
    /// each seeded independently from `rng`, so `generate_step` never sees a
    /// shared mutable random source. Outcome contract matches the serial
    /// path: exactly `n_particles` on success, a recoverable error carrying
    /// the partial set on exhaustion or cancellation.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_particles_parallel<M, T, R>(
        &self,
        model: &M,
        tree: &T,
        prior_belief: BeliefNodeHandle,
        action: &M::Action,
        observation: &M::Observation,
        n_particles: usize,
        proposal: Proposal<'_, M::State>,
        config: ParallelConfig,
        rng: &mut R,
        mut stats: Option<&mut FilterStats>,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<M::State>, FilterError<M::State>>
    where
        M: GenerativeModel + Sync,
        M::State: Send + Sync,
        M::Action: Sync,
        M::Observation: Sync,
        T: BeliefTreeView<M::Action, M::Observation> + Sync + ?Sized,
        R: Rng,
    {
        let Some(action_node) = tree.action_child(prior_belief, action) else {
            return Ok(Vec::new());
        };
        let Some(target) = tree.observation_child(action_node, observation) else {
            return Ok(Vec::new());
        };

        if n_particles == 0 {
            return Ok(Vec::new());
        }
        if let Proposal::Prior(particles) = proposal {
            if particles.is_empty() {
                return Err(FilterError::ExhaustedProposal {
                    accepted: Vec::new(),
                    attempts: 0,
                });
            }
        }

        let workers = config.workers.max(1);
        let total_budget = self
            .config()
            .attempts_per_particle
            .saturating_mul(n_particles);
        let worker_budget = total_budget.div_ceil(workers);
        let accepted_count = AtomicUsize::new(0);
        let seeds: Vec<u64> = (0..workers).map(|_| rng.next_u64()).collect();

        let worker_results: Vec<(Vec<M::State>, FilterStats)> = thread::scope(|scope| {
            let handles: Vec<_> = seeds
                .into_iter()
                .map(|seed| {
                    let accepted_count = &accepted_count;
                    scope.spawn(move || {
                        run_worker(
                            model,
                            tree,
                            action_node,
                            target,
                            action,
                            proposal,
                            n_particles,
                            worker_budget,
                            accepted_count,
                            cancel,
                            SmallRng::seed_from_u64(seed),
                        )
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("particle worker panicked"))
                .collect()
        });

        let mut merged = Vec::with_capacity(n_particles);
        let mut attempts = 0usize;
        for (particles, worker_stats) in worker_results {
            attempts += worker_stats.attempts;
            if let Some(inner) = stats.as_deref_mut() {
                inner.attempts += worker_stats.attempts;
                inner.accepted += worker_stats.accepted;
                inner.rejected += worker_stats.rejected;
                inner.illegal += worker_stats.illegal;
            }
            merged.extend(particles);
        }
        // Workers may overshoot by a few accepts racing past the counter.
        merged.truncate(n_particles);

        if merged.len() == n_particles {
            return Ok(merged);
        }

        if let Some(token) = cancel {
            if token.is_cancelled() {
                tracing::warn!(
                    target: "pomdp_core::filter",
                    attempts,
                    accepted = merged.len(),
                    requested = n_particles,
                    workers,
                    "parallel particle generation cancelled"
                );
                return Err(FilterError::Cancelled {
                    accepted: merged,
                    attempts,
                });
            }
        }

        tracing::warn!(
            target: "pomdp_core::filter",
            attempts,
            accepted = merged.len(),
            requested = n_particles,
            workers,
            "proposal exhausted across workers before filling particle request"
        );
        Err(FilterError::ExhaustedProposal {
            accepted: merged,
            attempts,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn run_worker<M, T>(
    model: &M,
    tree: &T,
    action_node: ActionNodeHandle,
    target: BeliefNodeHandle,
    action: &M::Action,
    proposal: Proposal<'_, M::State>,
    n_particles: usize,
    worker_budget: usize,
    accepted_count: &AtomicUsize,
    cancel: Option<&CancelToken>,
    mut rng: SmallRng,
) -> (Vec<M::State>, FilterStats)
where
    M: GenerativeModel,
    T: BeliefTreeView<M::Action, M::Observation> + ?Sized,
{
    let mut local = Vec::new();
    let mut stats = FilterStats::default();

    for _ in 0..worker_budget {
        if accepted_count.load(Ordering::Relaxed) >= n_particles {
            break;
        }
        if let Some(token) = cancel {
            if token.is_cancelled() {
                break;
            }
        }
        stats.attempts += 1;

        let candidate = match proposal {
            Proposal::Prior(particles) => particles[rng.gen_range(0..particles.len())].clone(),
            Proposal::Uninformed => model.sample_state_uninformed(&mut rng),
        };

        let step = model.generate_step(&candidate, action, &mut rng);
        if !step.is_legal {
            stats.illegal += 1;
            continue;
        }

        let matches = tree.observation_child(action_node, &step.result.observation) == Some(target);
        if matches && model.is_valid(&step.result.next_state) {
            stats.accepted += 1;
            local.push(step.result.next_state);
            accepted_count.fetch_add(1, Ordering::Relaxed);
        } else {
            stats.rejected += 1;
        }
    }

    (local, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_uses_multiple_workers() {
        assert!(ParallelConfig::default().workers > 1);
    }
}
