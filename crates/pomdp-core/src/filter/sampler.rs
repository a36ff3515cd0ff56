//! Rejection-sampling reconstruction of posterior particle sets.

use super::tree::{BeliefNodeHandle, BeliefTreeView};
use crate::model::GenerativeModel;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const DEFAULT_ATTEMPTS_PER_PARTICLE: usize = 1_000;

/// Bounds the attempt budget of one particle-generation call.
#[derive(Debug, Clone, Copy)]
pub struct FilterConfig {
    /// Attempts allowed per requested particle; the total budget for a call
    /// is `attempts_per_particle * n_particles`.
    pub attempts_per_particle: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            attempts_per_particle: DEFAULT_ATTEMPTS_PER_PARTICLE,
        }
    }
}

/// Cooperative cancellation flag observable from outside a running update.
///
/// Cloning shares the flag. A cancelled call hands back whatever particles
/// it accepted through [`FilterError::Cancelled`]; nothing else escapes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Counters describing one particle-generation call.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilterStats {
    pub attempts: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub illegal: usize,
}

/// Proposal distribution candidate states are drawn from.
#[derive(Debug)]
pub enum Proposal<'a, S> {
    /// Uniform draws with replacement from a prior particle set. The slice
    /// is read-only for the duration of the call.
    Prior(&'a [S]),
    /// Draws from the model's uninformed prior.
    Uninformed,
}

impl<S> Clone for Proposal<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Proposal<'_, S> {}

/// Recoverable failures of a particle-generation call.
///
/// Both variants surface the particles accepted so far, so callers may retry
/// with the uninformed proposal or accept the smaller set; neither should
/// terminate the surrounding planning process.
#[derive(Debug)]
pub enum FilterError<S> {
    /// The attempt budget ran out before the request was filled.
    ExhaustedProposal { accepted: Vec<S>, attempts: usize },
    /// The caller's [`CancelToken`] fired.
    Cancelled { accepted: Vec<S>, attempts: usize },
}

impl<S> FilterError<S> {
    /// Consumes the error, yielding whatever particles were accepted.
    pub fn into_accepted(self) -> Vec<S> {
        match self {
            FilterError::ExhaustedProposal { accepted, .. }
            | FilterError::Cancelled { accepted, .. } => accepted,
        }
    }

    pub fn attempts(&self) -> usize {
        match self {
            FilterError::ExhaustedProposal { attempts, .. }
            | FilterError::Cancelled { attempts, .. } => *attempts,
        }
    }
}

impl<S> fmt::Display for FilterError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::ExhaustedProposal { accepted, attempts } => write!(
                f,
                "proposal exhausted after {attempts} attempts ({} particles accepted)",
                accepted.len()
            ),
            FilterError::Cancelled { accepted, attempts } => write!(
                f,
                "particle generation cancelled after {attempts} attempts ({} particles accepted)",
                accepted.len()
            ),
        }
    }
}

impl<S: fmt::Debug> std::error::Error for FilterError<S> {}

/// Rejection-sampling belief updater over a [`GenerativeModel`].
///
/// Reconstructs a fixed-size particle approximation of the posterior belief
/// after `(action, observation)`: candidates are drawn from a proposal
/// distribution, stepped through the model, and kept only when their
/// resulting observation classifies into the same belief-tree node as the
/// true observation. Stateless between invocations.
#[derive(Debug, Default, Clone)]
pub struct ParticleFilter {
    config: FilterConfig,
}

impl ParticleFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> FilterConfig {
        self.config
    }

    /// Reconstructs the posterior particle set with candidates drawn
    /// uniformly with replacement from `prior_particles`.
    ///
    /// Returns an empty set when the belief tree has no node for
    /// `(action, observation)`; probing un-expanded nodes is a legitimate
    /// query, not an error.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_particles<M, T, R>(
        &self,
        model: &M,
        tree: &T,
        prior_belief: BeliefNodeHandle,
        action: &M::Action,
        observation: &M::Observation,
        n_particles: usize,
        prior_particles: &[M::State],
        rng: &mut R,
    ) -> Result<Vec<M::State>, FilterError<M::State>>
    where
        M: GenerativeModel,
        T: BeliefTreeView<M::Action, M::Observation> + ?Sized,
        R: Rng,
    {
        self.generate_particles_with(
            model,
            tree,
            prior_belief,
            action,
            observation,
            n_particles,
            Proposal::Prior(prior_particles),
            rng,
            None,
            None,
        )
    }

    /// As [`generate_particles`](Self::generate_particles), with candidates
    /// drawn from the model's uninformed prior instead of a parent particle
    /// set.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_particles_uninformed<M, T, R>(
        &self,
        model: &M,
        tree: &T,
        prior_belief: BeliefNodeHandle,
        action: &M::Action,
        observation: &M::Observation,
        n_particles: usize,
        rng: &mut R,
    ) -> Result<Vec<M::State>, FilterError<M::State>>
    where
        M: GenerativeModel,
        T: BeliefTreeView<M::Action, M::Observation> + ?Sized,
        R: Rng,
    {
        self.generate_particles_with(
            model,
            tree,
            prior_belief,
            action,
            observation,
            n_particles,
            Proposal::Uninformed,
            rng,
            None,
            None,
        )
    }

    /// Full-parameter entry point: explicit proposal, optional statistics
    /// accumulation, optional cancellation.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_particles_with<M, T, R>(
        &self,
        model: &M,
        tree: &T,
        prior_belief: BeliefNodeHandle,
        action: &M::Action,
        observation: &M::Observation,
        n_particles: usize,
        proposal: Proposal<'_, M::State>,
        rng: &mut R,
        mut stats: Option<&mut FilterStats>,
        cancel: Option<&CancelToken>,
    ) -> Result<Vec<M::State>, FilterError<M::State>>
    where
        M: GenerativeModel,
        T: BeliefTreeView<M::Action, M::Observation> + ?Sized,
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

        let budget = self.config.attempts_per_particle.saturating_mul(n_particles);
        let mut accepted = Vec::with_capacity(n_particles);
        let mut attempts = 0usize;

        while accepted.len() < n_particles {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    tracing::warn!(
                        target: "pomdp_core::filter",
                        attempts,
                        accepted = accepted.len(),
                        requested = n_particles,
                        "particle generation cancelled"
                    );
                    return Err(FilterError::Cancelled { accepted, attempts });
                }
            }
            if attempts >= budget {
                tracing::warn!(
                    target: "pomdp_core::filter",
                    attempts,
                    accepted = accepted.len(),
                    requested = n_particles,
                    "proposal exhausted before filling particle request"
                );
                return Err(FilterError::ExhaustedProposal { accepted, attempts });
            }
            attempts += 1;
            if let Some(inner) = stats.as_deref_mut() {
                inner.attempts += 1;
            }

            let candidate = match proposal {
                Proposal::Prior(particles) => particles[rng.gen_range(0..particles.len())].clone(),
                Proposal::Uninformed => model.sample_state_uninformed(&mut *rng),
            };

            let step = model.generate_step(&candidate, action, &mut *rng);
            if !step.is_legal {
                if let Some(inner) = stats.as_deref_mut() {
                    inner.illegal += 1;
                }
                continue;
            }

            // Acceptance compares resolved belief-node handles, never raw
            // observations; the same lookup classifies the candidate's
            // observation and the true one.
            let matches =
                tree.observation_child(action_node, &step.result.observation) == Some(target);
            if matches && model.is_valid(&step.result.next_state) {
                if let Some(inner) = stats.as_deref_mut() {
                    inner.accepted += 1;
                }
                accepted.push(step.result.next_state);
            } else if let Some(inner) = stats.as_deref_mut() {
                inner.rejected += 1;
            }
        }

        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_bounds_attempts() {
        let config = FilterConfig::default();
        assert_eq!(config.attempts_per_particle, 1_000);
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let shared = token.clone();
        assert!(!shared.is_cancelled());
        token.cancel();
        assert!(shared.is_cancelled());
    }

    #[test]
    fn errors_surface_partial_results() {
        let err = FilterError::ExhaustedProposal {
            accepted: vec![1u8, 2],
            attempts: 40,
        };
        assert_eq!(err.attempts(), 40);
        assert_eq!(
            err.to_string(),
            "proposal exhausted after 40 attempts (2 particles accepted)"
        );
        assert_eq!(err.into_accepted(), vec![1, 2]);

        let cancelled: FilterError<u8> = FilterError::Cancelled {
            accepted: Vec::new(),
            attempts: 3,
        };
        assert_eq!(
            cancelled.to_string(),
            "particle generation cancelled after 3 attempts (0 particles accepted)"
        );
    }
}
