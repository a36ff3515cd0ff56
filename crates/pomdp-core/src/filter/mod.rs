//! Particle-based belief updating via rejection sampling.
//!
//! This module is composed of:
//! - `tree`: opaque belief-tree handles and the lookup contract the solver
//!   provides.
//! - `sampler`: the rejection-sampling particle filter with its error and
//!   statistics types.
//! - `parallel`: worker-thread fan-out for throughput-sensitive callers.
//! - `telemetry`: derived metrics over filter statistics.

mod parallel;
mod sampler;
mod telemetry;
mod tree;

pub use parallel::ParallelConfig;
pub use sampler::{CancelToken, FilterConfig, FilterError, FilterStats, ParticleFilter, Proposal};
pub use telemetry::FilterMetrics;
pub use tree::{ActionNodeHandle, BeliefNodeHandle, BeliefTreeIndex, BeliefTreeView};
