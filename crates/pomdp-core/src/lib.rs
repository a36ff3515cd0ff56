#![deny(warnings)]
//! Generative-model contract and particle-based belief updating for
//! simulation-based POMDP solvers.

pub mod filter;
pub mod model;

pub use filter::{
    ActionNodeHandle, BeliefNodeHandle, BeliefTreeIndex, BeliefTreeView, CancelToken, FilterConfig,
    FilterError, FilterMetrics, FilterStats, ParallelConfig, ParticleFilter, Proposal,
};
pub use model::{GeneratedStep, GenerativeModel, Space, StepResult};
