//! The black-box generative model contract shared by all planning code.
//!
//! This module is composed of:
//! - `step`: the immutable record produced by one simulation step.
//! - `space`: enumeration descriptors for discrete and continuous spaces.
//! - `pools`: solver-owned strategy objects created by model factories.

mod pools;
mod space;
mod step;

pub use pools::{
    ActionPool, DiscreteObservationPool, EmptyHistoricalData, EnumeratedActionPool, HistoricalData,
    ObservationPool,
};
pub use space::{Bounds, Space};
pub use step::{GeneratedStep, StepResult};

use rand::RngCore;
use std::fmt;

/// Problem-specific black-box simulator.
///
/// The sole channel through which planning logic interacts with problem
/// dynamics: no closed-form transition or observation distribution is
/// assumed anywhere. Discrete and continuous problems are separate concrete
/// implementations selected at construction; enumeration operations stay
/// callable regardless of variant through [`Space`].
///
/// Stochastic operations draw their noise from the caller-supplied RNG, so
/// no model method needs `&mut self` and a shared model can serve
/// independent sampling tasks, each owning its own random source.
pub trait GenerativeModel {
    type State: Clone + fmt::Debug;
    type Action: Clone + fmt::Debug;
    type Observation: Clone + fmt::Debug;

    /// Draws an independent sample from the initial belief. Callable without
    /// bound; each call is independent.
    fn sample_an_init_state(&self, rng: &mut dyn RngCore) -> Self::State;

    /// Draws from a deliberately less-informed prior, used to seed rejection
    /// sampling when no informative parent particle set is available.
    fn sample_state_uninformed(&self, rng: &mut dyn RngCore) -> Self::State;

    /// The sole generative primitive: `(s, a) => (o, r, s')`.
    ///
    /// Transition, observation, and reward noise are realized through `rng`;
    /// two calls with the same arguments need not agree. An illegal action
    /// is reported through [`GeneratedStep::is_legal`], never as a failure.
    fn generate_step(
        &self,
        state: &Self::State,
        action: &Self::Action,
        rng: &mut dyn RngCore,
    ) -> GeneratedStep<Self::State, Self::Action, Self::Observation>;

    /// Returns true iff `state` is terminal. Pure predicate.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Returns true iff `state` is a valid state of the problem. Pure
    /// predicate.
    fn is_valid(&self, state: &Self::State) -> bool;

    fn all_states(&self) -> Space<Self::State>;

    fn all_actions(&self) -> Space<Self::Action>;

    fn all_observations(&self) -> Space<Self::Observation>;

    /// Actions that are legal in `state`.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Highest undiscounted return achievable in one episode.
    fn max_undiscounted_return(&self) -> f64;

    /// Creates the action-layout strategy for the solver's policy tree.
    fn create_action_pool(&self) -> Box<dyn ActionPool<Self::Action>>;

    /// Creates the observation-classification strategy for belief nodes.
    fn create_observation_pool(&self) -> Box<dyn ObservationPool<Self::Observation>>;

    /// Creates the data attached to the root belief node.
    fn create_root_historical_data(&self) -> Box<dyn HistoricalData>;
}
