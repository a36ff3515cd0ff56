//! A two-position hidden-reward model shared by the filter tests.
//!
//! The reward hides behind one of two positions; probing is a noisy listen
//! that echoes the true side with configurable accuracy. Grabbing is
//! modelled as always illegal so the legality path stays observable.

use pomdp_core::filter::{BeliefNodeHandle, BeliefTreeIndex};
use pomdp_core::model::{
    ActionPool, DiscreteObservationPool, EmptyHistoricalData, EnumeratedActionPool, GeneratedStep,
    GenerativeModel, HistoricalData, ObservationPool, Space, StepResult,
};
use rand::{Rng, RngCore};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pos {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cmd {
    Probe,
    Grab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Echo {
    HearLeft,
    HearRight,
}

#[derive(Debug)]
pub struct SignalModel {
    accuracy: f64,
    steps: AtomicUsize,
}

impl SignalModel {
    pub fn new(accuracy: f64) -> Self {
        Self {
            accuracy,
            steps: AtomicUsize::new(0),
        }
    }

    /// Number of `generate_step` calls made against this model.
    pub fn steps_taken(&self) -> usize {
        self.steps.load(Ordering::Relaxed)
    }
}

impl GenerativeModel for SignalModel {
    type State = Pos;
    type Action = Cmd;
    type Observation = Echo;

    fn sample_an_init_state(&self, rng: &mut dyn RngCore) -> Pos {
        if rng.gen_bool(0.5) { Pos::Left } else { Pos::Right }
    }

    fn sample_state_uninformed(&self, rng: &mut dyn RngCore) -> Pos {
        self.sample_an_init_state(rng)
    }

    fn generate_step(
        &self,
        state: &Pos,
        action: &Cmd,
        rng: &mut dyn RngCore,
    ) -> GeneratedStep<Pos, Cmd, Echo> {
        self.steps.fetch_add(1, Ordering::Relaxed);
        match action {
            Cmd::Probe => {
                let truthful = rng.gen_bool(self.accuracy);
                let echo = match (state, truthful) {
                    (Pos::Left, true) | (Pos::Right, false) => Echo::HearLeft,
                    _ => Echo::HearRight,
                };
                GeneratedStep::legal(StepResult {
                    action: *action,
                    observation: echo,
                    reward: -1.0,
                    next_state: *state,
                    is_terminal: false,
                })
            }
            Cmd::Grab => GeneratedStep::illegal(StepResult {
                action: *action,
                observation: Echo::HearLeft,
                reward: 0.0,
                next_state: *state,
                is_terminal: false,
            }),
        }
    }

    fn is_terminal(&self, _state: &Pos) -> bool {
        false
    }

    fn is_valid(&self, _state: &Pos) -> bool {
        true
    }

    fn all_states(&self) -> Space<Pos> {
        Space::Enumerated(vec![Pos::Left, Pos::Right])
    }

    fn all_actions(&self) -> Space<Cmd> {
        Space::Enumerated(vec![Cmd::Probe, Cmd::Grab])
    }

    fn all_observations(&self) -> Space<Echo> {
        Space::Enumerated(vec![Echo::HearLeft, Echo::HearRight])
    }

    fn legal_actions(&self, _state: &Pos) -> Vec<Cmd> {
        vec![Cmd::Probe]
    }

    fn max_undiscounted_return(&self) -> f64 {
        1.0
    }

    fn create_action_pool(&self) -> Box<dyn ActionPool<Cmd>> {
        Box::new(EnumeratedActionPool::new(vec![Cmd::Probe]))
    }

    fn create_observation_pool(&self) -> Box<dyn ObservationPool<Echo>> {
        Box::new(DiscreteObservationPool::new(vec![
            Echo::HearLeft,
            Echo::HearRight,
        ]))
    }

    fn create_root_historical_data(&self) -> Box<dyn HistoricalData> {
        Box::new(EmptyHistoricalData)
    }
}

/// Builds an index with the probe action and both echo classes expanded.
pub fn probe_index(model: &SignalModel) -> (BeliefTreeIndex<Cmd, Echo>, BeliefNodeHandle) {
    let mut index = BeliefTreeIndex::new(model.create_observation_pool());
    let root = index.root();
    let probe = index.expand_action(root, Cmd::Probe);
    index
        .expand_observation(probe, &Echo::HearLeft)
        .expect("echo classifies");
    index
        .expand_observation(probe, &Echo::HearRight)
        .expect("echo classifies");
    (index, root)
}
