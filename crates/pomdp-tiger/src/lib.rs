//! The classic tiger problem as a discrete generative model.
//!
//! A tiger hides behind one of two doors. Listening is cheap and noisy;
//! opening a door ends the episode with either the treasure or the tiger.

use pomdp_core::model::{
    ActionPool, DiscreteObservationPool, EmptyHistoricalData, EnumeratedActionPool, GeneratedStep,
    GenerativeModel, HistoricalData, ObservationPool, Space, StepResult,
};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// One of the two doors the tiger may hide behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Door {
    Left,
    Right,
}

impl Door {
    pub const BOTH: [Door; 2] = [Door::Left, Door::Right];

    pub const fn opposite(self) -> Door {
        match self {
            Door::Left => Door::Right,
            Door::Right => Door::Left,
        }
    }
}

/// Hidden state: where the tiger is and whether a door was already opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TigerState {
    pub tiger: Door,
    pub door_open: bool,
}

impl TigerState {
    pub const fn hidden(tiger: Door) -> Self {
        Self {
            tiger,
            door_open: false,
        }
    }

    const fn opened(self) -> Self {
        Self {
            tiger: self.tiger,
            door_open: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TigerAction {
    Listen,
    Open(Door),
}

/// A muffled growl heard behind one of the doors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Growl(pub Door);

/// Tunable problem parameters, passed explicitly at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TigerConfig {
    /// Probability that listening reports the tiger's true door.
    pub listen_accuracy: f64,
    pub listen_cost: f64,
    pub treasure_reward: f64,
    pub tiger_penalty: f64,
}

impl Default for TigerConfig {
    fn default() -> Self {
        Self {
            listen_accuracy: 0.85,
            listen_cost: -1.0,
            treasure_reward: 10.0,
            tiger_penalty: -100.0,
        }
    }
}

/// Discrete generative model for the tiger problem.
#[derive(Debug, Clone)]
pub struct TigerModel {
    config: TigerConfig,
}

impl TigerModel {
    pub fn new(config: TigerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> TigerConfig {
        self.config
    }

    fn sample_door(rng: &mut dyn RngCore) -> Door {
        if rng.gen_bool(0.5) {
            Door::Left
        } else {
            Door::Right
        }
    }

    fn actions() -> Vec<TigerAction> {
        vec![
            TigerAction::Listen,
            TigerAction::Open(Door::Left),
            TigerAction::Open(Door::Right),
        ]
    }
}

impl GenerativeModel for TigerModel {
    type State = TigerState;
    type Action = TigerAction;
    type Observation = Growl;

    fn sample_an_init_state(&self, rng: &mut dyn RngCore) -> TigerState {
        TigerState::hidden(Self::sample_door(rng))
    }

    fn sample_state_uninformed(&self, rng: &mut dyn RngCore) -> TigerState {
        // The initial belief is already uniform over the doors, so the
        // uninformed prior coincides with it.
        TigerState::hidden(Self::sample_door(rng))
    }

    fn generate_step(
        &self,
        state: &TigerState,
        action: &TigerAction,
        rng: &mut dyn RngCore,
    ) -> GeneratedStep<TigerState, TigerAction, Growl> {
        if state.door_open {
            // Acting in a finished episode is illegal; report it, don't fail.
            return GeneratedStep::illegal(StepResult {
                action: *action,
                observation: Growl(state.tiger),
                reward: 0.0,
                next_state: *state,
                is_terminal: true,
            });
        }

        let (observation, reward, next_state, is_terminal) = match action {
            TigerAction::Listen => {
                let heard = if rng.gen_bool(self.config.listen_accuracy) {
                    state.tiger
                } else {
                    state.tiger.opposite()
                };
                (Growl(heard), self.config.listen_cost, *state, false)
            }
            TigerAction::Open(door) => {
                let reward = if *door == state.tiger {
                    self.config.tiger_penalty
                } else {
                    self.config.treasure_reward
                };
                // An opened door reveals nothing more to listen to.
                (Growl(Self::sample_door(rng)), reward, state.opened(), true)
            }
        };

        GeneratedStep::legal(StepResult {
            action: *action,
            observation,
            reward,
            next_state,
            is_terminal,
        })
    }

    fn is_terminal(&self, state: &TigerState) -> bool {
        state.door_open
    }

    fn is_valid(&self, _state: &TigerState) -> bool {
        true
    }

    fn all_states(&self) -> Space<TigerState> {
        Space::Enumerated(
            Door::BOTH
                .iter()
                .flat_map(|&door| {
                    [
                        TigerState::hidden(door),
                        TigerState::hidden(door).opened(),
                    ]
                })
                .collect(),
        )
    }

    fn all_actions(&self) -> Space<TigerAction> {
        Space::Enumerated(Self::actions())
    }

    fn all_observations(&self) -> Space<Growl> {
        Space::Enumerated(vec![Growl(Door::Left), Growl(Door::Right)])
    }

    fn legal_actions(&self, state: &TigerState) -> Vec<TigerAction> {
        if state.door_open {
            Vec::new()
        } else {
            Self::actions()
        }
    }

    fn max_undiscounted_return(&self) -> f64 {
        self.config.treasure_reward
    }

    fn create_action_pool(&self) -> Box<dyn ActionPool<TigerAction>> {
        Box::new(EnumeratedActionPool::new(Self::actions()))
    }

    fn create_observation_pool(&self) -> Box<dyn ObservationPool<Growl>> {
        Box::new(DiscreteObservationPool::new(vec![
            Growl(Door::Left),
            Growl(Door::Right),
        ]))
    }

    fn create_root_historical_data(&self) -> Box<dyn HistoricalData> {
        Box::new(EmptyHistoricalData)
    }
}
