//! The environment boundary consumed by the agent and the trainer.
//!
//! The production environment is an out-of-process network simulator reached
//! over a socket; this module only fixes the interface it has to present.
//! [`CorridorEnv`] is a small deterministic environment used for smoke runs
//! of the training binary and for tests.

use ndarray::{array, Array1};
use rand::Rng;
use std::collections::HashMap;

use crate::error::{DqnError, Result};

pub type Observation = Array1<f32>;
pub type Action = usize;

/// Shape of the observation vectors an environment emits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservationSpace {
    pub shape: Vec<usize>,
}

impl ObservationSpace {
    pub fn new(shape: Vec<usize>) -> Self {
        ObservationSpace { shape }
    }

    /// A flat observation of `dim` values
    pub fn flat(dim: usize) -> Self {
        ObservationSpace { shape: vec![dim] }
    }

    /// Number of values in one flattened observation
    pub fn dim(&self) -> usize {
        self.shape.iter().product()
    }
}

/// The discrete action set an environment accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionSpace {
    Discrete { n: usize },
}

impl ActionSpace {
    pub fn discrete(n: usize) -> Self {
        ActionSpace::Discrete { n }
    }

    pub fn n(&self) -> usize {
        match self {
            ActionSpace::Discrete { n } => *n,
        }
    }

    pub fn contains(&self, action: Action) -> bool {
        action < self.n()
    }

    /// Uniformly random action, used for exploration draws.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Action> {
        match self.n() {
            0 => Err(DqnError::EmptyActionSpace),
            n => Ok(rng.gen_range(0..n)),
        }
    }
}

/// Outcome of one environment step.
#[derive(Clone, Debug)]
pub struct Step {
    pub observation: Observation,
    pub reward: f32,
    pub done: bool,
    pub info: HashMap<String, String>,
}

pub trait Environment {
    fn observation_space(&self) -> &ObservationSpace;

    fn action_space(&self) -> &ActionSpace;

    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Result<Observation>;

    /// Apply `action` and advance the environment by one step.
    fn step(&mut self, action: Action) -> Result<Step>;
}

/// One-dimensional walk towards the right end of a corridor.
///
/// Actions are `0` (step left), `1` (hold) and `2` (step right), mirroring the
/// decrease/hold/increase choices of a congestion window controller. Each step
/// costs `-0.01`; reaching the end pays `1.0` and ends the episode. Episodes also
/// end after `max_steps` steps.
#[derive(Clone, Debug)]
pub struct CorridorEnv {
    length: usize,
    max_steps: usize,
    position: usize,
    steps: usize,
    observation_space: ObservationSpace,
    action_space: ActionSpace,
}

impl CorridorEnv {
    pub const STEP_PENALTY: f32 = -0.01;
    pub const GOAL_REWARD: f32 = 1.0;

    pub fn new(length: usize, max_steps: usize) -> Result<Self> {
        if length < 2 {
            return Err(DqnError::invalid_parameter("length", "corridor needs at least 2 cells"));
        }
        Ok(CorridorEnv {
            length,
            max_steps,
            position: 0,
            steps: 0,
            observation_space: ObservationSpace::flat(2),
            action_space: ActionSpace::discrete(3),
        })
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn observe(&self) -> Observation {
        let last = (self.length - 1) as f32;
        let position = self.position as f32 / last;
        array![position, 1.0 - position]
    }
}

impl Environment for CorridorEnv {
    fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    fn reset(&mut self) -> Result<Observation> {
        self.position = 0;
        self.steps = 0;
        Ok(self.observe())
    }

    fn step(&mut self, action: Action) -> Result<Step> {
        match action {
            0 => self.position = self.position.saturating_sub(1),
            1 => {}
            2 => self.position = (self.position + 1).min(self.length - 1),
            _ => {
                return Err(DqnError::InvalidAction {
                    action,
                    n: self.action_space.n(),
                })
            }
        }
        self.steps += 1;

        let reached_goal = self.position == self.length - 1;
        let reward = if reached_goal { Self::GOAL_REWARD } else { Self::STEP_PENALTY };
        let mut info = HashMap::new();
        info.insert("steps".to_string(), self.steps.to_string());

        Ok(Step {
            observation: self.observe(),
            reward,
            done: reached_goal || self.steps >= self.max_steps,
            info,
        })
    }
}
