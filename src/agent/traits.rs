use ndarray::ArrayView1;
use std::path::Path;

use crate::environment::Action;
use crate::error::Result;

/// What one call to [`Agent::learn`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LearnOutcome {
    /// Not enough transitions yet; nothing changed.
    Warmup,
    /// One gradient step was applied.
    Updated {
        loss: f32,
        /// Whether the target network was hard-synced before this step.
        synced_target: bool,
    },
}

impl LearnOutcome {
    pub fn loss(&self) -> Option<f32> {
        match self {
            LearnOutcome::Warmup => None,
            LearnOutcome::Updated { loss, .. } => Some(*loss),
        }
    }
}

/// Interface the training loop drives.
pub trait Agent {
    /// Select an action for the current observation
    fn choose_action(&mut self, observation: ArrayView1<f32>) -> Result<Action>;

    /// Record one environment transition for replay
    fn store_transition(
        &mut self,
        observation: ArrayView1<f32>,
        action: Action,
        reward: f32,
        next_observation: ArrayView1<f32>,
        done: bool,
    ) -> Result<()>;

    /// Run one learning step
    fn learn(&mut self) -> Result<LearnOutcome>;

    /// Get the current exploration rate (if applicable)
    fn exploration_rate(&self) -> Option<f32> {
        None
    }

    /// Persist everything needed to resume
    fn save_checkpoint(&self, dir: &Path) -> Result<()>;
}
