use log::{debug, info};
use ndarray::{Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use std::fs;
use std::path::Path;

use super::checkpoint::{Checkpoint, TrainingState};
use super::traits::{Agent, LearnOutcome};
use crate::config::AgentConfig;
use crate::context::Context;
use crate::environment::{Action, ActionSpace, Environment, ObservationSpace};
use crate::error::{DqnError, Result};
use crate::exploration::EpsilonGreedy;
use crate::network::ValueNetwork;
use crate::optimizer::{Optimizer, OptimizerWrapper};
use crate::replay_buffer::ReplayBuffer;

/// Whether the agent has collected enough transitions to learn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Fewer than `batch_size` valid transitions; `learn` is a no-op
    Warmup,
    Learning,
}

/// Deep Q-Network agent with experience replay and a hard-synced target network.
///
/// # Example
///
/// ```rust
/// use copa_dqn::agent::{Agent, DqnAgent, LearnOutcome};
/// use copa_dqn::config::AgentConfig;
/// use copa_dqn::context::Context;
/// use copa_dqn::environment::{ActionSpace, ObservationSpace};
/// use ndarray::array;
///
/// let config = AgentConfig::default().batch_size(2).replay_buffer_size(8).hidden(1, 8);
/// let mut ctx = Context::new(config.seed);
/// let mut agent = DqnAgent::new(
///     &mut ctx,
///     &config,
///     &ObservationSpace::flat(2),
///     &ActionSpace::discrete(3),
/// ).unwrap();
///
/// let observation = array![0.0, 1.0];
/// let action = agent.choose_action(observation.view()).unwrap();
/// agent.store_transition(observation.view(), action, 1.0, array![0.5, 0.5].view(), false).unwrap();
/// assert_eq!(agent.learn().unwrap(), LearnOutcome::Warmup);
/// ```
pub struct DqnAgent {
    /// Receives gradient updates
    online: ValueNetwork,

    /// Supplies regression targets; changed only by hard syncs
    target: ValueNetwork,

    optimizer: OptimizerWrapper,
    replay_buffer: ReplayBuffer,
    policy: EpsilonGreedy,
    action_space: ActionSpace,

    gamma: f32,
    batch_size: usize,
    learning_rate: f32,
    replace_steps: usize,

    /// Number of completed learning steps
    learning_iterations: usize,

    rng: StdRng,
}

impl DqnAgent {
    pub fn new(
        ctx: &mut Context,
        config: &AgentConfig,
        observation_space: &ObservationSpace,
        action_space: &ActionSpace,
    ) -> Result<Self> {
        config.validate()?;
        let observation_dim = observation_space.dim();
        if observation_dim == 0 {
            return Err(DqnError::shape_mismatch(
                "non-empty observation space".to_string(),
                format!("shape {:?}", observation_space.shape),
            ));
        }
        if action_space.n() == 0 {
            return Err(DqnError::EmptyActionSpace);
        }

        let n_actions = action_space.n();
        let online = ValueNetwork::new(
            ctx,
            observation_dim,
            config.hidden_layers,
            config.hidden_size,
            n_actions,
            config.activation,
        )?;
        let target = ValueNetwork::new(
            ctx,
            observation_dim,
            config.hidden_layers,
            config.hidden_size,
            n_actions,
            config.activation,
        )?;

        info!(
            "Built DQN agent on {}: layers {:?}, {} activation, buffer {}, batch {}",
            ctx.device(),
            online.layer_sizes(),
            config.activation,
            config.replay_buffer_size,
            config.batch_size
        );

        Ok(DqnAgent {
            online,
            target,
            optimizer: config.optimizer.build(),
            replay_buffer: ReplayBuffer::new(config.replay_buffer_size, observation_dim)?,
            policy: EpsilonGreedy::new(config.eps, config.eps_decay, config.eps_min)?,
            action_space: *action_space,
            gamma: config.gamma,
            batch_size: config.batch_size,
            learning_rate: config.learning_rate,
            replace_steps: config.replace_target_network_steps,
            learning_iterations: 0,
            rng: ctx.fork_rng(),
        })
    }

    /// Build an agent sized to `env`'s observation and action spaces.
    pub fn from_env<E: Environment>(ctx: &mut Context, config: &AgentConfig, env: &E) -> Result<Self> {
        Self::new(ctx, config, env.observation_space(), env.action_space())
    }

    pub fn phase(&self) -> Phase {
        if self.replay_buffer.len() < self.batch_size {
            Phase::Warmup
        } else {
            Phase::Learning
        }
    }

    pub fn epsilon(&self) -> f32 {
        self.policy.epsilon()
    }

    pub fn learning_iterations(&self) -> usize {
        self.learning_iterations
    }

    pub fn online_network(&self) -> &ValueNetwork {
        &self.online
    }

    pub fn target_network(&self) -> &ValueNetwork {
        &self.target
    }

    pub fn replay_buffer(&self) -> &ReplayBuffer {
        &self.replay_buffer
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    /// Copy the online parameters into the target network.
    pub fn sync_target_network(&mut self) -> Result<()> {
        self.target.load_parameters_from(&self.online)?;
        debug!("Synced target network at learning iteration {}", self.learning_iterations);
        Ok(())
    }

    fn check_observation(&self, observation: ArrayView1<f32>) -> Result<()> {
        let expected = self.online.input_size();
        if observation.len() != expected {
            return Err(DqnError::shape_mismatch(
                format!("observation of size {}", expected),
                format!("observation of size {}", observation.len()),
            ));
        }
        Ok(())
    }

    /// Write the online and target parameters and the training counters to `dir`.
    pub fn save_checkpoint(&self, dir: impl AsRef<Path>) -> Result<()> {
        let checkpoint = Checkpoint::new(dir);
        fs::create_dir_all(checkpoint.dir())?;
        self.online.save(checkpoint.online_path())?;
        self.target.save(checkpoint.target_path())?;
        TrainingState {
            epsilon: self.policy.epsilon(),
            learning_iterations: self.learning_iterations,
            layer_sizes: self.online.layer_sizes(),
        }
        .save(checkpoint.state_path())?;
        info!("Saved checkpoint to {:?}", checkpoint.dir());
        Ok(())
    }

    /// Restore a checkpoint written by [`save_checkpoint`](Self::save_checkpoint).
    ///
    /// Either both parameter sets are restored or the agent is left untouched.
    /// The training counters are restored when the state file is present.
    pub fn load_checkpoint(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let checkpoint = Checkpoint::new(dir);
        let mut online = self.online.clone();
        let mut target = self.target.clone();
        online.load(checkpoint.online_path())?;
        target.load(checkpoint.target_path())?;

        let state_path = checkpoint.state_path();
        let state = if state_path.exists() {
            let state = TrainingState::load(&state_path)?;
            if state.layer_sizes != self.online.layer_sizes() {
                return Err(DqnError::shape_mismatch(
                    format!("{:?}", self.online.layer_sizes()),
                    format!("{:?}", state.layer_sizes),
                ));
            }
            Some(state)
        } else {
            None
        };

        self.online = online;
        self.target = target;
        if let Some(state) = state {
            self.policy.set_epsilon(state.epsilon);
            self.learning_iterations = state.learning_iterations;
        }
        info!(
            "Loaded checkpoint from {:?} (learning iteration {}, epsilon {:.4})",
            checkpoint.dir(),
            self.learning_iterations,
            self.policy.epsilon()
        );
        Ok(())
    }
}

impl Agent for DqnAgent {
    fn choose_action(&mut self, observation: ArrayView1<f32>) -> Result<Action> {
        self.check_observation(observation)?;
        let values = self.online.forward(observation)?;
        self.policy.select_action(values.view(), &self.action_space, &mut self.rng)
    }

    fn store_transition(
        &mut self,
        observation: ArrayView1<f32>,
        action: Action,
        reward: f32,
        next_observation: ArrayView1<f32>,
        done: bool,
    ) -> Result<()> {
        self.check_observation(observation)?;
        self.check_observation(next_observation)?;
        if !self.action_space.contains(action) {
            return Err(DqnError::InvalidAction {
                action,
                n: self.action_space.n(),
            });
        }
        self.replay_buffer
            .store_parts(observation, action, reward, next_observation, done);
        Ok(())
    }

    fn learn(&mut self) -> Result<LearnOutcome> {
        if self.phase() == Phase::Warmup {
            return Ok(LearnOutcome::Warmup);
        }

        let synced_target = self.learning_iterations % self.replace_steps == 0;
        if synced_target {
            self.sync_target_network()?;
        }

        let batch = self.replay_buffer.sample(self.batch_size, &mut self.rng)?;
        let rows = batch.len();

        let q_all = self.online.forward_batch(batch.observations.view())?;
        let q_next = self.target.predict_batch(batch.next_observations.view())?;

        // Terminal rows carry no discounted future value
        let max_next = q_next
            .axis_iter(Axis(0))
            .zip(&batch.dones)
            .map(|(row, &done)| {
                if done {
                    0.0
                } else {
                    row.fold(f32::NEG_INFINITY, |max, &v| max.max(v))
                }
            });

        let mut output_gradients = Array2::zeros(q_all.dim());
        let mut loss = 0.0;
        for (i, (max_q, (&action, &reward))) in max_next
            .zip(batch.actions.iter().zip(batch.rewards.iter()))
            .enumerate()
        {
            let q_target = reward + self.gamma * max_q;
            let error = q_all[[i, action]] - q_target;
            loss += error * error;
            // d/dq of mean((q - target)^2)
            output_gradients[[i, action]] = 2.0 * error / rows as f32;
        }
        loss /= rows as f32;

        let gradients = self.online.backward_batch(output_gradients.view())?;
        self.optimizer
            .apply_gradients(self.online.parameters_mut(), &gradients, self.learning_rate)?;

        self.policy.decay();
        self.learning_iterations += 1;
        debug!(
            "Learning iteration {}: loss {:.6}, epsilon {:.4}",
            self.learning_iterations,
            loss,
            self.policy.epsilon()
        );

        Ok(LearnOutcome::Updated { loss, synced_target })
    }

    fn exploration_rate(&self) -> Option<f32> {
        Some(self.policy.epsilon())
    }

    fn save_checkpoint(&self, dir: &Path) -> Result<()> {
        DqnAgent::save_checkpoint(self, dir)
    }
}
