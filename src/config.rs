//! Configuration of the agent and the training loop.
//!
//! Configuration files are flat YAML mappings; [`Config`] splits the keys
//! into the agent's hyperparameters and the trainer's settings.
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::optimizer::OptimizerKind;

/// Hyperparameters of [`DqnAgent`](crate::agent::DqnAgent), fixed at construction.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct AgentConfig {
    /// Discount factor.
    pub gamma: f32,

    /// Transitions per learning step; also the warmup threshold.
    pub batch_size: usize,

    /// Capacity of the replay ring.
    pub replay_buffer_size: usize,

    /// Number of hidden layers.
    pub hidden_layers: usize,

    /// Width of every hidden layer.
    pub hidden_size: usize,

    /// Activation of the hidden layers.
    pub activation: Activation,

    pub learning_rate: f32,

    pub optimizer: OptimizerKind,

    /// Initial exploration rate.
    pub eps: f32,

    /// Multiplicative decay rate applied after every learning step.
    pub eps_decay: f32,

    /// Exploration floor.
    pub eps_min: f32,

    /// Interval of target network hard syncs, in learning steps.
    pub replace_target_network_steps: usize,

    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            batch_size: 64,
            replay_buffer_size: 100_000,
            hidden_layers: 2,
            hidden_size: 64,
            activation: Activation::Tanh,
            learning_rate: 1e-3,
            optimizer: OptimizerKind::Adam,
            eps: 1.0,
            eps_decay: 1e-3,
            eps_min: 0.01,
            replace_target_network_steps: 1000,
            seed: 0,
        }
    }
}

impl AgentConfig {
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    pub fn replay_buffer_size(mut self, v: usize) -> Self {
        self.replay_buffer_size = v;
        self
    }

    /// Sets the hidden layer count and width.
    pub fn hidden(mut self, layers: usize, size: usize) -> Self {
        self.hidden_layers = layers;
        self.hidden_size = size;
        self
    }

    pub fn activation(mut self, v: Activation) -> Self {
        self.activation = v;
        self
    }

    pub fn learning_rate(mut self, v: f32) -> Self {
        self.learning_rate = v;
        self
    }

    pub fn optimizer(mut self, v: OptimizerKind) -> Self {
        self.optimizer = v;
        self
    }

    /// Sets the exploration schedule: start value, decay rate and floor.
    pub fn eps(mut self, start: f32, decay: f32, min: f32) -> Self {
        self.eps = start;
        self.eps_decay = decay;
        self.eps_min = min;
        self
    }

    pub fn replace_target_network_steps(mut self, v: usize) -> Self {
        self.replace_target_network_steps = v;
        self
    }

    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(invalid("gamma", format!("must lie in [0, 1], got {}", self.gamma)));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "must be positive".to_string()));
        }
        if self.replay_buffer_size < self.batch_size {
            return Err(invalid(
                "replay_buffer_size",
                format!("{} is smaller than batch_size {}", self.replay_buffer_size, self.batch_size),
            ));
        }
        if self.hidden_layers == 0 || self.hidden_size == 0 {
            return Err(invalid("hidden_layers", "layer count and width must be positive".to_string()));
        }
        if !(self.learning_rate > 0.0) {
            return Err(invalid("learning_rate", format!("must be positive, got {}", self.learning_rate)));
        }
        if !(0.0..=1.0).contains(&self.eps_min) || !(self.eps_min..=1.0).contains(&self.eps) {
            return Err(invalid(
                "eps",
                format!("need 0 <= eps_min <= eps <= 1, got eps={} eps_min={}", self.eps, self.eps_min),
            ));
        }
        if !(0.0..1.0).contains(&self.eps_decay) {
            return Err(invalid("eps_decay", format!("must lie in [0, 1), got {}", self.eps_decay)));
        }
        if self.replace_target_network_steps == 0 {
            return Err(invalid("replace_target_network_steps", "must be positive".to_string()));
        }
        Ok(())
    }
}

/// Settings of [`Trainer`](crate::trainer::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct TrainerConfig {
    /// Name used to prefix the training record files.
    pub env_name: String,

    /// Number of episodes to run.
    pub epoch_num: usize,

    /// Optional cap on the length of one episode.
    pub max_episode_steps: Option<usize>,

    /// Number of recent episodes averaged into `avg_score`.
    pub score_window: usize,

    /// Directory receiving the CSV data and the config copy.
    pub output_dir: Option<PathBuf>,

    /// Directory receiving the final checkpoint.
    pub checkpoint_dir: Option<PathBuf>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            env_name: "copa".to_string(),
            epoch_num: 100,
            max_episode_steps: None,
            score_window: 100,
            output_dir: None,
            checkpoint_dir: None,
        }
    }
}

impl TrainerConfig {
    pub fn epoch_num(mut self, v: usize) -> Self {
        self.epoch_num = v;
        self
    }

    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = Some(v);
        self
    }

    pub fn score_window(mut self, v: usize) -> Self {
        self.score_window = v;
        self
    }

    pub fn output_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(v.into());
        self
    }

    pub fn checkpoint_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(v.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.score_window == 0 {
            return Err(invalid("score_window", "must be positive".to_string()));
        }
        if self.max_episode_steps == Some(0) {
            return Err(invalid("max_episode_steps", "must be positive when set".to_string()));
        }
        Ok(())
    }
}

/// The full flat configuration file.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct Config {
    #[serde(flatten)]
    pub agent: AgentConfig,

    #[serde(flatten)]
    pub trainer: TrainerConfig,
}

impl Config {
    /// Constructs [`Config`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_yaml::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves [`Config`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_yaml::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        self.trainer.validate()
    }
}

fn invalid(name: &str, reason: String) -> DqnError {
    DqnError::invalid_parameter(name.to_string(), reason)
}
