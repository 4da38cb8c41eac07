//! The episode loop around an [`Agent`] and an [`Environment`].
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::agent::{Agent, LearnOutcome};
use crate::config::{Config, TrainerConfig};
use crate::environment::Environment;
use crate::error::Result;

/// Statistics of one finished episode; one row of the training data CSV.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode: usize,
    pub score: f32,
    /// Mean score over the most recent `score_window` episodes
    pub avg_score: f32,
    /// Exploration rate at the end of the episode
    pub epsilon: f32,
    pub steps: usize,
    pub learning_steps: usize,
}

/// Everything a training run produced.
#[derive(Clone, Debug, Default)]
pub struct TrainingRecord {
    pub episodes: Vec<EpisodeRecord>,
    pub best_avg_score: Option<f32>,
}

impl TrainingRecord {
    /// Write one CSV row per episode.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in &self.episodes {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Running mean over a fixed window of recent scores
struct ScoreWindow {
    scores: VecDeque<f32>,
    window: usize,
    sum: f32,
}

impl ScoreWindow {
    fn new(window: usize) -> Self {
        ScoreWindow {
            scores: VecDeque::with_capacity(window),
            window,
            sum: 0.0,
        }
    }

    fn push(&mut self, score: f32) -> f32 {
        if self.scores.len() == self.window {
            if let Some(oldest) = self.scores.pop_front() {
                self.sum -= oldest;
            }
        }
        self.scores.push_back(score);
        self.sum += score;
        self.sum / self.scores.len() as f32
    }
}

pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Trainer { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Run `epoch_num` episodes, learning after every environment step.
    ///
    /// Saves a checkpoint into `checkpoint_dir` when one is configured.
    pub fn train<A: Agent, E: Environment>(&self, agent: &mut A, env: &mut E) -> Result<TrainingRecord> {
        self.config.validate()?;
        let mut record = TrainingRecord::default();
        let mut window = ScoreWindow::new(self.config.score_window);

        for episode in 0..self.config.epoch_num {
            let mut observation = env.reset()?;
            let mut score = 0.0;
            let mut steps = 0;
            let mut learning_steps = 0;

            loop {
                let action = agent.choose_action(observation.view())?;
                let step = env.step(action)?;
                score += step.reward;
                steps += 1;

                agent.store_transition(
                    observation.view(),
                    action,
                    step.reward,
                    step.observation.view(),
                    step.done,
                )?;
                observation = step.observation;

                if let LearnOutcome::Updated { loss, .. } = agent.learn()? {
                    learning_steps += 1;
                    if !loss.is_finite() {
                        warn!("Non-finite loss {} in episode {}", loss, episode);
                    }
                }

                if step.done {
                    break;
                }
                if self.config.max_episode_steps.map_or(false, |max| steps >= max) {
                    break;
                }
            }

            let avg_score = window.push(score);
            let epsilon = agent.exploration_rate().unwrap_or(0.0);
            if record.best_avg_score.map_or(true, |best| avg_score > best) {
                record.best_avg_score = Some(avg_score);
            }
            info!(
                "Episode {}: score {:.3}, avg score {:.3}, epsilon {:.4}, {} steps",
                episode, score, avg_score, epsilon, steps
            );
            record.episodes.push(EpisodeRecord {
                episode,
                score,
                avg_score,
                epsilon,
                steps,
                learning_steps,
            });
        }

        if let Some(dir) = &self.config.checkpoint_dir {
            agent.save_checkpoint(dir)?;
        }
        Ok(record)
    }

    /// Write `<env_name>_training_data.csv` and `<env_name>_config.yaml` into
    /// the output directory, returning their paths. Does nothing without an
    /// output directory.
    pub fn store_records(&self, record: &TrainingRecord, config: &Config) -> Result<Option<(PathBuf, PathBuf)>> {
        let dir = match &self.config.output_dir {
            Some(dir) => dir,
            None => return Ok(None),
        };
        fs::create_dir_all(dir)?;
        let data_path = dir.join(format!("{}_training_data.csv", self.config.env_name));
        let config_path = dir.join(format!("{}_config.yaml", self.config.env_name));
        record.write_csv(&data_path)?;
        config.save(&config_path)?;
        info!("Stored training data in {:?} and config in {:?}", data_path, config_path);
        Ok(Some((data_path, config_path)))
    }
}
