use copa_dqn::{
    agent::{Agent, DqnAgent, LearnOutcome},
    config::{AgentConfig, Config, TrainerConfig},
    context::Context,
    environment::{CorridorEnv, Environment},
    trainer::{EpisodeRecord, Trainer},
};

fn small_config(dir: &std::path::Path) -> Config {
    Config {
        agent: AgentConfig::default()
            .batch_size(16)
            .replay_buffer_size(256)
            .hidden(2, 16)
            .learning_rate(5e-3)
            .eps(1.0, 0.01, 0.05)
            .replace_target_network_steps(20)
            .seed(7),
        trainer: TrainerConfig::default()
            .epoch_num(6)
            .max_episode_steps(40)
            .score_window(3)
            .output_dir(dir.join("output"))
            .checkpoint_dir(dir.join("checkpoint")),
    }
}

#[test]
fn test_end_to_end_training_and_resume() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path());

    let mut env = CorridorEnv::new(6, 40).unwrap();
    let mut ctx = Context::new(config.agent.seed);
    let mut agent = DqnAgent::from_env(&mut ctx, &config.agent, &env).unwrap();

    let trainer = Trainer::new(config.trainer.clone());
    let record = trainer.train(&mut agent, &mut env).unwrap();
    assert_eq!(record.episodes.len(), 6);
    assert!(record.episodes.iter().all(|e| e.steps <= 40 && e.score.is_finite()));
    assert!(agent.learning_iterations() > 0);
    assert!(agent.epsilon() < 1.0);

    let (data_path, config_path) = trainer.store_records(&record, &config).unwrap().unwrap();
    let rows: Vec<EpisodeRecord> = csv::Reader::from_path(&data_path)
        .unwrap()
        .deserialize()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(rows.len(), 6);
    assert_eq!(Config::load(&config_path).unwrap(), config);

    // resume into a freshly seeded agent
    let mut other_ctx = Context::new(123);
    let mut resumed = DqnAgent::from_env(&mut other_ctx, &config.agent, &env).unwrap();
    resumed.load_checkpoint(dir.path().join("checkpoint")).unwrap();
    assert_eq!(resumed.learning_iterations(), agent.learning_iterations());
    assert_eq!(resumed.epsilon(), agent.epsilon());
    assert_eq!(
        resumed.online_network().parameter_set(),
        agent.online_network().parameter_set()
    );
    assert_eq!(
        resumed.target_network().parameter_set(),
        agent.target_network().parameter_set()
    );

    // the resumed agent refills its buffer before learning again
    assert_eq!(resumed.learn().unwrap(), LearnOutcome::Warmup);
    let more = Trainer::new(config.trainer.clone().epoch_num(2))
        .train(&mut resumed, &mut env)
        .unwrap();
    assert_eq!(more.episodes.len(), 2);
    assert!(resumed.learning_iterations() > agent.learning_iterations());
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let run = || {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.trainer.output_dir = None;
        config.trainer.checkpoint_dir = None;

        let mut env = CorridorEnv::new(6, 40).unwrap();
        let mut ctx = Context::new(config.agent.seed);
        let mut agent = DqnAgent::from_env(&mut ctx, &config.agent, &env).unwrap();
        let record = Trainer::new(config.trainer).train(&mut agent, &mut env).unwrap();
        (record.episodes, agent.online_network().parameter_set())
    };
    assert_eq!(run(), run());
}
