use ndarray::{array, Array1};

use crate::agent::{Agent, Checkpoint, DqnAgent, LearnOutcome, Phase};
use crate::config::AgentConfig;
use crate::context::Context;
use crate::environment::{ActionSpace, ObservationSpace};
use crate::error::DqnError;
use crate::optimizer::OptimizerKind;

fn config() -> AgentConfig {
    AgentConfig::default()
        .batch_size(4)
        .replay_buffer_size(16)
        .hidden(1, 8)
        .eps(1.0, 0.1, 0.05)
        .replace_target_network_steps(3)
        .seed(21)
}

fn build(config: &AgentConfig) -> DqnAgent {
    let mut ctx = Context::new(config.seed);
    DqnAgent::new(&mut ctx, config, &ObservationSpace::flat(2), &ActionSpace::discrete(3)).unwrap()
}

fn observation(i: usize) -> Array1<f32> {
    array![(i as f32 * 0.37).sin(), (i as f32 * 0.11).cos()]
}

fn fill(agent: &mut DqnAgent, count: usize, done: bool) {
    for i in 0..count {
        agent
            .store_transition(observation(i).view(), i % 3, i as f32 * 0.1, observation(i + 1).view(), done)
            .unwrap();
    }
}

#[test]
fn test_new_agent_starts_in_warmup() {
    let agent = build(&config());
    assert_eq!(agent.phase(), Phase::Warmup);
    assert_eq!(agent.epsilon(), 1.0);
    assert_eq!(agent.exploration_rate(), Some(1.0));
    assert_eq!(agent.learning_iterations(), 0);
    assert_eq!(agent.online_network().layer_sizes(), vec![2, 8, 3]);
    assert_eq!(agent.replay_buffer().capacity(), 16);
    // the two networks are constructed independently
    assert_ne!(agent.online_network().parameter_set(), agent.target_network().parameter_set());
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut ctx = Context::new(0);
    let bad = config().replay_buffer_size(2);
    let result = DqnAgent::new(&mut ctx, &bad, &ObservationSpace::flat(2), &ActionSpace::discrete(3));
    assert!(matches!(result, Err(DqnError::InvalidParameter { .. })));

    let result = DqnAgent::new(&mut ctx, &config(), &ObservationSpace::flat(2), &ActionSpace::discrete(0));
    assert!(matches!(result, Err(DqnError::EmptyActionSpace)));

    let result = DqnAgent::new(&mut ctx, &config(), &ObservationSpace::new(vec![2, 0]), &ActionSpace::discrete(3));
    assert!(matches!(result, Err(DqnError::ShapeMismatch { .. })));
}

#[test]
fn test_warmup_learning_changes_nothing() {
    let mut agent = build(&config());
    fill(&mut agent, 3, false);

    let online = agent.online_network().parameter_set();
    let target = agent.target_network().parameter_set();
    for _ in 0..5 {
        assert_eq!(agent.learn().unwrap(), LearnOutcome::Warmup);
    }
    assert_eq!(agent.phase(), Phase::Warmup);
    assert_eq!(agent.online_network().parameter_set(), online);
    assert_eq!(agent.target_network().parameter_set(), target);
    assert_eq!(agent.epsilon(), 1.0);
    assert_eq!(agent.learning_iterations(), 0);
}

#[test]
fn test_first_learning_step_syncs_then_updates() {
    let mut agent = build(&config());
    fill(&mut agent, 4, false);
    assert_eq!(agent.phase(), Phase::Learning);

    let online_before = agent.online_network().parameter_set();
    let outcome = agent.learn().unwrap();
    assert!(matches!(outcome, LearnOutcome::Updated { synced_target: true, .. }));

    // target took the pre-update online parameters; only online moved
    assert_eq!(agent.target_network().parameter_set(), online_before);
    assert_ne!(agent.online_network().parameter_set(), online_before);
    assert_eq!(agent.learning_iterations(), 1);
    assert!((agent.epsilon() - 0.9).abs() < 1e-6);
}

#[test]
fn test_target_network_is_frozen_between_syncs() {
    let mut agent = build(&config());
    fill(&mut agent, 8, false);

    let mut target_at_sync = None;
    for iteration in 0..9 {
        let online_before = agent.online_network().parameter_set();
        let outcome = agent.learn().unwrap();
        let synced = iteration % 3 == 0;
        assert_eq!(outcome, LearnOutcome::Updated { loss: outcome.loss().unwrap(), synced_target: synced });

        let target = agent.target_network().parameter_set();
        if synced {
            assert_eq!(target, online_before);
            target_at_sync = Some(target);
        } else {
            assert_eq!(Some(target), target_at_sync);
        }
    }
    assert_eq!(agent.learning_iterations(), 9);
}

#[test]
fn test_terminal_rows_regress_to_reward() {
    let mut agent = build(&config().gamma(0.9));
    fill(&mut agent, 4, true);

    // batch_size equals the valid count, so the batch is every stored transition
    let mut expected = 0.0;
    for slot in 0..4 {
        let t = agent.replay_buffer().get(slot).unwrap();
        let q = agent.online_network().forward(t.observation.view()).unwrap()[t.action];
        expected += (t.reward - q) * (t.reward - q);
    }
    expected /= 4.0;

    let loss = agent.learn().unwrap().loss().unwrap();
    assert!((loss - expected).abs() < 1e-5, "loss {} vs expected {}", loss, expected);
}

#[test]
fn test_non_terminal_rows_bootstrap_from_target() {
    let mut agent = build(&config().gamma(0.5));
    fill(&mut agent, 4, false);

    // the first step syncs, so the target equals the current online network
    let net = agent.online_network().clone();
    let mut expected = 0.0;
    for slot in 0..4 {
        let t = agent.replay_buffer().get(slot).unwrap();
        let q = net.forward(t.observation.view()).unwrap()[t.action];
        let next_max = net
            .forward(t.next_observation.view())
            .unwrap()
            .fold(f32::NEG_INFINITY, |m, &v| m.max(v));
        let target = t.reward + 0.5 * next_max;
        expected += (target - q) * (target - q);
    }
    expected /= 4.0;

    let loss = agent.learn().unwrap().loss().unwrap();
    assert!((loss - expected).abs() < 1e-5, "loss {} vs expected {}", loss, expected);
}

#[test]
fn test_learning_fits_terminal_targets() {
    let config = config().learning_rate(1e-2).optimizer(OptimizerKind::Adam);
    let mut agent = build(&config);
    fill(&mut agent, 4, true);

    let first = agent.learn().unwrap().loss().unwrap();
    let mut last = first;
    for _ in 0..300 {
        last = agent.learn().unwrap().loss().unwrap();
    }
    assert!(last < first, "loss went from {} to {}", first, last);
}

#[test]
fn test_epsilon_decays_per_learning_step_only() {
    let mut agent = build(&config());
    fill(&mut agent, 3, false);
    agent.learn().unwrap();
    assert_eq!(agent.epsilon(), 1.0);

    fill(&mut agent, 1, false);
    let mut previous = agent.epsilon();
    for _ in 0..40 {
        agent.learn().unwrap();
        assert!(agent.epsilon() < previous || agent.epsilon() == 0.05);
        assert!(agent.epsilon() >= 0.05);
        previous = agent.epsilon();
    }
    assert_eq!(agent.epsilon(), 0.05);
}

#[test]
fn test_store_transition_validates_input() {
    let mut agent = build(&config());
    let good = observation(0);
    let bad = array![1.0, 2.0, 3.0];

    let result = agent.store_transition(bad.view(), 0, 0.0, good.view(), false);
    assert!(matches!(result, Err(DqnError::ShapeMismatch { .. })));
    let result = agent.store_transition(good.view(), 0, 0.0, bad.view(), false);
    assert!(matches!(result, Err(DqnError::ShapeMismatch { .. })));
    let result = agent.store_transition(good.view(), 3, 0.0, good.view(), false);
    assert!(matches!(result, Err(DqnError::InvalidAction { action: 3, n: 3 })));
    assert!(agent.replay_buffer().is_empty());
}

#[test]
fn test_choose_action() {
    let greedy = config().eps(0.0, 0.0, 0.0);
    let mut agent = build(&greedy);
    let obs = observation(5);
    let values = agent.online_network().forward(obs.view()).unwrap();
    let expected = crate::exploration::greedy_action(values.view()).unwrap();
    for _ in 0..10 {
        assert_eq!(agent.choose_action(obs.view()).unwrap(), expected);
    }

    let result = agent.choose_action(array![1.0].view());
    assert!(matches!(result, Err(DqnError::ShapeMismatch { .. })));

    let mut exploring = build(&config());
    for _ in 0..20 {
        assert!(exploring.choose_action(obs.view()).unwrap() < 3);
    }
}

#[test]
fn test_checkpoint_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut agent = build(&config());
    fill(&mut agent, 6, false);
    for _ in 0..4 {
        agent.learn().unwrap();
    }
    agent.save_checkpoint(dir.path()).unwrap();

    let checkpoint = Checkpoint::new(dir.path());
    assert!(checkpoint.online_path().exists());
    assert!(checkpoint.target_path().exists());
    assert!(checkpoint.state_path().exists());

    let mut restored = build(&config().seed(99));
    restored.load_checkpoint(dir.path()).unwrap();
    assert_eq!(restored.online_network().parameter_set(), agent.online_network().parameter_set());
    assert_eq!(restored.target_network().parameter_set(), agent.target_network().parameter_set());
    assert_eq!(restored.learning_iterations(), 4);
    assert_eq!(restored.epsilon(), agent.epsilon());
}

#[test]
fn test_checkpoint_without_state_restores_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let agent = build(&config());
    agent.save_checkpoint(dir.path()).unwrap();
    std::fs::remove_file(Checkpoint::new(dir.path()).state_path()).unwrap();

    let mut restored = build(&config().seed(3));
    restored.load_checkpoint(dir.path()).unwrap();
    assert_eq!(restored.online_network().parameter_set(), agent.online_network().parameter_set());
    assert_eq!(restored.learning_iterations(), 0);
}

#[test]
fn test_loading_other_architecture_fails_and_keeps_agent() {
    let dir = tempfile::tempdir().unwrap();
    build(&config()).save_checkpoint(dir.path()).unwrap();

    let mut wider = build(&config().hidden(1, 16));
    let before = wider.online_network().parameter_set();
    let result = wider.load_checkpoint(dir.path());
    assert!(matches!(result, Err(DqnError::ShapeMismatch { .. })));
    assert_eq!(wider.online_network().parameter_set(), before);
}

#[test]
fn test_loading_missing_checkpoint_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut agent = build(&config());
    let result = agent.load_checkpoint(dir.path().join("nowhere"));
    assert!(matches!(result, Err(DqnError::Io(_))));
}
