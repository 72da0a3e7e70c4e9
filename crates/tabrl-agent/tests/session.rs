use tabrl_agent::{AgentHandle, SessionConfig, TrainingSession};
use tabrl_core::{AgentConfig, AlgorithmKind, Environment, StateKey};
use tabrl_env::{EnvKind, GridWorld, MountainCar};

fn config(episodes: usize, seed: u64) -> SessionConfig {
    SessionConfig {
        agent: AgentConfig {
            seed: Some(seed),
            ..AgentConfig::default()
        },
        episodes,
        ..SessionConfig::default()
    }
}

#[test]
fn every_compatible_pair_trains() {
    for algorithm in EnvKind::GridWorld.compatible_algorithms() {
        let mut session = TrainingSession::new(GridWorld::default(), *algorithm, config(6, 1)).unwrap();
        session.train(|_| {}).unwrap();
        assert!(!session.snapshot().values.is_empty(), "{algorithm} left no values");
    }

    for algorithm in EnvKind::MountainCar.compatible_algorithms() {
        let mut session = TrainingSession::new(MountainCar::default(), *algorithm, config(2, 1)).unwrap();
        let summary = session.train(|_| {}).unwrap();
        assert_eq!(summary.episodes, 2);
        assert!(session.episode_stats().iter().all(|s| s.steps <= 200));
    }
}

#[test]
fn snapshots_arrive_after_first_then_every_five_episodes() {
    let mut session =
        TrainingSession::new(GridWorld::default(), AlgorithmKind::MonteCarlo, config(20, 3)).unwrap();
    let mut seen = Vec::new();
    session.train(|p| seen.push(p.episode)).unwrap();
    assert_eq!(seen, vec![1, 6, 11, 16, 20]);
}

#[test]
fn each_train_call_starts_a_fresh_history() {
    let mut session =
        TrainingSession::new(GridWorld::default(), AlgorithmKind::QLearning, config(5, 9)).unwrap();
    session.train(|_| {}).unwrap();
    let mut reports = Vec::new();
    let second = session
        .train(|p| reports.push((p.episode, p.reward_history.len())))
        .unwrap();

    assert_eq!(reports, vec![(1, 1), (5, 5)]);
    assert_eq!(second.episodes, 5);
    assert_eq!(session.reward_history().len(), 5);
    assert_eq!(session.episode_stats().len(), 5);
    assert_eq!(session.episode_stats().last().map(|s| s.episode), Some(5));
    // Tables keep learning across calls
    assert!(session.agent().q_table().is_some_and(|q| !q.is_empty()));
}

#[test]
fn step_agent_follows_policy_and_restarts_after_goal() {
    let mut session = TrainingSession::new(
        GridWorld::default(),
        AlgorithmKind::ValueIteration,
        SessionConfig::default(),
    )
    .unwrap();
    session.train(|_| {}).unwrap();

    let mut last = None;
    for _ in 0..8 {
        last = Some(session.step_agent().unwrap());
    }
    let last = last.unwrap();
    assert!(last.step.done);
    assert_eq!(last.steps, 8);

    let next = session.step_agent().unwrap();
    assert_eq!(next.steps, 1);
    assert_ne!(session.env().current_state(), StateKey::pair(4, 4));
}

#[test]
fn replay_without_policy_entry_stops() {
    let mut session =
        TrainingSession::new(MountainCar::default(), AlgorithmKind::TemporalDifference, config(1, 4)).unwrap();
    session.train(|_| {}).unwrap();

    let run = session.run_policy(100).unwrap();
    assert_eq!(run.steps, 0);
    assert!(!run.done);
}

#[test]
fn reset_builds_a_fresh_agent() {
    let mut session =
        TrainingSession::new(GridWorld::default(), AlgorithmKind::QLearning, config(5, 2)).unwrap();
    session.train(|_| {}).unwrap();
    assert!(session.agent().q_table().is_some_and(|q| !q.is_empty()));

    session.reset().unwrap();
    assert!(matches!(session.agent(), AgentHandle::Learner(_)));
    assert!(session.agent().q_table().is_some_and(|q| q.is_empty()));
    assert!(session.reward_history().is_empty());
    assert!(session.episode_stats().is_empty());
    assert_eq!(session.env().current_state(), StateKey::pair(0, 0));
}

#[test]
fn snapshot_serializes_to_json() {
    let mut session =
        TrainingSession::new(GridWorld::default(), AlgorithmKind::QLearning, config(5, 6)).unwrap();
    session.train(|_| {}).unwrap();

    let json: serde_json::Value = serde_json::to_value(session.snapshot()).unwrap();
    assert!(json["values"].is_object());
    assert!(json["policy"]["0,0"].is_string());
    assert!(json["q_table"]["0,0"]["up"].is_number());
}
