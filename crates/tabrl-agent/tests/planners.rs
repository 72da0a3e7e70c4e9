use approx::assert_relative_eq;

use tabrl_agent::{PolicyIteration, SessionConfig, TrainingSession, ValueIteration};
use tabrl_core::{AgentConfig, AlgorithmKind, Environment, Planner, StateKey, TabularAgent};
use tabrl_env::{GridAction, GridWorld, MountainCar};

fn greedy_replay<P: TabularAgent<GridWorld>>(agent: &P, env: &mut GridWorld) -> (Vec<f64>, bool) {
    let policy = agent.policy();
    let mut state = env.reset();
    let mut rewards = Vec::new();
    for _ in 0..100 {
        let Some(action) = policy.get(&state) else {
            break;
        };
        let step = env.step(action).unwrap();
        rewards.push(step.reward.0);
        state = step.state;
        if step.done {
            return (rewards, true);
        }
    }
    (rewards, false)
}

fn discounted(rewards: &[f64], gamma: f64) -> f64 {
    rewards.iter().rev().fold(0.0, |g, r| r + gamma * g)
}

#[test]
fn value_iteration_is_deterministic() {
    let env = GridWorld::default();
    let mut a: ValueIteration<GridWorld> = ValueIteration::new(AgentConfig::default()).unwrap();
    let mut b: ValueIteration<GridWorld> = ValueIteration::new(AgentConfig::default()).unwrap();
    a.train(&env, 50).unwrap();
    b.train(&env, 50).unwrap();

    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(
        serde_json::to_string(&a.snapshot()).unwrap(),
        serde_json::to_string(&b.snapshot()).unwrap()
    );
}

#[test]
fn value_iteration_finds_shortest_path() {
    let mut env = GridWorld::default();
    let mut vi: ValueIteration<GridWorld> = ValueIteration::new(AgentConfig::default()).unwrap();
    let report = vi.train(&env, 50).unwrap();
    assert!(report.converged);

    let (rewards, reached) = greedy_replay(&vi, &mut env);
    assert!(reached);
    assert_eq!(rewards.len(), 8);
    assert_eq!(env.current_state(), StateKey::pair(4, 4));
}

#[test]
fn policy_and_value_iteration_agree() {
    let mut env = GridWorld::default();

    let mut vi: ValueIteration<GridWorld> = ValueIteration::new(AgentConfig::default()).unwrap();
    vi.train(&env, 50).unwrap();
    let (vi_rewards, vi_reached) = greedy_replay(&vi, &mut env);

    let mut pi: PolicyIteration<GridWorld> = PolicyIteration::new(AgentConfig {
        seed: Some(2024),
        ..AgentConfig::default()
    })
    .unwrap();
    pi.train(&env, 20).unwrap();
    let (pi_rewards, pi_reached) = greedy_replay(&pi, &mut env);

    assert!(vi_reached && pi_reached);
    assert_relative_eq!(
        discounted(&vi_rewards, 0.9),
        discounted(&pi_rewards, 0.9),
        epsilon = 1e-9
    );
}

#[test]
fn goal_neighbours_point_at_goal() {
    let env = GridWorld::default();
    let mut vi: ValueIteration<GridWorld> = ValueIteration::new(AgentConfig::default()).unwrap();
    vi.train(&env, 50).unwrap();

    let policy = vi.policy();
    assert_eq!(policy.get(&StateKey::pair(3, 4)), Some(GridAction::Down));
    assert_eq!(policy.get(&StateKey::pair(4, 3)), Some(GridAction::Right));
    assert_relative_eq!(vi.values().get(&StateKey::pair(4, 4)), 0.0);
}

#[test]
fn planners_are_no_ops_without_enumeration() {
    let env = MountainCar::default();

    let mut vi: ValueIteration<MountainCar> = ValueIteration::new(AgentConfig::default()).unwrap();
    assert_eq!(vi.sweep(&env).unwrap(), 0.0);
    assert!(vi.train(&env, 50).unwrap().converged);
    assert!(vi.values().is_empty());

    let mut pi: PolicyIteration<MountainCar> = PolicyIteration::new(AgentConfig::default()).unwrap();
    assert!(pi.train(&env, 20).unwrap().converged);
    assert!(pi.policy().is_empty());
}

#[test]
fn session_replays_value_iteration_policy() {
    let mut session =
        TrainingSession::new(GridWorld::default(), AlgorithmKind::ValueIteration, SessionConfig::default())
            .unwrap();
    session.train(|_| {}).unwrap();

    let run = session.run_policy(100).unwrap();
    assert!(run.done);
    assert_eq!(run.steps, 8);
    assert_eq!(run.states.first(), Some(&StateKey::pair(0, 0)));
    assert_eq!(run.states.last(), Some(&StateKey::pair(4, 4)));

    let expected = (0..7).map(|k| -0.1 * 0.9_f64.powi(k)).sum::<f64>() + 10.0 * 0.9_f64.powi(7);
    assert_relative_eq!(run.discounted_return(0.9), expected, epsilon = 1e-9);
}
