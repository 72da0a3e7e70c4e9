// Command implementations for tabrlctl

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

use tabrl_agent::{PolicyRun, SessionConfig, TrainingSession, TrainingSummary};
use tabrl_core::{Action, AlgorithmKind, Environment};
use tabrl_env::{EnvKind, GridWorld, MountainCar};

use crate::TrainArgs;

pub fn list() -> Result<()> {
    println!("📋 Environments:\n");

    for env in EnvKind::ALL {
        println!("{} ({})", env.display_name(), env.id());
        for algorithm in env.compatible_algorithms() {
            let params: Vec<String> = algorithm.params().iter().map(ToString::to_string).collect();
            println!("   {:<18} {}", algorithm.id(), params.join(", "));
        }
        println!();
    }

    Ok(())
}

pub fn train(args: &TrainArgs, replay: bool) -> Result<()> {
    let env_kind: EnvKind = args
        .env
        .parse()
        .with_context(|| format!("Unknown environment '{}'", args.env))?;
    let algorithm: AlgorithmKind = args
        .algo
        .parse()
        .with_context(|| format!("Unknown algorithm '{}'", args.algo))?;
    env_kind
        .ensure_supports(algorithm)
        .context("Environment and algorithm are incompatible")?;

    let config = load_config(args)?;

    match env_kind {
        EnvKind::GridWorld => execute(GridWorld::default(), algorithm, config, args, replay),
        EnvKind::MountainCar => execute(MountainCar::default(), algorithm, config, args, replay),
    }
}

fn load_config(args: &TrainArgs) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => SessionConfig::default(),
    };

    if let Some(episodes) = args.episodes {
        config.episodes = episodes;
    }
    if let Some(gamma) = args.gamma {
        config.agent.gamma = gamma;
    }
    if let Some(alpha) = args.alpha {
        config.agent.alpha = alpha;
    }
    if let Some(epsilon) = args.epsilon {
        config.agent.epsilon = epsilon;
    }
    if let Some(seed) = args.seed {
        config.agent.seed = Some(seed);
    }
    if let Some(steps) = args.steps {
        config.policy_steps = steps;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn execute<E: Environment + 'static>(
    env: E,
    algorithm: AlgorithmKind,
    config: SessionConfig,
    args: &TrainArgs,
    replay: bool,
) -> Result<()> {
    println!("🤖 Starting training");
    println!("   Environment: {}", env.name());
    println!("   Algorithm: {algorithm}");
    if !algorithm.is_planner() {
        println!("   Episodes: {}", config.episodes);
    }

    let mut session = TrainingSession::new(env, algorithm, config)
        .context("Failed to create training session")?;
    let summary = session
        .train(|progress| {
            info!(
                episode = progress.episode,
                of = progress.episodes,
                last_reward = ?progress.reward_history.last(),
                states = progress.snapshot.values.len(),
                "progress"
            );
        })
        .context("Training failed")?;
    print_summary(&summary);

    if let Some(path) = &args.output {
        write_snapshot(path, &serde_json::to_string_pretty(session.snapshot())?)?;
    }

    if args.graph {
        print!("{}", render_reward_graph(session.reward_history(), 10, 50));
    }

    if replay {
        let steps = session.config().policy_steps;
        let run = session.run_policy(steps).context("Policy replay failed")?;
        print_run(&run);
    }

    Ok(())
}

fn print_summary(summary: &TrainingSummary) {
    println!("\n✅ Training completed");
    println!("   Session: {}", summary.session_id);
    if let Some(plan) = summary.plan {
        println!(
            "   Iterations: {} (delta {:.6}, converged: {})",
            plan.iterations, plan.delta, plan.converged
        );
    }
    if let (Some(last), Some(mean)) = (summary.final_reward, summary.mean_reward) {
        println!("   Episodes: {}", summary.episodes);
        println!("   Final reward: {last:.3}");
        println!("   Mean reward: {mean:.3}");
    }
    let elapsed = summary.finished_at - summary.started_at;
    println!("   Duration: {} ms", elapsed.num_milliseconds());
}

fn write_snapshot(path: &Path, json: &str) -> Result<()> {
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write snapshot to {}", path.display()))?;
    println!("💾 Snapshot written to {}", path.display());
    Ok(())
}

fn print_run<A: Action>(run: &PolicyRun<A>) {
    println!("\n🎯 Greedy policy replay");
    let path: Vec<String> = run.states.iter().map(|s| format!("({s})")).collect();
    println!("   Path: {}", path.join(" → "));
    println!("   Steps: {}", run.steps);
    println!("   Total reward: {:.3}", run.total_reward);
    println!("   Reached end: {}", run.done);
}

/// ASCII bar graph of episode rewards, one column per sampled episode
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn render_reward_graph(rewards: &[f64], height: usize, width: usize) -> String {
    let mut out = String::new();
    if rewards.is_empty() {
        out.push_str("No reward data available.\n");
        return out;
    }

    let max_reward = rewards.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_reward = rewards.iter().copied().fold(f64::INFINITY, f64::min);
    let avg_reward = rewards.iter().sum::<f64>() / rewards.len() as f64;

    let _ = writeln!(out, "\n📊 Reward graph ({} episodes)", rewards.len());
    let _ = writeln!(out, "Max: {max_reward:.2}  Avg: {avg_reward:.2}  Min: {min_reward:.2}");
    let _ = writeln!(out, "┌{}┐", "─".repeat(width));

    for h in (0..height).rev() {
        out.push('│');
        for i in 0..width {
            let reward = rewards[(i * rewards.len()) / width];
            let normalized = (reward - min_reward) / (max_reward - min_reward + 1e-6);
            let bar_height = (normalized * height as f64) as usize;
            out.push(if bar_height >= h { '█' } else { ' ' });
        }
        out.push_str("│\n");
    }

    let _ = writeln!(out, "└{}┘", "─".repeat(width));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = TrainArgs {
            episodes: Some(7),
            gamma: Some(0.5),
            seed: Some(3),
            ..TrainArgs::default()
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.episodes, 7);
        assert_eq!(config.agent.gamma, 0.5);
        assert_eq!(config.agent.seed, Some(3));
        assert_eq!(config.snapshot_interval, 5);
    }

    #[test]
    fn out_of_range_flags_are_rejected() {
        let args = TrainArgs {
            epsilon: Some(2.0),
            ..TrainArgs::default()
        };
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn incompatible_pair_fails_before_training() {
        let args = TrainArgs {
            env: "mountaincar".to_string(),
            algo: "value-iteration".to_string(),
            ..TrainArgs::default()
        };
        let err = train(&args, false).unwrap_err();
        assert!(format!("{err:#}").contains("incompatible"));
    }

    #[test]
    fn graph_has_requested_shape() {
        let graph = render_reward_graph(&[-5.0, -1.0, 3.0], 4, 6);
        let rows: Vec<&str> = graph.lines().filter(|l| l.starts_with('│')).collect();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.chars().count() == 8));
        assert!(graph.contains("Max: 3.00"));
    }

    #[test]
    fn empty_graph_says_so() {
        assert!(render_reward_graph(&[], 10, 50).contains("No reward data"));
    }
}
