//! Training session: one environment, one agent, and everything a caller
//! needs to train, inspect and replay them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use tabrl_core::{
    default_action, Action, AgentConfig, AlgorithmKind, Environment, PlanReport, RLError,
    Result, Snapshot, StateKey, Step,
};

use crate::factory::{make_agent, AgentHandle};

/// Session-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Agent hyperparameters
    pub agent: AgentConfig,
    /// Training episodes for online learners
    pub episodes: usize,
    /// Episodes between progress reports
    pub snapshot_interval: usize,
    /// Step cap for greedy policy replay
    pub policy_steps: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            episodes: 100,
            snapshot_interval: 5,
            policy_steps: 100,
        }
    }
}

impl SessionConfig {
    /// Validate the agent config and the session counters
    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        if self.snapshot_interval == 0 {
            return Err(RLError::Config("snapshot_interval must be positive".to_string()));
        }
        Ok(())
    }
}

/// Bookkeeping for one finished training episode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeStats {
    /// 1-based episode number
    pub episode: usize,
    /// Undiscounted reward
    pub total_reward: f64,
    /// Steps taken
    pub steps: usize,
    /// When the episode finished
    pub timestamp: DateTime<Utc>,
}

/// What an observer sees at each progress report
#[derive(Debug)]
pub struct Progress<'a, A: Action> {
    /// Episodes completed so far (planners report their iteration count)
    pub episode: usize,
    /// Episodes requested
    pub episodes: usize,
    /// Total reward of every completed episode
    pub reward_history: &'a [f64],
    /// Tables as of this report
    pub snapshot: &'a Snapshot<A>,
}

/// Result of [`TrainingSession::train`]
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    /// Session the run belongs to
    pub session_id: Uuid,
    /// Algorithm trained
    pub algorithm: AlgorithmKind,
    /// Environment name
    pub environment: String,
    /// Episodes run (0 for planners)
    pub episodes: usize,
    /// Planner outcome, if a planner ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanReport>,
    /// Reward of the last episode
    pub final_reward: Option<f64>,
    /// Mean reward over this run's episodes
    pub mean_reward: Option<f64>,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub finished_at: DateTime<Utc>,
}

/// Greedy replay of the snapshot policy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyRun<A: Action> {
    /// Visited states, starting with the reset state
    pub states: Vec<StateKey>,
    /// Actions taken
    pub actions: Vec<A>,
    /// Reward of every step
    pub rewards: Vec<f64>,
    /// Undiscounted reward
    pub total_reward: f64,
    /// Steps taken
    pub steps: usize,
    /// Whether the replay ended the episode
    pub done: bool,
}

impl<A: Action> PolicyRun<A> {
    /// Discounted return of the replay
    #[must_use]
    pub fn discounted_return(&self, gamma: f64) -> f64 {
        self.rewards.iter().rev().fold(0.0, |g, r| r + gamma * g)
    }
}

/// Result of [`TrainingSession::step_agent`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome<A: Action> {
    /// Action taken
    pub action: A,
    /// Environment response
    pub step: Step,
    /// Steps taken since the live episode began
    pub steps: usize,
    /// Reward accumulated since the live episode began
    pub total_reward: f64,
}

/// An environment and an agent trained on it
pub struct TrainingSession<E: Environment + 'static> {
    id: Uuid,
    env: E,
    algorithm: AlgorithmKind,
    config: SessionConfig,
    agent: AgentHandle<E>,
    snapshot: Snapshot<E::Action>,
    reward_history: Vec<f64>,
    stats: Vec<EpisodeStats>,
    live_steps: usize,
    live_reward: f64,
    live_done: bool,
}

impl<E: Environment + 'static> TrainingSession<E> {
    /// Create a session with an untrained agent
    pub fn new(mut env: E, algorithm: AlgorithmKind, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let agent = make_agent(algorithm, &config.agent)?;
        env.reset();

        let id = Uuid::new_v4();
        info!(session = %id, env = env.name(), %algorithm, "training session created");
        Ok(Self {
            id,
            env,
            algorithm,
            config,
            agent,
            snapshot: Snapshot::default(),
            reward_history: Vec::new(),
            stats: Vec::new(),
            live_steps: 0,
            live_reward: 0.0,
            live_done: false,
        })
    }

    /// Train the agent, calling `observer` at every progress report
    ///
    /// Each call starts a fresh reward history. Planners run their full
    /// iteration budget once and report once. Learners run `episodes`
    /// episodes and report after the first, then every `snapshot_interval`
    /// episodes, and after the last one.
    pub fn train<F>(&mut self, mut observer: F) -> Result<TrainingSummary>
    where
        F: FnMut(&Progress<'_, E::Action>),
    {
        let started_at = Utc::now();
        let episodes = self.config.episodes;
        let mut plan = None;
        self.reward_history.clear();
        self.stats.clear();

        match &mut self.agent {
            AgentHandle::Planner(agent) => {
                let report = agent.train(&self.env, self.config.agent.plan_iterations)?;
                self.snapshot = agent.snapshot();
                plan = Some(report);
                observer(&Progress {
                    episode: report.iterations,
                    episodes: self.config.agent.plan_iterations,
                    reward_history: &self.reward_history,
                    snapshot: &self.snapshot,
                });
            }
            AgentHandle::Learner(agent) => {
                for episode in 1..=episodes {
                    let report = agent.train_episode(&mut self.env)?;
                    self.reward_history.push(report.total_reward);
                    self.stats.push(EpisodeStats {
                        episode,
                        total_reward: report.total_reward,
                        steps: report.steps,
                        timestamp: Utc::now(),
                    });
                    debug!(
                        episode,
                        total_reward = report.total_reward,
                        steps = report.steps,
                        done = report.done,
                        "episode trained"
                    );

                    if (episode - 1) % self.config.snapshot_interval == 0 || episode == episodes {
                        self.snapshot = agent.snapshot();
                        observer(&Progress {
                            episode,
                            episodes,
                            reward_history: &self.reward_history,
                            snapshot: &self.snapshot,
                        });
                    }
                }
            }
        }

        self.restart_live();
        let run = &self.reward_history;
        #[allow(clippy::cast_precision_loss)]
        let mean_reward = (!run.is_empty()).then(|| run.iter().sum::<f64>() / run.len() as f64);
        let summary = TrainingSummary {
            session_id: self.id,
            algorithm: self.algorithm,
            environment: self.env.name().to_string(),
            episodes: run.len(),
            plan,
            final_reward: run.last().copied(),
            mean_reward,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            session = %self.id,
            episodes = summary.episodes,
            final_reward = ?summary.final_reward,
            "training finished"
        );
        Ok(summary)
    }

    /// Replay the snapshot policy greedily from a fresh episode
    ///
    /// Stops when the episode ends, when `max_steps` steps were taken, or
    /// when the current state has no policy entry.
    pub fn run_policy(&mut self, max_steps: usize) -> Result<PolicyRun<E::Action>> {
        let mut state = self.env.reset();
        let mut run = PolicyRun {
            states: vec![state.clone()],
            actions: Vec::new(),
            rewards: Vec::new(),
            total_reward: 0.0,
            steps: 0,
            done: false,
        };

        for _ in 0..max_steps {
            let Some(action) = self.snapshot.policy.get(&state) else {
                debug!(%state, "no policy entry; replay stops");
                break;
            };
            let step = self.env.step(action)?;
            run.total_reward += step.reward.0;
            run.steps += 1;
            run.actions.push(action);
            run.rewards.push(step.reward.0);
            run.states.push(step.state.clone());
            state = step.state;

            if step.done {
                run.done = true;
                break;
            }
        }

        self.live_steps = run.steps;
        self.live_reward = run.total_reward;
        self.live_done = run.done;
        info!(steps = run.steps, total_reward = run.total_reward, done = run.done, "policy replayed");
        Ok(run)
    }

    /// Take one live step with the snapshot policy
    ///
    /// Falls back to the environment's default action for states without a
    /// policy entry. A step after the episode ended starts a new one.
    pub fn step_agent(&mut self) -> Result<StepOutcome<E::Action>> {
        if self.live_done {
            self.restart_live();
        }
        let state = self.env.current_state();
        let action = match self.snapshot.policy.get(&state) {
            Some(action) => action,
            None => default_action(&self.env)?,
        };

        let step = self.env.step(action)?;
        self.live_steps += 1;
        self.live_reward += step.reward.0;
        self.live_done = step.done;
        Ok(StepOutcome {
            action,
            step,
            steps: self.live_steps,
            total_reward: self.live_reward,
        })
    }

    /// Discard the agent's tables and history and start over
    pub fn reset(&mut self) -> Result<()> {
        self.agent = make_agent(self.algorithm, &self.config.agent)?;
        self.snapshot = Snapshot::default();
        self.reward_history.clear();
        self.stats.clear();
        self.restart_live();
        info!(session = %self.id, "session reset");
        Ok(())
    }

    fn restart_live(&mut self) {
        self.env.reset();
        self.live_steps = 0;
        self.live_reward = 0.0;
        self.live_done = false;
    }

    /// Session identifier
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Algorithm in use
    #[must_use]
    pub fn algorithm(&self) -> AlgorithmKind {
        self.algorithm
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The environment
    #[must_use]
    pub fn env(&self) -> &E {
        &self.env
    }

    /// The agent
    #[must_use]
    pub fn agent(&self) -> &AgentHandle<E> {
        &self.agent
    }

    /// Tables as of the last progress report
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot<E::Action> {
        &self.snapshot
    }

    /// Reward of every episode of the last training run
    #[must_use]
    pub fn reward_history(&self) -> &[f64] {
        &self.reward_history
    }

    /// Per-episode bookkeeping of the last training run
    #[must_use]
    pub fn episode_stats(&self) -> &[EpisodeStats] {
        &self.stats
    }
}
