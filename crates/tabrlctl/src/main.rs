// tabrl control CLI
// Train, inspect and replay tabular reinforcement learning agents

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "tabrlctl")]
#[command(about = "Tabular RL control CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List environments with their algorithms and hyperparameters
    List,

    /// Train an agent and print a summary
    Train(TrainArgs),

    /// Train an agent, then replay its greedy policy
    Run(TrainArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct TrainArgs {
    /// Environment (gridworld, mountaincar)
    #[arg(short, long, default_value = "gridworld")]
    env: String,

    /// Algorithm (value-iteration, policy-iteration, monte-carlo, td, sarsa, q-learning)
    #[arg(short, long, default_value = "value-iteration")]
    algo: String,

    /// Number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Discount factor
    #[arg(long)]
    gamma: Option<f64>,

    /// Step size
    #[arg(long)]
    alpha: Option<f64>,

    /// Exploration rate
    #[arg(long)]
    epsilon: Option<f64>,

    /// Seed for the agent's random source
    #[arg(long)]
    seed: Option<u64>,

    /// JSON session config; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the final snapshot as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a reward graph after training
    #[arg(long)]
    graph: bool,

    /// Step cap for policy replay
    #[arg(long)]
    steps: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => commands::list(),
        Commands::Train(args) => commands::train(&args, false),
        Commands::Run(args) => commands::train(&args, true),
    }
}
