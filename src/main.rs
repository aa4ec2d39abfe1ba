use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use csv::Writer;
use tracing::{info, Level};

use grid_world::agent::{Agent, EpisodeReport};
use grid_world::policy::{GreedyPolicy, Policy, RandomPolicy};
use grid_world::rl::{q_learning, EpsilonGreedy};
use grid_world::visual::{stack_images, to_rgb_image, StackOptions};
use grid_world::{EnvConfig, GridEnv, QLearningParams};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyKind {
    Random,
    Greedy,
    Qlearning,
}

/// Plays one grid world episode and dumps its frames and trajectory.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    #[arg(long, default_value_t = 5)]
    size: usize,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum, default_value = "greedy")]
    policy: PolicyKind,
    #[arg(long, default_value_t = 100)]
    max_steps: usize,
    /// Training episodes for the q-learning policy
    #[arg(long, default_value_t = 2000)]
    episodes: usize,
    #[arg(long, default_value_t = 0.1)]
    epsilon: f32,
    #[arg(long, default_value_t = 16)]
    pixel_size: usize,
    #[arg(long)]
    history_limit: Option<usize>,
    /// PNG file receiving every frame of the episode side by side
    #[arg(long)]
    frames: Option<PathBuf>,
    /// CSV file receiving one row per step
    #[arg(long)]
    trajectory: Option<PathBuf>,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn write_trajectory(path: &Path, report: &EpisodeReport) -> anyhow::Result<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(&["step", "from_x", "from_y", "action", "reward", "to_x", "to_y"])?;
    for (i, t) in report.transitions.iter().enumerate() {
        wtr.write_record(&[
            i.to_string(),
            t.from.x.to_string(),
            t.from.y.to_string(),
            t.movement.code().to_string(),
            t.reward.to_string(),
            t.to.x.to_string(),
            t.to.y.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = EnvConfig::new(args.size);
    config.seed = args.seed;
    config.history_limit = args.history_limit;
    let mut env = GridEnv::new(config)?;

    let mut policy: Box<dyn Policy> = match args.policy {
        PolicyKind::Random => Box::new(match args.seed {
            Some(seed) => RandomPolicy::seeded(seed),
            None => RandomPolicy::new(),
        }),
        PolicyKind::Greedy => Box::new(GreedyPolicy),
        PolicyKind::Qlearning => {
            let params = QLearningParams {
                episodes: args.episodes,
                max_steps: args.max_steps,
                ..QLearningParams::default()
            };
            let mut exploration = EpsilonGreedy::new(args.epsilon, args.seed.unwrap_or(0));
            let (policy, returns) = q_learning(&mut env, &mut exploration, &params)?;
            let tail = returns.len().min(100);
            let mean = returns[returns.len() - tail..].iter().sum::<f32>() / tail.max(1) as f32;
            info!(episodes = returns.len(), mean_return = mean, "training finished");
            Box::new(policy)
        }
    };

    let mut agent = Agent::new(args.max_steps);
    if args.frames.is_some() {
        agent = agent.capturing(args.pixel_size, true);
    }
    let report = agent.run_episode(&mut env, policy.as_mut())?;
    println!(
        "Finished after {} steps with reward {} (goal reached: {})",
        report.steps(),
        report.total_reward,
        report.reached_goal
    );

    if let Some(path) = &args.frames {
        let strip = stack_images(&report.frames, StackOptions::default())?;
        to_rgb_image(&strip)?
            .save(path)
            .with_context(|| format!("writing frames to {}", path.display()))?;
        info!(path = %path.display(), frames = report.frames.len(), "frames written");
    }
    if let Some(path) = &args.trajectory {
        write_trajectory(path, &report)
            .with_context(|| format!("writing trajectory to {}", path.display()))?;
        info!(path = %path.display(), "trajectory written");
    }
    Ok(())
}
