use ndarray::Array3;
use tracing::info;

use crate::environment::{GridEnv, Movement, Pos};
use crate::error::{EnvError, Result};
use crate::policy::Policy;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Pos,
    pub movement: Movement,
    pub reward: f32,
    pub to: Pos,
}

/// How frames are captured while an episode runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    pub pixel_size: usize,
    pub with_history: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EpisodeReport {
    pub transitions: Vec<Transition>,
    pub total_reward: f32,
    pub reached_goal: bool,
    /// Starting frame followed by one frame per step.
    pub frames: Vec<Array3<u8>>,
}

impl EpisodeReport {
    pub fn steps(&self) -> usize {
        self.transitions.len()
    }
}

pub struct Agent {
    pub max_steps: usize,
    pub capture: Option<Capture>,
}

impl Agent {
    pub fn new(max_steps: usize) -> Self
    {
        Self {
            max_steps,
            capture: None,
        }
    }

    pub fn capturing(mut self, pixel_size: usize, with_history: bool) -> Self {
        self.capture = Some(Capture { pixel_size, with_history });
        self
    }

    /// Resets the environment and plays one episode with `policy`.
    pub fn run_episode(&self, env: &mut GridEnv, policy: &mut dyn Policy) -> Result<EpisodeReport> {
        env.reset();
        self.play(env, policy)
    }

    /// Plays from the environment's current state until the goal is reached
    /// or `max_steps` run out. Fails with `EpisodeFinished` if the goal was
    /// already reached and the environment not reset since.
    pub fn play(&self, env: &mut GridEnv, policy: &mut dyn Policy) -> Result<EpisodeReport>
    {
        if env.is_done() {
            return Err(EnvError::EpisodeFinished);
        }
        let mut report = EpisodeReport::default();
        self.snapshot(env, &mut report)?;

        while report.steps() < self.max_steps {
            let from = env.agent();
            let movement = policy.choose(&env.observation());
            let step = env.step(movement)?;
            report.total_reward += step.reward;
            report.transitions.push(Transition {
                from,
                movement,
                reward: step.reward,
                to: env.agent(),
            });
            self.snapshot(env, &mut report)?;

            if step.done {
                report.reached_goal = true;
                break;
            }
        }

        if report.reached_goal {
            info!(steps = report.steps(), reward = report.total_reward, "goal reached");
        } else {
            info!(steps = report.steps(), reward = report.total_reward, "episode truncated");
        }
        Ok(report)
    }

    fn snapshot(&self, env: &GridEnv, report: &mut EpisodeReport) -> Result<()> {
        if let Some(capture) = self.capture {
            report.frames.push(env.render(capture.pixel_size, capture.with_history)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvConfig;
    use crate::policy::{GreedyPolicy, RandomPolicy};

    fn env(size: usize) -> GridEnv {
        GridEnv::new(EnvConfig::new(size).seed(11)).unwrap()
    }

    #[test]
    fn greedy_takes_manhattan_distance() {
        let mut env = env(5);
        env.reset_to(Pos::new(0, 0), Pos::new(3, 2)).unwrap();
        let report = Agent::new(100).play(&mut env, &mut GreedyPolicy).unwrap();
        assert!(report.reached_goal);
        assert_eq!(report.steps(), 5);
        let expected = 4.0 * -0.1 + 10.0;
        assert!((report.total_reward - expected).abs() < 1e-5);
        assert_eq!(report.transitions.last().unwrap().to, Pos::new(3, 2));
    }

    #[test]
    fn truncates_at_max_steps() {
        let mut env = env(6);
        env.reset_to(Pos::new(0, 0), Pos::new(5, 5)).unwrap();
        let report = Agent::new(3).play(&mut env, &mut GreedyPolicy).unwrap();
        assert!(!report.reached_goal);
        assert_eq!(report.steps(), 3);
        assert!(!env.is_done());
    }

    #[test]
    fn captures_one_frame_per_step() {
        let mut env = env(4);
        env.reset_to(Pos::new(0, 0), Pos::new(2, 0)).unwrap();
        let report = Agent::new(10)
            .capturing(2, true)
            .play(&mut env, &mut GreedyPolicy)
            .unwrap();
        assert_eq!(report.steps(), 2);
        assert_eq!(report.frames.len(), 3);
        assert!(report.frames.iter().all(|f| f.dim() == (8, 8, 3)));
    }

    #[test]
    fn play_twice_without_reset_fails() {
        let mut env = env(3);
        env.reset_to(Pos::new(0, 0), Pos::new(1, 0)).unwrap();
        let agent = Agent::new(10);
        let first = agent.play(&mut env, &mut GreedyPolicy).unwrap();
        assert!(first.reached_goal);
        assert_eq!(first.steps(), 1);
        assert_eq!(
            agent.play(&mut env, &mut GreedyPolicy).err(),
            Some(EnvError::EpisodeFinished)
        );

        let again = agent.run_episode(&mut env, &mut GreedyPolicy).unwrap();
        assert_eq!(again.reached_goal, env.is_done());
    }

    #[test]
    fn transitions_chain() {
        let mut env = env(5);
        let mut policy = RandomPolicy::seeded(5);
        let report = Agent::new(50).run_episode(&mut env, &mut policy).unwrap();
        for pair in report.transitions.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
        }
        assert_eq!(report.reached_goal, env.is_done());
    }
}
