use rand::prelude::*;
use std::collections::hash_map::HashMap;
use tracing::debug;

use crate::config::QLearningParams;
use crate::environment::{GridEnv, Movement, Observation};
use crate::error::Result;
use crate::policy::DetPolicy;

/// Q-values keyed by observation and action, zero when never updated.
#[derive(Debug, Clone, Default)]
pub struct QTable {
    values: HashMap<(Observation, Movement), f32>,
}

impl QTable {
    pub fn new() -> Self {
        Self { values: HashMap::new() }
    }

    pub fn get(&self, state: &Observation, action: Movement) -> f32 {
        self.values.get(&(*state, action)).cloned().unwrap_or(0.0)
    }

    pub fn set(&mut self, state: Observation, action: Movement, value: f32) {
        self.values.insert((state, action), value);
    }

    pub fn best_action(&self, state: &Observation) -> Movement {
        Movement::actions().into_iter().fold(Movement::Up, |a, f| -> Movement {
            if self.get(state, f) > self.get(state, a) { f }
            else { a }
        })
    }

    pub fn best_value(&self, state: &Observation) -> f32 {
        self.get(state, self.best_action(state))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_policy(&self) -> DetPolicy {
        let mut policy = DetPolicy::new();
        for (state, _) in self.values.keys() {
            policy.policy.insert(*state, self.best_action(state));
        }
        policy
    }
}

pub trait ExplorationStrategy {
    fn next_action(&mut self, state: &Observation, q: &QTable) -> Movement;
}

pub struct EpsilonGreedy {
    epsilon: f32,
    rng: StdRng,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f32, seed: u64) -> Self {
        EpsilonGreedy {
            epsilon,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ExplorationStrategy for EpsilonGreedy {
    fn next_action(&mut self, state: &Observation, q: &QTable) -> Movement {
        if self.rng.gen::<f32>() < self.epsilon {
            return self.rng.gen::<Movement>();
        }
        q.best_action(state)
    }
}

pub struct SoftMaxExploration {
    temperature: f32,
    rng: StdRng,
}

impl SoftMaxExploration {
    /// Temperatures below `f32::EPSILON` (including NaN) are raised to it,
    /// which makes the choice greedy.
    pub fn new(temperature: f32, seed: u64) -> Self {
        SoftMaxExploration {
            temperature: temperature.max(std::f32::EPSILON),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ExplorationStrategy for SoftMaxExploration {
    fn next_action(&mut self, state: &Observation, q: &QTable) -> Movement {
        let actions = Movement::actions();
        // shift by the max before exp() to keep it finite
        let top = q.best_value(state);
        let logits: Vec<f32> = actions.iter().map(
            |a| ((q.get(state, *a) - top) / self.temperature).exp()).collect();
        let z: f32 = logits.iter().sum();
        let p: f32 = self.rng.gen::<f32>() * z;
        let mut p_sum = 0.0;
        for (a, l) in actions.iter().zip(logits.iter()) {
            p_sum += l;
            if p < p_sum {
                return *a;
            }
        }
        actions[actions.len() - 1]
    }
}

/// Tabular Q-learning. Returns the greedy policy and the return of every
/// training episode.
pub fn q_learning(env: &mut GridEnv, exploration: &mut dyn ExplorationStrategy, params: &QLearningParams)
                  -> Result<(DetPolicy, Vec<f32>)>
{
    let mut q = QTable::new();
    let mut returns = Vec::with_capacity(params.episodes);

    for episode_num in 0..params.episodes {
        let mut s = env.reset();
        let mut episode_return = 0.0;

        for _ in 0..params.max_steps {
            let a = exploration.next_action(&s, &q);
            let step = env.step(a)?;
            episode_return += step.reward;
            let s_p = step.observation;

            // Temporal difference, terminal states have no future value
            let future = if step.done { 0.0 } else { q.best_value(&s_p) };
            let t_d = step.reward + params.discount * future - q.get(&s, a);
            q.set(s, a, q.get(&s, a) + params.step_size * t_d);

            s = s_p;
            if step.done {
                break;
            }
        }
        returns.push(episode_return);

        if params.report_every > 0 && (episode_num + 1) % params.report_every == 0 {
            let window = &returns[returns.len() - params.report_every..];
            let mean = window.iter().sum::<f32>() / window.len() as f32;
            debug!(episode = episode_num + 1, mean_return = mean, states = q.len(), "training checkpoint");
        }
    }

    Ok((q.to_policy(), returns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::config::EnvConfig;
    use crate::environment::Pos;

    fn obs(agent: (usize, usize), goal: (usize, usize)) -> Observation {
        Observation { agent_x: agent.0, agent_y: agent.1, goal_x: goal.0, goal_y: goal.1 }
    }

    #[test]
    fn best_action_picks_max() {
        let mut q = QTable::new();
        let s = obs((0, 0), (1, 0));
        q.set(s, Movement::Left, 0.5);
        q.set(s, Movement::Right, 2.0);
        assert_eq!(q.best_action(&s), Movement::Right);
        assert_eq!(q.best_value(&s), 2.0);
        assert_eq!(q.to_policy().policy[&s], Movement::Right);
    }

    #[test]
    fn greedy_exploration_without_epsilon() {
        let mut q = QTable::new();
        let s = obs((1, 1), (1, 0));
        q.set(s, Movement::Down, 1.0);
        let mut strategy = EpsilonGreedy::new(0.0, 1);
        for _ in 0..10 {
            assert_eq!(strategy.next_action(&s, &q), Movement::Down);
        }
    }

    #[test]
    fn cold_softmax_is_greedy() {
        let mut q = QTable::new();
        let s = obs((1, 1), (2, 1));
        q.set(s, Movement::Right, 5.0);
        let mut strategy = SoftMaxExploration::new(0.01, 2);
        for _ in 0..20 {
            assert_eq!(strategy.next_action(&s, &q), Movement::Right);
        }
    }

    #[test]
    fn zero_temperature_softmax_is_greedy() {
        let mut q = QTable::new();
        let s = obs((2, 2), (2, 0));
        q.set(s, Movement::Down, 1.0);
        for temperature in [0.0, -1.0, std::f32::NAN].iter() {
            let mut strategy = SoftMaxExploration::new(*temperature, 3);
            for _ in 0..20 {
                assert_eq!(strategy.next_action(&s, &q), Movement::Down);
            }
        }
    }

    #[test]
    fn learns_to_reach_goal_on_small_grid() {
        let mut env = GridEnv::new(EnvConfig::new(3).seed(9).history_limit(0)).unwrap();
        let mut strategy = EpsilonGreedy::new(0.2, 4);
        let params = QLearningParams {
            episodes: 5000,
            max_steps: 50,
            step_size: 0.5,
            report_every: 0,
            ..QLearningParams::default()
        };
        let (mut policy, returns) = q_learning(&mut env, &mut strategy, &params).unwrap();
        assert_eq!(returns.len(), 5000);

        env.reset_to(Pos::new(0, 0), Pos::new(2, 2)).unwrap();
        let report = Agent::new(20).play(&mut env, &mut policy).unwrap();
        assert!(report.reached_goal);
        assert_eq!(report.steps(), 4);
    }
}
