use std::collections::HashMap;
use rand::{rngs::StdRng, FromEntropy, Rng, SeedableRng};

use crate::environment::{Movement, Observation};

pub trait Policy
{
    fn choose(&mut self, obs: &Observation) -> Movement;
    fn prob(&self, obs: &Observation, movement: &Movement) -> f32;
}

pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy
{
    pub fn new() -> Self
    {
        Self { rng: StdRng::from_entropy() }
    }

    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for RandomPolicy
{
    fn choose(&mut self, _obs: &Observation) -> Movement {
        self.rng.gen()
    }

    fn prob(&self, _obs: &Observation, _movement: &Movement) -> f32 {
        0.25
    }
}

// Walks straight at the goal, covering the longer axis first
pub struct GreedyPolicy;

impl GreedyPolicy {
    fn best(obs: &Observation) -> Movement {
        let dx = obs.goal_x as isize - obs.agent_x as isize;
        let dy = obs.goal_y as isize - obs.agent_y as isize;
        if dx.abs() >= dy.abs() && dx != 0 {
            if dx > 0 { Movement::Right } else { Movement::Left }
        } else if dy > 0 {
            Movement::Up
        } else {
            Movement::Down
        }
    }
}

impl Policy for GreedyPolicy {
    fn choose(&mut self, obs: &Observation) -> Movement {
        Self::best(obs)
    }

    fn prob(&self, obs: &Observation, movement: &Movement) -> f32 {
        if Self::best(obs) == *movement {1.0} else {0.0}
    }
}

// Represents deterministic policy
#[derive(Debug, Clone, Default)]
pub struct DetPolicy {
    pub policy: HashMap<Observation, Movement>,
}

impl DetPolicy {
    pub fn new() -> Self {
        Self { policy: HashMap::new() }
    }

    // Unvisited observations default to going up
    fn action(&self, obs: &Observation) -> Movement {
        self.policy.get(obs).cloned().unwrap_or(Movement::Up)
    }
}

impl Policy for DetPolicy {
    fn choose(&mut self, obs: &Observation) -> Movement {
        self.action(obs)
    }

    fn prob(&self, obs: &Observation, movement: &Movement) -> f32 {
        if self.action(obs) == *movement {1.0} else {0.0}
    }
}
