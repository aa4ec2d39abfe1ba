use std::collections::VecDeque;
use std::convert::TryFrom;
use rand::{
    distributions::{Distribution, Standard},
    rngs::StdRng,
    FromEntropy,
    Rng,
    SeedableRng,
};
use ndarray::{Array1, Array3};
use tracing::{debug, trace};

use crate::config::EnvConfig;
use crate::error::{EnvError, Result};
use crate::visual;

pub const BACKGROUND: [u8; 3] = [0, 0, 0];
pub const HISTORY_COLOR: [u8; 3] = [0, 0, 128];
pub const AGENT_COLOR: [u8; 3] = [255, 0, 0];
pub const GOAL_COLOR: [u8; 3] = [0, 255, 0];

// Action
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Movement {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }
}

impl Movement {
    /// `(dx, dy)` with y growing upwards.
    pub fn into_vector(self) -> (isize, isize)
    {
        match self {
            Movement::Up    => ( 0, 1),
            Movement::Down  => ( 0,-1),
            Movement::Left  => (-1, 0),
            Movement::Right => ( 1, 0),
        }
    }

    pub fn actions() -> Vec<Movement> {
        vec![Movement::Up, Movement::Down, Movement::Left, Movement::Right]
    }

    pub fn code(self) -> i64 {
        match self {
            Movement::Up    => 0,
            Movement::Down  => 1,
            Movement::Left  => 2,
            Movement::Right => 3,
        }
    }
}

impl TryFrom<i64> for Movement {
    type Error = EnvError;

    fn try_from(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Movement::Up),
            1 => Ok(Movement::Down),
            2 => Ok(Movement::Left),
            3 => Ok(Movement::Right),
            other => Err(EnvError::InvalidAction(other)),
        }
    }
}

impl Distribution<Movement> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Movement {
        match rng.gen_range(0, 4) {
            0 => Movement::Up,
            1 => Movement::Down,
            2 => Movement::Left,
            _ => Movement::Right,
        }
    }
}

/// What a policy gets to see: agent and goal coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Observation {
    pub agent_x: usize,
    pub agent_y: usize,
    pub goal_x: usize,
    pub goal_y: usize,
}

impl Observation {
    pub fn agent(&self) -> Pos {
        Pos::new(self.agent_x, self.agent_y)
    }

    pub fn goal(&self) -> Pos {
        Pos::new(self.goal_x, self.goal_y)
    }

    pub fn to_array(&self) -> [usize; 4] {
        [self.agent_x, self.agent_y, self.goal_x, self.goal_y]
    }

    pub fn to_ndarray(&self) -> Array1<usize> {
        Array1::from_vec(self.to_array().to_vec())
    }
}

/// Bounds of the observation vector: `shape` integers in `[low, high]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BoxSpace {
    pub low: usize,
    pub high: usize,
    pub shape: usize,
}

impl BoxSpace {
    pub fn contains(&self, obs: &Observation) -> bool {
        obs.to_array().iter().all(|v| *v >= self.low && *v <= self.high)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DiscreteSpace {
    pub n: usize,
}

/// Extra data returned by `GridEnv::step`.
///
/// `history` is a copy of the episode history, so every step costs time
/// linear in the episode length. Set `EnvConfig::history_limit` to bound it
/// on long episodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepInfo {
    pub history: Vec<Pos>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub observation: Observation,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

/// Square grid where an agent walks towards a goal.
///
/// Both positions are redrawn uniformly on every `reset`, so an episode can
/// start already solved. Stepping after the goal was reached is rejected
/// until the next reset.
pub struct GridEnv {
    config: EnvConfig,
    agent: Pos,
    goal: Pos,
    history: VecDeque<Pos>,
    done: bool,
    rng: StdRng,
}

impl GridEnv {
    pub fn new(config: EnvConfig) -> Result<Self>
    {
        if config.size == 0 {
            return Err(EnvError::InvalidSize(config.size));
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut env = Self {
            config,
            agent: Pos::new(0, 0),
            goal: Pos::new(0, 0),
            history: VecDeque::new(),
            done: false,
            rng,
        };
        env.reset();
        Ok(env)
    }

    pub fn with_size(size: usize) -> Result<Self> {
        Self::new(EnvConfig::new(size))
    }

    pub fn size(&self) -> usize {
        self.config.size
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn agent(&self) -> Pos { self.agent }

    pub fn goal(&self) -> Pos { self.goal }

    pub fn is_done(&self) -> bool { self.done }

    /// Agent positions before each step of the current episode, oldest first.
    pub fn history(&self) -> Vec<Pos> {
        self.history.iter().cloned().collect()
    }

    pub fn observation_space(&self) -> BoxSpace {
        BoxSpace { low: 0, high: self.size() - 1, shape: 4 }
    }

    pub fn action_space(&self) -> DiscreteSpace {
        DiscreteSpace { n: Movement::actions().len() }
    }

    pub fn observation(&self) -> Observation {
        Observation {
            agent_x: self.agent.x,
            agent_y: self.agent.y,
            goal_x: self.goal.x,
            goal_y: self.goal.y,
        }
    }

    fn random_pos(&mut self) -> Pos {
        let size = self.size();
        Pos::new(self.rng.gen_range(0, size), self.rng.gen_range(0, size))
    }

    pub fn reset(&mut self) -> Observation {
        self.agent = self.random_pos();
        self.goal = self.random_pos();
        self.history.clear();
        self.done = false;
        debug!(agent = ?self.agent, goal = ?self.goal, "reset");
        self.observation()
    }

    /// Starts a new episode with the agent and goal at the given cells.
    pub fn reset_to(&mut self, agent: Pos, goal: Pos) -> Result<Observation> {
        for pos in [agent, goal].iter() {
            if !self.contains(*pos) {
                return Err(EnvError::OutOfBounds { pos: *pos, size: self.size() });
            }
        }
        self.agent = agent;
        self.goal = goal;
        self.history.clear();
        self.done = false;
        debug!(agent = ?self.agent, goal = ?self.goal, "reset to fixed positions");
        Ok(self.observation())
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.size() && pos.y < self.size()
    }

    fn check_movement(&self, pos: Pos, movement_vec: (isize, isize)) -> (Pos, bool)
    {
        let last = self.size() as isize - 1;
        let new_pos_x = pos.x as isize + movement_vec.0;
        let new_pos_y = pos.y as isize + movement_vec.1;
        let clamped_x = new_pos_x.max(0).min(last);
        let clamped_y = new_pos_y.max(0).min(last);
        let wall_hit = clamped_x != new_pos_x || clamped_y != new_pos_y;

        (Pos { x: clamped_x as usize, y: clamped_y as usize }, wall_hit)
    }

    fn record(&mut self, pos: Pos) {
        match self.config.history_limit {
            Some(0) => {}
            Some(limit) => {
                if self.history.len() == limit {
                    self.history.pop_front();
                }
                self.history.push_back(pos);
            }
            None => self.history.push_back(pos),
        }
    }

    pub fn step(&mut self, movement: Movement) -> Result<Step>
    {
        if self.done {
            return Err(EnvError::EpisodeFinished);
        }
        let from = self.agent;
        self.record(from);

        let (new_pos, wall_hit) = self.check_movement(from, movement.into_vector());
        self.agent = new_pos;
        self.done = self.agent == self.goal;
        let reward = if self.done {
            self.config.goal_reward
        } else {
            self.config.step_penalty
        };
        trace!(?movement, ?from, to = ?self.agent, wall_hit, reward, done = self.done, "step");

        Ok(Step {
            observation: self.observation(),
            reward,
            done: self.done,
            info: StepInfo { history: self.history() },
        })
    }

    /// Steps with a raw action code, 0 = up, 1 = down, 2 = left, 3 = right.
    pub fn step_code(&mut self, code: i64) -> Result<Step> {
        let movement = Movement::try_from(code)?;
        self.step(movement)
    }

    /// RGB frame of the grid, `size * pixel_size` pixels per side.
    ///
    /// Image row 0 is the top of the grid (largest y). The goal is painted
    /// over the agent, the agent over the history.
    pub fn render(&self, pixel_size: usize, with_history: bool) -> Result<Array3<u8>> {
        if pixel_size == 0 {
            return Err(EnvError::InvalidPixelSize);
        }
        let size = self.size();
        let mut grid = Array3::<u8>::zeros((size, size, 3));
        let mut paint = |pos: Pos, color: [u8; 3]| {
            let row = size - 1 - pos.y; // flipped so y points up
            for (c, v) in color.iter().enumerate() {
                grid[[row, pos.x, c]] = *v;
            }
        };

        if with_history {
            for pos in self.history.iter() {
                paint(*pos, HISTORY_COLOR);
            }
        }
        paint(self.agent, AGENT_COLOR);
        paint(self.goal, GOAL_COLOR);

        visual::upscale(&grid, pixel_size).map_err(|_| EnvError::InvalidPixelSize)
    }
}
