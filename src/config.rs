/// Parameters of a `GridEnv`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvConfig {
    pub size: usize,
    /// Fixed RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Number of history entries kept per episode. `None` keeps everything,
    /// `Some(0)` disables recording.
    pub history_limit: Option<usize>,
    pub goal_reward: f32,
    pub step_penalty: f32,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            size: 5,
            seed: None,
            history_limit: None,
            goal_reward: 10.0,
            step_penalty: -0.1,
        }
    }
}

impl EnvConfig {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn rewards(mut self, goal_reward: f32, step_penalty: f32) -> Self {
        self.goal_reward = goal_reward;
        self.step_penalty = step_penalty;
        self
    }
}

/// Hyper-parameters of the tabular Q-learning loop.
#[derive(Debug, Clone, PartialEq)]
pub struct QLearningParams {
    pub step_size: f32,
    pub discount: f32,
    pub episodes: usize,
    /// Episodes are truncated after this many steps.
    pub max_steps: usize,
    /// Log a checkpoint every `report_every` episodes; 0 disables it.
    pub report_every: usize,
}

impl Default for QLearningParams {
    fn default() -> Self {
        Self {
            step_size: 0.1,
            discount: 0.9,
            episodes: 2000,
            max_steps: 200,
            report_every: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = EnvConfig::new(3).seed(7).history_limit(4).rewards(1.0, -1.0);
        assert_eq!(config.size, 3);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.history_limit, Some(4));
        assert_eq!(config.goal_reward, 1.0);
        assert_eq!(config.step_penalty, -1.0);
    }

    #[test]
    fn default_rewards() {
        let config = EnvConfig::default();
        assert_eq!(config.goal_reward, 10.0);
        assert_eq!(config.step_penalty, -0.1);
        assert_eq!(config.history_limit, None);
    }
}
