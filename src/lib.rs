//! A small grid world for reinforcement learning experiments.
//!
//! [`GridEnv`] follows the usual episodic contract (`reset`, then `step`
//! until `done`) and renders itself into RGB frames that [`visual`] can lay
//! out side by side.

pub mod agent;
pub mod config;
pub mod environment;
pub mod error;
pub mod policy;
pub mod rl;
pub mod visual;

pub use crate::config::{EnvConfig, QLearningParams};
pub use crate::environment::{GridEnv, Movement, Observation, Pos, Step, StepInfo};
pub use crate::error::{EnvError, VisualError};
