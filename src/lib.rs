//! Maximum Entropy inverse reinforcement learning on a stochastic gridworld.
//!
//! The crate is organised bottom-up:
//!
//! - [`mdp`]: grid geometry, the noisy gridworld and its transition model,
//!   and value iteration.
//! - [`irl`]: expert demonstration sampling, state feature maps and the
//!   MaxEnt IRL learner.
//! - [`experiment`]: the end-to-end pipeline (ground truth, demonstrations,
//!   recovery, re-evaluation) and [`report`] for rendering its maps.
//!
//! ```
//! use maxent_irl::experiment::{run_experiment, ExperimentConfig};
//!
//! let config = ExperimentConfig {
//!     n_trajs: 10,
//!     n_iters: 2,
//!     ..ExperimentConfig::default()
//! };
//! let report = run_experiment(&config).unwrap();
//! assert_eq!(report.rewards.len(), 25);
//! ```

pub mod error;
pub mod experiment;
pub mod irl;
pub mod mdp;
pub mod report;

pub use error::{IrlError, Result};
