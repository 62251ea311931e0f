//! End-to-end experiment: solve a ground-truth gridworld, sample expert
//! demonstrations from its optimal policy, recover rewards with MaxEnt IRL and
//! re-solve the gridworld under the recovered rewards.

use log::info;
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{IrlError, Result};
use crate::irl::demonstrations::{generate_demonstrations, DemonstrationOptions, Episode, StartMode};
use crate::irl::features::FeatureKind;
use crate::irl::maxent::{MaxEntConfig, MaxEntIrl, ThetaInit};
use crate::irl::normalize;
use crate::mdp::grid::{Coord, Grid};
use crate::mdp::gridworld::GridWorld;
use crate::mdp::value_iteration::{value_iteration, ValueIterationConfig};
use crate::report::Reporter;

/// Parameters of an experiment run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    pub height: usize,
    pub width: usize,
    pub gamma: f64,
    /// Probability of not following the intended action.
    pub act_random: f64,
    pub n_trajs: usize,
    pub l_traj: usize,
    /// Start each demonstration in a random cell instead of the top-left one.
    pub rand_start: bool,
    pub learning_rate: f64,
    pub n_iters: usize,
    pub seed: u64,
    /// Ground-truth reward of the bottom-right cell.
    pub r_max: f64,
    pub vi_tolerance: f64,
    pub features: FeatureKind,
    pub theta_init: ThetaInit,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            height: 5,
            width: 5,
            gamma: 0.8,
            act_random: 0.3,
            n_trajs: 100,
            l_traj: 20,
            rand_start: false,
            learning_rate: 0.01,
            n_iters: 20,
            seed: 1,
            r_max: 1.0,
            vi_tolerance: 0.01,
            features: FeatureKind::Identity,
            theta_init: ThetaInit::Uniform,
        }
    }
}

impl ExperimentConfig {
    pub fn value_iteration_config(&self) -> ValueIterationConfig {
        ValueIterationConfig::new(self.gamma).tolerance(self.vi_tolerance)
    }

    pub fn demonstration_options(&self) -> DemonstrationOptions {
        let start = if self.rand_start {
            StartMode::Random
        } else {
            StartMode::Fixed(Coord::new(0, 0))
        };
        DemonstrationOptions::new(self.n_trajs, self.l_traj).start(start)
    }

    pub fn maxent_config(&self) -> MaxEntConfig {
        MaxEntConfig::new(self.learning_rate, self.n_iters).theta_init(self.theta_init)
    }
}

/// Everything an experiment produces, as per-state vectors.
#[derive(Debug, Clone)]
pub struct ExperimentReport {
    pub grid: Grid,
    pub rewards_gt: Array1<f64>,
    pub values_gt: Array1<f64>,
    pub policy_gt: Array1<usize>,
    pub trajs: Vec<Episode>,
    /// Raw `features . theta` from the learner.
    pub rewards: Array1<f64>,
    /// `rewards` rescaled onto `[0, 1]`.
    pub rewards_normalized: Array1<f64>,
    /// Values of the normalized recovered rewards.
    pub values: Array1<f64>,
    pub policy: Array1<usize>,
    /// Fraction of states where the recovered policy picks the ground-truth action.
    pub agreement: f64,
}

impl ExperimentReport {
    /// The four labelled `height x width` maps of the experiment.
    pub fn maps(&self) -> Result<Vec<(&'static str, Array2<f64>)>> {
        Ok(vec![
            ("Rewards Map - Ground Truth", self.grid.to_map(&self.rewards_gt)?),
            ("Value Map - Ground Truth", self.grid.to_map(&self.values_gt)?),
            ("Reward Map - Recovered", self.grid.to_map(&self.rewards_normalized)?),
            ("Value Map - Recovered", self.grid.to_map(&self.values)?),
        ])
    }

    /// Sends every map to `reporter`.
    pub fn report<R: Reporter + ?Sized>(&self, reporter: &mut R) -> Result<()> {
        for (label, map) in self.maps()? {
            reporter.report(label, &map)?;
        }
        Ok(())
    }
}

/// Ground-truth reward map: `r_max` in the bottom-right cell, zero elsewhere.
pub fn corner_reward_map(grid: &Grid, r_max: f64) -> Array2<f64> {
    let mut map = Array2::zeros((grid.height(), grid.width()));
    map[[grid.height() - 1, grid.width() - 1]] = r_max;
    map
}

/// Fraction of states on which two deterministic policies agree.
///
/// # Errors
/// * `DimensionMismatch` if the policies cover different numbers of states
pub fn policy_agreement(a: &Array1<usize>, b: &Array1<usize>) -> Result<f64> {
    if a.len() != b.len() {
        return Err(IrlError::dimension_mismatch("policy states", a.len(), b.len()));
    }
    if a.is_empty() {
        return Ok(1.0);
    }
    let same = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    Ok(same as f64 / a.len() as f64)
}

/// Runs the full pipeline described by `config`.
///
/// # Errors
/// Propagates any error from grid construction, value iteration, sampling or learning.
pub fn run_experiment(config: &ExperimentConfig) -> Result<ExperimentReport> {
    let grid = Grid::new(config.height, config.width)?;
    let rewards_gt = grid.flatten(&corner_reward_map(&grid, config.r_max))?;
    let world = GridWorld::new(grid, rewards_gt.clone(), &[], config.act_random)?;
    let transitions = world.transition_matrix();
    let vi_config = config.value_iteration_config();

    let solution_gt = value_iteration(transitions, &rewards_gt, &vi_config)?;
    info!(
        "solved ground truth {}x{} gridworld in {} sweeps",
        grid.height(),
        grid.width(),
        solution_gt.iterations
    );

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let trajs = generate_demonstrations(
        &world,
        &solution_gt.policy,
        &config.demonstration_options(),
        &mut rng,
    )?;
    info!("sampled {} expert demonstrations", trajs.len());

    let features = config.features.build(&grid);
    let learner = MaxEntIrl::new(config.maxent_config());
    let learned = learner.fit(&features, transitions, config.gamma, &trajs, &mut rng)?;
    info!(
        "recovered rewards with {} features after {} iterations",
        config.features, learned.iterations
    );

    let rewards_normalized = normalize(&learned.rewards);
    let solution = value_iteration(transitions, &rewards_normalized, &vi_config)?;
    let policy_gt = solution_gt.policy.greedy_actions();
    let policy = solution.policy.greedy_actions();
    let agreement = policy_agreement(&policy_gt, &policy)?;
    info!("recovered policy agrees on {:.0}% of states", agreement * 100.0);

    Ok(ExperimentReport {
        grid,
        rewards_gt,
        values_gt: solution_gt.values,
        policy_gt,
        trajs,
        rewards: learned.rewards,
        rewards_normalized,
        values: solution.values,
        policy,
        agreement,
    })
}
