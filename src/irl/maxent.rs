//! Maximum Entropy inverse reinforcement learning (Ziebart et al., 2008).
//!
//! Rewards are linear in state features, `R = features . theta`. Each
//! iteration
//!
//! 1. runs soft (log-sum-exp) value iteration on the current rewards to get a
//!    stochastic policy `pi(a|s) = exp(Q(s,a) - V(s))`,
//! 2. propagates the empirical start distribution forward through `pi` and
//!    the transition model to get expected state visitation frequencies `mu`,
//! 3. ascends the log-likelihood gradient `features^T (f_expert - mu)`, where
//!    `f_expert` is the per-trajectory average visit count of each state in
//!    the demonstrations.
//!
//! The loop runs for a fixed number of iterations unless a gradient-norm
//! tolerance is configured.

use log::{debug, info, warn};
use ndarray::{s, Array1, Array2, Array3, Axis};
use rand::Rng;

use crate::error::{IrlError, Result};
use crate::irl::demonstrations::Episode;
use crate::mdp::value_iteration::{q_values, validate_discount, validate_model};

/// Initial value of the reward parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThetaInit {
    /// Independent draws from `U[0, 1)`.
    #[default]
    Uniform,
    Zeros,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaxEntConfig {
    pub learning_rate: f64,
    pub iterations: usize,
    /// Convergence threshold for the soft backward pass.
    pub soft_tolerance: f64,
    pub max_soft_iterations: usize,
    pub theta_init: ThetaInit,
    /// Stop early once the gradient's L2 norm falls below this value.
    pub gradient_tolerance: Option<f64>,
}

impl Default for MaxEntConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            iterations: 20,
            soft_tolerance: 0.01,
            max_soft_iterations: 10_000,
            theta_init: ThetaInit::Uniform,
            gradient_tolerance: None,
        }
    }
}

impl MaxEntConfig {
    pub fn new(learning_rate: f64, iterations: usize) -> Self {
        Self {
            learning_rate,
            iterations,
            ..Self::default()
        }
    }

    pub fn soft_tolerance(mut self, tolerance: f64) -> Self {
        self.soft_tolerance = tolerance;
        self
    }

    pub fn max_soft_iterations(mut self, max_iterations: usize) -> Self {
        self.max_soft_iterations = max_iterations;
        self
    }

    pub fn theta_init(mut self, init: ThetaInit) -> Self {
        self.theta_init = init;
        self
    }

    pub fn gradient_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_tolerance = Some(tolerance);
        self
    }
}

/// Output of [`MaxEntIrl::fit`].
#[derive(Debug, Clone)]
pub struct MaxEntResult {
    /// Recovered per-state rewards, `features . theta`.
    pub rewards: Array1<f64>,
    pub theta: Array1<f64>,
    /// Gradient steps actually applied.
    pub iterations: usize,
    /// L2 norm of the gradient at every evaluated iteration.
    pub gradient_norms: Vec<f64>,
}

/// Soft value function and the induced stochastic policy.
#[derive(Debug, Clone)]
pub struct SoftSolution {
    pub values: Array1<f64>,
    /// `n_states x n_actions`, rows sum to one.
    pub policy: Array2<f64>,
    pub iterations: usize,
}

/// MaxEnt IRL learner.
#[derive(Debug, Clone, Default)]
pub struct MaxEntIrl {
    config: MaxEntConfig,
}

impl MaxEntIrl {
    pub fn new(config: MaxEntConfig) -> Self {
        MaxEntIrl { config }
    }

    pub fn config(&self) -> &MaxEntConfig {
        &self.config
    }

    /// Recovers rewards from `trajs`.
    ///
    /// # Arguments
    /// * `features` - `N x K` feature map
    /// * `transitions` - `N x A x N` transition model
    /// * `gamma` - discount for the soft backward pass
    /// * `trajs` - expert demonstrations
    /// * `rng` - source for the initial parameters
    ///
    /// # Errors
    /// * `DimensionMismatch` if the feature rows or transition axes disagree
    /// * `EmptyDemonstrationSet` if `trajs` is empty
    /// * `InvalidState` if a demonstration visits an unknown state
    /// * `InvalidDiscount` if `gamma` is outside `[0, 1)`
    /// * `InvalidInput` if the learning rate is not finite or the soft tolerance is not positive
    /// * `NumericDivergence` if the soft backup or the update stops being finite;
    ///   the remaining iterations are abandoned
    pub fn fit<R: Rng + ?Sized>(
        &self,
        features: &Array2<f64>,
        transitions: &Array3<f64>,
        gamma: f64,
        trajs: &[Episode],
        rng: &mut R,
    ) -> Result<MaxEntResult> {
        let n_states = transitions.dim().0;
        if features.nrows() != n_states {
            return Err(IrlError::dimension_mismatch(
                "feature map rows",
                n_states,
                features.nrows(),
            ));
        }
        validate_model(transitions, &Array1::zeros(n_states))?;
        validate_discount(gamma)?;
        validate_soft_tolerance(self.config.soft_tolerance)?;
        if !self.config.learning_rate.is_finite() {
            return Err(IrlError::invalid_input(format!(
                "learning rate must be finite, got {}",
                self.config.learning_rate
            )));
        }

        let expert = expert_state_frequency(trajs, n_states)?;
        let starts = start_distribution(trajs, n_states)?;
        let horizon = trajs.iter().map(Vec::len).max().unwrap_or(0);
        // Empirical feature expectations, features^T f_expert.
        let expert_features = features.t().dot(&expert);

        let mut theta = match self.config.theta_init {
            ThetaInit::Uniform => Array1::from_shape_fn(features.ncols(), |_| rng.gen::<f64>()),
            ThetaInit::Zeros => Array1::zeros(features.ncols()),
        };
        let mut gradient_norms = Vec::with_capacity(self.config.iterations);
        let mut applied = 0;

        for iteration in 0..self.config.iterations {
            let rewards = features.dot(&theta);
            let soft = soft_value_iteration(
                transitions,
                &rewards,
                gamma,
                self.config.soft_tolerance,
                self.config.max_soft_iterations,
            )
            .map_err(|e| match e {
                IrlError::NumericDivergence { stage, .. } => {
                    IrlError::NumericDivergence { stage, iteration }
                }
                other => other,
            })?;
            let svf = state_visitation_frequency(transitions, &soft.policy, &starts, horizon)?;

            let gradient = &expert_features - &features.t().dot(&svf);
            let norm = gradient.dot(&gradient).sqrt();
            gradient_norms.push(norm);
            info!("maxent iteration {}: gradient norm {:.4}", iteration, norm);

            if let Some(tolerance) = self.config.gradient_tolerance {
                if norm < tolerance {
                    debug!("gradient norm below {} after {} steps", tolerance, applied);
                    break;
                }
            }

            theta.scaled_add(self.config.learning_rate, &gradient);
            if theta.iter().any(|v| !v.is_finite()) {
                return Err(IrlError::NumericDivergence {
                    stage: "gradient update",
                    iteration,
                });
            }
            applied += 1;
        }

        Ok(MaxEntResult {
            rewards: features.dot(&theta),
            theta,
            iterations: applied,
            gradient_norms,
        })
    }
}

/// Soft value iteration: `V(s) = log sum_a exp(Q(s, a))` with
/// `Q = R + gamma * P V`, iterated from `V = 0` until the largest change
/// drops below `tolerance`.
///
/// # Errors
/// * `DimensionMismatch` / `InvalidDiscount` for malformed inputs
/// * `InvalidInput` if `tolerance` is not positive
/// * `NumericDivergence` if a backup produces a non-finite value
pub fn soft_value_iteration(
    transitions: &Array3<f64>,
    rewards: &Array1<f64>,
    gamma: f64,
    tolerance: f64,
    max_iterations: usize,
) -> Result<SoftSolution> {
    validate_model(transitions, rewards)?;
    validate_discount(gamma)?;
    validate_soft_tolerance(tolerance)?;

    let mut values = Array1::<f64>::zeros(rewards.len());
    let mut iterations = 0;
    loop {
        let q = q_values(transitions, rewards, &values, gamma);
        let updated = log_sum_exp_rows(&q);
        if updated.iter().any(|v| !v.is_finite()) {
            return Err(IrlError::NumericDivergence {
                stage: "soft value iteration",
                iteration: iterations,
            });
        }
        let delta = (&updated - &values)
            .iter()
            .fold(0.0_f64, |d, &x| d.max(x.abs()));
        values = updated;
        iterations += 1;
        if delta < tolerance {
            break;
        }
        if iterations >= max_iterations {
            warn!(
                "soft value iteration hit the {} sweep cap with delta = {:.3e}",
                max_iterations, delta
            );
            break;
        }
    }

    let q = q_values(transitions, rewards, &values, gamma);
    let normaliser = log_sum_exp_rows(&q);
    let policy = (&q - &normaliser.insert_axis(Axis(1))).mapv(f64::exp);
    Ok(SoftSolution {
        values,
        policy,
        iterations,
    })
}

/// Expected state visitation counts over `horizon` steps.
///
/// `mu_0` is `start`; `mu_{t+1}(s') = sum_{s,a} mu_t(s) pi(a|s) P(s'|s,a)`.
/// Returns `sum_{t < horizon} mu_t`.
///
/// # Errors
/// * `DimensionMismatch` if the policy or start distribution do not match the model
pub fn state_visitation_frequency(
    transitions: &Array3<f64>,
    policy: &Array2<f64>,
    start: &Array1<f64>,
    horizon: usize,
) -> Result<Array1<f64>> {
    let (n, n_actions, _) = transitions.dim();
    if policy.dim() != (n, n_actions) {
        return Err(IrlError::dimension_mismatch(
            "policy entries",
            n * n_actions,
            policy.len(),
        ));
    }
    if start.len() != n {
        return Err(IrlError::dimension_mismatch("start distribution", n, start.len()));
    }

    let mut total = Array1::<f64>::zeros(n);
    let mut mu = start.clone();
    for t in 0..horizon {
        total += &mu;
        if t + 1 == horizon {
            break;
        }
        let mut next = Array1::<f64>::zeros(n);
        for a in 0..n_actions {
            let weights = &mu * &policy.column(a);
            next += &weights.dot(&transitions.slice(s![.., a, ..]));
        }
        mu = next;
    }
    Ok(total)
}

/// Average number of visits to each state per demonstration, counting the
/// `cur_state` of every step.
///
/// The terminal `next_state` of an episode that ends early is not counted,
/// and nothing is added for the steps it did not take. The forward pass in
/// [`state_visitation_frequency`] keeps mass in an absorbing terminal until
/// the horizon, so with terminal states the two totals differ.
///
/// # Errors
/// * `EmptyDemonstrationSet` if `trajs` is empty
/// * `InvalidState` if a step names a state outside `0..n_states`
pub fn expert_state_frequency(trajs: &[Episode], n_states: usize) -> Result<Array1<f64>> {
    if trajs.is_empty() {
        return Err(IrlError::EmptyDemonstrationSet);
    }
    let mut counts = Array1::<f64>::zeros(n_states);
    for step in trajs.iter().flatten() {
        if step.cur_state >= n_states {
            return Err(IrlError::InvalidState {
                state: step.cur_state,
                n_states,
            });
        }
        counts[step.cur_state] += 1.0;
    }
    Ok(counts / trajs.len() as f64)
}

/// Empirical distribution of episode start states.
///
/// # Errors
/// * `EmptyDemonstrationSet` if `trajs` is empty
/// * `InvalidInput` if an episode has no steps
/// * `InvalidState` if a start state is outside `0..n_states`
pub fn start_distribution(trajs: &[Episode], n_states: usize) -> Result<Array1<f64>> {
    if trajs.is_empty() {
        return Err(IrlError::EmptyDemonstrationSet);
    }
    let mut starts = Array1::<f64>::zeros(n_states);
    for (i, episode) in trajs.iter().enumerate() {
        let first = episode
            .first()
            .ok_or_else(|| IrlError::invalid_input(format!("demonstration {} is empty", i)))?;
        if first.cur_state >= n_states {
            return Err(IrlError::InvalidState {
                state: first.cur_state,
                n_states,
            });
        }
        starts[first.cur_state] += 1.0;
    }
    Ok(starts / trajs.len() as f64)
}

fn validate_soft_tolerance(tolerance: f64) -> Result<()> {
    if tolerance <= 0.0 || tolerance.is_nan() {
        return Err(IrlError::invalid_input(format!(
            "soft tolerance must be positive, got {}",
            tolerance
        )));
    }
    Ok(())
}

fn log_sum_exp_rows(q: &Array2<f64>) -> Array1<f64> {
    q.map_axis(Axis(1), |row| {
        let max = row.fold(f64::NEG_INFINITY, |m, &x| m.max(x));
        if !max.is_finite() {
            return max;
        }
        max + row.iter().map(|&x| (x - max).exp()).sum::<f64>().ln()
    })
}
