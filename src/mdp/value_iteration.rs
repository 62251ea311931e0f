//! Value iteration over a tabular transition model.
//!
//! Solves the Bellman optimality equations
//!
//! ```text
//! V(s) = max_a [ R(s) + gamma * sum_{s'} P(s'|s,a) V(s') ]
//! ```
//!
//! by fixed-point iteration from `V = 0`, then extracts either a greedy policy
//! or a Boltzmann distribution over the one-step lookahead values.

use log::{debug, warn};
use ndarray::{s, Array1, Array2, Array3, Axis};

use crate::error::{IrlError, Result};

/// How a policy is read off the converged value function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolicyExtraction {
    /// Argmax of the lookahead, ties broken by lowest action index.
    Deterministic,
    /// `softmax(Q(s, .) / temperature)`.
    Boltzmann { temperature: f64 },
}

/// Configuration for [`value_iteration`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValueIterationConfig {
    /// Discount factor in `[0, 1)`.
    pub gamma: f64,
    /// Stop once the largest value change of a sweep falls below this.
    pub tolerance: f64,
    pub max_iterations: usize,
    pub extraction: PolicyExtraction,
}

impl Default for ValueIterationConfig {
    fn default() -> Self {
        Self {
            gamma: 0.8,
            tolerance: 0.01,
            max_iterations: 10_000,
            extraction: PolicyExtraction::Deterministic,
        }
    }
}

impl ValueIterationConfig {
    pub fn new(gamma: f64) -> Self {
        Self {
            gamma,
            ..Self::default()
        }
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn extraction(mut self, extraction: PolicyExtraction) -> Self {
        self.extraction = extraction;
        self
    }
}

/// A policy over a finite state space.
#[derive(Debug, Clone, PartialEq)]
pub enum Policy {
    /// One action index per state.
    Deterministic(Array1<usize>),
    /// `n_states x n_actions` action probabilities, rows sum to one.
    Stochastic(Array2<f64>),
}

impl Policy {
    pub fn n_states(&self) -> usize {
        match self {
            Policy::Deterministic(actions) => actions.len(),
            Policy::Stochastic(probs) => probs.nrows(),
        }
    }

    /// `pi(action | state)`, or `None` if `state` is unknown. A stochastic
    /// policy also returns `None` for an action outside its columns.
    pub fn probability(&self, state: usize, action: usize) -> Option<f64> {
        match self {
            Policy::Deterministic(actions) => {
                let chosen = *actions.get(state)?;
                Some(if chosen == action { 1.0 } else { 0.0 })
            }
            Policy::Stochastic(probs) => probs.get([state, action]).copied(),
        }
    }

    /// Most likely action per state, lowest index on ties.
    pub fn greedy_actions(&self) -> Array1<usize> {
        match self {
            Policy::Deterministic(actions) => actions.clone(),
            Policy::Stochastic(probs) => probs.map_axis(Axis(1), |row| argmax(row.iter().copied())),
        }
    }
}

/// Result of [`value_iteration`].
#[derive(Debug, Clone)]
pub struct Solution {
    pub values: Array1<f64>,
    pub policy: Policy,
    /// Number of Bellman sweeps performed.
    pub iterations: usize,
}

/// Performs value iteration on the transition model `transitions[s, a, s']`
/// with state rewards `rewards`.
///
/// # Returns
/// The value function, the extracted policy and the number of sweeps. With
/// `gamma == 0` the first sweep is already the fixed point, so `V = R` is
/// returned after exactly one iteration.
///
/// # Errors
/// * `DimensionMismatch` if `rewards` or the next-state axis disagree with the state count
/// * `InvalidDiscount` if `gamma` is outside `[0, 1)`
/// * `InvalidInput` if the tolerance or the Boltzmann temperature is not positive
/// * `NumericDivergence` if the values stop being finite
///
/// # Examples
/// ```
/// use maxent_irl::mdp::value_iteration::{value_iteration, Policy, ValueIterationConfig};
/// use ndarray::{array, Array3};
///
/// // Two states, two actions: action 0 stays, action 1 switches.
/// let mut p = Array3::zeros((2, 2, 2));
/// p[[0, 0, 0]] = 1.0;
/// p[[0, 1, 1]] = 1.0;
/// p[[1, 0, 1]] = 1.0;
/// p[[1, 1, 0]] = 1.0;
/// let rewards = array![0.0, 1.0];
///
/// let solution = value_iteration(&p, &rewards, &ValueIterationConfig::new(0.9)).unwrap();
/// assert_eq!(solution.policy, Policy::Deterministic(array![1, 0]));
/// ```
pub fn value_iteration(
    transitions: &Array3<f64>,
    rewards: &Array1<f64>,
    config: &ValueIterationConfig,
) -> Result<Solution> {
    validate_model(transitions, rewards)?;
    validate_discount(config.gamma)?;
    if config.tolerance <= 0.0 || config.tolerance.is_nan() {
        return Err(IrlError::invalid_input(format!(
            "tolerance must be positive, got {}",
            config.tolerance
        )));
    }
    if let PolicyExtraction::Boltzmann { temperature } = config.extraction {
        if temperature <= 0.0 || temperature.is_nan() {
            return Err(IrlError::invalid_input(format!(
                "temperature must be positive, got {}",
                temperature
            )));
        }
    }

    let n = rewards.len();
    let mut values = Array1::<f64>::zeros(n);
    let mut iterations = 0;

    loop {
        let q = q_values(transitions, rewards, &values, config.gamma);
        let updated = q.map_axis(Axis(1), |row| row.fold(f64::NEG_INFINITY, |m, &x| m.max(x)));
        if updated.iter().any(|v| !v.is_finite()) {
            return Err(IrlError::NumericDivergence {
                stage: "value iteration",
                iteration: iterations,
            });
        }
        let delta = (&updated - &values)
            .iter()
            .fold(0.0_f64, |d, &x| d.max(x.abs()));
        values = updated;
        iterations += 1;

        if delta < config.tolerance || config.gamma == 0.0 {
            debug!("value iteration converged after {} sweeps (delta = {:.3e})", iterations, delta);
            break;
        }
        if iterations >= config.max_iterations {
            warn!(
                "value iteration hit the {} sweep cap with delta = {:.3e}",
                config.max_iterations, delta
            );
            break;
        }
    }

    let q = q_values(transitions, rewards, &values, config.gamma);
    let policy = match config.extraction {
        PolicyExtraction::Deterministic => {
            Policy::Deterministic(q.map_axis(Axis(1), |row| argmax(row.iter().copied())))
        }
        PolicyExtraction::Boltzmann { temperature } => {
            Policy::Stochastic(boltzmann(&q, temperature))
        }
    };

    Ok(Solution {
        values,
        policy,
        iterations,
    })
}

/// Lookahead values `Q[s, a] = R(s) + gamma * sum_{s'} P[s, a, s'] V(s')`.
pub(crate) fn q_values(
    transitions: &Array3<f64>,
    rewards: &Array1<f64>,
    values: &Array1<f64>,
    gamma: f64,
) -> Array2<f64> {
    let (n, n_actions, _) = transitions.dim();
    let mut q = Array2::zeros((n, n_actions));
    for a in 0..n_actions {
        let expected = transitions.slice(s![.., a, ..]).dot(values);
        q.column_mut(a).assign(&(rewards + &(expected * gamma)));
    }
    q
}

/// Checks that `transitions` is `n x A x n` and `rewards` has `n` entries.
pub(crate) fn validate_model(transitions: &Array3<f64>, rewards: &Array1<f64>) -> Result<()> {
    let (n, n_actions, n_next) = transitions.dim();
    if n_next != n {
        return Err(IrlError::dimension_mismatch("next-state axis", n, n_next));
    }
    if n_actions == 0 {
        return Err(IrlError::invalid_input("transition model has no actions"));
    }
    if rewards.len() != n {
        return Err(IrlError::dimension_mismatch("reward vector", n, rewards.len()));
    }
    Ok(())
}

pub(crate) fn validate_discount(gamma: f64) -> Result<()> {
    if !(0.0..1.0).contains(&gamma) {
        return Err(IrlError::InvalidDiscount(gamma));
    }
    Ok(())
}

fn boltzmann(q: &Array2<f64>, temperature: f64) -> Array2<f64> {
    let mut probs = q.mapv(|x| x / temperature);
    for mut row in probs.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |m, &x| m.max(x));
        row.mapv_inplace(|x| (x - max).exp());
        let total = row.sum();
        row /= total;
    }
    probs
}

fn argmax<I: Iterator<Item = f64>>(values: I) -> usize {
    let mut best = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_val {
            best_val = v;
            best = i;
        }
    }
    best
}
