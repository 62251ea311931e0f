//! Expert demonstrations: episodes rolled out by following a policy in a
//! [`GridWorld`].

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::error::{IrlError, Result};
use crate::mdp::grid::Coord;
use crate::mdp::gridworld::{Action, GridWorld, Step, N_ACTIONS};
use crate::mdp::value_iteration::Policy;

/// An ordered sequence of steps.
pub type Episode = Vec<Step>;

/// Where each episode starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Fixed(Coord),
    /// Uniformly random cell, drawn per episode.
    Random,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemonstrationOptions {
    pub n_trajs: usize,
    /// Steps per episode; fewer if a terminal state is reached.
    pub len_traj: usize,
    pub start: StartMode,
}

impl Default for DemonstrationOptions {
    fn default() -> Self {
        Self {
            n_trajs: 100,
            len_traj: 20,
            start: StartMode::Fixed(Coord::new(0, 0)),
        }
    }
}

impl DemonstrationOptions {
    pub fn new(n_trajs: usize, len_traj: usize) -> Self {
        Self {
            n_trajs,
            len_traj,
            ..Self::default()
        }
    }

    pub fn start(mut self, start: StartMode) -> Self {
        self.start = start;
        self
    }

    fn validate(&self, world: &GridWorld, policy: &Policy) -> Result<()> {
        if self.len_traj == 0 {
            return Err(IrlError::invalid_input("trajectory length must be positive"));
        }
        if policy.n_states() != world.n_states() {
            return Err(IrlError::dimension_mismatch(
                "policy states",
                world.n_states(),
                policy.n_states(),
            ));
        }
        if let Policy::Stochastic(probs) = policy {
            if probs.ncols() != N_ACTIONS {
                return Err(IrlError::dimension_mismatch(
                    "policy actions",
                    N_ACTIONS,
                    probs.ncols(),
                ));
            }
        }
        if let StartMode::Fixed(coord) = self.start {
            world.reset(coord)?;
        }
        Ok(())
    }
}

/// Samples `options.n_trajs` episodes by following `policy` in `world`.
///
/// All randomness (start cells, stochastic policies and action noise) is drawn
/// from `rng`, so a seeded generator reproduces the same episodes.
///
/// # Errors
/// * `InvalidInput` if `len_traj` is zero or the policy names an unknown action
/// * `DimensionMismatch` if the policy does not cover every state, or a
///   stochastic policy does not have one column per action
/// * `OutOfBounds` if the fixed start cell lies outside the grid
///
/// # Examples
/// ```
/// use maxent_irl::irl::demonstrations::{generate_demonstrations, DemonstrationOptions};
/// use maxent_irl::mdp::{Grid, GridWorld, Policy};
/// use ndarray::Array1;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
///
/// let grid = Grid::new(3, 3).unwrap();
/// let world = GridWorld::new(grid, Array1::zeros(9), &[], 0.2).unwrap();
/// let policy = Policy::Deterministic(Array1::zeros(9));
/// let mut rng = ChaCha8Rng::seed_from_u64(1);
///
/// let trajs = generate_demonstrations(&world, &policy, &DemonstrationOptions::new(4, 6), &mut rng).unwrap();
/// assert_eq!(trajs.len(), 4);
/// assert!(trajs.iter().all(|episode| episode.len() == 6));
/// ```
pub fn generate_demonstrations<R: Rng + ?Sized>(
    world: &GridWorld,
    policy: &Policy,
    options: &DemonstrationOptions,
    rng: &mut R,
) -> Result<Vec<Episode>> {
    options.validate(world, policy)?;
    (0..options.n_trajs)
        .map(|_| rollout(world, policy, options, &mut *rng))
        .collect()
}

/// Parallel counterpart of [`generate_demonstrations`].
///
/// Episode `i` draws from its own ChaCha stream `i` seeded with `seed`, so the
/// result does not depend on the number of worker threads. It does differ
/// from the sequential sampler for the same seed.
pub fn generate_demonstrations_par(
    world: &GridWorld,
    policy: &Policy,
    options: &DemonstrationOptions,
    seed: u64,
) -> Result<Vec<Episode>> {
    options.validate(world, policy)?;
    (0..options.n_trajs)
        .into_par_iter()
        .map(|i| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rng.set_stream(i as u64);
            rollout(world, policy, options, &mut rng)
        })
        .collect()
}

fn rollout<R: Rng + ?Sized>(
    world: &GridWorld,
    policy: &Policy,
    options: &DemonstrationOptions,
    rng: &mut R,
) -> Result<Episode> {
    let start = match options.start {
        StartMode::Fixed(coord) => coord,
        StartMode::Random => {
            let grid = world.grid();
            Coord::new(rng.gen_range(0..grid.height()), rng.gen_range(0..grid.width()))
        }
    };

    let mut state = world.reset(start)?;
    let mut episode = Vec::with_capacity(options.len_traj);
    for _ in 0..options.len_traj {
        let action = choose_action(policy, state, rng)?;
        let step = world.step(state, action, rng)?;
        episode.push(step);
        state = step.next_state;
        if step.done {
            break;
        }
    }
    Ok(episode)
}

fn choose_action<R: Rng + ?Sized>(policy: &Policy, state: usize, rng: &mut R) -> Result<Action> {
    match policy {
        Policy::Deterministic(actions) => Action::from_index(actions[state]),
        Policy::Stochastic(probs) => {
            let row = probs.row(state);
            let sample = rng.gen::<f64>();
            let mut cumsum = 0.0;
            for (i, &p) in row.iter().enumerate() {
                cumsum += p;
                if sample < cumsum {
                    return Action::from_index(i);
                }
            }
            Action::from_index(row.len() - 1)
        }
    }
}
