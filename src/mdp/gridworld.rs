//! A stochastic gridworld MDP.
//!
//! The agent picks one of five actions. With probability `1 - p_rand` the
//! intended action is executed; otherwise one of the remaining four actions is
//! executed, each with probability `p_rand / 4`. Moves that would leave the
//! grid keep the agent in place. Terminal states are absorbing.
//!
//! The environment carries no hidden "current state": [`GridWorld::step`]
//! takes the state explicitly and reports the successor in the returned
//! [`Step`], so independent episodes can be simulated concurrently against a
//! shared, immutable world.

use std::collections::HashSet;

use ndarray::{Array1, Array3};
use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};

use crate::error::{IrlError, Result};
use crate::mdp::grid::{Coord, Grid};

/// Number of actions available in every state.
pub const N_ACTIONS: usize = 5;

/// Movement actions, in index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Right,
    Down,
    Left,
    Up,
    Stay,
}

impl Action {
    pub const ALL: [Action; N_ACTIONS] = [
        Action::Right,
        Action::Down,
        Action::Left,
        Action::Up,
        Action::Stay,
    ];

    pub fn index(self) -> usize {
        match self {
            Action::Right => 0,
            Action::Down => 1,
            Action::Left => 2,
            Action::Up => 3,
            Action::Stay => 4,
        }
    }

    /// # Errors
    /// * `InvalidInput` if `index >= N_ACTIONS`
    pub fn from_index(index: usize) -> Result<Self> {
        Action::ALL.get(index).copied().ok_or_else(|| {
            IrlError::invalid_input(format!(
                "action index {} out of range (max = {})",
                index,
                N_ACTIONS - 1
            ))
        })
    }

    /// `(d_row, d_col)` displacement.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Action::Right => (0, 1),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Up => (-1, 0),
            Action::Stay => (0, 0),
        }
    }
}

/// One transition of an episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub cur_state: usize,
    /// Action requested by the policy.
    pub action: Action,
    /// Action actually executed after noise.
    pub executed: Action,
    pub next_state: usize,
    /// Reward of `next_state`.
    pub reward: f64,
    pub done: bool,
}

/// A gridworld with a per-state reward map and noisy actions.
#[derive(Debug, Clone)]
pub struct GridWorld {
    grid: Grid,
    rewards: Array1<f64>,
    terminals: HashSet<usize>,
    p_rand: f64,
    /// Executed-action distribution for each intended action.
    noise: Vec<WeightedIndex<f64>>,
    transitions: Array3<f64>,
}

impl GridWorld {
    /// Creates a new gridworld.
    ///
    /// # Arguments
    /// * `grid` - grid dimensions
    /// * `rewards` - one reward per state, column-major (see [`Grid`])
    /// * `terminals` - absorbing cells; empty for fixed-horizon episodes
    /// * `p_rand` - probability of not following the intended action
    ///
    /// # Errors
    /// * `DimensionMismatch` if `rewards.len() != grid.n_states()`
    /// * `OutOfBounds` if a terminal cell lies outside the grid
    /// * `InvalidInput` if `p_rand` is not a probability
    pub fn new(grid: Grid, rewards: Array1<f64>, terminals: &[Coord], p_rand: f64) -> Result<Self> {
        if rewards.len() != grid.n_states() {
            return Err(IrlError::dimension_mismatch(
                "reward vector",
                grid.n_states(),
                rewards.len(),
            ));
        }
        if !(0.0..=1.0).contains(&p_rand) {
            return Err(IrlError::invalid_input(format!(
                "action randomness must be in [0, 1], got {}",
                p_rand
            )));
        }
        let terminals = terminals
            .iter()
            .map(|&c| grid.index_of(c))
            .collect::<Result<HashSet<_>>>()?;

        let noise = Action::ALL
            .iter()
            .map(|&intended| {
                WeightedIndex::new(executed_action_probs(intended, p_rand))
                    .map_err(|e| IrlError::invalid_input(format!("action noise: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut world = GridWorld {
            grid,
            rewards,
            terminals,
            p_rand,
            noise,
            transitions: Array3::zeros((0, 0, 0)),
        };
        world.transitions = world.build_transitions();
        Ok(world)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn n_states(&self) -> usize {
        self.grid.n_states()
    }

    pub fn rewards(&self) -> &Array1<f64> {
        &self.rewards
    }

    pub fn p_rand(&self) -> f64 {
        self.p_rand
    }

    pub fn is_terminal(&self, state: usize) -> bool {
        self.terminals.contains(&state)
    }

    /// The transition model `P[state, action, next_state]`.
    pub fn transition_matrix(&self) -> &Array3<f64> {
        &self.transitions
    }

    /// Returns the state an episode starting at `coord` begins in.
    ///
    /// # Errors
    /// * `OutOfBounds` if `coord` lies outside the grid
    pub fn reset(&self, coord: Coord) -> Result<usize> {
        self.grid.index_of(coord)
    }

    /// Simulates one step from `state` with the intended `action`.
    ///
    /// From a terminal state the agent stays put and `done` is reported.
    ///
    /// # Errors
    /// * `InvalidState` if `state` is out of range
    pub fn step<R: Rng + ?Sized>(&self, state: usize, action: Action, rng: &mut R) -> Result<Step> {
        let coord = self.grid.coord_of(state)?;
        if self.is_terminal(state) {
            return Ok(Step {
                cur_state: state,
                action,
                executed: Action::Stay,
                next_state: state,
                reward: self.rewards[state],
                done: true,
            });
        }

        let executed = Action::ALL[self.noise[action.index()].sample(rng)];
        let next_state = self.successor(coord, executed);
        Ok(Step {
            cur_state: state,
            action,
            executed,
            next_state,
            reward: self.rewards[next_state],
            done: self.is_terminal(next_state),
        })
    }

    fn successor(&self, coord: Coord, executed: Action) -> usize {
        let (d_row, d_col) = executed.delta();
        let next = self.grid.offset_clamped(coord, d_row, d_col);
        next.row + next.col * self.grid.height()
    }

    fn build_transitions(&self) -> Array3<f64> {
        let n = self.n_states();
        let mut p = Array3::zeros((n, N_ACTIONS, n));
        for s in 0..n {
            if self.is_terminal(s) {
                for a in 0..N_ACTIONS {
                    p[[s, a, s]] = 1.0;
                }
                continue;
            }
            let coord = Coord::new(s % self.grid.height(), s / self.grid.height());
            let successors = Action::ALL.map(|executed| self.successor(coord, executed));
            let slip = self.p_rand / (N_ACTIONS - 1) as f64;
            for intended in Action::ALL {
                let target = successors[intended.index()];
                // Count slips per successor so actions with the same outcome
                // produce bit-identical rows.
                let mut slips = vec![0usize; n];
                for executed in Action::ALL {
                    if executed != intended {
                        slips[successors[executed.index()]] += 1;
                    }
                }
                for (next, &count) in slips.iter().enumerate() {
                    if count > 0 {
                        p[[s, intended.index(), next]] = count as f64 * slip;
                    }
                }
                p[[s, intended.index(), target]] += 1.0 - self.p_rand;
            }
        }
        p
    }
}

/// Probability of executing each action when `intended` is requested.
fn executed_action_probs(intended: Action, p_rand: f64) -> [f64; N_ACTIONS] {
    let mut probs = [p_rand / (N_ACTIONS - 1) as f64; N_ACTIONS];
    probs[intended.index()] = 1.0 - p_rand;
    probs
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn world(h: usize, w: usize, p_rand: f64) -> GridWorld {
        let grid = Grid::new(h, w).unwrap();
        GridWorld::new(grid, Array1::zeros(grid.n_states()), &[], p_rand).unwrap()
    }

    #[test]
    fn test_transition_rows_sum_to_one() {
        for p_rand in [0.0, 0.3, 1.0] {
            let gw = world(4, 3, p_rand);
            let p = gw.transition_matrix();
            for s in 0..gw.n_states() {
                for a in 0..N_ACTIONS {
                    let sum: f64 = (0..gw.n_states()).map(|t| p[[s, a, t]]).sum();
                    assert!((sum - 1.0).abs() < 1e-9, "row ({}, {}) sums to {}", s, a, sum);
                }
            }
        }
    }

    #[test]
    fn test_corner_moves_clamp() {
        let gw = world(5, 5, 0.3);
        let p = gw.transition_matrix();
        let origin = 0;
        let right = gw.grid().index_of(Coord::new(0, 1)).unwrap();
        let down = gw.grid().index_of(Coord::new(1, 0)).unwrap();

        // Right intended: 0.7 right, 0.075 down, left/up/stay keep the agent in place.
        assert_abs_diff_eq!(p[[origin, Action::Right.index(), right]], 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(p[[origin, Action::Right.index(), down]], 0.075, epsilon = 1e-12);
        assert_abs_diff_eq!(p[[origin, Action::Right.index(), origin]], 0.225, epsilon = 1e-12);
    }

    #[test]
    fn test_equivalent_actions_share_rows() {
        let gw = world(5, 5, 0.3);
        let p = gw.transition_matrix();
        let corner = gw.grid().index_of(Coord::new(4, 4)).unwrap();
        let stay = p.slice(ndarray::s![corner, Action::Stay.index(), ..]);
        assert_eq!(p.slice(ndarray::s![corner, Action::Right.index(), ..]), stay);
        assert_eq!(p.slice(ndarray::s![corner, Action::Down.index(), ..]), stay);
    }

    #[test]
    fn test_deterministic_step() {
        let gw = world(3, 3, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let start = gw.reset(Coord::new(1, 1)).unwrap();
        let step = gw.step(start, Action::Up, &mut rng).unwrap();
        assert_eq!(step.executed, Action::Up);
        assert_eq!(gw.grid().coord_of(step.next_state).unwrap(), Coord::new(0, 1));
        assert!(!step.done);
    }

    #[test]
    fn test_reward_read_at_next_state() {
        let grid = Grid::new(2, 2).unwrap();
        let mut rewards = Array1::zeros(4);
        let goal = grid.index_of(Coord::new(0, 1)).unwrap();
        rewards[goal] = 3.0;
        let gw = GridWorld::new(grid, rewards, &[], 0.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let step = gw.step(0, Action::Right, &mut rng).unwrap();
        assert_eq!(step.next_state, goal);
        assert_eq!(step.reward, 3.0);
    }

    #[test]
    fn test_terminal_is_absorbing() {
        let grid = Grid::new(3, 3).unwrap();
        let goal = Coord::new(2, 2);
        let gw = GridWorld::new(grid, Array1::zeros(9), &[goal], 0.2).unwrap();
        let g = grid.index_of(goal).unwrap();
        for a in 0..N_ACTIONS {
            assert_eq!(gw.transition_matrix()[[g, a, g]], 1.0);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let step = gw.step(g, Action::Left, &mut rng).unwrap();
        assert!(step.done);
        assert_eq!(step.next_state, g);

        let before = grid.index_of(Coord::new(2, 1)).unwrap();
        let no_noise = GridWorld::new(grid, Array1::zeros(9), &[goal], 0.0).unwrap();
        let step = no_noise.step(before, Action::Right, &mut rng).unwrap();
        assert_eq!(step.next_state, g);
        assert!(step.done);
    }

    #[test]
    fn test_noise_frequency_matches_model() {
        let gw = world(5, 5, 0.3);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let center = gw.reset(Coord::new(2, 2)).unwrap();
        let trials = 20_000;
        let followed = (0..trials)
            .filter(|_| gw.step(center, Action::Down, &mut rng).unwrap().executed == Action::Down)
            .count();
        let freq = followed as f64 / trials as f64;
        let expected = 1.0 - gw.p_rand();
        assert!((freq - expected).abs() < 0.02, "intended action frequency {}", freq);
    }

    #[test]
    fn test_invalid_construction() {
        let grid = Grid::new(2, 2).unwrap();
        assert!(matches!(
            GridWorld::new(grid, Array1::zeros(3), &[], 0.1),
            Err(IrlError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            GridWorld::new(grid, Array1::zeros(4), &[], 1.5),
            Err(IrlError::InvalidInput(_))
        ));
        assert!(matches!(
            GridWorld::new(grid, Array1::zeros(4), &[Coord::new(2, 0)], 0.1),
            Err(IrlError::OutOfBounds { .. })
        ));
        let gw = GridWorld::new(grid, Array1::zeros(4), &[], 0.1).unwrap();
        assert!(matches!(
            gw.reset(Coord::new(0, 9)),
            Err(IrlError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_action_index_round_trip() {
        for a in Action::ALL {
            assert_eq!(Action::from_index(a.index()).unwrap(), a);
        }
        assert!(Action::from_index(N_ACTIONS).is_err());
    }
}
