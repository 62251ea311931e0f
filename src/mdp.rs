pub mod grid;
pub mod gridworld;
pub mod value_iteration;

pub use grid::{Coord, Grid};
pub use gridworld::{Action, GridWorld, Step, N_ACTIONS};
pub use value_iteration::{
    value_iteration, Policy, PolicyExtraction, Solution, ValueIterationConfig,
};
