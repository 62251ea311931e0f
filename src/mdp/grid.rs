//! Grid geometry: the bijection between `(row, col)` cells and state indices.
//!
//! States are laid out column-major, so `index = row + col * height`. Reward
//! and value vectors indexed by state can therefore be reshaped back into a
//! `height x width` map by filling columns first.

use ndarray::{Array1, Array2};

use crate::error::{IrlError, Result};

/// A cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize) -> Self {
        Coord { row, col }
    }
}

/// Dimensions of a rectangular gridworld.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    height: usize,
    width: usize,
}

impl Grid {
    /// Creates a new grid.
    ///
    /// # Errors
    /// * `InvalidInput` if either dimension is zero
    pub fn new(height: usize, width: usize) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(IrlError::invalid_input(format!(
                "grid dimensions must be positive, got {}x{}",
                height, width
            )));
        }
        Ok(Grid { height, width })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of states, `height * width`.
    pub fn n_states(&self) -> usize {
        self.height * self.width
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.row < self.height && coord.col < self.width
    }

    /// Maps a cell to its state index.
    ///
    /// # Errors
    /// * `OutOfBounds` if the cell is outside the grid
    pub fn index_of(&self, coord: Coord) -> Result<usize> {
        if !self.contains(coord) {
            return Err(IrlError::OutOfBounds {
                row: coord.row,
                col: coord.col,
                height: self.height,
                width: self.width,
            });
        }
        Ok(coord.row + coord.col * self.height)
    }

    /// Maps a state index back to its cell.
    ///
    /// # Errors
    /// * `InvalidState` if `state >= n_states()`
    pub fn coord_of(&self, state: usize) -> Result<Coord> {
        if state >= self.n_states() {
            return Err(IrlError::InvalidState {
                state,
                n_states: self.n_states(),
            });
        }
        Ok(Coord {
            row: state % self.height,
            col: state / self.height,
        })
    }

    /// Moves `coord` by `(d_row, d_col)`, staying in place along any axis that
    /// would leave the grid.
    pub(crate) fn offset_clamped(&self, coord: Coord, d_row: isize, d_col: isize) -> Coord {
        let row = coord.row as isize + d_row;
        let col = coord.col as isize + d_col;
        if row < 0 || col < 0 || row >= self.height as isize || col >= self.width as isize {
            coord
        } else {
            Coord::new(row as usize, col as usize)
        }
    }

    /// Reshapes a per-state vector into a `height x width` map.
    ///
    /// # Errors
    /// * `DimensionMismatch` if `values.len() != n_states()`
    pub fn to_map(&self, values: &Array1<f64>) -> Result<Array2<f64>> {
        if values.len() != self.n_states() {
            return Err(IrlError::dimension_mismatch(
                "state vector",
                self.n_states(),
                values.len(),
            ));
        }
        Ok(Array2::from_shape_fn((self.height, self.width), |(r, c)| {
            values[r + c * self.height]
        }))
    }

    /// Flattens a `height x width` map into a per-state vector.
    ///
    /// # Errors
    /// * `DimensionMismatch` if the map shape differs from the grid
    pub fn flatten(&self, map: &Array2<f64>) -> Result<Array1<f64>> {
        let (rows, cols) = map.dim();
        if rows != self.height || cols != self.width {
            return Err(IrlError::dimension_mismatch(
                "reward map cells",
                self.n_states(),
                rows * cols,
            ));
        }
        Ok(Array1::from_shape_fn(self.n_states(), |s| {
            map[[s % self.height, s / self.height]]
        }))
    }
}
