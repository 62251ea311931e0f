//! State feature maps for linear rewards `R = features . theta`.
//!
//! The identity map gives every state its own parameter and is the usual
//! choice. The coordinate and distance maps restrict rewards to a smaller
//! family and recover a corner reward less faithfully.

use std::fmt;
use std::str::FromStr;

use ndarray::Array2;

use crate::error::{IrlError, Result};
use crate::mdp::grid::Grid;

/// Which feature map to build for a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureKind {
    #[default]
    Identity,
    Coordinates,
    Manhattan,
}

impl FeatureKind {
    pub fn build(self, grid: &Grid) -> Array2<f64> {
        match self {
            FeatureKind::Identity => identity(grid.n_states()),
            FeatureKind::Coordinates => coordinates(grid),
            FeatureKind::Manhattan => manhattan_basis(grid),
        }
    }
}

impl FromStr for FeatureKind {
    type Err = IrlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "identity" => Ok(FeatureKind::Identity),
            "coord" | "coordinates" => Ok(FeatureKind::Coordinates),
            "manhattan" | "basis" => Ok(FeatureKind::Manhattan),
            other => Err(IrlError::invalid_input(format!(
                "unknown feature map '{}', expected identity, coordinates or manhattan",
                other
            ))),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureKind::Identity => "identity",
            FeatureKind::Coordinates => "coordinates",
            FeatureKind::Manhattan => "manhattan",
        };
        write!(f, "{}", name)
    }
}

/// `N x N` identity: one indicator feature per state.
pub fn identity(n_states: usize) -> Array2<f64> {
    Array2::eye(n_states)
}

/// `N x 2` map of `(row, col)` for every state.
pub fn coordinates(grid: &Grid) -> Array2<f64> {
    let h = grid.height();
    Array2::from_shape_fn((grid.n_states(), 2), |(s, k)| {
        if k == 0 {
            (s % h) as f64
        } else {
            (s / h) as f64
        }
    })
}

/// `N x N` map where entry `(i, j)` is the L1 distance between states `i` and `j`.
pub fn manhattan_basis(grid: &Grid) -> Array2<f64> {
    let h = grid.height();
    Array2::from_shape_fn((grid.n_states(), grid.n_states()), |(i, j)| {
        let (ri, ci) = ((i % h) as f64, (i / h) as f64);
        let (rj, cj) = ((j % h) as f64, (j / h) as f64);
        (ri - rj).abs() + (ci - cj).abs()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::grid::Coord;

    #[test]
    fn test_shapes() {
        let grid = Grid::new(3, 4).unwrap();
        assert_eq!(FeatureKind::Identity.build(&grid).dim(), (12, 12));
        assert_eq!(FeatureKind::Coordinates.build(&grid).dim(), (12, 2));
        assert_eq!(FeatureKind::Manhattan.build(&grid).dim(), (12, 12));
    }

    #[test]
    fn test_coordinates_follow_grid_layout() {
        let grid = Grid::new(3, 4).unwrap();
        let feat = coordinates(&grid);
        let s = grid.index_of(Coord::new(2, 3)).unwrap();
        assert_eq!(feat[[s, 0]], 2.0);
        assert_eq!(feat[[s, 1]], 3.0);
    }

    #[test]
    fn test_manhattan_distances() {
        let grid = Grid::new(5, 5).unwrap();
        let feat = manhattan_basis(&grid);
        let a = grid.index_of(Coord::new(0, 0)).unwrap();
        let b = grid.index_of(Coord::new(4, 4)).unwrap();
        assert_eq!(feat[[a, b]], 8.0);
        assert_eq!(feat[[b, a]], 8.0);
        for s in 0..grid.n_states() {
            assert_eq!(feat[[s, s]], 0.0);
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("identity".parse::<FeatureKind>().unwrap(), FeatureKind::Identity);
        assert_eq!("Coord".parse::<FeatureKind>().unwrap(), FeatureKind::Coordinates);
        assert_eq!("basis".parse::<FeatureKind>().unwrap(), FeatureKind::Manhattan);
        assert!("pixels".parse::<FeatureKind>().is_err());
    }
}
