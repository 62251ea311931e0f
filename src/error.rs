use thiserror::Error;

/// Errors produced while building, solving, sampling or learning on a gridworld MDP.
#[derive(Error, Debug)]
pub enum IrlError {
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("discount factor must lie in [0, 1), got {0}")]
    InvalidDiscount(f64),

    #[error("coordinate ({row}, {col}) is outside a {height}x{width} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        height: usize,
        width: usize,
    },

    #[error("state {state} is out of range for {n_states} states")]
    InvalidState { state: usize, n_states: usize },

    #[error("no demonstrations were supplied")]
    EmptyDemonstrationSet,

    #[error("non-finite value produced during {stage} at iteration {iteration}")]
    NumericDivergence {
        stage: &'static str,
        iteration: usize,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl IrlError {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        IrlError::InvalidInput(msg.into())
    }

    pub fn dimension_mismatch(what: &'static str, expected: usize, found: usize) -> Self {
        IrlError::DimensionMismatch {
            what,
            expected,
            found,
        }
    }
}

pub type Result<T> = std::result::Result<T, IrlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = IrlError::dimension_mismatch("reward vector", 25, 24);
        assert_eq!(
            err.to_string(),
            "dimension mismatch for reward vector: expected 25, found 24"
        );

        let err = IrlError::OutOfBounds {
            row: 5,
            col: 0,
            height: 5,
            width: 5,
        };
        assert_eq!(err.to_string(), "coordinate (5, 0) is outside a 5x5 grid");

        let err = IrlError::invalid_input("len_traj must be positive");
        assert!(matches!(err, IrlError::InvalidInput(_)));
    }
}
