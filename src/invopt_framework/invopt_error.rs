use crate::optimisation_algorithms::linear_programming;

/// An error encountered while fitting an estimator or solving a forward problem.
///
/// Everything the external LP backend reports is translated into one of these kinds
/// before it leaves the crate.
#[derive(Clone, Debug, PartialEq)]
pub enum InverseOptimisationError {
    /// `fit` was called without any observations.
    EmptyDataset,
    /// The dimensions of an instance, observation or parameter vector do not agree.
    DimensionMismatch(String),
    /// Constraints can't simultaneously be satisfied.
    Infeasible,
    /// The objective function is unbounded.
    Unbounded,
    /// The LP backend failed for another reason.
    SolverError(String),
    /// `predict` was called on an estimator without an estimate.
    NotFitted,
}

impl InverseOptimisationError {
    pub fn dimension_mismatch(what: &str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch(format!(
            "{} has dimension {}, expected {}",
            what, found, expected
        ))
    }
}

impl std::fmt::Display for InverseOptimisationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InverseOptimisationError::EmptyDataset => write!(f, "dataset is empty"),
            InverseOptimisationError::DimensionMismatch(msg) => {
                write!(f, "dimension mismatch: {}", msg)
            }
            InverseOptimisationError::Infeasible => write!(f, "problem is infeasible"),
            InverseOptimisationError::Unbounded => write!(f, "problem is unbounded"),
            InverseOptimisationError::SolverError(msg) => write!(f, "solver error: {}", msg),
            InverseOptimisationError::NotFitted => write!(f, "estimator has not been fitted"),
        }
    }
}

impl std::error::Error for InverseOptimisationError {}

impl From<linear_programming::Error> for InverseOptimisationError {
    fn from(value: linear_programming::Error) -> Self {
        match value {
            linear_programming::Error::Infeasible => Self::Infeasible,
            linear_programming::Error::Unbounded => Self::Unbounded,
            linear_programming::Error::SolverError(msg) => Self::SolverError(msg),
        }
    }
}
