use ndarray::Array1;

use crate::{
    invopt_framework::invopt_error::InverseOptimisationError,
    invopt_objects::{lp_instance::LpInstance, observation::Observation},
    optimisation_algorithms::linear_programming::LpBackend,
    techniques::forward_problem::ForwardProblem,
};

/// Lifecycle of an estimator. Fitting happens inside a single blocking `fit` call, so it is
/// never observable from outside.
#[derive(Clone, Debug, PartialEq)]
pub enum EstimatorState {
    Unfit,
    Fit(Array1<f64>),
    Failed(InverseOptimisationError),
}

impl EstimatorState {
    pub fn estimate(&self) -> Option<&Array1<f64>> {
        match self {
            EstimatorState::Fit(p_hat) => Some(p_hat),
            EstimatorState::Unfit | EstimatorState::Failed(_) => None,
        }
    }
}

pub trait InverseEstimator {
    /**
     * Estimate the objective coefficients from the dataset.
     *
     * An empty dataset resets the estimator to Unfit and reports EmptyDataset. Any other
     * failure leaves the estimator in the Failed state without an estimate, and is reported
     * as well. On success, the estimate is nonnegative and sums to one.
     */
    fn fit(&mut self, dataset: &[Observation]) -> Result<(), InverseOptimisationError>;

    fn state(&self) -> &EstimatorState;

    /// The backend used for the forward problems of `predict`.
    fn backend(&self) -> &dyn LpBackend;

    fn estimate(&self) -> Option<&Array1<f64>> {
        self.state().estimate()
    }

    /// Solve the forward problem of the instance with the current estimate.
    fn predict(&self, instance: &LpInstance) -> Result<Array1<f64>, InverseOptimisationError> {
        let p_hat = self.estimate().ok_or(InverseOptimisationError::NotFitted)?;
        instance.solve_forward_with(p_hat, self.backend())
    }
}
