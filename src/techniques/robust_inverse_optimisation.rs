use anyhow::{Result, anyhow};
use ndarray::Array1;

use crate::{
    invopt_framework::invopt_error::InverseOptimisationError,
    invopt_objects::observation::{Observation, validate_dataset},
    invopt_traits::invopt_trait_estimator::{EstimatorState, InverseEstimator},
    optimisation_algorithms::linear_programming::{
        ComparisonOp, LpBackend, MicroLpBackend, OptimisationDirection, Problem,
    },
    techniques::{
        dual_certificate::add_dual_certificate,
        strict_inverse_optimisation::{add_normalised_parameters, normalise_estimate},
    },
};

/// Weights of the positive and negative parts of each duality gap in the objective.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GapPenalty {
    over: f64,
    under: f64,
}

impl GapPenalty {
    /// Both signs weigh the same: the L1 norm of the gaps.
    pub fn symmetric() -> Self {
        Self {
            over: 1.0,
            under: 1.0,
        }
    }

    /// `over` weighs gaps where the dual objective exceeds the primal one, `under` the rest.
    pub fn asymmetric(over: f64, under: f64) -> Result<Self> {
        if !over.is_finite() || !under.is_finite() || over < 0.0 || under < 0.0 {
            return Err(anyhow!(
                "gap penalties must be finite and nonnegative, got {} and {}",
                over,
                under
            ));
        }
        if over == 0.0 && under == 0.0 {
            return Err(anyhow!("at least one gap penalty must be positive"));
        }
        Ok(Self { over, under })
    }

    pub fn over(&self) -> f64 {
        self.over
    }

    pub fn under(&self) -> f64 {
        self.under
    }
}

impl Default for GapPenalty {
    fn default() -> Self {
        Self::symmetric()
    }
}

/// Inverse optimisation for noisy observations.
///
/// Every observation must be dual feasible, but its duality gap may be nonzero. The gaps are
/// split into positive and negative parts and their weighted sum is minimised.
#[derive(Debug)]
pub struct RobustEstimator<B: LpBackend = MicroLpBackend> {
    backend: B,
    penalty: GapPenalty,
    state: EstimatorState,
    residuals: Vec<f64>,
    total_error: Option<f64>,
}

impl RobustEstimator<MicroLpBackend> {
    pub fn new() -> Self {
        Self::with_backend(MicroLpBackend)
    }
}

impl Default for RobustEstimator<MicroLpBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: LpBackend> RobustEstimator<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            penalty: GapPenalty::symmetric(),
            state: EstimatorState::Unfit,
            residuals: vec![],
            total_error: None,
        }
    }

    pub fn with_penalty(mut self, penalty: GapPenalty) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn penalty(&self) -> GapPenalty {
        self.penalty
    }

    /// The signed duality gap of each observation of the last successful fit.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// The penalised objective value of the last successful fit.
    pub fn total_error(&self) -> Option<f64> {
        self.total_error
    }

    fn solve(
        &self,
        dataset: &[Observation],
    ) -> Result<(Array1<f64>, Vec<f64>, f64), InverseOptimisationError> {
        let n_vars = validate_dataset(dataset)?;

        let mut problem = Problem::new(OptimisationDirection::Minimise);
        let p = add_normalised_parameters(&mut problem, n_vars);

        let mut certificates = Vec::with_capacity(dataset.len());
        for observation in dataset {
            let certificate = add_dual_certificate(
                &mut problem,
                &p,
                observation.instance(),
                observation.x_obs().view(),
            );

            //dual obj - primal obj == gap_pos - gap_neg
            let gap_pos = problem.add_var(self.penalty.over, (0.0, f64::INFINITY));
            let gap_neg = problem.add_var(self.penalty.under, (0.0, f64::INFINITY));
            let mut soft_gap = certificate.gap().clone();
            soft_gap.add(gap_pos, -1.0);
            soft_gap.add(gap_neg, 1.0);
            problem.add_constraint(soft_gap, ComparisonOp::Eq, 0.0);

            certificates.push(certificate);
        }

        log::debug!(
            "robust problem has {} variables and {} constraints",
            problem.num_vars(),
            problem.num_constraints()
        );

        let solution = problem.solve_with(&self.backend)?;
        let residuals = certificates
            .iter()
            .map(|certificate| certificate.gap_value(&solution))
            .collect();
        Ok((
            normalise_estimate(solution.var_values(&p)),
            residuals,
            solution.objective(),
        ))
    }
}

impl<B: LpBackend> InverseEstimator for RobustEstimator<B> {
    fn fit(&mut self, dataset: &[Observation]) -> Result<(), InverseOptimisationError> {
        log::info!("fit robust inverse optimisation on {} observations", dataset.len());
        self.residuals.clear();
        self.total_error = None;
        match self.solve(dataset) {
            Ok((p_hat, residuals, total_error)) => {
                log::info!(
                    "robust inverse optimisation found {} with total error {}",
                    p_hat,
                    total_error
                );
                self.state = EstimatorState::Fit(p_hat);
                self.residuals = residuals;
                self.total_error = Some(total_error);
                Ok(())
            }
            Err(InverseOptimisationError::EmptyDataset) => {
                self.state = EstimatorState::Unfit;
                Err(InverseOptimisationError::EmptyDataset)
            }
            Err(err) => {
                log::info!("robust inverse optimisation failed: {}", err);
                self.state = EstimatorState::Failed(err.clone());
                Err(err)
            }
        }
    }

    fn state(&self) -> &EstimatorState {
        &self.state
    }

    fn backend(&self) -> &dyn LpBackend {
        &self.backend
    }
}
