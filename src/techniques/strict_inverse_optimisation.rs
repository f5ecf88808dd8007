use ndarray::{Array1, Axis};

use crate::{
    invopt_framework::invopt_error::InverseOptimisationError,
    invopt_objects::{
        lp_instance::LpInstance,
        observation::{Observation, validate_dataset},
    },
    invopt_traits::invopt_trait_estimator::{EstimatorState, InverseEstimator},
    optimisation_algorithms::linear_programming::{
        ComparisonOp, LpBackend, MicroLpBackend, OptimisationDirection, Problem, Variable,
    },
    techniques::dual_certificate::add_dual_certificate,
};

/// Inverse optimisation for observations that are exactly optimal.
///
/// Every observation must be dual feasible with a zero duality gap. Among the parameter
/// vectors that satisfy this, the one closest in L1 distance to the prior is selected.
#[derive(Debug)]
pub struct StrictEstimator<B: LpBackend = MicroLpBackend> {
    backend: B,
    prior: Option<Array1<f64>>,
    state: EstimatorState,
}

impl StrictEstimator<MicroLpBackend> {
    pub fn new() -> Self {
        Self::with_backend(MicroLpBackend)
    }
}

impl Default for StrictEstimator<MicroLpBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: LpBackend> StrictEstimator<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            prior: None,
            state: EstimatorState::Unfit,
        }
    }

    /// Use this prior in `fit` instead of the default one.
    pub fn with_prior(mut self, prior: Array1<f64>) -> Self {
        self.prior = Some(prior);
        self
    }

    /**
     * Fit with an explicit prior. Without one, the column means of the first observation's
     * constraint matrix are used, scaled to sum to one.
     */
    pub fn fit_with_prior(
        &mut self,
        dataset: &[Observation],
        prior: Option<&Array1<f64>>,
    ) -> Result<(), InverseOptimisationError> {
        log::info!("fit strict inverse optimisation on {} observations", dataset.len());
        match self.solve(dataset, prior) {
            Ok(p_hat) => {
                log::info!("strict inverse optimisation found {}", p_hat);
                self.state = EstimatorState::Fit(p_hat);
                Ok(())
            }
            Err(InverseOptimisationError::EmptyDataset) => {
                self.state = EstimatorState::Unfit;
                Err(InverseOptimisationError::EmptyDataset)
            }
            Err(err) => {
                log::info!("strict inverse optimisation failed: {}", err);
                self.state = EstimatorState::Failed(err.clone());
                Err(err)
            }
        }
    }

    fn solve(
        &self,
        dataset: &[Observation],
        prior: Option<&Array1<f64>>,
    ) -> Result<Array1<f64>, InverseOptimisationError> {
        let n_vars = validate_dataset(dataset)?;
        let prior = match prior {
            Some(prior) if prior.len() != n_vars => {
                return Err(InverseOptimisationError::dimension_mismatch(
                    "prior",
                    n_vars,
                    prior.len(),
                ));
            }
            Some(prior) => prior.clone(),
            None => default_prior(dataset[0].instance()),
        };

        let mut problem = Problem::new(OptimisationDirection::Minimise);
        let p = add_normalised_parameters(&mut problem, n_vars);

        for observation in dataset {
            let certificate = add_dual_certificate(
                &mut problem,
                &p,
                observation.instance(),
                observation.x_obs().view(),
            );
            problem.add_constraint(certificate.gap().clone(), ComparisonOp::Eq, 0.0);
        }

        //p - prior = d_plus - d_minus, minimise the sum of both
        let d_plus = problem.add_vars(n_vars, 1.0, (0.0, f64::INFINITY));
        let d_minus = problem.add_vars(n_vars, 1.0, (0.0, f64::INFINITY));
        for j in 0..n_vars {
            problem.add_constraint(
                &[(p[j], 1.0), (d_plus[j], -1.0), (d_minus[j], 1.0)],
                ComparisonOp::Eq,
                prior[j],
            );
        }

        log::debug!(
            "strict problem has {} variables and {} constraints",
            problem.num_vars(),
            problem.num_constraints()
        );

        let solution = problem.solve_with(&self.backend)?;
        Ok(normalise_estimate(solution.var_values(&p)))
    }
}

impl<B: LpBackend> InverseEstimator for StrictEstimator<B> {
    fn fit(&mut self, dataset: &[Observation]) -> Result<(), InverseOptimisationError> {
        let prior = self.prior.clone();
        self.fit_with_prior(dataset, prior.as_ref())
    }

    fn state(&self) -> &EstimatorState {
        &self.state
    }

    fn backend(&self) -> &dyn LpBackend {
        &self.backend
    }
}

/// Column means of the constraint matrix, scaled to sum to one.
pub fn default_prior(instance: &LpInstance) -> Array1<f64> {
    let n_vars = instance.n_vars();
    let uniform = || Array1::from_elem(n_vars, 1.0 / n_vars as f64);
    match instance.a().mean_axis(Axis(0)) {
        Some(mean) => {
            let sum = mean.sum();
            if sum > 0.0 && sum.is_finite() {
                mean / sum
            } else {
                uniform()
            }
        }
        None => uniform(),
    }
}

/// Add p >= 0 with sum(p) = 1 to the problem.
pub(crate) fn add_normalised_parameters(problem: &mut Problem, n_vars: usize) -> Vec<Variable> {
    let p = problem.add_vars(n_vars, 0.0, (0.0, f64::INFINITY));
    problem.add_constraint(p.iter().map(|v| (*v, 1.0)), ComparisonOp::Eq, 1.0);
    p
}

/// Remove the solver's round-off from an estimate: clip negatives and rescale to sum one.
pub(crate) fn normalise_estimate(values: Vec<f64>) -> Array1<f64> {
    let mut p_hat = Array1::from(values).mapv(|v| v.max(0.0));
    let sum = p_hat.sum();
    if sum > 0.0 {
        p_hat /= sum;
    }
    p_hat
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, array};

    use crate::{
        invopt_framework::invopt_error::InverseOptimisationError,
        invopt_objects::{
            lp_instance::{Equalities, LpInstance, UpperBound},
            observation::Observation,
        },
        invopt_traits::invopt_trait_estimator::{EstimatorState, InverseEstimator},
        optimisation_algorithms::linear_programming::{Error, LpBackend, Problem, Solution},
        techniques::{
            forward_problem::ForwardProblem,
            strict_inverse_optimisation::{StrictEstimator, default_prior},
        },
    };

    fn assert_close(a: &Array1<f64>, b: &Array1<f64>) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6, "{} != {}", a, b);
        }
    }

    fn facet_observation(x: Array1<f64>) -> Observation {
        let instance = LpInstance::inequalities(array![[1.0, 1.0]], array![1.0]).unwrap();
        Observation::noiseless(instance, x).unwrap()
    }

    #[test]
    fn empty_dataset() {
        let mut estimator = StrictEstimator::new();
        assert_eq!(estimator.fit(&[]), Err(InverseOptimisationError::EmptyDataset));
        assert_eq!(estimator.state(), &EstimatorState::Unfit);

        let instance = LpInstance::inequalities(array![[1.0, 1.0]], array![1.0]).unwrap();
        assert_eq!(
            estimator.predict(&instance),
            Err(InverseOptimisationError::NotFitted)
        );
    }

    #[test]
    fn unique_direction_is_recovered() {
        //only p1 = p2 makes the middle of the facet x1 + x2 <= 1 optimal
        let mut estimator = StrictEstimator::new();
        estimator.fit(&[facet_observation(array![0.5, 0.5])]).unwrap();
        let p_hat = estimator.estimate().unwrap();
        assert_close(p_hat, &array![0.5, 0.5]);

        let cosine = p_hat.dot(&array![1.0, 1.0]) / (p_hat.dot(p_hat).sqrt() * 2f64.sqrt());
        assert!(cosine > 1.0 - 1e-9);
    }

    #[test]
    fn equality_duals() {
        //on the segment x1 + x2 = 1, an interior point is optimal only for p1 = p2
        let instance = LpInstance::new(
            array![[1.0, 0.0]],
            array![1.0],
            Equalities::Present {
                a_eq: array![[1.0, 1.0]],
                b_eq: array![1.0],
            },
            UpperBound::Unbounded,
        )
        .unwrap();
        let observation = Observation::noiseless(instance, array![0.5, 0.5]).unwrap();

        let mut estimator = StrictEstimator::new().with_prior(array![0.9, 0.1]);
        estimator.fit(&[observation]).unwrap();
        assert_close(estimator.estimate().unwrap(), &array![0.5, 0.5]);
    }

    #[test]
    fn upper_bound_duals_and_prior() {
        //x = x_ub is optimal for every nonnegative p, so the prior is returned
        let instance = LpInstance::new(
            array![[1.0, 1.0]],
            array![10.0],
            Equalities::Absent,
            UpperBound::BoundedAbove(array![1.0, 1.0]),
        )
        .unwrap();
        let observation = Observation::noiseless(instance, array![1.0, 1.0]).unwrap();

        let mut estimator = StrictEstimator::new();
        estimator
            .fit_with_prior(&[observation], Some(&array![0.3, 0.7]))
            .unwrap();
        assert_close(estimator.estimate().unwrap(), &array![0.3, 0.7]);
    }

    #[test]
    fn infinite_upper_bounds_are_no_bounds() {
        let instance = LpInstance::new(
            array![[1.0, 1.0]],
            array![1.0],
            Equalities::Absent,
            UpperBound::BoundedAbove(array![f64::INFINITY, f64::INFINITY]),
        )
        .unwrap();
        let x = instance.solve_forward(&array![2.0, 1.0]).unwrap();
        assert_close(&x, &array![1.0, 0.0]);

        let observation = Observation::noiseless(instance, array![0.5, 0.5]).unwrap();
        let mut estimator = StrictEstimator::new();
        estimator.fit(&[observation]).unwrap();
        assert_close(estimator.estimate().unwrap(), &array![0.5, 0.5]);
    }

    #[test]
    fn suboptimal_observation_is_infeasible() {
        let mut estimator = StrictEstimator::new();
        estimator.fit(&[facet_observation(array![0.5, 0.5])]).unwrap();

        //an interior point is never optimal for a normalised p
        assert_eq!(
            estimator.fit(&[facet_observation(array![0.2, 0.2])]),
            Err(InverseOptimisationError::Infeasible)
        );
        assert_eq!(
            estimator.state(),
            &EstimatorState::Failed(InverseOptimisationError::Infeasible)
        );
        assert!(estimator.estimate().is_none());
        assert_eq!(
            estimator.predict(facet_observation(array![0.5, 0.5]).instance()),
            Err(InverseOptimisationError::NotFitted)
        );
    }

    #[test]
    fn dimension_mismatch_is_detected_before_solving() {
        let three = LpInstance::inequalities(array![[1.0, 1.0, 1.0]], array![1.0]).unwrap();
        let dataset = vec![
            facet_observation(array![0.5, 0.5]),
            Observation::noiseless(three, array![1.0, 0.0, 0.0]).unwrap(),
        ];
        let mut estimator = StrictEstimator::new();
        assert!(matches!(
            estimator.fit(&dataset),
            Err(InverseOptimisationError::DimensionMismatch(_))
        ));

        assert!(matches!(
            estimator.fit_with_prior(&dataset[..1], Some(&array![1.0])),
            Err(InverseOptimisationError::DimensionMismatch(_))
        ));
        assert!(estimator.estimate().is_none());
    }

    struct Broken;

    impl LpBackend for Broken {
        fn solve(&self, _problem: &Problem) -> Result<Solution, Error> {
            Err(Error::SolverError("lost licence".to_string()))
        }
    }

    #[test]
    fn solver_errors_are_recorded() {
        let mut estimator = StrictEstimator::with_backend(Broken);
        let result = estimator.fit(&[facet_observation(array![0.5, 0.5])]);
        assert_eq!(
            result,
            Err(InverseOptimisationError::SolverError("lost licence".to_string()))
        );
        assert!(matches!(estimator.state(), EstimatorState::Failed(_)));
    }

    #[test]
    fn predict_is_idempotent() {
        let mut estimator = StrictEstimator::new();
        estimator.fit(&[facet_observation(array![0.5, 0.5])]).unwrap();

        let instance =
            LpInstance::inequalities(array![[1.0, 2.0], [3.0, 1.0]], array![4.0, 6.0]).unwrap();
        let first = estimator.predict(&instance).unwrap();
        let second = estimator.predict(&instance).unwrap();
        assert_eq!(first, second);
        assert!(instance.is_feasible(&first, 1e-7));
    }

    #[test]
    fn default_prior_is_normalised() {
        let instance = LpInstance::inequalities(array![[1.0, 3.0], [3.0, 5.0]], array![1.0, 1.0])
            .unwrap();
        assert_close(&default_prior(&instance), &array![1.0 / 3.0, 2.0 / 3.0]);

        let zero = LpInstance::inequalities(array![[0.0, 0.0]], array![1.0]).unwrap();
        assert_close(&default_prior(&zero), &array![0.5, 0.5]);
    }
}
