use ndarray::Array1;

use crate::{
    invopt_framework::invopt_error::InverseOptimisationError,
    invopt_objects::lp_instance::{Equalities, LpInstance, UpperBound},
    optimisation_algorithms::linear_programming::{
        ComparisonOp, LpBackend, MicroLpBackend, OptimisationDirection, Problem,
    },
};

pub trait ForwardProblem {
    /**
     * Solve max p^T x over the instance and return an optimal x.
     *
     * Fails with DimensionMismatch if p does not have one entry per variable, and with
     * Infeasible, Unbounded or SolverError as reported by the backend.
     */
    fn solve_forward_with(
        &self,
        p: &Array1<f64>,
        backend: &(impl LpBackend + ?Sized),
    ) -> Result<Array1<f64>, InverseOptimisationError>;

    fn solve_forward(&self, p: &Array1<f64>) -> Result<Array1<f64>, InverseOptimisationError> {
        self.solve_forward_with(p, &MicroLpBackend)
    }
}

impl ForwardProblem for LpInstance {
    fn solve_forward_with(
        &self,
        p: &Array1<f64>,
        backend: &(impl LpBackend + ?Sized),
    ) -> Result<Array1<f64>, InverseOptimisationError> {
        if p.len() != self.n_vars() {
            return Err(InverseOptimisationError::dimension_mismatch(
                "objective",
                self.n_vars(),
                p.len(),
            ));
        }

        let mut problem = Problem::new(OptimisationDirection::Maximise);
        let x = match self.upper_bound() {
            UpperBound::Unbounded => p
                .iter()
                .map(|p_j| problem.add_var(*p_j, (0.0, f64::INFINITY)))
                .collect::<Vec<_>>(),
            UpperBound::BoundedAbove(x_ub) => p
                .iter()
                .zip(x_ub.iter())
                .map(|(p_j, ub)| problem.add_var(*p_j, (0.0, *ub)))
                .collect::<Vec<_>>(),
        };

        for (row, b_i) in self.a().rows().into_iter().zip(self.b().iter()) {
            problem.add_constraint(x.iter().copied().zip(row.iter().copied()), ComparisonOp::Le, *b_i);
        }

        match self.equalities() {
            Equalities::Absent => {}
            Equalities::Present { a_eq, b_eq } => {
                for (row, b_i) in a_eq.rows().into_iter().zip(b_eq.iter()) {
                    problem.add_constraint(
                        x.iter().copied().zip(row.iter().copied()),
                        ComparisonOp::Eq,
                        *b_i,
                    );
                }
            }
        }

        let solution = problem.solve_with(backend)?;
        Ok(Array1::from(solution.var_values(&x)))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use crate::{
        invopt_framework::invopt_error::InverseOptimisationError,
        invopt_objects::lp_instance::{Equalities, LpInstance, UpperBound},
        optimisation_algorithms::linear_programming::{Error, LpBackend, Problem, Solution},
        techniques::forward_problem::ForwardProblem,
    };

    fn assert_close(a: &ndarray::Array1<f64>, b: &ndarray::Array1<f64>) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-7, "{} != {}", a, b);
        }
    }

    #[test]
    fn solve_inequalities() {
        //max 3x + 2y s.t. x + y <= 4, x + 3y <= 6
        let instance =
            LpInstance::inequalities(array![[1.0, 1.0], [1.0, 3.0]], array![4.0, 6.0]).unwrap();
        let x = instance.solve_forward(&array![3.0, 2.0]).unwrap();
        assert_close(&x, &array![4.0, 0.0]);
    }

    #[test]
    fn solve_with_bounds_and_equalities() {
        let instance = LpInstance::new(
            array![[1.0, 1.0, 1.0]],
            array![10.0],
            Equalities::Present {
                a_eq: array![[1.0, -1.0, 0.0]],
                b_eq: array![0.0],
            },
            UpperBound::BoundedAbove(array![2.0, 3.0, 4.0]),
        )
        .unwrap();
        let x = instance.solve_forward(&array![1.0, 1.0, 1.0]).unwrap();
        assert_close(&x, &array![2.0, 2.0, 4.0]);
    }

    #[test]
    fn infeasible_instance() {
        //x_1 <= -1 contradicts x >= 0
        let instance = LpInstance::inequalities(array![[1.0, 0.0]], array![-1.0]).unwrap();
        assert_eq!(
            instance.solve_forward(&array![1.0, 1.0]),
            Err(InverseOptimisationError::Infeasible)
        );
    }

    #[test]
    fn unbounded_instance() {
        //nothing bounds x_2 from above
        let instance = LpInstance::inequalities(array![[1.0, 0.0]], array![1.0]).unwrap();
        assert_eq!(
            instance.solve_forward(&array![1.0, 1.0]),
            Err(InverseOptimisationError::Unbounded)
        );
    }

    #[test]
    fn objective_dimension_mismatch() {
        let instance = LpInstance::inequalities(array![[1.0, 1.0]], array![1.0]).unwrap();
        assert!(matches!(
            instance.solve_forward(&array![1.0, 1.0, 1.0]),
            Err(InverseOptimisationError::DimensionMismatch(_))
        ));
    }

    struct Broken;

    impl LpBackend for Broken {
        fn solve(&self, _problem: &Problem) -> Result<Solution, Error> {
            Err(Error::SolverError("backend unavailable".to_string()))
        }
    }

    #[test]
    fn backend_errors_are_translated() {
        let instance = LpInstance::inequalities(array![[1.0, 1.0]], array![1.0]).unwrap();
        assert_eq!(
            instance.solve_forward_with(&array![1.0, 1.0], &Broken),
            Err(InverseOptimisationError::SolverError(
                "backend unavailable".to_string()
            ))
        );
    }
}
