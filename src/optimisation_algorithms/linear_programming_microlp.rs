use crate::optimisation_algorithms::linear_programming::{
    ComparisonOp, Error, LpBackend, OptimisationDirection, Problem, Solution,
};

/// Solves problems with the simplex implementation of the `microlp` crate.
///
/// A fresh `microlp::Problem` is built for every call and dropped before returning.
#[derive(Clone, Copy, Debug, Default)]
pub struct MicroLpBackend;

impl From<OptimisationDirection> for microlp::OptimizationDirection {
    fn from(value: OptimisationDirection) -> Self {
        match value {
            OptimisationDirection::Minimise => microlp::OptimizationDirection::Minimize,
            OptimisationDirection::Maximise => microlp::OptimizationDirection::Maximize,
        }
    }
}

impl From<ComparisonOp> for microlp::ComparisonOp {
    fn from(value: ComparisonOp) -> Self {
        match value {
            ComparisonOp::Eq => microlp::ComparisonOp::Eq,
            ComparisonOp::Le => microlp::ComparisonOp::Le,
            ComparisonOp::Ge => microlp::ComparisonOp::Ge,
        }
    }
}

impl From<microlp::Error> for Error {
    fn from(value: microlp::Error) -> Self {
        match value {
            microlp::Error::Infeasible => Error::Infeasible,
            microlp::Error::Unbounded => Error::Unbounded,
            other => Error::SolverError(other.to_string()),
        }
    }
}

impl LpBackend for MicroLpBackend {
    fn solve(&self, problem: &Problem) -> Result<Solution, Error> {
        let mut session = microlp::Problem::new(problem.direction().into());

        let mut vars = Vec::with_capacity(problem.num_vars());
        for (obj_coeff, (min, max)) in problem.variables() {
            if min.is_nan() || max.is_nan() || obj_coeff.is_nan() {
                return Err(Error::SolverError(format!(
                    "variable {} has an undefined coefficient or bound",
                    vars.len()
                )));
            }
            vars.push(session.add_var(obj_coeff, (min, max)));
        }

        for (expr, cmp_op, rhs) in problem.constraints() {
            if !rhs.is_finite() || expr.terms().any(|(_, c)| !c.is_finite()) {
                return Err(Error::SolverError(
                    "constraint has a non-finite coefficient".to_string(),
                ));
            }
            //microlp keeps explicit zeros in its sparse rows
            let terms = expr
                .terms()
                .filter(|(_, coeff)| *coeff != 0.0)
                .map(|(var, coeff)| (vars[var.idx()], coeff))
                .collect::<Vec<_>>();
            session.add_constraint(terms, (*cmp_op).into(), *rhs);
        }

        let solution = session.solve()?;
        let values = vars.iter().map(|var| solution[*var]).collect();
        Ok(Solution::new(solution.objective(), values))
    }
}

#[cfg(test)]
mod tests {
    use crate::optimisation_algorithms::linear_programming::{
        ComparisonOp, Error, LpBackend, OptimisationDirection, Problem,
    };

    use super::MicroLpBackend;

    #[test]
    fn minimise_through_backend() {
        let mut problem = Problem::new(OptimisationDirection::Minimise);
        let v1 = problem.add_var(2.0, (0.0, f64::INFINITY));
        let v2 = problem.add_var(1.0, (0.0, f64::INFINITY));
        problem.add_constraint(&[(v1, 1.0), (v2, 1.0)], ComparisonOp::Le, 4.0);
        problem.add_constraint(&[(v1, 1.0), (v2, 1.0)], ComparisonOp::Ge, 2.0);
        problem.add_constraint(&[(v1, -1.0), (v2, 1.0)], ComparisonOp::Ge, 3.0);

        let sol = MicroLpBackend.solve(&problem).unwrap();
        assert!((sol[v1] - 0.0).abs() < 1e-7);
        assert!((sol[v2] - 3.0).abs() < 1e-7);
        assert!((sol.objective() - 3.0).abs() < 1e-7);
    }

    #[test]
    fn nan_bound_is_a_solver_error() {
        let mut problem = Problem::new(OptimisationDirection::Minimise);
        problem.add_var(1.0, (f64::NAN, 1.0));
        assert!(matches!(
            MicroLpBackend.solve(&problem),
            Err(Error::SolverError(_))
        ));
    }
}
