use ndarray::ArrayView1;

use crate::{
    invopt_objects::lp_instance::{Equalities, LpInstance, UpperBound},
    optimisation_algorithms::linear_programming::{
        ComparisonOp, LinearExpr, Problem, Solution, Variable,
    },
};

/// The dual variables of one observation, added to a joint problem, together with the
/// linear expression of its duality gap.
///
/// For the forward problem max p^T x s.t. Ax <= b, A_eq x = b_eq, 0 <= x <= x_ub, the dual is
///
/// min b^T lam + b_eq^T nu + x_ub^T mu
/// s.t. A^T lam + A_eq^T nu + mu >= p, lam >= 0, mu >= 0, nu free.
///
/// Dual feasibility together with a zero gap certifies that x_obs is optimal for p.
#[derive(Clone, Debug)]
pub struct DualCertificate {
    pub lam: Vec<Variable>,
    pub nu: Option<Vec<Variable>>,
    pub mu: Option<Vec<Variable>>,
    gap: LinearExpr,
}

impl DualCertificate {
    /// The duality gap (dual objective minus primal objective at x_obs) as an expression
    /// over the dual variables and p.
    pub fn gap(&self) -> &LinearExpr {
        &self.gap
    }

    /// The value of the duality gap in a solved joint problem.
    pub fn gap_value(&self, solution: &Solution) -> f64 {
        self.gap.evaluate(solution)
    }
}

/**
 * Add the dual variables of the instance to the problem, constrain them to be dual
 * feasible for the parameter variables p, and return the certificate.
 *
 * nu exists only if the instance has equality constraints, mu only if it is bounded above.
 * Entries of x_ub that are not finite do not bound their variable.
 * p must have one variable per column of the instance; the caller checks this.
 */
pub fn add_dual_certificate(
    problem: &mut Problem,
    p: &[Variable],
    instance: &LpInstance,
    x_obs: ArrayView1<f64>,
) -> DualCertificate {
    debug_assert_eq!(p.len(), instance.n_vars());

    let lam = problem.add_vars(instance.n_constrs(), 0.0, (0.0, f64::INFINITY));

    let (nu, a_eq_b_eq) = match instance.equalities() {
        Equalities::Absent => (None, None),
        Equalities::Present { a_eq, b_eq } => (
            Some(problem.add_vars(b_eq.len(), 0.0, (f64::NEG_INFINITY, f64::INFINITY))),
            Some((a_eq, b_eq)),
        ),
    };

    let (mu, x_ub) = match instance.upper_bound() {
        UpperBound::Unbounded => (None, None),
        //where x_ub_j is infinite, mu_j is pinned to zero and left out of the gap
        UpperBound::BoundedAbove(x_ub) => (
            Some(
                x_ub.iter()
                    .map(|u| {
                        let max = if u.is_finite() { f64::INFINITY } else { 0.0 };
                        problem.add_var(0.0, (0.0, max))
                    })
                    .collect::<Vec<_>>(),
            ),
            Some(x_ub),
        ),
    };

    //dual feasibility, one row per primal variable
    for (j, p_j) in p.iter().enumerate() {
        let mut lhs = LinearExpr::empty();
        lhs.extend(lam.iter().copied().zip(instance.a().column(j).iter().copied()));
        if let (Some(nu), Some((a_eq, _))) = (&nu, &a_eq_b_eq) {
            lhs.extend(nu.iter().copied().zip(a_eq.column(j).iter().copied()));
        }
        if let Some(mu) = &mu {
            lhs.add(mu[j], 1.0);
        }
        lhs.add(*p_j, -1.0);
        problem.add_constraint(lhs, ComparisonOp::Ge, 0.0);
    }

    //dual objective minus primal objective
    let mut gap = LinearExpr::empty();
    gap.extend(lam.iter().copied().zip(instance.b().iter().copied()));
    if let (Some(nu), Some((_, b_eq))) = (&nu, &a_eq_b_eq) {
        gap.extend(nu.iter().copied().zip(b_eq.iter().copied()));
    }
    if let (Some(mu), Some(x_ub)) = (&mu, x_ub) {
        gap.extend(
            mu.iter()
                .copied()
                .zip(x_ub.iter().copied())
                .filter(|(_, u)| u.is_finite()),
        );
    }
    gap.extend(p.iter().copied().zip(x_obs.iter().map(|x_j| -x_j)));

    DualCertificate { lam, nu, mu, gap }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use crate::{
        invopt_objects::lp_instance::{Equalities, LpInstance, UpperBound},
        optimisation_algorithms::linear_programming::{
            ComparisonOp, OptimisationDirection, Problem,
        },
        techniques::dual_certificate::add_dual_certificate,
    };

    #[test]
    fn optional_blocks_follow_the_instance() {
        let mut problem = Problem::new(OptimisationDirection::Minimise);
        let p = problem.add_vars(2, 0.0, (0.0, f64::INFINITY));

        let plain = LpInstance::inequalities(array![[1.0, 1.0]], array![1.0]).unwrap();
        let certificate = add_dual_certificate(&mut problem, &p, &plain, array![0.5, 0.5].view());
        assert_eq!(certificate.lam.len(), 1);
        assert!(certificate.nu.is_none());
        assert!(certificate.mu.is_none());

        let full = LpInstance::new(
            array![[1.0, 1.0], [2.0, 1.0]],
            array![1.0, 2.0],
            Equalities::Present {
                a_eq: array![[1.0, -1.0]],
                b_eq: array![0.0],
            },
            UpperBound::BoundedAbove(array![1.0, 1.0]),
        )
        .unwrap();
        let certificate = add_dual_certificate(&mut problem, &p, &full, array![0.5, 0.5].view());
        assert_eq!(certificate.lam.len(), 2);
        assert_eq!(certificate.nu.as_ref().map(Vec::len), Some(1));
        assert_eq!(certificate.mu.as_ref().map(Vec::len), Some(2));
        //2 + 1 + 2 dual variables and one p term per column
        assert_eq!(certificate.gap().len(), 7);
    }

    #[test]
    fn infinite_upper_bounds_stay_out_of_the_gap() {
        let mut problem = Problem::new(OptimisationDirection::Minimise);
        let p = problem.add_vars(2, 0.0, (0.0, f64::INFINITY));
        let instance = LpInstance::new(
            array![[1.0, 1.0]],
            array![1.0],
            Equalities::Absent,
            UpperBound::BoundedAbove(array![f64::INFINITY, 2.0]),
        )
        .unwrap();
        let certificate = add_dual_certificate(&mut problem, &p, &instance, array![1.0, 0.0].view());

        //lam, mu_2 and both p terms
        assert_eq!(certificate.gap().len(), 4);
        assert!(certificate.gap().terms().all(|(_, c)| c.is_finite()));
        let mu = certificate.mu.as_ref().unwrap();
        assert!(certificate.gap().terms().all(|(v, _)| v != mu[0]));
        assert_eq!(problem.variables().nth(mu[0].idx()), Some((0.0, (0.0, 0.0))));
    }

    #[test]
    fn gap_is_zero_for_an_optimal_observation() {
        //max p^T x s.t. x1 + x2 <= 1; x = (1, 0) is optimal for p = (0.75, 0.25)
        let instance = LpInstance::inequalities(array![[1.0, 1.0]], array![1.0]).unwrap();
        let mut problem = Problem::new(OptimisationDirection::Minimise);
        let p = problem.add_vars(2, 0.0, (0.0, f64::INFINITY));
        problem.add_constraint(&[(p[0], 1.0)], ComparisonOp::Eq, 0.75);
        problem.add_constraint(&[(p[1], 1.0)], ComparisonOp::Eq, 0.25);
        let certificate =
            add_dual_certificate(&mut problem, &p, &instance, array![1.0, 0.0].view());

        //the smallest dual objective is the optimal primal objective
        let mut objective = problem.clone();
        objective.add_constraint(certificate.gap().clone(), ComparisonOp::Le, 0.0);
        let solution = objective.solve().unwrap();
        assert!(certificate.gap_value(&solution).abs() < 1e-7);
        assert!((solution[certificate.lam[0]] - 0.75).abs() < 1e-7);
    }
}
