use ndarray::{Array1, Array2};

use crate::invopt_framework::invopt_error::InverseOptimisationError;

/// The optional block of equality constraints `A_eq x = b_eq`.
#[derive(Clone, Debug, PartialEq)]
pub enum Equalities {
    Absent,
    Present { a_eq: Array2<f64>, b_eq: Array1<f64> },
}

/// The optional elementwise upper bound on the decision variables.
#[derive(Clone, Debug, PartialEq)]
pub enum UpperBound {
    Unbounded,
    BoundedAbove(Array1<f64>),
}

/// The constraint data of one forward problem:
///
/// max p^T x
/// s.t. A x <= b
///      A_eq x = b_eq    (if present)
///      0 <= x <= x_ub   (if present)
///
/// The dimensions are checked on construction and the instance cannot be changed afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct LpInstance {
    a: Array2<f64>,
    b: Array1<f64>,
    equalities: Equalities,
    upper_bound: UpperBound,
}

impl LpInstance {
    pub fn new(
        a: Array2<f64>,
        b: Array1<f64>,
        equalities: Equalities,
        upper_bound: UpperBound,
    ) -> Result<Self, InverseOptimisationError> {
        let n_vars = a.ncols();
        if a.nrows() != b.len() {
            return Err(InverseOptimisationError::dimension_mismatch(
                "b",
                a.nrows(),
                b.len(),
            ));
        }
        if let Equalities::Present { a_eq, b_eq } = &equalities {
            if a_eq.nrows() != b_eq.len() {
                return Err(InverseOptimisationError::dimension_mismatch(
                    "b_eq",
                    a_eq.nrows(),
                    b_eq.len(),
                ));
            }
            if a_eq.ncols() != n_vars {
                return Err(InverseOptimisationError::dimension_mismatch(
                    "columns of A_eq",
                    n_vars,
                    a_eq.ncols(),
                ));
            }
        }
        if let UpperBound::BoundedAbove(x_ub) = &upper_bound {
            if x_ub.len() != n_vars {
                return Err(InverseOptimisationError::dimension_mismatch(
                    "x_ub",
                    n_vars,
                    x_ub.len(),
                ));
            }
        }
        Ok(Self {
            a,
            b,
            equalities,
            upper_bound,
        })
    }

    /// An instance with only the inequality block.
    pub fn inequalities(a: Array2<f64>, b: Array1<f64>) -> Result<Self, InverseOptimisationError> {
        Self::new(a, b, Equalities::Absent, UpperBound::Unbounded)
    }

    pub fn n_vars(&self) -> usize {
        self.a.ncols()
    }

    pub fn n_constrs(&self) -> usize {
        self.a.nrows()
    }

    pub fn n_eq_constrs(&self) -> usize {
        match &self.equalities {
            Equalities::Absent => 0,
            Equalities::Present { b_eq, .. } => b_eq.len(),
        }
    }

    pub fn a(&self) -> &Array2<f64> {
        &self.a
    }

    pub fn b(&self) -> &Array1<f64> {
        &self.b
    }

    pub fn equalities(&self) -> &Equalities {
        &self.equalities
    }

    pub fn upper_bound(&self) -> &UpperBound {
        &self.upper_bound
    }

    /// Whether x satisfies every constraint of the instance, up to `tolerance`.
    pub fn is_feasible(&self, x: &Array1<f64>, tolerance: f64) -> bool {
        if x.len() != self.n_vars() || x.iter().any(|v| *v < -tolerance) {
            return false;
        }
        let ax = self.a.dot(x);
        if ax.iter().zip(self.b.iter()).any(|(l, r)| *l > r + tolerance) {
            return false;
        }
        if let Equalities::Present { a_eq, b_eq } = &self.equalities {
            let ax = a_eq.dot(x);
            if ax.iter().zip(b_eq.iter()).any(|(l, r)| (l - r).abs() > tolerance) {
                return false;
            }
        }
        if let UpperBound::BoundedAbove(x_ub) = &self.upper_bound {
            if x.iter().zip(x_ub.iter()).any(|(v, u)| *v > u + tolerance) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn dimensions_are_checked() {
        assert!(matches!(
            LpInstance::inequalities(array![[1.0, 2.0]], array![1.0, 2.0]),
            Err(InverseOptimisationError::DimensionMismatch(_))
        ));

        let eq = Equalities::Present {
            a_eq: array![[1.0, 1.0, 1.0]],
            b_eq: array![1.0],
        };
        assert!(matches!(
            LpInstance::new(array![[1.0, 2.0]], array![1.0], eq, UpperBound::Unbounded),
            Err(InverseOptimisationError::DimensionMismatch(_))
        ));

        assert!(matches!(
            LpInstance::new(
                array![[1.0, 2.0]],
                array![1.0],
                Equalities::Absent,
                UpperBound::BoundedAbove(array![1.0])
            ),
            Err(InverseOptimisationError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn sizes() {
        let instance = LpInstance::new(
            array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
            array![1.0, 2.0, 3.0],
            Equalities::Present {
                a_eq: array![[1.0, 1.0]],
                b_eq: array![1.0],
            },
            UpperBound::Unbounded,
        )
        .unwrap();
        assert_eq!(instance.n_vars(), 2);
        assert_eq!(instance.n_constrs(), 3);
        assert_eq!(instance.n_eq_constrs(), 1);
    }

    #[test]
    fn feasibility() {
        let instance = LpInstance::new(
            array![[1.0, 1.0]],
            array![2.0],
            Equalities::Absent,
            UpperBound::BoundedAbove(array![1.5, 1.5]),
        )
        .unwrap();
        assert!(instance.is_feasible(&array![1.0, 1.0], 1e-9));
        assert!(!instance.is_feasible(&array![1.6, 0.0], 1e-9));
        assert!(!instance.is_feasible(&array![1.5, 1.5], 1e-9));
        assert!(!instance.is_feasible(&array![-0.1, 0.0], 1e-9));
    }
}
