/*!
A backend-neutral description of a linear program.

[Linear programming](https://en.wikipedia.org/wiki/Linear_programming) is a technique for
finding the minimum (or maximum) of a linear function of a set of continuous variables
subject to linear equality and inequality constraints.

A [`Problem`] only records variables, bounds and constraints. Solving it is delegated to
an [`LpBackend`]; the default backend is [`MicroLpBackend`], which wraps the `microlp`
crate. Every call to a backend builds its own solver session and drops it before
returning.

# Example

```
# use invopt::optimisation_algorithms::linear_programming::*;
// Maximise an objective function x + 2 * y of two variables x >= 0 and 0 <= y <= 3
let mut problem = Problem::new(OptimisationDirection::Maximise);
let x = problem.add_var(1.0, (0.0, f64::INFINITY));
let y = problem.add_var(2.0, (0.0, 3.0));

// subject to constraints: x + y <= 4 and 2 * x + y >= 2.
problem.add_constraint(&[(x, 1.0), (y, 1.0)], ComparisonOp::Le, 4.0);
problem.add_constraint(&[(x, 2.0), (y, 1.0)], ComparisonOp::Ge, 2.0);

// Optimal value is 7, achieved at x = 1 and y = 3.
let solution = problem.solve().unwrap();
assert!((solution.objective() - 7.0).abs() < 1e-9);
assert!((solution[x] - 1.0).abs() < 1e-9);
assert!((solution[y] - 3.0).abs() < 1e-9);
```
*/

pub use crate::optimisation_algorithms::linear_programming_microlp::MicroLpBackend;

/// An enum indicating whether to minimise or maximise objective function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimisationDirection {
    /// Minimise the objective function.
    Minimise,
    /// Maximise the objective function.
    Maximise,
}

/// A reference to a variable in a linear programming problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(pub(crate) usize);

impl Variable {
    /// Sequence number of the variable.
    ///
    /// Variables are referenced by their number in the addition sequence. The method returns
    /// this number.
    pub fn idx(&self) -> usize {
        self.0
    }
}

/// A sum of variables multiplied by constant coefficients used as a left-hand side
/// when defining constraints.
///
/// Adding a variable that is already present accumulates its coefficient.
#[derive(Clone, Debug, Default)]
pub struct LinearExpr {
    vars: Vec<usize>,
    coeffs: Vec<f64>,
}

impl LinearExpr {
    /// Creates an empty linear expression.
    pub fn empty() -> Self {
        Self {
            vars: vec![],
            coeffs: vec![],
        }
    }

    /// Add a single term to the linear expression.
    pub fn add(&mut self, var: Variable, coeff: f64) {
        match self.vars.iter().position(|v| *v == var.0) {
            Some(i) => self.coeffs[i] += coeff,
            None => {
                self.vars.push(var.0);
                self.coeffs.push(coeff);
            }
        }
    }

    /// Iterate over the (variable, coefficient) terms.
    pub fn terms(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.vars
            .iter()
            .zip(self.coeffs.iter())
            .map(|(v, c)| (Variable(*v), *c))
    }

    /// Value of the expression for the given variable assignment.
    pub fn evaluate(&self, solution: &Solution) -> f64 {
        self.terms().map(|(v, c)| c * solution[v]).sum()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// A single `variable * constant` term in a linear expression.
/// This is an auxiliary struct for specifying conversions.
#[doc(hidden)]
#[derive(Clone, Debug)]
pub struct LinearTerm(Variable, f64);

impl From<(Variable, f64)> for LinearTerm {
    fn from(term: (Variable, f64)) -> Self {
        LinearTerm(term.0, term.1)
    }
}

impl<'a> From<&'a (Variable, f64)> for LinearTerm {
    fn from(term: &'a (Variable, f64)) -> Self {
        LinearTerm(term.0, term.1)
    }
}

impl<I: IntoIterator<Item = impl Into<LinearTerm>>> From<I> for LinearExpr {
    fn from(iter: I) -> Self {
        let mut expr = LinearExpr::empty();
        for term in iter {
            let LinearTerm(var, coeff) = term.into();
            expr.add(var, coeff);
        }
        expr
    }
}

impl std::iter::Extend<(Variable, f64)> for LinearExpr {
    fn extend<I: IntoIterator<Item = (Variable, f64)>>(&mut self, iter: I) {
        for term in iter {
            self.add(term.0, term.1)
        }
    }
}

/// An operator specifying the relation between left-hand and right-hand sides of the constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComparisonOp {
    /// The == operator (equal to)
    Eq,
    /// The <= operator (less than or equal to)
    Le,
    /// The >= operator (greater than or equal to)
    Ge,
}

/// An error encountered while solving a problem.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Constrains can't simultaneously be satisfied.
    Infeasible,
    /// The objective function is unbounded.
    Unbounded,
    /// The backend failed for another reason.
    SolverError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Infeasible => write!(f, "problem is infeasible"),
            Error::Unbounded => write!(f, "problem is unbounded"),
            Error::SolverError(msg) => write!(f, "solver error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// The capability of solving a [`Problem`].
///
/// Implementations must report optimality through `Ok`, and infeasibility and
/// unboundedness through the matching [`Error`] variants. Any other failure is a
/// [`Error::SolverError`]; implementations must not panic.
pub trait LpBackend {
    fn solve(&self, problem: &Problem) -> Result<Solution, Error>;
}

/// A specification of a linear programming problem.
#[derive(Clone)]
pub struct Problem {
    direction: OptimisationDirection,
    obj_coeffs: Vec<f64>,
    var_mins: Vec<f64>,
    var_maxs: Vec<f64>,
    constraints: Vec<(LinearExpr, ComparisonOp, f64)>,
}

impl std::fmt::Debug for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only printing lengths here because actual data is probably huge.
        f.debug_struct("Problem")
            .field("direction", &self.direction)
            .field("num_vars", &self.obj_coeffs.len())
            .field("num_constraints", &self.constraints.len())
            .finish()
    }
}

impl Problem {
    /// Create a new problem instance.
    pub fn new(direction: OptimisationDirection) -> Self {
        Problem {
            direction,
            obj_coeffs: vec![],
            var_mins: vec![],
            var_maxs: vec![],
            constraints: vec![],
        }
    }

    /// Add a new variable to the problem.
    ///
    /// `obj_coeff` is a coefficient of the term in the objective function corresponding to this
    /// variable, `min` and `max` are the minimum and maximum (inclusive) bounds of this
    /// variable. If one of the bounds is absent, use `f64::NEG_INFINITY` for minimum and
    /// `f64::INFINITY` for maximum.
    pub fn add_var(&mut self, obj_coeff: f64, (min, max): (f64, f64)) -> Variable {
        let var = Variable(self.obj_coeffs.len());
        self.obj_coeffs.push(obj_coeff);
        self.var_mins.push(min);
        self.var_maxs.push(max);
        var
    }

    /// Add `n` variables sharing the same objective coefficient and bounds.
    pub fn add_vars(&mut self, n: usize, obj_coeff: f64, bounds: (f64, f64)) -> Vec<Variable> {
        (0..n).map(|_| self.add_var(obj_coeff, bounds)).collect()
    }

    /// Add a linear constraint to the problem.
    ///
    /// # Examples
    ///
    /// Left-hand side of the constraint can be specified in several ways:
    /// ```
    /// # use invopt::optimisation_algorithms::linear_programming::*;
    /// let mut problem = Problem::new(OptimisationDirection::Minimise);
    /// let x = problem.add_var(1.0, (0.0, f64::INFINITY));
    /// let y = problem.add_var(1.0, (0.0, f64::INFINITY));
    ///
    /// // * by passing a slice of pairs (useful when explicitly enumerating variables)
    /// problem.add_constraint(&[(x, 1.0), (y, 1.0)], ComparisonOp::Ge, 2.0);
    ///
    /// // * by passing an iterator of variable-coefficient pairs.
    /// let vars = [x, y];
    /// problem.add_constraint(vars.iter().map(|&v| (v, 1.0)), ComparisonOp::Ge, 2.0);
    ///
    /// // * by manually constructing a LinearExpr.
    /// let mut lhs = LinearExpr::empty();
    /// for &v in &vars {
    ///     lhs.add(v, 1.0);
    /// }
    /// problem.add_constraint(lhs, ComparisonOp::Ge, 2.0);
    /// ```
    pub fn add_constraint(&mut self, expr: impl Into<LinearExpr>, cmp_op: ComparisonOp, rhs: f64) {
        self.constraints.push((expr.into(), cmp_op, rhs));
    }

    pub fn direction(&self) -> OptimisationDirection {
        self.direction
    }

    pub fn num_vars(&self) -> usize {
        self.obj_coeffs.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Iterate over (objective coefficient, (min, max)) per variable.
    pub fn variables(&self) -> impl Iterator<Item = (f64, (f64, f64))> + '_ {
        self.obj_coeffs
            .iter()
            .zip(self.var_mins.iter().zip(self.var_maxs.iter()))
            .map(|(c, (min, max))| (*c, (*min, *max)))
    }

    pub fn constraints(&self) -> &[(LinearExpr, ComparisonOp, f64)] {
        &self.constraints
    }

    /// Solve the problem with the default backend.
    ///
    /// # Errors
    ///
    /// Will return an error, if the problem is infeasible (constraints can't be satisfied)
    /// or if the objective value is unbounded.
    pub fn solve(&self) -> Result<Solution, Error> {
        self.solve_with(&MicroLpBackend)
    }

    /// Solve the problem with the given backend.
    pub fn solve_with(&self, backend: &(impl LpBackend + ?Sized)) -> Result<Solution, Error> {
        log::trace!("solve {:?}", self);
        let solution = backend.solve(self)?;
        if solution.values.len() != self.num_vars() {
            return Err(Error::SolverError(format!(
                "backend returned {} values for {} variables",
                solution.values.len(),
                self.num_vars()
            )));
        }
        Ok(solution)
    }
}

/// A solution of a problem: optimal objective function value and variable values.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    objective: f64,
    values: Vec<f64>,
}

impl Solution {
    pub fn new(objective: f64, values: Vec<f64>) -> Self {
        Self { objective, values }
    }

    /// Optimal value of the objective function.
    pub fn objective(&self) -> f64 {
        self.objective
    }

    /// Values of a sequence of variables, in order.
    pub fn var_values(&self, vars: &[Variable]) -> Vec<f64> {
        vars.iter().map(|v| self.values[v.0]).collect()
    }
}

impl std::ops::Index<Variable> for Solution {
    type Output = f64;

    fn index(&self, var: Variable) -> &Self::Output {
        &self.values[var.0]
    }
}
