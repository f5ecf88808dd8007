use anyhow::{Result, anyhow};

/// Dimensions, sample sizes and sampling ranges of one synthetic experiment.
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentConfig {
    pub n_vars: usize,
    pub n_constrs: usize,
    /// number of equality constraints; 0 means the instances have none
    pub n_eq_constrs: usize,
    pub use_x_ub: bool,

    pub n_samples_train: usize,
    pub n_samples_test: usize,
    /// seed of the random source
    pub scenario_id: u64,

    pub p_range: (f64, f64),
    pub a_range: (f64, f64),
    pub x_ub_range: (f64, f64),
    pub a_eq_range: (f64, f64),
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            n_vars: 3,
            n_constrs: 4,
            n_eq_constrs: 0,
            use_x_ub: false,
            n_samples_train: 50,
            n_samples_test: 100,
            scenario_id: 0,
            p_range: (1.0, 10.0),
            a_range: (0.0, 10.0),
            x_ub_range: (5.0, 15.0),
            a_eq_range: (0.0, 10.0),
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_vars == 0 {
            return Err(anyhow!("the number of variables must be positive"));
        }
        if self.n_constrs == 0 {
            return Err(anyhow!("the number of inequality constraints must be positive"));
        }
        for (name, (lb, ub)) in [
            ("p range", self.p_range),
            ("A range", self.a_range),
            ("x_ub range", self.x_ub_range),
            ("A_eq range", self.a_eq_range),
        ] {
            if !lb.is_finite() || !ub.is_finite() || lb >= ub {
                return Err(anyhow!("the {} [{}, {}) is empty", name, lb, ub));
            }
        }
        if self.p_range.0 < 0.0 || self.x_ub_range.0 < 0.0 {
            return Err(anyhow!("objective coefficients and upper bounds must be nonnegative"));
        }
        Ok(())
    }
}
