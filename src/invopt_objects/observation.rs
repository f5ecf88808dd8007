use ndarray::Array1;

use crate::{
    invopt_framework::invopt_error::InverseOptimisationError,
    invopt_objects::lp_instance::LpInstance,
};

/// One recorded decision: the constraints the agent faced, the decision that was optimal
/// for the true objective, and the (possibly noisy) decision that was observed.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    instance: LpInstance,
    x_opt: Array1<f64>,
    x_obs: Array1<f64>,
}

impl Observation {
    pub fn new(
        instance: LpInstance,
        x_opt: Array1<f64>,
        x_obs: Array1<f64>,
    ) -> Result<Self, InverseOptimisationError> {
        if x_opt.len() != instance.n_vars() {
            return Err(InverseOptimisationError::dimension_mismatch(
                "x_opt",
                instance.n_vars(),
                x_opt.len(),
            ));
        }
        if x_obs.len() != instance.n_vars() {
            return Err(InverseOptimisationError::dimension_mismatch(
                "x_obs",
                instance.n_vars(),
                x_obs.len(),
            ));
        }
        Ok(Self {
            instance,
            x_opt,
            x_obs,
        })
    }

    /// An observation without noise.
    pub fn noiseless(instance: LpInstance, x: Array1<f64>) -> Result<Self, InverseOptimisationError> {
        Self::new(instance, x.clone(), x)
    }

    pub fn instance(&self) -> &LpInstance {
        &self.instance
    }

    pub fn x_opt(&self) -> &Array1<f64> {
        &self.x_opt
    }

    pub fn x_obs(&self) -> &Array1<f64> {
        &self.x_obs
    }

    pub fn n_vars(&self) -> usize {
        self.instance.n_vars()
    }
}

/// Checks that the dataset is non-empty and that every observation has the dimension of the
/// first one. Returns that dimension.
pub fn validate_dataset(dataset: &[Observation]) -> Result<usize, InverseOptimisationError> {
    let first = dataset.first().ok_or(InverseOptimisationError::EmptyDataset)?;
    let n_vars = first.n_vars();
    for (k, observation) in dataset.iter().enumerate() {
        if observation.n_vars() != n_vars {
            return Err(InverseOptimisationError::DimensionMismatch(format!(
                "observation {} has {} variables, expected {}",
                k,
                observation.n_vars(),
                n_vars
            )));
        }
    }
    Ok(n_vars)
}
