use std::fmt::Display;

use anyhow::{Context, Result};
use ndarray::Array1;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    invopt_framework::experiment_config::ExperimentConfig,
    invopt_objects::observation::Observation,
    invopt_traits::invopt_trait_estimator::InverseEstimator,
    techniques::{
        data_generator::DataGenerator,
        evaluation::{
            decision_error, mean, parameter_error, percentile, relative_objective_gap,
        },
        robust_inverse_optimisation::RobustEstimator,
        strict_inverse_optimisation::StrictEstimator,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EstimatorKind {
    Strict,
    Robust,
}

impl EstimatorKind {
    pub fn create(&self) -> Box<dyn InverseEstimator> {
        match self {
            EstimatorKind::Strict => Box::new(StrictEstimator::new()),
            EstimatorKind::Robust => Box::new(RobustEstimator::new()),
        }
    }
}

/// The outcome of fitting on a training set and predicting a test set.
#[derive(Clone, Debug)]
pub struct ExperimentResult {
    pub train_noise: f64,
    pub estimator: EstimatorKind,
    pub n_samples_train: usize,
    pub a_shape: Option<(usize, usize)>,
    pub p_true: Array1<f64>,
    pub success: bool,
    pub p_hat: Option<Array1<f64>>,
    pub param_error: f64,
    pub avg_decision_error: f64,
    pub avg_relative_objective_gap: f64,
    pub p10_decision_error: f64,
    pub p90_decision_error: f64,
    pub p10_relative_objective_gap: f64,
    pub p90_relative_objective_gap: f64,
}

impl ExperimentResult {
    fn failed(
        train: &[Observation],
        p_true: &Array1<f64>,
        noise_level: f64,
        kind: EstimatorKind,
    ) -> Self {
        Self {
            train_noise: noise_level,
            estimator: kind,
            n_samples_train: train.len(),
            a_shape: a_shape(train),
            p_true: p_true.clone(),
            success: false,
            p_hat: None,
            param_error: f64::NAN,
            avg_decision_error: f64::NAN,
            avg_relative_objective_gap: f64::NAN,
            p10_decision_error: f64::NAN,
            p90_decision_error: f64::NAN,
            p10_relative_objective_gap: f64::NAN,
            p90_relative_objective_gap: f64::NAN,
        }
    }
}

fn a_shape(train: &[Observation]) -> Option<(usize, usize)> {
    train
        .first()
        .map(|observation| observation.instance().a().dim())
}

impl Display for ExperimentResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "estimator \t {}", self.estimator)?;
        writeln!(f, "train noise \t {}", self.train_noise)?;
        writeln!(f, "training samples \t {}", self.n_samples_train)?;
        match self.a_shape {
            Some((rows, cols)) => writeln!(f, "A shape \t {}x{}", rows, cols)?,
            None => writeln!(f, "A shape \t -")?,
        }
        writeln!(f, "p true \t {}", self.p_true)?;
        writeln!(f, "success \t {}", self.success)?;
        match &self.p_hat {
            Some(p_hat) => writeln!(f, "p hat \t {}", p_hat)?,
            None => writeln!(f, "p hat \t -")?,
        }
        writeln!(f, "parameter error \t {}", self.param_error)?;
        writeln!(f, "avg. decision error \t {}", self.avg_decision_error)?;
        writeln!(f, "avg. relative objective gap \t {}", self.avg_relative_objective_gap)?;
        writeln!(f, "P10 decision error \t {}", self.p10_decision_error)?;
        writeln!(f, "P90 decision error \t {}", self.p90_decision_error)?;
        writeln!(f, "P10 relative objective gap \t {}", self.p10_relative_objective_gap)?;
        write!(f, "P90 relative objective gap \t {}", self.p90_relative_objective_gap)
    }
}

/**
 * Fit an estimator of the given kind on the training data and evaluate it on the test data.
 *
 * A failed fit is part of the result. Failing to predict a test instance with a successful
 * estimate is an error.
 */
pub fn run_experiment(
    train: &[Observation],
    test: &[Observation],
    p_true: &Array1<f64>,
    noise_level: f64,
    kind: EstimatorKind,
) -> Result<ExperimentResult> {
    let mut estimator = kind.create();
    if let Err(err) = estimator.fit(train) {
        log::info!("{} estimator could not be fitted: {}", kind, err);
        return Ok(ExperimentResult::failed(train, p_true, noise_level, kind));
    }
    let p_hat = estimator
        .estimate()
        .cloned()
        .context("fitted estimator has no estimate")?;

    let param_error = parameter_error(p_true, &p_hat)?;

    let mut decision_errors = Vec::with_capacity(test.len());
    let mut objective_gaps = Vec::with_capacity(test.len());
    for (k, observation) in test.iter().enumerate() {
        let x_pred = estimator
            .predict(observation.instance())
            .with_context(|| format!("predicting test sample {}", k))?;
        decision_errors.push(decision_error(observation.x_opt(), &x_pred)?);
        objective_gaps.push(relative_objective_gap(p_true, observation.x_opt(), &x_pred)?);
    }

    Ok(ExperimentResult {
        train_noise: noise_level,
        estimator: kind,
        n_samples_train: train.len(),
        a_shape: a_shape(train),
        p_true: p_true.clone(),
        success: true,
        p_hat: Some(p_hat),
        param_error,
        avg_decision_error: mean(&decision_errors).unwrap_or(f64::NAN),
        avg_relative_objective_gap: mean(&objective_gaps).unwrap_or(f64::NAN),
        p10_decision_error: percentile(&decision_errors, 10.0).unwrap_or(f64::NAN),
        p90_decision_error: percentile(&decision_errors, 90.0).unwrap_or(f64::NAN),
        p10_relative_objective_gap: percentile(&objective_gaps, 10.0).unwrap_or(f64::NAN),
        p90_relative_objective_gap: percentile(&objective_gaps, 90.0).unwrap_or(f64::NAN),
    })
}

/// Generated data of one scenario: the hidden objective, a training set and a noiseless test set.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub p_true: Array1<f64>,
    pub train: Vec<Observation>,
    pub test: Vec<Observation>,
    pub train_noise: f64,
}

impl Scenario {
    /// Generate a scenario; `p_true` is sampled unless given.
    pub fn generate(
        config: &ExperimentConfig,
        p_true: Option<Array1<f64>>,
        train_noise: f64,
    ) -> Result<Self> {
        let mut generator = DataGenerator::new(config)?;
        let p_true = match p_true {
            Some(p_true) => {
                generator.set_ground_truth_to(p_true.clone())?;
                p_true
            }
            None => generator.set_ground_truth(),
        };
        let train = generator
            .generate_dataset(config.n_samples_train, train_noise)
            .context("generating the training data")?;
        let test = generator
            .generate_dataset(config.n_samples_test, 0.0)
            .context("generating the test data")?;
        Ok(Self {
            p_true,
            train,
            test,
            train_noise,
        })
    }

    pub fn run(&self, kind: EstimatorKind) -> Result<ExperimentResult> {
        run_experiment(&self.train, &self.test, &self.p_true, self.train_noise, kind)
    }
}
