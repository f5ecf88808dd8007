use anyhow::{Context, Result, anyhow};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    invopt_framework::experiment_config::ExperimentConfig,
    invopt_objects::{
        lp_instance::{Equalities, LpInstance, UpperBound},
        observation::Observation,
    },
    techniques::forward_problem::ForwardProblem,
};

/// Probability that a noisy observation is an outlier.
pub const OUTLIER_PROBABILITY: f64 = 0.2;
/// Offset added to the first objective coefficient of an outlier.
pub const OUTLIER_OFFSET: f64 = 30.0;
/// Noisy objective coefficients are kept at least this large.
pub const MIN_NOISY_COEFFICIENT: f64 = 1e-4;

/// Samples random feasible instances and the decisions of an agent optimising a hidden
/// objective. The random source is seeded from the scenario id, so a generator replays the
/// same data for the same configuration, independent of platform.
#[derive(Debug)]
pub struct DataGenerator {
    config: ExperimentConfig,
    rng: ChaCha8Rng,
    p_true: Option<Array1<f64>>,
}

impl DataGenerator {
    pub fn new(config: &ExperimentConfig) -> Result<Self> {
        config.validate().context("validating the experiment configuration")?;
        Ok(Self {
            config: config.clone(),
            rng: ChaCha8Rng::seed_from_u64(config.scenario_id),
            p_true: None,
        })
    }

    /// Sample the hidden objective coefficients uniformly from the configured range.
    pub fn set_ground_truth(&mut self) -> Array1<f64> {
        let (lb, ub) = self.config.p_range;
        let p_true = Array1::from_shape_fn(self.config.n_vars, |_| self.rng.gen_range(lb..ub));
        self.p_true = Some(p_true.clone());
        p_true
    }

    /// Use the given hidden objective coefficients instead of sampling them.
    pub fn set_ground_truth_to(&mut self, p_true: Array1<f64>) -> Result<()> {
        if p_true.len() != self.config.n_vars {
            return Err(anyhow!(
                "ground truth has {} coefficients, expected {}",
                p_true.len(),
                self.config.n_vars
            ));
        }
        self.p_true = Some(p_true);
        Ok(())
    }

    /**
     * Create n_samples observations.
     *
     * Each instance is built around a random interior point x0, which keeps it feasible.
     * With noise_level > 0, the observed decision is optimal for a perturbed objective:
     * Gaussian noise with standard deviation noise_level, plus an occasional outlier on
     * the first coefficient.
     */
    pub fn generate_dataset(&mut self, n_samples: usize, noise_level: f64) -> Result<Vec<Observation>> {
        if !noise_level.is_finite() || noise_level < 0.0 {
            return Err(anyhow!("noise level must be a nonnegative number, got {}", noise_level));
        }
        let p_true = self
            .p_true
            .clone()
            .ok_or_else(|| anyhow!("the ground truth has not been set"))?;

        let mut dataset = Vec::with_capacity(n_samples);
        for k in 0..n_samples {
            let instance = self.sample_instance()?;

            let x_opt = instance
                .solve_forward(&p_true)
                .with_context(|| format!("solving sample {} with the true objective", k))?;

            let x_obs = if noise_level > 0.0 {
                let p_noisy = self.perturb(&p_true, noise_level);
                instance
                    .solve_forward(&p_noisy)
                    .with_context(|| format!("solving sample {} with a noisy objective", k))?
            } else {
                x_opt.clone()
            };

            dataset.push(Observation::new(instance, x_opt, x_obs)?);
        }
        log::info!(
            "generated {} observations with noise level {}",
            dataset.len(),
            noise_level
        );
        Ok(dataset)
    }

    fn sample_instance(&mut self) -> Result<LpInstance> {
        let n = self.config.n_vars;
        let m = self.config.n_constrs;

        let (upper_bound, x0) = if self.config.use_x_ub {
            let (lb, ub) = self.config.x_ub_range;
            let x_ub = Array1::from_shape_fn(n, |_| self.rng.gen_range(lb..ub));
            let x0 = x_ub.mapv(|u| self.rng.gen_range(0.0..u));
            (UpperBound::BoundedAbove(x_ub), x0)
        } else {
            let x0 = Array1::from_shape_fn(n, |_| self.rng.gen_range(0.0..10.0));
            (UpperBound::Unbounded, x0)
        };

        let (lb, ub) = self.config.a_range;
        let a = Array2::from_shape_fn((m, n), |_| self.rng.gen_range(lb..ub));
        //strictly positive slack
        let slack = Array1::from_shape_fn(m, |_| self.rng.gen_range(0.1..2.0));
        let b = a.dot(&x0) + slack;

        let equalities = if self.config.n_eq_constrs > 0 {
            let (lb, ub) = self.config.a_eq_range;
            let a_eq =
                Array2::from_shape_fn((self.config.n_eq_constrs, n), |_| self.rng.gen_range(lb..ub));
            let b_eq = a_eq.dot(&x0);
            Equalities::Present { a_eq, b_eq }
        } else {
            Equalities::Absent
        };

        Ok(LpInstance::new(a, b, equalities, upper_bound)?)
    }

    fn perturb(&mut self, p_true: &Array1<f64>, noise_level: f64) -> Array1<f64> {
        let mut noise = p_true.mapv(|_| noise_level * self.standard_normal());
        if self.rng.gen_range(0.0..1.0) > 1.0 - OUTLIER_PROBABILITY {
            noise[0] += OUTLIER_OFFSET;
        }
        (p_true + &noise).mapv(|p| p.max(MIN_NOISY_COEFFICIENT))
    }

    /// Box-Muller transform of two uniform samples.
    fn standard_normal(&mut self) -> f64 {
        let u1: f64 = self.rng.gen_range(f64::EPSILON..1.0);
        let u2: f64 = self.rng.gen_range(0.0..1.0);
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}
