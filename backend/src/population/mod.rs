//! Population generation for deterministic commuter creation.
//!
//! This module draws the static traits of every commuter from configured
//! distributions. All generation is deterministic based on the RNG seed.
//!
//! # Key Principles
//!
//! 1. **Determinism**: Same seed + same config → same population
//! 2. **Calibrated incomes**: Pareto shape solved so the distribution's mean
//!    and median match the configured targets
//! 3. **Fixed consumption order**: every income first, then per agent one
//!    ownership draw followed by one distance draw
//!
//! # Example
//!
//! ```
//! use commute_simulator_core_rs::population::{IncomeSampler, PopulationConfig};
//! use commute_simulator_core_rs::rng::RngManager;
//!
//! let sampler = IncomeSampler::new(&PopulationConfig::default()).unwrap();
//! let mut rng = RngManager::new(42);
//! let traits = sampler.sample_population(100, &mut rng);
//! assert_eq!(traits.len(), 100);
//! ```

use crate::models::agent::AgentTraits;
use crate::models::mode::{PerGroup, SocioGroup};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shape bracket searched during calibration.
pub const SHAPE_BRACKET: (f64, f64) = (1.01, 10.0);

const MAX_BISECTION_STEPS: usize = 200;
const SHAPE_TOLERANCE: f64 = 1e-12;

/// Errors raised while calibrating the income distribution
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CalibrationError {
    #[error("Income targets must be positive and finite: mean={mean}, median={median}")]
    NonPositiveTarget { mean: f64, median: f64 },

    #[error("Median income {median} must be below mean income {mean} for a Pareto fit")]
    MedianNotBelowMean { mean: f64, median: f64 },

    #[error("No Pareto shape in ({lower}, {upper}) matches mean={mean}, median={median}")]
    NoRootInBracket {
        lower: f64,
        upper: f64,
        mean: f64,
        median: f64,
    },
}

/// Log-normal parameters in log space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogNormalParams {
    pub mu: f64,
    pub sigma: f64,
}

/// Logistic car-ownership curve: `1 / (1 + exp(intercept − slope·income))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarOwnershipConfig {
    pub intercept: f64,
    pub income_slope: f64,
}

impl Default for CarOwnershipConfig {
    fn default() -> Self {
        Self {
            intercept: 10.0,
            income_slope: 0.0002,
        }
    }
}

impl CarOwnershipConfig {
    /// Probability that a commuter with this income owns a car.
    ///
    /// # Example
    /// ```
    /// use commute_simulator_core_rs::population::CarOwnershipConfig;
    ///
    /// let curve = CarOwnershipConfig::default();
    /// assert!((curve.probability(50_000.0) - 0.5).abs() < 1e-12);
    /// ```
    pub fn probability(&self, income: f64) -> f64 {
        1.0 / (1.0 + (self.intercept - self.income_slope * income).exp())
    }
}

/// Population generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub mean_income: f64,
    pub median_income: f64,

    /// Incomes below `lower_income_ratio × median` are `lower`
    pub lower_income_ratio: f64,

    /// Incomes above `upper_income_ratio × median` are `upper`
    pub upper_income_ratio: f64,

    /// Commute distance (miles) per class
    pub commute_distance: PerGroup<LogNormalParams>,

    pub car_ownership: CarOwnershipConfig,

    /// Fraction of the hourly wage counted as an agent's time value
    pub wage_time_fraction: f64,

    pub work_hours_per_year: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            mean_income: 88_000.0,
            median_income: 60_000.0,
            lower_income_ratio: 0.75,
            upper_income_ratio: 2.0,
            commute_distance: PerGroup {
                lower: LogNormalParams { mu: 2.0, sigma: 0.4 },
                middle: LogNormalParams { mu: 2.6, sigma: 0.5 },
                upper: LogNormalParams { mu: 2.3, sigma: 0.5 },
            },
            car_ownership: CarOwnershipConfig::default(),
            wage_time_fraction: 0.5,
            work_hours_per_year: 2080.0,
        }
    }
}

impl PopulationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.lower_income_ratio > 0.0 && self.lower_income_ratio <= self.upper_income_ratio) {
            return Err(format!(
                "income class ratios must satisfy 0 < lower ({}) <= upper ({})",
                self.lower_income_ratio, self.upper_income_ratio
            ));
        }
        for (group, params) in self.commute_distance.iter() {
            if !params.mu.is_finite() || !params.sigma.is_finite() || params.sigma <= 0.0 {
                return Err(format!(
                    "commute distance for {} needs finite mu and positive sigma, got mu={}, sigma={}",
                    group, params.mu, params.sigma
                ));
            }
        }
        if !self.car_ownership.intercept.is_finite() || !self.car_ownership.income_slope.is_finite()
        {
            return Err("car ownership curve must be finite".to_string());
        }
        if !(self.wage_time_fraction >= 0.0 && self.work_hours_per_year > 0.0) {
            return Err(format!(
                "time value needs wage_time_fraction >= 0 and work_hours_per_year > 0, got {} and {}",
                self.wage_time_fraction, self.work_hours_per_year
            ));
        }
        Ok(())
    }
}

/// Solve for the Pareto shape α whose mean and median match the targets.
///
/// With scale `x_m = mean·(α−1)/α` the median is `x_m·2^(1/α)`; α is found by
/// bisection on [`SHAPE_BRACKET`].
///
/// # Example
/// ```
/// use commute_simulator_core_rs::population::calibrate_pareto_shape;
///
/// let alpha = calibrate_pareto_shape(88_000.0, 60_000.0).unwrap();
/// let scale = 88_000.0 * (alpha - 1.0) / alpha;
/// assert!((scale * 2f64.powf(1.0 / alpha) - 60_000.0).abs() < 1e-6);
///
/// assert!(calibrate_pareto_shape(60_000.0, 60_000.0).is_err());
/// ```
pub fn calibrate_pareto_shape(mean: f64, median: f64) -> Result<f64, CalibrationError> {
    if !(mean.is_finite() && median.is_finite() && mean > 0.0 && median > 0.0) {
        return Err(CalibrationError::NonPositiveTarget { mean, median });
    }
    if median >= mean {
        return Err(CalibrationError::MedianNotBelowMean { mean, median });
    }

    let objective = |alpha: f64| mean * (alpha - 1.0) / alpha * 2f64.powf(1.0 / alpha) - median;

    let (mut lower, mut upper) = SHAPE_BRACKET;
    let mut f_lower = objective(lower);
    let f_upper = objective(upper);
    if f_lower == 0.0 {
        return Ok(lower);
    }
    if f_upper == 0.0 {
        return Ok(upper);
    }
    if f_lower.signum() == f_upper.signum() {
        return Err(CalibrationError::NoRootInBracket {
            lower,
            upper,
            mean,
            median,
        });
    }

    for _ in 0..MAX_BISECTION_STEPS {
        let mid = 0.5 * (lower + upper);
        let f_mid = objective(mid);
        if f_mid == 0.0 || (upper - lower) < SHAPE_TOLERANCE * mid {
            return Ok(mid);
        }
        if f_mid.signum() == f_lower.signum() {
            lower = mid;
            f_lower = f_mid;
        } else {
            upper = mid;
        }
    }

    Ok(0.5 * (lower + upper))
}

/// Pareto income distribution with minimum `scale` and tail index `shape`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParetoIncome {
    pub shape: f64,
    pub scale: f64,
}

impl ParetoIncome {
    /// Calibrate to a target mean and median.
    pub fn calibrated(mean: f64, median: f64) -> Result<Self, CalibrationError> {
        let shape = calibrate_pareto_shape(mean, median)?;
        Ok(Self {
            shape,
            scale: mean * (shape - 1.0) / shape,
        })
    }

    pub fn mean(&self) -> f64 {
        self.shape * self.scale / (self.shape - 1.0)
    }

    pub fn median(&self) -> f64 {
        self.scale * 2f64.powf(1.0 / self.shape)
    }

    /// One income draw (one RNG draw).
    pub fn sample(&self, rng: &mut RngManager) -> f64 {
        self.scale * (1.0 + rng.lomax(self.shape))
    }
}

/// Draws incomes and derives every commuter's static traits.
#[derive(Debug, Clone)]
pub struct IncomeSampler {
    config: PopulationConfig,
    distribution: ParetoIncome,
}

impl IncomeSampler {
    /// Create a sampler, calibrating the Pareto shape from the config targets.
    pub fn new(config: &PopulationConfig) -> Result<Self, CalibrationError> {
        let distribution = ParetoIncome::calibrated(config.mean_income, config.median_income)?;
        Ok(Self {
            config: config.clone(),
            distribution,
        })
    }

    pub fn distribution(&self) -> &ParetoIncome {
        &self.distribution
    }

    /// `n` i.i.d. income draws.
    pub fn draw_incomes(&self, n: usize, rng: &mut RngManager) -> Vec<f64> {
        (0..n).map(|_| self.distribution.sample(rng)).collect()
    }

    pub fn classify(&self, income: f64) -> SocioGroup {
        SocioGroup::classify(
            income,
            self.config.median_income,
            self.config.lower_income_ratio,
            self.config.upper_income_ratio,
        )
    }

    /// Derive ownership, class, distance and time value for one income.
    ///
    /// Consumes one Bernoulli draw then one log-normal draw.
    pub fn traits_for(&self, income: f64, rng: &mut RngManager) -> AgentTraits {
        let car_owner = rng.bernoulli(self.config.car_ownership.probability(income));
        let socio_group = self.classify(income);
        let params = self.config.commute_distance[socio_group];
        let distance = rng.log_normal(params.mu, params.sigma);
        let hourly_wage = income / self.config.work_hours_per_year;

        AgentTraits {
            income,
            socio_group,
            car_owner,
            distance,
            time_value: self.config.wage_time_fraction * hourly_wage,
        }
    }

    /// Full population in the fixed consumption order.
    pub fn sample_population(&self, n: usize, rng: &mut RngManager) -> Vec<AgentTraits> {
        let incomes = self.draw_incomes(n, rng);
        incomes
            .into_iter()
            .map(|income| self.traits_for(income, rng))
            .collect()
    }
}
