//! Learning-rate schedule selection. Each variant computes the LR for an
//! epoch in closed form from the base learning rate.

use std::f64::consts::PI;

use crate::error::ConfigError;

/// A learning-rate schedule, selected by `name` in configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum LrSchedule {
    /// Cosine annealing from the base LR down to `eta_min` over `t_max`
    /// epochs.
    Cosine {
        t_max: usize,
        #[serde(default)]
        eta_min: f64,
    },
    /// Cosine annealing with warm restarts: cycles of length `t0`, `t0 *
    /// t_mult`, `t0 * t_mult^2`, ...
    CosineRestarts {
        t0: usize,
        #[serde(default = "default_t_mult")]
        t_mult: usize,
        #[serde(default)]
        eta_min: f64,
    },
    /// Linear interpolation of the LR factor from `start_factor` to
    /// `end_factor` over `total_iters` epochs, constant afterwards.
    Linear {
        #[serde(default = "default_start_factor")]
        start_factor: f64,
        #[serde(default = "default_end_factor")]
        end_factor: f64,
        #[serde(default = "default_total_iters")]
        total_iters: usize,
    },
    /// Multiply the LR by `gamma` every `step_size` epochs.
    Step {
        step_size: usize,
        #[serde(default = "default_gamma")]
        gamma: f64,
    },
}

fn default_t_mult() -> usize {
    1
}

fn default_start_factor() -> f64 {
    1.0 / 3.0
}

fn default_end_factor() -> f64 {
    1.0
}

fn default_total_iters() -> usize {
    5
}

fn default_gamma() -> f64 {
    0.1
}

impl Default for LrSchedule {
    fn default() -> Self {
        LrSchedule::Cosine {
            t_max: 50,
            eta_min: 0.0,
        }
    }
}

impl LrSchedule {
    /// Learning rate for `epoch` given the base learning rate.
    pub fn lr_at(&self, base_lr: f64, epoch: usize) -> f64 {
        match *self {
            LrSchedule::Cosine { t_max, eta_min } => {
                cosine_lr(base_lr, eta_min, epoch, t_max)
            }
            LrSchedule::CosineRestarts {
                t0,
                t_mult,
                eta_min,
            } => {
                // Walk forward through cycles to find the position within the
                // current one.
                let mut t_i = t0;
                let mut t_cur = epoch;
                while t_cur >= t_i {
                    t_cur -= t_i;
                    t_i *= t_mult.max(1);
                }
                cosine_lr(base_lr, eta_min, t_cur, t_i)
            }
            LrSchedule::Linear {
                start_factor,
                end_factor,
                total_iters,
            } => {
                let progress = epoch.min(total_iters) as f64 / total_iters as f64;
                base_lr * (start_factor + (end_factor - start_factor) * progress)
            }
            LrSchedule::Step { step_size, gamma } => {
                base_lr * gamma.powi((epoch / step_size) as i32)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            LrSchedule::Cosine { t_max, .. } => {
                if t_max == 0 {
                    return Err(ConfigError::Validation(
                        "schedule.t_max must be >= 1".into(),
                    ));
                }
            }
            LrSchedule::CosineRestarts { t0, t_mult, .. } => {
                if t0 == 0 {
                    return Err(ConfigError::Validation("schedule.t0 must be >= 1".into()));
                }
                if t_mult == 0 {
                    return Err(ConfigError::Validation(
                        "schedule.t_mult must be >= 1".into(),
                    ));
                }
            }
            LrSchedule::Linear {
                start_factor,
                total_iters,
                ..
            } => {
                if start_factor <= 0.0 {
                    return Err(ConfigError::Validation(
                        "schedule.start_factor must be > 0".into(),
                    ));
                }
                if total_iters == 0 {
                    return Err(ConfigError::Validation(
                        "schedule.total_iters must be >= 1".into(),
                    ));
                }
            }
            LrSchedule::Step { step_size, gamma } => {
                if step_size == 0 {
                    return Err(ConfigError::Validation(
                        "schedule.step_size must be >= 1".into(),
                    ));
                }
                if gamma <= 0.0 {
                    return Err(ConfigError::Validation(
                        "schedule.gamma must be > 0".into(),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn cosine_lr(base_lr: f64, eta_min: f64, t_cur: usize, t_max: usize) -> f64 {
    eta_min + (base_lr - eta_min) * (1.0 + (PI * t_cur as f64 / t_max as f64).cos()) / 2.0
}
