//! Trade study configuration

use serde::{Deserialize, Serialize};

use crate::error::StudyError;
use crate::knee::KneeConfig;
use crate::model::Configuration;
use crate::sweep::SweepConfig;

/// Outer loop over one parameter, with an inner adaptive sweep per value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStudy {
    /// Parameter fixed to each of `values` in turn
    pub outer: String,
    pub values: Vec<f64>,
    pub sweep: SweepConfig,
    #[serde(default)]
    pub knee: Option<KneeConfig>,
    /// Parameters fixed for every iteration
    #[serde(default)]
    pub base: Configuration,
    /// Worker threads; defaults to the available parallelism
    #[serde(default)]
    pub workers: Option<usize>,
}

impl TradeStudy {
    pub fn new(outer: impl Into<String>, values: Vec<f64>, sweep: SweepConfig) -> Self {
        Self {
            outer: outer.into(),
            values,
            sweep,
            knee: None,
            base: Configuration::new(),
            workers: None,
        }
    }

    #[must_use]
    pub fn with_knee(mut self, knee: KneeConfig) -> Self {
        self.knee = Some(knee);
        self
    }

    #[must_use]
    pub fn with_base(mut self, base: Configuration) -> Self {
        self.base = base;
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Worker count actually used
    pub fn worker_count(&self) -> usize {
        self.workers
            .or_else(|| std::thread::available_parallelism().ok().map(usize::from))
            .unwrap_or(1)
            .min(self.values.len().max(1))
    }

    pub fn validate(&self) -> Result<(), StudyError> {
        if self.values.is_empty() {
            return Err(StudyError::Config("no outer values to iterate".to_string()));
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Err(StudyError::Config("outer values must be finite".to_string()));
        }
        if self.outer == self.sweep.variable {
            return Err(StudyError::Config(format!(
                "'{}' cannot be both the outer and the swept variable",
                self.outer
            )));
        }
        if self.workers == Some(0) {
            return Err(StudyError::Config("workers must be at least 1".to_string()));
        }
        self.sweep.validate()?;
        Ok(())
    }
}
