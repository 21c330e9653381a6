//! Adaptive sweep configuration

use serde::{Deserialize, Serialize};

use crate::error::SweepError;

/// Interpolation error tolerance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// Error in the output's own units
    Absolute(f64),
    /// Error as a fraction of the solved midpoint value
    Relative(f64),
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Relative(0.01)
    }
}

impl Tolerance {
    pub fn value(&self) -> f64 {
        match self {
            Tolerance::Absolute(v) | Tolerance::Relative(v) => *v,
        }
    }

    /// Error of `predicted` against the solved value `actual`
    pub fn error(&self, predicted: f64, actual: f64) -> f64 {
        let diff = (predicted - actual).abs();
        match self {
            Tolerance::Absolute(_) => diff,
            Tolerance::Relative(_) => diff / actual.abs().max(f64::MIN_POSITIVE),
        }
    }

    pub fn accepts(&self, error: f64) -> bool {
        error <= self.value()
    }
}

/// Which edge of the swept interval the boundary probe looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryProbe {
    /// Push the swept variable as high as feasible and clip `hi`
    #[default]
    Upper,
    /// Push the swept variable as low as feasible and clip `lo`
    Lower,
    /// Sweep the requested interval as given
    None,
}

/// One adaptive 1-D sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Swept model parameter
    pub variable: String,
    pub lo: f64,
    pub hi: f64,

    /// Output minimized at every sample; always tracked
    pub objective: String,

    /// Further outputs whose interpolation error is certified
    #[serde(default)]
    pub outputs: Vec<String>,

    #[serde(default)]
    pub tolerance: Tolerance,

    #[serde(default)]
    pub probe: BoundaryProbe,

    /// Fraction the probed bound is pulled back into the interval
    #[serde(default = "default_probe_margin")]
    pub probe_margin: f64,

    /// Solve budget for refinement, including the uniform seed points
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    /// Narrowest segment refined further, as a fraction of the swept width
    #[serde(default = "default_min_width_fraction")]
    pub min_width_fraction: f64,

    /// Solves slower than this are discarded and recorded as failures.
    ///
    /// The limit is checked once the solver returns; a solve is never
    /// interrupted, so a solver that hangs also hangs the sweep.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_probe_margin() -> f64 {
    0.01
}

fn default_max_samples() -> usize {
    256
}

fn default_min_width_fraction() -> f64 {
    1e-3
}

impl SweepConfig {
    pub fn new(
        variable: impl Into<String>,
        lo: f64,
        hi: f64,
        objective: impl Into<String>,
    ) -> Self {
        Self {
            variable: variable.into(),
            lo,
            hi,
            objective: objective.into(),
            outputs: Vec::new(),
            tolerance: Tolerance::default(),
            probe: BoundaryProbe::default(),
            probe_margin: default_probe_margin(),
            max_samples: default_max_samples(),
            min_width_fraction: default_min_width_fraction(),
            timeout_ms: None,
        }
    }

    #[must_use]
    pub fn with_outputs<S: Into<String>>(mut self, outputs: impl IntoIterator<Item = S>) -> Self {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_probe(mut self, probe: BoundaryProbe) -> Self {
        self.probe = probe;
        self
    }

    #[must_use]
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    #[must_use]
    pub fn with_min_width_fraction(mut self, fraction: f64) -> Self {
        self.min_width_fraction = fraction;
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Objective followed by the extra outputs, without duplicates
    pub fn tracked(&self) -> Vec<&str> {
        let mut names = vec![self.objective.as_str()];
        for name in &self.outputs {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    pub fn validate(&self) -> Result<(), SweepError> {
        if !(self.lo.is_finite() && self.hi.is_finite() && self.lo < self.hi) {
            return Err(SweepError::InvalidInterval {
                lo: self.lo,
                hi: self.hi,
            });
        }
        let tol = self.tolerance.value();
        if !(tol > 0.0 && tol.is_finite()) {
            return Err(SweepError::Config(format!(
                "tolerance must be positive, got {tol}"
            )));
        }
        if !(0.0..1.0).contains(&self.probe_margin) {
            return Err(SweepError::Config(format!(
                "probe margin must be in [0, 1), got {}",
                self.probe_margin
            )));
        }
        if self.max_samples < 2 {
            return Err(SweepError::Config(
                "at least two samples are needed to seed a sweep".to_string(),
            ));
        }
        if !(self.min_width_fraction > 0.0 && self.min_width_fraction < 1.0) {
            return Err(SweepError::Config(format!(
                "minimum width fraction must be in (0, 1), got {}",
                self.min_width_fraction
            )));
        }
        Ok(())
    }
}
