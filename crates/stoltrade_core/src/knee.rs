//! Sensitivity knee points
//!
//! The knee of a sweep is the swept value at which a constraint's
//! sensitivity crosses a threshold (1.0 by default). Below it the constraint
//! barely matters; above it tightening the constraint costs more than
//! proportionally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::interp::{Interpolant, Interpolation};
use crate::sweep::{Quantity, SweepResult};

const ROOT_ITERATIONS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KneeConfig {
    /// Constraint or constant whose sensitivity is inverted
    pub constraint: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Outputs interpolated at the knee
    #[serde(default)]
    pub outputs: Vec<String>,
}

fn default_threshold() -> f64 {
    1.0
}

impl KneeConfig {
    pub fn new(constraint: impl Into<String>) -> Self {
        Self {
            constraint: constraint.into(),
            threshold: default_threshold(),
            outputs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_outputs<S: Into<String>>(mut self, outputs: impl IntoIterator<Item = S>) -> Self {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knee {
    pub x: f64,
    /// Interpolated sensitivity at `x`
    pub sensitivity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KneePoint {
    Found(Knee),
    /// The curve crosses the threshold more than once; `first` is the
    /// crossing with the lowest swept value
    Ambiguous { first: Knee, crossings: usize },
    /// The curve stays on one side of the threshold. `range` is the observed
    /// `(min, max)` sensitivity, if there was any data.
    NoCrossing { range: Option<(f64, f64)> },
}

impl KneePoint {
    pub fn knee(&self) -> Option<&Knee> {
        match self {
            KneePoint::Found(knee) | KneePoint::Ambiguous { first: knee, .. } => Some(knee),
            KneePoint::NoCrossing { .. } => None,
        }
    }

    pub fn x(&self) -> Option<f64> {
        self.knee().map(|k| k.x)
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, KneePoint::Ambiguous { .. })
    }
}

/// Find where the sensitivity of `constraint` crosses `threshold` over the
/// solved samples of `sweep`.
pub fn find_knee(
    sweep: &SweepResult,
    constraint: &str,
    threshold: f64,
) -> Result<KneePoint, LookupError> {
    let points = sweep.series(constraint, Quantity::Sensitivity)?;
    let knee = find_knee_in(&points, threshold);
    tracing::debug!(constraint, threshold, ?knee, "knee search finished");
    Ok(knee)
}

/// Knee search over `(x, sensitivity)` points sorted by strictly increasing x
pub fn find_knee_in(points: &[(f64, f64)], threshold: f64) -> KneePoint {
    let range = points.iter().map(|p| p.1).fold(None, |acc, y| match acc {
        None => Some((y, y)),
        Some((lo, hi)) => Some((f64::min(lo, y), f64::max(hi, y))),
    });
    let Some((min, max)) = range else {
        return KneePoint::NoCrossing { range: None };
    };
    if points.len() < 2 || max < threshold || min > threshold {
        return KneePoint::NoCrossing { range };
    }

    let Ok(curve) = Interpolant::new(points, Interpolation::Cubic) else {
        return KneePoint::NoCrossing { range };
    };

    // Monotone cubic pieces cannot cross between nodes on the same side, so
    // node signs locate every crossing.
    let f: Vec<f64> = points.iter().map(|p| p.1 - threshold).collect();
    let mut crossings: Vec<Knee> = Vec::new();
    for i in 0..points.len() {
        if f[i] == 0.0 {
            crossings.push(Knee {
                x: points[i].0,
                sensitivity: points[i].1,
            });
        }
        if i + 1 < points.len() && f[i] * f[i + 1] < 0.0 {
            let x = root_in(&curve, i, threshold);
            crossings.push(Knee {
                x,
                sensitivity: curve.eval_in(i, x),
            });
        }
    }

    match crossings.as_slice() {
        [] => KneePoint::NoCrossing { range },
        [knee] => KneePoint::Found(*knee),
        [first, ..] => KneePoint::Ambiguous {
            first: *first,
            crossings: crossings.len(),
        },
    }
}

/// Bisection for `curve = threshold` inside node interval `i`
fn root_in(curve: &Interpolant, i: usize, threshold: f64) -> f64 {
    let mut lo = curve.xs()[i];
    let mut hi = curve.xs()[i + 1];
    let rising = curve.ys()[i + 1] > curve.ys()[i];
    for _ in 0..ROOT_ITERATIONS {
        let mid = f64::midpoint(lo, hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let below = curve.eval_in(i, mid) < threshold;
        if below == rising {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    f64::midpoint(lo, hi)
}

/// Interpolate `names` at `x` with the monotone cubic scheme. Names without
/// a value there (unsolved segment, outside the sweep) are left out.
pub fn outputs_at(
    sweep: &SweepResult,
    x: f64,
    names: &[String],
) -> Result<BTreeMap<String, f64>, LookupError> {
    let mut out = BTreeMap::new();
    for name in names {
        let value = sweep.sample_at(&[x], name, Quantity::Value, Interpolation::Cubic)?;
        if let Some(Some(v)) = value.first() {
            out.insert(name.clone(), *v);
        }
    }
    Ok(out)
}
