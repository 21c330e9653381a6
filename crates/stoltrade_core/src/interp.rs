//! One-dimensional interpolants over sampled sweep data
//!
//! Two schemes are provided: piecewise linear (the scheme the sweep certifies
//! its error bound against) and monotone piecewise cubic Hermite
//! (Fritsch–Carlson), which never overshoots monotone data and is used to
//! invert sensitivity curves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Interpolation scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interpolation {
    #[default]
    Linear,
    Cubic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpolationError {
    TooFewPoints,
    NotIncreasing,
    NonFinite,
}

impl fmt::Display for InterpolationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolationError::TooFewPoints => write!(f, "at least two points are required"),
            InterpolationError::NotIncreasing => write!(f, "x must be strictly increasing"),
            InterpolationError::NonFinite => write!(f, "x and y must be finite"),
        }
    }
}

impl std::error::Error for InterpolationError {}

/// Interpolant through `(x, y)` nodes. Evaluation outside the node range
/// returns `None`.
#[derive(Debug, Clone)]
pub struct Interpolant {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Hermite slopes at each node; `None` for linear
    slopes: Option<Vec<f64>>,
}

impl Interpolant {
    pub fn new(
        points: &[(f64, f64)],
        scheme: Interpolation,
    ) -> Result<Self, InterpolationError> {
        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
        validate(&xs, &ys)?;

        let slopes = match scheme {
            Interpolation::Linear => None,
            Interpolation::Cubic => Some(pchip_slopes(&xs, &ys)),
        };
        Ok(Self { xs, ys, slopes })
    }

    pub fn linear(points: &[(f64, f64)]) -> Result<Self, InterpolationError> {
        Self::new(points, Interpolation::Linear)
    }

    pub fn cubic(points: &[(f64, f64)]) -> Result<Self, InterpolationError> {
        Self::new(points, Interpolation::Cubic)
    }

    /// Node abscissas
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Node ordinates
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Covered range `(first x, last x)`
    pub fn range(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Index `i` of the interval `[x_i, x_{i+1}]` containing `x`
    fn interval(&self, x: f64) -> Option<usize> {
        let (lo, hi) = self.range();
        if !(lo..=hi).contains(&x) {
            return None;
        }
        let idx = self.xs.partition_point(|v| *v <= x);
        Some(idx.saturating_sub(1).min(self.xs.len() - 2))
    }

    pub fn eval(&self, x: f64) -> Option<f64> {
        let i = self.interval(x)?;
        Some(self.eval_in(i, x))
    }

    /// Evaluate on interval `i` without range checks
    pub(crate) fn eval_in(&self, i: usize, x: f64) -> f64 {
        let (x0, x1) = (self.xs[i], self.xs[i + 1]);
        let (y0, y1) = (self.ys[i], self.ys[i + 1]);
        match &self.slopes {
            None => {
                let w = (x - x0) / (x1 - x0);
                y0 + w * (y1 - y0)
            }
            Some(m) => hermite(x0, x1, y0, y1, m[i], m[i + 1], x),
        }
    }
}

fn validate(xs: &[f64], ys: &[f64]) -> Result<(), InterpolationError> {
    if xs.len() < 2 {
        return Err(InterpolationError::TooFewPoints);
    }
    if xs.iter().chain(ys).any(|v| !v.is_finite()) {
        return Err(InterpolationError::NonFinite);
    }
    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(InterpolationError::NotIncreasing);
    }
    Ok(())
}

/// Fritsch–Carlson slopes with the three-point end formula
fn pchip_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    if n == 2 {
        let m = (y[1] - y[0]) / (x[1] - x[0]);
        return vec![m, m];
    }

    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        if delta[k - 1] * delta[k] <= 0.0 {
            d[k] = 0.0;
        } else {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / delta[k - 1] + w2 / delta[k]);
        }
    }

    d[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

fn end_slope(h0: f64, h1: f64, del0: f64, del1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * del0 - h0 * del1) / (h0 + h1);
    if d.signum() != del0.signum() {
        0.0
    } else if del0.signum() != del1.signum() && d.abs() > 3.0 * del0.abs() {
        3.0 * del0
    } else {
        d
    }
}

#[inline]
fn hermite(x0: f64, x1: f64, y0: f64, y1: f64, m0: f64, m1: f64, x: f64) -> f64 {
    let h = x1 - x0;
    let s = (x - x0) / h;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * y0 + h10 * h * m0 + h01 * y1 + h11 * h * m1
}

/// `n` evenly spaced values from `lo` to `hi` inclusive
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![lo];
    }
    let step = (hi - lo) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { hi } else { lo + step * i as f64 })
        .collect()
}
