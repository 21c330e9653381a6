//! Sweep results: samples, segments and curve evaluation

use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::interp::{Interpolant, Interpolation};
use crate::model::{FailureKind, Solution};

use super::config::Tolerance;

/// Outcome of one solve at a swept value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SampleOutcome {
    Solved(Solution),
    Failed { kind: FailureKind, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub outcome: SampleOutcome,
}

impl Sample {
    pub fn solution(&self) -> Option<&Solution> {
        match &self.outcome {
            SampleOutcome::Solved(sol) => Some(sol),
            SampleOutcome::Failed { .. } => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.solution().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentStatus {
    /// Midpoint error within tolerance
    Certified,
    /// Refinement stopped by the sample budget or minimum width
    Approximate,
    /// No interpolable data
    Unsolved,
}

/// Sub-interval of a sweep. Owns the samples with `lo <= x < hi`; the last
/// segment of a sweep also owns its `hi`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSegment {
    pub lo: f64,
    pub hi: f64,
    /// Worst midpoint error over the tracked outputs, if one was measured
    pub error: Option<f64>,
    pub status: SegmentStatus,
}

impl SweepSegment {
    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }
}

/// Overall quality of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepStatus {
    Certified,
    Partial,
    Unsolved,
}

/// What to read from each solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    #[default]
    Value,
    Sensitivity,
}

/// Piecewise approximation of the tracked outputs over the swept interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub variable: String,
    /// Interval as requested, before the boundary probe
    pub requested: (f64, f64),
    /// Interval actually swept
    pub lo: f64,
    pub hi: f64,
    /// Feasible bound found by the probe
    pub bound: Option<f64>,
    pub tolerance: Tolerance,
    /// Every sample, sorted by `x`
    pub samples: Vec<Sample>,
    /// Contiguous segments covering `[lo, hi]`, sorted by `lo`
    pub segments: Vec<SweepSegment>,
    /// Solver calls made, probe included
    pub solves: usize,
}

impl SweepResult {
    pub fn status(&self) -> SweepStatus {
        let all = |s: SegmentStatus| self.segments.iter().all(|seg| seg.status == s);
        if all(SegmentStatus::Certified) {
            SweepStatus::Certified
        } else if all(SegmentStatus::Unsolved) {
            SweepStatus::Unsolved
        } else {
            SweepStatus::Partial
        }
    }

    /// Segment owning `x`
    pub fn segment_at(&self, x: f64) -> Option<&SweepSegment> {
        if !(self.lo..=self.hi).contains(&x) {
            return None;
        }
        let idx = self.segments.partition_point(|s| s.hi <= x);
        self.segments.get(idx).or_else(|| self.segments.last())
    }

    /// Samples owned by `segment`
    pub fn samples_in(&self, segment: &SweepSegment) -> &[Sample] {
        let start = self.samples.partition_point(|s| s.x < segment.lo);
        let end = if segment.hi >= self.hi {
            self.samples.len()
        } else {
            self.samples.partition_point(|s| s.x < segment.hi)
        };
        &self.samples[start..end.max(start)]
    }

    pub fn solved(&self) -> impl Iterator<Item = (f64, &Solution)> {
        self.samples
            .iter()
            .filter_map(|s| s.solution().map(|sol| (s.x, sol)))
    }

    pub fn failed_count(&self) -> usize {
        self.samples.iter().filter(|s| !s.is_solved()).count()
    }

    /// `(x, quantity)` over every solved sample
    pub fn series(&self, name: &str, quantity: Quantity) -> Result<Vec<(f64, f64)>, LookupError> {
        self.solved()
            .map(|(x, sol)| {
                let y = match quantity {
                    Quantity::Value => sol.value(name)?,
                    Quantity::Sensitivity => sol.sensitivity(name)?,
                };
                Ok((x, y))
            })
            .collect()
    }

    /// Evaluate `name` at each of `xs`. Points outside the swept interval or
    /// inside unsolved segments have no value.
    pub fn sample_at(
        &self,
        xs: &[f64],
        name: &str,
        quantity: Quantity,
        scheme: Interpolation,
    ) -> Result<Vec<Option<f64>>, LookupError> {
        let points = self.series(name, quantity)?;
        let interpolant = Interpolant::new(&points, scheme).ok();

        Ok(xs
            .iter()
            .map(|&x| {
                let segment = self.segment_at(x)?;
                if segment.status == SegmentStatus::Unsolved {
                    return None;
                }
                match &interpolant {
                    Some(f) => f.eval(x),
                    None => points.iter().find(|p| p.0 == x).map(|p| p.1),
                }
            })
            .collect())
    }
}
