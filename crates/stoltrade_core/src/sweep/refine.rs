//! Error-driven refinement of a 1-D sweep
//!
//! Segments are refined breadth-first: each pass measures the midpoint of
//! every pending segment before any child is looked at, so an exhausted
//! sample budget leaves the whole interval at a similar resolution instead of
//! one corner resolved to the last bit.

use std::collections::VecDeque;
use std::time::Instant;

use crate::error::{ModelError, SolveError, SweepError};
use crate::model::{
    Configuration, FailureKind, ModelAdapter, Objective, Solution, check_known,
};

use super::config::SweepConfig;
use super::probe::clip_interval;
use super::result::{Sample, SampleOutcome, SegmentStatus, SweepResult, SweepSegment};

/// Uniform segments solved before error-driven refinement starts
const SEED_SEGMENTS: usize = 4;

/// Segment waiting for refinement, by sample index
#[derive(Debug, Clone, Copy)]
struct Pending {
    a: usize,
    b: usize,
    /// Error measured on the parent segment
    inherited: Option<f64>,
}

/// Build an error-bounded piecewise approximation of the configured outputs
/// over `[config.lo, config.hi]`.
///
/// `base` holds the fixed parameters for every solve and must not fix the
/// swept variable. Solve failures are recorded in the result and never abort
/// the sweep. Configuration problems (unknown names, a fixed swept variable,
/// a probe that leaves nothing to sweep) are returned as errors.
pub fn sweep_1d<M: ModelAdapter + ?Sized>(
    model: &mut M,
    base: &Configuration,
    config: &SweepConfig,
) -> Result<SweepResult, SweepError> {
    config.validate()?;
    if base.contains(&config.variable) {
        return Err(ModelError::SweptVariableFixed(config.variable.clone()).into());
    }
    let tracked = config.tracked();
    check_known(
        &*model,
        base.names()
            .chain([config.variable.as_str()])
            .chain(tracked.iter().copied()),
    )?;

    let clipped = clip_interval(model, base, config)?;
    model.set_objective(Objective::minimize(&config.objective))?;

    tracing::info!(
        variable = %config.variable,
        lo = clipped.lo,
        hi = clipped.hi,
        tolerance = config.tolerance.value(),
        "sweep started"
    );

    let mut sweeper = Sweeper {
        model,
        base,
        config,
        tracked,
        samples: Vec::new(),
    };
    let segments = sweeper.refine(clipped.lo, clipped.hi)?;

    let solves = clipped.solves + sweeper.samples.len();
    let mut samples = sweeper.samples;
    samples.sort_by(|a, b| a.x.total_cmp(&b.x));
    samples.dedup_by(|a, b| a.x == b.x);

    let result = SweepResult {
        variable: config.variable.clone(),
        requested: (config.lo, config.hi),
        lo: clipped.lo,
        hi: clipped.hi,
        bound: clipped.bound,
        tolerance: config.tolerance,
        samples,
        segments,
        solves,
    };

    let uncertified = result
        .segments
        .iter()
        .filter(|s| s.status != SegmentStatus::Certified)
        .count();
    if uncertified > 0 {
        tracing::warn!(
            variable = %config.variable,
            uncertified,
            segments = result.segments.len(),
            failed = result.failed_count(),
            "sweep finished with uncertified segments"
        );
    } else {
        tracing::info!(
            variable = %config.variable,
            segments = result.segments.len(),
            solves,
            "sweep certified"
        );
    }
    Ok(result)
}

struct Sweeper<'a, M: ?Sized> {
    model: &'a mut M,
    base: &'a Configuration,
    config: &'a SweepConfig,
    tracked: Vec<&'a str>,
    samples: Vec<Sample>,
}

impl<'a, M: ModelAdapter + ?Sized> Sweeper<'a, M> {
    fn refine(&mut self, lo: f64, hi: f64) -> Result<Vec<SweepSegment>, SweepError> {
        let min_width = self.config.min_width_fraction * (hi - lo);
        let seeds = SEED_SEGMENTS.min(self.config.max_samples - 1).max(1);
        let mut nodes = Vec::with_capacity(seeds + 1);
        for i in 0..=seeds {
            let x = if i == seeds {
                hi
            } else {
                lo + (hi - lo) * i as f64 / seeds as f64
            };
            nodes.push(self.solve_at(x)?);
        }

        let mut queue: VecDeque<Pending> = nodes
            .windows(2)
            .map(|w| Pending {
                a: w[0],
                b: w[1],
                inherited: None,
            })
            .collect();
        let mut segments = Vec::new();

        while let Some(seg) = queue.pop_front() {
            let (xa, xb) = (self.samples[seg.a].x, self.samples[seg.b].x);
            let width = xb - xa;
            let xm = f64::midpoint(xa, xb);
            let splittable = xm > xa && xm < xb;
            let budget_left = self.samples.len() < self.config.max_samples;

            let ya = self.tracked_values(seg.a);
            let yb = self.tracked_values(seg.b);
            match (ya, yb) {
                (None, None) => segments.push(unsolved(xa, xb)),

                (Some(ya), Some(yb)) => {
                    if !budget_left || !splittable {
                        segments.push(SweepSegment {
                            lo: xa,
                            hi: xb,
                            error: seg.inherited,
                            status: SegmentStatus::Approximate,
                        });
                        continue;
                    }

                    let m = self.solve_at(xm)?;
                    let Some(ym) = self.tracked_values(m) else {
                        queue.push_back(Pending { a: seg.a, b: m, inherited: None });
                        queue.push_back(Pending { a: m, b: seg.b, inherited: None });
                        continue;
                    };

                    let error = ya
                        .iter()
                        .zip(&yb)
                        .zip(&ym)
                        .map(|((a, b), m)| self.config.tolerance.error(f64::midpoint(*a, *b), *m))
                        .map(|e| if e.is_nan() { f64::INFINITY } else { e })
                        .fold(0.0, f64::max);

                    if self.config.tolerance.accepts(error) {
                        segments.push(SweepSegment {
                            lo: xa,
                            hi: xb,
                            error: Some(error),
                            status: SegmentStatus::Certified,
                        });
                    } else if width / 2.0 < min_width {
                        segments.push(SweepSegment {
                            lo: xa,
                            hi: xb,
                            error: Some(error),
                            status: SegmentStatus::Approximate,
                        });
                    } else {
                        queue.push_back(Pending { a: seg.a, b: m, inherited: Some(error) });
                        queue.push_back(Pending { a: m, b: seg.b, inherited: Some(error) });
                    }
                }

                // One endpoint failed: bisect toward the feasibility boundary
                _ => {
                    if width <= min_width || !budget_left || !splittable {
                        segments.push(unsolved(xa, xb));
                        continue;
                    }
                    let m = self.solve_at(xm)?;
                    queue.push_back(Pending { a: seg.a, b: m, inherited: None });
                    queue.push_back(Pending { a: m, b: seg.b, inherited: None });
                }
            }
        }

        segments.sort_by(|a, b| a.lo.total_cmp(&b.lo));
        Ok(segments)
    }

    /// Solve at `x` and record the sample; returns its index
    fn solve_at(&mut self, x: f64) -> Result<usize, SweepError> {
        self.model
            .configure(self.base.with(&self.config.variable, x))?;

        let started = Instant::now();
        let result = self.model.solve();
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = match result {
            Ok(_) if self.config.timeout_ms.is_some_and(|limit| elapsed_ms > limit) => {
                let err = SolveError::Timeout {
                    elapsed_ms,
                    limit_ms: self.config.timeout_ms.unwrap_or_default(),
                };
                failed(&err)
            }
            Ok(sol) if sol.is_optimal() => match self.missing_output(&sol) {
                None => SampleOutcome::Solved(sol),
                Some(name) => SampleOutcome::Failed {
                    kind: FailureKind::SolverError,
                    reason: format!("solution has no value for '{name}'"),
                },
            },
            Ok(sol) => SampleOutcome::Failed {
                kind: FailureKind::from(sol.status),
                reason: format!("solver returned {:?}", sol.status),
            },
            Err(e) => failed(&e),
        };

        if let SampleOutcome::Failed { kind, reason } = &outcome {
            tracing::debug!(variable = %self.config.variable, x, ?kind, %reason, "sample failed");
        }
        self.samples.push(Sample { x, outcome });
        Ok(self.samples.len() - 1)
    }

    /// First tracked output the solution does not report
    fn missing_output(&self, sol: &Solution) -> Option<&'a str> {
        self.tracked
            .iter()
            .copied()
            .find(|name| sol.value(name).is_err())
    }

    /// Tracked output values of a sample, `None` if it failed
    fn tracked_values(&self, idx: usize) -> Option<Vec<f64>> {
        let sol = self.samples[idx].solution()?;
        self.tracked.iter().map(|name| sol.value(name).ok()).collect()
    }
}

fn failed(err: &SolveError) -> SampleOutcome {
    SampleOutcome::Failed {
        kind: FailureKind::from(err),
        reason: err.to_string(),
    }
}

fn unsolved(lo: f64, hi: f64) -> SweepSegment {
    SweepSegment {
        lo,
        hi,
        error: None,
        status: SegmentStatus::Unsolved,
    }
}
