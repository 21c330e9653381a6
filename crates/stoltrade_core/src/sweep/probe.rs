//! Feasibility-boundary probe run before a sweep

use crate::error::SweepError;
use crate::model::{Configuration, ModelAdapter, Objective};

use super::config::{BoundaryProbe, SweepConfig};

/// Interval left after clipping against the probed bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Clipped {
    pub lo: f64,
    pub hi: f64,
    pub bound: Option<f64>,
    pub solves: usize,
}

/// Solve with the swept variable free and pushed toward the probed edge, then
/// pull that edge of the requested interval back inside the bound by the
/// configured margin.
///
/// A probe that fails to solve is not fatal: the requested interval is swept
/// as given and the failing samples are recorded by the sweep.
pub(crate) fn clip_interval<M: ModelAdapter + ?Sized>(
    model: &mut M,
    base: &Configuration,
    config: &SweepConfig,
) -> Result<Clipped, SweepError> {
    let unclipped = Clipped {
        lo: config.lo,
        hi: config.hi,
        bound: None,
        solves: 0,
    };
    let objective = match config.probe {
        BoundaryProbe::None => return Ok(unclipped),
        BoundaryProbe::Upper => Objective::minimize_reciprocal(&config.variable),
        BoundaryProbe::Lower => Objective::minimize(&config.variable),
    };

    model.configure(base.clone())?;
    model.set_objective(objective)?;

    let unclipped = Clipped {
        solves: 1,
        ..unclipped
    };
    let bound = match model.solve() {
        Ok(sol) if sol.is_optimal() => match sol.value(&config.variable) {
            Ok(bound) => bound,
            Err(e) => {
                tracing::warn!(
                    variable = %config.variable,
                    error = %e,
                    "boundary probe returned no bound"
                );
                return Ok(unclipped);
            }
        },
        Ok(sol) => {
            tracing::warn!(
                variable = %config.variable,
                status = ?sol.status,
                "boundary probe did not converge, sweeping requested interval"
            );
            return Ok(unclipped);
        }
        Err(e) => {
            tracing::warn!(
                variable = %config.variable,
                error = %e,
                "boundary probe failed, sweeping requested interval"
            );
            return Ok(unclipped);
        }
    };

    let (lo, hi) = match config.probe {
        BoundaryProbe::Lower => (config.lo.max(bound * (1.0 + config.probe_margin)), config.hi),
        _ => (config.lo, config.hi.min(bound * (1.0 - config.probe_margin))),
    };
    if lo >= hi {
        return Err(SweepError::InfeasibleRange {
            lo: config.lo,
            hi: config.hi,
            bound,
        });
    }

    tracing::debug!(variable = %config.variable, bound, lo, hi, "probe clipped interval");
    Ok(Clipped {
        lo,
        hi,
        bound: Some(bound),
        solves: 1,
    })
}
