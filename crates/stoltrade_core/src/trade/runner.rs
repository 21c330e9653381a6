//! Trade study execution

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{StudyError, SweepError};
use crate::knee::{find_knee, outputs_at};
use crate::model::{ModelAdapter, check_known};
use crate::sweep::{SweepResult, SweepStatus, sweep_1d};

use super::config::TradeStudy;
use super::progress::TradeProgress;
use super::result::{IterationStatus, TradeCurve, TradeEntry};

/// Run one adaptive sweep (and knee search) per outer value.
///
/// Every iteration works on its own clone of `model` with a fresh
/// configuration, so iterations share nothing and may run in parallel. The
/// returned curve lists entries in the order of `study.values`.
///
/// An outer value whose feasible range is empty yields an `Unsolved` entry.
/// Configuration errors (unknown names, invalid settings) abort the study.
/// Once `progress` is cancelled the iterations that have not started are
/// returned as `Cancelled` entries.
pub fn run_trade_study<M>(
    model: &M,
    study: &TradeStudy,
    progress: Option<&TradeProgress>,
) -> Result<TradeCurve, StudyError>
where
    M: ModelAdapter + Clone + Sync,
{
    study.validate()?;
    let knee_names = study
        .knee
        .iter()
        .flat_map(|k| std::iter::once(&k.constraint).chain(&k.outputs))
        .map(String::as_str);
    check_known(
        model,
        std::iter::once(study.outer.as_str())
            .chain(study.base.names())
            .chain(study.sweep.tracked())
            .chain(knee_names),
    )?;
    if let Some(p) = progress {
        p.reset(study.values.len());
    }

    tracing::info!(
        outer = %study.outer,
        iterations = study.values.len(),
        workers = study.worker_count(),
        "trade study started"
    );

    #[cfg(feature = "parallel")]
    let entries: Vec<TradeEntry> = {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(study.worker_count())
            .build()
            .map_err(|e| StudyError::ThreadPool(e.to_string()))?;
        pool.install(|| {
            study
                .values
                .par_iter()
                .map(|&z| run_iteration(model, study, z, progress))
                .collect::<Result<Vec<_>, _>>()
        })?
    };

    #[cfg(not(feature = "parallel"))]
    let entries: Vec<TradeEntry> = study
        .values
        .iter()
        .map(|&z| run_iteration(model, study, z, progress))
        .collect::<Result<Vec<_>, _>>()?;

    let curve = TradeCurve {
        outer: study.outer.clone(),
        entries,
    };
    tracing::info!(
        outer = %study.outer,
        solved = curve.count(IterationStatus::Solved),
        partial = curve.count(IterationStatus::Partial),
        unsolved = curve.count(IterationStatus::Unsolved),
        cancelled = curve.count(IterationStatus::Cancelled),
        "trade study finished"
    );
    Ok(curve)
}

fn run_iteration<M: ModelAdapter + Clone>(
    base_model: &M,
    study: &TradeStudy,
    outer_value: f64,
    progress: Option<&TradeProgress>,
) -> Result<TradeEntry, StudyError> {
    if progress.is_some_and(TradeProgress::is_cancelled) {
        return Ok(TradeEntry::empty(
            outer_value,
            IterationStatus::Cancelled,
            None,
        ));
    }

    let config = study.base.with(&study.outer, outer_value);
    let mut model = base_model.clone();
    let entry = match sweep_1d(&mut model, &config, &study.sweep) {
        Ok(sweep) => evaluate_sweep(study, outer_value, sweep)?,
        Err(e @ SweepError::InfeasibleRange { .. }) => {
            tracing::warn!(
                outer = %study.outer,
                value = outer_value,
                error = %e,
                "no feasible range"
            );
            TradeEntry::empty(outer_value, IterationStatus::Unsolved, Some(e.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(p) = progress {
        p.increment();
    }
    tracing::debug!(
        outer = %study.outer,
        value = outer_value,
        status = ?entry.status,
        "trade iteration finished"
    );
    Ok(entry)
}

fn evaluate_sweep(
    study: &TradeStudy,
    outer_value: f64,
    sweep: SweepResult,
) -> Result<TradeEntry, StudyError> {
    let status = match sweep.status() {
        SweepStatus::Certified => IterationStatus::Solved,
        SweepStatus::Partial => IterationStatus::Partial,
        SweepStatus::Unsolved => IterationStatus::Unsolved,
    };

    let mut entry = TradeEntry::empty(outer_value, status, None);
    if let Some(knee_config) = &study.knee {
        let knee = find_knee(&sweep, &knee_config.constraint, knee_config.threshold)
            .map_err(SweepError::from)?;
        if let Some(x) = knee.x() {
            entry.knee_outputs =
                outputs_at(&sweep, x, &knee_config.outputs).map_err(SweepError::from)?;
        }
        entry.knee = Some(knee);
    }
    entry.sweep = Some(sweep);
    Ok(entry)
}
