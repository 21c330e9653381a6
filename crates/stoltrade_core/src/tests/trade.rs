//! Tests for trade study orchestration
//!
//! These tests verify:
//! - Entries follow the order of the outer values
//! - An infeasible outer value degrades only its own entry
//! - Knee curves across the family
//! - Cancellation and configuration errors

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{ModelError, SolveError, StudyError};
use crate::knee::KneeConfig;
use crate::model::{Configuration, Direction, Solution};
use crate::sweep::{BoundaryProbe, SweepConfig, Tolerance};
use crate::trade::{IterationStatus, TradeProgress, TradeStudy, run_trade_study};

use super::support::{ScriptedModel, runway_model};

/// Sensitivity `exp(-(x - k) / 50)` crosses 1.0 at `k = 100 + 25 z`.
/// Every solve with `z = 4` is infeasible; the probe on `x` reports 20
/// for `z = 6`, below the swept interval.
fn family_model() -> ScriptedModel {
    ScriptedModel::new(&["x", "z", "y", "c"], |fixed, objective| {
        let z = fixed
            .get("z")
            .ok_or_else(|| SolveError::solver("z not fixed"))?;
        if objective.variable == "x" {
            let bound = if z == 6.0 { 20.0 } else { 1_000.0 };
            let cost = match objective.direction {
                Direction::MinimizeReciprocal => 1.0 / bound,
                _ => bound,
            };
            return Ok(Solution::optimal(cost).with_value("x", bound));
        }
        if z == 4.0 {
            return Err(SolveError::infeasible("no design closes"));
        }
        let x = fixed
            .get("x")
            .ok_or_else(|| SolveError::solver("x not fixed"))?;
        let knee = 100.0 + 25.0 * z;
        let y = 1000.0 + 2.0e5 / x + z;
        Ok(Solution::optimal(y)
            .with_value("y", y)
            .with_sensitivity("c", (-(x - knee) / 50.0).exp()))
    })
}

fn study(values: Vec<f64>) -> TradeStudy {
    let sweep = SweepConfig::new("x", 50.0, 500.0, "y")
        .with_tolerance(Tolerance::Absolute(1.0))
        .with_probe(BoundaryProbe::None);
    TradeStudy::new("z", values, sweep).with_knee(KneeConfig::new("c").with_outputs(["y"]))
}

#[test]
fn test_infeasible_outer_value_degrades_one_entry() {
    let model = family_model();
    let curve = run_trade_study(&model, &study(vec![2.0, 4.0, 8.0]).with_workers(3), None).unwrap();

    let values: Vec<f64> = curve.entries.iter().map(|e| e.outer_value).collect();
    assert_eq!(values, vec![2.0, 4.0, 8.0]);

    let statuses: Vec<_> = curve.entries.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            IterationStatus::Solved,
            IterationStatus::Unsolved,
            IterationStatus::Solved
        ]
    );

    let bad = curve.entry(4.0).unwrap();
    assert_eq!(bad.knee.as_ref().and_then(|k| k.x()), None);
    assert!(bad.sweep.as_ref().unwrap().samples.iter().all(|s| !s.is_solved()));
}

#[test]
fn test_knee_curve_tracks_outer_value() {
    let model = family_model();
    let curve = run_trade_study(&model, &study(vec![0.0, 2.0, 8.0]), None).unwrap();

    let knees = curve.knee_curve();
    assert_eq!(knees.len(), 3);
    for (z, x) in knees {
        let expected = 100.0 + 25.0 * z;
        assert!((x - expected).abs() < 3.0, "z={z}: knee {x}, expected {expected}");
        let entry = curve.entry(z).unwrap();
        let y = entry.knee_outputs["y"];
        assert!((y - (1000.0 + 2.0e5 / x + z)).abs() < 1.0);
    }
}

#[test]
fn test_empty_feasible_range_is_noted() {
    let model = family_model();
    let mut s = study(vec![2.0, 6.0]);
    s.sweep.probe = BoundaryProbe::Upper;
    let curve = run_trade_study(&model, &s, None).unwrap();

    assert_eq!(curve.entries[0].status, IterationStatus::Solved);
    let entry = &curve.entries[1];
    assert_eq!(entry.status, IterationStatus::Unsolved);
    assert!(entry.sweep.is_none());
    assert!(entry.note.as_deref().unwrap().contains("20"));
}

#[test]
fn test_worker_count_does_not_change_results() {
    let model = family_model();
    let values = vec![0.0, 2.0, 4.0, 8.0];
    let serial = run_trade_study(&model, &study(values.clone()).with_workers(1), None).unwrap();
    let parallel = run_trade_study(&model, &study(values).with_workers(4), None).unwrap();
    assert_eq!(serial, parallel);
}

#[test]
fn test_cancelled_study_returns_valid_curve() {
    let model = family_model();
    let progress = TradeProgress::new(0);
    progress.cancel();
    let curve = run_trade_study(&model, &study(vec![2.0, 8.0]), Some(&progress)).unwrap();

    assert_eq!(curve.entries.len(), 2);
    assert_eq!(curve.count(IterationStatus::Cancelled), 2);
    assert!(curve.entries.iter().all(|e| e.sweep.is_none()));
    assert_eq!(progress.total(), 2);
    assert_eq!(progress.completed(), 0);
}

#[test]
fn test_progress_counts_iterations() {
    let model = family_model();
    let progress = TradeProgress::default();
    run_trade_study(&model, &study(vec![0.0, 2.0, 4.0]), Some(&progress)).unwrap();
    assert_eq!(progress.completed(), 3);
    assert_eq!(progress.total(), 3);
}

#[test]
fn test_unknown_outer_variable_is_fatal() {
    let model = family_model();
    let mut s = study(vec![1.0]);
    s.outer = "mass".to_string();
    let err = run_trade_study(&model, &s, None).unwrap_err();
    assert_eq!(err, StudyError::Model(ModelError::MissingVariable("mass".to_string())));

    let s = study(vec![1.0]).with_base(Configuration::new().with("ghost", 1.0));
    let err = run_trade_study(&model, &s, None).unwrap_err();
    assert_eq!(err, StudyError::Model(ModelError::MissingVariable("ghost".to_string())));
}

#[test]
fn test_unknown_knee_names_fail_before_solving() {
    let solves = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&solves);
    let model = ScriptedModel::new(&["x", "z", "y", "c"], move |fixed, _| {
        counter.fetch_add(1, Ordering::Relaxed);
        let x = fixed.get("x").unwrap_or(1.0);
        Ok(Solution::optimal(x).with_value("y", x).with_sensitivity("c", 1.0))
    });

    let s = study(vec![1.0, 2.0, 3.0]).with_knee(KneeConfig::new("c_typo"));
    let err = run_trade_study(&model, &s, None).unwrap_err();
    assert_eq!(err, StudyError::Model(ModelError::MissingVariable("c_typo".to_string())));

    let s = study(vec![1.0]).with_knee(KneeConfig::new("c").with_outputs(["y", "mass"]));
    let err = run_trade_study(&model, &s, None).unwrap_err();
    assert_eq!(err, StudyError::Model(ModelError::MissingVariable("mass".to_string())));

    assert_eq!(solves.load(Ordering::Relaxed), 0);
}

#[test]
fn test_payload_trade_on_posynomial_model() {
    let model = runway_model();
    let sweep = SweepConfig::new("S_runway", 50.0, 800.0, "W");
    let study = TradeStudy::new("W_pay", vec![400.0, 800.0, 1200.0], sweep)
        .with_knee(KneeConfig::new("landing").with_threshold(0.3).with_outputs(["W", "S"]));
    let curve = run_trade_study(&model, &study, None).unwrap();

    assert_eq!(curve.count(IterationStatus::Solved), 3);
    let knees = curve.knee_curve();
    assert_eq!(knees.len(), 3);
    // Heavier payloads need longer runways before landing stops dominating
    assert!(knees[0].1 < knees[1].1 && knees[1].1 < knees[2].1);
    for entry in &curve.entries {
        assert!(entry.knee_outputs.contains_key("W"));
        assert!(entry.knee_outputs.contains_key("S"));
    }
}
