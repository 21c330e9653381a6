//! Printable summaries of sweeps and trade studies
//!
//! Reports are flattened copies of the engine results: plain rows that render
//! as aligned text tables or serialize to YAML.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use color_eyre::eyre::{Result, eyre};
use serde::Serialize;
use stoltrade_core::interp::{Interpolation, linspace};
use stoltrade_core::knee::{KneeConfig, KneePoint, find_knee, outputs_at};
use stoltrade_core::sweep::{Quantity, SegmentStatus, SweepConfig, SweepResult, SweepStatus};
use stoltrade_core::trade::{IterationStatus, TradeCurve};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KneeRow {
    pub x: f64,
    pub sensitivity: f64,
    /// Number of threshold crossings; more than one means the knee is ambiguous
    pub crossings: usize,
    pub outputs: BTreeMap<String, f64>,
}

impl KneeRow {
    fn from_point(point: &KneePoint, outputs: BTreeMap<String, f64>) -> Option<Self> {
        let crossings = match point {
            KneePoint::Found(_) => 1,
            KneePoint::Ambiguous { crossings, .. } => *crossings,
            KneePoint::NoCrossing { .. } => return None,
        };
        let knee = point.knee()?;
        Some(Self {
            x: knee.x,
            sensitivity: knee.sensitivity,
            crossings,
            outputs,
        })
    }
}

fn knee_note(point: &KneePoint, threshold: f64) -> Option<String> {
    match point {
        KneePoint::NoCrossing { range: Some((lo, hi)) } => Some(format!(
            "sensitivity stays within [{lo:.4}, {hi:.4}], never crossing {threshold}"
        )),
        KneePoint::NoCrossing { range: None } => Some("no sensitivity data".to_string()),
        KneePoint::Ambiguous { crossings, .. } => Some(format!(
            "{crossings} crossings of {threshold}; reporting the first"
        )),
        KneePoint::Found(_) => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRow {
    pub lo: f64,
    pub hi: f64,
    pub error: Option<f64>,
    pub status: SegmentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    pub x: f64,
    /// Interpolated values; absent where the sweep has no data
    pub values: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub variable: String,
    pub lo: f64,
    pub hi: f64,
    pub bound: Option<f64>,
    pub status: SweepStatus,
    pub solves: usize,
    pub samples: usize,
    pub failed: usize,
    pub segments: Vec<SegmentRow>,
    pub knee: Option<KneeRow>,
    pub note: Option<String>,
    pub grid: Vec<GridRow>,
}

impl SweepReport {
    /// Summarize `sweep`, resampling the tracked outputs (and the knee
    /// constraint's sensitivity) on `grid` uniform points
    pub fn new(
        sweep: &SweepResult,
        config: &SweepConfig,
        knee: Option<&KneeConfig>,
        grid: usize,
    ) -> Result<Self> {
        let (knee_row, note) = match knee {
            Some(k) => {
                let point = find_knee(sweep, &k.constraint, k.threshold)?;
                let outputs = match point.x() {
                    Some(x) => outputs_at(sweep, x, &k.outputs)?,
                    None => BTreeMap::new(),
                };
                (
                    KneeRow::from_point(&point, outputs),
                    knee_note(&point, k.threshold),
                )
            }
            None => (None, None),
        };

        let xs = linspace(sweep.lo, sweep.hi, grid);
        let mut columns: Vec<(String, Vec<Option<f64>>)> = Vec::new();
        for name in config.tracked() {
            let ys = sweep.sample_at(&xs, name, Quantity::Value, Interpolation::Cubic)?;
            columns.push((name.to_string(), ys));
        }
        if let Some(k) = knee {
            let ys = sweep.sample_at(
                &xs,
                &k.constraint,
                Quantity::Sensitivity,
                Interpolation::Cubic,
            )?;
            columns.push((format!("d[{}]", k.constraint), ys));
        }
        let grid = xs
            .iter()
            .enumerate()
            .map(|(i, &x)| GridRow {
                x,
                values: columns.iter().map(|(n, ys)| (n.clone(), ys[i])).collect(),
            })
            .collect();

        Ok(Self {
            variable: sweep.variable.clone(),
            lo: sweep.lo,
            hi: sweep.hi,
            bound: sweep.bound,
            status: sweep.status(),
            solves: sweep.solves,
            samples: sweep.samples.len(),
            failed: sweep.failed_count(),
            segments: sweep
                .segments
                .iter()
                .map(|s| SegmentRow {
                    lo: s.lo,
                    hi: s.hi,
                    error: s.error,
                    status: s.status,
                })
                .collect(),
            knee: knee_row,
            note,
            grid,
        })
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Sweep of {} over [{}, {}]: {:?}",
            self.variable,
            fmt_num(self.lo),
            fmt_num(self.hi),
            self.status
        );
        if let Some(bound) = self.bound {
            let _ = writeln!(out, "  feasible bound: {}", fmt_num(bound));
        }
        let _ = writeln!(
            out,
            "  {} samples, {} failed, {} solves, {} segments",
            self.samples,
            self.failed,
            self.solves,
            self.segments.len()
        );
        let uncertified: Vec<&SegmentRow> = self
            .segments
            .iter()
            .filter(|s| s.status != SegmentStatus::Certified)
            .collect();
        for seg in uncertified {
            let _ = writeln!(
                out,
                "  {:?} segment [{}, {}]",
                seg.status,
                fmt_num(seg.lo),
                fmt_num(seg.hi)
            );
        }

        if let Some(knee) = &self.knee {
            let _ = writeln!(
                out,
                "  knee at {} = {} (sensitivity {:.4})",
                self.variable,
                fmt_num(knee.x),
                knee.sensitivity
            );
            for (name, value) in &knee.outputs {
                let _ = writeln!(out, "    {name} = {}", fmt_num(*value));
            }
        }
        if let Some(note) = &self.note {
            let _ = writeln!(out, "  note: {note}");
        }

        if let Some(first) = self.grid.first() {
            let _ = writeln!(out);
            let names: Vec<&String> = first.values.keys().collect();
            let mut header = format!("{:>12}", self.variable);
            for name in &names {
                let _ = write!(header, " {name:>14}");
            }
            let _ = writeln!(out, "{header}");
            for row in &self.grid {
                let _ = write!(out, "{:>12}", fmt_num(row.x));
                for name in &names {
                    let cell = row.values.get(*name).copied().flatten();
                    let _ = write!(out, " {:>14}", cell.map_or("-".to_string(), fmt_num));
                }
                let _ = writeln!(out);
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRow {
    pub outer_value: f64,
    pub status: IterationStatus,
    pub lo: Option<f64>,
    pub hi: Option<f64>,
    pub samples: usize,
    pub knee: Option<KneeRow>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeReport {
    pub outer: String,
    pub variable: String,
    pub rows: Vec<TradeRow>,
}

impl TradeReport {
    pub fn new(curve: &TradeCurve, variable: &str, knee: Option<&KneeConfig>) -> Self {
        let rows = curve
            .entries
            .iter()
            .map(|entry| {
                let knee_row = entry
                    .knee
                    .as_ref()
                    .and_then(|p| KneeRow::from_point(p, entry.knee_outputs.clone()));
                let knee_msg = match (&entry.knee, knee) {
                    (Some(p), Some(k)) => knee_note(p, k.threshold),
                    _ => None,
                };
                let note = match (&entry.note, knee_msg) {
                    (Some(a), Some(b)) => Some(format!("{a}; {b}")),
                    (a, b) => a.clone().or(b),
                };
                TradeRow {
                    outer_value: entry.outer_value,
                    status: entry.status,
                    lo: entry.sweep.as_ref().map(|s| s.lo),
                    hi: entry.sweep.as_ref().map(|s| s.hi),
                    samples: entry.sweep.as_ref().map_or(0, |s| s.samples.len()),
                    knee: knee_row,
                    note,
                }
            })
            .collect();
        Self {
            outer: curve.outer.clone(),
            variable: variable.to_string(),
            rows,
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let names: Vec<String> = self
            .rows
            .iter()
            .filter_map(|r| r.knee.as_ref())
            .flat_map(|k| k.outputs.keys().cloned())
            .fold(Vec::new(), |mut acc, n| {
                if !acc.contains(&n) {
                    acc.push(n);
                }
                acc
            });

        let mut header = format!(
            "{:>12} {:>10} {:>8} {:>14}",
            self.outer,
            "status",
            "samples",
            format!("knee {}", self.variable)
        );
        for name in &names {
            let _ = write!(header, " {name:>14}");
        }
        let _ = writeln!(out, "{header}");

        for row in &self.rows {
            let _ = write!(
                out,
                "{:>12} {:>10} {:>8} {:>14}",
                fmt_num(row.outer_value),
                format!("{:?}", row.status),
                row.samples,
                row.knee.as_ref().map_or("-".to_string(), |k| fmt_num(k.x))
            );
            for name in &names {
                let cell = row.knee.as_ref().and_then(|k| k.outputs.get(name)).copied();
                let _ = write!(out, " {:>14}", cell.map_or("-".to_string(), fmt_num));
            }
            let _ = writeln!(out);
        }

        for row in &self.rows {
            if let Some(note) = &row.note {
                let _ = writeln!(out, "  {} = {}: {note}", self.outer, fmt_num(row.outer_value));
            }
        }
        out
    }
}

/// Serialize any report as YAML
pub fn to_yaml<T: Serialize>(report: &T) -> Result<String> {
    serde_saphyr::to_string(report).map_err(|e| eyre!("failed to serialize report: {e}"))
}

/// Four significant digits, without exponent for everyday magnitudes
fn fmt_num(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let magnitude = v.abs();
    if (1e-3..1e6).contains(&magnitude) {
        let decimals = (3 - magnitude.log10().floor() as i32).max(0) as usize;
        format!("{v:.decimals$}")
    } else {
        format!("{v:.3e}")
    }
}

#[cfg(test)]
mod tests {
    use stoltrade_core::model::{FailureKind, Solution};
    use stoltrade_core::sweep::{Sample, SampleOutcome, SweepSegment, Tolerance};
    use stoltrade_core::trade::TradeEntry;

    use super::*;

    fn sweep() -> SweepResult {
        let samples = [0.0, 1.0, 2.0, 3.0]
            .into_iter()
            .map(|x| Sample {
                x,
                outcome: SampleOutcome::Solved(
                    Solution::optimal(10.0 - x)
                        .with_value("y", 10.0 - x)
                        .with_sensitivity("c", 2.0 - x),
                ),
            })
            .chain(std::iter::once(Sample {
                x: 4.0,
                outcome: SampleOutcome::Failed {
                    kind: FailureKind::Infeasible,
                    reason: "infeasible".to_string(),
                },
            }))
            .collect();
        let seg = |lo: f64, hi: f64, status| SweepSegment {
            lo,
            hi,
            error: None,
            status,
        };
        SweepResult {
            variable: "x".to_string(),
            requested: (0.0, 4.0),
            lo: 0.0,
            hi: 4.0,
            bound: None,
            tolerance: Tolerance::Absolute(0.1),
            samples,
            segments: vec![
                seg(0.0, 3.0, SegmentStatus::Certified),
                seg(3.0, 4.0, SegmentStatus::Unsolved),
            ],
            solves: 5,
        }
    }

    #[test]
    fn test_sweep_report() {
        let config = SweepConfig::new("x", 0.0, 4.0, "y");
        let knee = KneeConfig::new("c").with_outputs(["y"]);
        let report = SweepReport::new(&sweep(), &config, Some(&knee), 5).unwrap();

        assert_eq!(report.status, SweepStatus::Partial);
        assert_eq!(report.failed, 1);
        let k = report.knee.as_ref().unwrap();
        assert!((k.x - 1.0).abs() < 1e-9);
        assert!((k.outputs["y"] - 9.0).abs() < 1e-9);
        assert!(report.note.is_none());

        assert_eq!(report.grid.len(), 5);
        assert_eq!(report.grid[0].values["y"], Some(10.0));
        assert_eq!(report.grid[4].values["y"], None);
        assert_eq!(report.grid[2].values["d[c]"], Some(0.0));

        let text = report.to_text();
        assert!(text.contains("Sweep of x over [0, 4.000]: Partial"));
        assert!(text.contains("Unsolved segment [3.000, 4.000]"));
        assert!(text.contains("knee at x = 1.000"));
    }

    #[test]
    fn test_missing_output_is_an_error() {
        let config = SweepConfig::new("x", 0.0, 4.0, "mass");
        assert!(SweepReport::new(&sweep(), &config, None, 5).is_err());
    }

    #[test]
    fn test_trade_report() {
        let partial = TradeEntry {
            outer_value: 400.0,
            status: IterationStatus::Partial,
            sweep: Some(sweep()),
            knee: Some(KneePoint::NoCrossing {
                range: Some((0.1, 0.2)),
            }),
            knee_outputs: BTreeMap::new(),
            note: None,
        };
        let unsolved = TradeEntry {
            outer_value: 800.0,
            status: IterationStatus::Unsolved,
            sweep: None,
            knee: None,
            knee_outputs: BTreeMap::new(),
            note: Some("no feasible range".to_string()),
        };
        let curve = TradeCurve {
            outer: "W_pay".to_string(),
            entries: vec![partial, unsolved],
        };
        let knee = KneeConfig::new("c");
        let report = TradeReport::new(&curve, "x", Some(&knee));

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].samples, 5);
        assert!(report.rows[0].knee.is_none());
        assert!(report.rows[0].note.as_ref().unwrap().contains("never crossing"));
        assert_eq!(report.rows[1].note.as_deref(), Some("no feasible range"));

        let text = report.to_text();
        assert!(text.contains("knee x"));
        assert!(text.contains("W_pay = 800.0: no feasible range"));

        let yaml = to_yaml(&report).unwrap();
        assert!(yaml.contains("outer: W_pay"));
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(0.0), "0");
        assert_eq!(fmt_num(-0.0), "0");
        assert_eq!(fmt_num(-2.5), "-2.500");
        assert_eq!(fmt_num(1.5), "1.500");
        assert_eq!(fmt_num(154.27), "154.3");
        assert_eq!(fmt_num(3200.0), "3200");
        assert_eq!(fmt_num(1.5e7), "1.500e7");
    }
}
