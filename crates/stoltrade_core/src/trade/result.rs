//! Trade curves

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::knee::KneePoint;
use crate::sweep::SweepResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IterationStatus {
    /// Every segment of the sweep certified
    Solved,
    /// Some segments approximate or unsolved
    Partial,
    /// Nothing could be solved for this outer value
    Unsolved,
    /// Skipped after the study was cancelled
    Cancelled,
}

/// Result for one outer value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEntry {
    pub outer_value: f64,
    pub status: IterationStatus,
    pub sweep: Option<SweepResult>,
    pub knee: Option<KneePoint>,
    /// Outputs interpolated at the knee
    pub knee_outputs: BTreeMap<String, f64>,
    pub note: Option<String>,
}

impl TradeEntry {
    pub(crate) fn empty(outer_value: f64, status: IterationStatus, note: Option<String>) -> Self {
        Self {
            outer_value,
            status,
            sweep: None,
            knee: None,
            knee_outputs: BTreeMap::new(),
            note,
        }
    }
}

/// Family of sweeps, one per outer value, in the order the values were given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCurve {
    pub outer: String,
    pub entries: Vec<TradeEntry>,
}

impl TradeCurve {
    pub fn entry(&self, outer_value: f64) -> Option<&TradeEntry> {
        self.entries.iter().find(|e| e.outer_value == outer_value)
    }

    /// `(outer value, knee x)` for every entry with a knee
    pub fn knee_curve(&self) -> Vec<(f64, f64)> {
        self.entries
            .iter()
            .filter_map(|e| Some((e.outer_value, e.knee.as_ref()?.x()?)))
            .collect()
    }

    pub fn count(&self, status: IterationStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}
