//! Solution of a single convex solve

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LookupError, SolveError};

/// Status reported by the solver alongside a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolutionStatus {
    Optimal,
    Infeasible,
    /// The solver returned numbers but could not certify them
    Degenerate,
}

/// Result of one solve: variable values and dual sensitivities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub status: SolutionStatus,

    /// Value of the objective at the optimum
    pub objective: f64,

    /// Variable name -> value (fixed parameters included)
    pub values: BTreeMap<String, f64>,

    /// Constraint or constant name -> signed sensitivity of the objective
    pub sensitivities: BTreeMap<String, f64>,
}

impl Solution {
    /// Create an optimal solution with no values recorded yet
    #[must_use]
    pub fn optimal(objective: f64) -> Self {
        Self {
            status: SolutionStatus::Optimal,
            objective,
            values: BTreeMap::new(),
            sensitivities: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_sensitivity(mut self, name: impl Into<String>, value: f64) -> Self {
        self.sensitivities.insert(name.into(), value);
        self
    }

    pub fn value(&self, name: &str) -> Result<f64, LookupError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| LookupError::MissingValue(name.to_string()))
    }

    pub fn sensitivity(&self, name: &str) -> Result<f64, LookupError> {
        self.sensitivities
            .get(name)
            .copied()
            .ok_or_else(|| LookupError::MissingSensitivity(name.to_string()))
    }

    #[must_use]
    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}

/// Why a sample could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Infeasible,
    SolverError,
    Timeout,
}

impl From<&SolveError> for FailureKind {
    fn from(err: &SolveError) -> Self {
        match err {
            SolveError::Infeasible { .. } => FailureKind::Infeasible,
            SolveError::Solver { .. } => FailureKind::SolverError,
            SolveError::Timeout { .. } => FailureKind::Timeout,
        }
    }
}

impl From<SolutionStatus> for FailureKind {
    fn from(status: SolutionStatus) -> Self {
        match status {
            SolutionStatus::Infeasible => FailureKind::Infeasible,
            SolutionStatus::Optimal | SolutionStatus::Degenerate => FailureKind::SolverError,
        }
    }
}
