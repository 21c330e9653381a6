//! The capability interface every solvable model exposes

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, SolveError};

use super::{Configuration, Solution};

/// Optimization direction for an objective variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Minimize,
    Maximize,
    /// Minimize `1/x`, i.e. push `x` as high as the constraints allow
    MinimizeReciprocal,
}

/// The variable a solve optimizes and in which direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub variable: String,
    #[serde(default)]
    pub direction: Direction,
}

impl Objective {
    pub fn minimize(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            direction: Direction::Minimize,
        }
    }

    pub fn maximize(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            direction: Direction::Maximize,
        }
    }

    pub fn minimize_reciprocal(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            direction: Direction::MinimizeReciprocal,
        }
    }

    /// True when the objective pushes its variable upward
    #[must_use]
    pub fn pushes_up(&self) -> bool {
        matches!(
            self.direction,
            Direction::Maximize | Direction::MinimizeReciprocal
        )
    }
}

/// Handle to a parametric convex optimization problem.
///
/// `configure` replaces the whole fixed-parameter set; there is no partial
/// update. Every instance is solve-isolated, so concurrent studies clone the
/// base model once per task.
pub trait ModelAdapter {
    /// Whether `name` is a parameter, variable, output or constraint of the model
    fn knows(&self, name: &str) -> bool;

    /// Replace the fixed parameters. Unknown names fail with `MissingVariable`.
    fn configure(&mut self, fixed: Configuration) -> Result<(), ModelError>;

    /// Current fixed parameters
    fn configuration(&self) -> &Configuration;

    /// Select the objective. Unknown names fail with `MissingVariable`.
    fn set_objective(&mut self, objective: Objective) -> Result<(), ModelError>;

    /// Solve for the current configuration and objective
    fn solve(&mut self) -> Result<Solution, SolveError>;
}

/// Reject the first name in `names` that `model` does not know
pub(crate) fn check_known<'a, M: ModelAdapter + ?Sized>(
    model: &M,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ModelError> {
    for name in names {
        if !model.knows(name) {
            return Err(ModelError::MissingVariable(name.to_string()));
        }
    }
    Ok(())
}
