use std::sync::Arc;

use crate::error::{ModelError, SolveError};
use crate::model::{Configuration, Direction, ModelAdapter, Objective, Parameter, Solution};
use crate::posynomial::{Monomial, PosynomialModel};

type SolveFn = dyn Fn(&Configuration, &Objective) -> Result<Solution, SolveError> + Send + Sync;

/// Model adapter whose solve is a closure over the configuration and objective
#[derive(Clone)]
pub struct ScriptedModel {
    names: Vec<String>,
    fixed: Configuration,
    objective: Option<Objective>,
    solve_fn: Arc<SolveFn>,
}

impl ScriptedModel {
    pub fn new(
        names: &[&str],
        solve_fn: impl Fn(&Configuration, &Objective) -> Result<Solution, SolveError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            fixed: Configuration::new(),
            objective: None,
            solve_fn: Arc::new(solve_fn),
        }
    }
}

impl ModelAdapter for ScriptedModel {
    fn knows(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    fn configure(&mut self, fixed: Configuration) -> Result<(), ModelError> {
        if let Some(name) = fixed.names().find(|n| !self.knows(n)) {
            return Err(ModelError::MissingVariable(name.to_string()));
        }
        self.fixed = fixed;
        Ok(())
    }

    fn configuration(&self) -> &Configuration {
        &self.fixed
    }

    fn set_objective(&mut self, objective: Objective) -> Result<(), ModelError> {
        if !self.knows(&objective.variable) {
            return Err(ModelError::MissingVariable(objective.variable));
        }
        self.objective = Some(objective);
        Ok(())
    }

    fn solve(&mut self) -> Result<Solution, SolveError> {
        let objective = self
            .objective
            .as_ref()
            .ok_or_else(|| SolveError::solver("no objective"))?;
        (self.solve_fn)(&self.fixed, objective)
    }
}

/// `y = 1000 + 2e5 / x`
pub fn hyperbola(x: f64) -> f64 {
    1000.0 + 2.0e5 / x
}

/// Sensitivity curve falling from 5.0 at x = 50 through 1.0 at x = 210
pub fn decaying_sensitivity(x: f64) -> f64 {
    0.2 + 4.8 * (-(6.0_f64.ln() / 160.0) * (x - 50.0)).exp()
}

/// One swept variable `x` with output `y` and constraint sensitivity `c`.
/// Points where `feasible` is false are infeasible. A probe on `x` reports
/// `bound`, or fails when there is none.
pub fn curve_model(
    y: fn(f64) -> f64,
    c: fn(f64) -> f64,
    feasible: fn(f64) -> bool,
    bound: Option<f64>,
) -> ScriptedModel {
    ScriptedModel::new(&["x", "y", "c"], move |fixed, objective| {
        if objective.variable == "x" {
            let b = bound.ok_or_else(|| SolveError::solver("probe diverged"))?;
            let cost = if objective.direction == Direction::MinimizeReciprocal {
                1.0 / b
            } else {
                b
            };
            return Ok(Solution::optimal(cost).with_value("x", b));
        }
        let x = fixed
            .get("x")
            .ok_or_else(|| SolveError::solver("x not fixed"))?;
        if !feasible(x) {
            return Err(SolveError::infeasible(format!("x = {x}")));
        }
        Ok(Solution::optimal(y(x))
            .with_value("x", x)
            .with_value("y", y(x))
            .with_sensitivity("c", c(x)))
    })
}

pub fn always(_: f64) -> bool {
    true
}

/// Wing sizing surrogate: weight against runway length through a landing
/// constraint `S >= 160.7 * W_pay / (CL * S_runway)`
pub fn runway_model() -> PosynomialModel {
    PosynomialModel::new("runway")
        .parameter(Parameter::fixed("W_pay", 800.0, "lbf"))
        .parameter(Parameter::fixed("k", 40_000.0, "lbf*ft^2"))
        .parameter(Parameter::fixed("CL_land", 3.0, "-"))
        .parameter(Parameter::free("S_runway", "ft").with_bounds(10.0, 5_000.0))
        .design("S", "ft^2", 1.0, 10_000.0)
        .output(
            "W",
            "lbf",
            vec![
                Monomial::new(1.25).pow("W_pay", 1.0),
                Monomial::new(2.5).pow("S", 1.0),
                Monomial::new(1.0).pow("k", 1.0).pow("S", -1.0),
            ],
        )
        .constraint(
            "landing",
            vec![
                Monomial::new(160.7)
                    .pow("W_pay", 1.0)
                    .pow("S", -1.0)
                    .pow("CL_land", -1.0)
                    .pow("S_runway", -1.0),
            ],
        )
}
