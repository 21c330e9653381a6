//! Geometric-program surrogate model
//!
//! A [`PosynomialModel`] has posynomial outputs and `posynomial <= 1`
//! constraints over named parameters and at most one free design variable.
//! In log space every posynomial is convex, so the feasible set of the design
//! variable is an interval and minimizing an output over it is a 1-D convex
//! problem. Both are solved by bisection, and the dual sensitivities follow
//! from the KKT conditions at the optimum.
//!
//! Sensitivities use the geometric-programming convention: the sensitivity of
//! a constant `p` is `d ln(objective) / d ln(p)`, and the sensitivity of a
//! constraint is its Lagrange multiplier in log space.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, SolveError};
use crate::model::{
    Configuration, Direction, ModelAdapter, Objective, Parameter, Solution, SolutionStatus,
};

/// Bisection steps; enough to exhaust f64 resolution on any bracket
const MAX_BISECTIONS: usize = 200;
/// Log-space slack allowed on `<= 1` constraints
const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// `coeff * prod(name^exponent)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monomial {
    #[serde(default = "default_coeff")]
    pub coeff: f64,
    #[serde(default)]
    pub exponents: BTreeMap<String, f64>,
}

fn default_coeff() -> f64 {
    1.0
}

impl Monomial {
    pub fn new(coeff: f64) -> Self {
        Self {
            coeff,
            exponents: BTreeMap::new(),
        }
    }

    /// Multiply by `name^exponent`
    #[must_use]
    pub fn pow(mut self, name: impl Into<String>, exponent: f64) -> Self {
        *self.exponents.entry(name.into()).or_insert(0.0) += exponent;
        self
    }
}

/// A named posynomial output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub unit: String,
    pub terms: Vec<Monomial>,
}

/// The free design variable, searched over `[lower, upper]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignVariable {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    pub lower: f64,
    pub upper: f64,
}

/// Posynomial surrogate of a parametric convex design problem
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosynomialModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub design: Option<DesignVariable>,
    pub outputs: BTreeMap<String, Output>,
    /// Each constraint reads `sum(terms) <= 1`
    #[serde(default)]
    pub constraints: BTreeMap<String, Vec<Monomial>>,

    #[serde(skip)]
    fixed: Configuration,
    #[serde(skip)]
    objective: Option<Objective>,
}

impl PosynomialModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[must_use]
    pub fn design(
        mut self,
        name: impl Into<String>,
        unit: impl Into<String>,
        lower: f64,
        upper: f64,
    ) -> Self {
        self.design = Some(DesignVariable {
            name: name.into(),
            unit: unit.into(),
            lower,
            upper,
        });
        self
    }

    #[must_use]
    pub fn output(
        mut self,
        name: impl Into<String>,
        unit: impl Into<String>,
        terms: Vec<Monomial>,
    ) -> Self {
        self.outputs.insert(
            name.into(),
            Output {
                unit: unit.into(),
                terms,
            },
        );
        self
    }

    #[must_use]
    pub fn constraint(mut self, name: impl Into<String>, terms: Vec<Monomial>) -> Self {
        self.constraints.insert(name.into(), terms);
        self
    }

    /// Check names, coefficients and bounds. Call once after building or
    /// deserializing a model.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen: Vec<&str> = Vec::new();
        let names = self
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.design.iter().map(|d| d.name.as_str()))
            .chain(self.outputs.keys().map(String::as_str))
            .chain(self.constraints.keys().map(String::as_str));
        for name in names {
            if seen.contains(&name) {
                return Err(ModelError::Invalid(format!("duplicate name '{name}'")));
            }
            seen.push(name);
        }

        if self.outputs.is_empty() {
            return Err(ModelError::Invalid("model has no outputs".to_string()));
        }

        if let Some(design) = &self.design
            && !(design.lower > 0.0 && design.lower < design.upper && design.upper.is_finite())
        {
            return Err(ModelError::Invalid(format!(
                "design variable '{}' needs 0 < lower < upper",
                design.name
            )));
        }

        for p in &self.parameters {
            if let Some(v) = p.value
                && !(v > 0.0 && v.is_finite())
            {
                return Err(ModelError::Invalid(format!(
                    "parameter '{}' must be positive",
                    p.name
                )));
            }
            if let Some((lo, hi)) = p.bounds
                && !(lo > 0.0 && lo < hi && hi.is_finite())
            {
                return Err(ModelError::Invalid(format!(
                    "parameter '{}' needs 0 < lo < hi bounds",
                    p.name
                )));
            }
        }

        let posynomials = self
            .outputs
            .iter()
            .map(|(k, o)| (k, &o.terms))
            .chain(self.constraints.iter());
        for (name, terms) in posynomials {
            if terms.is_empty() {
                return Err(ModelError::Invalid(format!("'{name}' has no terms")));
            }
            for term in terms {
                if !(term.coeff > 0.0 && term.coeff.is_finite()) {
                    return Err(ModelError::Invalid(format!(
                        "'{name}' has a non-positive coefficient"
                    )));
                }
                for var in term.exponents.keys() {
                    if !self.is_parameter(var) && !self.is_design(var) {
                        return Err(ModelError::MissingVariable(var.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Unit tag of a parameter, design variable or output
    pub fn unit_of(&self, name: &str) -> Option<&str> {
        if let Some(p) = self.parameters.iter().find(|p| p.name == name) {
            return Some(&p.unit);
        }
        if let Some(d) = self.design.as_ref().filter(|d| d.name == name) {
            return Some(&d.unit);
        }
        self.outputs.get(name).map(|o| o.unit.as_str())
    }

    fn is_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name == name)
    }

    fn is_design(&self, name: &str) -> bool {
        self.design.as_ref().is_some_and(|d| d.name == name)
    }

    /// Values of every parameter that has one, except `free`
    fn resolve(&self, free: Option<&str>) -> FxHashMap<&str, f64> {
        self.parameters
            .iter()
            .filter(|p| Some(p.name.as_str()) != free)
            .filter_map(|p| {
                self.fixed
                    .get(&p.name)
                    .or(p.value)
                    .map(|v| (p.name.as_str(), v))
            })
            .collect()
    }

    fn compile(
        &self,
        terms: &[Monomial],
        values: &FxHashMap<&str, f64>,
    ) -> Result<LogPosynomial, SolveError> {
        let design = self.design.as_ref().map(|d| d.name.as_str());
        let mut compiled = Vec::with_capacity(terms.len());
        for term in terms {
            let mut log_c = term.coeff.ln();
            let mut a = 0.0;
            let mut exps = Vec::new();
            for (var, &e) in &term.exponents {
                if Some(var.as_str()) == design {
                    a += e;
                    continue;
                }
                let v = values
                    .get(var.as_str())
                    .copied()
                    .ok_or_else(|| SolveError::solver(format!("parameter '{var}' has no value")))?;
                if !(v > 0.0 && v.is_finite()) {
                    return Err(SolveError::solver(format!(
                        "parameter '{var}' must be positive, got {v}"
                    )));
                }
                log_c += e * v.ln();
                exps.push((var.clone(), e));
            }
            compiled.push(Term { log_c, a, exps });
        }
        Ok(LogPosynomial { terms: compiled })
    }

    fn compile_constraints(
        &self,
        values: &FxHashMap<&str, f64>,
    ) -> Result<Vec<(&str, LogPosynomial)>, SolveError> {
        self.constraints
            .iter()
            .map(|(name, terms)| Ok((name.as_str(), self.compile(terms, values)?)))
            .collect()
    }

    /// Log-space interval of the design variable satisfying every constraint
    fn feasible_interval(
        &self,
        constraints: &[(&str, LogPosynomial)],
    ) -> Result<Interval, SolveError> {
        let Some(design) = &self.design else {
            for (name, c) in constraints {
                if c.value(0.0) > FEASIBILITY_TOLERANCE {
                    return Err(SolveError::infeasible(format!(
                        "constraint '{name}' is violated"
                    )));
                }
            }
            return Ok(Interval::point());
        };

        let mut iv = Interval {
            lo: design.lower.ln(),
            hi: design.upper.ln(),
            lo_by: None,
            hi_by: None,
        };

        for (j, (name, c)) in constraints.iter().enumerate() {
            let g_lo = c.value(iv.lo);
            let g_hi = c.value(iv.hi);
            if g_lo <= FEASIBILITY_TOLERANCE && g_hi <= FEASIBILITY_TOLERANCE {
                continue;
            }

            let m = argmin(|u| c.slope(u), iv.lo, iv.hi);
            if c.value(m) > FEASIBILITY_TOLERANCE {
                return Err(SolveError::infeasible(format!(
                    "constraint '{name}' cannot be satisfied"
                )));
            }

            if g_lo > FEASIBILITY_TOLERANCE {
                let (_, feasible) = bisect(iv.lo, m, |u| c.value(u) > 0.0);
                iv.lo = feasible;
                iv.lo_by = Some(j);
            }
            if g_hi > FEASIBILITY_TOLERANCE {
                let (feasible, _) = bisect(m, iv.hi, |u| c.value(u) <= 0.0);
                iv.hi = feasible;
                iv.hi_by = Some(j);
            }
        }
        Ok(iv)
    }

    fn solve_for_output(
        &self,
        output: &Output,
        direction: Direction,
    ) -> Result<Solution, SolveError> {
        let values = self.resolve(None);
        let g = self.compile(&output.terms, &values)?;
        if direction != Direction::Minimize && g.terms.len() > 1 {
            return Err(SolveError::solver(
                "maximizing a posynomial is not a geometric program",
            ));
        }
        let constraints = self.compile_constraints(&values)?;
        let iv = self.feasible_interval(&constraints)?;

        let sign = if direction == Direction::Minimize { 1.0 } else { -1.0 };
        let objective = LogObjective {
            posynomial: Some(&g),
            sign,
        };
        let y = g.value(self.optimum(&objective, &iv)).exp();
        let reported = if direction == Direction::MinimizeReciprocal {
            1.0 / y
        } else {
            y
        };
        Ok(self.assemble(&objective, &iv, &constraints, &values, reported))
    }

    fn solve_for_design(&self, direction: Direction) -> Result<Solution, SolveError> {
        let values = self.resolve(None);
        let constraints = self.compile_constraints(&values)?;
        let iv = self.feasible_interval(&constraints)?;

        let sign = if direction == Direction::Minimize { 1.0 } else { -1.0 };
        let objective = LogObjective {
            posynomial: None,
            sign,
        };
        let s = self.optimum(&objective, &iv).exp();
        let reported = if direction == Direction::MinimizeReciprocal {
            1.0 / s
        } else {
            s
        };
        Ok(self.assemble(&objective, &iv, &constraints, &values, reported))
    }

    /// Push an unfixed parameter to the edge of its feasible range
    fn probe_parameter(
        &self,
        parameter: &Parameter,
        objective: &Objective,
    ) -> Result<Solution, SolveError> {
        let Some((lo, hi)) = parameter.bounds else {
            return Err(SolveError::solver(format!(
                "free parameter '{}' has no probe bounds",
                parameter.name
            )));
        };
        let name = parameter.name.as_str();
        let base = self.resolve(Some(name));

        let feasible = |v: f64| -> bool {
            let mut values = base.clone();
            values.insert(name, v.exp());
            self.compile_constraints(&values)
                .and_then(|c| self.feasible_interval(&c))
                .is_ok()
        };

        let (v_lo, v_hi) = (lo.ln(), hi.ln());
        let x = if objective.pushes_up() {
            if feasible(v_hi) {
                hi
            } else if feasible(v_lo) {
                bisect(v_lo, v_hi, feasible).0.exp()
            } else {
                return Err(SolveError::infeasible(format!(
                    "no feasible value of '{name}' in [{lo}, {hi}]"
                )));
            }
        } else if feasible(v_lo) {
            lo
        } else if feasible(v_hi) {
            bisect(v_lo, v_hi, |v| !feasible(v)).1.exp()
        } else {
            return Err(SolveError::infeasible(format!(
                "no feasible value of '{name}' in [{lo}, {hi}]"
            )));
        };

        let mut values = base;
        values.insert(name, x);
        let constraints = self.compile_constraints(&values)?;
        let iv = self.feasible_interval(&constraints)?;
        let u = f64::midpoint(iv.lo, iv.hi);

        let reported = if objective.direction == Direction::MinimizeReciprocal {
            1.0 / x
        } else {
            x
        };
        let mut solution = Solution::optimal(reported);
        self.record_values(&mut solution, &values, u)?;
        Ok(finish(solution))
    }

    /// Log-space optimum of the objective over the feasible interval
    fn optimum(&self, objective: &LogObjective, iv: &Interval) -> f64 {
        if self.design.is_none() {
            return 0.0;
        }
        argmin(|u| objective.slope(u), iv.lo, iv.hi)
    }

    fn assemble(
        &self,
        objective: &LogObjective,
        iv: &Interval,
        constraints: &[(&str, LogPosynomial)],
        values: &FxHashMap<&str, f64>,
        reported: f64,
    ) -> Solution {
        let u = self.optimum(objective, iv);
        let mut solution = Solution::optimal(reported);

        // Multipliers from stationarity: h'(u) + lambda * c'(u) = 0
        let mut duals = vec![0.0; constraints.len()];
        let mut degenerate = false;
        if let Some(design) = &self.design {
            let dh = objective.slope(u);
            let mut lower_dual = 0.0;
            let mut upper_dual = 0.0;
            if u == iv.lo && dh > 0.0 {
                match iv.lo_by {
                    Some(j) => {
                        let dc = constraints[j].1.slope(u);
                        degenerate |= dc.abs() < 1e-12;
                        duals[j] = -dh / dc;
                    }
                    None => lower_dual = dh,
                }
            }
            if u == iv.hi && dh < 0.0 {
                match iv.hi_by {
                    Some(j) => {
                        let dc = constraints[j].1.slope(u);
                        degenerate |= dc.abs() < 1e-12;
                        duals[j] = -dh / dc;
                    }
                    None => upper_dual = -dh,
                }
            }
            solution
                .sensitivities
                .insert(format!("{}.lower", design.name), lower_dual);
            solution
                .sensitivities
                .insert(format!("{}.upper", design.name), upper_dual);
        }

        for ((name, _), lambda) in constraints.iter().zip(&duals) {
            solution.sensitivities.insert(name.to_string(), *lambda);
        }

        for name in values.keys() {
            let direct = objective.param_slope(u, name);
            let through_constraints: f64 = constraints
                .iter()
                .zip(&duals)
                .map(|((_, c), lambda)| lambda * c.param_slope(u, name))
                .sum();
            solution
                .sensitivities
                .insert(name.to_string(), direct + through_constraints);
        }

        if let Err(e) = self.record_values(&mut solution, values, u) {
            tracing::debug!(model = %self.name, error = %e, "output evaluation failed");
            solution.status = SolutionStatus::Degenerate;
        }
        if degenerate {
            solution.status = SolutionStatus::Degenerate;
        }
        finish(solution)
    }

    fn record_values(
        &self,
        solution: &mut Solution,
        values: &FxHashMap<&str, f64>,
        u: f64,
    ) -> Result<(), SolveError> {
        for (name, v) in values {
            solution.values.insert(name.to_string(), *v);
        }
        if let Some(design) = &self.design {
            solution.values.insert(design.name.clone(), u.exp());
        }
        for (name, output) in &self.outputs {
            let y = self.compile(&output.terms, values)?.value(u).exp();
            solution.values.insert(name.clone(), y);
        }
        Ok(())
    }
}

/// Mark solutions with non-finite numbers as degenerate
fn finish(mut solution: Solution) -> Solution {
    let finite = solution.objective.is_finite()
        && solution.values.values().all(|v| v.is_finite())
        && solution.sensitivities.values().all(|v| v.is_finite());
    if !finite {
        solution.status = SolutionStatus::Degenerate;
    }
    solution
}

impl ModelAdapter for PosynomialModel {
    fn knows(&self, name: &str) -> bool {
        self.is_parameter(name)
            || self.is_design(name)
            || self.outputs.contains_key(name)
            || self.constraints.contains_key(name)
    }

    fn configure(&mut self, fixed: Configuration) -> Result<(), ModelError> {
        for name in fixed.names() {
            if !self.knows(name) {
                return Err(ModelError::MissingVariable(name.to_string()));
            }
            if !self.is_parameter(name) {
                return Err(ModelError::Invalid(format!(
                    "'{name}' is not a parameter and cannot be fixed"
                )));
            }
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
        if self.constraints.contains_key(&objective.variable) {
            return Err(ModelError::Invalid(format!(
                "constraint '{}' cannot be an objective",
                objective.variable
            )));
        }
        self.objective = Some(objective);
        Ok(())
    }

    fn solve(&mut self) -> Result<Solution, SolveError> {
        let Some(objective) = &self.objective else {
            return Err(SolveError::solver("no objective selected"));
        };

        if let Some(output) = self.outputs.get(&objective.variable) {
            return self.solve_for_output(output, objective.direction);
        }
        if self.is_design(&objective.variable) {
            return self.solve_for_design(objective.direction);
        }

        let parameter = self
            .parameters
            .iter()
            .find(|p| p.name == objective.variable)
            .ok_or_else(|| SolveError::solver("objective variable disappeared"))?;
        if self.fixed.contains(&parameter.name) {
            return Err(SolveError::solver(format!(
                "objective variable '{}' is fixed",
                parameter.name
            )));
        }
        self.probe_parameter(parameter, objective)
    }
}

/// One monomial with its parameter part folded into `log_c`
#[derive(Debug, Clone)]
struct Term {
    log_c: f64,
    /// Exponent of the design variable
    a: f64,
    exps: Vec<(String, f64)>,
}

/// `ln(sum(exp(log_c + a*u)))` as a function of `u = ln(design)`
#[derive(Debug, Clone)]
struct LogPosynomial {
    terms: Vec<Term>,
}

impl LogPosynomial {
    fn value(&self, u: f64) -> f64 {
        let max = self
            .terms
            .iter()
            .map(|t| t.log_c + t.a * u)
            .fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = self
            .terms
            .iter()
            .map(|t| (t.log_c + t.a * u - max).exp())
            .sum();
        max + sum.ln()
    }

    /// Softmax weights of the terms at `u`
    fn weights(&self, u: f64) -> Vec<f64> {
        let total = self.value(u);
        self.terms
            .iter()
            .map(|t| (t.log_c + t.a * u - total).exp())
            .collect()
    }

    fn slope(&self, u: f64) -> f64 {
        self.weights(u)
            .iter()
            .zip(&self.terms)
            .map(|(w, t)| w * t.a)
            .sum()
    }

    fn param_slope(&self, u: f64, name: &str) -> f64 {
        self.weights(u)
            .iter()
            .zip(&self.terms)
            .map(|(w, t)| {
                let e: f64 = t
                    .exps
                    .iter()
                    .filter(|(n, _)| n == name)
                    .map(|(_, e)| e)
                    .sum();
                w * e
            })
            .sum()
    }
}

/// `sign * ln(output)`, or `sign * u` when the design variable itself is
/// the objective
struct LogObjective<'a> {
    posynomial: Option<&'a LogPosynomial>,
    sign: f64,
}

impl LogObjective<'_> {
    fn slope(&self, u: f64) -> f64 {
        self.sign * self.posynomial.map_or(1.0, |g| g.slope(u))
    }

    fn param_slope(&self, u: f64, name: &str) -> f64 {
        self.sign * self.posynomial.map_or(0.0, |g| g.param_slope(u, name))
    }
}

/// Feasible log-space interval with the constraint (if any) defining each edge
#[derive(Debug, Clone, Copy)]
struct Interval {
    lo: f64,
    hi: f64,
    lo_by: Option<usize>,
    hi_by: Option<usize>,
}

impl Interval {
    fn point() -> Self {
        Self {
            lo: 0.0,
            hi: 0.0,
            lo_by: None,
            hi_by: None,
        }
    }
}

/// Minimizer of a convex function on `[lo, hi]` given its derivative
fn argmin(slope: impl Fn(f64) -> f64, lo: f64, hi: f64) -> f64 {
    if slope(lo) >= 0.0 {
        return lo;
    }
    if slope(hi) <= 0.0 {
        return hi;
    }
    let (a, b) = bisect(lo, hi, |u| slope(u) < 0.0);
    f64::midpoint(a, b)
}

/// Shrink `[lo, hi]` around the point where `go_right` turns false
fn bisect(mut lo: f64, mut hi: f64, go_right: impl Fn(f64) -> bool) -> (f64, f64) {
    for _ in 0..MAX_BISECTIONS {
        let mid = f64::midpoint(lo, hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if go_right(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// W = 2.5*S + k/S with k = 40000; unconstrained optimum at S = sqrt(k/2.5)
    fn wing_model() -> PosynomialModel {
        PosynomialModel::new("wing")
            .parameter(Parameter::fixed("k", 40_000.0, "lbf*ft^2"))
            .design("S", "ft^2", 1.0, 10_000.0)
            .output(
                "W",
                "lbf",
                vec![
                    Monomial::new(2.5).pow("S", 1.0),
                    Monomial::new(1.0).pow("k", 1.0).pow("S", -1.0),
                ],
            )
    }

    fn solve_w(model: &mut PosynomialModel) -> Result<Solution, SolveError> {
        model.set_objective(Objective::minimize("W")).unwrap();
        model.solve()
    }

    #[test]
    fn test_unconstrained_optimum_and_sensitivity() {
        let mut model = wing_model();
        model.validate().unwrap();
        let sol = solve_w(&mut model).unwrap();

        assert!(sol.is_optimal());
        let s_opt = (40_000.0_f64 / 2.5).sqrt();
        assert!((sol.value("S").unwrap() - s_opt).abs() / s_opt < 1e-9);
        let w_opt = 2.0 * (2.5_f64 * 40_000.0).sqrt();
        assert!((sol.objective - w_opt).abs() / w_opt < 1e-9);
        // At the optimum both terms are equal, so d ln W / d ln k = 1/2
        assert!((sol.sensitivity("k").unwrap() - 0.5).abs() < 1e-6);
        assert_eq!(sol.sensitivity("S.lower").unwrap(), 0.0);
    }

    #[test]
    fn test_binding_constraint_dual() {
        // S >= S_min  <=>  S_min / S <= 1
        let mut model = wing_model()
            .parameter(Parameter::fixed("S_min", 200.0, "ft^2"))
            .constraint(
                "min_area",
                vec![Monomial::new(1.0).pow("S_min", 1.0).pow("S", -1.0)],
            );
        let sol = solve_w(&mut model).unwrap();

        assert!((sol.value("S").unwrap() - 200.0).abs() < 1e-6);
        assert!((sol.objective - 700.0).abs() < 1e-6);
        // lambda = d ln W / d ln S at S = 200: (500 - 200) / 700
        let expected = 300.0 / 700.0;
        assert!((sol.sensitivity("min_area").unwrap() - expected).abs() < 1e-6);
        // Raising S_min tightens the constraint one-for-one in log space
        assert!((sol.sensitivity("S_min").unwrap() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_slack_constraint_has_zero_dual() {
        let mut model = wing_model()
            .parameter(Parameter::fixed("S_min", 50.0, "ft^2"))
            .constraint(
                "min_area",
                vec![Monomial::new(1.0).pow("S_min", 1.0).pow("S", -1.0)],
            );
        let sol = solve_w(&mut model).unwrap();
        assert_eq!(sol.sensitivity("min_area").unwrap(), 0.0);
        assert_eq!(sol.sensitivity("S_min").unwrap(), 0.0);
    }

    #[test]
    fn test_conflicting_constraints_are_infeasible() {
        let mut model = wing_model()
            .constraint("at_least", vec![Monomial::new(200.0).pow("S", -1.0)])
            .constraint("at_most", vec![Monomial::new(0.01).pow("S", 1.0)]);
        let err = solve_w(&mut model).unwrap_err();
        assert!(matches!(err, SolveError::Infeasible { .. }), "{err}");
    }

    #[test]
    fn test_probe_pushes_free_parameter_to_bound() {
        // Runway must be at least 2 * S, and S is at least 150
        let mut model = wing_model()
            .parameter(Parameter::free("x", "ft").with_bounds(1.0, 5_000.0))
            .constraint("min_area", vec![Monomial::new(150.0).pow("S", -1.0)])
            .constraint(
                "runway",
                vec![Monomial::new(1.0).pow("x", 1.0).pow("S", -1.0).pow("k", -1.0 / 40.0)],
            );
        // x <= S * k^(1/40): largest at S = 10000
        model.set_objective(Objective::minimize_reciprocal("x")).unwrap();
        let sol = model.solve().unwrap();
        let expected = 10_000.0 * 40_000.0_f64.powf(1.0 / 40.0);
        let x = sol.value("x").unwrap();
        assert!(
            ((x - expected.min(5_000.0)) / x).abs() < 1e-6,
            "x = {x}, expected {expected}"
        );
    }

    #[test]
    fn test_probe_finds_interior_bound() {
        let mut model = wing_model()
            .parameter(Parameter::free("x", "ft").with_bounds(1.0, 5_000.0))
            .constraint("runway", vec![Monomial::new(1.0 / 500.0).pow("x", 1.0)]);
        model.set_objective(Objective::minimize_reciprocal("x")).unwrap();
        let sol = model.solve().unwrap();
        assert!((sol.value("x").unwrap() - 500.0).abs() < 1e-6);
        assert!((sol.objective - 1.0 / 500.0).abs() < 1e-9);

        model.set_objective(Objective::minimize("x")).unwrap();
        let sol = model.solve().unwrap();
        assert!((sol.value("x").unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_configure_rejects_unknown_names() {
        let mut model = wing_model();
        let err = model
            .configure([("nope", 1.0)].into_iter().collect())
            .unwrap_err();
        assert_eq!(err, ModelError::MissingVariable("nope".to_string()));

        let err = model.set_objective(Objective::minimize("mass")).unwrap_err();
        assert_eq!(err, ModelError::MissingVariable("mass".to_string()));
    }

    #[test]
    fn test_configuration_overrides_default() {
        let mut model = wing_model();
        model
            .configure([("k", 10_000.0)].into_iter().collect())
            .unwrap();
        let sol = solve_w(&mut model).unwrap();
        let w_opt = 2.0 * (2.5_f64 * 10_000.0).sqrt();
        assert!((sol.objective - w_opt).abs() / w_opt < 1e-9);
        assert_eq!(sol.value("k").unwrap(), 10_000.0);
    }

    #[test]
    fn test_unbound_parameter_is_solver_error() {
        let mut model = wing_model()
            .parameter(Parameter::free("q", "-"))
            .constraint("uses_q", vec![Monomial::new(1.0).pow("q", 1.0)]);
        let err = solve_w(&mut model).unwrap_err();
        assert!(matches!(err, SolveError::Solver { .. }), "{err}");
    }

    #[test]
    fn test_validate_catches_duplicates_and_bad_bounds() {
        let model = wing_model().parameter(Parameter::fixed("W", 1.0, "lbf"));
        assert!(matches!(model.validate(), Err(ModelError::Invalid(_))));

        let model = wing_model().design("S", "ft^2", 10.0, 1.0);
        assert!(matches!(model.validate(), Err(ModelError::Invalid(_))));

        let model = wing_model().output("V", "kts", vec![Monomial::new(1.0).pow("ghost", 1.0)]);
        assert_eq!(
            model.validate(),
            Err(ModelError::MissingVariable("ghost".to_string()))
        );
    }
}
