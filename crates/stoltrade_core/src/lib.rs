//! Adaptive parametric sweeps over convex design models
//!
//! This crate explores how the optimum of a design model moves as one
//! configuration parameter is swept, when every sample is a full convex
//! solve. It provides:
//! - A [`ModelAdapter`](model::ModelAdapter) capability trait for parametric
//!   solvers, with a geometric-program surrogate ([`posynomial`]) shipped as
//!   the concrete implementation
//! - Error-bounded adaptive 1-D sweeps with feasibility-boundary probing
//! - Sensitivity knee points found by inverse interpolation
//! - Trade studies: families of sweeps over an outer parameter, run in
//!   parallel
//! - Reading and writing flat-file solution tables
//!
//! # Example
//!
//! ```ignore
//! use stoltrade_core::knee::KneeConfig;
//! use stoltrade_core::sweep::SweepConfig;
//! use stoltrade_core::trade::{TradeStudy, run_trade_study};
//!
//! let sweep = SweepConfig::new("S_runway", 50.0, 800.0, "W");
//! let study = TradeStudy::new("W_pay", vec![400.0, 800.0, 1200.0], sweep)
//!     .with_knee(KneeConfig::new("landing").with_outputs(["W"]));
//!
//! let curve = run_trade_study(&model, &study, None)?;
//! for (payload, runway) in curve.knee_curve() {
//!     println!("{payload:6.0} lbf -> knee at {runway:5.0} ft");
//! }
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod error;
pub mod interp;
pub mod knee;
pub mod sweep;
pub mod table;
pub mod trade;

// ============================================================================
// Model modules
// ============================================================================

pub mod model;
pub mod posynomial;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use knee::{KneeConfig, KneePoint, find_knee};
pub use model::{Configuration, ModelAdapter, Objective, Solution};
pub use posynomial::PosynomialModel;
pub use sweep::{SweepConfig, SweepResult, sweep_1d};
pub use table::ResultTable;
pub use trade::{TradeCurve, TradeProgress, TradeStudy, run_trade_study};
