//! Model boundary types
//!
//! A parametric convex problem is reached only through the [`ModelAdapter`]
//! trait. Configurations are immutable values handed to the adapter on every
//! `configure` call, and each solve produces a self-contained [`Solution`].

mod adapter;
mod config;
mod solution;

pub use adapter::{Direction, ModelAdapter, Objective};
pub(crate) use adapter::check_known;
pub use config::{Configuration, Parameter};
pub use solution::{FailureKind, Solution, SolutionStatus};
