//! Behavioral tests for the sweep engine
//!
//! Tests are organized by topic:
//! - `support` - Scripted model adapter and shared fixtures
//! - `sweep` - Adaptive refinement, failures, probing and timeouts
//! - `knee` - Knee points on sweeps
//! - `trade` - Trade study orchestration and cancellation
//! - `table` - Solution tables through real files

mod support;
mod table;
mod trade;
