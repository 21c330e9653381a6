//! Adaptive one-dimensional parametric sweeps
//!
//! A sweep solves the model at the ends of the swept interval and keeps
//! bisecting wherever the straight line between two solved samples misses
//! the solved midpoint by more than the tolerance. Failed solves are kept as
//! samples and mark the segments around them as unsolved.

mod config;
mod probe;
mod refine;
mod result;

pub use config::{BoundaryProbe, SweepConfig, Tolerance};
pub use refine::sweep_1d;
pub use result::{
    Quantity, Sample, SampleOutcome, SegmentStatus, SweepResult, SweepSegment, SweepStatus,
};
