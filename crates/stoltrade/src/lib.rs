//! stoltrade command-line front end
//!
//! Loads YAML study files, runs adaptive sweeps and trade studies through
//! `stoltrade_core`, and reads or writes flat solution tables.

#![warn(clippy::all)]

pub mod cli;
pub mod commands;
pub mod logging;
pub mod report;
pub mod study;

pub use cli::{Args, Command, Format, default_log_dir};
pub use logging::init_logging;
pub use study::StudyFile;
