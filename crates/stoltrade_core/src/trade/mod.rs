//! Trade studies: families of sweeps over an outer parameter

mod config;
mod progress;
mod result;
mod runner;

pub use config::TradeStudy;
pub use progress::TradeProgress;
pub use result::{IterationStatus, TradeCurve, TradeEntry};
pub use runner::run_trade_study;
