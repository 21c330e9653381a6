use std::fmt;

/// Errors raised when a name is looked up in a solution or result table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    MissingValue(String),
    MissingSensitivity(String),
    MissingKey(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::MissingValue(name) => write!(f, "no value for variable '{name}'"),
            LookupError::MissingSensitivity(name) => {
                write!(f, "no sensitivity for '{name}'")
            }
            LookupError::MissingKey(key) => write!(f, "key '{key}' not found"),
        }
    }
}

impl std::error::Error for LookupError {}

/// Configuration-time errors. These indicate a setup defect and are never
/// recovered from inside a sweep or trade study.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A configuration or objective references a name the model does not know
    MissingVariable(String),
    /// The swept variable is also present in the fixed configuration
    SweptVariableFixed(String),
    /// The model definition itself is inconsistent
    Invalid(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::MissingVariable(name) => {
                write!(f, "variable '{name}' is not part of the model")
            }
            ModelError::SweptVariableFixed(name) => {
                write!(f, "swept variable '{name}' must not be fixed")
            }
            ModelError::Invalid(msg) => write!(f, "invalid model: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Failure of a single solve. Always recoverable at the call site.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// The problem has no feasible point for the current configuration
    Infeasible { reason: String },
    /// Numerical failure or non-convergence
    Solver { reason: String },
    /// The solve took longer than the configured per-call limit
    Timeout { elapsed_ms: u64, limit_ms: u64 },
}

impl SolveError {
    pub fn infeasible(reason: impl Into<String>) -> Self {
        SolveError::Infeasible {
            reason: reason.into(),
        }
    }

    pub fn solver(reason: impl Into<String>) -> Self {
        SolveError::Solver {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Infeasible { reason } => write!(f, "infeasible: {reason}"),
            SolveError::Solver { reason } => write!(f, "solver error: {reason}"),
            SolveError::Timeout {
                elapsed_ms,
                limit_ms,
            } => write!(f, "solve timed out after {elapsed_ms} ms (limit {limit_ms} ms)"),
        }
    }
}

impl std::error::Error for SolveError {}

/// Errors that abort a single adaptive sweep
#[derive(Debug, Clone, PartialEq)]
pub enum SweepError {
    Model(ModelError),
    Lookup(LookupError),
    /// The requested interval is empty or not finite
    InvalidInterval { lo: f64, hi: f64 },
    /// The boundary probe left no room between `lo` and the feasible bound
    InfeasibleRange { lo: f64, hi: f64, bound: f64 },
    Config(String),
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepError::Model(e) => write!(f, "{e}"),
            SweepError::Lookup(e) => write!(f, "{e}"),
            SweepError::InvalidInterval { lo, hi } => {
                write!(f, "invalid sweep interval [{lo}, {hi}]")
            }
            SweepError::InfeasibleRange { lo, hi, bound } => write!(
                f,
                "feasible bound {bound} leaves nothing of the interval [{lo}, {hi}]"
            ),
            SweepError::Config(msg) => write!(f, "sweep configuration error: {msg}"),
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::Model(e) => Some(e),
            SweepError::Lookup(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ModelError> for SweepError {
    fn from(err: ModelError) -> Self {
        SweepError::Model(err)
    }
}

impl From<LookupError> for SweepError {
    fn from(err: LookupError) -> Self {
        SweepError::Lookup(err)
    }
}

/// Errors that abort a whole trade study
#[derive(Debug, Clone, PartialEq)]
pub enum StudyError {
    Model(ModelError),
    Sweep(SweepError),
    Config(String),
    ThreadPool(String),
}

impl fmt::Display for StudyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudyError::Model(e) => write!(f, "{e}"),
            StudyError::Sweep(e) => write!(f, "{e}"),
            StudyError::Config(msg) => write!(f, "trade study configuration error: {msg}"),
            StudyError::ThreadPool(msg) => write!(f, "failed to start worker pool: {msg}"),
        }
    }
}

impl std::error::Error for StudyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StudyError::Model(e) => Some(e),
            StudyError::Sweep(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ModelError> for StudyError {
    fn from(err: ModelError) -> Self {
        StudyError::Model(err)
    }
}

impl From<SweepError> for StudyError {
    fn from(err: SweepError) -> Self {
        match err {
            SweepError::Model(e) => StudyError::Model(e),
            other => StudyError::Sweep(other),
        }
    }
}

/// Errors reading or writing a flat-file result table
#[derive(Debug)]
pub enum TableError {
    Io(std::io::Error),
    Lookup(LookupError),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Io(e) => write!(f, "result table I/O error: {e}"),
            TableError::Lookup(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Io(e) => Some(e),
            TableError::Lookup(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for TableError {
    fn from(err: std::io::Error) -> Self {
        TableError::Io(err)
    }
}

impl From<LookupError> for TableError {
    fn from(err: LookupError) -> Self {
        TableError::Lookup(err)
    }
}
