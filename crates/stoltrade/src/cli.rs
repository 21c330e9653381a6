use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "stoltrade")]
#[command(about = "Adaptive parametric sweeps and sensitivity knee points for design models")]
pub struct Args {
    /// Directory for the log file (default: ~/.stoltrade/)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the study's adaptive sweep and knee search
    Sweep {
        study: PathBuf,

        /// Resample the sweep on this many uniform points
        #[arg(long)]
        grid: Option<usize>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Repeat the sweep for every outer value of the study's trade section
    Trade {
        study: PathBuf,

        /// Worker threads (default: one per core)
        #[arg(short, long)]
        workers: Option<usize>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Solve one configuration and write its solution table
    Point {
        study: PathBuf,

        /// Fix a parameter, e.g. `--set S_runway=300`
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, f64)>,

        /// Table path (default: printed to stdout)
        #[arg(short, long, conflicts_with = "dir")]
        out: Option<PathBuf>,

        /// Directory for a table named after the trade point
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Read keys from a solution table
    Read {
        table: PathBuf,

        /// Keys to print (default: all)
        keys: Vec<String>,
    },

    /// Read keys from the tables of a runway/range/payload grid
    Collect {
        dir: PathBuf,

        #[arg(long, value_delimiter = ',', required = true)]
        runway: Vec<f64>,

        #[arg(long, value_delimiter = ',', required = true)]
        range: Vec<f64>,

        #[arg(long, value_delimiter = ',', required = true)]
        payload: Vec<f64>,

        #[arg(long)]
        speed: f64,

        #[arg(long)]
        g_landing: f64,

        #[arg(short, long, value_delimiter = ',', required = true)]
        keys: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Yaml,
}

/// Parse `name=value`
pub fn parse_assignment(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value in '{s}': {e}"))?;
    Ok((name.to_string(), value))
}

pub fn default_log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".stoltrade")
}
