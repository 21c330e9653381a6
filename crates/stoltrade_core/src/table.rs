//! Flat-file solution tables
//!
//! A table is plain text with one `key: value unit` entry per line. The
//! reader is deliberately loose so it can consume tables written by other
//! tools:
//!
//! - only lines containing `:` and not containing `Warning` are considered
//! - the key is the raw text before the first `:` (not trimmed)
//! - the value is the first whitespace-separated token between the first and
//!   second `:`; the rest (units) is ignored
//! - keys containing `S_gr` are skipped
//! - lines whose value does not parse are skipped
//! - a repeated key keeps the last value

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LookupError, TableError};
use crate::model::Solution;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    entries: BTreeMap<String, f64>,
}

impl ResultTable {
    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        for (lineno, line) in text.lines().enumerate() {
            if !line.contains(':') || line.contains("Warning") {
                continue;
            }
            let mut fields = line.split(':');
            let key = fields.next().unwrap_or_default();
            let field = fields.next().unwrap_or_default();
            if key.contains("S_gr") {
                continue;
            }
            match field.split_whitespace().next().map(str::parse::<f64>) {
                Some(Ok(value)) => {
                    entries.insert(key.to_string(), value);
                }
                _ => tracing::debug!(line = lineno + 1, text = line, "skipping malformed line"),
            }
        }
        Self { entries }
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn get(&self, key: &str) -> Result<f64, LookupError> {
        self.entries
            .get(key)
            .copied()
            .ok_or_else(|| LookupError::MissingKey(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Render a solution as a table. Values become `key: value unit` lines;
/// sensitivities are listed afterwards without a colon so readers skip them.
pub fn render_solution(solution: &Solution, unit_of: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::new();
    if !solution.is_optimal() {
        let _ = writeln!(out, "Warning: solution status is {:?}", solution.status);
    }
    let _ = writeln!(out, "Cost {:.6}", solution.objective);
    let _ = writeln!(out);
    for (name, value) in &solution.values {
        let unit = unit_of(name).unwrap_or_default();
        let _ = writeln!(out, "{name}: {value} {unit}");
    }
    if !solution.sensitivities.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Sensitivities");
        for (name, value) in &solution.sensitivities {
            let _ = writeln!(out, "  {name} {value:+.4}");
        }
    }
    out
}

pub fn write_solution(
    path: impl AsRef<Path>,
    solution: &Solution,
    unit_of: impl Fn(&str) -> Option<String>,
) -> Result<(), TableError> {
    let path = path.as_ref();
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, render_solution(solution, unit_of))?;
    tracing::debug!(path = %path.display(), "wrote solution table");
    Ok(())
}

/// Operating point of a runway/range/payload trade, used to name table files
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradePoint {
    /// Runway length, ft
    pub runway: f64,
    /// Range, nmi
    pub range: f64,
    /// Payload, lbf
    pub payload: f64,
    /// Cruise speed, kts
    pub speed: f64,
    /// Landing load factor, g
    pub g_landing: f64,
}

impl TradePoint {
    /// `RNWY_%4.0f_RNG_%4.0f_PAY_%4.0f_V_%3.0f_GLND_%3.0f.sum`, with the
    /// landing load factor in tenths of a g
    pub fn file_name(&self) -> String {
        format!(
            "RNWY_{:4.0}_RNG_{:4.0}_PAY_{:4.0}_V_{:3.0}_GLND_{:3.0}.sum",
            self.runway,
            self.range,
            self.payload,
            self.speed,
            self.g_landing * 10.0
        )
    }

    pub fn path_in(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(self.file_name())
    }
}

/// Read `keys` from the table of each trade point found in `dir`. Points
/// without a table file, or missing a key, are reported individually.
pub fn collect_points(
    dir: impl AsRef<Path>,
    points: &[TradePoint],
    keys: &[String],
) -> Vec<(TradePoint, Result<BTreeMap<String, f64>, TableError>)> {
    let dir = dir.as_ref();
    points
        .iter()
        .map(|point| {
            let values = ResultTable::read(point.path_in(dir)).and_then(|table| {
                keys.iter()
                    .map(|k| Ok((k.clone(), table.get(k)?)))
                    .collect::<Result<BTreeMap<_, _>, TableError>>()
            });
            (*point, values)
        })
        .collect()
}
