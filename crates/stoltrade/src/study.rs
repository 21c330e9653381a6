//! YAML study files
//!
//! A study file holds a posynomial model plus the sweep, knee and trade
//! settings to run on it. The on-disk shapes here mirror the engine's
//! configuration types with explicit field names, which serde_saphyr reads
//! reliably, and convert into them.

use std::fs;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use stoltrade_core::knee::KneeConfig;
use stoltrade_core::model::Configuration;
use stoltrade_core::posynomial::PosynomialModel;
use stoltrade_core::sweep::{BoundaryProbe, SweepConfig, Tolerance};
use stoltrade_core::table::TradePoint;
use stoltrade_core::trade::TradeStudy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyFile {
    pub model: PosynomialModel,

    /// Parameters fixed for every solve of the study
    #[serde(default)]
    pub fixed: Configuration,

    pub sweep: SweepData,

    #[serde(default)]
    pub knee: Option<KneeConfig>,

    #[serde(default)]
    pub trade: Option<TradeData>,

    /// Points per curve when sweeps are resampled on a uniform grid
    #[serde(default = "default_grid")]
    pub grid: usize,

    /// Keys written for single-point solves
    #[serde(default)]
    pub point: Option<PointData>,
}

fn default_grid() -> usize {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToleranceData {
    Absolute { value: f64 },
    Relative { value: f64 },
}

impl Default for ToleranceData {
    fn default() -> Self {
        Self::from(Tolerance::default())
    }
}

impl From<Tolerance> for ToleranceData {
    fn from(tolerance: Tolerance) -> Self {
        match tolerance {
            Tolerance::Absolute(value) => ToleranceData::Absolute { value },
            Tolerance::Relative(value) => ToleranceData::Relative { value },
        }
    }
}

impl ToleranceData {
    pub fn to_tolerance(&self) -> Tolerance {
        match *self {
            ToleranceData::Absolute { value } => Tolerance::Absolute(value),
            ToleranceData::Relative { value } => Tolerance::Relative(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepData {
    pub variable: String,
    pub lo: f64,
    pub hi: f64,
    pub objective: String,
    #[serde(default)]
    pub outputs: Vec<String>,
    #[serde(default)]
    pub tolerance: ToleranceData,
    #[serde(default)]
    pub probe: BoundaryProbe,
    #[serde(default)]
    pub probe_margin: Option<f64>,
    #[serde(default)]
    pub max_samples: Option<usize>,
    #[serde(default)]
    pub min_width_fraction: Option<f64>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl SweepData {
    pub fn to_sweep_config(&self) -> SweepConfig {
        let mut config = SweepConfig::new(&self.variable, self.lo, self.hi, &self.objective)
            .with_outputs(self.outputs.iter().cloned())
            .with_tolerance(self.tolerance.to_tolerance())
            .with_probe(self.probe);
        if let Some(margin) = self.probe_margin {
            config.probe_margin = margin;
        }
        if let Some(n) = self.max_samples {
            config = config.with_max_samples(n);
        }
        if let Some(fraction) = self.min_width_fraction {
            config = config.with_min_width_fraction(fraction);
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout_ms(ms);
        }
        config
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeData {
    /// Parameter stepped by the outer loop
    pub outer: String,
    pub values: Vec<f64>,
    #[serde(default)]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    /// Objective minimized for a single point
    pub objective: String,
    /// Parameters whose values name the point's table file
    #[serde(default)]
    pub naming: Option<PointNaming>,
}

/// Parameter names behind each field of a [`TradePoint`] file name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointNaming {
    pub runway: String,
    pub range: String,
    pub payload: String,
    pub speed: String,
    pub g_landing: String,
}

impl PointNaming {
    /// Resolve each name from `config`, falling back to the model's
    /// parameter defaults
    pub fn trade_point(
        &self,
        model: &PosynomialModel,
        config: &Configuration,
    ) -> Result<TradePoint> {
        let lookup = |name: &str| {
            config
                .get(name)
                .or_else(|| {
                    model
                        .parameters
                        .iter()
                        .find(|p| p.name == name)
                        .and_then(|p| p.value)
                })
                .ok_or_else(|| eyre!("no value for '{name}' to name the table file"))
        };
        Ok(TradePoint {
            runway: lookup(&self.runway)?,
            range: lookup(&self.range)?,
            payload: lookup(&self.payload)?,
            speed: lookup(&self.speed)?,
            g_landing: lookup(&self.g_landing)?,
        })
    }
}

impl StudyFile {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let study: StudyFile =
            serde_saphyr::from_str(text).map_err(|e| eyre!("invalid study file: {e}"))?;
        study.model.validate().wrap_err("invalid model")?;
        if study.grid < 2 {
            return Err(eyre!("grid needs at least 2 points"));
        }
        Ok(study)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read study file {}", path.display()))?;
        let study = Self::from_yaml(&text)
            .wrap_err_with(|| format!("failed to load {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            model = %study.model.name,
            "loaded study"
        );
        Ok(study)
    }

    pub fn sweep_config(&self) -> SweepConfig {
        self.sweep.to_sweep_config()
    }

    /// Trade study for the `trade` section, with `workers` overriding the file
    pub fn trade_study(&self, workers: Option<usize>) -> Result<TradeStudy> {
        let trade = self
            .trade
            .as_ref()
            .ok_or_else(|| eyre!("study file has no trade section"))?;
        let mut study = TradeStudy::new(&trade.outer, trade.values.clone(), self.sweep_config())
            .with_base(self.fixed.clone());
        if let Some(knee) = &self.knee {
            study = study.with_knee(knee.clone());
        }
        if let Some(n) = workers.or(trade.workers) {
            study = study.with_workers(n);
        }
        Ok(study)
    }
}
