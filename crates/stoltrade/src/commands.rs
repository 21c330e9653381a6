//! Subcommand implementations
//!
//! Each command returns the text it would print so it can be tested without
//! capturing stdout.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr, eyre};
use stoltrade_core::model::{Configuration, ModelAdapter, Objective};
use stoltrade_core::sweep::sweep_1d;
use stoltrade_core::table::{self, ResultTable, TradePoint};
use stoltrade_core::trade::{TradeProgress, run_trade_study};

use crate::cli::{Command, Format};
use crate::report::{SweepReport, TradeReport, to_yaml};
use crate::study::StudyFile;

pub fn run(command: Command) -> Result<String> {
    match command {
        Command::Sweep {
            study,
            grid,
            format,
        } => sweep(&StudyFile::load(&study)?, grid, format),
        Command::Trade {
            study,
            workers,
            format,
        } => trade(&StudyFile::load(&study)?, workers, format),
        Command::Point {
            study,
            set,
            out,
            dir,
        } => point(&StudyFile::load(&study)?, &set, out, dir),
        Command::Read { table, keys } => read(&table, &keys),
        Command::Collect {
            dir,
            runway,
            range,
            payload,
            speed,
            g_landing,
            keys,
        } => {
            let points: Vec<TradePoint> = runway
                .iter()
                .flat_map(|&rw| range.iter().map(move |&rg| (rw, rg)))
                .flat_map(|(rw, rg)| {
                    payload.iter().map(move |&pay| TradePoint {
                        runway: rw,
                        range: rg,
                        payload: pay,
                        speed,
                        g_landing,
                    })
                })
                .collect();
            collect(&dir, &points, &keys)
        }
    }
}

pub fn sweep(study: &StudyFile, grid: Option<usize>, format: Format) -> Result<String> {
    let config = study.sweep_config();
    if let Some(knee) = &study.knee
        && let Some(name) = std::iter::once(&knee.constraint)
            .chain(&knee.outputs)
            .find(|name| !study.model.knows(name))
    {
        return Err(eyre!("knee refers to unknown name '{name}'"));
    }
    let mut model = study.model.clone();
    let result = sweep_1d(&mut model, &study.fixed, &config)
        .wrap_err_with(|| format!("sweep of '{}' failed", config.variable))?;

    let report = SweepReport::new(
        &result,
        &config,
        study.knee.as_ref(),
        grid.unwrap_or(study.grid).max(2),
    )?;
    match format {
        Format::Text => Ok(report.to_text()),
        Format::Yaml => to_yaml(&report),
    }
}

pub fn trade(study: &StudyFile, workers: Option<usize>, format: Format) -> Result<String> {
    let trade = study.trade_study(workers)?;
    let progress = TradeProgress::new(trade.values.len());
    let curve = run_trade_study(&study.model, &trade, Some(&progress))
        .wrap_err_with(|| format!("trade study over '{}' failed", trade.outer))?;
    tracing::info!(
        completed = progress.completed(),
        total = progress.total(),
        "trade study finished"
    );

    let report = TradeReport::new(&curve, &trade.sweep.variable, trade.knee.as_ref());
    match format {
        Format::Text => Ok(report.to_text()),
        Format::Yaml => to_yaml(&report),
    }
}

/// Solve one configuration. The table goes to `out`, to a file named after
/// the trade point in `dir`, or back to the caller.
pub fn point(
    study: &StudyFile,
    set: &[(String, f64)],
    out: Option<PathBuf>,
    dir: Option<PathBuf>,
) -> Result<String> {
    let config = set
        .iter()
        .fold(study.fixed.clone(), |acc, (name, value)| acc.with(name, *value));
    let objective = study
        .point
        .as_ref()
        .map_or(study.sweep.objective.as_str(), |p| p.objective.as_str());

    let mut model = study.model.clone();
    model.configure(config.clone())?;
    model.set_objective(Objective::minimize(objective))?;
    let solution = model
        .solve()
        .wrap_err_with(|| format!("no solution for {}", describe(&config)))?;
    if !solution.is_optimal() {
        tracing::warn!(status = ?solution.status, "point solve was not optimal");
    }

    let unit_of = |name: &str| study.model.unit_of(name).map(str::to_string);
    let path = match (out, dir) {
        (Some(path), _) => Some(path),
        (None, Some(dir)) => {
            let naming = study
                .point
                .as_ref()
                .and_then(|p| p.naming.as_ref())
                .ok_or_else(|| eyre!("--dir needs a point.naming section in the study"))?;
            Some(naming.trade_point(&study.model, &config)?.path_in(dir))
        }
        (None, None) => None,
    };

    match path {
        Some(path) => {
            table::write_solution(&path, &solution, unit_of)
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), objective = solution.objective, "point written");
            Ok(format!("{}\n", path.display()))
        }
        None => Ok(table::render_solution(&solution, unit_of)),
    }
}

pub fn read(path: &Path, keys: &[String]) -> Result<String> {
    let table = ResultTable::read(path)
        .wrap_err_with(|| format!("failed to read table {}", path.display()))?;
    let mut out = String::new();
    if keys.is_empty() {
        for (key, value) in table.iter() {
            out.push_str(&format!("{key}: {value}\n"));
        }
    } else {
        for key in keys {
            out.push_str(&format!("{key}: {}\n", table.get(key)?));
        }
    }
    Ok(out)
}

/// One line per point: the file name, then each key's value or the reason
/// it could not be read
pub fn collect(dir: &Path, points: &[TradePoint], keys: &[String]) -> Result<String> {
    if points.is_empty() {
        return Err(eyre!("no trade points to collect"));
    }
    let mut out = String::new();
    let mut missing = 0;
    for (point, values) in table::collect_points(dir, points, keys) {
        out.push_str(&point.file_name());
        match values {
            Ok(values) => {
                for (key, value) in values {
                    out.push_str(&format!(" {key}={value}"));
                }
            }
            Err(e) => {
                missing += 1;
                out.push_str(&format!(" ({e})"));
            }
        }
        out.push('\n');
    }
    if missing > 0 {
        tracing::warn!(missing, total = points.len(), "some trade points could not be read");
    }
    Ok(out)
}

fn describe(config: &Configuration) -> String {
    let parts: Vec<String> = config.iter().map(|(k, v)| format!("{k}={v}")).collect();
    if parts.is_empty() {
        "the default configuration".to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO: &str = include_str!("../../../demos/stol_runway.yaml");

    fn demo() -> StudyFile {
        StudyFile::from_yaml(DEMO).unwrap()
    }

    #[test]
    fn test_sweep_finds_landing_knee() {
        let text = sweep(&demo(), Some(5), Format::Text).unwrap();
        assert!(text.contains("Sweep of S_runway"), "{text}");
        assert!(text.contains("knee at S_runway"), "{text}");

        let yaml = sweep(&demo(), Some(5), Format::Yaml).unwrap();
        assert!(yaml.contains("variable: S_runway"));
    }

    #[test]
    fn test_trade_knees_move_with_payload() {
        let study = demo();
        let trade_study = study.trade_study(Some(2)).unwrap();
        let curve = run_trade_study(&study.model, &trade_study, None).unwrap();
        let knees = curve.knee_curve();
        assert_eq!(knees.len(), 3);
        assert!(knees[0].1 < knees[1].1 && knees[1].1 < knees[2].1);

        let text = trade(&study, Some(1), Format::Text).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).take(3).collect();
        assert!(rows[0].trim_start().starts_with("400.0"), "{text}");
        assert!(rows[2].trim_start().starts_with("1200"), "{text}");
    }

    #[test]
    fn test_point_round_trip_through_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let study = demo();
        let set = vec![("S_runway".to_string(), 300.0)];

        let printed = point(&study, &set, None, Some(tmp.path().to_path_buf())).unwrap();
        let path = PathBuf::from(printed.trim());
        assert!(path.ends_with("RNWY_ 300_RNG_ 100_PAY_ 800_V_120_GLND_  5.sum"));

        let table = ResultTable::read(&path).unwrap();
        assert!(table.get("W").unwrap() > 1000.0);
        assert!(table.get("S").unwrap() > 0.0);

        let keys = vec!["W".to_string(), "S".to_string()];
        let read_back = read(&path, &keys).unwrap();
        assert!(read_back.starts_with("W: "));

        let points = [
            TradePoint {
                runway: 300.0,
                range: 100.0,
                payload: 800.0,
                speed: 120.0,
                g_landing: 0.5,
            },
            TradePoint {
                runway: 400.0,
                range: 100.0,
                payload: 800.0,
                speed: 120.0,
                g_landing: 0.5,
            },
        ];
        let collected = collect(tmp.path(), &points, &keys).unwrap();
        let lines: Vec<&str> = collected.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(" W="));
        assert!(lines[1].contains('('));
    }

    #[test]
    fn test_unknown_knee_name_fails_before_sweeping() {
        let mut study = demo();
        if let Some(knee) = study.knee.as_mut() {
            knee.outputs.push("W_typo".to_string());
        }
        let err = sweep(&study, None, Format::Text).unwrap_err();
        assert!(err.to_string().contains("'W_typo'"), "{err}");
    }

    #[test]
    fn test_point_without_runway_fails() {
        let err = point(&demo(), &[], None, None).unwrap_err();
        assert!(format!("{err:#}").contains("no solution"), "{err:#}");
    }

    #[test]
    fn test_point_prints_table() {
        let set = vec![("S_runway".to_string(), 300.0)];
        let text = point(&demo(), &set, None, None).unwrap();
        assert!(text.starts_with("Cost "));
        assert!(ResultTable::parse(&text).get("W").is_ok());
    }
}
