//! Tests for solution tables written to and read from disk

use std::fs;

use crate::model::{ModelAdapter, Objective};
use crate::table::{ResultTable, TradePoint, collect_points, write_solution};

use super::support::runway_model;

#[test]
fn test_dump_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("point.out");
    fs::write(
        &path,
        "Cost\n----\n 3200.5 [lbf]\n\nW: 3200.5 lbf\nPFEI: 12.1 kJ/(kg*km)\n\
         Warning: PFEI: 99 ignored\nS_gr: 250 ft\n",
    )
    .unwrap();

    let table = ResultTable::read(&path).unwrap();
    assert_eq!(table.get("W").unwrap(), 3200.5);
    assert_eq!(table.get("PFEI").unwrap(), 12.1);
    assert!(table.get("S_gr").is_err());
    assert_eq!(table.len(), 2);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ResultTable::read(dir.path().join("absent.out")).unwrap_err();
    assert!(matches!(err, crate::error::TableError::Io(_)));
}

#[test]
fn test_solved_point_written_and_collected() {
    let mut model = runway_model();
    model
        .configure([("S_runway", 300.0), ("W_pay", 780.0)].into_iter().collect())
        .unwrap();
    model.set_objective(Objective::minimize("W")).unwrap();
    let sol = model.solve().unwrap();

    let dir = tempfile::tempdir().unwrap();
    let point = TradePoint {
        runway: 300.0,
        range: 100.0,
        payload: 780.0,
        speed: 120.0,
        g_landing: 0.5,
    };
    write_solution(point.path_in(dir.path()), &sol, |name| {
        model.unit_of(name).map(str::to_string)
    })
    .unwrap();

    let missing = TradePoint {
        payload: 975.0,
        ..point
    };
    let keys = vec!["W".to_string(), "S".to_string()];
    let collected = collect_points(dir.path(), &[point, missing], &keys);

    let values = collected[0].1.as_ref().unwrap();
    assert!((values["W"] - sol.objective).abs() < 1e-9 * sol.objective);
    assert!(values["S"] > 0.0);
    assert!(collected[1].1.is_err());

    let text = fs::read_to_string(point.path_in(dir.path())).unwrap();
    assert!(text.contains("W: "));
    assert!(text.contains(" lbf"));
}
