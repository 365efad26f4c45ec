/*
    CSV and dictionary interchange round trips.
*/

mod common;

use common::init_logger;
use fsm_probe::exporter::FsmExporter;
use fsm_probe::importer::{DetailMap, FsmImporter, TransitionMatrix};
use std::collections::BTreeMap;
use std::fs;

fn matrix(rows: &[(&str, &[(&str, &str)])]) -> TransitionMatrix {
    rows.iter()
        .map(|(source, cells)| {
            let row: BTreeMap<String, String> = cells
                .iter()
                .map(|(event, target)| (event.to_string(), target.to_string()))
                .collect();
            (source.to_string(), row)
        })
        .collect()
}

fn details(pairs: &[(&str, &str)]) -> DetailMap {
    pairs
        .iter()
        .map(|(name, detail)| (name.to_string(), detail.to_string()))
        .collect()
}

fn sample_bundle() -> (TransitionMatrix, DetailMap, DetailMap, TransitionMatrix) {
    let transitions = matrix(&[
        ("S1", &[("1", "S2"), ("2", "S3")]),
        ("S2", &[("1", "S1"), ("3", "S3")]),
        ("S3", &[("2", "S1")]),
    ]);
    let states = details(&[
        ("S1", "State 1"),
        ("S2", "State 2"),
        ("S3", "State 3"),
    ]);
    let events = details(&[("1", "Event 1"), ("2", "Event 2"), ("3", "Event 3")]);
    let outputs = matrix(&[
        ("S1", &[("1", "Result 1"), ("2", "Result 2")]),
        ("S2", &[("1", "Result 3"), ("3", "Result 4")]),
        ("S3", &[("2", "Result 5")]),
    ]);
    (transitions, states, events, outputs)
}

#[test]
fn dict_round_trip() {
    init_logger();
    let (transitions, states, events, outputs) = sample_bundle();
    let graph =
        FsmImporter::new().from_dicts(&transitions, &states, &events, &outputs);
    let exported = FsmExporter::new(&graph).to_dicts();

    assert_eq!(exported.0, transitions);
    assert_eq!(exported.1, states);
    assert_eq!(exported.2, events);
    assert_eq!(exported.3, outputs);
}

#[test]
fn dict_round_trip_with_empty_data() {
    init_logger();
    let empty_matrix = TransitionMatrix::new();
    let empty_details = DetailMap::new();
    let graph = FsmImporter::new().from_dicts(
        &empty_matrix,
        &empty_details,
        &empty_details,
        &empty_matrix,
    );
    let exported = FsmExporter::new(&graph).to_dicts();
    assert_eq!(exported.0, empty_matrix);
    assert_eq!(exported.1, empty_details);
    assert_eq!(exported.2, empty_details);
    assert_eq!(exported.3, empty_matrix);
}

#[test]
fn missing_event_detail_defaults_to_empty() {
    init_logger();
    let transitions =
        matrix(&[("S1", &[("1", "S2")]), ("S2", &[("2", "S3")])]);
    let states = details(&[
        ("S1", "State 1"),
        ("S2", "State 2"),
        ("S3", "State 3"),
    ]);
    // event "2" has no detail entry
    let events = details(&[("1", "Event 1")]);
    let outputs =
        matrix(&[("S1", &[("1", "Result 1")]), ("S2", &[("2", "Result 2")])]);

    let graph =
        FsmImporter::new().from_dicts(&transitions, &states, &events, &outputs);
    let exported = FsmExporter::new(&graph).to_dicts();

    assert_eq!(exported.0, transitions);
    let mut expected_events = events;
    expected_events.insert("2".to_string(), String::new());
    assert_eq!(exported.2, expected_events);
}

#[test]
fn circular_transitions_round_trip() {
    init_logger();
    let transitions = matrix(&[("S1", &[("1", "S2")]), ("S2", &[("1", "S1")])]);
    let states = details(&[("S1", "State 1"), ("S2", "State 2")]);
    let events = details(&[("1", "Event 1")]);
    let outputs =
        matrix(&[("S1", &[("1", "Result 1")]), ("S2", &[("1", "Result 2")])]);

    let graph =
        FsmImporter::new().from_dicts(&transitions, &states, &events, &outputs);
    let exported = FsmExporter::new(&graph).to_dicts();
    assert_eq!(exported.0, transitions);
    assert_eq!(exported.3, outputs);
}

#[test]
fn csv_round_trip_is_byte_identical() {
    init_logger();
    let (transitions, states, events, outputs) = sample_bundle();
    let graph =
        FsmImporter::new().from_dicts(&transitions, &states, &events, &outputs);

    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("machine.csv");
    let base_str = base.to_str().unwrap().to_string();
    FsmExporter::new(&graph).to_csv(&base_str, true).unwrap();

    let prefix = base_str.strip_suffix(".csv").unwrap();
    let states_path = format!("{}_states.csv", prefix);
    let events_path = format!("{}_events.csv", prefix);
    let output_path = format!("{}_output.csv", prefix);

    let reloaded = FsmImporter::new()
        .from_csv(
            &base,
            Some(states_path.as_ref()),
            Some(events_path.as_ref()),
            Some(output_path.as_ref()),
        )
        .unwrap();
    let exported = FsmExporter::new(&reloaded).to_dicts();
    assert_eq!(exported.0, transitions);
    assert_eq!(exported.1, states);
    assert_eq!(exported.2, events);
    assert_eq!(exported.3, outputs);

    // exporting the reloaded machine reproduces the files byte for byte
    let second = dir.path().join("second.csv");
    let second_str = second.to_str().unwrap().to_string();
    FsmExporter::new(&reloaded).to_csv(&second_str, true).unwrap();
    let second_prefix = second_str.strip_suffix(".csv").unwrap();
    assert_eq!(
        fs::read_to_string(&base).unwrap(),
        fs::read_to_string(&second).unwrap()
    );
    assert_eq!(
        fs::read_to_string(&states_path).unwrap(),
        fs::read_to_string(format!("{}_states.csv", second_prefix)).unwrap()
    );
    assert_eq!(
        fs::read_to_string(&events_path).unwrap(),
        fs::read_to_string(format!("{}_events.csv", second_prefix)).unwrap()
    );
    assert_eq!(
        fs::read_to_string(&output_path).unwrap(),
        fs::read_to_string(format!("{}_output.csv", second_prefix)).unwrap()
    );
}

#[test]
fn malformed_matrix_is_rejected() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();

    let wrong_header = dir.path().join("wrong.csv");
    fs::write(&wrong_header, "State,E_1\nS1,S2\n").unwrap();
    assert!(FsmImporter::new()
        .from_csv(&wrong_header, None, None, None)
        .is_err());

    let duplicated = dir.path().join("dup.csv");
    fs::write(&duplicated, "S_source,E_1\nS1,S2\nS1,S3\n").unwrap();
    assert!(FsmImporter::new()
        .from_csv(&duplicated, None, None, None)
        .is_err());
}
