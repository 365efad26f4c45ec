/*
    Build a state machine graph from CSV files or from plain dictionaries.

    The transition matrix file is required. Its header starts with
    `S_source` followed by event names prefixed with `E_`; each row names a
    source state and the target state reached per event, with empty cells
    for events the state does not answer. The states, events and output
    files are optional: the first two are `Name,Detail` tables, the output
    file has the shape of the transition matrix with the observed output in
    each cell.
*/

use crate::errors::ProbeError;
use crate::graph::{AttrMap, StateGraph};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

// {source -> {event -> target}} and {source -> {event -> output}}
pub type TransitionMatrix = BTreeMap<String, BTreeMap<String, String>>;
// {name -> detail}
pub type DetailMap = BTreeMap<String, String>;

pub const SOURCE_COLUMN: &str = "S_source";
pub const EVENT_PREFIX: &str = "E_";

#[derive(Debug, Default)]
pub struct FsmImporter;

impl FsmImporter {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_csv(
        &self,
        transitions: &Path,
        states: Option<&Path>,
        events: Option<&Path>,
        outputs: Option<&Path>,
    ) -> Result<StateGraph, ProbeError> {
        let matrix = read_matrix(transitions)?;
        let state_details = match states {
            Some(path) => read_details(path)?,
            None => DetailMap::new(),
        };
        let event_details = match events {
            Some(path) => read_details(path)?,
            None => DetailMap::new(),
        };
        let output_matrix = match outputs {
            Some(path) => read_matrix(path)?,
            None => TransitionMatrix::new(),
        };
        Ok(self.from_dicts(&matrix, &state_details, &event_details, &output_matrix))
    }

    pub fn from_dicts(
        &self,
        transitions: &TransitionMatrix,
        states: &DetailMap,
        events: &DetailMap,
        outputs: &TransitionMatrix,
    ) -> StateGraph {
        let mut graph = StateGraph::new();
        for (source, row) in transitions {
            let results = outputs.get(source);
            for (event, target) in row {
                add_detail_vertex(&mut graph, source, states);
                add_detail_vertex(&mut graph, target, states);
                let mut attrs = AttrMap::new();
                attrs.insert(
                    "detail".to_string(),
                    Value::String(events.get(event).cloned().unwrap_or_default()),
                );
                attrs.insert(
                    "output".to_string(),
                    Value::String(
                        results
                            .and_then(|row| row.get(event))
                            .cloned()
                            .unwrap_or_default(),
                    ),
                );
                graph.add_edge(source, target, event, attrs, true);
            }
        }
        graph
    }
}

fn add_detail_vertex(graph: &mut StateGraph, name: &str, states: &DetailMap) {
    let mut attrs = AttrMap::new();
    attrs.insert(
        "detail".to_string(),
        Value::String(states.get(name).cloned().unwrap_or_default()),
    );
    graph.add_vertex(name, attrs);
}

fn read_matrix(path: &Path) -> Result<TransitionMatrix, ProbeError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    match headers.get(0) {
        Some(SOURCE_COLUMN) => {}
        other => {
            return Err(ProbeError::Interchange(format!(
                "matrix {} must start with a {} column, found {:?}",
                path.display(),
                SOURCE_COLUMN,
                other
            )))
        }
    }
    let events: Vec<String> = headers
        .iter()
        .skip(1)
        .map(|header| {
            header.strip_prefix(EVENT_PREFIX).unwrap_or(header).to_string()
        })
        .collect();

    let mut matrix = TransitionMatrix::new();
    for record in reader.records() {
        let record = record?;
        let source = record.get(0).unwrap_or_default().to_string();
        if matrix.contains_key(&source) {
            return Err(ProbeError::Interchange(format!(
                "duplicated source state {}",
                source
            )));
        }
        let mut row = BTreeMap::new();
        for (index, event) in events.iter().enumerate() {
            if let Some(cell) = record.get(index + 1) {
                if !cell.is_empty() {
                    row.insert(event.clone(), cell.to_string());
                }
            }
        }
        matrix.insert(source, row);
    }
    Ok(matrix)
}

fn read_details(path: &Path) -> Result<DetailMap, ProbeError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut details = DetailMap::new();
    for record in reader.records() {
        let record = record?;
        let name = record.get(0).unwrap_or_default().to_string();
        let detail = record.get(1).unwrap_or_default().to_string();
        details.insert(name, detail);
    }
    Ok(details)
}
