/*
    Export a state machine graph to plain dictionaries or to CSV files.

    `to_csv` writes the transition matrix to the given file and, when
    details are requested, the states, events and output tables next to it
    as <prefix>_states.csv, <prefix>_events.csv and <prefix>_output.csv.
    Rows and columns are written in sorted order so the same machine always
    produces the same bytes.
*/

use crate::errors::ProbeError;
use crate::graph::StateGraph;
use crate::importer::{DetailMap, TransitionMatrix, EVENT_PREFIX, SOURCE_COLUMN};
use serde_json::Value;
use std::collections::BTreeSet;

pub struct FsmExporter<'a> {
    graph: &'a StateGraph,
}

impl<'a> FsmExporter<'a> {
    pub fn new(graph: &'a StateGraph) -> Self {
        Self { graph }
    }

    // The transition matrix, states detail, events detail and transition
    // output tables. Only states with outgoing edges get a matrix row.
    pub fn to_dicts(
        &self,
    ) -> (TransitionMatrix, DetailMap, DetailMap, TransitionMatrix) {
        let mut transitions = TransitionMatrix::new();
        let mut states = DetailMap::new();
        let mut events = DetailMap::new();
        let mut outputs = TransitionMatrix::new();

        for name in self.graph.vertices() {
            let detail = self
                .graph
                .vertex_attrs(name)
                .and_then(|attrs| attrs.get("detail"))
                .map(detail_string)
                .unwrap_or_default();
            states.insert(name.to_string(), detail);
            if let Some(id) = self.graph.vertex_id(name) {
                if self.graph.out_degree(id) > 0 {
                    transitions.insert(name.to_string(), Default::default());
                    outputs.insert(name.to_string(), Default::default());
                }
            }
        }

        for edge in self.graph.edge_ids() {
            let arrow = self.graph.arrow_of(edge);
            let attrs = self.graph.edge_attrs(edge);
            let detail =
                attrs.get("detail").map(detail_string).unwrap_or_default();
            let output =
                attrs.get("output").map(detail_string).unwrap_or_default();
            events.insert(arrow.name.clone(), detail);
            if let Some(row) = transitions.get_mut(&arrow.tail) {
                row.insert(arrow.name.clone(), arrow.head.clone());
            }
            if let Some(row) = outputs.get_mut(&arrow.tail) {
                row.insert(arrow.name.clone(), output);
            }
        }

        (transitions, states, events, outputs)
    }

    pub fn to_csv(&self, filename: &str, detail: bool) -> Result<(), ProbeError> {
        let (transitions, states, events, outputs) = self.to_dicts();
        write_matrix(filename, &transitions)?;
        if detail {
            let prefix = filename.strip_suffix(".csv").unwrap_or(filename);
            write_details(&format!("{}_states.csv", prefix), &states)?;
            write_details(&format!("{}_events.csv", prefix), &events)?;
            write_matrix(&format!("{}_output.csv", prefix), &outputs)?;
        }
        Ok(())
    }
}

// Detail attributes are stored as JSON values but travel as opaque
// strings; anything that is not already a string is rendered as JSON.
fn detail_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn write_matrix(filename: &str, matrix: &TransitionMatrix) -> Result<(), ProbeError> {
    let event_names: BTreeSet<&String> =
        matrix.values().flat_map(|row| row.keys()).collect();

    let mut writer = csv::Writer::from_path(filename)?;
    let mut header = vec![SOURCE_COLUMN.to_string()];
    header.extend(
        event_names.iter().map(|name| format!("{}{}", EVENT_PREFIX, name)),
    );
    writer.write_record(&header)?;

    for (source, row) in matrix {
        let mut record = vec![source.clone()];
        for event in &event_names {
            record.push(row.get(*event).cloned().unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_details(filename: &str, details: &DetailMap) -> Result<(), ProbeError> {
    let mut writer = csv::Writer::from_path(filename)?;
    writer.write_record(["Name", "Detail"])?;
    for (name, detail) in details {
        writer.write_record([name, detail])?;
    }
    writer.flush()?;
    Ok(())
}
