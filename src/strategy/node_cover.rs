/*
    State coverage: visit every vertex reachable from the start using as
    few, as short walks as possible.

    Each step elects a candidate simple path from the start vertex and one
    from the end of the previous walk, scores them by how many not yet
    visited vertices they would cover, and commits the better one. Both
    origins are considered every step, so a current vertex without onward
    progress cannot stall the plan while the start still reaches uncovered
    ground. Vertices that remain unvisited at the end are unreachable; the
    caller reads them from `unvisited` as the no-path diagnostic.
*/

use super::{Strategy, Walk};
use crate::errors::ProbeError;
use crate::graph::{StateGraph, VertexId};
use log::{error, warn};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/*
    A scored candidate: the vertex sequence and the number of unvisited
    vertices it covers. A candidate with more coverage wins; among equals
    the shorter path wins.
*/
#[derive(Clone, Debug)]
struct CandidatePath {
    path: Vec<VertexId>,
    coverage: usize,
}

impl Ord for CandidatePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.coverage
            .cmp(&other.coverage)
            .then_with(|| other.path.len().cmp(&self.path.len()))
    }
}
impl PartialOrd for CandidatePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for CandidatePath {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for CandidatePath {}

#[derive(Default)]
pub struct NodeCover {
    walks: Vec<Walk>,
    unvisited: BTreeSet<String>,
}

impl NodeCover {
    pub fn new() -> Self {
        Default::default()
    }

    // Vertices no committed walk reached, by name.
    pub fn unvisited(&self) -> &BTreeSet<String> {
        &self.unvisited
    }

    // The best path among the cached simple paths from one origin.
    // Scanning in ascending length order means the shortest path wins any
    // coverage tie; a path covering everything left ends the scan early.
    fn elect(
        paths: &[Vec<VertexId>],
        unvisited: &BTreeSet<VertexId>,
    ) -> Option<CandidatePath> {
        let mut best: Option<CandidatePath> = None;
        for path in paths {
            let coverage =
                path.iter().filter(|v| unvisited.contains(*v)).count();
            if coverage == unvisited.len() {
                return Some(CandidatePath { path: path.clone(), coverage });
            }
            if best.as_ref().map_or(true, |b| coverage > b.coverage) {
                best = Some(CandidatePath { path: path.clone(), coverage });
            }
        }
        best.filter(|b| b.coverage > 0)
    }

    /*
        Turn the winning vertex sequence into arrows. When several parallel
        edges connect a pair, the used one is deleted so a later traversal
        of the same pair takes a different edge; the last remaining edge is
        kept, which leaves every cached path walkable. The arrows extend
        the previous walk when they continue from its end, otherwise they
        start a new walk.
    */
    fn commit(&mut self, graph: &mut StateGraph, path: &[VertexId]) {
        if path.len() < 2 {
            warn!("not enough vertices for a walk: {:?}", path);
            return;
        }
        let mut arrows = Walk::new();
        for pair in path.windows(2) {
            let edges = graph.edges_between(pair[0], pair[1]);
            let edge = match edges.first() {
                Some(&edge) => edge,
                None => {
                    error!(
                        "no edge from {} to {}",
                        graph.vertex_name(pair[0]),
                        graph.vertex_name(pair[1])
                    );
                    break;
                }
            };
            arrows.push(graph.arrow_of(edge));
            if edges.len() > 1 {
                graph.delete_edge(edge);
            }
        }
        if arrows.is_empty() {
            return;
        }
        match self.walks.last_mut() {
            Some(last)
                if last.last().map(|arrow| arrow.head.as_str())
                    == Some(arrows[0].tail.as_str()) =>
            {
                last.extend(arrows);
            }
            _ => self.walks.push(arrows),
        }
    }
}

impl Strategy for NodeCover {
    fn travel(
        &mut self,
        graph: &StateGraph,
        start: &str,
    ) -> Result<(), ProbeError> {
        let mut graph = graph.clone();
        let start_id = graph
            .vertex_id(start)
            .ok_or_else(|| ProbeError::UnknownState(start.to_string()))?;

        self.walks.clear();
        let mut unvisited: BTreeSet<VertexId> =
            graph.vertex_ids_ordered().collect();
        let mut current: Option<VertexId> = None;
        let mut simple_paths: HashMap<VertexId, Vec<Vec<VertexId>>> =
            HashMap::new();

        while !unvisited.is_empty() {
            let start_paths = simple_paths
                .entry(start_id)
                .or_insert_with(|| graph.simple_paths_from(start_id));
            let from_start = Self::elect(start_paths, &unvisited);

            let from_current = match current {
                Some(vertex) if vertex != start_id => {
                    let paths = simple_paths
                        .entry(vertex)
                        .or_insert_with(|| graph.simple_paths_from(vertex));
                    Self::elect(paths, &unvisited)
                }
                _ => None,
            };

            // the current vertex wins ties over the start
            let winner = match (from_current, from_start) {
                (Some(cur), Some(origin)) => {
                    if cur >= origin {
                        cur
                    } else {
                        origin
                    }
                }
                (Some(cur), None) => cur,
                (None, Some(origin)) => origin,
                (None, None) => {
                    warn!(
                        "cannot reach the remaining vertices from {}, uncovered: {:?}",
                        start, unvisited
                    );
                    break;
                }
            };

            self.commit(&mut graph, &winner.path);
            for vertex in &winner.path {
                unvisited.remove(vertex);
            }
            current = winner.path.last().copied();
        }

        self.unvisited = unvisited
            .into_iter()
            .map(|v| graph.vertex_name(v).to_string())
            .collect();
        Ok(())
    }

    fn walks(&self) -> &[Walk] {
        &self.walks
    }
}
