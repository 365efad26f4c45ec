/*
    Transition coverage: an Euler walk of a connected directed graph based
    on Hierholzer's algorithm. If the graph is not Eulerian, some existing
    edges are duplicated first, so every original edge is walked at least
    once and every edge of the balanced graph exactly once.

    The walk picks among outgoing edges at random, which spreads coverage
    across repeated runs; seeding the generator makes a run reproducible.
*/

use super::{Strategy, Walk};
use crate::errors::ProbeError;
use crate::euler::{eulerize, is_eulerian, Eulerian};
use crate::graph::{Arrow, StateGraph, VertexId};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub struct EdgeCover {
    self_circuit: bool,
    rng: StdRng,
    // (vertex, incoming edge name) in traversal order; the first entry is
    // the start vertex with an empty incoming edge
    trail: Vec<(String, String)>,
    walks: Vec<Walk>,
}

impl EdgeCover {
    // `self_circuit` keeps self-loop edges in the walk; by default they
    // are dropped before planning.
    pub fn new(self_circuit: bool) -> Self {
        Self::with_rng(self_circuit, StdRng::from_entropy())
    }

    pub fn with_seed(self_circuit: bool, seed: u64) -> Self {
        Self::with_rng(self_circuit, StdRng::seed_from_u64(seed))
    }

    fn with_rng(self_circuit: bool, rng: StdRng) -> Self {
        Self { self_circuit, rng, trail: Vec::new(), walks: Vec::new() }
    }

    pub fn trail(&self) -> &[(String, String)] {
        &self.trail
    }

    /*
        Hierholzer walk with an explicit stack. From the top vertex, follow
        and delete a random outgoing edge; a vertex with no outgoing edge
        left is finished and popped. The finished sequence reversed is the
        Euler walk.
    */
    fn hierholzer(&mut self, graph: &mut StateGraph, start: VertexId) {
        let mut stack: Vec<(VertexId, String)> = vec![(start, String::new())];
        let mut finished: Vec<(VertexId, String)> = Vec::new();
        while let Some(&(current, _)) = stack.last() {
            let out_edges = graph.out_edge_ids(current);
            match out_edges.choose(&mut self.rng) {
                None => {
                    finished.push(stack.pop().unwrap());
                }
                Some(&edge) => {
                    let head = graph.edge_head(edge);
                    let name = graph.edge_name(edge).to_string();
                    debug!(
                        "visit vertex {} via {}",
                        graph.vertex_name(head),
                        name
                    );
                    graph.delete_edge(edge);
                    stack.push((head, name));
                }
            }
        }
        finished.reverse();
        self.trail = finished
            .into_iter()
            .map(|(v, name)| (graph.vertex_name(v).to_string(), name))
            .collect();
    }
}

impl Strategy for EdgeCover {
    fn travel(
        &mut self,
        graph: &StateGraph,
        start: &str,
    ) -> Result<(), ProbeError> {
        let mut graph = graph.clone();
        if !self.self_circuit {
            graph.delete_self_loops();
        }
        if is_eulerian(&graph) == Eulerian::None
            && eulerize(&mut graph) == Eulerian::None
        {
            return Err(ProbeError::NotEulerizable);
        }
        let start_id = graph
            .vertex_id(start)
            .ok_or_else(|| ProbeError::UnknownState(start.to_string()))?;

        self.trail.clear();
        self.walks.clear();
        self.hierholzer(&mut graph, start_id);

        let mut walk = Walk::new();
        for step in self.trail.windows(2) {
            walk.push(Arrow::new(&step[0].0, &step[1].0, &step[1].1));
        }
        self.walks.push(walk);
        Ok(())
    }

    fn walks(&self) -> &[Walk] {
        &self.walks
    }
}
