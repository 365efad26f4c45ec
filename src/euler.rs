/*
    Eulerian properties of a directed graph.

    A connected graph whose vertices all have matching in- and out-degrees
    carries an Eulerian circuit; with exactly one vertex ahead by one
    outgoing edge (the hub) and one behind by one (the sink) it carries an
    Eulerian path. `eulerize` converts any other weakly connected graph by
    duplicating existing edges between imbalanced vertices.
*/

use crate::graph::{Arrow, AttrMap, StateGraph, VertexId};
use disjoint_sets::UnionFind;
use log::{debug, error, warn};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Eulerian {
    // no eulerian walk exists
    None,
    // every edge can be walked once, ending at the start vertex
    Circuit,
    // every edge can be walked once, ending at a different vertex
    Path,
}

// Weak connectivity: every vertex reachable from any one vertex when edge
// directions are ignored. An empty graph does not count as connected.
pub fn is_connected(graph: &StateGraph) -> bool {
    let n = graph.vertex_count();
    if n == 0 {
        return false;
    }
    let mut components = UnionFind::new(n);
    for (tail, head) in graph.arc_endpoints() {
        components.union(tail.0, head.0);
    }
    let root = components.find(0);
    (1..n).all(|v| components.find(v) == root)
}

fn degree_diff(graph: &StateGraph, v: VertexId) -> isize {
    graph.out_degree(v) as isize - graph.in_degree(v) as isize
}

pub fn is_eulerian(graph: &StateGraph) -> Eulerian {
    if !is_connected(graph) {
        return Eulerian::None;
    }
    let mut hubs = 0;
    let mut sinks = 0;
    for v in graph.vertex_ids_ordered() {
        let diff = degree_diff(graph, v);
        debug!(
            "vertex {}, in_degree={}, out_degree={}",
            graph.vertex_name(v),
            graph.in_degree(v),
            graph.out_degree(v)
        );
        match diff {
            0 => {}
            1 => hubs += 1,
            -1 => sinks += 1,
            _ => return Eulerian::None,
        }
        if hubs > 1 || sinks > 1 {
            return Eulerian::None;
        }
    }
    if hubs == 0 && sinks == 0 {
        Eulerian::Circuit
    } else if hubs == 1 && sinks == 1 {
        Eulerian::Path
    } else {
        Eulerian::None
    }
}

// One hub (out-degree surplus) and one sink (in-degree surplus), scanning
// vertices in insertion order and stopping as soon as both are found.
pub fn uneven_pair(
    graph: &StateGraph,
) -> (Option<VertexId>, Option<VertexId>) {
    let mut hub = None;
    let mut sink = None;
    for v in graph.vertex_ids_ordered() {
        let diff = degree_diff(graph, v);
        if diff > 0 {
            hub = Some(v);
        } else if diff < 0 {
            sink = Some(v);
        }
        if hub.is_some() && sink.is_some() {
            break;
        }
    }
    (hub, sink)
}

/*
    Make a directed graph Eulerian by duplicating existing edges between
    imbalanced vertices. Each round finds a hub/sink pair and copies the
    shortest sink-to-hub walk until one of the two is balanced, which
    lowers the total imbalance by at least two; the loop therefore
    terminates. When the sink cannot reach the hub the graph is left as it
    is and reclassified: a semi-Eulerian graph keeps its path, anything
    else is reported as not convertible.
*/
pub fn eulerize(graph: &mut StateGraph) -> Eulerian {
    let eulerian = is_eulerian(graph);
    if eulerian != Eulerian::None {
        return eulerian;
    }
    if !is_connected(graph) {
        return Eulerian::None;
    }
    loop {
        match uneven_pair(graph) {
            (None, None) => {
                debug!("no uneven vertex, the graph is eulerian");
                return Eulerian::Circuit;
            }
            (Some(hub), Some(sink)) => {
                let path = graph.shortest_path(
                    graph.vertex_name(sink),
                    graph.vertex_name(hub),
                );
                if path.is_empty() {
                    return is_eulerian(graph);
                }
                duplicate_path(graph, &path);
            }
            (hub, sink) => {
                error!(
                    "only a hub {:?} or only a sink {:?}, the graph cannot be balanced",
                    hub.map(|v| graph.vertex_name(v)),
                    sink.map(|v| graph.vertex_name(v))
                );
                return Eulerian::None;
            }
        }
    }
}

// Copy the path until the vertex on one of its ends is balanced.
pub fn duplicate_path(graph: &mut StateGraph, path: &[Arrow]) {
    let (first, last) = match (path.first(), path.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return,
    };
    let (from, to) = match (graph.vertex_id(&first.tail), graph.vertex_id(&last.head))
    {
        (Some(from), Some(to)) => (from, to),
        _ => {
            warn!("path endpoints {} / {} not in graph", first.tail, last.head);
            return;
        }
    };
    let repeat = std::cmp::min(-degree_diff(graph, from), degree_diff(graph, to));
    for _ in 0..repeat {
        for arc in path {
            graph.add_edge(&arc.tail, &arc.head, &arc.name, AttrMap::new(), false);
        }
    }
}
