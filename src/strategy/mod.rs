/*
    Coverage strategies over a learned state machine.

    A strategy plans walks over the graph from a start vertex: NodeCover
    visits every reachable vertex, EdgeCover traverses every edge. Both
    consume edges destructively, so they operate on their own clone of the
    graph.
*/

pub mod edge_cover;
pub mod node_cover;

pub use edge_cover::EdgeCover;
pub use node_cover::NodeCover;

use crate::errors::ProbeError;
use crate::graph::{Arrow, StateGraph};

// A walk is a contiguous sequence of arrows: each arrow starts where the
// previous one ended.
pub type Walk = Vec<Arrow>;

pub trait Strategy {
    fn travel(&mut self, graph: &StateGraph, start: &str)
        -> Result<(), ProbeError>;

    fn walks(&self) -> &[Walk];

    // Human-readable rendition of the planned walks, one per line.
    fn tracks(&self) -> String {
        let mut result = String::new();
        for walk in self.walks() {
            if walk.is_empty() {
                continue;
            }
            result.push_str(&dump_walk(walk));
            result.push('\n');
        }
        result
    }
}

pub fn dump_walk(walk: &[Arrow]) -> String {
    let mut result = match walk.first() {
        Some(arrow) => arrow.tail.clone(),
        None => return String::new(),
    };
    for arrow in walk {
        result.push_str(&format!("--{}->{}", arrow.name, arrow.head));
    }
    result
}
