/*
    A directed labeled multigraph storing a learned state machine.

    Supports:
    - Adding vertices by name, each carrying an attribute map used for the
      "detail" side-payload and for rendering hints.
    - Adding named edges; parallel edges between the same pair of vertices
      are kept apart as long as their names differ. The `unique` flag makes
      insertion of an identical (tail, head, name) triple a no-op.
    - Filtering edges by any combination of tail, head and name.
    - BFS visitation order, shortest paths as edge lists, and enumeration
      of all simple paths from a vertex.
    - Destructive edge removal, used by the coverage strategies on clones
      of the graph.
    - Interchange with a nested map {source -> {target -> {attrs}}}.

    Vertices and edges are referred to internally by index; a name table
    maps vertex names to indices. Lookups of unknown names return empty
    results rather than failing.
*/

use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;

pub type AttrMap = BTreeMap<String, Value>;
pub type NestedMap = BTreeMap<String, BTreeMap<String, AttrMap>>;

// Newtypes to keep different types of ID straight
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VertexId(pub usize);
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EdgeId(pub usize);

/*
    An arrow is a directed edge with an ordered pair of vertices and the
    name of the arc connecting them. The direction is from tail to head.
    The derived order is lexicographic on (tail, head, name).
*/
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Arrow {
    pub tail: String,
    pub head: String,
    pub name: String,
}
impl Arrow {
    pub fn new(tail: &str, head: &str, name: &str) -> Self {
        Self {
            tail: tail.to_string(),
            head: head.to_string(),
            name: name.to_string(),
        }
    }
    pub fn end_points(&self) -> [&str; 2] {
        [&self.tail, &self.head]
    }
}
impl fmt::Display for Arrow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}--{}->{}", self.tail, self.name, self.head)
    }
}

#[derive(Clone, Debug)]
struct VertexData {
    name: String,
    attrs: AttrMap,
}

#[derive(Clone, Debug)]
struct EdgeData {
    tail: VertexId,
    head: VertexId,
    name: String,
    attrs: AttrMap,
    alive: bool,
}

#[derive(Clone, Debug, Default)]
pub struct StateGraph {
    vertex_ids: HashMap<String, VertexId>,
    vertices: Vec<VertexData>,
    edges: Vec<EdgeData>,
    out_edges: Vec<Vec<EdgeId>>,
    in_edges: Vec<Vec<EdgeId>>,
}

impl StateGraph {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
    pub fn arc_count(&self) -> usize {
        self.edges.iter().filter(|e| e.alive).count()
    }
    pub fn has_vertex(&self, name: &str) -> bool {
        self.vertex_ids.contains_key(name)
    }
    pub fn vertex_id(&self, name: &str) -> Option<VertexId> {
        self.vertex_ids.get(name).copied()
    }
    pub fn vertex_name(&self, v: VertexId) -> &str {
        &self.vertices[v.0].name
    }
    pub fn vertex_attrs(&self, name: &str) -> Option<&AttrMap> {
        self.vertex_id(name).map(|v| &self.vertices[v.0].attrs)
    }
    pub fn vertex_ids_ordered(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertices.len()).map(VertexId)
    }
    pub fn vertices(&self) -> impl Iterator<Item = &str> {
        self.vertices.iter().map(|v| v.name.as_str())
    }

    // Idempotent: an existing vertex keeps its first attribute map.
    pub fn add_vertex(&mut self, name: &str, attrs: AttrMap) -> VertexId {
        if let Some(&id) = self.vertex_ids.get(name) {
            let existing = &self.vertices[id.0].attrs;
            if !existing.is_empty() && !attrs.is_empty() && *existing != attrs {
                error!(
                    "a vertex with the same name but different detail exists: \
                     name={}, detail={:?}, new detail={:?}",
                    name, existing, attrs
                );
            }
            return id;
        }
        let id = VertexId(self.vertices.len());
        self.vertex_ids.insert(name.to_string(), id);
        self.vertices.push(VertexData { name: name.to_string(), attrs });
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        info!("add new vertex {}", name);
        id
    }

    // Missing endpoints are added with empty attributes. With `unique` set,
    // inserting an existing (tail, head, name) triple is a no-op.
    pub fn add_edge(
        &mut self,
        tail: &str,
        head: &str,
        name: &str,
        attrs: AttrMap,
        unique: bool,
    ) -> Option<EdgeId> {
        if unique
            && !self.arcs_matching(Some(tail), Some(head), Some(name)).is_empty()
        {
            return None;
        }
        let tail_id = self.add_vertex(tail, AttrMap::new());
        let head_id = self.add_vertex(head, AttrMap::new());
        let id = EdgeId(self.edges.len());
        self.edges.push(EdgeData {
            tail: tail_id,
            head: head_id,
            name: name.to_string(),
            attrs,
            alive: true,
        });
        self.out_edges[tail_id.0].push(id);
        self.in_edges[head_id.0].push(id);
        info!("add new edge {}--{}->{}", tail, name, head);
        Some(id)
    }

    pub fn arrow_of(&self, e: EdgeId) -> Arrow {
        let edge = &self.edges[e.0];
        Arrow::new(
            self.vertex_name(edge.tail),
            self.vertex_name(edge.head),
            &edge.name,
        )
    }
    pub fn edge_head(&self, e: EdgeId) -> VertexId {
        self.edges[e.0].head
    }
    pub fn edge_name(&self, e: EdgeId) -> &str {
        &self.edges[e.0].name
    }
    pub fn edge_attrs(&self, e: EdgeId) -> &AttrMap {
        &self.edges[e.0].attrs
    }

    pub fn arcs(&self) -> Vec<Arrow> {
        self.edge_ids().map(|e| self.arrow_of(e)).collect()
    }
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.alive)
            .map(|(i, _)| EdgeId(i))
    }
    pub fn arc_endpoints(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.edges.iter().filter(|e| e.alive).map(|e| (e.tail, e.head))
    }

    // Filter edges; a None field matches anything.
    pub fn arcs_matching(
        &self,
        tail: Option<&str>,
        head: Option<&str>,
        name: Option<&str>,
    ) -> Vec<EdgeId> {
        let tail_id = match tail {
            Some(t) => match self.vertex_id(t) {
                Some(id) => Some(id),
                None => return Vec::new(),
            },
            None => None,
        };
        let head_id = match head {
            Some(h) => match self.vertex_id(h) {
                Some(id) => Some(id),
                None => return Vec::new(),
            },
            None => None,
        };
        self.edge_ids()
            .filter(|&e| {
                let edge = &self.edges[e.0];
                tail_id.map_or(true, |t| edge.tail == t)
                    && head_id.map_or(true, |h| edge.head == h)
                    && name.map_or(true, |n| edge.name == n)
            })
            .collect()
    }

    pub fn edges_between(&self, tail: VertexId, head: VertexId) -> Vec<EdgeId> {
        self.out_edges[tail.0]
            .iter()
            .copied()
            .filter(|&e| self.edges[e.0].alive && self.edges[e.0].head == head)
            .collect()
    }
    pub fn out_edge_ids(&self, v: VertexId) -> Vec<EdgeId> {
        self.out_edges[v.0]
            .iter()
            .copied()
            .filter(|&e| self.edges[e.0].alive)
            .collect()
    }
    pub fn out_degree(&self, v: VertexId) -> usize {
        self.out_edges[v.0].iter().filter(|&&e| self.edges[e.0].alive).count()
    }
    pub fn in_degree(&self, v: VertexId) -> usize {
        self.in_edges[v.0].iter().filter(|&&e| self.edges[e.0].alive).count()
    }

    pub fn delete_edge(&mut self, e: EdgeId) {
        self.edges[e.0].alive = false;
    }
    pub fn delete_self_loops(&mut self) {
        for edge in &mut self.edges {
            if edge.tail == edge.head {
                edge.alive = false;
            }
        }
    }

    /*
        Traversals.

        BFS visits out-edges in insertion order at each level, which keeps
        the strategies built on top of it deterministic. All of these
        return empty results when an endpoint is not in the graph.
    */

    pub fn bfs(&self, start: &str) -> Vec<String> {
        let start_id = match self.vertex_id(start) {
            Some(id) => id,
            None => {
                error!("invalid state {}", start);
                return Vec::new();
            }
        };
        let mut visited = vec![false; self.vertices.len()];
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        visited[start_id.0] = true;
        queue.push_back(start_id);
        while let Some(v) = queue.pop_front() {
            order.push(self.vertex_name(v).to_string());
            for e in self.out_edge_ids(v) {
                let head = self.edge_head(e);
                if !visited[head.0] {
                    visited[head.0] = true;
                    queue.push_back(head);
                }
            }
        }
        order
    }

    // Minimum-edge-count path as an edge list; the first path found by BFS
    // wins among equals. Empty when src or dst is missing, unreachable, or
    // the two coincide.
    pub fn shortest_path(&self, src: &str, dst: &str) -> Vec<Arrow> {
        let (src_id, dst_id) = match (self.vertex_id(src), self.vertex_id(dst)) {
            (Some(s), Some(d)) => (s, d),
            _ => {
                warn!("no path from {} to {}", src, dst);
                return Vec::new();
            }
        };
        if src_id == dst_id {
            return Vec::new();
        }
        let mut incoming: Vec<Option<EdgeId>> = vec![None; self.vertices.len()];
        let mut visited = vec![false; self.vertices.len()];
        let mut queue = VecDeque::new();
        visited[src_id.0] = true;
        queue.push_back(src_id);
        while let Some(v) = queue.pop_front() {
            if v == dst_id {
                break;
            }
            for e in self.out_edge_ids(v) {
                let head = self.edge_head(e);
                if !visited[head.0] {
                    visited[head.0] = true;
                    incoming[head.0] = Some(e);
                    queue.push_back(head);
                }
            }
        }
        if !visited[dst_id.0] {
            warn!("no path from {} to {}", src, dst);
            return Vec::new();
        }
        let mut path = Vec::new();
        let mut cursor = dst_id;
        while cursor != src_id {
            let e = incoming[cursor.0].unwrap();
            path.push(self.arrow_of(e));
            cursor = self.edges[e.0].tail;
        }
        path.reverse();
        path
    }

    // Every path from `start` that does not repeat a vertex, including the
    // trivial single-vertex path, sorted ascending by length.
    pub fn all_simple_paths_from(&self, start: &str) -> Vec<Vec<VertexId>> {
        match self.vertex_id(start) {
            Some(id) => self.simple_paths_from(id),
            None => Vec::new(),
        }
    }
    pub fn simple_paths_from(&self, start: VertexId) -> Vec<Vec<VertexId>> {
        let mut paths = Vec::new();
        let mut on_path = vec![false; self.vertices.len()];
        let mut current = vec![start];
        on_path[start.0] = true;
        self.collect_simple_paths(&mut current, &mut on_path, &mut paths);
        paths.sort_by_key(|p| p.len());
        paths
    }
    fn collect_simple_paths(
        &self,
        current: &mut Vec<VertexId>,
        on_path: &mut [bool],
        paths: &mut Vec<Vec<VertexId>>,
    ) {
        paths.push(current.clone());
        let last = *current.last().unwrap();
        for e in self.out_edge_ids(last) {
            let head = self.edge_head(e);
            if on_path[head.0] {
                continue;
            }
            current.push(head);
            on_path[head.0] = true;
            self.collect_simple_paths(current, on_path, paths);
            on_path[head.0] = false;
            current.pop();
        }
    }

    /*
        Interchange with a nested map {source -> {target -> {attrs}}}.
        The edge name travels inside the attribute map under "name".
    */

    pub fn load_from_nested_map(&mut self, data: &NestedMap) {
        for (source, targets) in data {
            for (target, attrs) in targets {
                let name = match attrs.get("name").and_then(Value::as_str) {
                    Some(n) => n.to_string(),
                    None => {
                        warn!("edge {} -> {} has no name, skipped", source, target);
                        continue;
                    }
                };
                let mut rest = attrs.clone();
                rest.remove("name");
                self.add_edge(source, target, &name, rest, true);
            }
        }
    }

    pub fn export_to_nested_map(&self) -> NestedMap {
        let mut data = NestedMap::new();
        for e in self.edge_ids() {
            let edge = &self.edges[e.0];
            let mut attrs = edge.attrs.clone();
            attrs.insert("name".to_string(), Value::String(edge.name.clone()));
            data.entry(self.vertex_name(edge.tail).to_string())
                .or_default()
                .insert(self.vertex_name(edge.head).to_string(), attrs);
        }
        data
    }

    /*
        Attribute merging, used to decorate an imported machine for
        rendering. Unknown names are skipped.
    */

    pub fn update_vertex_attrs(&mut self, data: &BTreeMap<String, AttrMap>) {
        for vertex in &mut self.vertices {
            if let Some(attrs) = data.get(&vertex.name) {
                for (key, value) in attrs {
                    vertex.attrs.insert(key.clone(), value.clone());
                }
            }
        }
    }

    pub fn update_edge_attrs(&mut self, data: &BTreeMap<String, AttrMap>) {
        for edge in &mut self.edges {
            if let Some(attrs) = data.get(&edge.name) {
                for (key, value) in attrs {
                    edge.attrs.insert(key.clone(), value.clone());
                }
            }
        }
    }
}
