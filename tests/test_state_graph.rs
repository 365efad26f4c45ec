/*
    The graph layer: construction, lookups and interchange.
*/

mod common;

use common::{init_logger, sample_nested_map};
use fsm_probe::graph::{Arrow, AttrMap, StateGraph};

fn verify_graph(graph: &StateGraph, vertices: &[&str], arrows: &[Arrow]) {
    assert_eq!(graph.vertex_count(), vertices.len());
    assert_eq!(graph.arc_count(), arrows.len());
    for name in vertices {
        assert!(graph.has_vertex(name), "missing vertex {}", name);
    }
    for arrow in arrows {
        assert!(
            !graph
                .arcs_matching(
                    Some(&arrow.tail),
                    Some(&arrow.head),
                    Some(&arrow.name)
                )
                .is_empty(),
            "missing arrow {}",
            arrow
        );
    }
}

#[test]
fn add_vertices() {
    init_logger();
    let mut graph = StateGraph::new();
    graph.add_vertex("A", AttrMap::new());
    verify_graph(&graph, &["A"], &[]);
    graph.add_vertex("B", AttrMap::new());
    verify_graph(&graph, &["A", "B"], &[]);
    // adding the same vertex again changes nothing
    graph.add_vertex("A", AttrMap::new());
    verify_graph(&graph, &["A", "B"], &[]);
}

#[test]
fn add_arcs_creates_missing_endpoints() {
    init_logger();
    let mut graph = StateGraph::new();
    let mut connections = Vec::new();

    connections.push(Arrow::new("A", "B", "1"));
    graph.add_edge("A", "B", "1", AttrMap::new(), true);
    verify_graph(&graph, &["A", "B"], &connections);

    connections.push(Arrow::new("A", "C", "2"));
    graph.add_edge("A", "C", "2", AttrMap::new(), true);
    verify_graph(&graph, &["A", "B", "C"], &connections);
}

#[test]
fn load_sample_graph() {
    init_logger();
    let mut graph = StateGraph::new();
    graph.load_from_nested_map(&sample_nested_map());

    assert_eq!(graph.vertex_count(), 7);
    assert_eq!(graph.arc_count(), 8);
    assert_eq!(graph.bfs("A"), vec!["A", "B", "C", "D", "E", "F", "G"]);
    assert_eq!(graph.shortest_path("A", "G").len(), 4);
    assert_eq!(
        graph.shortest_path("A", "D"),
        vec![Arrow::new("A", "B", "1"), Arrow::new("B", "D", "3")]
    );
    assert!(graph.shortest_path("G", "A").is_empty());
}

#[test]
fn nested_map_round_trip() {
    init_logger();
    let data = sample_nested_map();
    let mut graph = StateGraph::new();
    graph.load_from_nested_map(&data);
    assert_eq!(graph.export_to_nested_map(), data);
}

#[test]
fn simple_path_enumeration_on_the_sample_graph() {
    init_logger();
    let mut graph = StateGraph::new();
    graph.load_from_nested_map(&sample_nested_map());

    let paths = graph.all_simple_paths_from("A");
    // two branchings of width 2 between A and G
    let full_length = paths.iter().filter(|p| p.len() == 5).count();
    assert_eq!(full_length, 4);
    // ascending by length
    for pair in paths.windows(2) {
        assert!(pair[0].len() <= pair[1].len());
    }
    assert!(graph.all_simple_paths_from("missing").is_empty());
}

#[test]
fn update_attrs_for_rendering() {
    init_logger();
    let mut graph = StateGraph::new();
    graph.load_from_nested_map(&sample_nested_map());

    let mut vertex_attrs = std::collections::BTreeMap::new();
    let mut color = AttrMap::new();
    color.insert("color".to_string(), serde_json::json!("red"));
    vertex_attrs.insert("A".to_string(), color.clone());
    vertex_attrs.insert("unknown".to_string(), color.clone());
    graph.update_vertex_attrs(&vertex_attrs);
    assert_eq!(
        graph.vertex_attrs("A").unwrap().get("color"),
        Some(&serde_json::json!("red"))
    );

    let mut edge_attrs = std::collections::BTreeMap::new();
    edge_attrs.insert("1".to_string(), color);
    graph.update_edge_attrs(&edge_attrs);
    let exported = graph.export_to_nested_map();
    assert_eq!(
        exported["A"]["B"].get("color"),
        Some(&serde_json::json!("red"))
    );
}
