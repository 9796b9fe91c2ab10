//! Predecessor explorer tests

use heaptrace::analysis::TreeRow;
use heaptrace::{ClosureId, ClosureRecord, Edge, HeapGraph, explore};

fn build(records: &[(&str, &str)], edges: &[(&str, &str)]) -> HeapGraph {
    let records: Vec<_> = records
        .iter()
        .map(|(id, kind)| ClosureRecord::new(*id, 16, *kind))
        .collect();
    let edges: Vec<_> = edges.iter().map(|(f, t)| Edge::new(*f, *t)).collect();
    HeapGraph::build(&records, &edges, &[]).unwrap()
}

fn row(depth: usize, id: &str, kind: &str) -> TreeRow {
    TreeRow {
        depth,
        id: ClosureId::from(id),
        kind: kind.to_string(),
    }
}

/// One target N with predecessors P1 and P2; only P1 has a predecessor, G
#[test]
fn test_two_level_predecessor_tree() {
    let graph = build(
        &[("N", "T"), ("P1", "A"), ("P2", "B"), ("G", "C")],
        &[("P1", "N"), ("P2", "N"), ("G", "P1")],
    );

    let trees = explore(&graph, "T", 3).unwrap();
    assert_eq!(trees.len(), 1);

    let tree = &trees[0];
    assert_eq!(tree.id.as_str(), "N");
    assert_eq!(tree.children.len(), 2);
    assert_eq!(tree.children[0].id.as_str(), "P1");
    assert_eq!(tree.children[1].id.as_str(), "P2");
    assert!(tree.children[1].children.is_empty());

    assert_eq!(
        tree.rows(),
        vec![
            row(0, "N", "T"),
            row(1, "P1", "A"),
            row(2, "G", "C"),
            row(1, "P2", "B"),
        ]
    );
}

#[test]
fn test_multiple_targets_in_id_order() {
    let graph = build(
        &[("n2", "T"), ("n1", "T"), ("p", "U")],
        &[("p", "n1"), ("p", "n2")],
    );

    let trees = explore(&graph, "T", 1).unwrap();
    let starts: Vec<_> = trees.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(starts, vec!["n1", "n2"]);

    // p is reported under each target it points at
    assert!(trees.iter().all(|t| t.children.len() == 1));
}

#[test]
fn test_depth_three_stops_after_third_level() {
    // e -> d -> c -> b -> a
    let graph = build(
        &[("a", "T"), ("b", "U"), ("c", "U"), ("d", "U"), ("e", "U")],
        &[("b", "a"), ("c", "b"), ("d", "c"), ("e", "d")],
    );

    let rows = explore(&graph, "T", 3).unwrap()[0].rows();
    let deepest = rows.iter().map(|r| r.depth).max().unwrap();
    assert_eq!(deepest, 3);
    assert!(rows.iter().all(|r| r.id.as_str() != "e"));
}

#[test]
fn test_unknown_predecessors_are_shown() {
    let edges = vec![Edge::new("ghost", "n")];
    let records = vec![ClosureRecord::new("n", 8, "T")];
    let graph = HeapGraph::build(&records, &edges, &[]).unwrap();

    let rows = explore(&graph, "T", 3).unwrap()[0].rows();
    assert_eq!(rows[1], row(1, "ghost", "???"));
}
