//! Retainer analyzer tests
//!
//! Scenario tests for flagging, cycle handling and flag suppression, plus a
//! mocked sink to check that flags are streamed as they are found.

use heaptrace::analysis::AnalysisError;
use heaptrace::{ClosureId, ClosureRecord, Edge, Flag, FlagSink, HeapGraph, RetainerAnalyzer, analyze};
use mockall::{Sequence, mock};

fn build(records: &[(&str, &str)], edges: &[(&str, &str)], roots: &[&str]) -> HeapGraph {
    let records: Vec<_> = records
        .iter()
        .map(|(id, kind)| ClosureRecord::new(*id, 16, *kind))
        .collect();
    let edges: Vec<_> = edges.iter().map(|(f, t)| Edge::new(*f, *t)).collect();
    let roots: Vec<_> = roots.iter().map(|r| ClosureId::from(*r)).collect();
    HeapGraph::build(&records, &edges, &roots).unwrap()
}

fn ids(list: &[ClosureId]) -> Vec<&str> {
    list.iter().map(ClosureId::as_str).collect()
}

mock! {
    pub Sink {}

    impl FlagSink for Sink {
        fn emit(&mut self, flag: Flag);
    }
}

/// Root R points at a single sentinel X
#[test]
fn test_single_sentinel_flags_root() {
    let graph = build(&[("R", "U"), ("X", "S")], &[("R", "X")], &["R"]);

    let flags = analyze(&graph, "S", 1).unwrap();
    assert_eq!(flags.len(), 1);

    let flag = &flags[0];
    assert_eq!(flag.node.as_str(), "R");
    assert_eq!(flag.path_depth, 0);
    assert_eq!(flag.reachable_before, 0);
    assert_eq!(flag.reachable_after, 1);
    assert_eq!(flag.per_child_counts, vec![1]);
    assert_eq!(ids(&flag.children), vec!["X"]);
    assert_eq!(ids(&flag.path), vec!["R"]);
}

/// R and A point at each other and nothing is a sentinel
#[test]
fn test_two_cycle_without_sentinels() {
    let graph = build(&[("R", "U"), ("A", "U")], &[("R", "A"), ("A", "R")], &["R"]);

    let mut analyzer = RetainerAnalyzer::new(&graph, "S", 1).unwrap();
    let mut flags = Vec::new();
    let r = graph.index_of("R").unwrap();
    let reach = analyzer.visit(r, &mut flags).unwrap();

    assert!(reach.is_empty());
    assert!(flags.is_empty());
}

#[test]
fn test_cycle_does_not_double_count_off_cycle_sentinels() {
    // a <-> b, both point at sentinel s
    let graph = build(
        &[("a", "U"), ("b", "U"), ("s", "S")],
        &[("a", "b"), ("b", "a"), ("a", "s"), ("b", "s")],
        &["a"],
    );

    let mut analyzer = RetainerAnalyzer::new(&graph, "S", 10).unwrap();
    let mut flags = Vec::new();
    let a = graph.index_of("a").unwrap();
    let reach = analyzer.visit(a, &mut flags).unwrap();
    assert_eq!(reach.len(), 1);
}

#[test]
fn test_flagged_node_is_suppressed_for_its_ancestors() {
    // r -> m -> h, and h retains three sentinels
    let graph = build(
        &[
            ("r", "U"),
            ("m", "U"),
            ("h", "U"),
            ("s1", "S"),
            ("s2", "S"),
            ("s3", "S"),
        ],
        &[
            ("r", "m"),
            ("m", "h"),
            ("h", "s1"),
            ("h", "s2"),
            ("h", "s3"),
        ],
        &["r"],
    );

    let flags = analyze(&graph, "S", 3).unwrap();
    assert_eq!(flags.len(), 1);
    assert_eq!(flags[0].node.as_str(), "h");
    assert_eq!(flags[0].path_depth, 2);
    assert_eq!(flags[0].per_child_counts, vec![1, 1, 1]);
    assert_eq!(ids(&flags[0].path), vec!["r", "m", "h"]);

    // With a threshold of 1 the deepest closure still absorbs the flag
    let flags = analyze(&graph, "S", 1).unwrap();
    assert_eq!(flags.len(), 1);
    assert_eq!(flags[0].node.as_str(), "h");
}

#[test]
fn test_sibling_contributions_still_reach_parent() {
    // p -> hot (flagged, 2 sentinels) and p -> cold (1 sentinel)
    let graph = build(
        &[
            ("p", "U"),
            ("hot", "U"),
            ("cold", "U"),
            ("s1", "S"),
            ("s2", "S"),
            ("s3", "S"),
        ],
        &[
            ("p", "hot"),
            ("p", "cold"),
            ("hot", "s1"),
            ("hot", "s2"),
            ("cold", "s3"),
        ],
        &["p"],
    );

    let mut analyzer = RetainerAnalyzer::new(&graph, "S", 2).unwrap();
    let mut flags = Vec::new();
    let p = graph.index_of("p").unwrap();
    let reach = analyzer.visit(p, &mut flags).unwrap();

    // children of p in id order: cold, hot
    assert_eq!(reach.len(), 1);
    assert_eq!(flags.len(), 1);
    assert_eq!(flags[0].node.as_str(), "hot");
}

#[test]
fn test_flags_follow_root_order() {
    let graph = build(
        &[("r1", "U"), ("r2", "U"), ("s1", "S"), ("s2", "S")],
        &[("r1", "s1"), ("r2", "s2")],
        &["r2", "r1"],
    );

    let flags = analyze(&graph, "S", 1).unwrap();
    let nodes: Vec<_> = flags.iter().map(|f| f.node.as_str()).collect();
    assert_eq!(nodes, vec!["r2", "r1"]);
}

#[test]
fn test_root_sentinel_is_not_flagged() {
    let graph = build(&[("s", "S"), ("t", "S")], &[("s", "t")], &["s"]);
    assert!(analyze(&graph, "S", 1).unwrap().is_empty());
}

#[test]
fn test_degenerate_inputs() {
    let empty = HeapGraph::build(&[], &[], &[]).unwrap();
    assert!(analyze(&empty, "S", 1).unwrap().is_empty());

    let no_sentinels = build(&[("r", "U"), ("a", "U")], &[("r", "a")], &["r"]);
    assert!(analyze(&no_sentinels, "S", 1).unwrap().is_empty());

    assert!(matches!(
        analyze(&no_sentinels, "S", 0),
        Err(AnalysisError::InvalidThreshold)
    ));
}

#[test]
fn test_depth_limit_error_message() {
    let graph = build(
        &[("a", "U"), ("b", "U"), ("c", "U")],
        &[("a", "b"), ("b", "c")],
        &["a"],
    );

    let mut analyzer = RetainerAnalyzer::new(&graph, "S", 1)
        .unwrap()
        .with_max_depth(1);
    let err = analyzer.run_roots(&mut Vec::new()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Traversal depth limit of 1 exceeded at closure b (path length 2)"
    );
}

#[test]
fn test_flags_are_streamed_to_sink() {
    let graph = build(
        &[("r1", "U"), ("r2", "U"), ("s1", "S"), ("s2", "S")],
        &[("r1", "s1"), ("r2", "s2")],
        &["r1", "r2"],
    );

    let mut seq = Sequence::new();
    let mut sink = MockSink::new();
    sink.expect_emit()
        .withf(|flag| flag.node.as_str() == "r1" && flag.reachable_after == 1)
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    sink.expect_emit()
        .withf(|flag| flag.node.as_str() == "r2")
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());

    let stats = RetainerAnalyzer::new(&graph, "S", 1)
        .unwrap()
        .run_roots(&mut sink)
        .unwrap();
    assert_eq!(stats.flags, 2);
    assert_eq!(stats.roots, 2);
}

#[test]
fn test_independent_runs_share_graph_across_threads() {
    let graph = build(
        &[("r", "U"), ("a", "U"), ("s", "S"), ("t", "T")],
        &[("r", "a"), ("a", "s"), ("a", "t")],
        &["r"],
    );

    let (by_s, by_t) = std::thread::scope(|scope| {
        let s = scope.spawn(|| analyze(&graph, "S", 1).unwrap());
        let t = scope.spawn(|| analyze(&graph, "T", 1).unwrap());
        (s.join().unwrap(), t.join().unwrap())
    });

    assert_eq!(by_s, analyze(&graph, "S", 1).unwrap());
    assert_eq!(by_s.len(), 1);
    assert_eq!(by_t.len(), 1);
    assert_eq!(by_s[0].node.as_str(), "a");
}
