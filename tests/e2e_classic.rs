//! End-to-end traversals over the classic toy graph: six vertices, six
//! edges, every vertex labelled `vertex`.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use tinkerpop_rs::coerce::{self, noargs};
use tinkerpop_rs::{Bridge, BridgeConfig, Graph, Value, Vertex};

fn classic(name: &str) -> (Bridge, Graph) {
    let bridge = Bridge::start(BridgeConfig { runtime_name: name.into() }).unwrap();
    let graph = bridge.tinker_factory().create_classic().unwrap();
    (bridge, graph)
}

fn sorted(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names
}

// ============================================================================
// 1. Projections
// ============================================================================

#[test]
fn test_dedup_names_is_the_name_set() {
    let (_bridge, graph) = classic("classic-dedup");
    let names: Vec<String> = graph.v(noargs()).unwrap().values(&["name"]).unwrap().dedup().unwrap().to_list_as().unwrap();
    let set: BTreeSet<_> = names.iter().map(String::as_str).collect();
    assert_eq!(set, BTreeSet::from(["josh", "lop", "marko", "peter", "ripple", "vadas"]));
    assert_eq!(names.len(), 6);
}

#[tokio::test]
async fn test_names_multiset() {
    let (_bridge, graph) = classic("classic-multiset");
    let names: Vec<String> = graph
        .v_async(noargs())
        .await
        .unwrap()
        .values_async(&["name"])
        .await
        .unwrap()
        .to_list_async_as()
        .await
        .unwrap();
    assert_eq!(sorted(names), vec!["josh", "lop", "marko", "peter", "ripple", "vadas"]);
}

#[test]
fn test_counts() {
    let (_bridge, graph) = classic("classic-counts");
    assert_eq!(graph.v(noargs()).unwrap().count().unwrap().next().unwrap(), Value::Int(6));
    assert_eq!(graph.e(noargs()).unwrap().count().unwrap().next().unwrap(), Value::Int(6));
}

// ============================================================================
// 2. Filters
// ============================================================================

#[test]
fn test_has_name_marko() {
    let (_bridge, graph) = classic("classic-has");
    let marko: Vertex = graph.v(noargs()).unwrap().has("name", "marko").unwrap().next_as().unwrap();
    assert_eq!(marko.id().unwrap(), Value::Int(1));
    assert_eq!(marko.label().unwrap(), "vertex");
    assert_eq!(marko.value("age").unwrap(), Value::Int(29));
}

#[test]
fn test_has_key_and_has_not() {
    let (_bridge, graph) = classic("classic-haskey");
    let with_age = graph.v(noargs()).unwrap().has_key("age").unwrap().count().unwrap().next().unwrap();
    let without_age = graph.v(noargs()).unwrap().has_not("age").unwrap().values(&["name"]).unwrap();
    assert_eq!(with_age, Value::Int(4));
    assert_eq!(sorted(without_age.to_list_as().unwrap()), vec!["lop", "ripple"]);
}

#[test]
fn test_vertices_by_id() {
    let (_bridge, graph) = classic("classic-ids");
    let names: Vec<String> = graph.v(vec![Value::Int(2), Value::Int(4)]).unwrap().values(&["name"]).unwrap().to_list_as().unwrap();
    assert_eq!(sorted(names), vec!["josh", "vadas"]);
    let by_token = graph.v(noargs()).unwrap().has(coerce::ID, 6).unwrap().values(&["name"]).unwrap();
    assert_eq!(by_token.to_list().unwrap(), vec![Value::from("peter")]);
}

// ============================================================================
// 3. Adjacency
// ============================================================================

#[test]
fn test_out_knows() {
    let (_bridge, graph) = classic("classic-knows");
    let names: Vec<String> = graph.v(1).unwrap().out(&["knows"]).unwrap().values(&["name"]).unwrap().to_list_as().unwrap();
    assert_eq!(sorted(names), vec!["josh", "vadas"]);
}

#[test]
fn test_in_created_from_lop() {
    let (_bridge, graph) = classic("classic-created");
    let creators: Vec<String> = graph.v(3).unwrap().in_(&["created"]).unwrap().values(&["name"]).unwrap().to_list_as().unwrap();
    assert_eq!(sorted(creators), vec!["josh", "marko", "peter"]);
}

#[test]
fn test_edge_endpoints() {
    let (_bridge, graph) = classic("classic-edge");
    let edge: tinkerpop_rs::Edge = graph.e(9).unwrap().next_as().unwrap();
    assert_eq!(edge.label().unwrap(), "created");
    assert_eq!(edge.value("weight").unwrap(), Value::Float(0.4));
    assert_eq!(edge.out_vertex().unwrap().value("name").unwrap(), Value::from("marko"));
    assert_eq!(edge.in_vertex().unwrap().value("name").unwrap(), Value::from("lop"));
}

#[test]
fn test_limit_and_fold() {
    let (_bridge, graph) = classic("classic-fold");
    let folded = graph.v(noargs()).unwrap().limit(2).unwrap().id().unwrap().fold().unwrap().next().unwrap();
    assert_eq!(folded.as_list().map(<[Value]>::len), Some(2));
}
