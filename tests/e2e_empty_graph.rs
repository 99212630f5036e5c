//! End-to-end tests against a freshly opened, empty graph.

use pretty_assertions::assert_eq;
use tinkerpop_rs::coerce::{self, noargs};
use tinkerpop_rs::{Bridge, BridgeConfig, Error, Value};

fn bridge(name: &str) -> Bridge {
    Bridge::start(BridgeConfig { runtime_name: name.into() }).unwrap()
}

#[tokio::test]
async fn test_empty_graph_counts_zero() {
    let bridge = bridge("empty-counts");
    let graph = bridge.tinker_graph().open_async().await.unwrap();

    let vertices = graph.v_async(noargs()).await.unwrap().count_async().await.unwrap();
    assert_eq!(vertices.next_async().await.unwrap(), Value::Int(0));

    let edges = graph.e(noargs()).unwrap().count().unwrap();
    assert_eq!(edges.next().unwrap(), Value::Int(0));
}

#[test]
fn test_empty_graph_has_no_next() {
    let bridge = bridge("empty-next");
    let graph = bridge.tinker_graph().open().unwrap();
    let all = graph.v(noargs()).unwrap();
    assert!(!all.has_next().unwrap());
    match all.next() {
        Err(Error::RemoteInvocation { method, fault, .. }) => {
            assert_eq!(method, "next");
            assert_eq!(fault.class, "NoSuchElementException");
        }
        other => panic!("Expected NoSuchElementException, got {other:?}"),
    }
}

#[test]
fn test_empty_graph_to_list_is_empty() {
    let bridge = bridge("empty-list");
    let graph = bridge.tinker_graph().open().unwrap();
    assert_eq!(graph.v(noargs()).unwrap().values(&["name"]).unwrap().to_list().unwrap(), Vec::<Value>::new());
    assert_eq!(graph.e(noargs()).unwrap().to_list().unwrap(), Vec::<Value>::new());
}

#[test]
fn test_open_graphs_are_independent() {
    let bridge = bridge("empty-independent");
    let first = bridge.tinker_graph().open().unwrap();
    let second = bridge.tinker_graph().open().unwrap();
    assert_ne!(first, second);

    first.add_vertex(coerce::key_values([("name", Value::from("solo"))])).unwrap();
    let count = |g: &tinkerpop_rs::Graph| g.v(noargs()).unwrap().count().unwrap().next().unwrap();
    assert_eq!(count(&first), Value::Int(1));
    assert_eq!(count(&second), Value::Int(0));
}

#[test]
fn test_closed_graph_faults() {
    let bridge = bridge("empty-closed");
    let graph = bridge.tinker_graph().open().unwrap();
    let keep = graph.clone();
    graph.close().unwrap();
    assert!(matches!(keep.v(noargs()), Err(Error::RemoteInvocation { .. })));
}
