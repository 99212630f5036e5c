//! Draining traversals element by element.

use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tinkerpop_rs::coerce::noargs;
use tinkerpop_rs::{
    collect, drain, for_each, for_each_blocking, Bridge, BridgeConfig, CursorState, Edge, ElementHandler, Error,
    Graph, Result, Value, Vertex,
};

fn classic(name: &str) -> (Bridge, Graph) {
    let bridge = Bridge::start(BridgeConfig { runtime_name: name.into() }).unwrap();
    let graph = bridge.tinker_factory().create_classic().unwrap();
    (bridge, graph)
}

#[tokio::test]
async fn test_for_each_vertex_keys() {
    let (_bridge, graph) = classic("drain-vertices");
    let traversal = graph.v(noargs()).unwrap();
    let keys = Arc::new(Mutex::new(Vec::new()));

    let sink = keys.clone();
    let n = for_each(&traversal, move |v: Vertex| {
        let sink = sink.clone();
        async move {
            let mut k = v.keys_async().await?;
            k.sort();
            sink.lock().push(k);
            Ok::<(), Error>(())
        }
    })
    .await
    .unwrap();

    assert_eq!(n, 6);
    let keys = keys.lock();
    assert_eq!(keys.len(), 6);
    for k in keys.iter() {
        assert!(k == &["age", "name"] || k == &["lang", "name"], "unexpected keys {k:?}");
    }
    assert_eq!(traversal.state(), CursorState::Exhausted);
}

#[tokio::test]
async fn test_for_each_edge_keys() {
    let (_bridge, graph) = classic("drain-edges");
    let edges: Vec<Edge> = collect(&graph.e(noargs()).unwrap()).await.unwrap();
    assert_eq!(edges.len(), 6);
    for edge in &edges {
        assert_eq!(edge.keys_async().await.unwrap(), vec!["weight"]);
    }
}

#[test]
fn test_second_drain_is_misuse() {
    let (_bridge, graph) = classic("drain-twice");
    let traversal = graph.v(noargs()).unwrap().values(&["name"]).unwrap();
    assert_eq!(for_each_blocking(&traversal, |_: Value| Ok(())).unwrap(), 6);

    let err = for_each_blocking(&traversal, |_: Value| Ok(())).unwrap_err();
    assert!(matches!(err, Error::IteratorExhaustedMisuse(_)));
    // Step methods refuse too.
    assert!(matches!(traversal.count(), Err(Error::IteratorExhaustedMisuse(_))));
}

#[tokio::test]
async fn test_joined_drains_deliver_each_name_once() {
    let (_bridge, graph) = classic("drain-join");
    let traversal = graph.v(noargs()).unwrap().values(&["name"]).unwrap();
    let (a, b) = futures::join!(collect::<String>(&traversal), collect::<String>(&traversal));
    let (won, lost) = if a.is_ok() { (a, b) } else { (b, a) };
    let mut names = won.unwrap();
    names.sort();
    assert_eq!(names, vec!["josh", "lop", "marko", "peter", "ripple", "vadas"]);
    assert!(matches!(lost, Err(Error::IteratorExhaustedMisuse(_))));
    assert_eq!(traversal.state(), CursorState::Exhausted);
}

#[tokio::test]
async fn test_dropped_to_list_still_exhausts() {
    let (_bridge, graph) = classic("drain-dropped-to-list");
    let traversal = graph.v(noargs()).unwrap();
    drop(traversal.to_list_async());
    assert_eq!(traversal.state(), CursorState::Exhausted);
    let err = collect::<Vertex>(&traversal).await.unwrap_err();
    assert!(matches!(err, Error::IteratorExhaustedMisuse(_)));
}

#[test]
fn test_first_handler_error_aborts() {
    let (_bridge, graph) = classic("drain-abort");
    let traversal = graph.v(noargs()).unwrap().id().unwrap();
    let mut seen = 0;
    let err = for_each_blocking(&traversal, |_: Value| {
        seen += 1;
        if seen == 2 { Err(Error::Config("handler gave up".into())) } else { Ok(()) }
    })
    .unwrap_err();
    assert!(matches!(err, Error::Config(ref m) if m == "handler gave up"));
    assert_eq!(seen, 2);
    assert!(traversal.is_exhausted());
}

#[test]
fn test_conversion_error_aborts() {
    let (_bridge, graph) = classic("drain-conversion");
    // Software vertices have no age; `values` skips them.
    let traversal = graph.v(noargs()).unwrap().values(&["age"]).unwrap();
    let ages = for_each_blocking(&traversal, |v: i64| {
        assert!(v > 0);
        Ok(())
    });
    assert_eq!(ages.unwrap(), 4);

    let mismatched = graph.v(noargs()).unwrap().values(&["name"]).unwrap();
    let err = for_each_blocking(&mismatched, |_: i64| Ok(())).unwrap_err();
    assert!(matches!(err, Error::TypeError { .. }));
    assert!(mismatched.is_exhausted());
}

/// Records the order in which elements arrive and checks none overlap.
struct Sequential {
    busy: bool,
    order: Vec<i64>,
}

#[async_trait::async_trait]
impl ElementHandler<i64> for Sequential {
    async fn handle(&mut self, id: i64) -> Result<()> {
        assert!(!self.busy, "handler re-entered");
        self.busy = true;
        tokio::task::yield_now().await;
        self.order.push(id);
        self.busy = false;
        Ok(())
    }
}

#[tokio::test]
async fn test_delivery_is_sequential() {
    let (_bridge, graph) = classic("drain-sequential");
    let traversal = graph.v(vec![1, 2, 3, 4, 5, 6]).unwrap().id().unwrap();
    let mut handler = Sequential { busy: false, order: Vec::new() };
    assert_eq!(drain(&traversal, &mut handler).await.unwrap(), 6);

    let mut sorted = handler.order.clone();
    sorted.sort();
    assert_eq!(sorted, vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn test_engine_fault_aborts() {
    let (bridge, graph) = classic("drain-engine-fault");
    let faulty = bridge.closures().caller_expression("a.get().value('lang') == 'java'").unwrap();
    let traversal = graph.v(noargs()).unwrap().filter(&faulty).unwrap();
    let mut delivered = 0;
    let err = for_each(&traversal, |_: Vertex| {
        delivered += 1;
        std::future::ready(Ok(()))
    })
    .await
    .unwrap_err();
    assert!(matches!(err, Error::RemoteInvocation { .. }), "got {err:?}");
    assert_eq!(delivered, 0);
    assert!(traversal.is_exhausted());
}
