//! Element serializer: handles to plain records and JSON lines.

use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tinkerpop_rs::coerce::{self, noargs};
use tinkerpop_rs::export::{edge_to_record_blocking, vertex_to_record_blocking};
use tinkerpop_rs::{
    args, edge_to_record, export_graph_json, vertex_to_record, Bridge, BridgeConfig, Edge, ElementRecord, ExportStats,
    Graph, PlainValue, Value, Vertex,
};

fn bridge(name: &str) -> Bridge {
    Bridge::start(BridgeConfig { runtime_name: name.into() }).unwrap()
}

fn classic(bridge: &Bridge) -> Graph {
    bridge.tinker_factory().create_classic().unwrap()
}

#[tokio::test]
async fn test_vertex_record() {
    let bridge = bridge("serialize-vertex");
    let graph = classic(&bridge);
    let marko: Vertex = graph.v(1).unwrap().next_as().unwrap();

    let record = vertex_to_record(&marko).await.unwrap();
    assert_eq!(record.id, PlainValue::Int(1));
    assert_eq!(record.label, "vertex");
    let keys: Vec<&str> = record.properties.keys().collect();
    assert_eq!(keys, vec!["name", "age"]);
    assert_eq!(record.properties.get("age").unwrap()[0].value, PlainValue::Int(29));

    // Both conventions produce the same record.
    assert_eq!(vertex_to_record_blocking(&marko).unwrap(), record);
}

#[tokio::test]
async fn test_edge_record() {
    let bridge = bridge("serialize-edge");
    let graph = classic(&bridge);
    let edge: Edge = graph.e(7).unwrap().next_as().unwrap();

    let record = edge_to_record(&edge).await.unwrap();
    assert_eq!(record.id, PlainValue::Int(7));
    assert_eq!(record.label, "knows");
    assert_eq!((record.out_v.clone(), record.out_v_label.as_str()), (PlainValue::Int(1), "vertex"));
    assert_eq!((record.in_v.clone(), record.in_v_label.as_str()), (PlainValue::Int(2), "vertex"));
    let weight = &record.properties.get("weight").unwrap()[0];
    assert_eq!(weight.value, PlainValue::Float(0.5));
    assert!(weight.properties.is_empty());

    let json = serde_json::to_value(ElementRecord::from(record)).unwrap();
    assert_eq!(json["type"], "edge");
    assert_eq!(json["inVLabel"], "vertex");
    assert_eq!(edge_to_record_blocking(&edge).unwrap().label, "knows");
}

#[test]
fn test_multi_and_meta_properties() {
    let bridge = bridge("serialize-meta");
    let graph = bridge.tinker_graph().open().unwrap();
    let v = graph.add_vertex(coerce::key_values([(coerce::LABEL, Value::from("person"))])).unwrap();
    v.add_property("nick", Value::from("ace")).unwrap();
    let second = v.add_property("nick", Value::from("duke")).unwrap();
    second.set_property("since", Value::Int(2001)).unwrap();

    let record = vertex_to_record_blocking(&v).unwrap();
    assert_eq!(record.label, "person");
    let nicks = record.properties.get("nick").unwrap();
    let values: Vec<&PlainValue> = nicks.iter().map(|p| &p.value).collect();
    assert_eq!(values, vec![&PlainValue::String("ace".into()), &PlainValue::String("duke".into())]);
    assert!(nicks[0].properties.is_empty());
    assert_eq!(nicks[1].properties.get("since"), Some(&PlainValue::Int(2001)));
    assert_ne!(nicks[0].id, nicks[1].id);
}

#[test]
fn test_record_json_round_trip() {
    let bridge = bridge("serialize-json");
    let graph = classic(&bridge);
    let lop: Vertex = graph.v(3).unwrap().next_as().unwrap();
    let record = ElementRecord::from(vertex_to_record_blocking(&lop).unwrap());

    let text = serde_json::to_string(&record).unwrap();
    let back: ElementRecord = serde_json::from_str(&text).unwrap();
    assert_eq!(back, record);
}

#[tokio::test]
async fn test_export_graph_json() {
    let bridge = bridge("serialize-export");
    let graph = classic(&bridge);
    let mut out = Vec::new();
    let stats = export_graph_json(&graph, &mut out).await.unwrap();
    assert_eq!(stats, ExportStats { vertices: 6, edges: 6 });

    let text = String::from_utf8(out).unwrap();
    let records: Vec<ElementRecord> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(records.len(), 12);
    assert!(records[..6].iter().all(|r| matches!(r, ElementRecord::Vertex(_))));
    assert!(records[6..].iter().all(|r| matches!(r, ElementRecord::Edge(_))));
}

#[test]
fn test_added_edge_record() {
    let bridge = bridge("serialize-added-edge");
    let graph = bridge.tinker_graph().open().unwrap();
    let a = graph.add_vertex(args![coerce::ID, 10, coerce::LABEL, "city"]).unwrap();
    let b = graph.add_vertex(args![coerce::ID, 20, coerce::LABEL, "city"]).unwrap();
    let road = a.add_edge("road", &b, args!["km", 42]).unwrap();
    let record = edge_to_record_blocking(&road).unwrap();
    assert_eq!(record.out_v, PlainValue::Int(10));
    assert_eq!(record.in_v, PlainValue::Int(20));
    assert_eq!(record.properties.get("km").unwrap()[0].value, PlainValue::Int(42));
}

#[tokio::test]
async fn test_drained_edges_carry_every_field() {
    let bridge = bridge("serialize-drain-edges");
    let graph = classic(&bridge);
    let traversal = graph.e_async(noargs()).await.unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    tinkerpop_rs::for_each(&traversal, move |edge: Edge| {
        let sink = sink.clone();
        async move {
            let record = edge_to_record(&edge).await?;
            sink.lock().push(ElementRecord::from(record));
            Ok::<(), tinkerpop_rs::Error>(())
        }
    })
    .await
    .unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 6);
    for record in seen.iter() {
        let json = serde_json::to_value(record).unwrap();
        for field in ["id", "label", "type", "properties", "inV", "outV", "inVLabel", "outVLabel"] {
            assert!(json.get(field).is_some(), "missing {field} in {json}");
        }
        assert_eq!(json["type"], "edge");
    }
}
