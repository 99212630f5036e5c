//! Element serializer: vertex and edge handles to plain records.
//!
//! Every field is fetched with deferred calls; independent fetches for one
//! element run concurrently. Multi-valued properties stay an ordered list
//! per key, in the order the engine reports them.
//!
//! ```text
//! Vertex handle → id, label, properties() → per value: id, key, value, meta
//!   → VertexRecord { id, label, properties: { key: [ {id, value, properties} ] } }
//! ```

use std::io::Write;

use futures::try_join;
use tracing::debug;

use crate::coerce::noargs;
use crate::dispatch::RemoteObject;
use crate::handle::{Edge, Graph, Property, Vertex, VertexProperty};
use crate::model::{
    EdgeRecord, ElementRecord, PlainValue, PropertyRecord, PropertyTable, PropertyValues, Value, VertexRecord,
};
use crate::{Error, Result};

fn plain(element: &impl RemoteObject, key: &str, value: &Value) -> Result<PlainValue> {
    PlainValue::try_from(value).map_err(|e| Error::Serialization {
        element: element.object_ref().to_string(),
        key: key.to_owned(),
        reason: e.to_string(),
    })
}

/// Key and value of a plain property (edge property or meta-property).
async fn property_pair(property: &Property) -> Result<(String, Value)> {
    try_join!(property.key_async(), property.value_async())
}

async fn vertex_property_record(owner: &Vertex, vp: &VertexProperty) -> Result<(String, PropertyRecord)> {
    let (id, key, value, meta) = try_join!(vp.id_async(), vp.key_async(), vp.value_async(), vp.properties_async(&[]))?;
    let mut properties = PropertyTable::new();
    for p in &meta {
        let (meta_key, meta_value) = property_pair(p).await?;
        let converted = plain(owner, &format!("{key}.{meta_key}"), &meta_value)?;
        properties.insert(meta_key, converted);
    }
    let record = PropertyRecord { id: plain(owner, &key, &id)?, value: plain(owner, &key, &value)?, properties };
    Ok((key, record))
}

/// Serialize a vertex.
pub async fn vertex_to_record(vertex: &Vertex) -> Result<VertexRecord> {
    let (id, label, values) = try_join!(vertex.id_async(), vertex.label_async(), vertex.properties_async(&[]))?;
    let mut properties = PropertyValues::new();
    for vp in &values {
        let (key, record) = vertex_property_record(vertex, vp).await?;
        properties.entry_or_default(&key).push(record);
    }
    Ok(VertexRecord { id: plain(vertex, "id", &id)?, label, properties })
}

/// Serialize an edge, including both endpoints' ids and labels.
pub async fn edge_to_record(edge: &Edge) -> Result<EdgeRecord> {
    let (id, label, props, in_vertex, out_vertex) = try_join!(
        edge.id_async(),
        edge.label_async(),
        edge.properties_async(&[]),
        edge.in_vertex_async(),
        edge.out_vertex_async(),
    )?;
    let (in_v, in_v_label, out_v, out_v_label) = try_join!(
        in_vertex.id_async(),
        in_vertex.label_async(),
        out_vertex.id_async(),
        out_vertex.label_async(),
    )?;

    let mut properties = PropertyValues::new();
    for p in &props {
        let (key, value, pid) = try_join!(p.key_async(), p.value_async(), p.id_async())?;
        let record = PropertyRecord {
            id: plain(edge, &key, &pid)?,
            value: plain(edge, &key, &value)?,
            properties: PropertyTable::new(),
        };
        properties.entry_or_default(&key).push(record);
    }

    Ok(EdgeRecord {
        id: plain(edge, "id", &id)?,
        label,
        properties,
        in_v: plain(edge, "inV", &in_v)?,
        in_v_label,
        out_v: plain(edge, "outV", &out_v)?,
        out_v_label,
    })
}

pub fn vertex_to_record_blocking(vertex: &Vertex) -> Result<VertexRecord> {
    futures::executor::block_on(vertex_to_record(vertex))
}

pub fn edge_to_record_blocking(edge: &Edge) -> Result<EdgeRecord> {
    futures::executor::block_on(edge_to_record(edge))
}

/// Counts from [`export_graph_json`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub vertices: usize,
    pub edges: usize,
}

/// Write every vertex, then every edge, as one JSON record per line.
pub async fn export_graph_json<W: Write + Send>(graph: &Graph, mut writer: W) -> Result<ExportStats> {
    let mut stats = ExportStats::default();

    let vertices: Vec<Vertex> = crate::drain::collect(&graph.v_async(noargs()).await?).await?;
    for vertex in &vertices {
        let record = ElementRecord::from(vertex_to_record(vertex).await?);
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n")?;
        stats.vertices += 1;
    }

    let edges: Vec<Edge> = crate::drain::collect(&graph.e_async(noargs()).await?).await?;
    for edge in &edges {
        let record = ElementRecord::from(edge_to_record(edge).await?);
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n")?;
        stats.edges += 1;
    }

    writer.flush()?;
    debug!(vertices = stats.vertices, edges = stats.edges, "graph exported");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Handle;
    use crate::model::ObjectRef;
    use crate::remote::{Args, Callback, RemoteFault, RemoteRuntime, RuntimeRef};
    use std::sync::Arc;

    /// A vertex (1) whose only property value (2) holds a remote object.
    struct OpaqueValueRuntime;

    impl RemoteRuntime for OpaqueValueRuntime {
        fn invoke(&self, target: &ObjectRef, method: &str, _: Args, callback: Callback) {
            let outcome = match (target.id(), method) {
                (1, "id") => Ok(Value::Int(1)),
                (1, "label") => Ok(Value::from("vertex")),
                (1, "properties") => Ok(Value::List(vec![Value::Object(ObjectRef::new(2, "TinkerVertexProperty"))])),
                (2, "id") => Ok(Value::Int(10)),
                (2, "key") => Ok(Value::from("blob")),
                (2, "value") => Ok(Value::Object(ObjectRef::new(99, "Opaque"))),
                (2, "properties") => Ok(Value::List(Vec::new())),
                _ => Err(RemoteFault::invocation("NoSuchMethodException", method)),
            };
            callback(outcome);
        }
    }

    #[test]
    fn test_unconvertible_value_names_the_key() {
        let rt: RuntimeRef = Arc::new(OpaqueValueRuntime);
        let vertex = Vertex::from_handle(Handle::new(ObjectRef::new(1, "TinkerVertex"), rt));
        match vertex_to_record_blocking(&vertex) {
            Err(Error::Serialization { element, key, .. }) => {
                assert_eq!(element, "TinkerVertex@1");
                assert_eq!(key, "blob");
            }
            other => panic!("Expected serialization error, got {other:?}"),
        }
    }
}
