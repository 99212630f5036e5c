//! Vertices, edges and their properties.

use crate::model::Value;
use crate::remote::Args;
use crate::remote_methods;

use super::typed_handle;

typed_handle! {
    /// A vertex in a remote graph.
    Vertex
}

typed_handle! {
    /// An edge in a remote graph.
    Edge
}

typed_handle! {
    /// One value of a (possibly multi-valued) vertex property. Carries its
    /// own id and meta-properties.
    VertexProperty
}

typed_handle! {
    /// Plain key/value property of an edge, or a meta-property.
    Property
}

impl Vertex {
    remote_methods! {
        id / id_async => "id"() -> Value;
        label / label_async => "label"() -> String;
        /// The single value under `key`. Faults when the key is missing or
        /// holds several values.
        value / value_async => "value"(key: &str) -> Value;
        keys / keys_async => "keys"() -> Vec<String>;
        /// Every value under `keys`; all keys when empty.
        properties / properties_async => "properties"(keys: &[&str]) -> Vec<VertexProperty>;
        property / property_async => "property"(key: &str) -> Option<VertexProperty>;
        /// Replace all values under `key` with one value.
        set_property / set_property_async => "property"(key: &str, value: Value) -> VertexProperty;
        /// Append a value under `key`.
        add_property / add_property_async => "addProperty"(key: &str, value: Value) -> VertexProperty;
        remove / remove_async => "remove"() -> ();
    }

    /// Add an outgoing edge to `in_vertex`. `kvs` is a flat key/value list.
    pub fn add_edge(&self, label: &str, in_vertex: &Vertex, kvs: Args) -> crate::Result<Edge> {
        crate::dispatch::RemoteObject::call_as(self, "addEdge", edge_args(label, in_vertex, kvs))
    }

    pub fn add_edge_async(&self, label: &str, in_vertex: &Vertex, kvs: Args) -> crate::Deferred<Edge> {
        crate::dispatch::RemoteObject::call_async_as(self, "addEdge", edge_args(label, in_vertex, kvs))
    }
}

fn edge_args(label: &str, in_vertex: &Vertex, kvs: Args) -> Args {
    let mut args = crate::args![label, in_vertex];
    args.extend(kvs);
    args
}

impl Edge {
    remote_methods! {
        id / id_async => "id"() -> Value;
        label / label_async => "label"() -> String;
        value / value_async => "value"(key: &str) -> Value;
        keys / keys_async => "keys"() -> Vec<String>;
        properties / properties_async => "properties"(keys: &[&str]) -> Vec<Property>;
        property / property_async => "property"(key: &str) -> Option<Property>;
        set_property / set_property_async => "property"(key: &str, value: Value) -> Property;
        /// Head of the edge.
        in_vertex / in_vertex_async => "inVertex"() -> Vertex;
        /// Tail of the edge.
        out_vertex / out_vertex_async => "outVertex"() -> Vertex;
        remove / remove_async => "remove"() -> ();
    }
}

impl VertexProperty {
    remote_methods! {
        id / id_async => "id"() -> Value;
        key / key_async => "key"() -> String;
        value / value_async => "value"() -> Value;
        /// Meta-properties under `keys`; all when empty.
        properties / properties_async => "properties"(keys: &[&str]) -> Vec<Property>;
        set_property / set_property_async => "property"(key: &str, value: Value) -> Property;
        /// The vertex this value belongs to.
        element / element_async => "element"() -> Vertex;
        remove / remove_async => "remove"() -> ();
    }
}

impl Property {
    remote_methods! {
        /// Only edge properties have ids.
        id / id_async => "id"() -> Value;
        key / key_async => "key"() -> String;
        value / value_async => "value"() -> Value;
        element / element_async => "element"() -> super::Handle;
        remove / remove_async => "remove"() -> ();
    }
}
