//! In-memory property graph storage behind the reference runtime.
//!
//! Elements live in slot vectors (a removed element leaves a `None` hole so
//! slot numbers stay stable for interned handles). Vertex properties are
//! multi-valued: each key maps to an ordered list of values, and every value
//! carries its own id and meta-properties.

use hashbrown::HashMap;
use indexmap::IndexMap;

use crate::model::Value;
use crate::remote::RemoteFault;

use super::FaultResult;

/// Key token that supplies an element id in a key/value list.
pub const ID_TOKEN: &str = "~id";
/// Key token that supplies an element label in a key/value list.
pub const LABEL_TOKEN: &str = "~label";

pub const DEFAULT_VERTEX_LABEL: &str = "vertex";

// ============================================================================
// Ids
// ============================================================================

/// Element and property id. Integral numbers and strings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementId {
    Int(i64),
    Str(String),
}

impl ElementId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(ElementId::Str(s.clone())),
            other => other.as_int().map(ElementId::Int),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ElementId::Int(i) => Value::Int(*i),
            ElementId::Str(s) => Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementId::Int(i) => write!(f, "{i}"),
            ElementId::Str(s) => write!(f, "{s}"),
        }
    }
}

// ============================================================================
// Stored elements
// ============================================================================

#[derive(Debug, Clone)]
pub struct VertexProperty {
    pub id: ElementId,
    pub key: String,
    pub value: Value,
    pub meta: Vec<(String, Value)>,
}

#[derive(Debug, Clone)]
pub struct EdgeProperty {
    pub id: ElementId,
    pub key: String,
    pub value: Value,
}

#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: ElementId,
    pub label: String,
    /// Grouped by key, keys in first-insertion order.
    pub properties: IndexMap<String, Vec<VertexProperty>>,
    pub out_edges: Vec<usize>,
    pub in_edges: Vec<usize>,
}

impl Vertex {
    pub fn property(&self, id: &ElementId) -> Option<&VertexProperty> {
        self.properties.values().flatten().find(|p| &p.id == id)
    }

    fn property_mut(&mut self, id: &ElementId) -> Option<&mut VertexProperty> {
        self.properties.values_mut().flatten().find(|p| &p.id == id)
    }

    /// Properties for `keys` (all keys when empty), grouped per key.
    pub fn select<'a>(&'a self, keys: &'a [String]) -> impl Iterator<Item = &'a VertexProperty> + 'a {
        self.properties
            .iter()
            .filter(move |(k, _)| keys.is_empty() || keys.contains(*k))
            .flat_map(|(_, props)| props)
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub id: ElementId,
    pub label: String,
    pub out_v: usize,
    pub in_v: usize,
    pub properties: Vec<EdgeProperty>,
}

impl Edge {
    pub fn property(&self, key: &str) -> Option<&EdgeProperty> {
        self.properties.iter().find(|p| p.key == key)
    }

    pub fn select<'a>(&'a self, keys: &'a [String]) -> impl Iterator<Item = &'a EdgeProperty> + 'a {
        self.properties
            .iter()
            .filter(move |p| keys.is_empty() || keys.contains(&p.key))
    }
}

/// Direction of an adjacency walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
    Both,
}

// ============================================================================
// TinkerGraph
// ============================================================================

/// One graph instance. Ids are drawn from a counter starting at 0.
#[derive(Debug, Default)]
pub struct TinkerGraph {
    vertices: Vec<Option<Vertex>>,
    edges: Vec<Option<Edge>>,
    vertex_index: HashMap<ElementId, usize>,
    edge_index: HashMap<ElementId, usize>,
    next_id: i64,
}

/// Split a flat `[k1, v1, k2, v2, ...]` list into pairs with string keys.
pub fn key_values(kvs: &[Value]) -> FaultResult<Vec<(String, Value)>> {
    if kvs.len() % 2 != 0 {
        return Err(RemoteFault::invocation(
            "IllegalArgumentException",
            "The provided key/value array length must be a multiple of two",
        ));
    }
    kvs.chunks(2)
        .map(|pair| match &pair[0] {
            Value::String(k) => Ok((k.clone(), pair[1].clone())),
            other => Err(RemoteFault::invocation(
                "IllegalArgumentException",
                format!("The provided key/value array must have a String key on even array indices: {other}"),
            )),
        })
        .collect()
}

fn check_value(key: &str, value: &Value) -> FaultResult<()> {
    if key.is_empty() {
        return Err(RemoteFault::invocation("IllegalArgumentException", "Property key can not be empty"));
    }
    if value.is_null() {
        return Err(RemoteFault::invocation(
            "IllegalArgumentException",
            format!("Property value can not be null: {key}"),
        ));
    }
    Ok(())
}

fn missing(what: &str, id: impl std::fmt::Display) -> RemoteFault {
    RemoteFault::invocation("IllegalStateException", format!("{what} with id {id} does not exist"))
}

impl TinkerGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    pub fn vertex(&self, slot: usize) -> FaultResult<&Vertex> {
        self.vertices
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or_else(|| missing("Vertex", slot))
    }

    pub fn edge(&self, slot: usize) -> FaultResult<&Edge> {
        self.edges
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or_else(|| missing("Edge", slot))
    }

    fn vertex_mut(&mut self, slot: usize) -> FaultResult<&mut Vertex> {
        self.vertices
            .get_mut(slot)
            .and_then(Option::as_mut)
            .ok_or_else(|| missing("Vertex", slot))
    }

    fn edge_mut(&mut self, slot: usize) -> FaultResult<&mut Edge> {
        self.edges
            .get_mut(slot)
            .and_then(Option::as_mut)
            .ok_or_else(|| missing("Edge", slot))
    }

    /// Live vertex slots in insertion order.
    pub fn vertex_slots(&self) -> Vec<usize> {
        live_slots(&self.vertices)
    }

    /// Live edge slots in insertion order.
    pub fn edge_slots(&self) -> Vec<usize> {
        live_slots(&self.edges)
    }

    pub fn find_vertex(&self, id: &ElementId) -> Option<usize> {
        self.vertex_index.get(id).copied()
    }

    pub fn find_edge(&self, id: &ElementId) -> Option<usize> {
        self.edge_index.get(id).copied()
    }

    fn next_property_id(&mut self) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        ElementId::Int(id)
    }

    fn next_element_id(&mut self, taken: impl Fn(&Self, &ElementId) -> bool) -> ElementId {
        loop {
            let id = self.next_property_id();
            if !taken(self, &id) {
                return id;
            }
        }
    }

    /// Pull `~id` and `~label` out of a key/value list.
    fn split_tokens(kvs: &[Value]) -> FaultResult<(Option<ElementId>, Option<String>, Vec<(String, Value)>)> {
        let mut id = None;
        let mut label = None;
        let mut rest = Vec::new();
        for (k, v) in key_values(kvs)? {
            match k.as_str() {
                ID_TOKEN => {
                    id = Some(ElementId::from_value(&v).ok_or_else(|| {
                        RemoteFault::invocation("IllegalArgumentException", format!("Unsupported id: {v}"))
                    })?);
                }
                LABEL_TOKEN => match v {
                    Value::String(s) if !s.is_empty() => label = Some(s),
                    other => {
                        return Err(RemoteFault::invocation(
                            "IllegalArgumentException",
                            format!("Label must be a non-empty string: {other}"),
                        ));
                    }
                },
                _ => rest.push((k, v)),
            }
        }
        Ok((id, label, rest))
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    pub fn add_vertex(&mut self, kvs: &[Value]) -> FaultResult<usize> {
        let (id, label, props) = Self::split_tokens(kvs)?;
        for (k, v) in &props {
            check_value(k, v)?;
        }
        let id = match id {
            Some(id) if self.vertex_index.contains_key(&id) => {
                return Err(RemoteFault::invocation(
                    "IllegalArgumentException",
                    format!("Vertex with id already exists: {id}"),
                ));
            }
            Some(id) => id,
            None => self.next_element_id(|g, id| g.vertex_index.contains_key(id)),
        };
        let slot = self.vertices.len();
        self.vertices.push(Some(Vertex {
            id: id.clone(),
            label: label.unwrap_or_else(|| DEFAULT_VERTEX_LABEL.to_owned()),
            properties: IndexMap::new(),
            out_edges: Vec::new(),
            in_edges: Vec::new(),
        }));
        self.vertex_index.insert(id, slot);
        for (k, v) in props {
            self.add_vertex_property(slot, &k, v, &[], false)?;
        }
        Ok(slot)
    }

    pub fn add_edge(&mut self, out_v: usize, label: &str, in_v: usize, kvs: &[Value]) -> FaultResult<usize> {
        self.vertex(out_v)?;
        self.vertex(in_v)?;
        if label.is_empty() {
            return Err(RemoteFault::invocation("IllegalArgumentException", "Edge label can not be empty"));
        }
        let (id, _, props) = Self::split_tokens(kvs)?;
        for (k, v) in &props {
            check_value(k, v)?;
        }
        let id = match id {
            Some(id) if self.edge_index.contains_key(&id) => {
                return Err(RemoteFault::invocation(
                    "IllegalArgumentException",
                    format!("Edge with id already exists: {id}"),
                ));
            }
            Some(id) => id,
            None => self.next_element_id(|g, id| g.edge_index.contains_key(id)),
        };
        let slot = self.edges.len();
        self.edges.push(Some(Edge {
            id: id.clone(),
            label: label.to_owned(),
            out_v,
            in_v,
            properties: Vec::new(),
        }));
        self.edge_index.insert(id, slot);
        self.vertex_mut(out_v)?.out_edges.push(slot);
        self.vertex_mut(in_v)?.in_edges.push(slot);
        for (k, v) in props {
            self.set_edge_property(slot, &k, v)?;
        }
        Ok(slot)
    }

    /// Add a value under `key`. With `single`, existing values of the key
    /// are replaced and the key keeps its position.
    pub fn add_vertex_property(
        &mut self,
        slot: usize,
        key: &str,
        value: Value,
        meta_kvs: &[Value],
        single: bool,
    ) -> FaultResult<ElementId> {
        check_value(key, &value)?;
        let (id, _, meta) = Self::split_tokens(meta_kvs)?;
        for (k, v) in &meta {
            check_value(k, v)?;
        }
        let id = match id {
            Some(id) => id,
            None => self.next_property_id(),
        };
        let property = VertexProperty { id: id.clone(), key: key.to_owned(), value, meta };
        let vertex = self.vertex_mut(slot)?;
        let values = vertex.properties.entry(key.to_owned()).or_default();
        if single {
            values.clear();
        }
        values.push(property);
        Ok(id)
    }

    pub fn set_edge_property(&mut self, slot: usize, key: &str, value: Value) -> FaultResult<ElementId> {
        check_value(key, &value)?;
        let fresh = self.next_property_id();
        let edge = self.edge_mut(slot)?;
        match edge.properties.iter_mut().find(|p| p.key == key) {
            Some(existing) => {
                existing.value = value;
                Ok(existing.id.clone())
            }
            None => {
                edge.properties.push(EdgeProperty { id: fresh.clone(), key: key.to_owned(), value });
                Ok(fresh)
            }
        }
    }

    pub fn set_meta_property(&mut self, slot: usize, id: &ElementId, key: &str, value: Value) -> FaultResult<()> {
        check_value(key, &value)?;
        let property = self
            .vertex_mut(slot)?
            .property_mut(id)
            .ok_or_else(|| missing("VertexProperty", id))?;
        match property.meta.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => property.meta.push((key.to_owned(), value)),
        }
        Ok(())
    }

    pub fn remove_vertex(&mut self, slot: usize) -> FaultResult<()> {
        let vertex = self.vertex(slot)?;
        let mut incident: Vec<usize> = vertex.out_edges.iter().chain(&vertex.in_edges).copied().collect();
        incident.sort_unstable();
        incident.dedup();
        for edge in incident {
            if self.edges.get(edge).is_some_and(Option::is_some) {
                self.remove_edge(edge)?;
            }
        }
        if let Some(vertex) = self.vertices[slot].take() {
            self.vertex_index.remove(&vertex.id);
        }
        Ok(())
    }

    pub fn remove_edge(&mut self, slot: usize) -> FaultResult<()> {
        let edge = self.edges.get_mut(slot).and_then(Option::take).ok_or_else(|| missing("Edge", slot))?;
        self.edge_index.remove(&edge.id);
        if let Ok(out) = self.vertex_mut(edge.out_v) {
            out.out_edges.retain(|e| *e != slot);
        }
        if let Ok(inv) = self.vertex_mut(edge.in_v) {
            inv.in_edges.retain(|e| *e != slot);
        }
        Ok(())
    }

    pub fn remove_vertex_property(&mut self, slot: usize, id: &ElementId) -> FaultResult<()> {
        let vertex = self.vertex_mut(slot)?;
        for values in vertex.properties.values_mut() {
            values.retain(|p| &p.id != id);
        }
        vertex.properties.retain(|_, values| !values.is_empty());
        Ok(())
    }

    pub fn remove_edge_property(&mut self, slot: usize, key: &str) -> FaultResult<()> {
        self.edge_mut(slot)?.properties.retain(|p| p.key != key);
        Ok(())
    }

    pub fn remove_meta_property(&mut self, slot: usize, id: &ElementId, key: &str) -> FaultResult<()> {
        if let Some(property) = self.vertex_mut(slot)?.property_mut(id) {
            property.meta.retain(|(k, _)| k != key);
        }
        Ok(())
    }

    // ========================================================================
    // Adjacency
    // ========================================================================

    /// Incident edges of a vertex, optionally restricted to `labels`.
    pub fn incident_edges(&self, slot: usize, direction: Direction, labels: &[String]) -> FaultResult<Vec<usize>> {
        let vertex = self.vertex(slot)?;
        let candidates: Vec<usize> = match direction {
            Direction::Out => vertex.out_edges.clone(),
            Direction::In => vertex.in_edges.clone(),
            Direction::Both => vertex.out_edges.iter().chain(&vertex.in_edges).copied().collect(),
        };
        let mut edges = Vec::with_capacity(candidates.len());
        for e in candidates {
            if labels.is_empty() || labels.contains(&self.edge(e)?.label) {
                edges.push(e);
            }
        }
        Ok(edges)
    }

    /// Adjacent vertices of a vertex across its incident edges.
    pub fn adjacent(&self, slot: usize, direction: Direction, labels: &[String]) -> FaultResult<Vec<usize>> {
        let mut out = Vec::new();
        if matches!(direction, Direction::Out | Direction::Both) {
            for e in self.incident_edges(slot, Direction::Out, labels)? {
                out.push(self.edge(e)?.in_v);
            }
        }
        if matches!(direction, Direction::In | Direction::Both) {
            for e in self.incident_edges(slot, Direction::In, labels)? {
                out.push(self.edge(e)?.out_v);
            }
        }
        Ok(out)
    }
}

fn live_slots<T>(slots: &[Option<T>]) -> Vec<usize> {
    slots
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.as_ref().map(|_| i))
        .collect()
}

// ============================================================================
// Reference graphs
// ============================================================================

/// The six-vertex "classic" toy graph. Every vertex is labelled `vertex`.
pub fn create_classic() -> FaultResult<TinkerGraph> {
    load_toy_graph(DEFAULT_VERTEX_LABEL, DEFAULT_VERTEX_LABEL)
}

/// The classic graph with `person` and `software` vertex labels.
pub fn create_modern() -> FaultResult<TinkerGraph> {
    load_toy_graph("person", "software")
}

fn load_toy_graph(person: &str, software: &str) -> FaultResult<TinkerGraph> {
    let mut g = TinkerGraph::new();
    let vertex = |g: &mut TinkerGraph, id: i64, label: &str, kvs: [(&str, Value); 2]| {
        let mut args = vec![ID_TOKEN.into(), Value::Int(id), LABEL_TOKEN.into(), label.into()];
        for (k, v) in kvs {
            args.push(k.into());
            args.push(v);
        }
        g.add_vertex(&args)
    };
    let marko = vertex(&mut g, 1, person, [("name", "marko".into()), ("age", 29.into())])?;
    let vadas = vertex(&mut g, 2, person, [("name", "vadas".into()), ("age", 27.into())])?;
    let lop = vertex(&mut g, 3, software, [("name", "lop".into()), ("lang", "java".into())])?;
    let josh = vertex(&mut g, 4, person, [("name", "josh".into()), ("age", 32.into())])?;
    let ripple = vertex(&mut g, 5, software, [("name", "ripple".into()), ("lang", "java".into())])?;
    let peter = vertex(&mut g, 6, person, [("name", "peter".into()), ("age", 35.into())])?;

    let edges = [
        (marko, "knows", vadas, 7, 0.5),
        (marko, "knows", josh, 8, 1.0),
        (marko, "created", lop, 9, 0.4),
        (josh, "created", ripple, 10, 1.0),
        (josh, "created", lop, 11, 0.4),
        (peter, "created", lop, 12, 0.2),
    ];
    for (out_v, label, in_v, id, weight) in edges {
        g.add_edge(out_v, label, in_v, &[ID_TOKEN.into(), Value::Int(id), "weight".into(), Value::Float(weight)])?;
    }
    Ok(g)
}
