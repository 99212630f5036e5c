//! Element records: plain, serializable snapshots of vertices and edges.
//!
//! A record carries no reference back to the remote element it was built
//! from. Property order is the order the engine reported, so records use
//! [`PropertyTable`] (an insertion-ordered map) rather than a hash map.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::{Error, Result};

// ============================================================================
// PlainValue
// ============================================================================

/// A value with every remote reference stripped out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlainValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<PlainValue>),
    Map(PropertyTable<PlainValue>),
}

impl PlainValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlainValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PlainValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl TryFrom<&Value> for PlainValue {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        Ok(match value {
            Value::Null => PlainValue::Null,
            Value::Bool(b) => PlainValue::Bool(*b),
            Value::Int(i) => PlainValue::Int(*i),
            Value::Float(f) => PlainValue::Float(*f),
            Value::String(s) => PlainValue::String(s.clone()),
            Value::List(items) => PlainValue::List(
                items.iter().map(PlainValue::try_from).collect::<Result<_>>()?,
            ),
            Value::Map(map) => {
                // HashMap order is arbitrary; sort so records stay deterministic
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut table = PropertyTable::new();
                for key in keys {
                    table.insert(key.clone(), PlainValue::try_from(&map[key])?);
                }
                PlainValue::Map(table)
            }
            Value::Object(obj) => {
                return Err(Error::TypeError {
                    expected: "plain value".into(),
                    got: format!("remote object {obj}"),
                });
            }
        })
    }
}

impl From<&str> for PlainValue {
    fn from(v: &str) -> Self { PlainValue::String(v.to_owned()) }
}
impl From<i64> for PlainValue {
    fn from(v: i64) -> Self { PlainValue::Int(v) }
}
impl From<f64> for PlainValue {
    fn from(v: f64) -> Self { PlainValue::Float(v) }
}

impl fmt::Display for PlainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

// ============================================================================
// PropertyTable
// ============================================================================

/// Insertion-ordered string-keyed map. Serializes as a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyTable<V>(IndexMap<String, V>);

impl<V> Default for PropertyTable<V> {
    fn default() -> Self {
        Self(IndexMap::new())
    }
}

impl<V> PropertyTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.0.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.0.insert(key.into(), value)
    }

    /// Slot for `key`, appended with `V::default()` when missing.
    pub fn entry_or_default(&mut self, key: &str) -> &mut V
    where
        V: Default,
    {
        self.0.entry(key.to_owned()).or_default()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for PropertyTable<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// ============================================================================
// Records
// ============================================================================

/// One stored value of a property key, with its own id and meta-properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: PlainValue,
    pub value: PlainValue,
    pub properties: PropertyTable<PlainValue>,
}

/// Property key to every value stored under it, in engine order.
pub type PropertyValues = PropertyTable<Vec<PropertyRecord>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub id: PlainValue,
    pub label: String,
    pub properties: PropertyValues,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub id: PlainValue,
    pub label: String,
    pub properties: PropertyValues,
    #[serde(rename = "inV")]
    pub in_v: PlainValue,
    #[serde(rename = "inVLabel")]
    pub in_v_label: String,
    #[serde(rename = "outV")]
    pub out_v: PlainValue,
    #[serde(rename = "outVLabel")]
    pub out_v_label: String,
}

/// Serialized vertex or edge, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementRecord {
    Vertex(VertexRecord),
    Edge(EdgeRecord),
}

impl ElementRecord {
    pub fn id(&self) -> &PlainValue {
        match self {
            ElementRecord::Vertex(v) => &v.id,
            ElementRecord::Edge(e) => &e.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ElementRecord::Vertex(v) => &v.label,
            ElementRecord::Edge(e) => &e.label,
        }
    }

    pub fn properties(&self) -> &PropertyValues {
        match self {
            ElementRecord::Vertex(v) => &v.properties,
            ElementRecord::Edge(e) => &e.properties,
        }
    }

    /// `"vertex"` or `"edge"`, the value of the serialized `type` field.
    pub fn element_type(&self) -> &'static str {
        match self {
            ElementRecord::Vertex(_) => "vertex",
            ElementRecord::Edge(_) => "edge",
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl From<VertexRecord> for ElementRecord {
    fn from(v: VertexRecord) -> Self { ElementRecord::Vertex(v) }
}

impl From<EdgeRecord> for ElementRecord {
    fn from(e: EdgeRecord) -> Self { ElementRecord::Edge(e) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn lop() -> ElementRecord {
        let mut properties = PropertyValues::new();
        properties.insert("name", vec![PropertyRecord {
            id: PlainValue::Int(4),
            value: "lop".into(),
            properties: PropertyTable::new(),
        }]);
        properties.insert("lang", vec![PropertyRecord {
            id: PlainValue::Int(5),
            value: "java".into(),
            properties: PropertyTable::new(),
        }]);
        VertexRecord { id: PlainValue::Int(3), label: "vertex".into(), properties }.into()
    }

    #[test]
    fn test_vertex_record_json_shape() {
        assert_eq!(
            lop().to_json().unwrap(),
            json!({
                "id": 3,
                "label": "vertex",
                "type": "vertex",
                "properties": {
                    "name": [{"id": 4, "value": "lop", "properties": {}}],
                    "lang": [{"id": 5, "value": "java", "properties": {}}]
                }
            })
        );
    }

    #[test]
    fn test_edge_record_field_names() {
        let edge = ElementRecord::Edge(EdgeRecord {
            id: PlainValue::Int(7),
            label: "knows".into(),
            properties: PropertyValues::new(),
            in_v: PlainValue::Int(2),
            in_v_label: "vertex".into(),
            out_v: PlainValue::Int(1),
            out_v_label: "vertex".into(),
        });
        let json = edge.to_json().unwrap();
        for key in ["id", "label", "type", "properties", "inV", "outV", "inVLabel", "outVLabel"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["type"], "edge");
    }

    #[test]
    fn test_record_deserializes_back() {
        let text = serde_json::to_string(&lop()).unwrap();
        let back: ElementRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, lop());
    }

    #[test]
    fn test_object_value_is_not_plain() {
        let v = Value::Object(crate::ObjectRef::new(9, "TinkerVertex"));
        assert!(PlainValue::try_from(&v).is_err());
        let nested = Value::List(vec![Value::Int(1), v]);
        assert!(PlainValue::try_from(&nested).is_err());
    }

    #[test]
    fn test_map_value_sorted() {
        let mut map = std::collections::HashMap::new();
        map.insert("b".to_string(), Value::Int(2));
        map.insert("a".to_string(), Value::Int(1));
        let plain = PlainValue::try_from(&Value::Map(map)).unwrap();
        assert_eq!(plain.to_string(), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_insert_keeps_position() {
        let mut t = PropertyTable::new();
        t.insert("x", 1);
        t.insert("y", 2);
        assert_eq!(t.insert("x", 3), Some(1));
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        *t.entry_or_default("z") += 5;
        assert_eq!(t.get("z"), Some(&5));
    }

    #[test]
    fn test_table_reads_json_in_document_order() {
        let text = r#"{"zeta":1,"alpha":[true],"mid":{"b":null,"a":"x"}}"#;
        let t: PropertyTable<PlainValue> = serde_json::from_str(text).unwrap();
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(t.get("zeta"), Some(&PlainValue::Int(1)));
        assert!(t.contains_key("mid") && !t.contains_key("b"));
        assert_eq!(serde_json::to_string(&t).unwrap(), text);
    }

    proptest! {
        #[test]
        fn table_serializes_in_insertion_order(keys in proptest::collection::vec("[a-z]{1,6}", 0..12)) {
            let mut expected: Vec<String> = Vec::new();
            let mut table = PropertyTable::new();
            for k in &keys {
                if !expected.contains(k) {
                    expected.push(k.clone());
                }
                table.insert(k.clone(), PlainValue::Null);
            }
            let text = serde_json::to_string(&table).unwrap();
            let back: PropertyTable<PlainValue> = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(back.keys().map(str::to_owned).collect::<Vec<_>>(), expected);
        }
    }
}
