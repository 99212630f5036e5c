//! Universal value type crossing the runtime boundary.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Opaque reference to an object owned by the remote runtime.
///
/// The bridge never looks inside. Equality is reference identity: two refs
/// are equal exactly when the runtime handed out the same object id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRef {
    id: u64,
    class: String,
}

impl ObjectRef {
    /// Object id of the runtime root.
    pub const RUNTIME_ID: u64 = 0;

    pub fn new(id: u64, class: impl Into<String>) -> Self {
        Self { id, class: class.into() }
    }

    /// The runtime root object, the entry point for `importClass`.
    pub fn runtime() -> Self {
        Self::new(Self::RUNTIME_ID, "Runtime")
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Class name reported by the runtime. Informational only.
    pub fn class(&self) -> &str {
        &self.class
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.class, self.id)
    }
}

/// A value produced or consumed by a remote call.
///
/// Primitives and containers travel by value; everything else travels as
/// an [`ObjectRef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    Object(ObjectRef),
}

// ============================================================================
// Type checking
// ============================================================================

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::String(_) => "STRING",
            Value::List(_) => "LIST",
            Value::Map(_) => "MAP",
            Value::Object(_) => "OBJECT",
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }
    pub fn is_numeric(&self) -> bool { matches!(self, Value::Int(_) | Value::Float(_)) }
    pub fn is_string(&self) -> bool { matches!(self, Value::String(_)) }
    pub fn is_object(&self) -> bool { matches!(self, Value::Object(_)) }

    /// Attempt to extract as i64
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Attempt to extract as f64
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempt to extract as &str
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Truthiness shared by filter predicates: null, false, zero, the empty
    /// string and the empty list are false. Everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Equality with numeric widening: `Int(5)` equals `Float(5.0)`.
    ///
    /// This is how option keys and `has(key, value)` predicates match.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            _ => self == other,
        }
    }

    /// Hash agreeing with [`loose_eq`](Self::loose_eq): loosely equal values
    /// hash alike. Numbers hash by their `f64` value; maps by size only.
    pub fn loose_hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Null => state.write_u8(0),
            Value::Bool(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            Value::Int(i) => hash_number(*i as f64, state),
            Value::Float(f) => hash_number(*f, state),
            Value::String(s) => {
                state.write_u8(3);
                s.hash(state);
            }
            Value::List(items) => {
                state.write_u8(4);
                state.write_usize(items.len());
                for item in items {
                    item.loose_hash(state);
                }
            }
            Value::Map(map) => {
                state.write_u8(5);
                state.write_usize(map.len());
            }
            Value::Object(obj) => {
                state.write_u8(6);
                obj.hash(state);
            }
        }
    }
}

fn hash_number<H: Hasher>(n: f64, state: &mut H) {
    state.write_u8(2);
    // -0.0 == 0.0
    let n = if n == 0.0 { 0.0 } else { n };
    state.write_u64(n.to_bits());
}

// ============================================================================
// Conversions (From impls)
// ============================================================================

impl From<bool> for Value { fn from(v: bool) -> Self { Value::Bool(v) } }
impl From<i32> for Value { fn from(v: i32) -> Self { Value::Int(v as i64) } }
impl From<i64> for Value { fn from(v: i64) -> Self { Value::Int(v) } }
impl From<usize> for Value { fn from(v: usize) -> Self { Value::Int(v as i64) } }
impl From<f64> for Value { fn from(v: f64) -> Self { Value::Float(v) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::String(v) } }
impl From<&str> for Value { fn from(v: &str) -> Self { Value::String(v.to_owned()) } }
impl From<ObjectRef> for Value { fn from(v: ObjectRef) -> Self { Value::Object(v) } }
impl From<&ObjectRef> for Value { fn from(v: &ObjectRef) -> Self { Value::Object(v.clone()) } }
impl From<&[&str]> for Value {
    fn from(v: &[&str]) -> Self { Value::List(v.iter().map(|s| Value::from(*s)).collect()) }
}
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self { Value::List(v.into_iter().map(Into::into).collect()) }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(Value::Null) }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "{s}"),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                let mut keys: Vec<&String> = m.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, k) in keys.into_iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{k}={}", m[k])?;
                }
                write!(f, "}}")
            }
            Value::Object(o) => write!(f, "{o}"),
        }
    }
}

// ============================================================================
// Comparison
// ============================================================================

impl Value {
    /// Ordering between comparable values. Returns None for incompatible types.
    pub fn compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loose_hash_of(value: &Value) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        value.loose_hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_loose_hash_agrees_with_loose_eq() {
        let pairs = [
            (Value::Int(5), Value::Float(5.0)),
            (Value::Float(-0.0), Value::Int(0)),
            (Value::List(vec![Value::Int(1), Value::from("a")]), Value::List(vec![Value::Float(1.0), Value::from("a")])),
            (Value::Object(ObjectRef::new(7, "TinkerVertex")), Value::Object(ObjectRef::new(7, "Vertex"))),
        ];
        for (a, b) in &pairs {
            assert!(a.loose_eq(b), "{a} vs {b}");
            assert_eq!(loose_hash_of(a), loose_hash_of(b), "{a} vs {b}");
        }
        assert_ne!(loose_hash_of(&Value::Int(1)), loose_hash_of(&Value::from("1")));
    }

    #[test]
    fn test_value_from() {
        assert_eq!(Value::from("hello"), Value::String("hello".into()));
        assert_eq!(Value::from(42), Value::Int(42));
        assert_eq!(Value::from(3.5), Value::Float(3.5));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_string_slice_becomes_list() {
        let keys: &[&str] = &["name", "age"];
        assert_eq!(Value::from(keys), Value::List(vec!["name".into(), "age".into()]));
    }

    #[test]
    fn test_object_identity() {
        let a = ObjectRef::new(7, "TinkerVertex");
        let b = ObjectRef::new(7, "Object");
        let c = ObjectRef::new(8, "TinkerVertex");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "TinkerVertex@7");
    }

    #[test]
    fn test_null_comparison() {
        assert_eq!(Value::Null.compare(&Value::Null), None);
        assert_eq!(Value::Null.compare(&Value::Int(1)), None);
    }

    #[test]
    fn test_numeric_comparison() {
        assert_eq!(
            Value::Int(1).compare(&Value::Float(1.5)),
            Some(std::cmp::Ordering::Less)
        );
    }

    #[test]
    fn test_loose_eq_widens_numbers() {
        assert!(Value::Int(5).loose_eq(&Value::Float(5.0)));
        assert!(!Value::Int(5).loose_eq(&Value::String("5".into())));
        assert!(Value::List(vec![Value::Int(1)]).loose_eq(&Value::List(vec![Value::Float(1.0)])));
    }
}
