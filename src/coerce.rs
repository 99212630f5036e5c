//! Argument and handle coercions the engine's calling convention needs.

use crate::handle::{Edge, Handle, Traversal, Vertex};
use crate::model::Value;
use crate::remote::Args;

/// Token key selecting an element's id in `has`, `addVertex` and friends.
pub const ID: &str = "~id";

/// Token key selecting an element's label.
pub const LABEL: &str = "~label";

/// A list of strings as one argument, for steps with a var-arg tail.
pub fn strings<S: AsRef<str>>(items: &[S]) -> Value {
    Value::List(items.iter().map(|s| Value::from(s.as_ref())).collect())
}

/// The explicit empty argument list for a var-arg parameter. `V()` and
/// `E()` need this to mean "all".
pub fn noargs() -> Value {
    Value::List(Vec::new())
}

/// Flatten key/value pairs into one argument list.
///
/// ```rust
/// use tinkerpop_rs::{coerce, Value};
/// let kvs = coerce::key_values([(coerce::LABEL, Value::from("person")), ("age", Value::Int(30))]);
/// assert_eq!(kvs.len(), 4);
/// assert_eq!(kvs[0], Value::from("~label"));
/// ```
pub fn key_values<K, I>(pairs: I) -> Args
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    let mut args = Args::new();
    for (key, value) in pairs {
        args.push(Value::String(key.into()));
        args.push(value);
    }
    args
}

// Reinterpretations. Nothing is checked here: a wrong guess surfaces as a
// remote fault on the first call that the object does not answer.

pub fn as_vertex(handle: Handle) -> Vertex {
    Vertex::from_handle(handle)
}

pub fn as_edge(handle: Handle) -> Edge {
    Edge::from_handle(handle)
}

pub fn as_traversal(handle: Handle) -> Traversal {
    Traversal::from_handle(handle)
}
