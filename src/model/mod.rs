//! # Bridge Data Model
//!
//! Values that cross the runtime boundary and the plain records the
//! serializer produces from remote elements.
//!
//! Design rule: this module is pure data. No I/O, no runtime handles, no async.

pub mod value;
pub mod record;

pub use value::{ObjectRef, Value};
pub use record::{
    EdgeRecord, ElementRecord, PlainValue, PropertyRecord, PropertyTable,
    PropertyValues, VertexRecord,
};
