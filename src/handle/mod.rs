//! Handles to objects owned by the remote runtime.
//!
//! A [`Handle`] is an [`ObjectRef`] plus the runtime that owns it. It holds
//! no remote state and never looks inside the object: equality is the
//! runtime's reference identity. Typed wrappers add the methods a vertex,
//! edge, graph or traversal is known to have, each in a blocking and a
//! deferred form.

pub mod classes;
pub mod element;
pub mod graph;
pub mod traversal;

use std::fmt;

use crate::dispatch::{FromValue, RemoteObject};
use crate::model::{ObjectRef, Value};
use crate::remote::RuntimeRef;
use crate::{Error, Result};

pub use classes::{AnonymousClass, LambdaClass, TinkerFactoryClass, TinkerGraphClass};
pub use element::{Edge, Property, Vertex, VertexProperty};
pub use graph::Graph;
pub use traversal::{CursorState, Traversal};

/// Untyped reference to a remote object.
#[derive(Clone)]
pub struct Handle {
    object: ObjectRef,
    runtime: RuntimeRef,
}

impl Handle {
    pub fn new(object: ObjectRef, runtime: RuntimeRef) -> Self {
        Self { object, runtime }
    }

    /// The runtime's root object, which resolves exported classes.
    pub fn root(runtime: RuntimeRef) -> Self {
        Self::new(ObjectRef::runtime(), runtime)
    }
}

impl RemoteObject for Handle {
    fn object_ref(&self) -> &ObjectRef {
        &self.object
    }

    fn runtime(&self) -> &RuntimeRef {
        &self.runtime
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.object == other.object
    }
}

impl Eq for Handle {}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}@{})", self.object, self.runtime.name())
    }
}

impl FromValue for Handle {
    fn from_value(value: Value, runtime: &RuntimeRef) -> Result<Self> {
        match value {
            Value::Object(object) => Ok(Handle::new(object, runtime.clone())),
            other => Err(Error::TypeError { expected: "remote object".into(), got: other.type_name().into() }),
        }
    }
}

impl From<&Handle> for Value {
    fn from(handle: &Handle) -> Self {
        Value::Object(handle.object.clone())
    }
}

/// Declare a typed wrapper around [`Handle`]. The wrapper is a plain
/// newtype: converting from an untyped handle checks nothing.
macro_rules! typed_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name($crate::handle::Handle);

        impl $name {
            pub fn from_handle(handle: $crate::handle::Handle) -> Self {
                Self(handle)
            }

            pub fn handle(&self) -> &$crate::handle::Handle {
                &self.0
            }

            pub fn into_handle(self) -> $crate::handle::Handle {
                self.0
            }
        }

        impl $crate::dispatch::RemoteObject for $name {
            fn object_ref(&self) -> &$crate::model::ObjectRef {
                $crate::dispatch::RemoteObject::object_ref(&self.0)
            }

            fn runtime(&self) -> &$crate::remote::RuntimeRef {
                $crate::dispatch::RemoteObject::runtime(&self.0)
            }
        }

        impl $crate::dispatch::FromValue for $name {
            fn from_value(value: $crate::model::Value, runtime: &$crate::remote::RuntimeRef) -> $crate::Result<Self> {
                <$crate::handle::Handle as $crate::dispatch::FromValue>::from_value(value, runtime).map(Self)
            }
        }

        impl From<&$name> for $crate::model::Value {
            fn from(handle: &$name) -> Self {
                $crate::model::Value::from(&handle.0)
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), $crate::dispatch::RemoteObject::object_ref(&self.0))
            }
        }
    };
}

pub(crate) use typed_handle;

typed_handle! {
    /// Engine-side function compiled from caller-supplied source text.
    Lambda
}

impl Lambda {
    crate::remote_methods! {
        /// The source text the lambda was built from.
        source / source_async => "source"() -> String;
        /// Invoke the lambda on one argument.
        apply / apply_async => "apply"(arg: Value) -> Value;
    }
}
