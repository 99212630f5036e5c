use tracing::debug;

use crate::dispatch::{Deferred, RemoteObject};
use crate::model::Value;
use crate::remote::Args;
use crate::{args, remote_methods, Result};

use super::traversal::Traversal;
use super::{typed_handle, Vertex};

typed_handle! {
    /// A graph instance. The unit of shared mutable state in the runtime.
    Graph
}

impl Graph {
    remote_methods! {
        /// Traversal over vertices. Pass `coerce::noargs()` for every vertex,
        /// or one id or a list of ids.
        v / v_async => "V"(ids: impl Into<Value>) -> Traversal;
        /// Traversal over edges, selected like [`Graph::v`].
        e / e_async => "E"(ids: impl Into<Value>) -> Traversal;
    }

    /// Add a vertex from a flat key/value list; `coerce::LABEL` and
    /// `coerce::ID` set the label and id.
    pub fn add_vertex(&self, kvs: Args) -> Result<Vertex> {
        self.call_as("addVertex", kvs)
    }

    pub fn add_vertex_async(&self, kvs: Args) -> Deferred<Vertex> {
        self.call_async_as("addVertex", kvs)
    }

    /// Close the graph and release everything derived from it. Handles to
    /// its elements and traversals fault afterwards.
    pub fn close(self) -> Result<()> {
        debug!(graph = %self.object_ref(), "closing graph");
        self.call_as("close", args![])
    }

    pub fn close_async(self) -> Deferred<()> {
        debug!(graph = %self.object_ref(), "closing graph");
        self.call_async_as("close", args![])
    }
}
