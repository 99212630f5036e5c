//! # tinkerpop-rs: blocking and async bridge to a remote graph traversal engine
//!
//! The graph engine lives in its own runtime and is reachable only through
//! asynchronous method calls on the objects it owns. This crate gives the
//! caller both calling conventions for every remote method, compiles
//! caller-supplied lambda source into engine-side functions, drains
//! traversals one element at a time, and serializes vertices and edges into
//! plain records.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `RemoteRuntime` is the contract between the bridge and the engine
//! 2. **One primitive, two conventions**: every call is `invoke` + callback; blocking and deferred forms derive from it
//! 3. **Handles own nothing**: a handle is an object reference plus the runtime it lives in
//! 4. **Cursors are explicit**: a drained traversal is `Exhausted` and says so when reused
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tinkerpop_rs::{Bridge, BridgeConfig, coerce::noargs};
//!
//! # async fn example() -> tinkerpop_rs::Result<()> {
//! let bridge = Bridge::start(BridgeConfig::default())?;
//! let graph = bridge.tinker_factory().create_classic()?;
//!
//! // Blocking form
//! let names: Vec<String> = graph.v(noargs())?.values(&["name"])?.to_list_as()?;
//!
//! // Deferred form
//! let count = graph.v_async(noargs()).await?.count_async().await?.next_async().await?;
//!
//! // Lambdas in the engine's embedded dialect
//! let len = bridge.closures().embedded_expression("a.value('name').length()")?;
//! let lens = graph.v(noargs())?.map(&len)?.to_list()?;
//! # let _ = (names, count, lens);
//! # Ok(())
//! # }
//! ```
//!
//! ## Runtimes
//!
//! | Runtime | Module | Description |
//! |---------|--------|-------------|
//! | `TinkerRuntime` | `remote::tinker` | In-memory TinkerGraph engine on a dedicated thread |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod remote;
pub mod script;
pub mod dispatch;
pub mod handle;
pub mod closure;
pub mod drain;
pub mod export;
pub mod coerce;
pub mod bootstrap;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    ObjectRef, Value,
    ElementRecord, VertexRecord, EdgeRecord, PlainValue, PropertyRecord, PropertyTable,
};

// ============================================================================
// Re-exports: Boundary
// ============================================================================

pub use remote::{Args, FaultKind, RemoteFault, RemoteRuntime, RuntimeRef, TinkerRuntime};

// ============================================================================
// Re-exports: Caller surface
// ============================================================================

pub use dispatch::{Deferred, FromValue, RemoteObject};
pub use handle::{
    Handle, Graph, Vertex, Edge, VertexProperty, Property, Lambda,
    Traversal, CursorState,
};
pub use closure::{ClosureSynthesizer, LambdaSource};
pub use drain::{ElementHandler, drain, for_each, for_each_blocking, collect};
pub use export::{vertex_to_record, edge_to_record, export_graph_json, ExportStats};
pub use bootstrap::{Bridge, BridgeConfig, initialize, bridge};
pub use script::{ClosureMode, Dialect};

/// Build an argument list for a remote call. Each item is converted with
/// `Into<Value>`.
///
/// ```rust
/// use tinkerpop_rs::{args, Value};
/// let a = tinkerpop_rs::args!["name", 29, 0.5];
/// assert_eq!(a[1], Value::Int(29));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::remote::Args::new()
    };
    ($($arg:expr),+ $(,)?) => {{
        let mut args = $crate::remote::Args::new();
        $( args.push(::core::convert::Into::<$crate::model::Value>::into($arg)); )+
        args
    }};
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Remote call {target}.{method} failed: {fault}")]
    RemoteInvocation {
        target: ObjectRef,
        method: String,
        #[source]
        fault: RemoteFault,
    },

    #[error("Lambda compilation failed in {method}: {message}")]
    LambdaCompilation { method: String, message: String },

    #[error("Traversal {0} is exhausted and can not be advanced again")]
    IteratorExhaustedMisuse(ObjectRef),

    #[error("Serialization error on {element}, key `{key}`: {reason}")]
    Serialization { element: String, key: String, reason: String },

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Lambda syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Blocking call {method} issued from the runtime's own thread")]
    BlockingOnRuntimeThread { method: String },

    #[error("Bridge not initialized")]
    NotInitialized,

    #[error("Bridge already initialized")]
    AlreadyInitialized,

    #[error("Runtime disconnected before the call completed")]
    Disconnected,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
