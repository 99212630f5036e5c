//! # Remote Engine Boundary
//!
//! This is THE contract between the bridge and a foreign graph runtime.
//! A runtime exposes exactly one primitive: invoke a named method on an
//! object it owns, with positional arguments, and report the outcome later
//! through a callback. Everything the caller sees (blocking calls, deferred
//! calls, typed handles) is derived from this one shape.
//!
//! ## Implementations
//!
//! | Runtime | Module | Description |
//! |---------|--------|-------------|
//! | `TinkerRuntime` | `tinker` | In-memory TinkerGraph engine on its own thread |

pub mod tinker;

use std::sync::Arc;

use smallvec::SmallVec;

use crate::model::{ObjectRef, Value};

pub use tinker::TinkerRuntime;

// ============================================================================
// Call shape
// ============================================================================

/// Positional arguments of one remote call.
pub type Args = SmallVec<[Value; 4]>;

/// Completion callback. Fires exactly once, on the runtime's own thread.
pub type Callback = Box<dyn FnOnce(std::result::Result<Value, RemoteFault>) + Send>;

/// Shared reference to a runtime, held by every handle.
pub type RuntimeRef = Arc<dyn RemoteRuntime>;

/// Outcome of work done on the runtime side of the boundary.
pub type FaultResult<T> = std::result::Result<T, RemoteFault>;

// ============================================================================
// Faults
// ============================================================================

/// The only classification of a foreign failure the bridge interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The method itself threw.
    Invocation,
    /// A lambda's source text was rejected by its dialect's compiler.
    ScriptCompilation,
}

/// A failure reported by the foreign runtime. `class` and `message` are
/// opaque to the bridge and passed through unmodified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{class}: {message}")]
pub struct RemoteFault {
    pub kind: FaultKind,
    pub class: String,
    pub message: String,
}

impl RemoteFault {
    pub fn invocation(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind: FaultKind::Invocation, class: class.into(), message: message.into() }
    }

    pub fn compilation(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::ScriptCompilation,
            class: "ScriptException".into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// RemoteRuntime Trait
// ============================================================================

/// A foreign runtime reachable only through asynchronous method calls.
///
/// `invoke` must never block the caller. If the runtime can no longer run
/// calls, the callback fires immediately with a fault.
pub trait RemoteRuntime: Send + Sync + 'static {
    fn invoke(&self, target: &ObjectRef, method: &str, args: Args, callback: Callback);

    /// Stop accepting calls and release every object. Idempotent.
    fn shutdown(&self) {}

    fn name(&self) -> &str {
        "remote"
    }

    /// True when called from the thread that fires callbacks. Blocking on
    /// a call from there would wait on itself.
    fn on_runtime_thread(&self) -> bool {
        false
    }
}

// ============================================================================
// Exported classes
// ============================================================================

/// Class names resolvable through `importClass` on the runtime root.
pub mod classes {
    pub const TINKER_GRAPH: &str = "TinkerGraph";
    pub const TINKER_FACTORY: &str = "TinkerFactory";
    pub const ANONYMOUS: &str = "__";
    pub const LAMBDA: &str = "Lambda";

    /// Method on the runtime root that resolves a class object by name.
    pub const IMPORT_CLASS: &str = "importClass";
}
