//! Class objects exported by the runtime root.

use crate::dispatch::{Deferred, RemoteObject};
use crate::remote::{classes, Args, RuntimeRef};
use crate::script::{ClosureMode, Dialect};
use crate::{remote_methods, Result};

use super::traversal::Traversal;
use super::{typed_handle, Graph, Handle, Lambda};

/// Resolve an exported class by name through the runtime root.
pub fn import_class(runtime: &RuntimeRef, name: &str) -> Result<Handle> {
    Handle::root(runtime.clone()).call_as(classes::IMPORT_CLASS, crate::args![name])
}

typed_handle! {
    /// `TinkerGraph`: opens empty graphs.
    TinkerGraphClass
}

typed_handle! {
    /// `TinkerFactory`: builds the reference toy graphs.
    TinkerFactoryClass
}

typed_handle! {
    /// `__`: starts anonymous traversals used as step arguments.
    AnonymousClass
}

typed_handle! {
    /// `Lambda`: constructs engine-side functions from source text.
    LambdaClass
}

impl TinkerGraphClass {
    remote_methods! {
        /// A new, empty graph.
        open / open_async => "open"() -> Graph;
    }
}

impl TinkerFactoryClass {
    remote_methods! {
        /// Six vertices and six edges, every vertex labelled `vertex`.
        create_classic / create_classic_async => "createClassic"() -> Graph;
        /// The classic graph with `person` and `software` labels.
        create_modern / create_modern_async => "createModern"() -> Graph;
    }
}

impl AnonymousClass {
    /// Start an anonymous traversal with step `method`.
    pub fn step(&self, method: &str, args: Args) -> Result<Traversal> {
        self.call_as(method, args)
    }

    pub fn step_async(&self, method: &str, args: Args) -> Deferred<Traversal> {
        self.call_async_as(method, args)
    }

    /// An anonymous traversal with no steps.
    pub fn start(&self) -> Result<Traversal> {
        self.step("start", Args::new())
    }

    super::traversal::traversal_steps!();
}

impl LambdaClass {
    /// Build a lambda object. The source is stored as given; the engine
    /// compiles it on first use.
    pub fn create(&self, dialect: Dialect, mode: ClosureMode, source: &str) -> Result<Lambda> {
        self.call_as("new", crate::args![dialect.tag(), mode.tag(), source])
    }

    pub fn create_async(&self, dialect: Dialect, mode: ClosureMode, source: &str) -> Deferred<Lambda> {
        self.call_async_as("new", crate::args![dialect.tag(), mode.tag(), source])
    }
}
