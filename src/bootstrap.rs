//! Bootstrap: start a runtime, import the exported classes, and optionally
//! publish the result as the process-wide bridge.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::closure::ClosureSynthesizer;
use crate::dispatch::RemoteObject;
use crate::handle::classes::import_class;
use crate::handle::{AnonymousClass, LambdaClass, TinkerFactoryClass, TinkerGraphClass};
use crate::remote::{classes, RuntimeRef, TinkerRuntime};
use crate::{Error, Result};

/// Environment variable overriding [`BridgeConfig::runtime_name`].
pub const ENV_RUNTIME_NAME: &str = "TINKERPOP_RS_RUNTIME_NAME";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name of the runtime thread; also shown in handle debug output.
    pub runtime_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self { runtime_name: "tinkerpop-runtime".into() }
    }
}

impl BridgeConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Defaults, overridden by the environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        match std::env::var(ENV_RUNTIME_NAME) {
            Ok(name) if name.trim().is_empty() => {
                return Err(Error::Config(format!("{ENV_RUNTIME_NAME} is empty")));
            }
            Ok(name) => config.runtime_name = name,
            Err(std::env::VarError::NotPresent) => {}
            Err(e) => return Err(Error::Config(format!("{ENV_RUNTIME_NAME}: {e}"))),
        }
        Ok(config)
    }
}

/// A runtime plus the class objects every caller needs.
pub struct Bridge {
    runtime: RuntimeRef,
    tinker_graph: TinkerGraphClass,
    tinker_factory: TinkerFactoryClass,
    anonymous: AnonymousClass,
    closures: ClosureSynthesizer,
}

impl Bridge {
    /// Spawn a [`TinkerRuntime`] and bind to it.
    pub fn start(config: BridgeConfig) -> Result<Self> {
        let runtime: RuntimeRef = Arc::new(TinkerRuntime::spawn(&config.runtime_name)?);
        Self::with_runtime(runtime)
    }

    /// Bind to an existing runtime by importing its exported classes.
    pub fn with_runtime(runtime: RuntimeRef) -> Result<Self> {
        let tinker_graph = TinkerGraphClass::from_handle(import_class(&runtime, classes::TINKER_GRAPH)?);
        let tinker_factory = TinkerFactoryClass::from_handle(import_class(&runtime, classes::TINKER_FACTORY)?);
        let anonymous = AnonymousClass::from_handle(import_class(&runtime, classes::ANONYMOUS)?);
        let lambda = LambdaClass::from_handle(import_class(&runtime, classes::LAMBDA)?);
        debug!(
            runtime = runtime.name(),
            graph_class = %tinker_graph.object_ref(),
            lambda_class = %lambda.object_ref(),
            "bridge bound"
        );
        Ok(Self { runtime, tinker_graph, tinker_factory, anonymous, closures: ClosureSynthesizer::new(lambda) })
    }

    pub fn runtime(&self) -> &RuntimeRef {
        &self.runtime
    }

    pub fn tinker_graph(&self) -> &TinkerGraphClass {
        &self.tinker_graph
    }

    pub fn tinker_factory(&self) -> &TinkerFactoryClass {
        &self.tinker_factory
    }

    /// The `__` class, for anonymous traversals passed as step arguments.
    pub fn anonymous(&self) -> &AnonymousClass {
        &self.anonymous
    }

    pub fn closures(&self) -> &ClosureSynthesizer {
        &self.closures
    }

    /// Stop the runtime. Every handle from this bridge faults afterwards.
    pub fn shutdown(&self) {
        debug!(runtime = self.runtime.name(), "bridge shutting down");
        self.runtime.shutdown();
    }
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("runtime", &self.runtime.name())
            .field("tinker_graph", &self.tinker_graph)
            .field("tinker_factory", &self.tinker_factory)
            .field("anonymous", &self.anonymous)
            .field("closures", &self.closures)
            .finish()
    }
}

// ============================================================================
// Process-wide bridge
// ============================================================================

static BRIDGE: OnceLock<Bridge> = OnceLock::new();

/// Start the process-wide bridge. Only the first call succeeds.
pub fn initialize(config: BridgeConfig) -> Result<&'static Bridge> {
    if BRIDGE.get().is_some() {
        return Err(Error::AlreadyInitialized);
    }
    let bridge = Bridge::start(config)?;
    // Lost a race with another initializer: ours drops and shuts down.
    BRIDGE.set(bridge).map_err(|_| Error::AlreadyInitialized)?;
    BRIDGE.get().ok_or(Error::NotInitialized)
}

/// The process-wide bridge.
pub fn bridge() -> Result<&'static Bridge> {
    BRIDGE.get().ok_or(Error::NotInitialized)
}
