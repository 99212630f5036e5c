//! Closure synthesizer: lambda source text to engine-side function objects.
//!
//! Synthesis only records the source; the engine compiles it the first
//! time the lambda is invoked. A syntax error therefore surfaces from the
//! step that runs the lambda, as [`Error::LambdaCompilation`](crate::Error).

use serde::{Deserialize, Serialize};

use crate::dispatch::Deferred;
use crate::handle::{Lambda, LambdaClass};
use crate::script::{ClosureMode, Dialect};
use crate::Result;

/// Source text plus how the engine should read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LambdaSource {
    pub dialect: Dialect,
    pub mode: ClosureMode,
    pub source: String,
}

impl LambdaSource {
    pub fn new(dialect: Dialect, mode: ClosureMode, source: impl Into<String>) -> Self {
        Self { dialect, mode, source: source.into() }
    }

    /// Caller-language expression over the implicit parameter `a`.
    pub fn caller_expression(source: impl Into<String>) -> Self {
        Self::new(Dialect::Caller, ClosureMode::Expression, source)
    }

    /// Caller-language function, e.g. `function(t) { return t.get() }`.
    pub fn caller_closure(source: impl Into<String>) -> Self {
        Self::new(Dialect::Caller, ClosureMode::Closure, source)
    }

    /// Embedded-script expression over `a`.
    pub fn embedded_expression(source: impl Into<String>) -> Self {
        Self::new(Dialect::Embedded, ClosureMode::Expression, source)
    }

    /// Embedded-script closure, e.g. `{ v -> v.value('name') }`.
    pub fn embedded_closure(source: impl Into<String>) -> Self {
        Self::new(Dialect::Embedded, ClosureMode::Closure, source)
    }
}

/// Builds [`Lambda`] objects through the engine's `Lambda` class.
#[derive(Debug, Clone)]
pub struct ClosureSynthesizer {
    class: LambdaClass,
}

impl ClosureSynthesizer {
    pub fn new(class: LambdaClass) -> Self {
        Self { class }
    }

    pub fn synthesize(&self, lambda: &LambdaSource) -> Result<Lambda> {
        self.class.create(lambda.dialect, lambda.mode, &lambda.source)
    }

    pub fn synthesize_async(&self, lambda: &LambdaSource) -> Deferred<Lambda> {
        self.class.create_async(lambda.dialect, lambda.mode, &lambda.source)
    }

    pub fn caller_expression(&self, source: &str) -> Result<Lambda> {
        self.synthesize(&LambdaSource::caller_expression(source))
    }

    pub fn caller_closure(&self, source: &str) -> Result<Lambda> {
        self.synthesize(&LambdaSource::caller_closure(source))
    }

    pub fn embedded_expression(&self, source: &str) -> Result<Lambda> {
        self.synthesize(&LambdaSource::embedded_expression(source))
    }

    pub fn embedded_closure(&self, source: &str) -> Result<Lambda> {
        self.synthesize(&LambdaSource::embedded_closure(source))
    }
}
