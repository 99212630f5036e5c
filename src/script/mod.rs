//! Engine-side interpreters for lambda source text.
//!
//! Two dialects share one grammar and one evaluator:
//!
//! | Dialect | Tag | Flavour |
//! |---------|-----|---------|
//! | `Caller` | `caller-language` | JavaScript-like: `function`, `=>`, loose `==` |
//! | `Embedded` | `embedded-script` | Groovy-like: `{ x -> ... }`, implicit `it`, last value returned |
//!
//! Source text → tokens → [`Program`] is a pure function. Running a program
//! needs a [`MethodHost`] to resolve calls on remote objects.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub use ast::Program;
pub use eval::{Interpreter, MethodHost};

/// Which compiler a lambda's source text is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "caller-language")]
    Caller,
    #[serde(rename = "embedded-script")]
    Embedded,
}

impl Dialect {
    pub fn tag(self) -> &'static str {
        match self {
            Dialect::Caller => "caller-language",
            Dialect::Embedded => "embedded-script",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "caller-language" => Ok(Dialect::Caller),
            "embedded-script" => Ok(Dialect::Embedded),
            other => Err(Error::TypeError { expected: "lambda dialect".into(), got: other.into() }),
        }
    }
}

/// Whether the source is a bare expression or a full function definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosureMode {
    /// One expression over the implicit parameter `a`.
    Expression,
    /// Parameter list plus body.
    Closure,
}

impl ClosureMode {
    pub fn tag(self) -> &'static str {
        match self {
            ClosureMode::Expression => "expression",
            ClosureMode::Closure => "closure",
        }
    }
}

impl fmt::Display for ClosureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ClosureMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "expression" => Ok(ClosureMode::Expression),
            "closure" => Ok(ClosureMode::Closure),
            other => Err(Error::TypeError { expected: "closure mode".into(), got: other.into() }),
        }
    }
}

/// Compile lambda source text.
pub fn compile(source: &str, dialect: Dialect, mode: ClosureMode) -> Result<Program> {
    let tokens = lexer::tokenize(source, dialect)?;
    parser::parse_program(&tokens, dialect, mode)
}
