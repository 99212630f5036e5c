//! Lambda objects held by the engine.
//!
//! A lambda stores its source text untouched. It is compiled the first time
//! a traversal step invokes it, and the outcome (program or compile fault)
//! is cached for every later invocation.

use std::cell::OnceCell;
use std::rc::Rc;

use crate::model::Value;
use crate::remote::{FaultResult, RemoteFault};
use crate::script::{self, ClosureMode, Dialect, Interpreter, MethodHost, Program};

#[derive(Debug)]
pub struct LambdaObject {
    pub dialect: Dialect,
    pub mode: ClosureMode,
    pub source: String,
    compiled: OnceCell<Result<Rc<Program>, RemoteFault>>,
}

impl LambdaObject {
    pub fn new(dialect: Dialect, mode: ClosureMode, source: String) -> Self {
        Self { dialect, mode, source, compiled: OnceCell::new() }
    }

    #[cfg(test)]
    fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    /// Compile on first use. A rejected source stays rejected.
    pub fn program(&self) -> FaultResult<Rc<Program>> {
        self.compiled
            .get_or_init(|| {
                script::compile(&self.source, self.dialect, self.mode)
                    .map(Rc::new)
                    .map_err(|e| RemoteFault::compilation(format!("{} lambda `{}`: {e}", self.dialect, self.source)))
            })
            .clone()
    }

    pub fn apply(&self, host: &mut dyn MethodHost, args: &[Value]) -> FaultResult<Value> {
        let program = self.program()?;
        Interpreter::new(self.dialect, host).run(&program, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ObjectRef;
    use crate::remote::{Args, FaultKind};

    struct NoHost;

    impl MethodHost for NoHost {
        fn call_method(&mut self, _: &ObjectRef, method: &str, _: Args) -> FaultResult<Value> {
            Err(RemoteFault::invocation("NoSuchMethodException", method))
        }
    }

    #[test]
    fn test_compiles_lazily_and_caches() {
        let lambda = LambdaObject::new(Dialect::Embedded, ClosureMode::Expression, "a + 1".into());
        assert!(!lambda.is_compiled());
        assert_eq!(lambda.apply(&mut NoHost, &[Value::Int(1)]).unwrap(), Value::Int(2));
        assert!(lambda.is_compiled());
        assert_eq!(lambda.apply(&mut NoHost, &[Value::Int(2)]).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_compile_failure_is_sticky() {
        let lambda = LambdaObject::new(Dialect::Caller, ClosureMode::Expression, "a.(".into());
        let first = lambda.apply(&mut NoHost, &[Value::Null]).unwrap_err();
        assert_eq!(first.kind, FaultKind::ScriptCompilation);
        let second = lambda.apply(&mut NoHost, &[Value::Null]).unwrap_err();
        assert_eq!(first, second);
    }
}
