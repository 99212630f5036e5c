//! Lambda interpreter.
//!
//! Walks a [`Program`] against a [`MethodHost`]. Calls on remote objects go
//! to the host synchronously; strings, lists and numbers are handled here.
//! Every failure is a [`RemoteFault`] because evaluation happens inside the
//! engine, mid-traversal.

use std::collections::HashMap;

use super::ast::*;
use super::Dialect;
use crate::model::{ObjectRef, Value};
use crate::remote::{Args, FaultResult, RemoteFault};

/// Whoever owns the objects a lambda can see.
pub trait MethodHost {
    fn call_method(&mut self, target: &ObjectRef, method: &str, args: Args) -> FaultResult<Value>;
}

/// Truthiness as each dialect defines it.
pub fn truthy(dialect: Dialect, value: &Value) -> bool {
    match (dialect, value) {
        // Arrays and objects are always truthy in the caller dialect
        (Dialect::Caller, Value::List(_) | Value::Map(_)) => true,
        _ => value.is_truthy(),
    }
}

enum Flow {
    Next(Value),
    Return(Value),
}

pub struct Interpreter<'h> {
    dialect: Dialect,
    host: &'h mut dyn MethodHost,
    scopes: Vec<HashMap<String, Value>>,
}

impl<'h> Interpreter<'h> {
    pub fn new(dialect: Dialect, host: &'h mut dyn MethodHost) -> Self {
        Self { dialect, host, scopes: Vec::new() }
    }

    /// Run `program` with positional arguments. Missing arguments are null.
    pub fn run(&mut self, program: &Program, args: &[Value]) -> FaultResult<Value> {
        let mut frame: HashMap<String, Value> = program
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), args.get(i).cloned().unwrap_or(Value::Null)))
            .collect();
        if self.dialect == Dialect::Embedded && !frame.contains_key("it") {
            frame.insert("it".into(), args.first().cloned().unwrap_or(Value::Null));
        }
        self.scopes = vec![frame];

        match &program.body {
            Body::Expr(expr) => self.eval(expr),
            Body::Block(stmts) => match self.exec_block(stmts)? {
                Flow::Return(v) => Ok(v),
                Flow::Next(last) => Ok(match self.dialect {
                    Dialect::Embedded => last,
                    Dialect::Caller => Value::Null,
                }),
            },
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn exec_block(&mut self, stmts: &[Stmt]) -> FaultResult<Flow> {
        self.scopes.push(HashMap::new());
        let mut last = Value::Null;
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Flow::Return(v) => {
                    self.scopes.pop();
                    return Ok(Flow::Return(v));
                }
                Flow::Next(v) => last = v,
            }
        }
        self.scopes.pop();
        Ok(Flow::Next(last))
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> FaultResult<Flow> {
        match stmt {
            Stmt::Let { name, init } => {
                let value = match init {
                    Some(e) => self.eval(e)?,
                    None => Value::Null,
                };
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name.clone(), value);
                }
                Ok(Flow::Next(Value::Null))
            }
            Stmt::Assign { name, value } => {
                let value = self.eval(value)?;
                self.assign(name, value.clone());
                Ok(Flow::Next(value))
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(e) => self.eval(e)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::If { cond, then, otherwise } => {
                let cond = self.eval(cond)?;
                if self.truthy(&cond) {
                    self.exec_block(then)
                } else {
                    self.exec_block(otherwise)
                }
            }
            Stmt::Expr(expr) => Ok(Flow::Next(self.eval(expr)?)),
        }
    }

    fn lookup(&self, name: &str) -> FaultResult<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.get(name))
            .cloned()
            .ok_or_else(|| match self.dialect {
                Dialect::Caller => RemoteFault::invocation("ReferenceError", format!("{name} is not defined")),
                Dialect::Embedded => RemoteFault::invocation("MissingPropertyException", format!("No such property: {name}")),
            })
    }

    /// Assign to the nearest binding, or create one in the outermost scope.
    fn assign(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.scopes.iter_mut().rev().find_map(|s| s.get_mut(name)) {
            *slot = value;
        } else if let Some(global) = self.scopes.first_mut() {
            global.insert(name.to_owned(), value);
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn eval(&mut self, expr: &Expr) -> FaultResult<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Null => Value::Null,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Int(i) => Value::Int(*i),
                Literal::Float(f) => Value::Float(*f),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expr::Variable(name) => self.lookup(name),
            Expr::List(items) => Ok(Value::List(
                items.iter().map(|e| self.eval(e)).collect::<FaultResult<_>>()?,
            )),
            Expr::Member { object, name, safe } => {
                let target = self.eval(object)?;
                if target.is_null() && *safe {
                    return Ok(Value::Null);
                }
                self.member(target, name)
            }
            Expr::MethodCall { object, method, args, safe } => {
                let target = self.eval(object)?;
                if target.is_null() && *safe {
                    return Ok(Value::Null);
                }
                let args = args.iter().map(|e| self.eval(e)).collect::<FaultResult<Vec<_>>>()?;
                self.call(target, method, args)
            }
            Expr::Index { object, index } => {
                let target = self.eval(object)?;
                let index = self.eval(index)?;
                self.index(target, index)
            }
            Expr::Binary { left, op, right } => {
                let left = self.eval(left)?;
                match op {
                    BinaryOp::And => {
                        if !self.truthy(&left) {
                            return Ok(self.logical_result(left, false));
                        }
                        let right = self.eval(right)?;
                        let t = self.truthy(&right);
                        Ok(self.logical_result(right, t))
                    }
                    BinaryOp::Or => {
                        if self.truthy(&left) {
                            return Ok(self.logical_result(left, true));
                        }
                        let right = self.eval(right)?;
                        let t = self.truthy(&right);
                        Ok(self.logical_result(right, t))
                    }
                    BinaryOp::Elvis => {
                        if self.truthy(&left) { Ok(left) } else { self.eval(right) }
                    }
                    op => {
                        let right = self.eval(right)?;
                        self.binary(left, *op, right)
                    }
                }
            }
            Expr::Unary { op, expr } => {
                let value = self.eval(expr)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!self.truthy(&value))),
                    UnaryOp::Negate => match value {
                        Value::Int(i) => Ok(i.checked_neg().map_or(Value::Float(-(i as f64)), Value::Int)),
                        Value::Float(f) => Ok(Value::Float(-f)),
                        other => Err(self.type_error(format!("Cannot negate {}", other.type_name()))),
                    },
                }
            }
            Expr::Conditional { cond, then, otherwise } => {
                let cond = self.eval(cond)?;
                if self.truthy(&cond) { self.eval(then) } else { self.eval(otherwise) }
            }
        }
    }

    /// The caller dialect returns the deciding operand, the embedded one a boolean.
    fn logical_result(&self, operand: Value, truth: bool) -> Value {
        match self.dialect {
            Dialect::Caller => operand,
            Dialect::Embedded => Value::Bool(truth),
        }
    }

    fn truthy(&self, value: &Value) -> bool {
        truthy(self.dialect, value)
    }

    fn type_error(&self, message: String) -> RemoteFault {
        let class = match self.dialect {
            Dialect::Caller => "TypeError",
            Dialect::Embedded => "GroovyRuntimeException",
        };
        RemoteFault::invocation(class, message)
    }

    fn no_method(&self, target: &Value, method: &str) -> RemoteFault {
        match self.dialect {
            Dialect::Caller => RemoteFault::invocation(
                "TypeError",
                format!("{}.{method} is not a function", target.type_name().to_lowercase()),
            ),
            Dialect::Embedded => RemoteFault::invocation(
                "MissingMethodException",
                format!("No signature of method: {}.{method}() is applicable", target.type_name().to_lowercase()),
            ),
        }
    }

    fn null_receiver(&self, name: &str) -> RemoteFault {
        match self.dialect {
            Dialect::Caller => RemoteFault::invocation(
                "TypeError",
                format!("Cannot read properties of null (reading '{name}')"),
            ),
            Dialect::Embedded => RemoteFault::invocation(
                "NullPointerException",
                format!("Cannot invoke method {name}() on null object"),
            ),
        }
    }

    // ========================================================================
    // Member access and calls
    // ========================================================================

    fn member(&mut self, target: Value, name: &str) -> FaultResult<Value> {
        match (&target, name) {
            (Value::String(s), "length") => Ok(Value::Int(s.chars().count() as i64)),
            (Value::List(l), "length" | "size") => Ok(Value::Int(l.len() as i64)),
            (Value::Map(m), key) => Ok(m.get(key).cloned().unwrap_or(Value::Null)),
            // Property-style access to a remote object is a zero-argument call
            (Value::Object(obj), method) => self.host.call_method(obj, method, Args::new()),
            (Value::Null, name) => Err(self.null_receiver(name)),
            _ => Ok(Value::Null),
        }
    }

    fn call(&mut self, target: Value, method: &str, args: Vec<Value>) -> FaultResult<Value> {
        match &target {
            Value::Object(obj) => self.host.call_method(obj, method, Args::from_vec(args)),
            Value::Null => Err(self.null_receiver(method)),
            _ => match method {
                "toString" => Ok(Value::String(target.to_string())),
                "equals" => Ok(Value::Bool(args.first().is_some_and(|a| target.loose_eq(a)))),
                _ => match &target {
                    Value::String(s) => self.string_method(s, method, &args),
                    Value::List(l) => self.list_method(l, method, &args),
                    Value::Int(_) | Value::Float(_) => self.number_method(&target, method),
                    other => Err(self.no_method(other, method)),
                },
            },
        }
    }

    fn string_method(&self, s: &str, method: &str, args: &[Value]) -> FaultResult<Value> {
        let str_arg = |i: usize| -> FaultResult<String> {
            match args.get(i) {
                Some(Value::String(a)) => Ok(a.clone()),
                Some(other) => Ok(other.to_string()),
                None => Err(self.type_error(format!("{method}() expects an argument"))),
            }
        };
        let chars: Vec<char> = s.chars().collect();
        let char_index = |i: usize| -> usize {
            let n = args.get(i).and_then(Value::as_int).unwrap_or(chars.len() as i64);
            n.clamp(0, chars.len() as i64) as usize
        };
        Ok(match method {
            "length" | "size" => Value::Int(chars.len() as i64),
            "isEmpty" => Value::Bool(s.is_empty()),
            "toUpperCase" => Value::String(s.to_uppercase()),
            "toLowerCase" => Value::String(s.to_lowercase()),
            "trim" => Value::String(s.trim().to_owned()),
            "startsWith" => Value::Bool(s.starts_with(str_arg(0)?.as_str())),
            "endsWith" => Value::Bool(s.ends_with(str_arg(0)?.as_str())),
            "contains" | "includes" => Value::Bool(s.contains(str_arg(0)?.as_str())),
            "indexOf" => {
                let needle = str_arg(0)?;
                Value::Int(match s.find(needle.as_str()) {
                    Some(byte) => s[..byte].chars().count() as i64,
                    None => -1,
                })
            }
            "charAt" => {
                let i = char_index(0);
                Value::String(chars.get(i).map(|c| c.to_string()).unwrap_or_default())
            }
            "substring" => {
                let start = char_index(0);
                let end = char_index(1);
                let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
                Value::String(chars[lo..hi].iter().collect())
            }
            "concat" => Value::String(format!("{s}{}", str_arg(0)?)),
            "split" => {
                let sep = str_arg(0)?;
                Value::List(s.split(sep.as_str()).map(Value::from).collect())
            }
            "replace" => {
                let (from, to) = (str_arg(0)?, str_arg(1)?);
                Value::String(match self.dialect {
                    Dialect::Caller => s.replacen(from.as_str(), &to, 1),
                    Dialect::Embedded => s.replace(from.as_str(), &to),
                })
            }
            _ => return Err(self.no_method(&Value::String(s.to_owned()), method)),
        })
    }

    fn list_method(&self, items: &[Value], method: &str, args: &[Value]) -> FaultResult<Value> {
        let position = |needle: &Value| items.iter().position(|v| v.loose_eq(needle));
        Ok(match method {
            "size" => Value::Int(items.len() as i64),
            "isEmpty" => Value::Bool(items.is_empty()),
            "get" => {
                let i = args.first().and_then(Value::as_int).unwrap_or(-1);
                usize::try_from(i).ok().and_then(|i| items.get(i)).cloned().unwrap_or(Value::Null)
            }
            "first" => items.first().cloned().unwrap_or(Value::Null),
            "last" => items.last().cloned().unwrap_or(Value::Null),
            "contains" | "includes" => Value::Bool(args.first().is_some_and(|a| position(a).is_some())),
            "indexOf" => Value::Int(args.first().and_then(position).map_or(-1, |i| i as i64)),
            "join" => {
                let sep = args.first().map_or_else(|| ",".to_owned(), |v| v.to_string());
                Value::String(items.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(&sep))
            }
            _ => return Err(self.no_method(&Value::List(Vec::new()), method)),
        })
    }

    fn number_method(&self, n: &Value, method: &str) -> FaultResult<Value> {
        Ok(match (method, n) {
            ("intValue" | "longValue", Value::Float(f)) => Value::Int(f.trunc() as i64),
            ("intValue" | "longValue", v) => v.clone(),
            ("doubleValue", v) => v.as_float().map_or(Value::Null, Value::Float),
            ("abs", Value::Int(i)) => Value::Int(i.saturating_abs()),
            ("abs", Value::Float(f)) => Value::Float(f.abs()),
            _ => return Err(self.no_method(n, method)),
        })
    }

    fn index(&self, target: Value, index: Value) -> FaultResult<Value> {
        match (&target, &index) {
            (Value::List(items), Value::Int(i)) => {
                let len = items.len() as i64;
                // Negative indices count from the end in the embedded dialect
                let i = if *i < 0 && self.dialect == Dialect::Embedded { len + i } else { *i };
                Ok(usize::try_from(i).ok().and_then(|i| items.get(i)).cloned().unwrap_or(Value::Null))
            }
            (Value::String(s), Value::Int(i)) => Ok(usize::try_from(*i)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map_or(Value::Null, |c| Value::String(c.to_string()))),
            (Value::Map(m), Value::String(k)) => Ok(m.get(k).cloned().unwrap_or(Value::Null)),
            (Value::Null, _) => Err(self.null_receiver("[]")),
            _ => Err(self.type_error(format!("Cannot index {} with {}", target.type_name(), index.type_name()))),
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn binary(&self, left: Value, op: BinaryOp, right: Value) -> FaultResult<Value> {
        use std::cmp::Ordering;

        let ordered = |want: fn(Ordering) -> bool| Value::Bool(left.compare(&right).is_some_and(want));
        Ok(match op {
            BinaryOp::Eq => Value::Bool(self.equals(&left, &right)),
            BinaryOp::Neq => Value::Bool(!self.equals(&left, &right)),
            BinaryOp::StrictEq => Value::Bool(left.loose_eq(&right)),
            BinaryOp::StrictNeq => Value::Bool(!left.loose_eq(&right)),
            BinaryOp::Lt => ordered(Ordering::is_lt),
            BinaryOp::Lte => ordered(Ordering::is_le),
            BinaryOp::Gt => ordered(Ordering::is_gt),
            BinaryOp::Gte => ordered(Ordering::is_ge),
            BinaryOp::Add => match (&left, &right) {
                (Value::Int(a), Value::Int(b)) => {
                    a.checked_add(*b).map_or(Value::Float(*a as f64 + *b as f64), Value::Int)
                }
                (Value::String(_), _) | (_, Value::String(_)) => Value::String(format!("{left}{right}")),
                (Value::List(a), Value::List(b)) => Value::List(a.iter().chain(b).cloned().collect()),
                _ => self.float_op(&left, &right, "+", |a, b| a + b)?,
            },
            BinaryOp::Sub => match (&left, &right) {
                (Value::Int(a), Value::Int(b)) => {
                    a.checked_sub(*b).map_or(Value::Float(*a as f64 - *b as f64), Value::Int)
                }
                _ => self.float_op(&left, &right, "-", |a, b| a - b)?,
            },
            BinaryOp::Mul => match (&left, &right) {
                (Value::Int(a), Value::Int(b)) => {
                    a.checked_mul(*b).map_or(Value::Float(*a as f64 * *b as f64), Value::Int)
                }
                _ => self.float_op(&left, &right, "*", |a, b| a * b)?,
            },
            BinaryOp::Div => match (&left, &right) {
                (Value::Int(_), Value::Int(0)) => {
                    return Err(RemoteFault::invocation("ArithmeticException", "Division by zero"));
                }
                (Value::Int(a), Value::Int(b)) if a.checked_rem(*b) == Some(0) => Value::Int(a / b),
                _ => self.float_op(&left, &right, "/", |a, b| a / b)?,
            },
            BinaryOp::Mod => match (&left, &right) {
                (Value::Int(_), Value::Int(0)) => {
                    return Err(RemoteFault::invocation("ArithmeticException", "Division by zero"));
                }
                (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_rem(*b)),
                _ => self.float_op(&left, &right, "%", |a, b| a % b)?,
            },
            BinaryOp::And | BinaryOp::Or | BinaryOp::Elvis => {
                return Err(self.type_error(format!("{op:?} is short-circuit only")));
            }
        })
    }

    fn float_op(&self, left: &Value, right: &Value, symbol: &str, f: fn(f64, f64) -> f64) -> FaultResult<Value> {
        match (left.as_float(), right.as_float()) {
            (Some(a), Some(b)) => Ok(Value::Float(f(a, b))),
            _ => Err(self.type_error(format!(
                "Cannot apply '{symbol}' to {} and {}",
                left.type_name(),
                right.type_name()
            ))),
        }
    }

    /// `==`. The caller dialect coerces between strings, booleans and numbers.
    fn equals(&self, left: &Value, right: &Value) -> bool {
        if self.dialect == Dialect::Embedded {
            return left.loose_eq(right);
        }
        match (left, right) {
            (Value::String(s), n) | (n, Value::String(s)) if n.is_numeric() => {
                s.trim().parse::<f64>().ok() == n.as_float()
            }
            (Value::Bool(b), n) | (n, Value::Bool(b)) if n.is_numeric() => {
                Some(if *b { 1.0 } else { 0.0 }) == n.as_float()
            }
            _ => left.loose_eq(right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{compile, ClosureMode};
    use pretty_assertions::assert_eq;

    /// Object 1 is a traverser over object 2, a vertex named "lop".
    struct FakeHost {
        calls: Vec<String>,
    }

    impl MethodHost for FakeHost {
        fn call_method(&mut self, target: &ObjectRef, method: &str, args: Args) -> FaultResult<Value> {
            self.calls.push(format!("{}.{method}", target.id()));
            match (target.id(), method) {
                (1, "get") => Ok(Value::Object(ObjectRef::new(2, "TinkerVertex"))),
                (2, "value") if args.first() == Some(&Value::from("name")) => Ok("lop".into()),
                (2, "label") => Ok("software".into()),
                _ => Err(RemoteFault::invocation("NoSuchMethodException", method)),
            }
        }
    }

    fn run(src: &str, dialect: Dialect, mode: ClosureMode, arg: Value) -> FaultResult<Value> {
        let program = compile(src, dialect, mode).unwrap();
        let mut host = FakeHost { calls: Vec::new() };
        Interpreter::new(dialect, &mut host).run(&program, &[arg])
    }

    fn traverser() -> Value {
        Value::Object(ObjectRef::new(1, "Traverser"))
    }

    fn vertex() -> Value {
        Value::Object(ObjectRef::new(2, "TinkerVertex"))
    }

    #[test]
    fn test_caller_filter_expression() {
        let out = run(r#"a.get().value("name") == "lop""#, Dialect::Caller, ClosureMode::Expression, traverser());
        assert_eq!(out.unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_embedded_length_expression() {
        let out = run("a.value('name').length()", Dialect::Embedded, ClosureMode::Expression, vertex());
        assert_eq!(out.unwrap(), Value::Int(3));
    }

    #[test]
    fn test_embedded_closure_implicit_return() {
        let out = run("{ vertex -> vertex.value('name').length() }", Dialect::Embedded, ClosureMode::Closure, vertex());
        assert_eq!(out.unwrap(), Value::Int(3));
        let out = run("{ it.label }", Dialect::Embedded, ClosureMode::Closure, vertex());
        assert_eq!(out.unwrap(), Value::from("software"));
    }

    #[test]
    fn test_caller_function_needs_return() {
        let out = run("function (t) { t.get(); }", Dialect::Caller, ClosureMode::Closure, traverser());
        assert_eq!(out.unwrap(), Value::Null);
        let out = run("function (t) { var n = t.get().value('name'); return n.length; }", Dialect::Caller, ClosureMode::Closure, traverser());
        assert_eq!(out.unwrap(), Value::Int(3));
    }

    #[test]
    fn test_if_else() {
        let src = "(t) => { let n = t.get().value('name'); if (n.length > 3) { return 'long'; } else { return 'short'; } }";
        assert_eq!(run(src, Dialect::Caller, ClosureMode::Closure, traverser()).unwrap(), Value::from("short"));
    }

    #[test]
    fn test_logical_operators_by_dialect() {
        assert_eq!(run("a && 'x'", Dialect::Caller, ClosureMode::Expression, Value::Int(1)).unwrap(), Value::from("x"));
        assert_eq!(run("a && 'x'", Dialect::Embedded, ClosureMode::Expression, Value::Int(1)).unwrap(), Value::Bool(true));
        assert_eq!(run("a || 'd'", Dialect::Caller, ClosureMode::Expression, Value::from("")).unwrap(), Value::from("d"));
    }

    #[test]
    fn test_truthiness_of_empty_list() {
        assert_eq!(run("[] ? 1 : 2", Dialect::Caller, ClosureMode::Expression, Value::Null).unwrap(), Value::Int(1));
        assert_eq!(run("[] ? 1 : 2", Dialect::Embedded, ClosureMode::Expression, Value::Null).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_loose_equality() {
        assert_eq!(run("a == '5'", Dialect::Caller, ClosureMode::Expression, Value::Int(5)).unwrap(), Value::Bool(true));
        assert_eq!(run("a === '5'", Dialect::Caller, ClosureMode::Expression, Value::Int(5)).unwrap(), Value::Bool(false));
        assert_eq!(run("a == '5'", Dialect::Embedded, ClosureMode::Expression, Value::Int(5)).unwrap(), Value::Bool(false));
        assert_eq!(run("a == 5.0", Dialect::Embedded, ClosureMode::Expression, Value::Int(5)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("a * 2 + 1", Dialect::Caller, ClosureMode::Expression, Value::Int(4)).unwrap(), Value::Int(9));
        assert_eq!(run("a / 2", Dialect::Embedded, ClosureMode::Expression, Value::Int(5)).unwrap(), Value::Float(2.5));
        assert_eq!(run("'n=' + a", Dialect::Caller, ClosureMode::Expression, Value::Int(4)).unwrap(), Value::from("n=4"));
        assert!(run("a / 0", Dialect::Embedded, ClosureMode::Expression, Value::Int(5)).is_err());
    }

    #[test]
    fn test_string_and_list_builtins() {
        assert_eq!(run("a.toUpperCase().substring(0, 2)", Dialect::Embedded, ClosureMode::Expression, "marko".into()).unwrap(), Value::from("MA"));
        assert_eq!(run("[1, 2, 3].contains(a)", Dialect::Embedded, ClosureMode::Expression, Value::Int(2)).unwrap(), Value::Bool(true));
        assert_eq!(run("[1, 2, 3][-1]", Dialect::Embedded, ClosureMode::Expression, Value::Null).unwrap(), Value::Int(3));
        assert_eq!(run("a.split(',').size()", Dialect::Embedded, ClosureMode::Expression, "x,y".into()).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_safe_navigation_and_elvis() {
        assert_eq!(run("a?.label() ?: 'none'", Dialect::Embedded, ClosureMode::Expression, Value::Null).unwrap(), Value::from("none"));
    }

    #[test]
    fn test_runtime_faults() {
        let err = run("b", Dialect::Caller, ClosureMode::Expression, Value::Null).unwrap_err();
        assert_eq!(err.class, "ReferenceError");
        let err = run("a.value('x')", Dialect::Embedded, ClosureMode::Expression, Value::Null).unwrap_err();
        assert_eq!(err.class, "NullPointerException");
        let err = run("a.frobnicate()", Dialect::Embedded, ClosureMode::Expression, "s".into()).unwrap_err();
        assert_eq!(err.class, "MissingMethodException");
        let err = run("a.get().nope()", Dialect::Caller, ClosureMode::Expression, traverser()).unwrap_err();
        assert_eq!(err.class, "NoSuchMethodException");
    }

    #[test]
    fn test_assignment_creates_binding() {
        let out = run("{ x -> y = x + 1; y * 2 }", Dialect::Embedded, ClosureMode::Closure, Value::Int(1));
        assert_eq!(out.unwrap(), Value::Int(4));
    }
}
