//! Lambda AST
//!
//! Pure data produced by the parser and walked by the interpreter. Both
//! dialects share one tree; dialect differences live in evaluation.

/// A compiled lambda: named parameters and a body.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub params: Vec<String>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Single expression, its value is the result.
    Expr(Expr),
    /// Statement list. Result is an explicit `return`, or in the embedded
    /// dialect the value of the last expression statement.
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `var x = ...`, `let`, `const`, `def`
    Let { name: String, init: Option<Expr> },
    Assign { name: String, value: Expr },
    Return(Option<Expr>),
    If { cond: Expr, then: Vec<Stmt>, otherwise: Vec<Stmt> },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Variable(String),
    List(Vec<Expr>),
    /// `object.name` without a call. `safe` for `?.`
    Member { object: Box<Expr>, name: String, safe: bool },
    MethodCall { object: Box<Expr>, method: String, args: Vec<Expr>, safe: bool },
    Index { object: Box<Expr>, index: Box<Expr> },
    Binary { left: Box<Expr>, op: BinaryOp, right: Box<Expr> },
    Unary { op: UnaryOp, expr: Box<Expr> },
    Conditional { cond: Box<Expr>, then: Box<Expr>, otherwise: Box<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, Sub, Mul, Div, Mod,
    Eq, Neq, StrictEq, StrictNeq,
    Lt, Lte, Gt, Gte,
    And, Or,
    /// `a ?: b`
    Elvis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}
