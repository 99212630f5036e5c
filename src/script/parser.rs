//! Lambda recursive descent parser.
//!
//! Parses token streams into a [`Program`]. Supports:
//! - expression mode: one expression over the implicit parameter `a`
//! - caller-dialect closures: `function f(x) {...}`, `(x, y) => ...`, `x => ...`
//! - embedded-dialect closures: `{ x, y -> ... }`, `{ ... }` with implicit `it`
//! - statements: declarations, assignment, `if`/`else`, `return`
//! - full expression parsing with precedence

use super::ast::*;
use super::lexer::{Token, TokenKind};
use super::{ClosureMode, Dialect};
use crate::{Error, Result};

/// Parameter bound to the current element in expression mode.
pub const IMPLICIT_PARAM: &str = "a";
/// Parameter of an embedded-dialect closure that declares none.
pub const IMPLICIT_IT: &str = "it";

/// Parser state: wraps a token slice with cursor.
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn peek_nth_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map_or(TokenKind::Eof, |t| t.kind)
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token> {
        let tok = self.peek();
        if tok.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error(format!("Expected {:?}, got {:?} '{}'", kind, tok.kind, tok.text)))
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, msg: String) -> Error {
        Error::SyntaxError {
            position: self.peek().span.start,
            message: msg,
        }
    }
}

/// Parse a complete lambda from tokens.
pub fn parse_program(tokens: &[Token], dialect: Dialect, mode: ClosureMode) -> Result<Program> {
    if tokens.is_empty() {
        return Err(Error::SyntaxError { position: 0, message: "Empty token stream".into() });
    }
    let mut p = Parser::new(tokens);

    if p.at(TokenKind::Eof) {
        return Err(p.error("Empty lambda source".into()));
    }

    let program = match (mode, dialect) {
        (ClosureMode::Expression, _) => Program {
            params: vec![IMPLICIT_PARAM.into()],
            body: Body::Expr(parse_expr(&mut p)?),
        },
        (ClosureMode::Closure, Dialect::Caller) => parse_caller_closure(&mut p)?,
        (ClosureMode::Closure, Dialect::Embedded) => parse_embedded_closure(&mut p)?,
    };

    p.eat(TokenKind::Semicolon);
    if !p.at(TokenKind::Eof) {
        return Err(p.error(format!("Unexpected token after lambda: {:?} '{}'", p.peek_kind(), p.peek().text)));
    }

    Ok(program)
}

// ============================================================================
// Closure forms
// ============================================================================

fn parse_caller_closure(p: &mut Parser) -> Result<Program> {
    match p.peek_kind() {
        TokenKind::Function => {
            p.advance();
            // Optional function name
            p.eat(TokenKind::Identifier);
            p.expect(TokenKind::LParen)?;
            let params = parse_param_list(p)?;
            p.expect(TokenKind::RParen)?;
            let body = parse_block(p)?;
            Ok(Program { params, body: Body::Block(body) })
        }
        TokenKind::LParen => {
            p.advance();
            let params = parse_param_list(p)?;
            p.expect(TokenKind::RParen)?;
            p.expect(TokenKind::FatArrow)?;
            Ok(Program { params, body: parse_arrow_body(p)? })
        }
        TokenKind::Identifier if p.peek_nth_kind(1) == TokenKind::FatArrow => {
            let param = p.advance().text.clone();
            p.advance();
            Ok(Program { params: vec![param], body: parse_arrow_body(p)? })
        }
        kind => Err(p.error(format!("Expected a function definition, got {kind:?}"))),
    }
}

fn parse_arrow_body(p: &mut Parser) -> Result<Body> {
    if p.at(TokenKind::LBrace) {
        Ok(Body::Block(parse_block(p)?))
    } else {
        Ok(Body::Expr(parse_expr(p)?))
    }
}

fn parse_param_list(p: &mut Parser) -> Result<Vec<String>> {
    let mut params = Vec::new();
    if !p.at(TokenKind::RParen) {
        params.push(p.expect(TokenKind::Identifier)?.text.clone());
        while p.eat(TokenKind::Comma) {
            params.push(p.expect(TokenKind::Identifier)?.text.clone());
        }
    }
    Ok(params)
}

fn parse_embedded_closure(p: &mut Parser) -> Result<Program> {
    p.expect(TokenKind::LBrace)?;
    let params = match scan_closure_params(p) {
        Some((params, resume)) => {
            p.pos = resume;
            params
        }
        None => vec![IMPLICIT_IT.into()],
    };
    let body = parse_statements(p, TokenKind::RBrace)?;
    p.expect(TokenKind::RBrace)?;
    Ok(Program { params, body: Body::Block(body) })
}

/// Look ahead for `x, y ->` (optionally typed, `Vertex v ->`) at the start
/// of a closure body. Returns the names and the position after the arrow.
fn scan_closure_params(p: &Parser) -> Option<(Vec<String>, usize)> {
    let mut i = p.pos;
    let mut params = Vec::new();
    let mut last: Option<String> = None;
    loop {
        let tok = p.tokens.get(i)?;
        match tok.kind {
            // In `Type name` the last identifier is the name
            TokenKind::Identifier => last = Some(tok.text.clone()),
            TokenKind::Comma => params.push(last.take()?),
            TokenKind::Arrow => {
                if let Some(name) = last.take() {
                    params.push(name);
                }
                return Some((params, i + 1));
            }
            _ => return None,
        }
        i += 1;
    }
}

// ============================================================================
// Statements
// ============================================================================

fn parse_block(p: &mut Parser) -> Result<Vec<Stmt>> {
    p.expect(TokenKind::LBrace)?;
    let stmts = parse_statements(p, TokenKind::RBrace)?;
    p.expect(TokenKind::RBrace)?;
    Ok(stmts)
}

fn parse_statements(p: &mut Parser, end: TokenKind) -> Result<Vec<Stmt>> {
    let mut stmts = Vec::new();
    while !p.at(end) && !p.at(TokenKind::Eof) {
        if p.eat(TokenKind::Semicolon) {
            continue;
        }
        stmts.push(parse_stmt(p)?);
    }
    Ok(stmts)
}

fn parse_stmt(p: &mut Parser) -> Result<Stmt> {
    let stmt = match p.peek_kind() {
        TokenKind::Var | TokenKind::Let | TokenKind::Const | TokenKind::Def => {
            p.advance();
            let name = p.expect(TokenKind::Identifier)?.text.clone();
            let init = if p.eat(TokenKind::Assign) { Some(parse_expr(p)?) } else { None };
            Stmt::Let { name, init }
        }
        TokenKind::Return => {
            p.advance();
            if matches!(p.peek_kind(), TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof) {
                Stmt::Return(None)
            } else {
                Stmt::Return(Some(parse_expr(p)?))
            }
        }
        TokenKind::If => {
            p.advance();
            p.expect(TokenKind::LParen)?;
            let cond = parse_expr(p)?;
            p.expect(TokenKind::RParen)?;
            let then = parse_branch(p)?;
            let otherwise = if p.eat(TokenKind::Else) {
                if p.at(TokenKind::If) { vec![parse_stmt(p)?] } else { parse_branch(p)? }
            } else {
                Vec::new()
            };
            return Ok(Stmt::If { cond, then, otherwise });
        }
        TokenKind::Identifier if p.peek_nth_kind(1) == TokenKind::Assign => {
            let name = p.advance().text.clone();
            p.advance();
            Stmt::Assign { name, value: parse_expr(p)? }
        }
        _ => Stmt::Expr(parse_expr(p)?),
    };
    p.eat(TokenKind::Semicolon);
    Ok(stmt)
}

fn parse_branch(p: &mut Parser) -> Result<Vec<Stmt>> {
    if p.at(TokenKind::LBrace) {
        parse_block(p)
    } else {
        Ok(vec![parse_stmt(p)?])
    }
}

// ============================================================================
// Expression parsing (precedence climbing)
// ============================================================================

fn parse_expr(p: &mut Parser) -> Result<Expr> {
    parse_conditional(p)
}

fn parse_conditional(p: &mut Parser) -> Result<Expr> {
    let cond = parse_or_expr(p)?;
    if !p.eat(TokenKind::Question) {
        return Ok(cond);
    }
    // `?:` arrives as Question + Colon
    if p.eat(TokenKind::Colon) {
        let right = parse_conditional(p)?;
        return Ok(Expr::Binary { left: Box::new(cond), op: BinaryOp::Elvis, right: Box::new(right) });
    }
    let then = parse_conditional(p)?;
    p.expect(TokenKind::Colon)?;
    let otherwise = parse_conditional(p)?;
    Ok(Expr::Conditional { cond: Box::new(cond), then: Box::new(then), otherwise: Box::new(otherwise) })
}

fn parse_or_expr(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_and_expr(p)?;
    while p.eat(TokenKind::OrOr) {
        let right = parse_and_expr(p)?;
        left = Expr::Binary { left: Box::new(left), op: BinaryOp::Or, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_and_expr(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_equality(p)?;
    while p.eat(TokenKind::AndAnd) {
        let right = parse_equality(p)?;
        left = Expr::Binary { left: Box::new(left), op: BinaryOp::And, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_equality(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_comparison(p)?;
    loop {
        let op = match p.peek_kind() {
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::Neq => BinaryOp::Neq,
            TokenKind::StrictEq => BinaryOp::StrictEq,
            TokenKind::StrictNeq => BinaryOp::StrictNeq,
            _ => break,
        };
        p.advance();
        let right = parse_comparison(p)?;
        left = Expr::Binary { left: Box::new(left), op, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_comparison(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_addition(p)?;
    loop {
        let op = match p.peek_kind() {
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Lte => BinaryOp::Lte,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Gte => BinaryOp::Gte,
            _ => break,
        };
        p.advance();
        let right = parse_addition(p)?;
        left = Expr::Binary { left: Box::new(left), op, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_addition(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_multiplication(p)?;
    loop {
        let op = match p.peek_kind() {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            _ => break,
        };
        p.advance();
        let right = parse_multiplication(p)?;
        left = Expr::Binary { left: Box::new(left), op, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_multiplication(p: &mut Parser) -> Result<Expr> {
    let mut left = parse_unary(p)?;
    loop {
        let op = match p.peek_kind() {
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            _ => break,
        };
        p.advance();
        let right = parse_unary(p)?;
        left = Expr::Binary { left: Box::new(left), op, right: Box::new(right) };
    }
    Ok(left)
}

fn parse_unary(p: &mut Parser) -> Result<Expr> {
    if p.eat(TokenKind::Bang) {
        let expr = parse_unary(p)?;
        Ok(Expr::Unary { op: UnaryOp::Not, expr: Box::new(expr) })
    } else if p.eat(TokenKind::Minus) {
        let expr = parse_unary(p)?;
        Ok(Expr::Unary { op: UnaryOp::Negate, expr: Box::new(expr) })
    } else {
        parse_postfix(p)
    }
}

fn parse_postfix(p: &mut Parser) -> Result<Expr> {
    let mut expr = parse_primary(p)?;

    // Member chain: a.get().value("name"), list[0], it?.label()
    loop {
        if p.at(TokenKind::Dot) || p.at(TokenKind::SafeDot) {
            let safe = p.advance().kind == TokenKind::SafeDot;
            let name = p.expect(TokenKind::Identifier)?.text.clone();
            if p.eat(TokenKind::LParen) {
                let args = parse_args(p)?;
                expr = Expr::MethodCall { object: Box::new(expr), method: name, args, safe };
            } else {
                expr = Expr::Member { object: Box::new(expr), name, safe };
            }
        } else if p.eat(TokenKind::LBracket) {
            let index = parse_expr(p)?;
            p.expect(TokenKind::RBracket)?;
            expr = Expr::Index { object: Box::new(expr), index: Box::new(index) };
        } else {
            break;
        }
    }

    Ok(expr)
}

/// Arguments after an opening paren, through the closing paren.
fn parse_args(p: &mut Parser) -> Result<Vec<Expr>> {
    let mut args = Vec::new();
    if !p.at(TokenKind::RParen) {
        args.push(parse_expr(p)?);
        while p.eat(TokenKind::Comma) {
            args.push(parse_expr(p)?);
        }
    }
    p.expect(TokenKind::RParen)?;
    Ok(args)
}

fn parse_primary(p: &mut Parser) -> Result<Expr> {
    match p.peek_kind() {
        TokenKind::Integer => {
            let tok = p.advance();
            let val = tok.text.parse::<i64>().map_err(|_| {
                Error::SyntaxError { position: tok.span.start, message: "Invalid integer".into() }
            })?;
            Ok(Expr::Literal(Literal::Int(val)))
        }
        TokenKind::Float => {
            let tok = p.advance();
            let val = tok.text.parse::<f64>().map_err(|_| {
                Error::SyntaxError { position: tok.span.start, message: "Invalid float".into() }
            })?;
            Ok(Expr::Literal(Literal::Float(val)))
        }
        TokenKind::StringLiteral => {
            let tok = p.advance();
            Ok(Expr::Literal(Literal::String(tok.text.clone())))
        }
        TokenKind::True => {
            p.advance();
            Ok(Expr::Literal(Literal::Bool(true)))
        }
        TokenKind::False => {
            p.advance();
            Ok(Expr::Literal(Literal::Bool(false)))
        }
        TokenKind::Null => {
            p.advance();
            Ok(Expr::Literal(Literal::Null))
        }

        TokenKind::LParen => {
            p.advance();
            let expr = parse_expr(p)?;
            p.expect(TokenKind::RParen)?;
            Ok(expr)
        }

        TokenKind::LBracket => {
            p.advance();
            let mut items = Vec::new();
            if !p.at(TokenKind::RBracket) {
                items.push(parse_expr(p)?);
                while p.eat(TokenKind::Comma) {
                    items.push(parse_expr(p)?);
                }
            }
            p.expect(TokenKind::RBracket)?;
            Ok(Expr::List(items))
        }

        TokenKind::Identifier => {
            if p.peek_nth_kind(1) == TokenKind::LParen {
                return Err(p.error(format!("Call to '{}' needs a receiver", p.peek().text)));
            }
            let tok = p.advance();
            Ok(Expr::Variable(tok.text.clone()))
        }

        _ => Err(p.error(format!("Unexpected token in expression: {:?} '{}'", p.peek_kind(), p.peek().text))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn parse(src: &str, dialect: Dialect, mode: ClosureMode) -> Result<Program> {
        let tokens = tokenize(src, dialect)?;
        parse_program(&tokens, dialect, mode)
    }

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Variable(name.into()))
    }

    fn string(s: &str) -> Expr {
        Expr::Literal(Literal::String(s.into()))
    }

    #[test]
    fn test_caller_expression() {
        let program = parse(r#"a.get().value("name") == "lop""#, Dialect::Caller, ClosureMode::Expression).unwrap();
        assert_eq!(program.params, vec!["a"]);
        let expected = Expr::Binary {
            left: Box::new(Expr::MethodCall {
                object: Box::new(Expr::MethodCall {
                    object: var("a"),
                    method: "get".into(),
                    args: vec![],
                    safe: false,
                }),
                method: "value".into(),
                args: vec![string("name")],
                safe: false,
            }),
            op: BinaryOp::Eq,
            right: Box::new(string("lop")),
        };
        assert_eq!(program.body, Body::Expr(expected));
    }

    #[test]
    fn test_embedded_closure_with_param() {
        let program = parse("{ vertex -> vertex.value('name').length() }", Dialect::Embedded, ClosureMode::Closure).unwrap();
        assert_eq!(program.params, vec!["vertex"]);
        match program.body {
            Body::Block(stmts) => assert_eq!(stmts.len(), 1),
            other => panic!("Expected block, got {other:?}"),
        }
    }

    #[test]
    fn test_embedded_closure_implicit_it() {
        let program = parse("{ it.label() }", Dialect::Embedded, ClosureMode::Closure).unwrap();
        assert_eq!(program.params, vec!["it"]);
    }

    #[test]
    fn test_embedded_closure_typed_params() {
        let program = parse("{ Vertex v, int n -> n }", Dialect::Embedded, ClosureMode::Closure).unwrap();
        assert_eq!(program.params, vec!["v", "n"]);
        let program = parse("{ -> 42 }", Dialect::Embedded, ClosureMode::Closure).unwrap();
        assert!(program.params.is_empty());
    }

    #[test]
    fn test_caller_function_forms() {
        let f = parse("function (t) { return t.get(); }", Dialect::Caller, ClosureMode::Closure).unwrap();
        assert_eq!(f.params, vec!["t"]);
        let named = parse("function pick(x, y) { return x; }", Dialect::Caller, ClosureMode::Closure).unwrap();
        assert_eq!(named.params, vec!["x", "y"]);
        let arrow = parse("(t) => t.get()", Dialect::Caller, ClosureMode::Closure).unwrap();
        assert!(matches!(arrow.body, Body::Expr(_)));
        let bare = parse("t => { return 1; }", Dialect::Caller, ClosureMode::Closure).unwrap();
        assert_eq!(bare.params, vec!["t"]);
        assert!(matches!(bare.body, Body::Block(_)));
    }

    #[test]
    fn test_statements() {
        let src = "function (t) { var n = t.get().value('name'); if (n.length > 3) { return 'long'; } else return 'short'; }";
        let program = parse(src, Dialect::Caller, ClosureMode::Closure).unwrap();
        match program.body {
            Body::Block(stmts) => {
                assert!(matches!(stmts[0], Stmt::Let { .. }));
                match &stmts[1] {
                    Stmt::If { then, otherwise, .. } => {
                        assert_eq!(then.len(), 1);
                        assert_eq!(otherwise.len(), 1);
                    }
                    other => panic!("Expected if, got {other:?}"),
                }
            }
            other => panic!("Expected block, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        let program = parse("1 + 2 * 3", Dialect::Caller, ClosureMode::Expression).unwrap();
        match program.body {
            Body::Expr(Expr::Binary { op: BinaryOp::Add, right, .. }) => {
                assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("Expected addition, got {other:?}"),
        }
    }

    #[test]
    fn test_conditional_and_elvis() {
        let program = parse("a ? 1 : 2", Dialect::Caller, ClosureMode::Expression).unwrap();
        assert!(matches!(program.body, Body::Expr(Expr::Conditional { .. })));
        let program = parse("a.value('nick') ?: 'none'", Dialect::Embedded, ClosureMode::Expression).unwrap();
        assert!(matches!(program.body, Body::Expr(Expr::Binary { op: BinaryOp::Elvis, .. })));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse("a.get(", Dialect::Caller, ClosureMode::Expression).is_err());
        assert!(parse("", Dialect::Caller, ClosureMode::Expression).is_err());
        assert!(parse("a b", Dialect::Caller, ClosureMode::Expression).is_err());
        assert!(parse("{ it.value('x') ", Dialect::Embedded, ClosureMode::Closure).is_err());
        assert!(parse("a.value('x')", Dialect::Caller, ClosureMode::Closure).is_err());
        assert!(parse("print(a)", Dialect::Caller, ClosureMode::Expression).is_err());
    }
}
