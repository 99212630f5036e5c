//! Traversals inside the reference runtime.
//!
//! A traversal is a start source plus an ordered list of steps. Steps are
//! appended one call at a time; the first terminal call evaluates every
//! step stage by stage and buffers the results, after which the traversal
//! is locked against further steps.

use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use hashbrown::HashSet;
use tracing::trace;

use crate::model::{ObjectRef, Value};
use crate::remote::{Args, FaultResult};
use crate::script;

use super::graph::{Direction, ElementId, ID_TOKEN, LABEL_TOKEN};
use super::heap::{arg, fault, flatten, illegal_argument, no_such_method, string_arg, string_args, ElementRef, Heap, Object};
use super::lambda::LambdaObject;

// ============================================================================
// Steps
// ============================================================================

#[derive(Debug, Clone)]
pub enum Source {
    Vertices(Vec<ElementId>),
    Edges(Vec<ElementId>),
    /// `__`: steps only, spliced into another traversal.
    Anonymous,
}

/// A step argument that computes something per traverser.
#[derive(Debug, Clone)]
pub enum Func {
    Lambda(Rc<LambdaObject>),
    Traversal(Vec<Step>),
}

#[derive(Debug, Clone)]
pub enum Step {
    Values(Vec<String>),
    Properties(Vec<String>),
    Id,
    Label,
    Has { label: Option<String>, key: String, value: Option<Value> },
    HasLabel(Vec<String>),
    HasNot(String),
    HasId(Vec<Value>),
    Filter(Func),
    Map(Func),
    /// With `binary`, the key is the truthiness of `func` and options are
    /// keyed `true`/`false`.
    Choose { func: Func, options: Vec<(Value, Vec<Step>)>, binary: bool },
    Vertices(Direction, Vec<String>),
    Edges(Direction, Vec<String>),
    EdgeVertex(Direction),
    Dedup,
    Limit(usize),
    Count,
    Fold,
    Identity,
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Values(_) => "values",
            Step::Properties(_) => "properties",
            Step::Id => "id",
            Step::Label => "label",
            Step::Has { .. } => "has",
            Step::HasLabel(_) => "hasLabel",
            Step::HasNot(_) => "hasNot",
            Step::HasId(_) => "hasId",
            Step::Filter(_) => "filter",
            Step::Map(_) => "map",
            Step::Choose { .. } => "choose",
            Step::Vertices(Direction::Out, _) => "out",
            Step::Vertices(Direction::In, _) => "in",
            Step::Vertices(Direction::Both, _) => "both",
            Step::Edges(Direction::Out, _) => "outE",
            Step::Edges(Direction::In, _) => "inE",
            Step::Edges(Direction::Both, _) => "bothE",
            Step::EdgeVertex(Direction::Out) => "outV",
            Step::EdgeVertex(Direction::In) => "inV",
            Step::EdgeVertex(Direction::Both) => "bothV",
            Step::Dedup => "dedup",
            Step::Limit(_) => "limit",
            Step::Count => "count",
            Step::Fold => "fold",
            Step::Identity => "identity",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Values(keys) | Step::Properties(keys) | Step::HasLabel(keys) => {
                write!(f, "{}({})", self.name(), keys.join(","))
            }
            Step::Vertices(_, labels) | Step::Edges(_, labels) => write!(f, "{}({})", self.name(), labels.join(",")),
            Step::Has { key, value: Some(v), .. } => write!(f, "has({key},{v})"),
            Step::Has { key, value: None, .. } | Step::HasNot(key) => write!(f, "{}({key})", self.name()),
            Step::Limit(n) => write!(f, "limit({n})"),
            _ => write!(f, "{}()", self.name()),
        }
    }
}

#[derive(Debug)]
pub struct TraversalState {
    pub graph: Option<u64>,
    pub source: Source,
    pub steps: Vec<Step>,
    results: Option<VecDeque<Value>>,
}

impl TraversalState {
    pub fn is_started(&self) -> bool {
        self.results.is_some()
    }
}

impl fmt::Display for TraversalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = match &self.source {
            Source::Vertices(_) => "V()",
            Source::Edges(_) => "E()",
            Source::Anonymous => "__()",
        };
        write!(f, "[{start}")?;
        for step in &self.steps {
            write!(f, ", {step}")?;
        }
        f.write_str("]")
    }
}

fn direction_of(method: &str) -> Direction {
    match method {
        "out" | "outE" | "outV" => Direction::Out,
        "in" | "inE" | "inV" => Direction::In,
        _ => Direction::Both,
    }
}

/// Hashes and compares by `loose_eq`.
struct Loose<'a>(&'a Value);

impl PartialEq for Loose<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.loose_eq(other.0)
    }
}

impl Eq for Loose<'_> {}

impl Hash for Loose<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.loose_hash(state);
    }
}

/// First occurrence of each loosely distinct value, in order.
fn dedup(items: &[Value]) -> Vec<Value> {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().filter(|item| seen.insert(Loose(*item))).cloned().collect()
}

// ============================================================================
// Building
// ============================================================================

impl Heap {
    pub(super) fn new_traversal(&mut self, graph: Option<u64>, source: Source) -> ObjectRef {
        self.alloc(Object::Traversal(TraversalState { graph, source, steps: Vec::new(), results: None }))
    }

    fn traversal_state(&mut self, target: &ObjectRef) -> FaultResult<&mut TraversalState> {
        match self.objects.get_mut(&target.id()) {
            Some(Object::Traversal(state)) => Ok(state),
            Some(_) => Err(illegal_argument(format!("{target} is not a traversal"))),
            None => Err(fault("NoSuchObjectException", format!("{target} has been released"))),
        }
    }

    fn unstarted_state(&mut self, target: &ObjectRef) -> FaultResult<&mut TraversalState> {
        let state = self.traversal_state(target)?;
        if state.is_started() {
            return Err(fault(
                "IllegalStateException",
                "The traversal strategies are complete and the traversal can no longer be modulated",
            ));
        }
        Ok(state)
    }

    pub(super) fn traversal_method(&mut self, target: &ObjectRef, method: &str, args: Args) -> FaultResult<Value> {
        match method {
            "hasNext" => {
                self.materialize(target)?;
                let state = self.traversal_state(target)?;
                Ok(Value::Bool(state.results.as_ref().is_some_and(|r| !r.is_empty())))
            }
            "next" => {
                self.materialize(target)?;
                let state = self.traversal_state(target)?;
                state
                    .results
                    .as_mut()
                    .and_then(VecDeque::pop_front)
                    .ok_or_else(|| fault("NoSuchElementException", "The traversal has no more results"))
            }
            "toList" | "iterate" => {
                self.materialize(target)?;
                let state = self.traversal_state(target)?;
                let drained: Vec<Value> = state.results.as_mut().map(|r| r.drain(..).collect()).unwrap_or_default();
                Ok(if method == "toList" { Value::List(drained) } else { Value::Null })
            }
            "option" => {
                let key = arg(&args, 0, method)?.clone();
                let branch = self.anonymous_steps(arg(&args, 1, method)?)?;
                let state = self.unstarted_state(target)?;
                match state.steps.last_mut() {
                    Some(Step::Choose { options, .. }) => options.push((key, branch)),
                    _ => return Err(illegal_argument("option() must follow choose()")),
                }
                Ok(Value::Object(target.clone()))
            }
            _ => {
                let step = self.parse_step(method, &args)?;
                self.unstarted_state(target)?.steps.push(step);
                Ok(Value::Object(target.clone()))
            }
        }
    }

    fn parse_step(&self, method: &str, args: &[Value]) -> FaultResult<Step> {
        Ok(match method {
            "values" => Step::Values(string_args(args)?),
            "properties" => Step::Properties(string_args(args)?),
            "id" => Step::Id,
            "label" => Step::Label,
            "has" => match args.len() {
                1 => Step::Has { label: None, key: string_arg(args, 0, method)?, value: None },
                2 => Step::Has { label: None, key: string_arg(args, 0, method)?, value: Some(args[1].clone()) },
                3 => Step::Has {
                    label: Some(string_arg(args, 0, method)?),
                    key: string_arg(args, 1, method)?,
                    value: Some(args[2].clone()),
                },
                n => return Err(illegal_argument(format!("has() takes 1 to 3 arguments, got {n}"))),
            },
            "hasLabel" => Step::HasLabel(string_args(args)?),
            "hasNot" => Step::HasNot(string_arg(args, 0, method)?),
            "hasId" => Step::HasId(flatten(args).into_iter().cloned().collect()),
            "filter" => Step::Filter(self.func_arg(arg(args, 0, method)?)?),
            "map" => Step::Map(self.func_arg(arg(args, 0, method)?)?),
            "choose" => {
                let func = self.func_arg(arg(args, 0, method)?)?;
                match args.len() {
                    1 => Step::Choose { func, options: Vec::new(), binary: false },
                    3 => Step::Choose {
                        func,
                        options: vec![
                            (Value::Bool(true), self.anonymous_steps(&args[1])?),
                            (Value::Bool(false), self.anonymous_steps(&args[2])?),
                        ],
                        binary: true,
                    },
                    n => return Err(illegal_argument(format!("choose() takes 1 or 3 arguments, got {n}"))),
                }
            }
            "out" | "in" | "both" => Step::Vertices(direction_of(method), string_args(args)?),
            "outE" | "inE" | "bothE" => Step::Edges(direction_of(method), string_args(args)?),
            "outV" | "inV" | "bothV" => Step::EdgeVertex(direction_of(method)),
            "dedup" => Step::Dedup,
            "limit" => {
                let n = arg(args, 0, method)?
                    .as_int()
                    .filter(|n| *n >= 0)
                    .ok_or_else(|| illegal_argument("limit() expects a non-negative integer"))?;
                Step::Limit(n as usize)
            }
            "count" => Step::Count,
            "fold" => Step::Fold,
            "identity" => Step::Identity,
            _ => return Err(no_such_method("GraphTraversal", method)),
        })
    }

    fn func_arg(&self, value: &Value) -> FaultResult<Func> {
        if let Value::Object(reference) = value {
            match self.object(reference)? {
                Object::Lambda(lambda) => return Ok(Func::Lambda(Rc::clone(lambda))),
                Object::Traversal(state) => return Ok(Func::Traversal(state.steps.clone())),
                _ => {}
            }
        }
        Err(illegal_argument(format!("Expected a lambda or traversal, got {value}")))
    }

    fn anonymous_steps(&self, value: &Value) -> FaultResult<Vec<Step>> {
        if let Value::Object(reference) = value {
            if let Object::Traversal(state) = self.object(reference)? {
                return Ok(state.steps.clone());
            }
        }
        Err(illegal_argument(format!("Expected a traversal, got {value}")))
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Evaluate on first use. A failed evaluation leaves the traversal
    /// started and empty.
    fn materialize(&mut self, target: &ObjectRef) -> FaultResult<()> {
        let state = self.traversal_state(target)?;
        if state.is_started() {
            return Ok(());
        }
        let graph = state.graph;
        let source = state.source.clone();
        let steps = state.steps.clone();
        state.results = Some(VecDeque::new());

        let graph = graph.ok_or_else(|| fault("IllegalStateException", "Anonymous traversals can not be iterated"))?;
        let start = self.source_items(graph, &source)?;
        let results = self.run_steps(start, &steps)?;
        trace!(traversal = target.id(), results = results.len(), "traversal evaluated");
        self.traversal_state(target)?.results = Some(results.into());
        Ok(())
    }

    fn source_items(&mut self, graph: u64, source: &Source) -> FaultResult<Vec<Value>> {
        let g = self.graph(graph)?;
        let elements: Vec<ElementRef> = match source {
            Source::Vertices(ids) if ids.is_empty() => {
                g.vertex_slots().into_iter().map(|slot| ElementRef::Vertex { graph, slot }).collect()
            }
            Source::Vertices(ids) => ids
                .iter()
                .filter_map(|id| g.find_vertex(id))
                .map(|slot| ElementRef::Vertex { graph, slot })
                .collect(),
            Source::Edges(ids) if ids.is_empty() => {
                g.edge_slots().into_iter().map(|slot| ElementRef::Edge { graph, slot }).collect()
            }
            Source::Edges(ids) => ids
                .iter()
                .filter_map(|id| g.find_edge(id))
                .map(|slot| ElementRef::Edge { graph, slot })
                .collect(),
            Source::Anonymous => return Err(fault("IllegalStateException", "Anonymous traversals have no source")),
        };
        Ok(elements.into_iter().map(|e| self.intern_value(e)).collect())
    }

    fn run_steps(&mut self, mut items: Vec<Value>, steps: &[Step]) -> FaultResult<Vec<Value>> {
        for step in steps {
            items = self.apply_step(items, step)?;
        }
        Ok(items)
    }

    fn apply_step(&mut self, items: Vec<Value>, step: &Step) -> FaultResult<Vec<Value>> {
        let mut out = Vec::with_capacity(items.len());
        match step {
            Step::Values(keys) => {
                for item in &items {
                    out.extend(self.element_values(&self.element_of(item)?, keys)?);
                }
            }
            Step::Properties(keys) => {
                for item in &items {
                    let element = self.element_of(item)?;
                    out.extend(self.element_properties(&element, keys)?);
                }
            }
            Step::Id => {
                for item in &items {
                    out.push(self.element_id(&self.element_of(item)?)?.to_value());
                }
            }
            Step::Label => {
                for item in &items {
                    out.push(Value::String(self.element_label(&self.element_of(item)?)?));
                }
            }
            Step::Has { label, key, value } => {
                for item in items {
                    let element = self.element_of(&item)?;
                    let label_ok = match label {
                        Some(l) => self.element_label(&element)? == *l,
                        None => true,
                    };
                    if label_ok && self.has_property(&element, key, value.as_ref())? {
                        out.push(item);
                    }
                }
            }
            Step::HasLabel(labels) => {
                for item in items {
                    if labels.contains(&self.element_label(&self.element_of(&item)?)?) {
                        out.push(item);
                    }
                }
            }
            Step::HasNot(key) => {
                for item in items {
                    if !self.has_property(&self.element_of(&item)?, key, None)? {
                        out.push(item);
                    }
                }
            }
            Step::HasId(ids) => {
                for item in items {
                    let id = self.element_id(&self.element_of(&item)?)?.to_value();
                    if ids.iter().any(|candidate| candidate.loose_eq(&id)) {
                        out.push(item);
                    }
                }
            }
            Step::Filter(func) => {
                for item in items {
                    if self.test(func, &item)? {
                        out.push(item);
                    }
                }
            }
            Step::Map(func) => {
                for item in &items {
                    out.extend(self.call_func(func, item, true)?);
                }
            }
            Step::Choose { func, options, binary } => {
                for item in items {
                    let key = if *binary {
                        Value::Bool(self.test(func, &item)?)
                    } else {
                        self.call_func(func, &item, false)?.unwrap_or(Value::Null)
                    };
                    // Traversers with no matching option are dropped
                    if let Some((_, branch)) = options.iter().find(|(k, _)| k.loose_eq(&key)) {
                        out.extend(self.run_steps(vec![item], branch)?);
                    }
                }
            }
            Step::Vertices(direction, labels) => {
                for item in &items {
                    let (graph, slot) = self.vertex_slot(item)?;
                    let adjacent = self.graph(graph)?.adjacent(slot, *direction, labels)?;
                    for adjacent in adjacent {
                        out.push(self.intern_value(ElementRef::Vertex { graph, slot: adjacent }));
                    }
                }
            }
            Step::Edges(direction, labels) => {
                for item in &items {
                    let (graph, slot) = self.vertex_slot(item)?;
                    let edges = self.graph(graph)?.incident_edges(slot, *direction, labels)?;
                    for edge in edges {
                        out.push(self.intern_value(ElementRef::Edge { graph, slot: edge }));
                    }
                }
            }
            Step::EdgeVertex(direction) => {
                for item in &items {
                    let (graph, slot) = match self.element_of(item)? {
                        ElementRef::Edge { graph, slot } => (graph, slot),
                        _ => return Err(illegal_argument(format!("{} expects edges", step.name()))),
                    };
                    let edge = self.graph(graph)?.edge(slot)?;
                    let ends = match direction {
                        Direction::Out => vec![edge.out_v],
                        Direction::In => vec![edge.in_v],
                        Direction::Both => vec![edge.out_v, edge.in_v],
                    };
                    for vertex in ends {
                        out.push(self.intern_value(ElementRef::Vertex { graph, slot: vertex }));
                    }
                }
            }
            Step::Dedup => out = dedup(&items),
            Step::Limit(n) => out.extend(items.into_iter().take(*n)),
            Step::Count => out.push(Value::from(items.len())),
            Step::Fold => out.push(Value::List(items)),
            Step::Identity => out = items,
        }
        Ok(out)
    }

    fn vertex_slot(&self, item: &Value) -> FaultResult<(u64, usize)> {
        match self.element_of(item)? {
            ElementRef::Vertex { graph, slot } => Ok((graph, slot)),
            _ => Err(illegal_argument(format!("Expected a vertex, got {item}"))),
        }
    }

    fn has_property(&self, element: &ElementRef, key: &str, value: Option<&Value>) -> FaultResult<bool> {
        let values = match key {
            ID_TOKEN => vec![self.element_id(element)?.to_value()],
            LABEL_TOKEN => vec![Value::String(self.element_label(element)?)],
            _ => self.element_values(element, &[key.to_owned()])?,
        };
        Ok(match value {
            Some(expected) => values.iter().any(|v| v.loose_eq(expected)),
            None => !values.is_empty(),
        })
    }

    fn test(&mut self, func: &Func, item: &Value) -> FaultResult<bool> {
        let result = self.call_func(func, item, true)?;
        Ok(match (func, result) {
            (Func::Lambda(lambda), Some(value)) => script::eval::truthy(lambda.dialect, &value),
            (Func::Traversal(_), Some(_)) => true,
            (_, None) => false,
        })
    }

    /// Run a lambda or nested traversal for one item. With `wrap`, lambdas
    /// receive a traverser whose `get()` yields the item.
    fn call_func(&mut self, func: &Func, item: &Value, wrap: bool) -> FaultResult<Option<Value>> {
        match func {
            Func::Lambda(lambda) => {
                if !wrap {
                    return lambda.apply(self, std::slice::from_ref(item)).map(Some);
                }
                let traverser = self.alloc(Object::Traverser(item.clone()));
                let result = lambda.apply(self, &[Value::Object(traverser.clone())]);
                self.release(&traverser);
                result.map(Some)
            }
            Func::Traversal(steps) => Ok(self.run_steps(vec![item.clone()], steps)?.into_iter().next()),
        }
    }
}
