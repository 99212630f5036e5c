//! Object table of the reference runtime.
//!
//! Every value that crosses the boundary by reference lives here under a
//! numeric id. Graph elements are interned so the same vertex always comes
//! back as the same reference. Id 0 is the runtime root.

use hashbrown::HashMap;
use std::rc::Rc;

use tracing::debug;

use crate::model::{ObjectRef, Value};
use crate::remote::{classes, Args, FaultResult, RemoteFault};
use crate::script::{ClosureMode, Dialect, MethodHost};

use super::graph::{self, ElementId, TinkerGraph};
use super::lambda::LambdaObject;
use super::traversal::{Source, TraversalState};

// ============================================================================
// Objects
// ============================================================================

/// Classes reachable through `importClass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    TinkerGraph,
    TinkerFactory,
    Anonymous,
    Lambda,
}

impl ClassKind {
    fn resolve(name: &str) -> Option<Self> {
        match name {
            classes::TINKER_GRAPH => Some(ClassKind::TinkerGraph),
            classes::TINKER_FACTORY => Some(ClassKind::TinkerFactory),
            classes::ANONYMOUS => Some(ClassKind::Anonymous),
            classes::LAMBDA => Some(ClassKind::Lambda),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ClassKind::TinkerGraph => classes::TINKER_GRAPH,
            ClassKind::TinkerFactory => classes::TINKER_FACTORY,
            ClassKind::Anonymous => classes::ANONYMOUS,
            ClassKind::Lambda => classes::LAMBDA,
        }
    }
}

/// Owner of a plain key/value property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyOwner {
    Edge(usize),
    /// Meta-property of the vertex property `id` on vertex `vertex`.
    Meta { vertex: usize, id: ElementId },
}

/// Address of a graph element inside a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Vertex { graph: u64, slot: usize },
    Edge { graph: u64, slot: usize },
    VertexProperty { graph: u64, vertex: usize, id: ElementId },
    Property { graph: u64, owner: PropertyOwner, key: String },
}

impl ElementRef {
    pub fn graph(&self) -> u64 {
        match self {
            ElementRef::Vertex { graph, .. }
            | ElementRef::Edge { graph, .. }
            | ElementRef::VertexProperty { graph, .. }
            | ElementRef::Property { graph, .. } => *graph,
        }
    }

    fn class_name(&self) -> &'static str {
        match self {
            ElementRef::Vertex { .. } => "TinkerVertex",
            ElementRef::Edge { .. } => "TinkerEdge",
            ElementRef::VertexProperty { .. } => "TinkerVertexProperty",
            ElementRef::Property { .. } => "TinkerProperty",
        }
    }
}

#[derive(Debug)]
pub enum Object {
    Runtime,
    Class(ClassKind),
    Graph,
    Element(ElementRef),
    Traversal(TraversalState),
    /// Transient wrapper handed to filter and map lambdas.
    Traverser(Value),
    Lambda(Rc<LambdaObject>),
}

impl Object {
    fn class_name(&self) -> &'static str {
        match self {
            Object::Runtime => "Runtime",
            Object::Class(_) => "Class",
            Object::Graph => "TinkerGraph",
            Object::Element(e) => e.class_name(),
            Object::Traversal(_) => "DefaultGraphTraversal",
            Object::Traverser(_) => "Traverser",
            Object::Lambda(_) => "ScriptLambda",
        }
    }
}

pub(super) fn fault(class: &str, message: impl Into<String>) -> RemoteFault {
    RemoteFault::invocation(class, message)
}

pub(super) fn illegal_argument(message: impl Into<String>) -> RemoteFault {
    fault("IllegalArgumentException", message)
}

pub(super) fn no_such_method(class: &str, method: &str) -> RemoteFault {
    fault("NoSuchMethodException", format!("{class}.{method}"))
}

pub(super) fn arg<'a>(args: &'a [Value], index: usize, method: &str) -> FaultResult<&'a Value> {
    args.get(index)
        .ok_or_else(|| illegal_argument(format!("{method} expects at least {} argument(s)", index + 1)))
}

pub(super) fn string_arg(args: &[Value], index: usize, method: &str) -> FaultResult<String> {
    match arg(args, index, method)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(illegal_argument(format!("{method} expects a string, got {other}"))),
    }
}

/// Flatten string arguments, accepting a single list in place of varargs.
pub(super) fn string_args(args: &[Value]) -> FaultResult<Vec<String>> {
    let mut out = Vec::with_capacity(args.len());
    for value in flatten(args) {
        match value {
            Value::String(s) => out.push(s.clone()),
            other => return Err(illegal_argument(format!("Expected a string, got {other}"))),
        }
    }
    Ok(out)
}

/// Varargs passed as one list count as the list's items.
pub(super) fn flatten(args: &[Value]) -> Vec<&Value> {
    args.iter()
        .flat_map(|a| match a {
            Value::List(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}

// ============================================================================
// Heap
// ============================================================================

#[derive(Debug)]
pub struct Heap {
    pub(super) objects: HashMap<u64, Object>,
    pub(super) graphs: HashMap<u64, TinkerGraph>,
    interned: HashMap<ElementRef, u64>,
    class_objects: HashMap<ClassKind, u64>,
    next_id: u64,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    pub fn new() -> Self {
        let mut objects = HashMap::new();
        objects.insert(ObjectRef::RUNTIME_ID, Object::Runtime);
        Self {
            objects,
            graphs: HashMap::new(),
            interned: HashMap::new(),
            class_objects: HashMap::new(),
            next_id: ObjectRef::RUNTIME_ID + 1,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub(super) fn alloc(&mut self, object: Object) -> ObjectRef {
        let id = self.next_id;
        self.next_id += 1;
        let reference = ObjectRef::new(id, object.class_name());
        self.objects.insert(id, object);
        reference
    }

    pub(super) fn release(&mut self, reference: &ObjectRef) {
        self.objects.remove(&reference.id());
    }

    /// Reference for an element, reusing the existing id when there is one.
    pub(super) fn intern(&mut self, element: ElementRef) -> ObjectRef {
        let class = element.class_name();
        if let Some(id) = self.interned.get(&element) {
            return ObjectRef::new(*id, class);
        }
        let reference = self.alloc(Object::Element(element.clone()));
        self.interned.insert(element, reference.id());
        reference
    }

    pub(super) fn intern_value(&mut self, element: ElementRef) -> Value {
        Value::Object(self.intern(element))
    }

    pub(super) fn object(&self, reference: &ObjectRef) -> FaultResult<&Object> {
        self.objects.get(&reference.id()).ok_or_else(|| {
            fault("NoSuchObjectException", format!("{reference} has been released"))
        })
    }

    pub(super) fn graph(&self, id: u64) -> FaultResult<&TinkerGraph> {
        self.graphs
            .get(&id)
            .ok_or_else(|| fault("IllegalStateException", format!("Graph {id} is closed")))
    }

    pub(super) fn graph_mut(&mut self, id: u64) -> FaultResult<&mut TinkerGraph> {
        self.graphs
            .get_mut(&id)
            .ok_or_else(|| fault("IllegalStateException", format!("Graph {id} is closed")))
    }

    /// Resolve an argument that must be a graph element.
    pub(super) fn element_of(&self, value: &Value) -> FaultResult<ElementRef> {
        match value {
            Value::Object(reference) => match self.object(reference)? {
                Object::Element(element) => Ok(element.clone()),
                other => Err(illegal_argument(format!("Expected an element, got {}", other.class_name()))),
            },
            other => Err(illegal_argument(format!("Expected an element, got {other}"))),
        }
    }

    /// Drop a graph together with everything derived from it.
    pub(super) fn release_graph(&mut self, graph: u64) {
        self.graphs.remove(&graph);
        self.interned.retain(|element, _| element.graph() != graph);
        self.objects.retain(|id, object| match object {
            Object::Graph => *id != graph,
            Object::Element(element) => element.graph() != graph,
            Object::Traversal(state) => state.graph != Some(graph),
            _ => true,
        });
        debug!(graph, objects = self.objects.len(), "graph released");
    }

    /// Drop every object except the root.
    pub fn clear(&mut self) {
        self.objects.retain(|id, _| *id == ObjectRef::RUNTIME_ID);
        self.graphs.clear();
        self.interned.clear();
        self.class_objects.clear();
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    pub fn dispatch(&mut self, target: &ObjectRef, method: &str, args: Args) -> FaultResult<Value> {
        match method {
            "toString" => return self.describe(target).map(Value::String),
            "equals" => {
                self.object(target)?;
                let same = matches!(args.first(), Some(Value::Object(other)) if other == target);
                return Ok(Value::Bool(same));
            }
            "hashCode" => {
                self.object(target)?;
                return Ok(Value::Int(target.id() as i64));
            }
            _ => {}
        }

        match self.object(target)? {
            Object::Runtime => self.runtime_method(method, &args),
            Object::Class(kind) => {
                let kind = *kind;
                self.class_method(kind, method, args)
            }
            Object::Graph => self.graph_method(target.id(), method, &args),
            Object::Element(element) => {
                let element = element.clone();
                self.element_method(element, method, &args)
            }
            Object::Traversal(_) => self.traversal_method(target, method, args),
            Object::Traverser(value) => match method {
                "get" => Ok(value.clone()),
                _ => Err(no_such_method("Traverser", method)),
            },
            Object::Lambda(lambda) => {
                let lambda = Rc::clone(lambda);
                match method {
                    "apply" => lambda.apply(self, &args),
                    "source" => Ok(Value::String(lambda.source.clone())),
                    _ => Err(no_such_method("ScriptLambda", method)),
                }
            }
        }
    }

    fn describe(&self, target: &ObjectRef) -> FaultResult<String> {
        Ok(match self.object(target)? {
            Object::Runtime => "Runtime".to_owned(),
            Object::Class(kind) => format!("class {}", kind.name()),
            Object::Graph => {
                let g = self.graph(target.id())?;
                format!("tinkergraph[vertices:{} edges:{}]", g.vertex_count(), g.edge_count())
            }
            Object::Element(element) => self.describe_element(element)?,
            Object::Traversal(state) => state.to_string(),
            Object::Traverser(value) => value.to_string(),
            Object::Lambda(lambda) => format!("ScriptLambda[{}:{}] {}", lambda.dialect, lambda.mode, lambda.source),
        })
    }

    fn runtime_method(&mut self, method: &str, args: &[Value]) -> FaultResult<Value> {
        match method {
            classes::IMPORT_CLASS => {
                let name = string_arg(args, 0, method)?;
                let kind = ClassKind::resolve(&name)
                    .ok_or_else(|| fault("ClassNotFoundException", name.clone()))?;
                if let Some(id) = self.class_objects.get(&kind) {
                    return Ok(Value::Object(ObjectRef::new(*id, "Class")));
                }
                let reference = self.alloc(Object::Class(kind));
                self.class_objects.insert(kind, reference.id());
                Ok(Value::Object(reference))
            }
            _ => Err(no_such_method("Runtime", method)),
        }
    }

    fn class_method(&mut self, kind: ClassKind, method: &str, args: Args) -> FaultResult<Value> {
        match (kind, method) {
            (ClassKind::TinkerGraph, "open") => Ok(self.open_graph(TinkerGraph::new())),
            (ClassKind::TinkerFactory, "createClassic") => Ok(self.open_graph(graph::create_classic()?)),
            (ClassKind::TinkerFactory, "createModern") => Ok(self.open_graph(graph::create_modern()?)),
            (ClassKind::Anonymous, "start") => Ok(Value::Object(self.new_traversal(None, Source::Anonymous))),
            (ClassKind::Anonymous, step) => {
                let traversal = self.new_traversal(None, Source::Anonymous);
                self.traversal_method(&traversal, step, args)
            }
            (ClassKind::Lambda, "new") => {
                let dialect: Dialect = string_arg(&args, 0, method)?
                    .parse()
                    .map_err(|e| illegal_argument(format!("{e}")))?;
                let mode: ClosureMode = string_arg(&args, 1, method)?
                    .parse()
                    .map_err(|e| illegal_argument(format!("{e}")))?;
                let source = string_arg(&args, 2, method)?;
                let lambda = LambdaObject::new(dialect, mode, source);
                Ok(Value::Object(self.alloc(Object::Lambda(Rc::new(lambda)))))
            }
            (kind, method) => Err(no_such_method(kind.name(), method)),
        }
    }

    fn open_graph(&mut self, graph: TinkerGraph) -> Value {
        let reference = self.alloc(Object::Graph);
        debug!(graph = reference.id(), vertices = graph.vertex_count(), "graph opened");
        self.graphs.insert(reference.id(), graph);
        Value::Object(reference)
    }

    fn graph_method(&mut self, graph: u64, method: &str, args: &[Value]) -> FaultResult<Value> {
        match method {
            "V" | "E" => {
                let mut ids = Vec::new();
                for value in flatten(args) {
                    let id = match value {
                        Value::Object(_) => self.element_id(&self.element_of(value)?)?,
                        other => ElementId::from_value(other)
                            .ok_or_else(|| illegal_argument(format!("Unsupported id: {other}")))?,
                    };
                    ids.push(id);
                }
                let source = if method == "V" { Source::Vertices(ids) } else { Source::Edges(ids) };
                Ok(Value::Object(self.new_traversal(Some(graph), source)))
            }
            "addVertex" => {
                let slot = self.graph_mut(graph)?.add_vertex(args)?;
                Ok(self.intern_value(ElementRef::Vertex { graph, slot }))
            }
            "close" => {
                self.release_graph(graph);
                Ok(Value::Null)
            }
            _ => Err(no_such_method("TinkerGraph", method)),
        }
    }
}

impl MethodHost for Heap {
    fn call_method(&mut self, target: &ObjectRef, method: &str, args: Args) -> FaultResult<Value> {
        self.dispatch(target, method, args)
    }
}
