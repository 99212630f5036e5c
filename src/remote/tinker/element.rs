//! Methods on vertices, edges and their properties.

use crate::model::Value;
use crate::remote::FaultResult;

use super::graph::{ElementId, TinkerGraph, VertexProperty};
use super::heap::{arg, fault, illegal_argument, no_such_method, string_arg, string_args, ElementRef, Heap, PropertyOwner};

fn removed(what: &str) -> crate::remote::RemoteFault {
    fault("IllegalStateException", format!("{what} has been removed"))
}

fn vertex_property<'g>(graph: &'g TinkerGraph, vertex: usize, id: &ElementId) -> FaultResult<&'g VertexProperty> {
    graph.vertex(vertex)?.property(id).ok_or_else(|| removed("VertexProperty"))
}

impl Heap {
    pub(super) fn element_method(&mut self, element: ElementRef, method: &str, args: &[Value]) -> FaultResult<Value> {
        match element {
            ElementRef::Vertex { graph, slot } => self.vertex_method(graph, slot, method, args),
            ElementRef::Edge { graph, slot } => self.edge_method(graph, slot, method, args),
            ElementRef::VertexProperty { graph, vertex, id } => {
                self.vertex_property_method(graph, vertex, id, method, args)
            }
            ElementRef::Property { graph, owner, key } => self.property_method(graph, owner, key, method),
        }
    }

    pub(super) fn describe_element(&self, element: &ElementRef) -> FaultResult<String> {
        Ok(match element {
            ElementRef::Vertex { graph, slot } => format!("v[{}]", self.graph(*graph)?.vertex(*slot)?.id),
            ElementRef::Edge { graph, slot } => {
                let g = self.graph(*graph)?;
                let edge = g.edge(*slot)?;
                format!(
                    "e[{}][{}-{}->{}]",
                    edge.id,
                    g.vertex(edge.out_v)?.id,
                    edge.label,
                    g.vertex(edge.in_v)?.id
                )
            }
            ElementRef::VertexProperty { graph, vertex, id } => {
                let p = vertex_property(self.graph(*graph)?, *vertex, id)?;
                format!("vp[{}->{}]", p.key, p.value)
            }
            ElementRef::Property { key, .. } => format!("p[{}->{}]", key, self.property_value(element)?),
        })
    }

    /// Identifier of an element, as stored in the graph.
    pub(super) fn element_id(&self, element: &ElementRef) -> FaultResult<ElementId> {
        match element {
            ElementRef::Vertex { graph, slot } => Ok(self.graph(*graph)?.vertex(*slot)?.id.clone()),
            ElementRef::Edge { graph, slot } => Ok(self.graph(*graph)?.edge(*slot)?.id.clone()),
            ElementRef::VertexProperty { id, .. } => Ok(id.clone()),
            ElementRef::Property { graph, owner: PropertyOwner::Edge(slot), key } => self
                .graph(*graph)?
                .edge(*slot)?
                .property(key)
                .map(|p| p.id.clone())
                .ok_or_else(|| removed("Property")),
            ElementRef::Property { .. } => {
                Err(fault("UnsupportedOperationException", "Meta-properties do not have ids"))
            }
        }
    }

    pub(super) fn element_label(&self, element: &ElementRef) -> FaultResult<String> {
        match element {
            ElementRef::Vertex { graph, slot } => Ok(self.graph(*graph)?.vertex(*slot)?.label.clone()),
            ElementRef::Edge { graph, slot } => Ok(self.graph(*graph)?.edge(*slot)?.label.clone()),
            ElementRef::VertexProperty { graph, vertex, id } => {
                Ok(vertex_property(self.graph(*graph)?, *vertex, id)?.key.clone())
            }
            ElementRef::Property { .. } => Err(fault("UnsupportedOperationException", "Properties do not have labels")),
        }
    }

    /// Values under `keys` (all keys when empty), in storage order.
    pub(super) fn element_values(&self, element: &ElementRef, keys: &[String]) -> FaultResult<Vec<Value>> {
        match element {
            ElementRef::Vertex { graph, slot } => {
                Ok(self.graph(*graph)?.vertex(*slot)?.select(keys).map(|p| p.value.clone()).collect())
            }
            ElementRef::Edge { graph, slot } => {
                Ok(self.graph(*graph)?.edge(*slot)?.select(keys).map(|p| p.value.clone()).collect())
            }
            ElementRef::VertexProperty { graph, vertex, id } => Ok(vertex_property(self.graph(*graph)?, *vertex, id)?
                .meta
                .iter()
                .filter(|(k, _)| keys.is_empty() || keys.contains(k))
                .map(|(_, v)| v.clone())
                .collect()),
            ElementRef::Property { .. } => Err(illegal_argument("Properties do not have properties")),
        }
    }

    /// Property objects under `keys` (all keys when empty).
    pub(super) fn element_properties(&mut self, element: &ElementRef, keys: &[String]) -> FaultResult<Vec<Value>> {
        let targets: Vec<ElementRef> = match element {
            ElementRef::Vertex { graph, slot } => self
                .graph(*graph)?
                .vertex(*slot)?
                .select(keys)
                .map(|p| ElementRef::VertexProperty { graph: *graph, vertex: *slot, id: p.id.clone() })
                .collect(),
            ElementRef::Edge { graph, slot } => self
                .graph(*graph)?
                .edge(*slot)?
                .select(keys)
                .map(|p| ElementRef::Property { graph: *graph, owner: PropertyOwner::Edge(*slot), key: p.key.clone() })
                .collect(),
            ElementRef::VertexProperty { graph, vertex, id } => vertex_property(self.graph(*graph)?, *vertex, id)?
                .meta
                .iter()
                .filter(|(k, _)| keys.is_empty() || keys.contains(k))
                .map(|(k, _)| ElementRef::Property {
                    graph: *graph,
                    owner: PropertyOwner::Meta { vertex: *vertex, id: id.clone() },
                    key: k.clone(),
                })
                .collect(),
            ElementRef::Property { .. } => return Err(illegal_argument("Properties do not have properties")),
        };
        Ok(targets.into_iter().map(|t| self.intern_value(t)).collect())
    }

    /// The value carried by a vertex property or plain property.
    pub(super) fn property_value(&self, element: &ElementRef) -> FaultResult<Value> {
        match element {
            ElementRef::VertexProperty { graph, vertex, id } => {
                Ok(vertex_property(self.graph(*graph)?, *vertex, id)?.value.clone())
            }
            ElementRef::Property { graph, owner: PropertyOwner::Edge(slot), key } => self
                .graph(*graph)?
                .edge(*slot)?
                .property(key)
                .map(|p| p.value.clone())
                .ok_or_else(|| removed("Property")),
            ElementRef::Property { graph, owner: PropertyOwner::Meta { vertex, id }, key } => {
                vertex_property(self.graph(*graph)?, *vertex, id)?
                    .meta
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| removed("Property"))
            }
            _ => Err(illegal_argument("Expected a property")),
        }
    }

    /// Single value under `key`. Missing or multiple values fault.
    fn single_value(&self, element: &ElementRef, key: &str) -> FaultResult<Value> {
        let mut values = self.element_values(element, std::slice::from_ref(&key.to_owned()))?;
        match values.len() {
            1 => Ok(values.remove(0)),
            0 => Err(fault(
                "IllegalStateException",
                format!(
                    "The property does not exist as the key has no associated value for the provided element: {}:{key}",
                    self.describe_element(element)?
                ),
            )),
            _ => Err(fault(
                "IllegalStateException",
                format!("Multiple properties exist for the provided key, use Vertex.properties({key})"),
            )),
        }
    }

    fn element_keys(&self, element: &ElementRef) -> FaultResult<Value> {
        let keys: Vec<Value> = match element {
            ElementRef::Vertex { graph, slot } => {
                self.graph(*graph)?.vertex(*slot)?.properties.keys().map(|k| Value::from(k.as_str())).collect()
            }
            ElementRef::Edge { graph, slot } => {
                self.graph(*graph)?.edge(*slot)?.properties.iter().map(|p| Value::from(p.key.as_str())).collect()
            }
            ElementRef::VertexProperty { graph, vertex, id } => vertex_property(self.graph(*graph)?, *vertex, id)?
                .meta
                .iter()
                .map(|(k, _)| Value::from(k.as_str()))
                .collect(),
            ElementRef::Property { .. } => Vec::new(),
        };
        Ok(Value::List(keys))
    }

    /// Methods every element kind answers the same way.
    fn common_element_method(&mut self, element: &ElementRef, method: &str, args: &[Value]) -> Option<FaultResult<Value>> {
        let result = match method {
            "id" => self.element_id(element).map(|id| id.to_value()),
            "label" => self.element_label(element).map(Value::String),
            "keys" => self.element_keys(element),
            "value" => string_arg(args, 0, method).and_then(|key| self.single_value(element, &key)),
            "values" => string_args(args).and_then(|keys| self.element_values(element, &keys)).map(Value::List),
            "properties" => string_args(args).and_then(|keys| self.element_properties(element, &keys)).map(Value::List),
            _ => return None,
        };
        Some(result)
    }

    fn vertex_method(&mut self, graph: u64, slot: usize, method: &str, args: &[Value]) -> FaultResult<Value> {
        let element = ElementRef::Vertex { graph, slot };
        if let Some(result) = self.common_element_method(&element, method, args) {
            return result;
        }
        match method {
            "property" if args.len() == 1 => {
                let key = string_arg(args, 0, method)?;
                let mut found = self.element_properties(&element, &[key.clone()])?;
                match found.len() {
                    0 => Ok(Value::Null),
                    1 => Ok(found.remove(0)),
                    _ => Err(fault(
                        "IllegalStateException",
                        format!("Multiple properties exist for the provided key, use Vertex.properties({key})"),
                    )),
                }
            }
            "property" | "addProperty" => {
                let key = string_arg(args, 0, method)?;
                let value = arg(args, 1, method)?.clone();
                let single = method == "property";
                let id = self.graph_mut(graph)?.add_vertex_property(slot, &key, value, &args[2..], single)?;
                Ok(self.intern_value(ElementRef::VertexProperty { graph, vertex: slot, id }))
            }
            "addEdge" => {
                let label = string_arg(args, 0, method)?;
                let in_v = match self.element_of(arg(args, 1, method)?)? {
                    ElementRef::Vertex { graph: other, slot } if other == graph => slot,
                    _ => return Err(illegal_argument("addEdge expects a vertex of the same graph")),
                };
                let edge = self.graph_mut(graph)?.add_edge(slot, &label, in_v, &args[2..])?;
                Ok(self.intern_value(ElementRef::Edge { graph, slot: edge }))
            }
            "remove" => {
                self.graph_mut(graph)?.remove_vertex(slot)?;
                Ok(Value::Null)
            }
            _ => Err(no_such_method("TinkerVertex", method)),
        }
    }

    fn edge_method(&mut self, graph: u64, slot: usize, method: &str, args: &[Value]) -> FaultResult<Value> {
        let element = ElementRef::Edge { graph, slot };
        if let Some(result) = self.common_element_method(&element, method, args) {
            return result;
        }
        match method {
            "property" if args.len() == 1 => {
                let key = string_arg(args, 0, method)?;
                let present = self.graph(graph)?.edge(slot)?.property(&key).is_some();
                Ok(if present {
                    self.intern_value(ElementRef::Property { graph, owner: PropertyOwner::Edge(slot), key })
                } else {
                    Value::Null
                })
            }
            "property" => {
                let key = string_arg(args, 0, method)?;
                let value = arg(args, 1, method)?.clone();
                self.graph_mut(graph)?.set_edge_property(slot, &key, value)?;
                Ok(self.intern_value(ElementRef::Property { graph, owner: PropertyOwner::Edge(slot), key }))
            }
            "outVertex" | "inVertex" => {
                let edge = self.graph(graph)?.edge(slot)?;
                let vertex = if method == "outVertex" { edge.out_v } else { edge.in_v };
                Ok(self.intern_value(ElementRef::Vertex { graph, slot: vertex }))
            }
            "bothVertices" => {
                let edge = self.graph(graph)?.edge(slot)?;
                let (out_v, in_v) = (edge.out_v, edge.in_v);
                Ok(Value::List(vec![
                    self.intern_value(ElementRef::Vertex { graph, slot: out_v }),
                    self.intern_value(ElementRef::Vertex { graph, slot: in_v }),
                ]))
            }
            "remove" => {
                self.graph_mut(graph)?.remove_edge(slot)?;
                Ok(Value::Null)
            }
            _ => Err(no_such_method("TinkerEdge", method)),
        }
    }

    fn vertex_property_method(
        &mut self,
        graph: u64,
        vertex: usize,
        id: ElementId,
        method: &str,
        args: &[Value],
    ) -> FaultResult<Value> {
        let element = ElementRef::VertexProperty { graph, vertex, id: id.clone() };
        if method != "value" {
            if let Some(result) = self.common_element_method(&element, method, args) {
                return result;
            }
        }
        match method {
            "value" => self.property_value(&element),
            "key" => self.element_label(&element).map(Value::String),
            "isPresent" => Ok(Value::Bool(vertex_property(self.graph(graph)?, vertex, &id).is_ok())),
            "element" => Ok(self.intern_value(ElementRef::Vertex { graph, slot: vertex })),
            "property" if args.len() == 1 => {
                let key = string_arg(args, 0, method)?;
                let present = vertex_property(self.graph(graph)?, vertex, &id)?.meta.iter().any(|(k, _)| *k == key);
                Ok(if present {
                    self.intern_value(ElementRef::Property { graph, owner: PropertyOwner::Meta { vertex, id }, key })
                } else {
                    Value::Null
                })
            }
            "property" => {
                let key = string_arg(args, 0, method)?;
                let value = arg(args, 1, method)?.clone();
                self.graph_mut(graph)?.set_meta_property(vertex, &id, &key, value)?;
                Ok(self.intern_value(ElementRef::Property { graph, owner: PropertyOwner::Meta { vertex, id }, key }))
            }
            "remove" => {
                self.graph_mut(graph)?.remove_vertex_property(vertex, &id)?;
                Ok(Value::Null)
            }
            _ => Err(no_such_method("TinkerVertexProperty", method)),
        }
    }

    fn property_method(
        &mut self,
        graph: u64,
        owner: PropertyOwner,
        key: String,
        method: &str,
    ) -> FaultResult<Value> {
        let element = ElementRef::Property { graph, owner: owner.clone(), key: key.clone() };
        match method {
            "key" => Ok(Value::String(key)),
            "value" => self.property_value(&element),
            "id" => self.element_id(&element).map(|id| id.to_value()),
            "isPresent" => Ok(Value::Bool(self.property_value(&element).is_ok())),
            "element" => Ok(match owner {
                PropertyOwner::Edge(slot) => self.intern_value(ElementRef::Edge { graph, slot }),
                PropertyOwner::Meta { vertex, id } => self.intern_value(ElementRef::VertexProperty { graph, vertex, id }),
            }),
            "remove" => {
                match owner {
                    PropertyOwner::Edge(slot) => self.graph_mut(graph)?.remove_edge_property(slot, &key)?,
                    PropertyOwner::Meta { vertex, id } => self.graph_mut(graph)?.remove_meta_property(vertex, &id, &key)?,
                }
                Ok(Value::Null)
            }
            _ => Err(no_such_method("TinkerProperty", method)),
        }
    }
}
