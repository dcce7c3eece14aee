//! JSON route manifests and their lowering to [`SchemaNode`] trees.
//!
//! ```json
//! {
//!   "definitions": { "Tree": { "kind": "object", "fields": {
//!       "children": { "kind": "array", "element": { "kind": "ref", "name": "Tree" } } } } },
//!   "routes": [ { "method": "post", "path": "/trees", "body": { "kind": "ref", "name": "Tree" } } ],
//!   "mounts": [ { "path": "/api", "routes": [], "mounts": [] } ]
//! }
//! ```
//!
//! Every `ref` to a definition lowers to the same lazy node, so recursive
//! definitions terminate and repeated uses share one component.
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use once_cell::unsync::OnceCell;
use serde::Deserialize;

use crate::docs::{ApiDocs, RoutePath, RouteSpec};
use crate::error::{Error, Result};
use crate::route::{Method, RouteInputs};
use crate::schema::{Literal, Primitive, SchemaNode};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// One schema node as written in a manifest. Which fields apply depends on `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDoc {
    pub kind: String,
    #[serde(default)]
    pub fields: Option<IndexMap<String, NodeDoc>>,
    #[serde(default)]
    pub element: Option<Box<NodeDoc>>,
    #[serde(default)]
    pub elements: Option<Vec<NodeDoc>>,
    #[serde(default)]
    pub options: Option<Vec<NodeDoc>>,
    #[serde(default)]
    pub values: Option<Vec<Literal>>,
    #[serde(default)]
    pub value: Option<Box<NodeDoc>>,
    #[serde(default)]
    pub inner: Option<Box<NodeDoc>>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PathDoc {
    Literal(String),
    Pattern { regex: String, example: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteDoc {
    pub method: Method,
    pub path: PathDoc,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub params: Option<NodeDoc>,
    #[serde(default)]
    pub body: Option<NodeDoc>,
    #[serde(default)]
    pub query: Option<NodeDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MountDoc {
    pub path: PathDoc,
    #[serde(default)]
    pub routes: Vec<RouteDoc>,
    #[serde(default)]
    pub mounts: Vec<MountDoc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub definitions: IndexMap<String, NodeDoc>,
    #[serde(default)]
    pub routes: Vec<RouteDoc>,
    #[serde(default)]
    pub mounts: Vec<MountDoc>,
}

type DefinitionTable = IndexMap<String, SchemaNode>;

/// A manifest whose definitions have been lowered. Keep it alive while its
/// nodes are converted: `ref` nodes resolve through it.
pub struct Lowered {
    manifest: Manifest,
    table: Rc<OnceCell<DefinitionTable>>,
    refs: HashMap<String, SchemaNode>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Manifest {
    pub fn parse(src: &str) -> Result<Self> {
        crate::path_de::from_str_with_path(src)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        crate::path_de::from_value_with_path(value)
    }

    /// Lower every definition up front; reports unknown refs and malformed nodes.
    pub fn lower(self) -> Result<Lowered> {
        let table = Rc::new(OnceCell::new());
        let mut lowered = Lowered { manifest: Manifest::default(), table, refs: HashMap::new() };
        for name in self.definitions.keys() {
            let node = lowered.ref_node(name);
            lowered.refs.insert(name.clone(), node);
        }
        let mut definitions = DefinitionTable::new();
        for (name, doc) in &self.definitions {
            definitions.insert(name.clone(), lowered.lower_node(doc)?);
        }
        // fresh cell, set exactly once
        let _ = lowered.table.set(definitions);
        lowered.manifest = self;
        Ok(lowered)
    }
}

impl Lowered {
    /// The lowered body of a named definition (not the lazy wrapper).
    pub fn definition(&self, name: &str) -> Result<SchemaNode> {
        self.table
            .get()
            .and_then(|t| t.get(name).cloned())
            .ok_or_else(|| Error::UnknownDefinition { name: name.to_owned() })
    }

    /// Lower `doc` against this manifest's definitions.
    pub fn lower_node(&self, doc: &NodeDoc) -> Result<SchemaNode> {
        if let Some(p) = Primitive::from_kind(&doc.kind) {
            return Ok(SchemaNode::Primitive(p));
        }
        let node = match doc.kind.as_str() {
            "object" => {
                let fields = required(doc, "fields", doc.fields.as_ref())?;
                let mut out = IndexMap::with_capacity(fields.len());
                for (name, field) in fields {
                    out.insert(name.clone(), self.lower_node(field)?);
                }
                SchemaNode::Object(out)
            }
            "array" => SchemaNode::array(self.lower_node(required(doc, "element", doc.element.as_deref())?)?),
            "tuple" => SchemaNode::Tuple(self.lower_all(required(doc, "elements", doc.elements.as_ref())?)?),
            "union" => SchemaNode::Union(self.lower_all(required(doc, "options", doc.options.as_ref())?)?),
            "enum" => SchemaNode::Enum(required(doc, "values", doc.values.as_ref())?.clone()),
            "record" => SchemaNode::record(self.lower_node(required(doc, "value", doc.value.as_deref())?)?),
            "optional" => SchemaNode::optional(self.lower_node(required(doc, "inner", doc.inner.as_deref())?)?),
            "nullable" => SchemaNode::nullable(self.lower_node(required(doc, "inner", doc.inner.as_deref())?)?),
            "ref" => {
                let name = required(doc, "name", doc.name.as_ref())?;
                self.refs
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::UnknownDefinition { name: name.clone() })?
            }
            other => SchemaNode::Other(other.to_owned()),
        };
        Ok(node)
    }

    fn lower_all(&self, docs: &[NodeDoc]) -> Result<Vec<SchemaNode>> {
        docs.iter().map(|d| self.lower_node(d)).collect()
    }

    /// Stable lazy node for `name`; resolves through a weak handle on the table.
    fn ref_node(&self, name: &str) -> SchemaNode {
        let table: Weak<OnceCell<DefinitionTable>> = Rc::downgrade(&self.table);
        let name = name.to_owned();
        SchemaNode::lazy(move || {
            table
                .upgrade()
                .and_then(|t| t.get().and_then(|defs| defs.get(&name).cloned()))
                .unwrap_or_else(|| {
                    tracing::error!(name = %name, "definition resolved after its manifest was dropped");
                    SchemaNode::Other("ref".to_owned())
                })
        })
    }

    /// Register every route (mounts included) with `docs`.
    pub fn register(&self, docs: &mut ApiDocs) -> Result<()> {
        self.register_routes(docs, &self.manifest.routes, &self.manifest.mounts)
    }

    fn register_routes(&self, docs: &mut ApiDocs, routes: &[RouteDoc], mounts: &[MountDoc]) -> Result<()> {
        for route in routes {
            let spec = self.route_spec(route)?;
            docs.route(spec, ())?;
        }
        for mount in mounts {
            let segment = path_of(&mount.path)?;
            docs.nest(segment, |docs| self.register_routes(docs, &mount.routes, &mount.mounts)).1?;
        }
        Ok(())
    }

    fn route_spec(&self, route: &RouteDoc) -> Result<RouteSpec> {
        let lower = |doc: &Option<NodeDoc>| doc.as_ref().map(|d| self.lower_node(d)).transpose();
        Ok(RouteSpec {
            method: route.method,
            path: path_of(&route.path)?,
            description: route.description.clone(),
            inputs: RouteInputs {
                params: lower(&route.params)?,
                body: lower(&route.body)?,
                query: lower(&route.query)?,
            },
        })
    }
}

fn path_of(doc: &PathDoc) -> Result<RoutePath> {
    match doc {
        PathDoc::Literal(path) => Ok(RoutePath::Literal(path.clone())),
        PathDoc::Pattern { regex, example } => RoutePath::pattern(regex, example.clone()),
    }
}

fn required<'a, T: ?Sized>(doc: &NodeDoc, field: &'static str, value: Option<&'a T>) -> Result<&'a T> {
    value.ok_or_else(|| Error::MissingField { kind: doc.kind.clone(), field })
}
