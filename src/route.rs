//! Route document assembly: one route's params/query/body schemas become
//! OpenAPI parameter objects and a request body under `paths[path][method]`.
use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::convert::{is_required, Converter, BIGINT_DESCRIPTION, DATE_DESCRIPTION};
use crate::error::{Error, Result};
use crate::registry::{reference, referenced_name, ComponentRegistry, ANY_TYPE};
use crate::schema::{Primitive, SchemaNode};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    All,
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Patch => "patch",
            Self::Options => "options",
            Self::Head => "head",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Which part of the request a schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputCategory {
    Params,
    Query,
    Body,
}

impl fmt::Display for InputCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Params => "params",
            Self::Query => "query",
            Self::Body => "body",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub name: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaType {
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: IndexMap<String, MediaType>,
}

impl RequestBody {
    pub fn json(schema: Value) -> Self {
        let mut content = IndexMap::new();
        content.insert("application/json".to_owned(), MediaType { schema });
        Self { required: true, content }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
}

impl Operation {
    /// Later parameters are appended; a later body or description wins.
    pub fn merge(&mut self, other: Operation) {
        self.parameters.extend(other.parameters);
        if other.request_body.is_some() {
            self.request_body = other.request_body;
        }
        if other.description.is_some() {
            self.description = other.description;
        }
    }
}

/// The optional top-level schemas of one route.
#[derive(Debug, Clone, Default)]
pub struct RouteInputs {
    pub params: Option<SchemaNode>,
    pub body: Option<SchemaNode>,
    pub query: Option<SchemaNode>,
}

/// `path → method → operation`, accumulated over every route of a run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PathDocument {
    paths: IndexMap<String, IndexMap<Method, Operation>>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl PathDocument {
    pub fn new() -> Self { Self::default() }

    /// Convert one route's inputs and merge them under `paths[path][method]`.
    ///
    /// `path` is the full mount path in router syntax; `:name` segments are
    /// rewritten to `{name}`. Inputs are converted in params, body, query
    /// order. If any of them fails, neither the path document nor the
    /// registry changes.
    pub fn build_route_entry(
        &mut self,
        registry: &mut ComponentRegistry,
        method: Method,
        path: &str,
        inputs: &RouteInputs,
        description: Option<&str>,
    ) -> Result<()> {
        let key = openapi_path(path);
        tracing::debug!(%method, path = %key, "assemble route");

        // a rejected route leaves no components behind and no names consumed
        let snapshot = registry.clone();
        let operation = match assemble_operation(registry, inputs, description) {
            Ok(operation) => operation,
            Err(error) => {
                *registry = snapshot;
                return Err(error);
            }
        };

        let item = self.paths.entry(key).or_default();
        match item.get_mut(&method) {
            Some(existing) => existing.merge(operation),
            None => {
                item.insert(method, operation);
            }
        }
        Ok(())
    }

    pub fn get(&self, path: &str, method: Method) -> Option<&Operation> {
        self.paths.get(path)?.get(&method)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> { self.paths.keys().map(String::as_str) }

    pub fn len(&self) -> usize { self.paths.len() }

    pub fn is_empty(&self) -> bool { self.paths.is_empty() }

    pub fn clear(&mut self) { self.paths.clear() }

    pub fn to_value(&self) -> Result<Value> { Ok(serde_json::to_value(self)?) }
}

fn assemble_operation(
    registry: &mut ComponentRegistry,
    inputs: &RouteInputs,
    description: Option<&str>,
) -> Result<Operation> {
    let mut operation = Operation {
        description: description.map(str::to_owned),
        ..Operation::default()
    };
    let categories = [
        (InputCategory::Params, &inputs.params),
        (InputCategory::Body, &inputs.body),
        (InputCategory::Query, &inputs.query),
    ];
    for (category, node) in categories {
        let Some(node) = node else { continue };
        let mut converter = Converter::new(registry, category);
        match category {
            InputCategory::Body => {
                operation.request_body = Some(RequestBody::json(body_schema(&mut converter, node)?));
            }
            InputCategory::Params | InputCategory::Query => {
                operation.parameters.extend(parameters(&mut converter, node)?);
            }
        }
    }
    Ok(operation)
}

/// Schema slot of the JSON request body.
fn body_schema(converter: &mut Converter<'_>, root: &SchemaNode) -> Result<Value> {
    match root {
        SchemaNode::Object(fields) => Ok(converter.convert_object(fields)),
        SchemaNode::Union(options) => {
            let mut any_of = Vec::with_capacity(options.len());
            for option in options {
                let SchemaNode::Object(fields) = option else {
                    return Err(Error::UnsupportedRootUnion { category: InputCategory::Body });
                };
                any_of.push(converter.convert_object(fields));
            }
            Ok(json!({ "anyOf": any_of }))
        }
        SchemaNode::Record(value) => {
            let name = converter.registry().reserve(None);
            let definition = converter.convert(value);
            converter.registry().register(None, &name, definition);
            Ok(reference(&name))
        }
        other => Ok(converter.convert(other)),
    }
}

/// One parameter object per top-level field of a params/query schema.
fn parameters(converter: &mut Converter<'_>, root: &SchemaNode) -> Result<Vec<Parameter>> {
    let category = converter.category();
    let mut node = root.clone();
    let mut seen = HashSet::new();
    while let SchemaNode::Lazy(lazy) = &node {
        if !seen.insert(lazy.id()) {
            tracing::warn!(%category, "lazy root only resolves to itself; no parameters emitted");
            return Ok(Vec::new());
        }
        let resolved = lazy.resolve();
        node = resolved;
    }
    let fields = match &node {
        SchemaNode::Object(fields) => fields,
        SchemaNode::Union(_) => return Err(Error::UnsupportedRootUnion { category }),
        other => {
            tracing::warn!(%category, kind = other.kind(), "root schema is not an object; no parameters emitted");
            return Ok(Vec::new());
        }
    };
    let location = match category {
        InputCategory::Params => ParameterLocation::Path,
        _ => ParameterLocation::Query,
    };

    let mut out = Vec::with_capacity(fields.len());
    for (name, field) in fields {
        let converted = converter.convert(field);
        // refs are not embedded; the description points the reader at the component
        let (schema, description) = match referenced_name(&converted) {
            Some(ANY_TYPE) => (json!({}), Some(format!("reffered to type {ANY_TYPE}"))),
            Some(component) => (json!({}), Some(format!("reffered to {component}"))),
            None => (converted, inline_description(field)),
        };
        out.push(Parameter {
            location,
            name: name.clone(),
            required: is_required(field),
            description,
            schema,
        });
    }
    Ok(out)
}

/// bigint/date annotation lifted to the parameter, including one level of
/// nested object fields (`"d: date, b: bigint"`).
fn inline_description(field: &SchemaNode) -> Option<String> {
    match field {
        SchemaNode::Primitive(Primitive::BigInt) => Some(BIGINT_DESCRIPTION.to_owned()),
        SchemaNode::Primitive(Primitive::Date) => Some(DATE_DESCRIPTION.to_owned()),
        SchemaNode::Object(nested) => {
            let notes = nested
                .iter()
                .filter_map(|(name, node)| match node {
                    SchemaNode::Primitive(p @ (Primitive::Date | Primitive::BigInt)) => {
                        Some(format!("{name}: {}", p.as_str()))
                    }
                    _ => None,
                })
                .collect::<Vec<_>>();
            (!notes.is_empty()).then(|| notes.join(", "))
        }
        _ => None,
    }
}

/// Rewrite router path parameters (`/users/:id`) to OpenAPI syntax (`/users/{id}`).
///
/// A `:` right after `/` opens a brace; the next `/` or `?` closes it.
pub fn openapi_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 4);
    let mut open = false;
    let mut prev: Option<char> = None;
    for (i, c) in path.chars().enumerate() {
        if i > 0 && open && (c == '/' || c == '?') {
            out.push('}');
            out.push(c);
            open = false;
        } else if i > 0 && prev == Some('/') && c == ':' {
            out.push('{');
            open = true;
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    if open {
        out.push('}');
    }
    out
}
