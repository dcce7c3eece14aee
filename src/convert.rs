//! Schema node → JSON Schema fragment.
//!
//! Pure recursion over the node tree; the only side effects land in the
//! [`ComponentRegistry`] (unions, tuples, lazies and `any` become named
//! components and the caller gets a `$ref` back).
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::registry::{reference, ComponentKey, ComponentRegistry};
use crate::route::InputCategory;
use crate::schema::{LazySchema, Primitive, SchemaNode};

pub const BIGINT_DESCRIPTION: &str = "Type: bigint";
pub const DATE_DESCRIPTION: &str = "Type: date";

pub struct Converter<'r> {
    registry: &'r mut ComponentRegistry,
    category: InputCategory,
}

impl<'r> Converter<'r> {
    pub fn new(registry: &'r mut ComponentRegistry, category: InputCategory) -> Self {
        Self { registry, category }
    }

    pub fn category(&self) -> InputCategory { self.category }

    pub fn registry(&mut self) -> &mut ComponentRegistry { &mut *self.registry }

    pub fn convert(&mut self, node: &SchemaNode) -> Value {
        match node {
            SchemaNode::Primitive(p) => self.convert_primitive(*p),
            SchemaNode::Object(fields) => self.convert_object(fields),
            SchemaNode::Array(element) => json!({
                "type": "array",
                "items": self.convert(element),
            }),
            SchemaNode::Tuple(elements) => {
                let name = self.registry.reserve(None);
                let items = elements.iter().map(|el| self.convert(el)).collect::<Vec<_>>();
                self.registry.register(None, &name, json!({
                    "type": "array",
                    "items": { "anyOf": items },
                }));
                reference(&name)
            }
            SchemaNode::Union(options) => {
                let name = self.registry.reserve(None);
                let any_of = options.iter().map(|opt| self.convert(opt)).collect::<Vec<_>>();
                self.registry.register(None, &name, json!({ "anyOf": any_of }));
                reference(&name)
            }
            SchemaNode::Enum(values) => json!({
                "type": "enum",
                "enum": values,
            }),
            // the key type has no representation; only the values are documented
            SchemaNode::Record(value) => self.convert(value),
            SchemaNode::Lazy(lazy) => self.convert_lazy(lazy),
            SchemaNode::Other(kind) => json!({ "type": kind }),
        }
    }

    /// Inline `{type: "object", properties, required}`; never a component by itself.
    pub fn convert_object(&mut self, fields: &IndexMap<String, SchemaNode>) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::<Value>::new();
        for (name, field) in fields {
            if is_required(field) {
                required.push(Value::from(name.as_str()));
            }
            properties.insert(name.clone(), self.convert(field));
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Memoized by thunk identity; the name is claimed before the body is
    /// expanded so self-references terminate on the lookup.
    pub fn convert_lazy(&mut self, lazy: &LazySchema) -> Value {
        let key = ComponentKey::Lazy(lazy.id());
        if let Some(name) = self.registry.lookup(key) {
            return reference(name);
        }
        let name = self.registry.reserve(Some(key));
        let definition = self.convert(&lazy.resolve());
        self.registry.register(None, &name, definition);
        reference(&name)
    }

    fn convert_primitive(&mut self, primitive: Primitive) -> Value {
        match primitive {
            Primitive::String | Primitive::Number | Primitive::Boolean => {
                json!({ "type": primitive.as_str() })
            }
            Primitive::BigInt => self.annotated("number", BIGINT_DESCRIPTION),
            Primitive::Date => self.annotated("string", DATE_DESCRIPTION),
            Primitive::Undefined | Primitive::Null | Primitive::Void => json!({
                "type": primitive.as_str(),
                "example": primitive.as_str(),
            }),
            Primitive::Any | Primitive::Unknown => self.registry.any_type(),
        }
    }

    /// Path and query parameters carry the annotation on the parameter object instead.
    fn annotated(&self, ty: &str, description: &str) -> Value {
        match self.category {
            InputCategory::Body => json!({ "type": ty, "description": description }),
            InputCategory::Params | InputCategory::Query => json!({ "type": ty }),
        }
    }
}

/// A field is required unless it is a union with an `undefined` option.
/// A `null` option alone keeps it required.
pub fn is_required(node: &SchemaNode) -> bool {
    match node {
        SchemaNode::Union(options) => !options.iter().any(|o| o.is_primitive(Primitive::Undefined)),
        _ => true,
    }
}
