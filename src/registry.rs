//! Component registry: named, reusable schemas under `#/components/schemas`.
//!
//! Names come from a monotonic counter (`type<N>`), handed out in first-seen
//! traversal order. Lazy nodes are remembered by identity so that a recursive
//! definition closes over its own name; structural types are never merged.
use std::collections::HashMap;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::schema::LazyId;

/// Name of the shared component behind every `any`/`unknown`.
pub const ANY_TYPE: &str = "anyType";

const COMPONENT_PREFIX: &str = "#/components/schemas/";

static ANY_TYPE_SCHEMA: Lazy<Value> = Lazy::new(|| json!({
    "anyOf": [
        { "type": "string" },
        { "type": "number" },
        { "type": "integer" },
        { "type": "boolean" },
        { "type": "array", "items": {} },
        { "type": "object" }
    ]
}));

/// What a registered name is remembered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKey {
    Lazy(LazyId),
    AnyType,
}

#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    first_index: u32,
    next_index: u32,
    schemas: IndexMap<String, Value>,
    names: HashMap<ComponentKey, String>,
}

impl Default for ComponentRegistry {
    fn default() -> Self { Self::new(1) }
}

impl ComponentRegistry {
    pub fn new(first_index: u32) -> Self {
        Self {
            first_index,
            next_index: first_index,
            schemas: IndexMap::new(),
            names: HashMap::new(),
        }
    }

    pub fn allocate_name(&mut self) -> String {
        let name = format!("type{}", self.next_index);
        self.next_index += 1;
        name
    }

    /// Insert (or overwrite) a definition, remembering `key` when given.
    pub fn register(&mut self, key: Option<ComponentKey>, name: &str, definition: Value) {
        tracing::debug!(name, ?key, "register component");
        if let Some(key) = key {
            self.names.insert(key, name.to_owned());
        }
        self.schemas.insert(name.to_owned(), definition);
    }

    pub fn lookup(&self, key: ComponentKey) -> Option<&str> {
        self.names.get(&key).map(String::as_str)
    }

    /// Allocate a name and claim its slot before the body is built, so the
    /// component list stays in allocation order and self-references resolve.
    pub fn reserve(&mut self, key: Option<ComponentKey>) -> String {
        let name = self.allocate_name();
        self.register(key, &name, json!({}));
        name
    }

    /// `$ref` to the shared `anyType` component, creating it on first use.
    pub fn any_type(&mut self) -> Value {
        if self.lookup(ComponentKey::AnyType).is_none() {
            self.register(Some(ComponentKey::AnyType), ANY_TYPE, ANY_TYPE_SCHEMA.clone());
        }
        reference(ANY_TYPE)
    }

    pub fn get(&self, name: &str) -> Option<&Value> { self.schemas.get(name) }

    pub fn schemas(&self) -> &IndexMap<String, Value> { &self.schemas }

    pub fn len(&self) -> usize { self.schemas.len() }

    pub fn is_empty(&self) -> bool { self.schemas.is_empty() }

    /// Forget every component and restart the counter.
    pub fn reset(&mut self) {
        self.next_index = self.first_index;
        self.schemas.clear();
        self.names.clear();
    }
}

/// `{"$ref": "#/components/schemas/<name>"}`
pub fn reference(name: &str) -> Value {
    json!({ "$ref": format!("{COMPONENT_PREFIX}{name}") })
}

/// Component name a `$ref` fragment points at, if it is one.
pub fn referenced_name(fragment: &Value) -> Option<&str> {
    fragment.get("$ref")?.as_str()?.strip_prefix(COMPONENT_PREFIX)
}
