//! Input schema tree: what a route says its params, query and body look like.
//!
//! A closed sum type, one variant per schema kind. Nodes are immutable once
//! built; `Lazy` nodes are the only ones compared by identity.
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    BigInt,
    Date,
    Undefined,
    Null,
    Void,
    Any,
    Unknown,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::BigInt => "bigint",
            Self::Date => "date",
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Void => "void",
            Self::Any => "any",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_kind(kind: &str) -> Option<Self> {
        Some(match kind {
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "bigint" => Self::BigInt,
            "date" => Self::Date,
            "undefined" => Self::Undefined,
            "null" => Self::Null,
            "void" => Self::Void,
            "any" => Self::Any,
            "unknown" => Self::Unknown,
            _ => return None,
        })
    }
}

/// Enum member value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Boolean(bool),
    Number(OrderedFloat<f64>),
    String(String),
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::String(s) => serializer.serialize_str(s),
            // prefer emitting integers when exact
            Self::Number(n) => {
                let n = n.0;
                if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
                    serializer.serialize_i64(n as i64)
                } else {
                    serializer.serialize_f64(n)
                }
            }
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self { Self::String(value.to_owned()) }
}

impl From<String> for Literal {
    fn from(value: String) -> Self { Self::String(value) }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self { Self::Number(OrderedFloat(value)) }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self { Self::Number(OrderedFloat(value as f64)) }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self { Self::Boolean(value) }
}

#[derive(Debug, Clone)]
pub enum SchemaNode {
    Primitive(Primitive),
    Object(IndexMap<String, SchemaNode>), // declaration order is emission order
    Array(Box<SchemaNode>),
    Tuple(Vec<SchemaNode>),
    Union(Vec<SchemaNode>),
    Enum(Vec<Literal>),
    Record(Box<SchemaNode>),              // value type only; keys are always strings
    Lazy(LazySchema),
    Other(String),                        // unrecognized kind, emitted as a bare type label
}

// ————————————————————————————————————————————————————————————————————————————
// LAZY
// ————————————————————————————————————————————————————————————————————————————

static NEXT_LAZY_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a lazy node. Clones of the same `LazySchema` share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LazyId(u64);

struct LazyInner {
    id: LazyId,
    getter: Box<dyn Fn() -> SchemaNode>,
}

/// A thunk standing for a (possibly self-referential) schema.
#[derive(Clone)]
pub struct LazySchema(Rc<LazyInner>);

impl LazySchema {
    pub fn new(getter: impl Fn() -> SchemaNode + 'static) -> Self {
        Self(Rc::new(LazyInner { id: next_lazy_id(), getter: Box::new(getter) }))
    }

    /// Build a lazy node whose body receives the node itself.
    pub fn recursive(build: impl Fn(SchemaNode) -> SchemaNode + 'static) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<LazyInner>| {
            let weak = weak.clone();
            LazyInner {
                id: next_lazy_id(),
                getter: Box::new(move || match weak.upgrade() {
                    Some(this) => build(SchemaNode::Lazy(LazySchema(this))),
                    // only reachable while the node is being dropped
                    None => SchemaNode::Other("lazy".to_owned()),
                }),
            }
        });
        Self(inner)
    }

    pub fn id(&self) -> LazyId { self.0.id }

    pub fn resolve(&self) -> SchemaNode { (self.0.getter)() }
}

impl fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LazySchema").field(&self.0.id).finish()
    }
}

fn next_lazy_id() -> LazyId {
    LazyId(NEXT_LAZY_ID.fetch_add(1, Ordering::Relaxed))
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl SchemaNode {
    pub fn string() -> Self { Self::Primitive(Primitive::String) }
    pub fn number() -> Self { Self::Primitive(Primitive::Number) }
    pub fn boolean() -> Self { Self::Primitive(Primitive::Boolean) }
    pub fn bigint() -> Self { Self::Primitive(Primitive::BigInt) }
    pub fn date() -> Self { Self::Primitive(Primitive::Date) }
    pub fn undefined() -> Self { Self::Primitive(Primitive::Undefined) }
    pub fn null() -> Self { Self::Primitive(Primitive::Null) }
    pub fn void() -> Self { Self::Primitive(Primitive::Void) }
    pub fn any() -> Self { Self::Primitive(Primitive::Any) }
    pub fn unknown() -> Self { Self::Primitive(Primitive::Unknown) }

    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaNode)>,
    {
        Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn array(element: SchemaNode) -> Self { Self::Array(Box::new(element)) }

    pub fn tuple(elements: impl IntoIterator<Item = SchemaNode>) -> Self {
        Self::Tuple(elements.into_iter().collect())
    }

    pub fn union(options: impl IntoIterator<Item = SchemaNode>) -> Self {
        Self::Union(options.into_iter().collect())
    }

    pub fn enumeration<L: Into<Literal>>(values: impl IntoIterator<Item = L>) -> Self {
        Self::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn record(value: SchemaNode) -> Self { Self::Record(Box::new(value)) }

    pub fn lazy(getter: impl Fn() -> SchemaNode + 'static) -> Self {
        Self::Lazy(LazySchema::new(getter))
    }

    pub fn recursive(build: impl Fn(SchemaNode) -> SchemaNode + 'static) -> Self {
        Self::Lazy(LazySchema::recursive(build))
    }

    /// `x | undefined`, the way the validation library spells an optional field.
    pub fn optional(inner: SchemaNode) -> Self {
        Self::Union(vec![inner, Self::undefined()])
    }

    /// `x | null`
    pub fn nullable(inner: SchemaNode) -> Self {
        Self::Union(vec![inner, Self::null()])
    }

    /// Discriminant tag as the source schema library names it.
    pub fn kind(&self) -> &str {
        match self {
            Self::Primitive(p) => p.as_str(),
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Tuple(_) => "tuple",
            Self::Union(_) => "union",
            Self::Enum(_) => "enum",
            Self::Record(_) => "record",
            Self::Lazy(_) => "lazy",
            Self::Other(kind) => kind,
        }
    }

    pub fn is_primitive(&self, primitive: Primitive) -> bool {
        matches!(self, Self::Primitive(p) if *p == primitive)
    }
}
