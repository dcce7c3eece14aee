//! Document HTTP routes as OpenAPI 3.0 while they are registered.
//!
//! Route input schemas ([`SchemaNode`] trees for params, query and body) are
//! converted into parameter objects and request bodies. Nested types are
//! hoisted into `components.schemas` under generated `type<N>` names.
pub mod cli;
pub mod config;
pub mod convert;
pub mod docs;
pub mod document;
pub mod error;
pub mod jq_exec;
pub mod manifest;
pub mod path_de;
pub mod registry;
pub mod route;
pub mod schema;

pub use config::DocsConfig;
pub use docs::{ApiDocs, RouteBinding, RoutePath, RouteSpec};
pub use document::{FinalizeOptions, Template};
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use registry::ComponentRegistry;
pub use route::{InputCategory, Method, Operation, PathDocument};
pub use schema::{Literal, Primitive, SchemaNode};
