//! Registration front end: routes are declared here, documented as a side
//! effect, and handed back to the router unchanged.
//!
//! One [`ApiDocs`] is one documentation run. Nested routers declare their
//! mount segment explicitly with [`ApiDocs::nest`].
use regex::Regex;
use serde_json::Value;

use crate::config::DocsConfig;
use crate::document::{self, FinalizeOptions};
use crate::error::{Error, Result};
use crate::registry::ComponentRegistry;
use crate::route::{Method, PathDocument, RouteInputs};
use crate::schema::SchemaNode;

/// A route path as the router sees it.
#[derive(Debug, Clone)]
pub enum RoutePath {
    Literal(String),
    /// Regex routes are documented under a human-written example path.
    Pattern { regex: Regex, example: String },
}

impl RoutePath {
    pub fn pattern(regex: &str, example: impl Into<String>) -> Result<Self> {
        let compiled = Regex::new(regex).map_err(|source| Error::InvalidPattern {
            pattern: regex.to_owned(),
            source,
        })?;
        Ok(Self::Pattern { regex: compiled, example: example.into() })
    }

    /// The string used in the document.
    pub fn documented(&self) -> &str {
        match self {
            Self::Literal(path) => path,
            Self::Pattern { example, .. } => example,
        }
    }
}

impl From<&str> for RoutePath {
    fn from(value: &str) -> Self { Self::Literal(value.to_owned()) }
}

impl From<String> for RoutePath {
    fn from(value: String) -> Self { Self::Literal(value) }
}

#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub method: Method,
    pub path: RoutePath,
    pub description: Option<String>,
    pub inputs: RouteInputs,
}

impl RouteSpec {
    pub fn new(method: Method, path: impl Into<RoutePath>) -> Self {
        Self {
            method,
            path: path.into(),
            description: None,
            inputs: RouteInputs::default(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn params(mut self, schema: SchemaNode) -> Self {
        self.inputs.params = Some(schema);
        self
    }

    pub fn body(mut self, schema: SchemaNode) -> Self {
        self.inputs.body = Some(schema);
        self
    }

    pub fn query(mut self, schema: SchemaNode) -> Self {
        self.inputs.query = Some(schema);
        self
    }
}

/// What the router needs to mount a documented route.
#[derive(Debug, Clone)]
pub struct RouteBinding<H> {
    pub method: Method,
    pub path: RoutePath,
    pub handler: H,
}

#[derive(Debug)]
pub struct ApiDocs {
    config: DocsConfig,
    registry: ComponentRegistry,
    paths: PathDocument,
    mounts: Vec<String>,
}

impl Default for ApiDocs {
    fn default() -> Self { Self::new(DocsConfig::default()) }
}

impl ApiDocs {
    pub fn new(config: DocsConfig) -> Self {
        let registry = ComponentRegistry::new(config.first_type_index);
        Self {
            config,
            registry,
            paths: PathDocument::new(),
            mounts: Vec::new(),
        }
    }

    /// Document `spec` under the current mount path and return the binding
    /// for the router. The router receives the local path, not the full one.
    pub fn route<H>(&mut self, spec: RouteSpec, handler: H) -> Result<RouteBinding<H>> {
        let full_path = self.full_path(spec.path.documented());
        self.paths.build_route_entry(
            &mut self.registry,
            spec.method,
            &full_path,
            &spec.inputs,
            spec.description.as_deref(),
        )?;
        Ok(RouteBinding { method: spec.method, path: spec.path, handler })
    }

    /// Run `mount` with `segment` appended to the mount path of every route
    /// it registers. Returns the segment as the router should see it and
    /// whatever `mount` produced.
    pub fn nest<T>(&mut self, segment: impl Into<RoutePath>, mount: impl FnOnce(&mut Self) -> T) -> (RoutePath, T) {
        let segment = segment.into();
        self.mounts.push(segment.documented().to_owned());
        let out = mount(self);
        self.mounts.pop();
        (segment, out)
    }

    pub fn full_path(&self, local: &str) -> String {
        let mut full = self.mounts.concat();
        full.push_str(local);
        full
    }

    pub fn registry(&self) -> &ComponentRegistry { &self.registry }

    pub fn paths(&self) -> &PathDocument { &self.paths }

    /// The template with everything registered so far merged in.
    pub fn document(&self) -> Result<Value> {
        Ok(self.config.template.merge(self.paths.to_value()?, self.registry.schemas()))
    }

    /// Merge, serialize and write the document to `options.out_file`.
    pub fn finalize(&self, options: &FinalizeOptions) -> Result<Value> {
        let doc = self.document()?;
        document::write_document(&options.out_file, &doc, self.config.pretty)?;
        tracing::info!(
            paths = self.paths.len(),
            components = self.registry.len(),
            out_file = %options.out_file.display(),
            "documentation written"
        );
        Ok(doc)
    }

    /// Start a fresh run with the same configuration.
    pub fn reset(&mut self) {
        self.registry.reset();
        self.paths.clear();
        self.mounts.clear();
    }
}
