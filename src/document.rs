//! The output document: static template + generated paths and components.
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

/// Static boilerplate the generated `paths` and `components.schemas` are merged into.
#[derive(Debug, Clone, PartialEq)]
pub struct Template(Value);

impl Default for Template {
    fn default() -> Self {
        Self(json!({
            "openapi": "3.0.0",
            "info": {
                "title": "API documentation",
                "version": "1.0.0"
            },
            "servers": [],
            "paths": {},
            "components": {
                "schemas": {}
            }
        }))
    }
}

impl Template {
    pub fn new(value: Value) -> Self { Self(value) }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| Error::Template {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self(crate::path_de::from_str_with_path(&source)?))
    }

    pub fn as_value(&self) -> &Value { &self.0 }

    /// Generated paths replace template paths with the same key; generated
    /// components are added next to the template's own.
    pub fn merge(&self, paths: Value, schemas: &IndexMap<String, Value>) -> Value {
        let mut doc = match &self.0 {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };

        let mut merged_paths = take_object(&mut doc, "paths");
        if let Value::Object(generated) = paths {
            merged_paths.extend(generated);
        }
        doc.insert("paths".to_owned(), Value::Object(merged_paths));

        let mut components = take_object(&mut doc, "components");
        let mut merged_schemas = take_object(&mut components, "schemas");
        merged_schemas.extend(schemas.iter().map(|(k, v)| (k.clone(), v.clone())));
        components.insert("schemas".to_owned(), Value::Object(merged_schemas));
        doc.insert("components".to_owned(), Value::Object(components));

        Value::Object(doc)
    }
}

fn take_object(map: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match map.remove(key) {
        Some(Value::Object(inner)) => inner,
        _ => Map::new(),
    }
}

/// Where and how the finalized document is written.
#[derive(Debug, Clone)]
pub struct FinalizeOptions {
    pub out_file: PathBuf,
}

impl FinalizeOptions {
    pub fn new(out_file: impl Into<PathBuf>) -> Self { Self { out_file: out_file.into() } }
}

pub fn to_json(document: &Value, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    })
}

/// Single write; a failure is returned as is, nothing is retried.
pub fn write_document(out_file: &Path, document: &Value, pretty: bool) -> Result<()> {
    let source = to_json(document, pretty)?;
    let wrap = |source| Error::Write { path: out_file.to_path_buf(), source };
    if let Some(parent) = out_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }
    std::fs::write(out_file, source).map_err(wrap)
}
