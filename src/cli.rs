//! CLI: route manifests → (openapi document | single definition schema)
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::{json, Value};

use crate::config::DocsConfig;
use crate::convert::Converter;
use crate::docs::ApiDocs;
use crate::document::{self, FinalizeOptions, Template};
use crate::error::Error;
use crate::manifest::{Lowered, Manifest};
use crate::registry::ComponentRegistry;
use crate::route::InputCategory;
use crate::schema::SchemaNode;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build OpenAPI 3.0 documentation from JSON route manifests
#[derive(Parser, Debug)]
#[command(name = "schema-openapi", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// register every manifest route and emit the full document
    Openapi(OpenapiOut),
    /// convert one manifest definition and print it with the components it produced
    Schema(SchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JQ pre-process filter for each manifest; every output is one manifest.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more manifests. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// index of the first generated component name (`type<N>`)
    #[arg(long, default_value_t = 1)]
    first_type_index: u32,

    /// pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Parser, Debug)]
struct OpenapiOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// template document the generated paths and components are merged into
    #[arg(long)]
    template: Option<PathBuf>,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// name of the definition to convert
    #[arg(long)]
    definition: String,

    /// input category the definition is converted for
    #[arg(long, value_enum, default_value_t = InputCategory::Body)]
    category: InputCategory,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Read and decode every manifest in parallel; the result keeps input order.
    fn load_manifests(&self) -> Result<Vec<Manifest>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let decoded = source_paths
            .par_iter()
            .map(|path| self.load_file(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(decoded.into_iter().flatten().collect())
    }

    fn load_file(&self, source_path: &Path) -> Result<Vec<Manifest>> {
        let source_path_str = source_path.display();
        let source = std::fs::read_to_string(source_path)
            .with_context(|| format!("failed to read source file ({source_path_str})"))?;
        let Some(jq_expr) = self.jq_expr.as_ref() else {
            let manifest = Manifest::parse(&source)
                .with_context(|| format!("invalid manifest ({source_path_str})"))?;
            return Ok(vec![manifest]);
        };
        let json_value = serde_json::from_str::<Value>(&source)
            .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
        let outputs = crate::jq_exec::run_jaq(jq_expr, &json_value).with_context(|| {
            format!("failed to apply jq expression to source file ({source_path_str})")
        })?;
        outputs
            .into_iter()
            .map(|value| {
                Manifest::from_value(value)
                    .with_context(|| format!("invalid manifest after jq ({source_path_str})"))
            })
            .collect()
    }

    fn docs_config(&self, template: Option<&Path>) -> Result<DocsConfig> {
        let template = match template {
            Some(path) => Template::from_file(path)?,
            None => Template::default(),
        };
        Ok(DocsConfig {
            first_type_index: self.first_type_index,
            template,
            pretty: self.pretty,
        })
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Openapi(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(())
                }

                let settings = &target.input_settings;
                let config = settings.docs_config(target.template.as_deref())?;
                let mut docs = ApiDocs::new(config);

                // registration order follows input order
                for manifest in settings.load_manifests()? {
                    manifest.lower()?.register(&mut docs)?;
                }

                match target.out.as_ref() {
                    Some(out) => {
                        docs.finalize(&FinalizeOptions::new(out))?;
                        eprintln!("{} {}", "wrote".green(), out.display());
                    }
                    None => {
                        let doc = docs.document()?;
                        println!("{}", document::to_json(&doc, settings.pretty)?);
                    }
                }
            }
            Command::Schema(target) => {
                let settings = &target.input_settings;
                let mut manifests = settings.load_manifests()?;
                if manifests.len() != 1 {
                    bail!("expected exactly one manifest, got {}", manifests.len());
                }
                let lowered = manifests.remove(0).lower()?;
                let out = definition_schema(
                    &lowered,
                    &target.definition,
                    target.category,
                    settings.first_type_index,
                )?;
                println!("{}", document::to_json(&out, settings.pretty)?);
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// `{schema, components}` for one definition. A root union cannot stand for
/// params or query, the same as on registered routes.
fn definition_schema(
    lowered: &Lowered,
    definition: &str,
    category: InputCategory,
    first_type_index: u32,
) -> Result<Value> {
    let node = lowered.definition(definition)?;
    if category != InputCategory::Body && matches!(node, SchemaNode::Union(_)) {
        return Err(Error::UnsupportedRootUnion { category }.into());
    }
    let mut registry = ComponentRegistry::new(first_type_index);
    let schema = Converter::new(&mut registry, category).convert(&node);
    Ok(json!({
        "schema": schema,
        "components": registry.schemas(),
    }))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
