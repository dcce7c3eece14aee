//! jq pre-processing of manifest documents (e.g. `.routes |= map(select(.method != "delete"))`).
use anyhow::{anyhow, Context, Result};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

/// Run `filter_src` over `input`; every output of the filter is one document.
pub fn run_jaq(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader
        .load(&arena, program)
        .map_err(format_parse_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(format_undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let outputs = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut out = Vec::new();
    for item in outputs {
        let val = item.map_err(|e| anyhow!("jq runtime error: {e:?}"))?;
        // Val: Display -> JSON text
        let json = serde_json::from_str::<Value>(&val.to_string())
            .with_context(|| format!("jq output is not JSON: {val}"))?;
        out.push(json);
    }
    Ok(out)
}

type LoadErrors<'a> = Vec<(load::File<&'a str, ()>, load::Error<&'a str>)>;
type CompileErrors<'a> = Vec<(load::File<&'a str, ()>, Vec<(&'a str, Undefined)>)>;

fn format_parse_errors(errs: LoadErrors<'_>) -> anyhow::Error {
    let lines = errs
        .iter()
        .map(|(file, err)| format!("jq parse error: {err:?} in `{}`", file.code))
        .collect::<Vec<_>>();
    anyhow!(lines.join("\n"))
}

fn format_undefined_errors(errs: CompileErrors<'_>) -> anyhow::Error {
    let lines = errs
        .iter()
        .flat_map(|(file, list)| {
            list.iter()
                .map(move |(name, undef)| format!("jq: undefined `{name}` ({undef:?}) in `{}`", file.code))
        })
        .collect::<Vec<_>>();
    anyhow!(lines.join("\n"))
}
