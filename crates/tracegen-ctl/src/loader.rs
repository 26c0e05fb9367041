//! Loading of compiled modules, expressions and input models from disk.
//!
//! The format is chosen by extension: `.json`, or `.yaml`/`.yml`.

use std::path::Path;

use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use tracegen_engine::{Expression, ModelDocument, ModelSet, Module, NamedVariable, ObjectId, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

fn format_of(path: &Path) -> anyhow::Result<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("yaml" | "yml") => Ok(Format::Yaml),
        _ => bail!(
            "unsupported file type '{}' (expected .json, .yaml or .yml)",
            path.display()
        ),
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
}

fn parse<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = read(path)?;
    let parsed = match format_of(path)? {
        Format::Json => serde_json::from_str(&contents)
            .with_context(|| format!("invalid JSON in '{}'", path.display()))?,
        Format::Yaml => serde_yaml::from_str(&contents)
            .with_context(|| format!("invalid YAML in '{}'", path.display()))?,
    };
    Ok(parsed)
}

pub(crate) fn load_module(path: &Path) -> anyhow::Result<Module> {
    let module: Module = parse(path)?;
    tracing::debug!(
        path = %path.display(),
        module = %module.name,
        elements = module.elements.len(),
        "Loaded compiled module"
    );
    Ok(module)
}

pub(crate) fn load_expression(path: &Path) -> anyhow::Result<Expression> {
    parse(path)
}

/// Load every model document; each document's location is its path as given.
pub(crate) fn load_models(paths: &[impl AsRef<Path>]) -> anyhow::Result<ModelSet> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let location = path.display().to_string();
        let contents = read(path)?;
        let document = match format_of(path)? {
            Format::Json => ModelDocument::from_json_str(&location, &contents)?,
            Format::Yaml => ModelDocument::from_yaml_str(&location, &contents)?,
        };
        documents.push(document);
    }
    let models = ModelSet::from_documents(documents)?;
    tracing::debug!(objects = models.len(), "Loaded input models");
    Ok(models)
}

pub(crate) fn resolve_targets(
    models: &ModelSet,
    keys: &[String],
) -> anyhow::Result<Vec<ObjectId>> {
    keys.iter()
        .map(|key| {
            models
                .find(key)
                .with_context(|| format!("no model object with key '{key}'"))
        })
        .collect()
}

/// Parse `NAME=VALUE` pairs.
///
/// `@key` references a model object; `true`/`false`, integers and reals are
/// typed; `null` is `Null`; anything else is a string.
pub(crate) fn parse_variables(
    models: &ModelSet,
    raw: &[String],
) -> anyhow::Result<Vec<NamedVariable>> {
    raw.iter()
        .map(|pair| {
            let Some((name, value)) = pair.split_once('=') else {
                bail!("invalid variable '{pair}' (expected NAME=VALUE)");
            };
            let name = name.trim();
            if name.is_empty() {
                bail!("invalid variable '{pair}' (empty name)");
            }
            Ok(NamedVariable::new(name, parse_value(models, value)?))
        })
        .collect()
}

fn parse_value(models: &ModelSet, raw: &str) -> anyhow::Result<Value> {
    if let Some(key) = raw.strip_prefix('@') {
        let object = models
            .find(key)
            .with_context(|| format!("no model object with key '{key}'"))?;
        return Ok(Value::Object(object));
    }
    Ok(match raw {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(i) = raw.parse::<i64>() {
                Value::Integer(i)
            } else if let Ok(r) = raw.parse::<f64>() {
                Value::Real(r)
            } else {
                Value::String(raw.to_string())
            }
        }
    })
}
