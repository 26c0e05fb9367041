//! Compiled representation of templates, queries and expressions.
//!
//! The engine never parses template source: an external compiler hands it a
//! [`Module`] (or a single expression tree). Modules are immutable once built and
//! are shared as `Arc<Module>` between evaluations.

mod expression;
mod statement;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use expression::{Expression, IteratorKind, Literal, LiteralValue};
pub use statement::Statement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Protected => write!(f, "protected"),
            Self::Private => write!(f, "private"),
        }
    }
}

/// A formal parameter: name and declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A template: its effect is the text its body emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// When present and `false`, the template emits nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<Expression>,
    /// Entry point for whole-model generation.
    #[serde(default)]
    pub main: bool,
    #[serde(default)]
    pub body: Vec<Statement>,
}

/// A query: its effect is the value its body computes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub return_type: String,
    pub body: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleElement {
    Template(Template),
    Query(Query),
}

impl ModuleElement {
    pub fn name(&self) -> &str {
        match self {
            Self::Template(t) => &t.name,
            Self::Query(q) => &q.name,
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        match self {
            Self::Template(t) => &t.parameters,
            Self::Query(q) => &q.parameters,
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Self::Template(t) => t.visibility,
            Self::Query(q) => q.visibility,
        }
    }

    pub fn kind(&self) -> tracegen_trace::ElementKind {
        match self {
            Self::Template(_) => tracegen_trace::ElementKind::Template,
            Self::Query(_) => tracegen_trace::ElementKind::Query,
        }
    }
}

/// A compiled module: the unit the external compiler produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    /// Identity of the module source, recorded as the Module File in traces.
    pub location: String,
    #[serde(default)]
    pub elements: Vec<ModuleElement>,
}

impl Module {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Resolve an element by name, preferring one whose arity matches.
    pub fn resolve(&self, name: &str, arity: usize) -> Option<usize> {
        let mut by_name = None;
        for (index, element) in self.elements.iter().enumerate() {
            if element.name() != name {
                continue;
            }
            if element.parameters().len() == arity {
                return Some(index);
            }
            by_name.get_or_insert(index);
        }
        by_name
    }

    /// Indexes of templates flagged as entry points.
    pub fn main_templates(&self) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| matches!(e, ModuleElement::Template(t) if t.main))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Handle to one element of a shared module.
#[derive(Debug, Clone)]
pub struct ElementHandle {
    module: Arc<Module>,
    index: usize,
}

impl ElementHandle {
    pub fn new(module: Arc<Module>, index: usize) -> Option<Self> {
        (index < module.elements.len()).then_some(Self { module, index })
    }

    /// Handle to the first element called `name`.
    pub fn by_name(module: Arc<Module>, name: &str) -> Option<Self> {
        let index = module.elements.iter().position(|e| e.name() == name)?;
        Some(Self { module, index })
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn element(&self) -> &ModuleElement {
        &self.module.elements[self.index]
    }
}

/// What the engine is asked to evaluate.
#[derive(Debug, Clone)]
pub enum CompiledExpression {
    /// A template or query.
    Element(ElementHandle),
    /// A free-standing expression; `module` is its root container, used to resolve
    /// element invocations.
    Expression {
        module: Arc<Module>,
        expression: Expression,
    },
}

/// Output of the external compiler for one evaluation request.
#[derive(Debug, Clone, Default)]
pub struct CompilationResult {
    pub compiled: Option<CompiledExpression>,
    /// Diagnostics reported by the compiler.
    pub messages: Vec<String>,
}

impl CompilationResult {
    pub fn resolved(compiled: CompiledExpression) -> Self {
        Self {
            compiled: Some(compiled),
            messages: Vec::new(),
        }
    }

    pub fn unresolved(messages: Vec<String>) -> Self {
        Self {
            compiled: None,
            messages,
        }
    }
}

impl From<CompiledExpression> for CompilationResult {
    fn from(compiled: CompiledExpression) -> Self {
        Self::resolved(compiled)
    }
}
