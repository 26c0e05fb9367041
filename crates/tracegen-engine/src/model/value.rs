//! Runtime values produced and consumed by evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ModelSet, ObjectId};

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Object(ObjectId),
    Collection(Vec<Value>),
}

impl Value {
    /// Name of the runtime type, as reported in undefined-operation errors.
    pub fn type_name(&self, models: &ModelSet) -> String {
        match self {
            Self::Null => "Null".to_string(),
            Self::Bool(_) => "Boolean".to_string(),
            Self::Integer(_) => "Integer".to_string(),
            Self::Real(_) => "Real".to_string(),
            Self::String(_) => "String".to_string(),
            Self::Object(id) => models
                .get(*id)
                .map(|o| o.class.clone())
                .unwrap_or_else(|| "Object".to_string()),
            Self::Collection(_) => "Collection".to_string(),
        }
    }

    /// Text form used when the value is emitted into generated output.
    pub fn to_text(&self, models: &ModelSet) -> String {
        let mut out = String::new();
        self.write_text(models, &mut out);
        out
    }

    fn write_text(&self, models: &ModelSet, out: &mut String) {
        match self {
            Self::Null => {}
            Self::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Self::Integer(i) => out.push_str(&i.to_string()),
            Self::Real(r) => out.push_str(&r.to_string()),
            Self::String(s) => out.push_str(s),
            Self::Object(id) => match models.get(*id) {
                Some(object) => {
                    out.push_str(&object.class);
                    out.push('#');
                    out.push_str(&object.key);
                }
                None => out.push_str(&format!("Object#{}", id.0)),
            },
            Self::Collection(items) => {
                for item in items {
                    item.write_text(models, out);
                }
            }
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// View the value as a sequence: collections yield their items, `Null` yields
    /// nothing and any other value is a singleton.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Self::Collection(items) => items,
            Self::Null => Vec::new(),
            other => vec![other],
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::String(s) => write!(f, "'{s}'"),
            Self::Object(id) => write!(f, "object({})", id.0),
            Self::Collection(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Collection(value)
    }
}
