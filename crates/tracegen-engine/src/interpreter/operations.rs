//! Built-in operations on runtime values.
//!
//! Each receiver family has its own table; an operation missing from the table
//! of the receiver's runtime type is an [`EngineError::UndefinedOperation`].

use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use regex::Regex;

use crate::error::{EngineError, EngineResult};
use crate::model::{ModelSet, ObjectId, Value};

/// Apply `operation` to `receiver`.
pub(crate) fn apply(
    models: &ModelSet,
    operation: &str,
    receiver: Value,
    arguments: Vec<Value>,
) -> EngineResult<Value> {
    match (operation, arguments.as_slice()) {
        ("=", [other]) => return Ok(Value::Bool(values_equal(&receiver, other))),
        ("<>", [other]) => return Ok(Value::Bool(!values_equal(&receiver, other))),
        ("toString", []) => return Ok(Value::String(receiver.to_text(models))),
        ("isNull" | "oclIsUndefined", []) => return Ok(Value::Bool(receiver.is_null())),
        _ => {}
    }

    let result = match &receiver {
        Value::String(s) => string_operation(models, operation, s, &arguments),
        Value::Integer(_) | Value::Real(_) => numeric_operation(operation, &receiver, &arguments),
        Value::Bool(b) => boolean_operation(operation, *b, &arguments),
        Value::Collection(items) => collection_operation(operation, items, &arguments),
        Value::Object(id) => object_operation(models, operation, *id, &arguments),
        Value::Null => None,
    };

    result.ok_or_else(|| {
        EngineError::undefined(
            operation,
            arguments.iter().map(|a| a.type_name(models)).collect(),
            receiver.type_name(models),
        )
    })
}

/// Equality with integer/real promotion.
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(a), Value::Real(b)) | (Value::Real(b), Value::Integer(a)) => {
            (*a as f64) == *b
        }
        _ => left == right,
    }
}

fn string_operation(
    models: &ModelSet,
    operation: &str,
    s: &str,
    args: &[Value],
) -> Option<Value> {
    let value = match (operation, args) {
        ("size", []) => Value::Integer(s.chars().count() as i64),
        ("concat" | "+", [other]) => Value::String(format!("{s}{}", other.to_text(models))),
        ("toUpper", []) => Value::String(s.to_uppercase()),
        ("toLower", []) => Value::String(s.to_lowercase()),
        ("toUpperFirst", []) => Value::String(map_first(s, |c| c.to_uppercase().collect())),
        ("toLowerFirst", []) => Value::String(map_first(s, |c| c.to_lowercase().collect())),
        ("trim", []) => Value::String(s.trim().to_string()),
        ("startsWith", [Value::String(p)]) => Value::Bool(s.starts_with(p.as_str())),
        ("endsWith", [Value::String(p)]) => Value::Bool(s.ends_with(p.as_str())),
        ("contains", [Value::String(p)]) => Value::Bool(s.contains(p.as_str())),
        ("index", [Value::String(p)]) => Value::Integer(match s.find(p.as_str()) {
            Some(byte) => s[..byte].chars().count() as i64 + 1,
            None => -1,
        }),
        ("substring", [Value::Integer(start), Value::Integer(end)]) => {
            Value::String(substring(s, *start, *end)?)
        }
        ("replaceAll", [Value::String(pattern), Value::String(replacement)]) => {
            let regex = compile(pattern)?;
            Value::String(regex.replace_all(s, replacement.as_str()).into_owned())
        }
        ("matches", [Value::String(pattern)]) => {
            let regex = compile(&format!("^(?:{pattern})$"))?;
            Value::Bool(regex.is_match(s))
        }
        ("toSnakeCase", []) => Value::String(s.to_snake_case()),
        ("toPascalCase", []) => Value::String(s.to_upper_camel_case()),
        ("toCamelCase", []) => Value::String(s.to_lower_camel_case()),
        ("toKebabCase", []) => Value::String(s.to_kebab_case()),
        ("<", [Value::String(o)]) => Value::Bool(s < o.as_str()),
        ("<=", [Value::String(o)]) => Value::Bool(s <= o.as_str()),
        (">", [Value::String(o)]) => Value::Bool(s > o.as_str()),
        (">=", [Value::String(o)]) => Value::Bool(s >= o.as_str()),
        _ => return None,
    };
    Some(value)
}

fn map_first(s: &str, f: impl Fn(char) -> String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => f(first) + chars.as_str(),
        None => String::new(),
    }
}

/// 1-based inclusive character range; `None` when out of bounds.
fn substring(s: &str, start: i64, end: i64) -> Option<String> {
    let len = s.chars().count() as i64;
    if start < 1 || end < start - 1 || end > len {
        return None;
    }
    let skip = usize::try_from(start - 1).ok()?;
    let take = usize::try_from(end - start + 1).ok()?;
    Some(s.chars().skip(skip).take(take).collect())
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::debug!(pattern = %pattern, error = %e, "Invalid regular expression");
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Real(f64),
}

impl Number {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(Self::Int(*i)),
            Value::Real(r) => Some(Self::Real(*r)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Real(r) => r,
        }
    }
}

fn numeric_operation(operation: &str, receiver: &Value, args: &[Value]) -> Option<Value> {
    let left = Number::of(receiver)?;

    match (operation, args) {
        ("abs", []) => {
            return Some(match left {
                Number::Int(i) => Value::Integer(i.checked_abs()?),
                Number::Real(r) => Value::Real(r.abs()),
            })
        }
        ("floor", []) => return Some(Value::Integer(left.as_f64().floor() as i64)),
        ("round", []) => return Some(Value::Integer(left.as_f64().round() as i64)),
        _ => {}
    }

    let [right] = args else {
        return None;
    };
    let right = Number::of(right)?;

    let value = match (left, right) {
        (Number::Int(a), Number::Int(b)) => match operation {
            "+" => Value::Integer(a.checked_add(b)?),
            "-" => Value::Integer(a.checked_sub(b)?),
            "*" => Value::Integer(a.checked_mul(b)?),
            "/" | "div" => Value::Integer(a.checked_div(b)?),
            "mod" => Value::Integer(a.checked_rem(b)?),
            "max" => Value::Integer(a.max(b)),
            "min" => Value::Integer(a.min(b)),
            "<" => Value::Bool(a < b),
            "<=" => Value::Bool(a <= b),
            ">" => Value::Bool(a > b),
            ">=" => Value::Bool(a >= b),
            _ => return None,
        },
        (a, b) => {
            let (a, b) = (a.as_f64(), b.as_f64());
            match operation {
                "+" => Value::Real(a + b),
                "-" => Value::Real(a - b),
                "*" => Value::Real(a * b),
                "/" => Value::Real(a / b),
                "max" => Value::Real(a.max(b)),
                "min" => Value::Real(a.min(b)),
                "<" => Value::Bool(a < b),
                "<=" => Value::Bool(a <= b),
                ">" => Value::Bool(a > b),
                ">=" => Value::Bool(a >= b),
                _ => return None,
            }
        }
    };
    Some(value)
}

fn boolean_operation(operation: &str, value: bool, args: &[Value]) -> Option<Value> {
    let result = match (operation, args) {
        ("not", []) => !value,
        ("and", [Value::Bool(other)]) => value && *other,
        ("or", [Value::Bool(other)]) => value || *other,
        ("xor", [Value::Bool(other)]) => value ^ *other,
        ("implies", [Value::Bool(other)]) => !value || *other,
        _ => return None,
    };
    Some(Value::Bool(result))
}

fn collection_operation(operation: &str, items: &[Value], args: &[Value]) -> Option<Value> {
    let value = match (operation, args) {
        ("size", []) => Value::Integer(items.len() as i64),
        ("isEmpty", []) => Value::Bool(items.is_empty()),
        ("notEmpty", []) => Value::Bool(!items.is_empty()),
        ("first", []) => items.first().cloned().unwrap_or_default(),
        ("last", []) => items.last().cloned().unwrap_or_default(),
        ("at", [Value::Integer(i)]) => {
            let index = usize::try_from(*i).ok()?.checked_sub(1)?;
            items.get(index)?.clone()
        }
        ("includes", [other]) => Value::Bool(items.iter().any(|v| values_equal(v, other))),
        ("excludes", [other]) => Value::Bool(!items.iter().any(|v| values_equal(v, other))),
        ("reverse", []) => Value::Collection(items.iter().rev().cloned().collect()),
        ("sep", [separator]) => {
            let mut out = Vec::with_capacity(items.len() * 2);
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(separator.clone());
                }
                out.push(item.clone());
            }
            Value::Collection(out)
        }
        ("union", [Value::Collection(other)]) => {
            Value::Collection(items.iter().chain(other.iter()).cloned().collect())
        }
        ("flatten", []) => Value::Collection(flatten(items)),
        _ => return None,
    };
    Some(value)
}

fn flatten(items: &[Value]) -> Vec<Value> {
    let mut out = Vec::new();
    for item in items {
        match item {
            Value::Collection(inner) => out.extend(flatten(inner)),
            other => out.push(other.clone()),
        }
    }
    out
}

fn object_operation(
    models: &ModelSet,
    operation: &str,
    id: ObjectId,
    args: &[Value],
) -> Option<Value> {
    if !args.is_empty() {
        return None;
    }
    let object = models.get(id)?;
    let value = match operation {
        "eClass" => Value::String(object.class.clone()),
        "key" => Value::String(object.key.clone()),
        "eContainer" => object.container.map(Value::Object).unwrap_or_default(),
        "eContents" => objects(object.children.iter().copied()),
        "eAllContents" => objects(models.all_contents(id)),
        _ => return None,
    };
    Some(value)
}

fn objects(ids: impl IntoIterator<Item = ObjectId>) -> Value {
    Value::Collection(ids.into_iter().map(Value::Object).collect())
}
